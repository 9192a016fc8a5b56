use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

use super::types::DeviceRecord;

/// Process-lifetime memoization of resolved identifiers.
///
/// Entries are never evicted: brand and model for a given IMEI do not change.
/// Concurrent writers for the same key race harmlessly (last write wins).
#[derive(Debug, Default)]
pub struct LookupCache {
    records: RwLock<HashMap<String, DeviceRecord>>,
    // 14-digit base -> full identifier that completed it
    completions: RwLock<HashMap<String, String>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl LookupCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, imei: &str) -> Option<DeviceRecord> {
        let record = read(&self.records).get(imei).cloned();
        match record {
            Some(_) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("Cache hit for IMEI {}", imei);
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
            }
        }
        record
    }

    pub fn put(&self, imei: &str, record: DeviceRecord) {
        write(&self.records).insert(imei.to_string(), record);
    }

    /// Full identifier that previously completed `base`, if any
    pub fn completion_for(&self, base: &str) -> Option<String> {
        read(&self.completions).get(base).cloned()
    }

    pub fn remember_completion(&self, base: &str, full: &str) {
        write(&self.completions).insert(base.to_string(), full.to_string());
    }

    pub fn len(&self) -> usize {
        read(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> usize {
        self.misses.load(Ordering::Relaxed)
    }
}

// Poisoning is ignored: no writer leaves a map half-updated.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}
