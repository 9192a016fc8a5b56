use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    imei::{Identifier, ValidationError},
    lookup::{DeviceRecord, LookupFailure},
    resolve::engine::DeviceResolver,
};

/// Receives (completed, total) after every identifier finishes
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, completed: usize, total: usize);
}

/// Observer that ignores progress updates
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&self, _completed: usize, _total: usize) {}
}

impl ProgressObserver for indicatif::ProgressBar {
    fn on_progress(&self, completed: usize, total: usize) {
        self.set_length(total as u64);
        self.set_position(completed as u64);
    }
}

/// Final state of one input line
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Outcome {
    Success(DeviceRecord),
    Validation(ValidationError),
    Lookup(LookupFailure),
    /// The resolution task panicked or was aborted
    Unexpected(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn describe(&self) -> String {
        match self {
            Outcome::Success(record) => format!(
                "{} {}",
                record.brand_or_unknown(),
                record.model_or_unknown()
            ),
            Outcome::Validation(e) => format!("invalid: {}", e),
            Outcome::Lookup(e) => e.to_string(),
            Outcome::Unexpected(msg) => format!("unexpected error: {}", msg),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchEntry {
    pub input: String,
    pub outcome: Outcome,
}

/// Ordered outcomes of one batch run, one entry per non-empty input
#[derive(Debug, Default)]
pub struct BatchResult {
    pub entries: Vec<BatchEntry>,
    /// Value of the progress counter when the batch finished
    pub completed: usize,
}

impl BatchResult {
    /// True when the input had no non-empty identifiers at all
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn successes(&self) -> impl Iterator<Item = &DeviceRecord> {
        self.entries.iter().filter_map(|entry| match &entry.outcome {
            Outcome::Success(record) => Some(record),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter().filter(|entry| !entry.outcome.is_success())
    }

    pub fn successful(&self) -> usize {
        self.successes().count()
    }

    pub fn failed(&self) -> usize {
        self.entries.len() - self.successful()
    }

    pub fn records(&self) -> Vec<DeviceRecord> {
        self.successes().cloned().collect()
    }

    pub fn success_rate(&self) -> f64 {
        if self.entries.is_empty() {
            0.0
        } else {
            (self.successful() as f64 / self.entries.len() as f64) * 100.0
        }
    }

    pub fn print_summary(&self) {
        println!("\n=== Lookup Batch Summary ===");
        println!("Total IMEIs:   {}", self.entries.len());
        println!("Resolved:      {} ✓", self.successful());
        println!("Failed:        {} ✗", self.failed());
        println!("Success rate:  {:.1}%", self.success_rate());
        println!("============================");
    }
}

/// Runs resolution over a list of raw input lines
pub struct BatchOrchestrator {
    resolver: Arc<DeviceResolver>,
    concurrency: usize,
}

impl BatchOrchestrator {
    pub fn new(resolver: Arc<DeviceResolver>, concurrency: usize) -> Self {
        Self {
            resolver,
            concurrency: concurrency.max(1),
        }
    }

    /// Resolve every non-empty line and return outcomes in input order.
    ///
    /// Up to `concurrency` identifiers are in flight at once. No failure stops
    /// the batch: validation errors, lookup failures and panicking lookups are
    /// all recorded against their line.
    pub async fn run_batch<S: AsRef<str>>(
        &self,
        identifiers: &[S],
        api_key: &str,
        progress: &dyn ProgressObserver,
    ) -> BatchResult {
        let inputs: Vec<String> = identifiers
            .iter()
            .map(|raw| raw.as_ref().trim())
            .filter(|raw| !raw.is_empty())
            .map(str::to_string)
            .collect();

        let total = inputs.len();
        info!(
            "Processing {} identifiers (concurrency {})",
            total, self.concurrency
        );

        let completed = AtomicUsize::new(0);
        let api_key: Arc<str> = Arc::from(api_key);

        let entries: Vec<BatchEntry> = stream::iter(inputs)
            .map(|input| {
                let resolver = Arc::clone(&self.resolver);
                let api_key = Arc::clone(&api_key);
                let completed = &completed;

                async move {
                    let outcome = match Identifier::parse(&input) {
                        Ok(identifier) => Self::resolve_isolated(resolver, identifier, api_key).await,
                        Err(e) => Outcome::Validation(e),
                    };

                    if !outcome.is_success() {
                        warn!("{}: {}", input, outcome.describe());
                    }

                    let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    progress.on_progress(done, total);

                    BatchEntry { input, outcome }
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        let result = BatchResult {
            entries,
            completed: completed.load(Ordering::SeqCst),
        };

        info!(
            "Batch complete: {} resolved, {} failed",
            result.successful(),
            result.failed()
        );

        result
    }

    /// Resolve on a separate task so a panic is confined to this identifier
    async fn resolve_isolated(
        resolver: Arc<DeviceResolver>,
        identifier: Identifier,
        api_key: Arc<str>,
    ) -> Outcome {
        let task = tokio::spawn(async move {
            match &identifier {
                Identifier::Base(base) => resolver.resolve_with_completion(base, &api_key).await,
                Identifier::Full(imei) => resolver.resolve(imei, &api_key).await,
            }
        });

        match task.await {
            Ok(Ok(record)) => Outcome::Success(record),
            Ok(Err(failure)) => Outcome::Lookup(failure),
            Err(e) => Outcome::Unexpected(e.to_string()),
        }
    }
}
