use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{ImeiError, Result};
use crate::lookup::{LookupResponse, LookupTransport};

type Behaviour = dyn Fn(&str) -> Result<LookupResponse> + Send + Sync;

/// Scripted transport that records every requested IMEI in order
#[derive(Clone)]
pub struct StubTransport {
    behaviour: Arc<Behaviour>,
    requested: Arc<Mutex<Vec<String>>>,
    delay: Option<Duration>,
}

impl StubTransport {
    pub fn new(behaviour: impl Fn(&str) -> Result<LookupResponse> + Send + Sync + 'static) -> Self {
        Self {
            behaviour: Arc::new(behaviour),
            requested: Arc::new(Mutex::new(Vec::new())),
            delay: None,
        }
    }

    /// Resolves only the listed identifiers; everything else is "not found"
    pub fn succeeding_for(imeis: &[&str]) -> Self {
        let known: HashSet<String> = imeis.iter().map(|s| s.to_string()).collect();
        Self::new(move |imei| {
            if known.contains(imei) {
                Ok(LookupResponse::done("TestBrand", "TestModel"))
            } else {
                Ok(LookupResponse::failed("IMEI not found"))
            }
        })
    }

    /// Drops the connection for the listed identifiers, resolves everything else
    pub fn disconnecting_for(imeis: &[&str]) -> Self {
        let broken: HashSet<String> = imeis.iter().map(|s| s.to_string()).collect();
        Self::new(move |imei| {
            if broken.contains(imei) {
                Err(ImeiError::Other(anyhow::anyhow!("connection reset by peer")))
            } else {
                Ok(LookupResponse::done("TestBrand", "TestModel"))
            }
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.requested.lock().unwrap().len()
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl LookupTransport for StubTransport {
    async fn fetch(&self, imei: &str, _api_key: &str) -> Result<LookupResponse> {
        self.requested.lock().unwrap().push(imei.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        (self.behaviour)(imei)
    }
}
