use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{
    config::CompletionStrategy,
    imei::compute_check_digit,
    lookup::{DeviceRecord, LookupCache, LookupFailure, LookupTransport},
};

/// Resolves identifiers against the lookup service, memoizing successes.
pub struct DeviceResolver {
    transport: Arc<dyn LookupTransport>,
    cache: Arc<LookupCache>,
    timeout: Duration,
    strategy: CompletionStrategy,
}

impl DeviceResolver {
    pub fn new(transport: Arc<dyn LookupTransport>, cache: Arc<LookupCache>, timeout: Duration) -> Self {
        Self {
            transport,
            cache,
            timeout,
            strategy: CompletionStrategy::Sweep,
        }
    }

    pub fn with_strategy(mut self, strategy: CompletionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn cache(&self) -> &Arc<LookupCache> {
        &self.cache
    }

    /// Resolve a complete 15-digit identifier.
    ///
    /// Cache hits return without touching the network. Transport errors,
    /// timeouts, HTTP errors and undecodable payloads all map to
    /// `LookupFailure::Transport`; a payload whose status is not "Done" (or
    /// whose result names neither brand nor model) maps to
    /// `LookupFailure::NotFound`.
    pub async fn resolve(&self, imei: &str, api_key: &str) -> Result<DeviceRecord, LookupFailure> {
        if let Some(record) = self.cache.get(imei) {
            return Ok(record);
        }

        let response = match tokio::time::timeout(self.timeout, self.transport.fetch(imei, api_key)).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                warn!("Request failed for IMEI {}: {}", imei, e);
                return Err(LookupFailure::Transport(e.to_string()));
            }
            Err(_) => {
                warn!("Request for IMEI {} timed out after {:?}", imei, self.timeout);
                return Err(LookupFailure::Transport(format!("timed out after {:?}", self.timeout)));
            }
        };

        if response.is_done() {
            if let Some(info) = response.result.as_ref() {
                let record = DeviceRecord::from_info(imei, info);
                self.cache.put(imei, record.clone());
                info!(
                    "Resolved IMEI {} -> {} {}",
                    imei,
                    record.brand_or_unknown(),
                    record.model_or_unknown()
                );
                return Ok(record);
            }
        }

        debug!(
            "Service rejected IMEI {}: {}",
            imei,
            response.message.as_deref().unwrap_or("no message")
        );
        Err(LookupFailure::NotFound(response.message))
    }

    /// Resolve a 14-digit base by trying check digits one at a time.
    ///
    /// Candidates are queried sequentially and the first one the service
    /// resolves wins, even if it is not the Luhn-correct digit.
    pub async fn resolve_with_completion(&self, base: &str, api_key: &str) -> Result<DeviceRecord, LookupFailure> {
        if let Some(full) = self.cache.completion_for(base) {
            if let Ok(record) = self.resolve(&full, api_key).await {
                return Ok(record);
            }
        }

        for digit in self.candidate_digits(base) {
            let candidate = format!("{}{}", base, digit);
            debug!("Trying completion {} for base {}", candidate, base);

            match self.resolve(&candidate, api_key).await {
                Ok(record) => {
                    self.cache.remember_completion(base, &candidate);
                    return Ok(record);
                }
                Err(e) => debug!("Candidate {} failed: {}", candidate, e),
            }
        }

        warn!("No check digit completes base {}", base);
        Err(LookupFailure::NoValidCompletion(base.to_string()))
    }

    fn candidate_digits(&self, base: &str) -> Vec<u8> {
        let mut digits: Vec<u8> = (0..=9).collect();

        if self.strategy == CompletionStrategy::LuhnFirst {
            if let Ok(expected) = compute_check_digit(base) {
                digits.retain(|&d| d != expected);
                digits.insert(0, expected);
            }
        }

        digits
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ImeiError;
    use crate::lookup::client::MockLookupTransport;
    use crate::lookup::LookupResponse;
    use crate::resolve::testing::StubTransport;

    fn resolver(transport: impl LookupTransport + 'static) -> DeviceResolver {
        DeviceResolver::new(
            Arc::new(transport),
            Arc::new(LookupCache::new()),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_resolve_caches_success() {
        let mut mock = MockLookupTransport::new();
        mock.expect_fetch()
            .withf(|imei, key| imei.to_string() == "490154203237518" && key.to_string() == "secret")
            .times(1)
            .returning(|_, _| Ok(LookupResponse::done("Apple", "iPhone 12")));

        let resolver = resolver(mock);
        let first = resolver.resolve("490154203237518", "secret").await.unwrap();
        let second = resolver.resolve("490154203237518", "secret").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.brand.as_deref(), Some("Apple"));
        assert_eq!(first.os_hint, "unknown");
        assert_eq!(resolver.cache().len(), 1);
    }

    #[tokio::test]
    async fn test_resolve_not_found_carries_message() {
        let mut mock = MockLookupTransport::new();
        mock.expect_fetch()
            .times(2)
            .returning(|_, _| Ok(LookupResponse::failed("IMEI not registered")));

        let resolver = resolver(mock);
        let err = resolver.resolve("490154203237518", "k").await.unwrap_err();
        assert_eq!(err, LookupFailure::NotFound(Some("IMEI not registered".into())));

        // Failures are not cached
        assert!(resolver.resolve("490154203237518", "k").await.is_err());
        assert!(resolver.cache().is_empty());
    }

    #[tokio::test]
    async fn test_done_without_result_is_not_found() {
        let mut mock = MockLookupTransport::new();
        mock.expect_fetch().times(1).returning(|_, _| {
            Ok(LookupResponse {
                status: Some("Done".into()),
                message: None,
                result: None,
            })
        });

        let err = resolver(mock).resolve("490154203237518", "k").await.unwrap_err();
        assert_eq!(err, LookupFailure::NotFound(None));
    }

    #[tokio::test]
    async fn test_done_with_empty_result_is_not_found() {
        let stub = StubTransport::new(|imei| {
            let body = if imei == "123456789012343" {
                r#"{"status":"Done","result":{}}"#
            } else if imei == "123456789012347" {
                r#"{"status":"Done","result":{"brand":"Apple","model":"iPhone 12"}}"#
            } else {
                r#"{"status":"Failed","message":"IMEI not found"}"#
            };
            Ok(serde_json::from_str::<LookupResponse>(body)?)
        });
        let resolver = resolver(stub);

        let err = resolver.resolve("123456789012343", "k").await.unwrap_err();
        assert_eq!(err, LookupFailure::NotFound(None));
        assert!(resolver.cache().is_empty());

        // The sweep does not stop on the empty result at digit 3
        let record = resolver.resolve_with_completion("12345678901234", "k").await.unwrap();
        assert_eq!(record.imei, "123456789012347");
        assert_eq!(record.brand.as_deref(), Some("Apple"));
    }

    #[tokio::test]
    async fn test_non_string_status_is_not_found() {
        let mut mock = MockLookupTransport::new();
        mock.expect_fetch().times(1).returning(|_, _| {
            Ok(serde_json::from_str(r#"{"status":404,"message":"Invalid IMEI"}"#)?)
        });

        let err = resolver(mock).resolve("490154203237518", "k").await.unwrap_err();
        assert_eq!(err, LookupFailure::NotFound(Some("Invalid IMEI".into())));
    }

    #[tokio::test]
    async fn test_transport_error_is_classified() {
        let mut mock = MockLookupTransport::new();
        mock.expect_fetch()
            .times(1)
            .returning(|_, _| Err(ImeiError::Other(anyhow::anyhow!("connection reset"))));

        let err = resolver(mock).resolve("490154203237518", "k").await.unwrap_err();
        assert_eq!(err.reason(), "transport");
        assert!(err.to_string().contains("connection reset"));
    }

    #[tokio::test]
    async fn test_timeout_maps_to_transport() {
        let stub = StubTransport::succeeding_for(&["490154203237518"]).with_delay(Duration::from_secs(5));
        let resolver = DeviceResolver::new(
            Arc::new(stub),
            Arc::new(LookupCache::new()),
            Duration::from_millis(50),
        );

        let err = resolver.resolve("490154203237518", "k").await.unwrap_err();
        assert!(matches!(err, LookupFailure::Transport(ref msg) if msg.contains("timed out")));
    }

    #[tokio::test]
    async fn test_completion_stops_at_first_success() {
        let stub = StubTransport::succeeding_for(&["123456789012347"]);
        let resolver = resolver(stub.clone());

        let record = resolver.resolve_with_completion("12345678901234", "k").await.unwrap();
        assert_eq!(record.imei, "123456789012347");
        assert_eq!(stub.calls(), 8);
        assert_eq!(
            stub.requested(),
            (0..=7).map(|d| format!("12345678901234{}", d)).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_first_success_wins_over_luhn_digit() {
        // Both 2 and 7 resolve; 7 is the Luhn digit but 2 comes first
        let stub = StubTransport::succeeding_for(&["123456789012342", "123456789012347"]);
        let resolver = resolver(stub.clone());

        let record = resolver.resolve_with_completion("12345678901234", "k").await.unwrap();
        assert_eq!(record.imei, "123456789012342");
        assert!(!record.has_valid_check_digit());
        assert_eq!(stub.calls(), 3);
    }

    #[tokio::test]
    async fn test_luhn_first_strategy_queries_computed_digit_first() {
        let stub = StubTransport::succeeding_for(&["123456789012342", "123456789012347"]);
        let resolver = resolver(stub.clone()).with_strategy(CompletionStrategy::LuhnFirst);

        let record = resolver.resolve_with_completion("12345678901234", "k").await.unwrap();
        assert_eq!(record.imei, "123456789012347");
        assert_eq!(stub.calls(), 1);
    }

    #[tokio::test]
    async fn test_completion_exhausted() {
        let stub = StubTransport::succeeding_for(&[]);
        let resolver = resolver(stub.clone());

        let err = resolver.resolve_with_completion("12345678901234", "k").await.unwrap_err();
        assert_eq!(err, LookupFailure::NoValidCompletion("12345678901234".into()));
        assert_eq!(stub.calls(), 10);
    }

    #[tokio::test]
    async fn test_repeated_completion_uses_cache() {
        let stub = StubTransport::succeeding_for(&["123456789012347"]);
        let resolver = resolver(stub.clone());

        resolver.resolve_with_completion("12345678901234", "k").await.unwrap();
        let calls = stub.calls();
        let again = resolver.resolve_with_completion("12345678901234", "k").await.unwrap();

        assert_eq!(again.imei, "123456789012347");
        assert_eq!(stub.calls(), calls);
        assert_eq!(resolver.cache().hits(), 1);
    }
}
