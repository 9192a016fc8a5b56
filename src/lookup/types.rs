use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// The lookup service never reports an operating system
pub const UNKNOWN_OS: &str = "unknown";

/// Status value the service uses for a resolved identifier
pub const STATUS_DONE: &str = "Done";

/// Raw payload returned by the lookup service.
///
/// Fields are read leniently: a present payload with an odd `status` or
/// `result` shape is a rejection, not a decoding error.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LookupResponse {
    #[serde(default, deserialize_with = "lenient_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: Option<String>,
    #[serde(default, deserialize_with = "lenient_info")]
    pub result: Option<DeviceInfo>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DeviceInfo {
    #[serde(default, deserialize_with = "lenient_string")]
    pub brand: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub model: Option<String>,
}

impl DeviceInfo {
    pub fn is_empty(&self) -> bool {
        self.brand.is_none() && self.model.is_none()
    }
}

// Strings pass through, null is absent, anything else keeps its JSON text
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn lenient_info<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<DeviceInfo>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        object @ Value::Object(_) => serde_json::from_value(object).ok(),
        _ => None,
    })
}

impl LookupResponse {
    /// Successful payload, used by tests and stubs
    pub fn done(brand: &str, model: &str) -> Self {
        Self {
            status: Some(STATUS_DONE.to_string()),
            message: None,
            result: Some(DeviceInfo {
                brand: Some(brand.to_string()),
                model: Some(model.to_string()),
            }),
        }
    }

    pub fn failed(message: &str) -> Self {
        Self {
            status: Some("Failed".to_string()),
            message: Some(message.to_string()),
            result: None,
        }
    }

    /// "Done" with a result naming at least a brand or a model
    pub fn is_done(&self) -> bool {
        self.status.as_deref() == Some(STATUS_DONE)
            && self.result.as_ref().is_some_and(|info| !info.is_empty())
    }
}

/// Device metadata for a complete 15-digit identifier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRecord {
    pub imei: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub os_hint: String,
}

impl DeviceRecord {
    pub fn from_info(imei: &str, info: &DeviceInfo) -> Self {
        Self {
            imei: imei.to_string(),
            brand: info.brand.clone(),
            model: info.model.clone(),
            os_hint: UNKNOWN_OS.to_string(),
        }
    }

    pub fn brand_or_unknown(&self) -> &str {
        self.brand.as_deref().unwrap_or(UNKNOWN_OS)
    }

    pub fn model_or_unknown(&self) -> &str {
        self.model.as_deref().unwrap_or(UNKNOWN_OS)
    }

    /// Whether the resolved identifier carries the Luhn-correct check digit
    pub fn has_valid_check_digit(&self) -> bool {
        crate::imei::is_valid_imei(&self.imei)
    }
}

/// Service-level failure for a single identifier
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LookupFailure {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("not found: {}", .0.as_deref().unwrap_or("no message from service"))]
    NotFound(Option<String>),

    #[error("no check digit 0-9 completes {0}")]
    NoValidCompletion(String),
}

impl LookupFailure {
    /// Short reason code for reports
    pub fn reason(&self) -> &'static str {
        match self {
            LookupFailure::Transport(_) => "transport",
            LookupFailure::NotFound(_) => "not-found",
            LookupFailure::NoValidCompletion(_) => "no-valid-completion",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_success_payload() {
        let body = r#"{"status":"Done","result":{"brand":"Apple","model":"iPhone 12","extra":1},"id":"x"}"#;
        let response: LookupResponse = serde_json::from_str(body).unwrap();
        assert!(response.is_done());

        let record = DeviceRecord::from_info("490154203237518", response.result.as_ref().unwrap());
        assert_eq!(record.brand.as_deref(), Some("Apple"));
        assert_eq!(record.os_hint, UNKNOWN_OS);
        assert!(record.has_valid_check_digit());
    }

    #[test]
    fn test_done_without_result_is_not_done() {
        let response: LookupResponse = serde_json::from_str(r#"{"status":"Done"}"#).unwrap();
        assert!(!response.is_done());

        let response: LookupResponse =
            serde_json::from_str(r#"{"status":"Error","message":"Invalid IMEI"}"#).unwrap();
        assert!(!response.is_done());
        assert_eq!(response.message.as_deref(), Some("Invalid IMEI"));
    }

    #[test]
    fn test_done_with_empty_result_is_not_done() {
        for body in [
            r#"{"status":"Done","result":{}}"#,
            r#"{"status":"Done","result":{"brand":null,"model":null}}"#,
            r#"{"status":"Done","result":[]}"#,
            r#"{"status":"Done","result":"ok"}"#,
        ] {
            let response: LookupResponse = serde_json::from_str(body).unwrap();
            assert!(!response.is_done(), "{} should not count as resolved", body);
        }

        let response: LookupResponse =
            serde_json::from_str(r#"{"status":"Done","result":{"model":"A1234"}}"#).unwrap();
        assert!(response.is_done());
    }

    #[test]
    fn test_non_string_fields_still_decode() {
        let response: LookupResponse =
            serde_json::from_str(r#"{"status":404,"message":"Invalid IMEI"}"#).unwrap();
        assert_eq!(response.status.as_deref(), Some("404"));
        assert_eq!(response.message.as_deref(), Some("Invalid IMEI"));
        assert!(!response.is_done());

        let response: LookupResponse =
            serde_json::from_str(r#"{"status":false,"message":{"code":7}}"#).unwrap();
        assert_eq!(response.status.as_deref(), Some("false"));
        assert_eq!(response.message.as_deref(), Some(r#"{"code":7}"#));

        let response: LookupResponse =
            serde_json::from_str(r#"{"status":"Done","result":{"brand":"Nokia","model":3310}}"#).unwrap();
        assert!(response.is_done());
        assert_eq!(response.result.unwrap().model.as_deref(), Some("3310"));
    }

    #[test]
    fn test_missing_brand_falls_back() {
        let record = DeviceRecord::from_info("490154203237518", &DeviceInfo::default());
        assert_eq!(record.brand_or_unknown(), "unknown");
        assert_eq!(record.model_or_unknown(), "unknown");
    }

    #[test]
    fn test_failure_reasons() {
        assert_eq!(LookupFailure::Transport("reset".into()).reason(), "transport");
        assert_eq!(LookupFailure::NotFound(None).reason(), "not-found");
        assert_eq!(
            LookupFailure::NoValidCompletion("12345678901234".into()).reason(),
            "no-valid-completion"
        );
        assert_eq!(
            LookupFailure::NotFound(None).to_string(),
            "not found: no message from service"
        );
    }
}
