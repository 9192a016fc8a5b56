use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::lookup::DeviceRecord;

/// A successful lookup as persisted in the history table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LookupRecord {
    pub id: i64,
    pub imei: String,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub os_hint: String,
    pub looked_up_at: DateTime<Utc>,
}

impl LookupRecord {
    pub fn to_device_record(&self) -> DeviceRecord {
        DeviceRecord {
            imei: self.imei.clone(),
            brand: self.brand.clone(),
            model: self.model.clone(),
            os_hint: self.os_hint.clone(),
        }
    }
}
