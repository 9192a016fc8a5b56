pub mod config;
pub mod error;
pub mod export;
pub mod imei;
pub mod lookup;
pub mod resolve;
pub mod storage;
pub mod utils;

pub use config::Config;
pub use error::{ImeiError, Result};
pub use lookup::{DeviceRecord, LookupCache, LookupFailure};
pub use resolve::{BatchOrchestrator, BatchResult, DeviceResolver, Outcome};
