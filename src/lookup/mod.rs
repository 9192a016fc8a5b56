pub mod cache;
pub mod client;
pub mod types;

pub use cache::LookupCache;
pub use client::{HttpTransport, LookupTransport};
pub use types::{DeviceInfo, DeviceRecord, LookupFailure, LookupResponse, UNKNOWN_OS};
