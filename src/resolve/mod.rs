pub mod batch;
pub mod engine;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchEntry, BatchOrchestrator, BatchResult, NoProgress, Outcome, ProgressObserver};
pub use engine::DeviceResolver;
