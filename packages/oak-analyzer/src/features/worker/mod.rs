//! Background domain scanning

mod supervisor;

pub use supervisor::{DomainWorker, PendingScan, ScanResult};
