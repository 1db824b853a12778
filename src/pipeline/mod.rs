//! Per-track workflow, service facade and batch driver

pub mod batch;
pub mod processor;
pub mod service;

pub use batch::{run_batch, BatchOptions, BatchOutcome, REPORT_FILENAME};
pub use processor::{file_prefix, sanitize_title, SetlistTrackProcessor};
pub use service::VocalSeparationService;
