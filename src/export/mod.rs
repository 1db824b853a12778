//! Export of batch results

pub mod json;

pub use json::{read_report, write_report, BatchReport, BatchSummary, ReportMetadata};
