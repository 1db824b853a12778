//! Audio file discovery for batch runs

pub mod scanner;

pub use scanner::{scan, DiscoveredFile};
