// Core library for the logparser report tool
//
// Log files written by the arbitrary-log generator are classified line by line
// into hitches, memory samples and error blocks, turned into typed records and
// written out as one CSV report per category.

pub mod classifier;
pub mod config;
pub mod error_handling;
pub mod extract;
pub mod file_cache;
pub mod logging;
pub mod record;
pub mod report;
pub mod runner;
pub mod stats;

pub use classifier::{Category, ClassifiedUnit, Classifier};
pub use config::ParserConfig;
pub use error_handling::{DiagnosticKind, Diagnostics};
pub use record::{CategoryBuffers, ErrorRecord, HitchRecord, MemoryRecord, Record};
pub use runner::{run, RunContext, RunSummary};
