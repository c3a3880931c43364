use serde::Serialize;

use crate::classifier::Category;

/// A transient performance delay reported by the client
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HitchRecord {
    pub file: String,
    pub line: usize,
    pub thread: String,
    pub duration_ms: f64,
}

/// A point-in-time process memory reading
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryRecord {
    pub file: String,
    pub line: usize,
    pub footprint_mib: f64,
    pub run_time_secs: f64,
}

/// An error line together with its stack trace
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRecord {
    pub file: String,
    pub line: usize,
    pub error_type: String,
    pub message: String,
}

/// A row that can be written into a category report
pub trait ReportRow: Serialize {
    const CATEGORY: Category;
    const HEADER: [&'static str; 4];
}

impl ReportRow for HitchRecord {
    const CATEGORY: Category = Category::Hitch;
    const HEADER: [&'static str; 4] = ["Log Name", "Log Line", "Thread", "Duration (ms)"];
}

impl ReportRow for MemoryRecord {
    const CATEGORY: Category = Category::MemorySample;
    const HEADER: [&'static str; 4] = ["Log Name", "Log Line", "Footprint (MiB)", "Time Recorded"];
}

impl ReportRow for ErrorRecord {
    const CATEGORY: Category = Category::ErrorBlock;
    const HEADER: [&'static str; 4] = ["Log Name", "Log Line", "Error Type", "Error Message"];
}

#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Hitch(HitchRecord),
    Memory(MemoryRecord),
    Error(ErrorRecord),
}

impl Record {
    pub fn category(&self) -> Category {
        match self {
            Record::Hitch(_) => Category::Hitch,
            Record::Memory(_) => Category::MemorySample,
            Record::Error(_) => Category::ErrorBlock,
        }
    }
}

/// Append-only record buffers, one per reported category, in input order
#[derive(Debug, Default)]
pub struct CategoryBuffers {
    pub hitches: Vec<HitchRecord>,
    pub memory: Vec<MemoryRecord>,
    pub errors: Vec<ErrorRecord>,
}

impl CategoryBuffers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: Record) {
        match record {
            Record::Hitch(r) => self.hitches.push(r),
            Record::Memory(r) => self.memory.push(r),
            Record::Error(r) => self.errors.push(r),
        }
    }

    pub fn len(&self, category: Category) -> usize {
        match category {
            Category::Hitch => self.hitches.len(),
            Category::MemorySample => self.memory.len(),
            Category::ErrorBlock => self.errors.len(),
            Category::Uncategorized => 0,
        }
    }

    pub fn total(&self) -> usize {
        self.hitches.len() + self.memory.len() + self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}
