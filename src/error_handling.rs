use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::classifier::Category;

/// Maximum number of example messages kept per diagnostic kind
const MAX_EXAMPLES: usize = 3;

/// Failure to enumerate input logs
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("input directory '{}' does not exist", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to read input directory '{}': {source}", path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid log file pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },
}

/// Unexpected condition while scanning one file. Isolated to that file.
#[derive(Debug, Error)]
#[error("failed to classify {file} at line {line}: {source}")]
pub struct ClassificationError {
    pub file: String,
    /// Line that could not be read; 0 when the file could not be opened
    pub line: usize,
    #[source]
    pub source: io::Error,
}

/// A classified unit whose mandatory fields could not be extracted
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractError {
    #[error("{file}:{line}: missing field '{field}'")]
    MissingField {
        file: String,
        line: usize,
        field: &'static str,
    },

    #[error("{file}:{line}: field '{field}' has invalid value '{value}'")]
    InvalidNumber {
        file: String,
        line: usize,
        field: &'static str,
        value: String,
    },
}

impl ExtractError {
    pub fn field(&self) -> &'static str {
        match self {
            ExtractError::MissingField { field, .. } | ExtractError::InvalidNumber { field, .. } => {
                *field
            }
        }
    }

    pub fn kind(&self) -> DiagnosticKind {
        match self {
            ExtractError::MissingField { .. } => DiagnosticKind::MissingField,
            ExtractError::InvalidNumber { .. } => DiagnosticKind::InvalidNumber,
        }
    }
}

/// Failure to produce one category's report file
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to stage {category} report in '{}': {source}", dir.display())]
    Stage {
        category: Category,
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write {category} report rows: {source}")]
    Write {
        category: Category,
        #[source]
        source: csv::Error,
    },

    #[error("failed to persist {category} report as '{}': {source}", path.display())]
    Persist {
        category: Category,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Every recoverable condition a run can encounter
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    MissingDirectory,
    InputError,
    DuplicateOutputFile,
    MissingField,
    InvalidNumber,
    UnterminatedErrorBlock,
    ClassificationError,
    ReportError,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::MissingDirectory => "missing directory",
            DiagnosticKind::InputError => "input error",
            DiagnosticKind::DuplicateOutputFile => "duplicate output file",
            DiagnosticKind::MissingField => "missing field",
            DiagnosticKind::InvalidNumber => "invalid number",
            DiagnosticKind::UnterminatedErrorBlock => "unterminated error block",
            DiagnosticKind::ClassificationError => "classification error",
            DiagnosticKind::ReportError => "report error",
        };
        f.write_str(name)
    }
}

/// Counts diagnostics by kind and keeps a few example messages for the summary.
///
/// Logging happens at the call site; this only aggregates.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    counts: BTreeMap<DiagnosticKind, usize>,
    examples: BTreeMap<DiagnosticKind, Vec<String>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: DiagnosticKind, message: impl Into<String>) {
        *self.counts.entry(kind).or_insert(0) += 1;

        let examples = self.examples.entry(kind).or_default();
        if examples.len() < MAX_EXAMPLES {
            examples.push(message.into());
        }
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn examples(&self, kind: DiagnosticKind) -> &[String] {
        self.examples.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// One line per kind, e.g. `missing field: 2 (first: sample.log:4: missing field 'thread')`
    pub fn summary_lines(&self) -> Vec<String> {
        self.counts
            .iter()
            .map(|(kind, count)| match self.examples(*kind).first() {
                Some(first) => format!("{}: {} (first: {})", kind, count, first),
                None => format!("{}: {}", kind, count),
            })
            .collect()
    }
}
