use std::path::PathBuf;

use crate::classifier::Category;

/// Directory, relative to the working directory, that the log generator writes into
pub const DEFAULT_INPUT_DIR: &str = "Logs";
/// File-name glob matching the generator's naming convention
pub const DEFAULT_FILE_PATTERN: &str = "CreateArbitraryLog*.log";

/// Main configuration struct for a parser run
#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    pub input: InputConfig,
    pub markers: MarkerConfig,
    pub output: OutputConfig,
}

/// Input configuration
#[derive(Debug, Clone)]
pub struct InputConfig {
    pub dir: PathBuf,
    pub file_pattern: String,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_INPUT_DIR),
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
        }
    }
}

/// Literal substrings that tag a line with a category.
///
/// Matching is case-sensitive and evaluated in field order: hitch, memory, error.
#[derive(Debug, Clone)]
pub struct MarkerConfig {
    pub hitch: String,
    pub memory: String,
    pub error: String,
    /// First character of every timestamped entry; closes an open error block
    pub record_start: char,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            hitch: "Hitch".to_string(),
            memory: "memory footprint".to_string(),
            error: "ERROR".to_string(),
            record_start: '[',
        }
    }
}

/// Output configuration
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub hitch_report: String,
    pub memory_report: String,
    pub error_report: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            hitch_report: "HitchReport.csv".to_string(),
            memory_report: "MemoryReport.csv".to_string(),
            error_report: "ErrorReport.csv".to_string(),
        }
    }
}

impl OutputConfig {
    /// Preferred report file name for a category, before collision suffixing
    pub fn report_name(&self, category: Category) -> Option<&str> {
        match category {
            Category::Hitch => Some(&self.hitch_report),
            Category::MemorySample => Some(&self.memory_report),
            Category::ErrorBlock => Some(&self.error_report),
            Category::Uncategorized => None,
        }
    }
}

impl ParserConfig {
    /// Configuration rooted at `base`: logs are read from `base/Logs` and reports land in `base`
    pub fn rooted_at(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            input: InputConfig {
                dir: base.join(DEFAULT_INPUT_DIR),
                ..InputConfig::default()
            },
            markers: MarkerConfig::default(),
            output: OutputConfig {
                dir: base,
                ..OutputConfig::default()
            },
        }
    }
}
