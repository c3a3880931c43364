//! Field grammars that turn classified units into typed records.
//!
//! Every field is mandatory. A grammar either yields a complete record or an
//! [`ExtractError`] naming the field that failed; nothing is defaulted.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::classifier::{Category, ClassifiedUnit};
use crate::config::MarkerConfig;
use crate::error_handling::ExtractError;
use crate::record::{ErrorRecord, HitchRecord, MemoryRecord, Record};

static THREAD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"thread:\s*\[([^\]]+)\]").expect("failed to compile thread regex"));
static DURATION_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"duration of:\s*(\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)")
        .expect("failed to compile duration regex")
});
static FOOTPRINT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"footprint:\s*(\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)")
        .expect("failed to compile footprint regex")
});
static RUN_TIME_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"run time:\s*(\d+(?:\.\d+)?(?:[eE][-+]?\d+)?)")
        .expect("failed to compile run time regex")
});
static ERROR_TYPE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([$\w]+):\s").expect("failed to compile error type regex"));

/// Applies the grammar matching each unit's category
#[derive(Debug, Clone)]
pub struct RecordExtractor {
    error_marker: String,
}

impl RecordExtractor {
    pub fn new(markers: &MarkerConfig) -> Self {
        Self {
            error_marker: markers.error.clone(),
        }
    }

    /// Extract a record from `unit`. Uncategorized units produce `Ok(None)`.
    pub fn extract(&self, unit: &ClassifiedUnit) -> Result<Option<Record>, ExtractError> {
        let record = match unit.category {
            Category::Hitch => Record::Hitch(parse_hitch(&unit.file, unit.line, &unit.text)?),
            Category::MemorySample => {
                Record::Memory(parse_memory(&unit.file, unit.line, &unit.text)?)
            }
            Category::ErrorBlock => Record::Error(parse_error(
                &unit.file,
                unit.line,
                &unit.text,
                &self.error_marker,
            )?),
            Category::Uncategorized => return Ok(None),
        };
        Ok(Some(record))
    }
}

/// `... thread: [T] ... duration of: D ms`
pub fn parse_hitch(file: &str, line: usize, text: &str) -> Result<HitchRecord, ExtractError> {
    let thread = capture(&THREAD_REGEX, text)
        .ok_or_else(|| missing(file, line, "thread"))?
        .to_string();
    let duration_ms = number_field(&DURATION_REGEX, file, line, text, "duration")?;

    Ok(HitchRecord {
        file: file.to_string(),
        line,
        thread,
        duration_ms,
    })
}

/// `... footprint: F MiB at run time: T`
pub fn parse_memory(file: &str, line: usize, text: &str) -> Result<MemoryRecord, ExtractError> {
    let footprint_mib = number_field(&FOOTPRINT_REGEX, file, line, text, "footprint")?;
    let run_time_secs = number_field(&RUN_TIME_REGEX, file, line, text, "run time")?;

    Ok(MemoryRecord {
        file: file.to_string(),
        line,
        footprint_mib,
        run_time_secs,
    })
}

/// Message runs from the error marker to the end of the block; the error type is
/// the token right before the first `: ` inside the message.
pub fn parse_error(
    file: &str,
    line: usize,
    text: &str,
    marker: &str,
) -> Result<ErrorRecord, ExtractError> {
    let message = text
        .find(marker)
        .map(|start| text[start..].trim_end())
        .filter(|message| !message.is_empty())
        .ok_or_else(|| missing(file, line, "message"))?;
    let error_type = capture(&ERROR_TYPE_REGEX, message)
        .ok_or_else(|| missing(file, line, "error type"))?;

    Ok(ErrorRecord {
        file: file.to_string(),
        line,
        error_type: error_type.to_string(),
        message: message.to_string(),
    })
}

fn capture<'t>(regex: &Regex, text: &'t str) -> Option<&'t str> {
    regex
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn number_field(
    regex: &Regex,
    file: &str,
    line: usize,
    text: &str,
    field: &'static str,
) -> Result<f64, ExtractError> {
    let raw = capture(regex, text).ok_or_else(|| missing(file, line, field))?;
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
        _ => Err(ExtractError::InvalidNumber {
            file: file.to_string(),
            line,
            field,
            value: raw.to_string(),
        }),
    }
}

fn missing(file: &str, line: usize, field: &'static str) -> ExtractError {
    ExtractError::MissingField {
        file: file.to_string(),
        line,
        field,
    }
}
