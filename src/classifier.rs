use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::debug;

use crate::config::MarkerConfig;
use crate::error_handling::ClassificationError;

/// Semantic category of a classified unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Category {
    Hitch,
    MemorySample,
    ErrorBlock,
    Uncategorized,
}

impl Category {
    /// Categories that produce a report, in report order
    pub const REPORTED: [Category; 3] = [
        Category::Hitch,
        Category::MemorySample,
        Category::ErrorBlock,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Hitch => "hitch",
            Category::MemorySample => "memory",
            Category::ErrorBlock => "error",
            Category::Uncategorized => "uncategorized",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One line, or one error block, tagged with its category
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedUnit {
    pub category: Category,
    pub file: String,
    /// 1-based line the unit starts on
    pub line: usize,
    /// Last line belonging to the unit; equals `line` for single-line units
    pub end_line: usize,
    /// Line text without its terminator; block lines are joined with '\n'
    pub text: String,
    /// False only for an error block that ran into end of file
    pub terminated: bool,
}

impl ClassifiedUnit {
    fn single(category: Category, file: &str, line: usize, text: &str) -> Self {
        Self {
            category,
            file: file.to_string(),
            line,
            end_line: line,
            text: text.to_string(),
            terminated: true,
        }
    }

    /// Number of physical lines covered by this unit
    pub fn line_count(&self) -> usize {
        self.end_line - self.line + 1
    }
}

struct OpenBlock {
    start: usize,
    end: usize,
    lines: Vec<String>,
}

enum State {
    Normal,
    InErrorBlock(OpenBlock),
}

/// Per-file classification state machine.
///
/// In the normal state every line is tested against the hitch, memory and error
/// markers, first match wins. An error line opens a block that swallows every
/// following line until one starts with the record-start delimiter; that line
/// closes the block and is then classified on its own.
pub struct Classifier<'a> {
    markers: &'a MarkerConfig,
    file: String,
    state: State,
    line_number: usize,
}

impl<'a> Classifier<'a> {
    pub fn new(markers: &'a MarkerConfig, file: impl Into<String>) -> Self {
        Self {
            markers,
            file: file.into(),
            state: State::Normal,
            line_number: 0,
        }
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    /// Number of lines fed so far, continuation lines included
    pub fn lines_consumed(&self) -> usize {
        self.line_number
    }

    pub fn in_error_block(&self) -> bool {
        matches!(self.state, State::InErrorBlock(_))
    }

    /// Category a line would get in the normal state
    pub fn categorize(&self, line: &str) -> Category {
        if line.contains(self.markers.hitch.as_str()) {
            Category::Hitch
        } else if line.contains(self.markers.memory.as_str()) {
            Category::MemorySample
        } else if line.contains(self.markers.error.as_str()) {
            Category::ErrorBlock
        } else {
            Category::Uncategorized
        }
    }

    /// Feed the next physical line. Returns the units completed by it: none while
    /// an error block is accumulating, up to two when a delimiter line closes a
    /// block and is itself a single-line unit.
    pub fn feed_line(&mut self, line: &str) -> Vec<ClassifiedUnit> {
        self.line_number += 1;
        let line = line.trim_end_matches(['\n', '\r']);
        let mut completed = Vec::new();

        if let State::InErrorBlock(mut block) = std::mem::replace(&mut self.state, State::Normal) {
            if !line.starts_with(self.markers.record_start) {
                block.lines.push(line.to_string());
                block.end = self.line_number;
                self.state = State::InErrorBlock(block);
                return completed;
            }
            completed.push(self.close_block(block, true));
        }

        match self.categorize(line) {
            Category::ErrorBlock => {
                self.state = State::InErrorBlock(OpenBlock {
                    start: self.line_number,
                    end: self.line_number,
                    lines: vec![line.to_string()],
                });
            }
            category => {
                completed.push(ClassifiedUnit::single(
                    category,
                    &self.file,
                    self.line_number,
                    line,
                ));
            }
        }

        completed
    }

    /// Flush an error block still open at end of input
    pub fn finish(&mut self) -> Option<ClassifiedUnit> {
        match std::mem::replace(&mut self.state, State::Normal) {
            State::InErrorBlock(block) => {
                debug!(
                    file = %self.file,
                    line = block.start,
                    "error block reached end of file without a closing delimiter"
                );
                Some(self.close_block(block, false))
            }
            State::Normal => None,
        }
    }

    fn close_block(&self, block: OpenBlock, terminated: bool) -> ClassifiedUnit {
        ClassifiedUnit {
            category: Category::ErrorBlock,
            file: self.file.clone(),
            line: block.start,
            end_line: block.end,
            text: block.lines.join("\n"),
            terminated,
        }
    }
}

/// Stream every line of `reader` through a fresh classifier, handing completed units to `sink`.
///
/// Returns the number of lines read. A read failure stops the scan: units
/// already completed stay delivered and an open error block is flushed before
/// the error is returned.
pub fn classify_reader<R, F>(
    mut reader: R,
    markers: &MarkerConfig,
    file: &str,
    mut sink: F,
) -> Result<usize, ClassificationError>
where
    R: BufRead,
    F: FnMut(ClassifiedUnit),
{
    let mut classifier = Classifier::new(markers, file);
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {
                for unit in classifier.feed_line(&line) {
                    sink(unit);
                }
            }
            Err(source) => {
                let failed_line = classifier.lines_consumed() + 1;
                if let Some(unit) = classifier.finish() {
                    sink(unit);
                }
                return Err(ClassificationError {
                    file: classifier.file().to_string(),
                    line: failed_line,
                    source,
                });
            }
        }
    }

    if let Some(unit) = classifier.finish() {
        sink(unit);
    }

    Ok(classifier.lines_consumed())
}

/// Open `path` and classify it. The handle is dropped on every return path.
pub fn classify_file<F>(
    path: &Path,
    markers: &MarkerConfig,
    file: &str,
    sink: F,
) -> Result<usize, ClassificationError>
where
    F: FnMut(ClassifiedUnit),
{
    let handle = File::open(path).map_err(|source| ClassificationError {
        file: file.to_string(),
        line: 0,
        source,
    })?;
    classify_reader(BufReader::new(handle), markers, file, sink)
}
