// tests/common/mod.rs
// Shared fixtures for integration tests
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use logparser::ParserConfig;
use tempfile::TempDir;

pub const TS: &str = "[01Jan23_00:00:00.000]";

pub fn hitch_line(thread: &str, duration: &str) -> String {
    format!(
        "{} - WARNING - Hitch reported on thread: [{}] with a duration of: {}ms",
        TS, thread, duration
    )
}

pub fn memory_line(footprint: &str, run_time: &str) -> String {
    format!(
        "{} - INFO - Current virtual memory footprint: {} MiB at run time: {}",
        TS, footprint, run_time
    )
}

pub fn spam_line() -> String {
    format!("{} - INFO - this is an arbitrary log", TS)
}

/// Error marker line followed by a Python-style traceback; `frames` extra frame lines
pub fn error_block(frames: usize) -> Vec<String> {
    let mut lines = vec![
        format!("{} - ERROR - name 'x' is not defined", TS),
        "Traceback (most recent call last):".to_string(),
    ];
    for i in 0..frames {
        lines.push(format!(
            "  File \"CreateArbitraryLog.py\", line {}, in printErrorLog",
            140 + i
        ));
    }
    lines.push("NameError: name 'x' is not defined".to_string());
    lines
}

/// Temporary working directory laid out like a real run: logs in `Logs/`, reports at the root
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir(dir.path().join("Logs")).expect("Failed to create Logs dir");
        Self { dir }
    }

    /// Workspace without a `Logs/` directory
    pub fn without_logs() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn config(&self) -> ParserConfig {
        ParserConfig::rooted_at(self.path())
    }

    pub fn write_log(&self, name: &str, lines: &[String]) -> PathBuf {
        let path = self.path().join("Logs").join(name);
        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(&path, content).expect("Failed to write log");
        path
    }

    pub fn write_log_bytes(&self, name: &str, bytes: &[u8]) -> PathBuf {
        let path = self.path().join("Logs").join(name);
        fs::write(&path, bytes).expect("Failed to write log");
        path
    }

    /// Sorted names of CSV files at the workspace root
    pub fn report_files(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.path())
            .expect("Failed to read workspace")
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".csv"))
            .collect();
        names.sort();
        names
    }

    /// Header plus rows of a report
    pub fn read_report(&self, name: &str) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader =
            csv::Reader::from_path(self.path().join(name)).expect("Failed to open report");
        let header = reader
            .headers()
            .expect("Report has no header")
            .iter()
            .map(str::to_string)
            .collect();
        let rows = reader
            .records()
            .map(|r| r.expect("Bad row").iter().map(str::to_string).collect())
            .collect();
        (header, rows)
    }
}

/// Run the built binary with the workspace as working directory
pub fn run_logparser_in(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_logparser"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .expect("Failed to execute logparser");

    (
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
        output.status.code().unwrap_or(-1),
    )
}
