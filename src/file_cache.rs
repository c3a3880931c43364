use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use tracing::{info, warn};

use crate::config::InputConfig;
use crate::error_handling::CacheError;

/// A log file discovered in the input directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFile {
    /// Bare file name, used as the report's "Log Name"
    pub name: String,
    pub path: PathBuf,
}

/// Enumerate regular files in `config.dir` whose names match `config.file_pattern`,
/// sorted by name.
pub fn cache_logs(config: &InputConfig) -> Result<Vec<LogFile>, CacheError> {
    let pattern = Pattern::new(&config.file_pattern).map_err(|source| CacheError::InvalidPattern {
        pattern: config.file_pattern.clone(),
        source,
    })?;

    if !config.dir.is_dir() {
        return Err(CacheError::MissingDirectory(config.dir.clone()));
    }

    let entries = fs::read_dir(&config.dir).map_err(|source| CacheError::ReadDir {
        path: config.dir.clone(),
        source,
    })?;

    let mut logs = Vec::new();
    for entry in entries {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("skipping unreadable entry in {}: {}", config.dir.display(), e);
                continue;
            }
        };

        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            warn!(
                "skipping non UTF-8 file name {:?} in {}",
                entry.file_name(),
                config.dir.display()
            );
            continue;
        };
        if !pattern.matches(&name) || !is_regular_file(&entry.path()) {
            continue;
        }

        logs.push(LogFile {
            path: entry.path(),
            name,
        });
    }

    logs.sort_by(|a, b| a.name.cmp(&b.name));
    for log in &logs {
        info!("found log: {}", log.name);
    }

    Ok(logs)
}

fn is_regular_file(path: &Path) -> bool {
    fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
}
