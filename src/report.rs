use std::io;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::classifier::Category;
use crate::config::OutputConfig;
use crate::error_handling::ReportError;
use crate::record::{CategoryBuffers, ReportRow};

/// Result of writing one category
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportOutcome {
    Written {
        path: PathBuf,
        rows: usize,
        /// Names probed and found taken before `path`
        collisions: usize,
    },
    /// The category had no records, no file was created
    Skipped,
}

/// Per-category write result, in report order
#[derive(Debug)]
pub struct CategoryReport {
    pub category: Category,
    pub result: Result<ReportOutcome, ReportError>,
}

/// `HitchReport.csv` -> `HitchReport(2).csv` for `suffix == 2`; `suffix == 0` keeps the name
pub fn candidate_name(file_name: &str, suffix: usize) -> String {
    if suffix == 0 {
        return file_name.to_string();
    }

    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match path.extension() {
        Some(ext) => format!("{}({}).{}", stem, suffix, ext.to_string_lossy()),
        None => format!("{}({})", stem, suffix),
    }
}

/// Writes one CSV report per category into the output directory.
///
/// Rows are staged in a temporary file next to the target and moved into place
/// with no-clobber semantics, so an existing report is never overwritten and a
/// failed write never leaves a partial file behind.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    config: OutputConfig,
}

impl ReportWriter {
    pub fn new(config: OutputConfig) -> Self {
        Self { config }
    }

    /// Write every reported category in order. A failure in one category does not
    /// stop the others.
    pub fn write_all(&self, buffers: &CategoryBuffers) -> Vec<CategoryReport> {
        Category::REPORTED
            .iter()
            .map(|&category| {
                let result = match category {
                    Category::Hitch => self.write_category(&buffers.hitches),
                    Category::MemorySample => self.write_category(&buffers.memory),
                    Category::ErrorBlock => self.write_category(&buffers.errors),
                    Category::Uncategorized => Ok(ReportOutcome::Skipped),
                };
                CategoryReport { category, result }
            })
            .collect()
    }

    /// Write `records` under the configured name for their category
    pub fn write_category<R: ReportRow>(&self, records: &[R]) -> Result<ReportOutcome, ReportError> {
        let name = self
            .config
            .report_name(R::CATEGORY)
            .unwrap_or(R::CATEGORY.as_str());
        self.write_report(name, records)
    }

    pub fn write_report<R: ReportRow>(
        &self,
        file_name: &str,
        records: &[R],
    ) -> Result<ReportOutcome, ReportError> {
        let category = R::CATEGORY;
        if records.is_empty() {
            warn!(category = %category, "no {} records found, skipping {}", category, file_name);
            return Ok(ReportOutcome::Skipped);
        }

        let staged = self.stage(records)?;
        let (path, collisions) = self.persist(staged, file_name, category)?;

        info!(
            category = %category,
            rows = records.len(),
            "wrote {}",
            path.display()
        );
        Ok(ReportOutcome::Written {
            path,
            rows: records.len(),
            collisions,
        })
    }

    fn stage<R: ReportRow>(&self, records: &[R]) -> Result<NamedTempFile, ReportError> {
        let category = R::CATEGORY;
        let mut staged = tempfile::Builder::new()
            .prefix(".logparser-")
            .suffix(".tmp")
            .tempfile_in(&self.config.dir)
            .map_err(|source| ReportError::Stage {
                category,
                dir: self.config.dir.clone(),
                source,
            })?;

        {
            let mut writer = csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(staged.as_file_mut());
            let write_err = |source: csv::Error| ReportError::Write { category, source };

            writer.write_record(R::HEADER).map_err(write_err)?;
            for record in records {
                writer.serialize(record).map_err(write_err)?;
            }
            writer
                .flush()
                .map_err(|e| write_err(csv::Error::from(e)))?;
        }

        Ok(staged)
    }

    /// Probe `name`, `name(1)`, `name(2)`, ... and move the staged file onto the first free one
    fn persist(
        &self,
        staged: NamedTempFile,
        file_name: &str,
        category: Category,
    ) -> Result<(PathBuf, usize), ReportError> {
        let mut staged = staged;
        let mut suffix = 0;

        loop {
            let candidate = self.config.dir.join(candidate_name(file_name, suffix));
            if candidate.exists() {
                info!("{} already exists", candidate.display());
                suffix += 1;
                continue;
            }

            match staged.persist_noclobber(&candidate) {
                Ok(_) => return Ok((candidate, suffix)),
                Err(err) if err.error.kind() == io::ErrorKind::AlreadyExists => {
                    // Created between the probe and the persist
                    info!("{} already exists", candidate.display());
                    staged = err.file;
                    suffix += 1;
                }
                Err(err) => {
                    return Err(ReportError::Persist {
                        category,
                        path: candidate,
                        source: err.error,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{ErrorRecord, HitchRecord};
    use std::fs;
    use tempfile::TempDir;

    fn writer_in(dir: &TempDir) -> ReportWriter {
        ReportWriter::new(OutputConfig {
            dir: dir.path().to_path_buf(),
            ..OutputConfig::default()
        })
    }

    fn hitch(line: usize, thread: &str, duration_ms: f64) -> HitchRecord {
        HitchRecord {
            file: "sample.log".to_string(),
            line,
            thread: thread.to_string(),
            duration_ms,
        }
    }

    fn csv_files(dir: &TempDir) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.ends_with(".csv"))
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_candidate_name() {
        assert_eq!(candidate_name("HitchReport.csv", 0), "HitchReport.csv");
        assert_eq!(candidate_name("HitchReport.csv", 1), "HitchReport(1).csv");
        assert_eq!(candidate_name("HitchReport.csv", 12), "HitchReport(12).csv");
        assert_eq!(candidate_name("report", 3), "report(3)");
    }

    #[test]
    fn test_write_hitch_report() {
        let dir = TempDir::new().unwrap();
        let writer = writer_in(&dir);

        let outcome = writer
            .write_category(&[hitch(42, "MainThread", 123.45), hitch(50, "Worker 1", 30.0)])
            .unwrap();

        let path = dir.path().join("HitchReport.csv");
        assert_eq!(
            outcome,
            ReportOutcome::Written {
                path: path.clone(),
                rows: 2,
                collisions: 0
            }
        );
        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Log Name,Log Line,Thread,Duration (ms)");
        assert_eq!(lines[1], "sample.log,42,MainThread,123.45");
        assert_eq!(lines[2], "sample.log,50,Worker 1,30.0");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_multiline_messages_are_quoted() {
        let dir = TempDir::new().unwrap();
        let writer = writer_in(&dir);
        let record = ErrorRecord {
            file: "e.log".to_string(),
            line: 3,
            error_type: "NameError".to_string(),
            message: "ERROR - boom\nNameError: name 'x', \"y\"".to_string(),
        };

        writer.write_category(&[record.clone()]).unwrap();

        let mut reader = csv::Reader::from_path(dir.path().join("ErrorReport.csv")).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            vec!["Log Name", "Log Line", "Error Type", "Error Message"]
        );
        let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][3], record.message);
    }

    #[test]
    fn test_empty_category_is_skipped() {
        let dir = TempDir::new().unwrap();
        let writer = writer_in(&dir);

        let outcome = writer.write_category::<HitchRecord>(&[]).unwrap();
        assert_eq!(outcome, ReportOutcome::Skipped);
        assert!(csv_files(&dir).is_empty());
    }

    #[test]
    fn test_repeated_collisions_increment_suffix() {
        let dir = TempDir::new().unwrap();
        let writer = writer_in(&dir);
        let records = [hitch(1, "Main", 1.0)];

        for expected_collisions in 0..4 {
            match writer.write_category(&records).unwrap() {
                ReportOutcome::Written { collisions, .. } => {
                    assert_eq!(collisions, expected_collisions)
                }
                ReportOutcome::Skipped => panic!("expected a written report"),
            }
        }

        assert_eq!(
            csv_files(&dir),
            vec![
                "HitchReport(1).csv",
                "HitchReport(2).csv",
                "HitchReport(3).csv",
                "HitchReport.csv",
            ]
        );
    }

    #[test]
    fn test_existing_file_is_never_overwritten() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("HitchReport.csv"), "keep me").unwrap();
        let writer = writer_in(&dir);

        writer.write_category(&[hitch(1, "Main", 1.0)]).unwrap();

        assert_eq!(
            fs::read_to_string(dir.path().join("HitchReport.csv")).unwrap(),
            "keep me"
        );
        assert!(dir.path().join("HitchReport(1).csv").exists());
    }

    #[test]
    fn test_missing_output_dir_fails_without_partial_file() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(OutputConfig {
            dir: dir.path().join("gone"),
            ..OutputConfig::default()
        });

        let err = writer.write_category(&[hitch(1, "Main", 1.0)]).unwrap_err();
        assert!(matches!(err, ReportError::Stage { category: Category::Hitch, .. }));
        assert!(!dir.path().join("gone").exists());
    }

    #[test]
    fn test_write_all_isolates_categories() {
        let dir = TempDir::new().unwrap();
        let writer = writer_in(&dir);
        let mut buffers = CategoryBuffers::new();
        buffers.hitches.push(hitch(1, "Main", 1.0));

        let reports = writer.write_all(&buffers);
        let categories: Vec<Category> = reports.iter().map(|r| r.category).collect();
        assert_eq!(categories, Category::REPORTED.to_vec());
        assert!(matches!(reports[0].result, Ok(ReportOutcome::Written { rows: 1, .. })));
        assert!(matches!(reports[1].result, Ok(ReportOutcome::Skipped)));
        assert!(matches!(reports[2].result, Ok(ReportOutcome::Skipped)));
        assert_eq!(csv_files(&dir), vec!["HitchReport.csv"]);
    }
}
