use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::classifier::Category;

/// Phases of a run, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Cache,
    Classify,
    Write,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Cache, Phase::Classify, Phase::Write];

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Cache => "cache",
            Phase::Classify => "classify",
            Phase::Write => "write",
        }
    }
}

/// Statistics collected during a run. Purely observational.
#[derive(Debug, Clone, Default)]
pub struct ProcessingStats {
    pub files_found: usize,
    pub files_processed: usize,
    pub files_failed: usize,
    pub lines_read: usize,
    /// Classified units per category, dropped ones included
    pub units: BTreeMap<Category, usize>,
    /// Records that made it into a report buffer
    pub records: BTreeMap<Category, usize>,
    pub records_dropped: usize,
    pub reports_written: usize,
    pub phase_times: BTreeMap<Phase, Duration>,
    pub total_time: Duration,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_unit(&mut self, category: Category) {
        *self.units.entry(category).or_insert(0) += 1;
    }

    pub fn unit_count(&self, category: Category) -> usize {
        self.units.get(&category).copied().unwrap_or(0)
    }

    pub fn add_record(&mut self, category: Category) {
        *self.records.entry(category).or_insert(0) += 1;
    }

    pub fn record_count(&self, category: Category) -> usize {
        self.records.get(&category).copied().unwrap_or(0)
    }

    /// Run `f` and add its wall-clock time to `phase`
    pub fn time_phase<T>(&mut self, phase: Phase, f: impl FnOnce(&mut Self) -> T) -> T {
        let start = Instant::now();
        let result = f(self);
        *self.phase_times.entry(phase).or_default() += start.elapsed();
        result
    }

    pub fn phase_time(&self, phase: Phase) -> Duration {
        self.phase_times.get(&phase).copied().unwrap_or_default()
    }

    pub fn format_stats(&self) -> String {
        let mut output = format!(
            "Files processed: {} of {}",
            self.files_processed, self.files_found
        );
        if self.files_failed > 0 {
            output.push_str(&format!(" ({} failed)", self.files_failed));
        }

        output.push_str(&format!(
            "; Lines read: {}; Hitches: {}, Memory samples: {}, Errors: {}, Uncategorized lines: {}",
            self.lines_read,
            self.record_count(Category::Hitch),
            self.record_count(Category::MemorySample),
            self.record_count(Category::ErrorBlock),
            self.unit_count(Category::Uncategorized)
        ));

        if self.records_dropped > 0 {
            output.push_str(&format!(", {} dropped", self.records_dropped));
        }

        output.push_str(&format!("; Reports written: {}", self.reports_written));

        let phases: Vec<String> = Phase::ALL
            .iter()
            .filter(|phase| self.phase_times.contains_key(*phase))
            .map(|&phase| format!("{} {}ms", phase.as_str(), self.phase_time(phase).as_millis()))
            .collect();
        if !phases.is_empty() {
            output.push_str(&format!(" ({})", phases.join(", ")));
        }

        output.push_str(&format!(" in {}ms", self.total_time.as_millis()));
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_counts() {
        let mut stats = ProcessingStats::new();
        stats.add_unit(Category::Hitch);
        stats.add_unit(Category::Hitch);
        stats.add_unit(Category::Uncategorized);

        assert_eq!(stats.unit_count(Category::Hitch), 2);
        assert_eq!(stats.unit_count(Category::MemorySample), 0);
        assert_eq!(stats.unit_count(Category::Uncategorized), 1);
    }

    #[test]
    fn test_record_counts_exclude_dropped_units() {
        let mut stats = ProcessingStats::new();
        stats.add_unit(Category::MemorySample);
        stats.add_unit(Category::MemorySample);
        stats.add_record(Category::MemorySample);

        assert_eq!(stats.unit_count(Category::MemorySample), 2);
        assert_eq!(stats.record_count(Category::MemorySample), 1);
        assert_eq!(stats.record_count(Category::Hitch), 0);
    }

    #[test]
    fn test_time_phase_accumulates() {
        let mut stats = ProcessingStats::new();
        let value = stats.time_phase(Phase::Classify, |s| {
            s.lines_read += 10;
            7
        });
        stats.time_phase(Phase::Classify, |s| s.lines_read += 5);

        assert_eq!(value, 7);
        assert_eq!(stats.lines_read, 15);
        assert!(stats.phase_times.contains_key(&Phase::Classify));
        assert_eq!(stats.phase_time(Phase::Write), Duration::ZERO);
    }

    #[test]
    fn test_format_stats() {
        let mut stats = ProcessingStats::new();
        stats.files_found = 3;
        stats.files_processed = 2;
        stats.files_failed = 1;
        stats.lines_read = 120;
        stats.add_unit(Category::ErrorBlock);
        stats.add_unit(Category::Hitch);
        stats.add_unit(Category::Hitch);
        stats.add_record(Category::Hitch);
        stats.records_dropped = 2;
        stats.reports_written = 1;
        stats.phase_times.insert(Phase::Write, Duration::from_millis(5));
        stats.phase_times.insert(Phase::Cache, Duration::from_millis(3));
        stats.total_time = Duration::from_millis(45);

        let formatted = stats.format_stats();
        assert!(formatted.starts_with("Files processed: 2 of 3 (1 failed)"));
        assert!(formatted.contains("Lines read: 120"));
        assert!(formatted.contains("Hitches: 1,"));
        assert!(formatted.contains("Errors: 0"));
        assert!(formatted.contains("2 dropped"));
        assert!(formatted.contains("(cache 3ms, write 5ms)"));
        assert!(formatted.ends_with("in 45ms"));
    }
}
