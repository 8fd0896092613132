use serde::{Deserialize, Serialize};

use crate::search::{Baseline, RankedSite, SearchOutcome};

/// One ranked fault location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Source document
    pub file: String,
    /// First line of the span
    pub start_line: u32,
    /// Last line of the span
    pub end_line: u32,
    /// First column of the span
    pub start_column: u32,
    /// Column after the span
    pub end_column: u32,
    /// Number of distinct failing tests a substitution here fixed
    pub fixed_failing_tests: usize,
    /// Site id
    pub site: u32,
    /// Enclosing `Class::method`
    pub method: String,
    /// The fixed tests
    pub tests: Vec<String>,
}

impl From<&RankedSite> for ReportEntry {
    fn from(ranked: &RankedSite) -> Self {
        let loc = &ranked.site.location;
        Self {
            file: loc.document.clone(),
            start_line: loc.start_line,
            end_line: loc.end_line,
            start_column: loc.start_column,
            end_column: loc.end_column,
            fixed_failing_tests: ranked.fixed_tests.len(),
            site: ranked.site.id,
            method: ranked.site.method.clone(),
            tests: ranked.fixed_tests.clone(),
        }
    }
}

/// Localization report with run statistics and ranked locations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizationReport {
    /// Tests in the baseline
    pub total_tests: usize,
    /// Tests that failed in the baseline
    pub failing_tests: usize,
    /// Replays executed during the search
    pub trials: usize,
    /// Replays that were neither pass nor fail
    pub inconclusive_trials: usize,
    /// Ranked locations, best first
    pub entries: Vec<ReportEntry>,
}

impl LocalizationReport {
    /// Build a report from the driver's results
    pub fn new(baseline: &Baseline, outcome: &SearchOutcome, ranked: &[RankedSite]) -> Self {
        Self {
            total_tests: baseline.results.len(),
            failing_tests: baseline.failing().len(),
            trials: outcome.trials,
            inconclusive_trials: outcome.inconclusive.len(),
            entries: ranked.iter().map(ReportEntry::from).collect(),
        }
    }

    /// Whether no location was found
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Generate a human-readable summary
    pub fn summary(&self) -> String {
        let mut output = format!(
            "Localization Results:\n\
             Tests: {}\n\
             Failing: {}\n\
             Trials: {} ({} inconclusive)\n\
             Candidate locations: {}",
            self.total_tests,
            self.failing_tests,
            self.trials,
            self.inconclusive_trials,
            self.entries.len()
        );
        for (rank, entry) in self.entries.iter().enumerate() {
            output.push_str(&format!(
                "\n  {}. {}:{}:{}-{}:{} fixes {} ({})",
                rank + 1,
                entry.file,
                entry.start_line,
                entry.start_column,
                entry.end_line,
                entry.end_column,
                entry.fixed_failing_tests,
                entry.method
            ));
        }
        output
    }

    /// Export report as JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Import report from JSON
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
