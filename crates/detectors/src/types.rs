use ast::{Located, SourceLocation, SourceRange};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::metadata::{Remediation, Tag};

/// Unique identifier for a detector, the rule key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DetectorId(pub String);

impl DetectorId {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DetectorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Severity level of a finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// Neither a bug nor a quality flaw, just a finding
    Info,
    /// Quality flaw with little impact
    Minor,
    /// Quality flaw that can highly impact performance or maintainability
    Major,
    /// Bug with a low probability to impact behaviour in production
    Critical,
    /// Bug with a high probability to impact behaviour in production
    Blocker,
}


impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Minor => write!(f, "MINOR"),
            Severity::Major => write!(f, "MAJOR"),
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::Blocker => write!(f, "BLOCKER"),
        }
    }
}

/// A finding reported by a detector, anchored at one node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    /// Detector that produced this finding
    pub detector_id: DetectorId,
    /// Severity of the issue
    pub severity: Severity,
    /// Human-readable description of the issue
    pub message: String,
    /// Location of the anchor node
    pub primary_location: SourceLocation,
    /// Tags of the rule at the time of reporting
    pub tags: Vec<Tag>,
    /// Estimated time to fix this occurrence
    pub remediation: Remediation,
    /// Suggested fix or mitigation
    pub fix_suggestion: Option<String>,
}

impl Finding {
    pub fn new(
        detector_id: DetectorId,
        severity: Severity,
        message: String,
        primary_location: SourceLocation,
    ) -> Self {
        Self {
            detector_id,
            severity,
            message,
            primary_location,
            tags: Vec::new(),
            remediation: Remediation::default(),
            fix_suggestion: None,
        }
    }

    pub fn with_tags(mut self, tags: &[Tag]) -> Self {
        self.tags.extend_from_slice(tags);
        self
    }

    pub fn with_remediation(mut self, remediation: Remediation) -> Self {
        self.remediation = remediation;
        self
    }

    /// Add a fix suggestion to this finding
    pub fn with_fix_suggestion(mut self, fix: String) -> Self {
        self.fix_suggestion = Some(fix);
        self
    }
}

/// Per-file sink detectors report into while the tree is walked.
///
/// Detectors only ever append; the registry drains the findings once the
/// walk is over.
#[derive(Debug)]
pub struct AnalysisContext {
    /// File path being analyzed
    pub file_path: String,
    /// Whether the file belongs to the test source set
    pub is_test: bool,
    findings: Vec<Finding>,
}

impl AnalysisContext {
    pub fn new(file_path: impl Into<String>, is_test: bool) -> Self {
        Self {
            file_path: file_path.into(),
            is_test,
            findings: Vec::new(),
        }
    }

    /// Create a source location for a range of the analyzed file
    pub fn create_location(&self, range: SourceRange) -> SourceLocation {
        SourceLocation::new(PathBuf::from(&self.file_path), range)
    }

    /// Create a source location covering a node of the analyzed file
    pub fn location_of(&self, node: &impl Located) -> SourceLocation {
        self.create_location(node.range())
    }

    /// Report a finding
    pub fn add_finding(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Findings reported so far, in report order
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    /// Drop every finding a detector reported so far
    pub fn discard_findings_from(&mut self, detector_id: &DetectorId) {
        self.findings.retain(|f| f.detector_id != *detector_id);
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }
}

/// Result of running the registry over one or more files
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// All findings from detectors
    pub findings: Vec<Finding>,
    /// Statistics about the analysis
    pub stats: AnalysisStats,
    /// Errors encountered during analysis
    pub errors: Vec<String>,
}

impl AnalysisResult {
    pub fn new() -> Self {
        Self {
            findings: Vec::new(),
            stats: AnalysisStats::new(),
            errors: Vec::new(),
        }
    }

    /// Add a finding to the results
    pub fn add_finding(&mut self, finding: Finding) {
        self.stats.record_finding(&finding);
        self.findings.push(finding);
    }

    /// Add an error to the results
    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }

    /// Fold the result of another file into this one
    pub fn merge(&mut self, other: AnalysisResult) {
        self.findings.extend(other.findings);
        self.errors.extend(other.errors);
        self.stats.merge(other.stats);
    }

    /// Get findings with a specific severity or higher
    pub fn findings_with_severity(&self, min_severity: Severity) -> Vec<&Finding> {
        self.findings
            .iter()
            .filter(|f| f.severity >= min_severity)
            .collect()
    }

    /// Get findings from a specific detector
    pub fn findings_from_detector(&self, detector_id: &DetectorId) -> Vec<&Finding> {
        self.findings
            .iter()
            .filter(|f| f.detector_id == *detector_id)
            .collect()
    }
}

impl Default for AnalysisResult {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the analysis
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisStats {
    /// Number of detectors run
    pub detectors_run: usize,
    /// Number of files walked
    pub files_analyzed: usize,
    /// Number of nodes entered during the walks
    pub nodes_visited: usize,
    /// Total execution time in milliseconds
    pub total_time_ms: u64,
    /// Number of findings by severity
    pub findings_by_severity: HashMap<String, usize>,
    /// Number of findings by detector
    pub findings_by_detector: HashMap<String, usize>,
}

impl AnalysisStats {
    pub fn new() -> Self {
        Self {
            detectors_run: 0,
            files_analyzed: 0,
            nodes_visited: 0,
            total_time_ms: 0,
            findings_by_severity: HashMap::new(),
            findings_by_detector: HashMap::new(),
        }
    }

    /// Update statistics with a new finding
    pub fn record_finding(&mut self, finding: &Finding) {
        let severity_key = finding.severity.to_string();
        *self.findings_by_severity.entry(severity_key).or_insert(0) += 1;

        let detector_key = finding.detector_id.to_string();
        *self.findings_by_detector.entry(detector_key).or_insert(0) += 1;
    }

    pub fn merge(&mut self, other: AnalysisStats) {
        self.detectors_run = self.detectors_run.max(other.detectors_run);
        self.files_analyzed += other.files_analyzed;
        self.nodes_visited += other.nodes_visited;
        self.total_time_ms += other.total_time_ms;
        for (key, count) in other.findings_by_severity {
            *self.findings_by_severity.entry(key).or_insert(0) += count;
        }
        for (key, count) in other.findings_by_detector {
            *self.findings_by_detector.entry(key).or_insert(0) += count;
        }
    }
}

impl Default for AnalysisStats {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ast::Position;

    fn finding(detector: &str, severity: Severity) -> Finding {
        let range = SourceRange::new(Position::new(1, 1, 0), Position::new(1, 10, 9));
        Finding::new(
            DetectorId::new(detector),
            severity,
            "message".to_string(),
            SourceLocation::new(PathBuf::from("pkg.pkb"), range),
        )
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Blocker > Severity::Critical);
        assert!(Severity::Major > Severity::Minor);
        assert!(Severity::Info < Severity::Minor);
        assert_eq!(Severity::Major.to_string(), "MAJOR");
    }

    #[test]
    fn test_result_records_stats() {
        let mut result = AnalysisResult::new();
        result.add_finding(finding("a", Severity::Major));
        result.add_finding(finding("a", Severity::Minor));
        result.add_finding(finding("b", Severity::Major));

        assert_eq!(result.stats.findings_by_severity["MAJOR"], 2);
        assert_eq!(result.stats.findings_by_detector["a"], 2);
        assert_eq!(result.findings_with_severity(Severity::Major).len(), 2);
        assert_eq!(result.findings_from_detector(&DetectorId::new("b")).len(), 1);
    }

    #[test]
    fn test_merge_accumulates() {
        let mut left = AnalysisResult::new();
        left.add_finding(finding("a", Severity::Major));
        left.stats.files_analyzed = 1;

        let mut right = AnalysisResult::new();
        right.add_finding(finding("a", Severity::Major));
        right.add_error("boom".to_string());
        right.stats.files_analyzed = 1;

        left.merge(right);
        assert_eq!(left.findings.len(), 2);
        assert_eq!(left.errors, vec!["boom".to_string()]);
        assert_eq!(left.stats.files_analyzed, 2);
        assert_eq!(left.stats.findings_by_detector["a"], 2);
    }

    #[test]
    fn test_context_discards_detector_findings() {
        let mut ctx = AnalysisContext::new("pkg.pkb", false);
        ctx.add_finding(finding("a", Severity::Major));
        ctx.add_finding(finding("b", Severity::Major));
        ctx.discard_findings_from(&DetectorId::new("a"));

        assert_eq!(ctx.findings().len(), 1);
        assert_eq!(ctx.findings()[0].detector_id, DetectorId::new("b"));
    }
}
