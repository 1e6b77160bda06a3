//! Batch validation report
//!
//! Problems that do not stop a load are collected here so a maintainer sees
//! every offending file and section in one pass.

use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// How serious a load issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueLevel {
    /// Suspicious but harmless, e.g. a dangling reference
    Warning,
    /// Content was rejected, e.g. an unknown severity
    Error,
}

impl fmt::Display for IssueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueLevel::Warning => f.write_str("warning"),
            IssueLevel::Error => f.write_str("error"),
        }
    }
}

/// One non-fatal problem found while loading
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadIssue {
    /// Warning or error
    pub level: IssueLevel,
    /// Source file, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Skill the issue belongs to, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skill: Option<String>,
    /// Human-readable description
    pub message: String,
}

impl LoadIssue {
    /// Create a warning
    pub fn warning(path: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Warning,
            path: path.map(Path::to_path_buf),
            skill: None,
            message: message.into(),
        }
    }

    /// Create an error
    pub fn error(path: Option<&Path>, message: impl Into<String>) -> Self {
        Self {
            level: IssueLevel::Error,
            path: path.map(Path::to_path_buf),
            skill: None,
            message: message.into(),
        }
    }

    /// Attach the skill name
    #[must_use]
    pub fn for_skill(mut self, skill: impl Into<String>) -> Self {
        self.skill = Some(skill.into());
        self
    }
}

impl fmt::Display for LoadIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.level)?;
        if let Some(path) = &self.path {
            write!(f, " [{}]", path.display())?;
        }
        if let Some(skill) = &self.skill {
            write!(f, " ({skill})")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Summary of one load cycle
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Number of skills that made it into the store
    pub loaded: usize,
    /// Files that were skipped because they could not be parsed
    pub skipped: Vec<PathBuf>,
    /// Every issue, in discovery order
    pub issues: Vec<LoadIssue>,
}

impl LoadReport {
    /// Record an issue
    pub fn push(&mut self, issue: LoadIssue) {
        self.issues.push(issue);
    }

    /// Whether any issue is an error
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.level == IssueLevel::Error)
    }

    /// Issues at error level
    pub fn errors(&self) -> impl Iterator<Item = &LoadIssue> {
        self.issues.iter().filter(|i| i.level == IssueLevel::Error)
    }

    /// Issues at warning level
    pub fn warnings(&self) -> impl Iterator<Item = &LoadIssue> {
        self.issues.iter().filter(|i| i.level == IssueLevel::Warning)
    }
}

impl fmt::Display for LoadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} skill(s) loaded, {} file(s) skipped, {} error(s), {} warning(s)",
            self.loaded,
            self.skipped.len(),
            self.errors().count(),
            self.warnings().count()
        )?;
        for issue in &self.issues {
            writeln!(f, "  {issue}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_report_lists_every_issue() {
        let mut report = LoadReport {
            loaded: 2,
            ..LoadReport::default()
        };
        report.push(LoadIssue::warning(Some(Path::new("a.md")), "dangling").for_skill("a"));
        report.push(LoadIssue::error(Some(Path::new("b.md")), "bad severity"));

        assert!(report.has_errors());
        let text = report.to_string();
        assert!(text.starts_with("2 skill(s) loaded, 0 file(s) skipped, 1 error(s), 1 warning(s)"));
        assert!(text.contains("warning [a.md] (a): dangling"));
        assert!(text.contains("error [b.md]: bad severity"));
    }

    #[test]
    fn test_warnings_only_is_not_an_error() {
        let mut report = LoadReport::default();
        report.push(LoadIssue::warning(None, "odd row"));
        assert!(!report.has_errors());
        assert_eq!(report.warnings().count(), 1);
    }
}
