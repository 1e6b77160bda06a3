//! Error types for skill loading and queries

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::report::LoadReport;

/// A skill name claimed by more than one source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duplicate {
    /// Normalized skill name
    pub name: String,
    /// Every file that declared the name, in load order
    pub paths: Vec<PathBuf>,
}

impl fmt::Display for Duplicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let paths: Vec<String> = self
            .paths
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        write!(f, "duplicate skill '{}' in {}", self.name, paths.join(", "))
    }
}

/// Skill loader errors
#[derive(Debug, Error)]
pub enum SkillError {
    /// Document has neither an H1 title nor a front-matter title
    #[error("{}: missing '# Title' heading", display_path(.path.as_ref()))]
    MissingTitle {
        /// Offending file, when parsed from disk
        path: Option<PathBuf>,
    },

    /// Name derived from front-matter, file stem or title is empty
    #[error("{}: cannot derive a skill name from '{raw}'", display_path(.path.as_ref()))]
    InvalidName {
        /// Offending file, when parsed from disk
        path: Option<PathBuf>,
        /// Text the name was derived from
        raw: String,
    },

    /// YAML front-matter could not be parsed
    #[error("{}: invalid front-matter: {source}", display_path(.path.as_ref()))]
    FrontMatter {
        /// Offending file, when parsed from disk
        path: Option<PathBuf>,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// A skill file could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        /// Unreadable file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A skill file is not valid UTF-8
    #[error("{}: not valid UTF-8: {source}", .path.display())]
    InvalidUtf8 {
        /// Offending file
        path: PathBuf,
        /// Underlying decoding error
        #[source]
        source: std::string::FromUtf8Error,
    },

    /// Loading did not finish within the configured bound
    #[error("skill loading timed out after {timeout_secs}s")]
    LoadTimeout {
        /// Configured bound in seconds
        timeout_secs: u64,
    },

    /// Two or more files derive the same skill name. The report holds every
    /// other issue found in the same load, duplicates included.
    #[error("{}", join_duplicates(.duplicates))]
    DuplicateSkills {
        /// Every name claimed more than once
        duplicates: Vec<Duplicate>,
        /// Full report of the failed load
        report: Box<LoadReport>,
    },

    /// No skill answers to the given name or keyword
    #[error("skill '{0}' not found")]
    NotFound(String),

    /// A parse task panicked or was cancelled
    #[error("load task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Internal grammar failed to compile
    #[error("pattern error: {0}")]
    Pattern(#[from] regex::Error),
}

impl SkillError {
    /// Report of the failed load, when the error carries one
    pub fn report(&self) -> Option<&LoadReport> {
        match self {
            SkillError::DuplicateSkills { report, .. } => Some(&**report),
            _ => None,
        }
    }
}

fn display_path(path: Option<&PathBuf>) -> String {
    path.map_or_else(|| "<inline>".to_string(), |p| p.display().to_string())
}

fn join_duplicates(duplicates: &[Duplicate]) -> String {
    duplicates
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, SkillError>;
