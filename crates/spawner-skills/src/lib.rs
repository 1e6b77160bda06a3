//! Spawner Skills
//!
//! Loads Markdown skill documents into an immutable, queryable catalog.
//!
//! ## Features
//!
//! - Tolerant Markdown parsing with YAML front-matter support
//! - Parallel loading with an overall timeout and a batch validation report
//! - Collaboration graph over hand-offs and "Receives Work From" lists
//! - Deterministic keyword routing of free-text tasks to skills
//! - Rendering a record back to its Markdown form
//!
//! ## Architecture
//!
//! Phase 1 (Discovery): find `<root>/<category>/<name>.md` files
//! Phase 2 (Load): parse every file in parallel, build the store, report issues
//! Phase 3 (Publish): derive graph and matcher, swap the snapshot in the hub

#![deny(unsafe_code, dead_code, unused_imports, unused_variables, missing_docs)]

pub mod catalog;
pub mod discovery;
pub mod error;
pub mod graph;
pub mod hub;
pub mod matcher;
pub mod parser;
pub mod render;
pub mod report;
pub mod store;

pub use spawner_types::{Severity, SkillRecord};

pub use catalog::{Collaborators, Route, SkillCatalog};
pub use discovery::{discover_skill_files, SkillFile};
pub use error::{Result, SkillError};
pub use graph::CollaborationGraph;
pub use hub::{HubConfig, SkillHub};
pub use matcher::{RuleKind, TriggerMatch, TriggerMatcher};
pub use parser::{parse_skill, ParsedSkill};
pub use render::render_skill;
pub use report::{IssueLevel, LoadIssue, LoadReport};
pub use store::SkillStore;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{HubConfig, SkillCatalog, SkillHub, SkillRecord, SkillStore};
}
