//! Spawner Types - Core types for the skill loader
//!
//! A skill is one Markdown document describing patterns, anti-patterns,
//! sharp edges and collaboration hand-offs for an engineering domain. These
//! types are the normalized, immutable form of such a document.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod severity;
pub mod trigger;

pub use severity::{Severity, SeverityParseError};
pub use trigger::TriggerPattern;

/// A recommended practice
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    pub description: String,
    pub when_to_use: String,
}

/// A practice to avoid, with what to do instead
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntiPattern {
    pub name: String,
    pub description: String,
    pub instead: String,
}

/// A documented production gotcha
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharpEdge {
    pub severity: Severity,
    pub title: String,
    pub situation: String,
    pub why_it_happens: String,
    /// May contain fenced code blocks, kept verbatim
    pub solution: String,
    /// Ordered set: duplicates are dropped on insert
    pub symptoms: Vec<String>,
}

impl SharpEdge {
    pub fn new(severity: Severity, title: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.into(),
            situation: String::new(),
            why_it_happens: String::new(),
            solution: String::new(),
            symptoms: Vec::new(),
        }
    }

    /// Add a symptom unless an identical one is already listed
    pub fn add_symptom(&mut self, symptom: impl Into<String>) {
        let symptom = symptom.into();
        if !symptom.is_empty() && !self.symptoms.contains(&symptom) {
            self.symptoms.push(symptom);
        }
    }
}

/// A routing rule: when the trigger fires, hand the work to another skill
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffRule {
    pub trigger: TriggerPattern,
    pub delegate_to: String,
    pub context: String,
}

/// One parsed skill document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillRecord {
    pub name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Activation keywords routing work directly to this skill
    #[serde(default)]
    pub triggers: TriggerPattern,
    #[serde(default)]
    pub identity: String,
    #[serde(default)]
    pub expertise: Vec<String>,
    #[serde(default)]
    pub patterns: Vec<Pattern>,
    #[serde(default)]
    pub anti_patterns: Vec<AntiPattern>,
    #[serde(default)]
    pub sharp_edges: Vec<SharpEdge>,
    #[serde(default)]
    pub handoff_rules: Vec<HandoffRule>,
    #[serde(default)]
    pub receives_from: Vec<String>,
    #[serde(default)]
    pub works_well_with: Vec<String>,
    /// File the record was parsed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<PathBuf>,
}

impl SkillRecord {
    pub fn new(name: &str, title: impl Into<String>) -> Self {
        Self {
            name: normalize_skill_name(name),
            title: title.into(),
            ..Self::default()
        }
    }

    /// Distinct hand-off delegates in declaration order
    pub fn handoff_targets(&self) -> Vec<String> {
        let mut targets: Vec<String> = Vec::new();
        for rule in &self.handoff_rules {
            if !targets.contains(&rule.delegate_to) {
                targets.push(rule.delegate_to.clone());
            }
        }
        targets
    }

    /// Every skill name this record points at, with the field it came from
    pub fn references(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.handoff_rules
            .iter()
            .map(|r| ("delegate_to", r.delegate_to.as_str()))
            .chain(self.receives_from.iter().map(|n| ("receives_from", n.as_str())))
            .chain(
                self.works_well_with
                    .iter()
                    .map(|n| ("works_well_with", n.as_str())),
            )
    }

    /// Most serious sharp edge, if any
    pub fn max_severity(&self) -> Option<Severity> {
        self.sharp_edges.iter().map(|e| e.severity).max()
    }
}

/// Canonical form of a skill name: lowercase words joined by `-`
///
/// `"Caching Patterns"`, `"caching_patterns"` and `` "`caching-patterns`" ``
/// all normalize to `caching-patterns`.
pub fn normalize_skill_name(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_dash = false;

    for c in raw.trim().chars() {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    out
}

/// Push `value` onto an ordered set
pub fn push_unique(list: &mut Vec<String>, value: String) {
    if !value.is_empty() && !list.contains(&value) {
        list.push(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_skill_name() {
        assert_eq!(normalize_skill_name("Caching Patterns"), "caching-patterns");
        assert_eq!(normalize_skill_name("`caching_patterns`"), "caching-patterns");
        assert_eq!(normalize_skill_name("  CI/CD  "), "ci-cd");
        assert_eq!(normalize_skill_name("**backend**"), "backend");
        assert_eq!(normalize_skill_name("---"), "");
    }

    #[test]
    fn test_symptoms_are_an_ordered_set() {
        let mut edge = SharpEdge::new(Severity::High, "Stampede");
        edge.add_symptom("latency spike");
        edge.add_symptom("db cpu at 100%");
        edge.add_symptom("latency spike");
        edge.add_symptom("");
        assert_eq!(edge.symptoms, vec!["latency spike", "db cpu at 100%"]);
    }

    #[test]
    fn test_handoff_targets_and_references() {
        let mut record = SkillRecord::new("Backend", "Backend");
        assert_eq!(record.name, "backend");
        for target in ["frontend", "devops", "frontend"] {
            record.handoff_rules.push(HandoffRule {
                trigger: TriggerPattern::parse("x"),
                delegate_to: target.to_string(),
                context: String::new(),
            });
        }
        record.receives_from.push("product".to_string());

        assert_eq!(record.handoff_targets(), vec!["frontend", "devops"]);
        let refs: Vec<_> = record.references().collect();
        assert_eq!(refs.len(), 4);
        assert_eq!(refs[3], ("receives_from", "product"));
    }

    #[test]
    fn test_max_severity() {
        let mut record = SkillRecord::new("caching", "Caching");
        assert_eq!(record.max_severity(), None);
        record.sharp_edges.push(SharpEdge::new(Severity::Medium, "a"));
        record.sharp_edges.push(SharpEdge::new(Severity::Critical, "b"));
        assert_eq!(record.max_severity(), Some(Severity::Critical));
    }
}
