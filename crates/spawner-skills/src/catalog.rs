//! Query and selection API
//!
//! A [`SkillCatalog`] is one immutable snapshot: the store plus everything
//! derived from it. All queries are read-only.

use chrono::{DateTime, Utc};
use serde::Serialize;
use spawner_types::{normalize_skill_name, SkillRecord};
use std::collections::BTreeSet;

use crate::error::{Result, SkillError};
use crate::graph::CollaborationGraph;
use crate::matcher::{TriggerMatch, TriggerMatcher};
use crate::report::LoadReport;
use crate::store::SkillStore;

/// A routing decision for a task
#[derive(Debug, Clone, Serialize)]
pub struct Route<'a> {
    /// Skill the task should go to
    pub skill: String,
    /// The loaded record, `None` for a dangling delegate
    #[serde(skip)]
    pub record: Option<&'a SkillRecord>,
    /// Rule that produced the decision
    pub rule: TriggerMatch,
}

/// Who a skill works with
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Collaborators {
    /// Skill the answer is about
    pub name: String,
    /// Declared "Receives Work From" list
    pub receives_from: Vec<String>,
    /// Declared "Works Well With" list
    pub works_well_with: Vec<String>,
    /// Distinct delegates of the hand-off table
    pub handoff_targets: Vec<String>,
    /// Graph view: skills that hand work to this one
    pub upstream: BTreeSet<String>,
    /// Graph view: skills this one hands work to
    pub downstream: BTreeSet<String>,
}

/// Immutable snapshot of loaded skills with derived indexes
#[derive(Debug, Clone)]
pub struct SkillCatalog {
    store: SkillStore,
    graph: CollaborationGraph,
    matcher: TriggerMatcher,
    report: LoadReport,
    loaded_at: DateTime<Utc>,
}

impl SkillCatalog {
    /// Derive the graph and matcher from a loaded store
    pub fn new(store: SkillStore, report: LoadReport) -> Self {
        let graph = CollaborationGraph::build(&store);
        let matcher = TriggerMatcher::build(&store);
        Self {
            store,
            graph,
            matcher,
            report,
            loaded_at: Utc::now(),
        }
    }

    /// A catalog with no skills
    pub fn empty() -> Self {
        Self::new(SkillStore::default(), LoadReport::default())
    }

    /// Underlying store
    pub fn store(&self) -> &SkillStore {
        &self.store
    }

    /// Collaboration graph
    pub fn graph(&self) -> &CollaborationGraph {
        &self.graph
    }

    /// Trigger matcher
    pub fn matcher(&self) -> &TriggerMatcher {
        &self.matcher
    }

    /// Report of the load that produced this snapshot
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// When this snapshot was built
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Find a skill by name, title, tag or trigger keyword.
    ///
    /// Lookup order: exact name, title, tag, activation keyword, then name
    /// substring. The first hit in load order wins.
    pub fn find_skill(&self, name_or_keyword: &str) -> Result<&SkillRecord> {
        let needle = name_or_keyword.trim();
        let lowered = needle.to_lowercase();
        let name = normalize_skill_name(needle);
        let records = self.store.records();

        self.store
            .lookup(&name)
            .or_else(|| records.iter().find(|r| r.title.to_lowercase() == lowered))
            .or_else(|| {
                records
                    .iter()
                    .find(|r| r.tags.iter().any(|t| t.to_lowercase() == lowered))
            })
            .or_else(|| {
                records
                    .iter()
                    .find(|r| r.triggers.keywords().iter().any(|k| *k == lowered))
            })
            .or_else(|| {
                if name.is_empty() {
                    None
                } else {
                    records.iter().find(|r| r.name.contains(&name))
                }
            })
            .ok_or_else(|| SkillError::NotFound(needle.to_string()))
    }

    /// Route a task description to skills.
    ///
    /// Returns one entry per destination skill, best first. The ranking is
    /// the matcher's; only the best rule per destination is kept. Empty when
    /// no trigger fires.
    pub fn route_task(&self, description: &str) -> Vec<Route<'_>> {
        let mut seen = BTreeSet::new();
        self.matcher
            .match_context(description)
            .into_iter()
            .filter(|m| seen.insert(m.delegate_to.clone()))
            .map(|rule| Route {
                skill: rule.delegate_to.clone(),
                record: self.store.lookup(&rule.delegate_to),
                rule,
            })
            .collect()
    }

    /// Hand-offs one skill would make for a context
    pub fn handoffs_from(&self, name: &str, context: &str) -> Result<Vec<TriggerMatch>> {
        let record = self.store.get(name)?;
        Ok(self.matcher.match_owner(&record.name, context))
    }

    /// Declared and derived collaborators of a skill
    pub fn collaborators(&self, name: &str) -> Result<Collaborators> {
        let record = self.store.get(name)?;
        Ok(Collaborators {
            name: record.name.clone(),
            receives_from: record.receives_from.clone(),
            works_well_with: record.works_well_with.clone(),
            handoff_targets: record.handoff_targets(),
            upstream: self.graph.upstream_of(&record.name).clone(),
            downstream: self.graph.downstream_of(&record.name).clone(),
        })
    }

    /// Concise skills list, sorted by name
    ///
    /// Format:
    /// - skill-name: summary or title
    pub fn generate_skills_list(&self) -> String {
        if self.store.is_empty() {
            return "No skills available".to_string();
        }

        let mut sorted: Vec<&SkillRecord> = self.store.all().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));

        sorted
            .iter()
            .map(|skill| {
                let about = skill.summary.as_deref().unwrap_or(&skill.title);
                format!("- {}: {}", skill.name, about)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for SkillCatalog {
    fn default() -> Self {
        Self::empty()
    }
}
