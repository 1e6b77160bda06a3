//! Trigger matching
//!
//! Every skill contributes routing rules in declaration order: first its own
//! activation trigger (routing to itself), then its hand-off rules in
//! document order. A rule fires when one of its keywords appears in the task
//! context as a whole word, case-insensitively.
//!
//! Ranking is deterministic:
//! 1. longer matched keyword first (more specific),
//! 2. then declaration order.
//!
//! Within one rule the reported keyword is the one that occurs earliest in
//! the context; equal positions prefer the longer keyword.

use serde::Serialize;
use spawner_types::normalize_skill_name;
use std::cmp::Reverse;

use crate::store::SkillStore;

/// Where a rule came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// The skill's own trigger keywords
    Activation,
    /// A row of the skill's "When to Hand Off" table
    Handoff,
}

/// One routing rule flattened out of the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    /// Skill that declared the rule
    pub owner: String,
    /// Skill the work goes to
    pub delegate_to: String,
    /// Lowercase keyword alternatives
    pub keywords: Vec<String>,
    /// Hand-off context, or the skill summary for activation rules
    pub context: String,
    /// Activation or hand-off
    pub kind: RuleKind,
    /// Global declaration order
    pub order: usize,
}

/// A rule that fired for a context
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerMatch {
    /// Skill that declared the rule
    pub owner: String,
    /// Skill the work goes to
    pub delegate_to: String,
    /// Keyword that fired
    pub matched_keyword: String,
    /// Hand-off context
    pub context: String,
    /// Activation or hand-off
    pub kind: RuleKind,
    /// Global declaration order of the rule
    pub order: usize,
}

/// Matches free text against every routing rule in a store
#[derive(Debug, Clone, Default)]
pub struct TriggerMatcher {
    rules: Vec<CompiledRule>,
}

impl TriggerMatcher {
    /// Compile the rules of every skill, in store order
    pub fn build(store: &SkillStore) -> Self {
        let mut rules = Vec::new();

        for record in store.all() {
            if !record.triggers.is_empty() {
                rules.push(CompiledRule {
                    owner: record.name.clone(),
                    delegate_to: record.name.clone(),
                    keywords: record.triggers.keywords().to_vec(),
                    context: record.summary.clone().unwrap_or_else(|| record.title.clone()),
                    kind: RuleKind::Activation,
                    order: rules.len(),
                });
            }
            for rule in &record.handoff_rules {
                rules.push(CompiledRule {
                    owner: record.name.clone(),
                    delegate_to: rule.delegate_to.clone(),
                    keywords: rule.trigger.keywords().to_vec(),
                    context: rule.context.clone(),
                    kind: RuleKind::Handoff,
                    order: rules.len(),
                });
            }
        }

        Self { rules }
    }

    /// All compiled rules in declaration order
    pub fn rules(&self) -> &[CompiledRule] {
        &self.rules
    }

    /// Every rule that fires for `context`, ranked. Empty when nothing
    /// matches.
    pub fn match_context(&self, context: &str) -> Vec<TriggerMatch> {
        rank(self.rules.iter(), context)
    }

    /// Hand-off rules of one skill that fire for `context`, ranked
    pub fn match_owner(&self, owner: &str, context: &str) -> Vec<TriggerMatch> {
        let owner = normalize_skill_name(owner);
        rank(
            self.rules
                .iter()
                .filter(|rule| rule.kind == RuleKind::Handoff && rule.owner == owner),
            context,
        )
    }
}

fn rank<'r>(rules: impl Iterator<Item = &'r CompiledRule>, context: &str) -> Vec<TriggerMatch> {
    let haystack = context.to_lowercase();

    let mut matches: Vec<TriggerMatch> = rules
        .filter_map(|rule| {
            let keyword = first_keyword(&haystack, &rule.keywords)?;
            Some(TriggerMatch {
                owner: rule.owner.clone(),
                delegate_to: rule.delegate_to.clone(),
                matched_keyword: keyword.to_string(),
                context: rule.context.clone(),
                kind: rule.kind,
                order: rule.order,
            })
        })
        .collect();

    matches.sort_by_key(|m| (Reverse(m.matched_keyword.chars().count()), m.order));
    matches
}

/// Keyword occurring earliest in `haystack`; ties go to the longer keyword
fn first_keyword<'k>(haystack: &str, keywords: &'k [String]) -> Option<&'k str> {
    keywords
        .iter()
        .filter_map(|keyword| find_word(haystack, keyword).map(|pos| (pos, keyword.as_str())))
        .min_by_key(|(pos, keyword)| (*pos, Reverse(keyword.len())))
        .map(|(_, keyword)| keyword)
}

/// Byte offset of the first occurrence of `needle` as a whole word. A plural
/// `s` or `es` suffix still counts as the same word.
fn find_word(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    haystack.match_indices(needle).map(|(start, _)| start).find(|&start| {
        let before = haystack[..start].chars().next_back();
        if before.is_some_and(char::is_alphanumeric) {
            return false;
        }
        let rest = &haystack[start + needle.len()..];
        ["", "s", "es"].iter().any(|suffix| {
            rest.strip_prefix(suffix)
                .is_some_and(|tail| !tail.chars().next().is_some_and(char::is_alphanumeric))
        })
    })
}
