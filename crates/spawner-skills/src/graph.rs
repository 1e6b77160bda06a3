//! Collaboration graph
//!
//! Edge `a → b` means `a` hands work to `b`: either `a` has a hand-off rule
//! delegating to `b`, or `b` lists `a` under "Receives Work From". Cycles are
//! normal here (backend and frontend hand work back and forth).

use spawner_types::normalize_skill_name;
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::store::SkillStore;

/// Directed hand-off graph over skill names
#[derive(Debug, Clone, Default)]
pub struct CollaborationGraph {
    downstream: BTreeMap<String, BTreeSet<String>>,
    upstream: BTreeMap<String, BTreeSet<String>>,
    empty: BTreeSet<String>,
}

impl CollaborationGraph {
    /// Build the graph from every record in the store
    pub fn build(store: &SkillStore) -> Self {
        let mut graph = Self::default();

        for record in store.all() {
            for rule in &record.handoff_rules {
                graph.add_edge(&record.name, &rule.delegate_to);
            }
            for source in &record.receives_from {
                graph.add_edge(source, &record.name);
            }
        }

        graph
    }

    fn add_edge(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        self.downstream
            .entry(from.to_string())
            .or_default()
            .insert(to.to_string());
        self.upstream
            .entry(to.to_string())
            .or_default()
            .insert(from.to_string());
    }

    /// Skills this skill can delegate to
    pub fn downstream_of(&self, name: &str) -> &BTreeSet<String> {
        self.downstream
            .get(&normalize_skill_name(name))
            .unwrap_or(&self.empty)
    }

    /// Skills that commonly hand off to this one
    pub fn upstream_of(&self, name: &str) -> &BTreeSet<String> {
        self.upstream
            .get(&normalize_skill_name(name))
            .unwrap_or(&self.empty)
    }

    /// Every skill reachable by following hand-offs, excluding the start
    pub fn reachable_from(&self, name: &str) -> BTreeSet<String> {
        let start = normalize_skill_name(name);
        let mut seen = BTreeSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([start.as_str()]);

        while let Some(current) = queue.pop_front() {
            for next in self.downstream_of(current) {
                if next != &start && seen.insert(next.clone()) {
                    queue.push_back(next.as_str());
                }
            }
        }

        seen
    }

    /// Whether `a` reaches `b` and `b` reaches `a`
    pub fn has_cycle_between(&self, a: &str, b: &str) -> bool {
        let (a, b) = (normalize_skill_name(a), normalize_skill_name(b));
        a != b && self.reachable_from(&a).contains(&b) && self.reachable_from(&b).contains(&a)
    }

    /// Pairs that hand off to each other directly, each pair once
    pub fn mutual_pairs(&self) -> Vec<(&str, &str)> {
        self.edges()
            .filter(|(from, to)| from < to && self.downstream_of(to).contains(*from))
            .collect()
    }

    /// All edges, sorted by source then target
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str)> {
        self.downstream
            .iter()
            .flat_map(|(from, targets)| targets.iter().map(move |to| (from.as_str(), to.as_str())))
    }

    /// Number of distinct edges
    pub fn edge_count(&self) -> usize {
        self.downstream.values().map(BTreeSet::len).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::parser::parse_skill;

    fn skill(name: &str, handoffs: &[&str], receives: &[&str]) -> String {
        let mut doc = format!("# {name}\n\n## Collaboration\n\n### When to Hand Off\n\n");
        doc.push_str("| Trigger | Delegate To | Context |\n|---|---|---|\n");
        for target in handoffs {
            doc.push_str(&format!("| {target} work | {target} | - |\n"));
        }
        doc.push_str("\n### Receives Work From\n\n");
        for source in receives {
            doc.push_str(&format!("- {source}\n"));
        }
        doc
    }

    fn store(docs: &[String]) -> SkillStore {
        let parsed = docs
            .iter()
            .map(|doc| parse_skill(doc, None).unwrap())
            .collect();
        SkillStore::from_parsed(parsed).unwrap().0
    }

    #[test]
    fn test_edges_from_handoffs_and_receives() {
        let store = store(&[
            skill("backend", &["frontend", "devops"], &["product"]),
            skill("frontend", &["backend"], &[]),
            skill("devops", &[], &["backend"]),
        ]);
        let graph = CollaborationGraph::build(&store);

        let down: Vec<_> = graph.downstream_of("backend").iter().cloned().collect();
        assert_eq!(down, vec!["devops", "frontend"]);
        let up: Vec<_> = graph.upstream_of("backend").iter().cloned().collect();
        assert_eq!(up, vec!["frontend", "product"]);
        assert!(graph.upstream_of("devops").contains("backend"));
        // backend→devops appears twice in the source but is one edge
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_cycles_are_permitted() {
        let store = store(&[
            skill("backend", &["frontend"], &[]),
            skill("frontend", &["backend"], &[]),
        ]);
        let graph = CollaborationGraph::build(&store);

        assert_eq!(graph.mutual_pairs(), vec![("backend", "frontend")]);
        let reach: Vec<_> = graph.reachable_from("backend").into_iter().collect();
        assert_eq!(reach, vec!["frontend"]);
        assert!(graph.has_cycle_between("Frontend", "backend"));
        assert!(!graph.has_cycle_between("backend", "backend"));
    }

    #[test]
    fn test_reachability_is_transitive() {
        let store = store(&[
            skill("product", &["backend"], &[]),
            skill("backend", &["database"], &[]),
            skill("database", &[], &[]),
        ]);
        let graph = CollaborationGraph::build(&store);

        let reach: Vec<_> = graph.reachable_from("Product").into_iter().collect();
        assert_eq!(reach, vec!["backend", "database"]);
        assert!(graph.downstream_of("unknown").is_empty());
        assert!(!graph.has_cycle_between("product", "database"));
    }
}
