//! Skill document rendering
//!
//! Writes a [`SkillRecord`] back out in the layout [`parse_skill`] reads.
//! Parsing the output gives back the same patterns, anti-patterns, sharp
//! edges and hand-off rules, in the same order.
//!
//! [`parse_skill`]: crate::parser::parse_skill

use spawner_types::{normalize_skill_name, SharpEdge, SkillRecord};

/// Render a record as a Markdown skill document
pub fn render_skill(record: &SkillRecord) -> String {
    let mut out = String::new();

    // The title alone would derive a different name
    if record.name != normalize_skill_name(&record.title) {
        out.push_str(&format!("---\nname: '{}'\n---\n", record.name));
    }
    out.push_str(&format!("# {}\n", record.title));

    if let Some(summary) = &record.summary {
        out.push('\n');
        for line in summary.lines() {
            out.push_str(&format!("> {line}\n"));
        }
    }

    let metadata = metadata_line(record);
    if !metadata.is_empty() {
        out.push_str(&format!("\n{metadata}\n"));
    }

    if !record.identity.is_empty() {
        out.push_str(&format!("\n## Identity\n\n{}\n", record.identity));
    }

    if !record.expertise.is_empty() {
        out.push_str("\n## Expertise Areas\n\n");
        push_bullets(&mut out, &record.expertise);
    }

    if !record.patterns.is_empty() {
        out.push_str("\n## Patterns\n");
        for pattern in &record.patterns {
            out.push_str(&format!("\n### {}\n", pattern.name));
            push_body(&mut out, &pattern.description);
            push_field(&mut out, "When to use", &pattern.when_to_use);
        }
    }

    if !record.anti_patterns.is_empty() {
        out.push_str("\n## Anti-Patterns\n");
        for anti in &record.anti_patterns {
            out.push_str(&format!("\n### {}\n", anti.name));
            push_body(&mut out, &anti.description);
            push_field(&mut out, "Instead", &anti.instead);
        }
    }

    if !record.sharp_edges.is_empty() {
        out.push_str("\n## Sharp Edges (Gotchas)\n");
        for edge in &record.sharp_edges {
            push_sharp_edge(&mut out, edge);
        }
    }

    push_collaboration(&mut out, record);
    out
}

fn metadata_line(record: &SkillRecord) -> String {
    let mut pairs = Vec::new();
    if let Some(category) = &record.category {
        pairs.push(format!("**Category:** {category}"));
    }
    if let Some(version) = &record.version {
        pairs.push(format!("**Version:** {version}"));
    }
    if !record.tags.is_empty() {
        pairs.push(format!("**Tags:** {}", record.tags.join(", ")));
    }
    if !record.triggers.is_empty() {
        pairs.push(format!("**Triggers:** {}", record.triggers));
    }
    pairs.join(" | ")
}

fn push_bullets(out: &mut String, items: &[String]) {
    for item in items {
        out.push_str(&format!("- {item}\n"));
    }
}

fn push_body(out: &mut String, text: &str) {
    if !text.is_empty() {
        out.push_str(&format!("\n{text}\n"));
    }
}

/// Multi-line values and code blocks start on the line after the label
fn push_field(out: &mut String, label: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    if value.contains('\n') || value.starts_with("```") || value.starts_with("~~~") {
        out.push_str(&format!("\n**{label}:**\n{value}\n"));
    } else {
        out.push_str(&format!("\n**{label}:** {value}\n"));
    }
}

fn push_sharp_edge(out: &mut String, edge: &SharpEdge) {
    out.push_str(&format!("\n### [{}] {}\n", edge.severity, edge.title));
    push_field(out, "Situation", &edge.situation);
    push_field(out, "Why it happens", &edge.why_it_happens);
    push_field(out, "Solution", &edge.solution);
    if !edge.symptoms.is_empty() {
        out.push_str("\n**Symptoms:**\n");
        push_bullets(out, &edge.symptoms);
    }
}

fn push_collaboration(out: &mut String, record: &SkillRecord) {
    if record.handoff_rules.is_empty()
        && record.receives_from.is_empty()
        && record.works_well_with.is_empty()
    {
        return;
    }
    out.push_str("\n## Collaboration\n");

    if !record.handoff_rules.is_empty() {
        out.push_str("\n### When to Hand Off\n\n");
        out.push_str("| Trigger | Delegate To | Context |\n");
        out.push_str("|---------|-------------|---------|\n");
        for rule in &record.handoff_rules {
            let trigger = rule
                .trigger
                .keywords()
                .iter()
                .map(|k| table_cell(k))
                .collect::<Vec<_>>()
                .join("\\|");
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                trigger,
                table_cell(&rule.delegate_to),
                table_cell(&rule.context)
            ));
        }
    }

    if !record.receives_from.is_empty() {
        out.push_str("\n### Receives Work From\n\n");
        push_bullets(out, &record.receives_from);
    }

    if !record.works_well_with.is_empty() {
        out.push_str("\n### Works Well With\n\n");
        push_bullets(out, &record.works_well_with);
    }
}

fn table_cell(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace('|', "\\|")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::parser::parse_skill;
    use spawner_types::{HandoffRule, Pattern, Severity, TriggerPattern};
    use std::path::Path;

    const QUEUES: &str = "# Message Queues\n\n> Reliable async work.\n\n\
        **Category:** backend | **Version:** 0.3 | **Tags:** queues, kafka\n\n\
        ## Identity\n\nYou keep messages flowing.\n\n\
        ## Expertise Areas\n\n- Retry policies\n- Dead letter queues\n\n\
        ## Patterns\n\n### Outbox\n\nWrite the event with the row.\n\n\
        **When to use:** You need exactly-once publishing.\n\n\
        ## Anti-Patterns\n\n### Infinite Retry\n\nRetries forever.\n\n**Instead:** Cap and dead-letter.\n\n\
        ## Sharp Edges (Gotchas)\n\n### [HIGH] Poison message\n\n\
        **Situation:** One message always fails.\n\
        **Why it happens:** The consumer throws before ack.\n\
        **Solution:**\n```rust\n// ### not a heading\nqueue.nack(msg, false)?;\n```\n\
        **Symptoms:**\n- Lag grows forever\n- Same offset in logs\n\n\
        ### [LOW] Ordering\n\n**Situation:** Partitions reorder.\n\n\
        ## Collaboration\n\n### When to Hand Off\n\n\
        | Trigger | Delegate To | Context |\n|---|---|---|\n\
        | schema\\|migration | database | Table changes |\n\
        | deploy | devops | Broker rollout |\n\n\
        ### Receives Work From\n\n- backend\n\n### Works Well With\n\n- observability\n";

    #[test]
    fn test_round_trip_parsed_document() {
        let original = parse_skill(QUEUES, Some(Path::new("backend/message-queues.md")))
            .unwrap()
            .record;
        let rendered = render_skill(&original);
        let reparsed = parse_skill(&rendered, None).unwrap();

        assert!(reparsed.issues.is_empty(), "{:?}", reparsed.issues);
        let mut expected = original.clone();
        expected.source = None;
        assert_eq!(reparsed.record, expected);
        assert!(original.sharp_edges[0].solution.contains("// ### not a heading"));
    }

    #[test]
    fn test_round_trip_built_record() {
        let mut record = SkillRecord::new("edge-cache", "CDN");
        record.triggers = TriggerPattern::parse("cdn|edge");
        record.patterns.push(Pattern {
            name: "Stale While Revalidate".into(),
            description: "Serve stale.\n\nRefresh in the background.".into(),
            when_to_use: "Content that tolerates seconds of staleness.".into(),
        });
        let mut edge = SharpEdge::new(Severity::Critical, "Cache key explosion");
        edge.situation = "Query strings vary per user.".into();
        edge.solution = "Normalize keys:\n- drop utm params\n- sort the rest".into();
        edge.add_symptom("Hit ratio near zero");
        record.sharp_edges.push(edge);
        record.handoff_rules.push(HandoffRule {
            trigger: TriggerPattern::parse("tls|certificates"),
            delegate_to: "security".into(),
            context: "Cert rotation | renewals".into(),
        });

        let rendered = render_skill(&record);
        assert!(rendered.starts_with("---\nname: 'edge-cache'\n---\n# CDN\n"));
        assert!(rendered.contains("| tls\\|certificates | security | Cert rotation \\| renewals |"));

        let reparsed = parse_skill(&rendered, None).unwrap().record;
        assert_eq!(reparsed.name, "edge-cache");
        assert_eq!(reparsed.triggers, record.triggers);
        assert_eq!(reparsed.patterns, record.patterns);
        assert_eq!(reparsed.sharp_edges, record.sharp_edges);
        assert_eq!(reparsed.handoff_rules, record.handoff_rules);
    }

    #[test]
    fn test_minimal_record() {
        let record = SkillRecord::new("backend", "Backend");
        assert_eq!(render_skill(&record), "# Backend\n");
    }
}
