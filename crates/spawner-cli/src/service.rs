use crate::config::Config;
use crate::Command;
use anyhow::{Context, Result};
use serde::Serialize;
use spawner_logging::LogFormat;
use spawner_skills::{render_skill, LoadReport, RuleKind, SkillCatalog, SkillHub};
use spawner_types::SkillRecord;
use std::process::ExitCode;
use tracing::{debug, info};

/// Spawner service - loads the skill library and answers one command
pub struct SpawnerService {
    config: Config,
    json: bool,
}

#[derive(Serialize)]
struct ListEntry<'a> {
    name: &'a str,
    title: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<&'a str>,
}

#[derive(Serialize)]
struct GraphView<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    skill: Option<&'a str>,
    edges: Vec<(&'a str, &'a str)>,
    mutual: Vec<(&'a str, &'a str)>,
}

impl SpawnerService {
    /// Create a new spawner service
    pub fn new(config: Config, json: bool) -> Self {
        Self { config, json }
    }

    /// Run one command against a freshly loaded catalog
    pub async fn run(self, command: Command) -> Result<ExitCode> {
        // Initialize logging
        spawner_logging::init_logging(
            &self.config.logging.level,
            LogFormat::from_config(&self.config.logging.format),
        )?;
        info!(
            "Skills config: directories={:?}, load_timeout_secs={}",
            self.config.skills.directories, self.config.skills.load_timeout_secs
        );

        let hub = match SkillHub::open(self.config.hub_config()).await {
            Ok(hub) => hub,
            Err(e) => {
                // Validation still prints everything the failed load found
                if let (Command::Validate, Some(report)) = (&command, e.report()) {
                    println!("{}", validate(report, self.json)?);
                    return Ok(ExitCode::FAILURE);
                }
                return Err(e).context("Failed to load skills");
            }
        };
        let catalog = hub.snapshot().await;
        debug!("Snapshot loaded at {}", catalog.loaded_at());

        let output = match &command {
            Command::List => list(&catalog, self.json)?,
            Command::Show { name, markdown } => show(&catalog, name, *markdown, self.json)?,
            Command::Route { task } => route(&catalog, &task.join(" "), self.json)?,
            Command::Collab { name } => collab(&catalog, name, self.json)?,
            Command::Graph { name } => graph(&catalog, name.as_deref(), self.json)?,
            Command::Validate => validate(catalog.report(), self.json)?,
        };
        println!("{output}");

        if matches!(command, Command::Validate) && catalog.report().has_errors() {
            return Ok(ExitCode::FAILURE);
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn list(catalog: &SkillCatalog, json: bool) -> Result<String> {
    if !json {
        return Ok(catalog.generate_skills_list());
    }
    let entries: Vec<ListEntry<'_>> = catalog
        .store()
        .all()
        .map(|skill| ListEntry {
            name: &skill.name,
            title: &skill.title,
            category: skill.category.as_deref(),
            summary: skill.summary.as_deref(),
        })
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}

fn show(catalog: &SkillCatalog, name: &str, markdown: bool, json: bool) -> Result<String> {
    let skill = catalog.find_skill(name)?;
    if markdown {
        return Ok(render_skill(skill));
    }
    if json {
        return Ok(serde_json::to_string_pretty(skill)?);
    }
    Ok(describe(skill))
}

fn describe(skill: &SkillRecord) -> String {
    let mut lines = vec![format!("{} ({})", skill.title, skill.name)];
    if let Some(summary) = &skill.summary {
        lines.push(format!("  {summary}"));
    }
    if let Some(category) = &skill.category {
        lines.push(format!("Category: {category}"));
    }
    if !skill.tags.is_empty() {
        lines.push(format!("Tags: {}", skill.tags.join(", ")));
    }
    if !skill.triggers.is_empty() {
        lines.push(format!("Triggers: {}", skill.triggers));
    }
    lines.push(format!(
        "Patterns: {}, anti-patterns: {}, sharp edges: {}",
        skill.patterns.len(),
        skill.anti_patterns.len(),
        skill.sharp_edges.len()
    ));
    if let Some(severity) = skill.max_severity() {
        lines.push(format!("Worst sharp edge: {severity}"));
    }
    for edge in &skill.sharp_edges {
        lines.push(format!("  [{}] {}", edge.severity, edge.title));
    }
    if let Some(source) = &skill.source {
        lines.push(format!("Source: {}", source.display()));
    }
    lines.join("\n")
}

fn route(catalog: &SkillCatalog, task: &str, json: bool) -> Result<String> {
    let routes = catalog.route_task(task);
    if json {
        return Ok(serde_json::to_string_pretty(&routes)?);
    }
    if routes.is_empty() {
        return Ok("No skill matches this task".to_string());
    }

    let lines: Vec<String> = routes
        .iter()
        .enumerate()
        .map(|(idx, route)| {
            let via = match route.rule.kind {
                RuleKind::Activation => "own trigger".to_string(),
                RuleKind::Handoff => format!("hand-off from {}", route.rule.owner),
            };
            let loaded = if route.record.is_some() { "" } else { " (not loaded)" };
            format!(
                "{}. {}{} - keyword '{}' via {}: {}",
                idx + 1,
                route.skill,
                loaded,
                route.rule.matched_keyword,
                via,
                route.rule.context
            )
        })
        .collect();
    Ok(lines.join("\n"))
}

fn collab(catalog: &SkillCatalog, name: &str, json: bool) -> Result<String> {
    let collaborators = catalog.collaborators(name)?;
    if json {
        return Ok(serde_json::to_string_pretty(&collaborators)?);
    }

    Ok([
        collaborators.name.clone(),
        format!("  hands off to:     {}", join_names(&collaborators.handoff_targets)),
        format!("  receives from:    {}", join_names(&collaborators.receives_from)),
        format!("  works well with:  {}", join_names(&collaborators.works_well_with)),
        format!("  upstream:         {}", join_names(&collaborators.upstream)),
        format!("  downstream:       {}", join_names(&collaborators.downstream)),
    ]
    .join("\n"))
}

fn join_names<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    let names: Vec<&str> = names.into_iter().map(String::as_str).collect();
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(", ")
    }
}

fn graph(catalog: &SkillCatalog, name: Option<&str>, json: bool) -> Result<String> {
    let graph = catalog.graph();
    let skill = name.map(|n| catalog.store().get(n)).transpose()?;

    let edges: Vec<(&str, &str)> = graph
        .edges()
        .filter(|(from, to)| {
            skill.map_or(true, |s| *from == s.name.as_str() || *to == s.name.as_str())
        })
        .collect();
    let mutual: Vec<(&str, &str)> = graph
        .mutual_pairs()
        .into_iter()
        .filter(|(a, b)| skill.map_or(true, |s| *a == s.name.as_str() || *b == s.name.as_str()))
        .collect();

    if json {
        let view = GraphView {
            skill: skill.map(|s| s.name.as_str()),
            edges,
            mutual,
        };
        return Ok(serde_json::to_string_pretty(&view)?);
    }

    let mut lines: Vec<String> = edges
        .iter()
        .map(|(from, to)| format!("{from} -> {to}"))
        .collect();
    if lines.is_empty() {
        lines.push("No hand-off edges".to_string());
    }
    for (a, b) in &mutual {
        lines.push(format!("{a} <-> {b} (mutual)"));
    }
    if let Some(skill) = skill {
        let reach: Vec<String> = graph.reachable_from(&skill.name).into_iter().collect();
        if !reach.is_empty() {
            lines.push(format!("Reachable from {}: {}", skill.name, reach.join(", ")));
        }
    }
    Ok(lines.join("\n"))
}

fn validate(report: &LoadReport, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(report)?);
    }
    Ok(report.to_string().trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use spawner_skills::{parse_skill, SkillError, SkillStore};
    use std::path::Path;

    fn catalog() -> SkillCatalog {
        let docs = [
            (
                "backend/backend.md",
                "# Backend\n\n## Collaboration\n\n### When to Hand Off\n\n\
                 | Trigger | Delegate To | Context |\n|---|---|---|\n\
                 | ui\\|css | frontend | Browser work |\n| deploy | devops | Rollout |\n",
            ),
            (
                "frontend/frontend.md",
                "# Frontend\n\n> Browser UI.\n\n**Triggers:** ui|component|react\n\n\
                 ## Sharp Edges\n\n### [HIGH] Hydration mismatch\n**Situation:** SSR differs.\n\n\
                 ## Collaboration\n\n### When to Hand Off\n\n\
                 | Trigger | Delegate To | Context |\n|---|---|---|\n\
                 | api | backend | Endpoints |\n",
            ),
        ];
        let parsed = docs
            .iter()
            .map(|(path, doc)| parse_skill(doc, Some(Path::new(path))).unwrap())
            .collect();
        let (store, report) = SkillStore::from_parsed(parsed).unwrap();
        SkillCatalog::new(store, report)
    }

    #[test]
    fn test_list_text_and_json() {
        let catalog = catalog();
        assert_eq!(
            list(&catalog, false).unwrap(),
            "- backend: Backend\n- frontend: Browser UI."
        );
        let json: serde_json::Value = serde_json::from_str(&list(&catalog, true).unwrap()).unwrap();
        assert_eq!(json[1]["name"], "frontend");
        assert_eq!(json[1]["summary"], "Browser UI.");
    }

    #[test]
    fn test_show_variants() {
        let catalog = catalog();
        let text = show(&catalog, "react", false, false).unwrap();
        assert!(text.starts_with("Frontend (frontend)"));
        assert!(text.contains("Worst sharp edge: HIGH"));

        let markdown = show(&catalog, "frontend", true, false).unwrap();
        assert!(markdown.starts_with("# Frontend\n"));
        assert!(markdown.contains("### [HIGH] Hydration mismatch"));

        assert!(show(&catalog, "quantum", false, false).is_err());
    }

    #[test]
    fn test_route_output() {
        let catalog = catalog();
        let text = route(&catalog, "deploy the react app", false).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("1. devops (not loaded) - keyword 'deploy'"));
        assert!(lines[1].starts_with("2. frontend - keyword 'react' via own trigger"));

        assert_eq!(
            route(&catalog, "write docs", false).unwrap(),
            "No skill matches this task"
        );
        let json: serde_json::Value =
            serde_json::from_str(&route(&catalog, "react", true).unwrap()).unwrap();
        assert_eq!(json[0]["skill"], "frontend");
        assert_eq!(json[0]["rule"]["kind"], "activation");
    }

    #[test]
    fn test_collab_and_graph() {
        let catalog = catalog();
        let text = collab(&catalog, "frontend", false).unwrap();
        assert!(text.contains("hands off to:     backend"));
        assert!(text.contains("upstream:         backend"));

        let text = graph(&catalog, Some("frontend"), false).unwrap();
        assert!(text.contains("backend -> frontend"));
        assert!(text.contains("frontend -> backend"));
        assert!(text.contains("backend <-> frontend (mutual)"));
        assert!(!text.lines().any(|line| line == "backend -> devops"));
        assert!(text.contains("Reachable from frontend: backend, devops"));

        let all = graph(&catalog, None, false).unwrap();
        assert!(all.contains("backend -> devops"));
    }

    #[test]
    fn test_validate_lists_issues() {
        let text = validate(catalog().report(), false).unwrap();
        assert!(text.starts_with("2 skill(s) loaded, 0 file(s) skipped, 0 error(s), 1 warning(s)"));
        assert!(text.contains("devops"));
    }

    #[test]
    fn test_validate_after_duplicate_lists_all_issues() {
        let docs = [
            ("backend/caching.md", "# Caching"),
            ("perf/caching.md", "# Caching"),
            (
                "backend/queues.md",
                "# Queues\n\n## Sharp Edges\n\n### [BOGUS] Imaginary\n**Situation:** Unknown.\n",
            ),
        ];
        let parsed = docs
            .iter()
            .map(|(path, doc)| parse_skill(doc, Some(Path::new(path))).unwrap())
            .collect();
        let err = SkillStore::from_parsed(parsed).unwrap_err();
        assert!(matches!(err, SkillError::DuplicateSkills { .. }));

        let text = validate(err.report().unwrap(), false).unwrap();
        assert!(text.starts_with("0 skill(s) loaded, 0 file(s) skipped, 2 error(s)"));
        assert!(text.contains("duplicate skill 'caching'"));
        assert!(text.contains("Imaginary"));

        let json: serde_json::Value =
            serde_json::from_str(&validate(err.report().unwrap(), true).unwrap()).unwrap();
        assert_eq!(json["loaded"], 0);
        let errors = json["issues"]
            .as_array()
            .unwrap()
            .iter()
            .filter(|issue| issue["level"] == "error")
            .count();
        assert_eq!(errors, 2);
    }
}
