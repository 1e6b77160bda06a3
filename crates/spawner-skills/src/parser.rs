//! Skill document parsing
//!
//! Turns one Markdown skill file into a [`SkillRecord`]. Only the title is
//! required: a missing section becomes an empty collection. Malformed
//! entries (an unknown severity, a broken table row) are dropped and
//! reported as [`LoadIssue`]s so the rest of the document still loads.
//!
//! Layout understood here:
//!
//! ```text
//! ---                       optional YAML front-matter
//! name: caching-patterns
//! ---
//! # Title
//! > summary
//! **Category:** backend | **Version:** 1.0 | **Tags:** a, b
//! ## Identity
//! ## Expertise Areas
//! ## Patterns              ### Name, **When to use:**
//! ## Anti-Patterns         ### Name, **Instead:**
//! ## Sharp Edges (Gotchas) ### [SEVERITY] Title, **Situation:** ...
//! ## Collaboration         ### When to Hand Off (table), ### Receives Work From, ...
//! ```

use regex::Regex;
use serde::Deserialize;
use spawner_types::{
    normalize_skill_name, push_unique, AntiPattern, HandoffRule, Pattern, Severity, SharpEdge,
    SkillRecord, TriggerPattern,
};
use std::path::Path;
use tracing::debug;

use crate::error::{Result, SkillError};
use crate::report::LoadIssue;

/// A parsed document together with the problems found in it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSkill {
    /// The normalized record
    pub record: SkillRecord,
    /// Non-fatal problems, in document order
    pub issues: Vec<LoadIssue>,
}

/// Parse one skill document.
///
/// `path` is used to derive the skill name (file stem) when the document
/// does not declare one, and to label issues.
pub fn parse_skill(content: &str, path: Option<&Path>) -> Result<ParsedSkill> {
    SkillParser::new(path)?.parse(content)
}

#[derive(Debug, Default, Deserialize)]
struct FrontMatter {
    name: Option<String>,
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    version: Option<String>,
    tags: Option<StringOrList>,
    triggers: Option<StringOrList>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StringOrList {
    One(String),
    Many(Vec<String>),
}

impl StringOrList {
    fn into_items(self) -> Vec<String> {
        match self {
            StringOrList::One(s) => s.split(',').map(|t| t.trim().to_string()).collect(),
            StringOrList::Many(items) => items,
        }
    }
}

/// Inline labels that open a field inside an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Label {
    WhenToUse,
    Instead,
    Situation,
    Why,
    Solution,
    Symptoms,
}

impl Label {
    fn from_key(key: &str) -> Option<Self> {
        match key {
            "whentouse" | "usewhen" | "when" => Some(Label::WhenToUse),
            "instead" | "doinstead" | "insteaddo" | "better" | "betterapproach" => {
                Some(Label::Instead)
            }
            "situation" => Some(Label::Situation),
            "whyithappens" | "why" | "rootcause" => Some(Label::Why),
            "solution" | "fix" => Some(Label::Solution),
            "symptoms" | "detection" => Some(Label::Symptoms),
            _ => None,
        }
    }
}

struct Grammar {
    front_matter: Regex,
    meta_key: Regex,
    label: Regex,
    severity_heading: Regex,
    bullet: Regex,
}

impl Grammar {
    fn new() -> Result<Self> {
        Ok(Self {
            front_matter: Regex::new(r"^---[ \t]*\n([\s\S]*?)\n---[ \t]*(?:\n|$)([\s\S]*)$")?,
            meta_key: Regex::new(r"\*\*([^*:]+):\*\*")?,
            label: Regex::new(r"^\*\*([^*:]+?)\s*(?::\*\*|\*\*\s*:)\s*(.*)$")?,
            severity_heading: Regex::new(r"^\[([^\]]*)\]\s*(.*)$")?,
            bullet: Regex::new(r"^(?:[-*+]|\d+[.)])\s+(.*)$")?,
        })
    }
}

/// Tracks fenced code blocks so headings and labels inside them stay content
#[derive(Default)]
struct Fence {
    open: Option<(char, usize)>,
}

impl Fence {
    /// Returns true when `line` is a fence delimiter or inside a fence
    fn observe(&mut self, line: &str) -> bool {
        let trimmed = line.trim_start();
        let marker = trimmed.chars().next().filter(|c| *c == '`' || *c == '~');
        let run = marker.map_or(0, |m| trimmed.chars().take_while(|c| *c == m).count());

        match self.open {
            Some((open_marker, open_run)) => {
                if marker == Some(open_marker)
                    && run >= open_run
                    && trimmed[run..].trim().is_empty()
                {
                    self.open = None;
                }
                true
            }
            None => match marker {
                Some(m) if run >= 3 => {
                    self.open = Some((m, run));
                    true
                }
                _ => false,
            },
        }
    }
}

struct Block<'a> {
    heading: &'a str,
    lines: Vec<&'a str>,
}

/// Text of an ATX heading of exactly `level`
fn heading_text(line: &str, level: usize) -> Option<&str> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if hashes != level {
        return None;
    }
    let rest = &trimmed[hashes..];
    if !rest.is_empty() && !rest.starts_with([' ', '\t']) {
        return None;
    }
    let text = rest.trim();
    // A closing `#` run counts only after whitespace, so `C#` keeps its hash
    let unclosed = text.trim_end_matches('#');
    if unclosed.is_empty() || unclosed.ends_with([' ', '\t']) {
        Some(unclosed.trim_end())
    } else {
        Some(text)
    }
}

/// Split lines at headings of one level. Returns the lines before the first
/// heading and one block per heading.
fn split_at_headings<'a>(lines: &[&'a str], level: usize) -> (Vec<&'a str>, Vec<Block<'a>>) {
    let mut intro = Vec::new();
    let mut blocks: Vec<Block<'a>> = Vec::new();
    let mut fence = Fence::default();

    for &line in lines {
        let in_code = fence.observe(line);
        match (!in_code).then(|| heading_text(line, level)).flatten() {
            Some(heading) => blocks.push(Block {
                heading,
                lines: Vec::new(),
            }),
            None => match blocks.last_mut() {
                Some(block) => block.lines.push(line),
                None => intro.push(line),
            },
        }
    }

    (intro, blocks)
}

fn find_title<'a>(lines: &[&'a str]) -> Option<(&'a str, usize)> {
    let mut fence = Fence::default();
    lines.iter().enumerate().find_map(|(idx, &line)| {
        if fence.observe(line) {
            return None;
        }
        heading_text(line, 1).map(|text| (text, idx))
    })
}

/// Lowercase alphanumerics only; a trailing parenthesised part is ignored
fn section_key(heading: &str) -> String {
    let head = heading.split('(').next().unwrap_or(heading);
    label_key(head)
}

fn label_key(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn join_trimmed(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

/// Skill name out of a reference such as `**backend**: APIs`,
/// `[frontend](../frontend.md)` or `devops - deploys`.
pub(crate) fn reference_name(text: &str) -> String {
    let text = text.trim();
    let raw = if let Some(rest) = text.strip_prefix('[') {
        rest.split(']').next().unwrap_or(rest)
    } else if let Some(rest) = text.strip_prefix("**") {
        rest.split("**").next().unwrap_or(rest)
    } else if let Some(rest) = text.strip_prefix('`') {
        rest.split('`').next().unwrap_or(rest)
    } else {
        let cut = [":", " - ", " — ", " – ", " ("]
            .iter()
            .filter_map(|sep| text.find(sep))
            .min()
            .unwrap_or(text.len());
        &text[..cut]
    };
    normalize_skill_name(raw)
}

/// Split a Markdown table row into trimmed cells. `\|` is a literal pipe and
/// pipes inside code spans do not separate cells.
fn split_table_row(line: &str) -> Vec<String> {
    let line = line.trim();
    let inner = line.strip_prefix('|').unwrap_or(line);
    let mut cells = Vec::new();
    let mut current = String::new();
    let mut in_code = false;
    let mut chars = inner.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'|') => {
                current.push('|');
                chars.next();
            }
            '`' => {
                in_code = !in_code;
                current.push(c);
            }
            '|' if !in_code => {
                cells.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        cells.push(current.trim().to_string());
    }
    cells
}

fn is_separator_row(cells: &[String]) -> bool {
    !cells.is_empty()
        && cells.iter().all(|cell| {
            cell.contains('-') && cell.chars().all(|c| c == '-' || c == ':' || c == ' ')
        })
}

/// Column positions of a hand-off table
struct HandoffColumns {
    trigger: usize,
    delegate: usize,
    context: Option<usize>,
    width: usize,
}

impl HandoffColumns {
    fn locate(header: &[String]) -> Option<Self> {
        let keys: Vec<String> = header.iter().map(|h| label_key(h)).collect();
        let find = |pred: fn(&str) -> bool| keys.iter().position(|k| pred(k.as_str()));

        Some(Self {
            trigger: find(|k| k.contains("trigger") || k == "when")?,
            delegate: find(|k| {
                k.contains("delegate") || k == "handoffto" || k == "to" || k == "skill"
            })?,
            context: find(|k| k.contains("context") || k == "why" || k == "notes"),
            width: header.len(),
        })
    }

    /// Pull `(trigger, delegate, context)` out of a row. Extra cells are
    /// folded back into the trigger when it is the first column, since an
    /// unescaped `a|b` alternation splits it.
    fn extract(&self, cells: &[String]) -> Option<(String, String, String)> {
        let overflow = cells.len().saturating_sub(self.width);
        if overflow > 0 && self.trigger != 0 {
            return None;
        }
        let shift = |idx: usize| if idx > self.trigger { idx + overflow } else { idx };

        let trigger = if overflow > 0 {
            cells.get(..=overflow)?.join("|")
        } else {
            cells.get(self.trigger)?.clone()
        };
        let delegate = cells.get(shift(self.delegate))?.clone();
        let context = self
            .context
            .and_then(|idx| cells.get(shift(idx)))
            .cloned()
            .unwrap_or_default();

        Some((trigger, delegate, context))
    }
}

struct Labeled {
    body: String,
    fields: Vec<(Label, String)>,
}

impl Labeled {
    fn get(&self, label: Label) -> String {
        self.fields
            .iter()
            .filter(|(l, _)| *l == label)
            .map(|(_, text)| text.as_str())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

struct SkillParser<'p> {
    grammar: Grammar,
    path: Option<&'p Path>,
    skill: Option<String>,
    issues: Vec<LoadIssue>,
}

impl<'p> SkillParser<'p> {
    fn new(path: Option<&'p Path>) -> Result<Self> {
        Ok(Self {
            grammar: Grammar::new()?,
            path,
            skill: None,
            issues: Vec::new(),
        })
    }

    fn warn(&mut self, message: String) {
        let mut issue = LoadIssue::warning(self.path, message);
        issue.skill.clone_from(&self.skill);
        self.issues.push(issue);
    }

    fn error(&mut self, message: String) {
        let mut issue = LoadIssue::error(self.path, message);
        issue.skill.clone_from(&self.skill);
        self.issues.push(issue);
    }

    fn parse(mut self, content: &str) -> Result<ParsedSkill> {
        let normalized = content.trim_start_matches('\u{feff}').replace("\r\n", "\n");
        let (front, body) = self.split_front_matter(&normalized)?;
        let lines: Vec<&str> = body.lines().collect();

        let (heading, rest) = match find_title(&lines) {
            Some((text, idx)) => (Some(text.to_string()), &lines[idx + 1..]),
            None => (None, &lines[..]),
        };
        let title = heading
            .or_else(|| front.title.clone())
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| SkillError::MissingTitle {
                path: self.path.map(Path::to_path_buf),
            })?;

        let raw_name = front
            .name
            .clone()
            .or_else(|| {
                self.path
                    .and_then(Path::file_stem)
                    .map(|stem| stem.to_string_lossy().into_owned())
            })
            .unwrap_or_else(|| title.clone());
        let name = normalize_skill_name(&raw_name);
        if name.is_empty() {
            return Err(SkillError::InvalidName {
                path: self.path.map(Path::to_path_buf),
                raw: raw_name,
            });
        }
        self.skill = Some(name.clone());

        let mut record = SkillRecord::new(&name, title);
        record.source = self.path.map(Path::to_path_buf);
        apply_front_matter(front, &mut record);

        let (preamble, sections) = split_at_headings(rest, 2);
        self.parse_preamble(&preamble, &mut record);

        for section in &sections {
            match section_key(section.heading).as_str() {
                "identity" => {
                    let text = join_trimmed(&section.lines);
                    if !text.is_empty() {
                        if !record.identity.is_empty() {
                            record.identity.push_str("\n\n");
                        }
                        record.identity.push_str(&text);
                    }
                }
                "expertiseareas" | "expertise" => {
                    for item in self.bullets(&section.lines) {
                        push_unique(&mut record.expertise, item);
                    }
                }
                "patterns" => self.parse_patterns(&section.lines, &mut record),
                "antipatterns" => self.parse_anti_patterns(&section.lines, &mut record),
                "sharpedges" | "gotchas" => self.parse_sharp_edges(&section.lines, &mut record),
                "collaboration" => self.parse_collaboration(&section.lines, &mut record),
                other => debug!("{}: ignoring section '{}'", name, other),
            }
        }

        Ok(ParsedSkill {
            record,
            issues: self.issues,
        })
    }

    fn split_front_matter<'c>(&self, content: &'c str) -> Result<(FrontMatter, &'c str)> {
        if !content.starts_with("---") {
            return Ok((FrontMatter::default(), content));
        }
        let Some(captures) = self.grammar.front_matter.captures(content) else {
            return Ok((FrontMatter::default(), content));
        };

        let yaml = captures.get(1).map_or("", |m| m.as_str());
        let body = captures.get(2).map_or("", |m| m.as_str());
        if yaml.trim().is_empty() {
            return Ok((FrontMatter::default(), body));
        }

        let front = serde_yaml::from_str::<FrontMatter>(yaml).map_err(|source| {
            SkillError::FrontMatter {
                path: self.path.map(Path::to_path_buf),
                source,
            }
        })?;
        Ok((front, body))
    }

    /// `**Key:** value | **Other:** value` pairs on one line
    fn metadata_pairs(&self, line: &str) -> Vec<(String, String)> {
        let keys: Vec<(usize, usize, String)> = self
            .grammar
            .meta_key
            .captures_iter(line)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let key = caps.get(1)?;
                Some((whole.start(), whole.end(), label_key(key.as_str())))
            })
            .collect();

        keys.iter()
            .enumerate()
            .map(|(i, (_, end, key))| {
                let stop = keys.get(i + 1).map_or(line.len(), |next| next.0);
                let value = line[*end..stop].trim().trim_end_matches('|').trim();
                (key.clone(), value.to_string())
            })
            .collect()
    }

    fn parse_preamble(&self, lines: &[&str], record: &mut SkillRecord) {
        let mut summary: Vec<&str> = Vec::new();

        for line in lines {
            let trimmed = line.trim();
            if let Some(quoted) = trimmed.strip_prefix('>') {
                let quoted = quoted.trim();
                if !quoted.is_empty() {
                    summary.push(quoted);
                }
                continue;
            }

            for (key, value) in self.metadata_pairs(trimmed) {
                match key.as_str() {
                    "category" => record.category = non_empty(&value),
                    "version" => record.version = non_empty(&value),
                    "tags" => {
                        for tag in value.split(',') {
                            push_unique(&mut record.tags, tag.trim().to_string());
                        }
                    }
                    "triggers" | "trigger" => {
                        let extra = TriggerPattern::parse(&value);
                        record.triggers = merge_triggers(&record.triggers, &extra);
                    }
                    other => debug!("{}: ignoring metadata key '{}'", record.name, other),
                }
            }
        }

        if !summary.is_empty() {
            record.summary = Some(summary.join(" "));
        }
    }

    fn label_line<'l>(&self, line: &'l str) -> Option<(Label, &'l str)> {
        let captures = self.grammar.label.captures(line.trim())?;
        let label = Label::from_key(&label_key(captures.get(1)?.as_str()))?;
        Some((label, captures.get(2).map_or("", |m| m.as_str())))
    }

    /// Split an entry into its free-text body and its labelled fields
    fn split_labels(&self, lines: &[&str], accepted: &[Label]) -> Labeled {
        let mut body: Vec<&str> = Vec::new();
        let mut fields: Vec<(Label, Vec<&str>)> = Vec::new();
        let mut fence = Fence::default();

        for &line in lines {
            let in_code = fence.observe(line);
            if !in_code {
                if let Some((label, rest)) = self
                    .label_line(line)
                    .filter(|(label, _)| accepted.contains(label))
                {
                    fields.push((label, vec![rest]));
                    continue;
                }
            }
            match fields.last_mut() {
                Some((_, buffer)) => buffer.push(line),
                None => body.push(line),
            }
        }

        Labeled {
            body: join_trimmed(&body),
            fields: fields
                .into_iter()
                .map(|(label, buffer)| (label, join_trimmed(&buffer)))
                .collect(),
        }
    }

    /// Bullet items only
    fn bullets(&self, lines: &[&str]) -> Vec<String> {
        lines
            .iter()
            .filter_map(|line| self.grammar.bullet.captures(line.trim()))
            .filter_map(|caps| caps.get(1).map(|m| m.as_str().trim().to_string()))
            .filter(|item| !item.is_empty())
            .collect()
    }

    /// Bullet items, or whole lines when the list is written inline
    fn list_items(&self, text: &str) -> Vec<String> {
        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(|line| match self.grammar.bullet.captures(line) {
                Some(caps) => caps.get(1).map_or("", |m| m.as_str()).trim().to_string(),
                None => line.to_string(),
            })
            .collect()
    }

    fn parse_patterns(&mut self, lines: &[&str], record: &mut SkillRecord) {
        let (_, entries) = split_at_headings(lines, 3);
        for entry in entries {
            if entry.heading.is_empty() {
                self.warn("pattern without a name, skipped".to_string());
                continue;
            }
            let labeled = self.split_labels(&entry.lines, &[Label::WhenToUse]);
            record.patterns.push(Pattern {
                name: entry.heading.to_string(),
                when_to_use: labeled.get(Label::WhenToUse),
                description: labeled.body,
            });
        }
    }

    fn parse_anti_patterns(&mut self, lines: &[&str], record: &mut SkillRecord) {
        let (_, entries) = split_at_headings(lines, 3);
        for entry in entries {
            if entry.heading.is_empty() {
                self.warn("anti-pattern without a name, skipped".to_string());
                continue;
            }
            let labeled = self.split_labels(&entry.lines, &[Label::Instead]);
            record.anti_patterns.push(AntiPattern {
                name: entry.heading.to_string(),
                instead: labeled.get(Label::Instead),
                description: labeled.body,
            });
        }
    }

    fn parse_sharp_edges(&mut self, lines: &[&str], record: &mut SkillRecord) {
        let (_, entries) = split_at_headings(lines, 3);
        for entry in entries {
            let Some(captures) = self.grammar.severity_heading.captures(entry.heading) else {
                self.warn(format!(
                    "sharp edge '{}' has no [SEVERITY] tag, skipped",
                    entry.heading
                ));
                continue;
            };
            let raw_severity = captures.get(1).map_or("", |m| m.as_str());
            let title = captures.get(2).map_or("", |m| m.as_str()).trim();

            let severity = match raw_severity.parse::<Severity>() {
                Ok(severity) => severity,
                Err(e) => {
                    self.error(format!("sharp edge '{title}': {e}"));
                    continue;
                }
            };
            if title.is_empty() {
                self.warn(format!("[{severity}] sharp edge without a title, skipped"));
                continue;
            }

            let labeled = self.split_labels(
                &entry.lines,
                &[Label::Situation, Label::Why, Label::Solution, Label::Symptoms],
            );
            let mut edge = SharpEdge::new(severity, title);
            edge.situation = labeled.get(Label::Situation);
            if edge.situation.is_empty() {
                edge.situation.clone_from(&labeled.body);
            }
            edge.why_it_happens = labeled.get(Label::Why);
            edge.solution = labeled.get(Label::Solution);
            for symptom in self.list_items(&labeled.get(Label::Symptoms)) {
                edge.add_symptom(symptom);
            }
            record.sharp_edges.push(edge);
        }
    }

    fn parse_collaboration(&mut self, lines: &[&str], record: &mut SkillRecord) {
        let (intro, subsections) = split_at_headings(lines, 3);
        self.inline_collaborators(&intro, record);
        if intro.iter().any(|line| line.trim_start().starts_with('|')) {
            self.parse_handoff_table(&intro, record);
        }

        for sub in &subsections {
            let key = section_key(sub.heading);
            if key.contains("handoff") || key.contains("delegat") {
                self.parse_handoff_table(&sub.lines, record);
            } else if key.starts_with("receives") {
                for name in self.reference_list(&sub.lines) {
                    push_unique(&mut record.receives_from, name);
                }
            } else if key.starts_with("workswell") || key == "collaborateswith" {
                for name in self.reference_list(&sub.lines) {
                    push_unique(&mut record.works_well_with, name);
                }
            } else {
                debug!("{}: ignoring collaboration sub-section '{}'", record.name, key);
            }
        }
    }

    fn reference_list(&self, lines: &[&str]) -> Vec<String> {
        self.bullets(lines)
            .iter()
            .map(|item| reference_name(item))
            .filter(|name| !name.is_empty())
            .collect()
    }

    /// `**Works well with:** a, b` written as a plain line
    fn inline_collaborators(&self, lines: &[&str], record: &mut SkillRecord) {
        for line in lines {
            for (key, value) in self.metadata_pairs(line.trim()) {
                let target = match key.as_str() {
                    "workswellwith" => &mut record.works_well_with,
                    "receivesworkfrom" | "receivesfrom" => &mut record.receives_from,
                    _ => continue,
                };
                for item in value.split(',') {
                    push_unique(target, reference_name(item));
                }
            }
        }
    }

    fn parse_handoff_table(&mut self, lines: &[&str], record: &mut SkillRecord) {
        let rows: Vec<Vec<String>> = lines
            .iter()
            .map(|line| line.trim())
            .filter(|line| line.starts_with('|'))
            .map(split_table_row)
            .collect();
        let Some((header, body)) = rows.split_first() else {
            return;
        };
        let Some(columns) = HandoffColumns::locate(header) else {
            self.warn(format!(
                "hand-off table needs Trigger and Delegate To columns, found: {}",
                header.join(" | ")
            ));
            return;
        };

        for (idx, cells) in body.iter().enumerate() {
            if is_separator_row(cells) {
                continue;
            }
            let rule = columns.extract(cells).and_then(|(trigger, delegate, context)| {
                let trigger = TriggerPattern::parse(&trigger);
                let delegate_to = reference_name(&delegate);
                (!trigger.is_empty() && !delegate_to.is_empty()).then_some(HandoffRule {
                    trigger,
                    delegate_to,
                    context,
                })
            });
            match rule {
                Some(rule) => record.handoff_rules.push(rule),
                None => self.warn(format!(
                    "malformed hand-off row {} skipped: | {} |",
                    idx + 1,
                    cells.join(" | ")
                )),
            }
        }
    }
}

fn apply_front_matter(front: FrontMatter, record: &mut SkillRecord) {
    record.summary = front.description.as_deref().and_then(non_empty);
    record.category = front.category.as_deref().and_then(non_empty);
    record.version = front.version.as_deref().and_then(non_empty);
    if let Some(tags) = front.tags {
        for tag in tags.into_items() {
            push_unique(&mut record.tags, tag);
        }
    }
    if let Some(triggers) = front.triggers {
        let items = triggers.into_items();
        record.triggers = TriggerPattern::parse(&items.join("|"));
    }
}

fn merge_triggers(current: &TriggerPattern, extra: &TriggerPattern) -> TriggerPattern {
    TriggerPattern::from_keywords(current.keywords().iter().chain(extra.keywords()))
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
