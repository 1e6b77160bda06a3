//! Skill record store
//!
//! Holds the parsed records of one load cycle. The store is built once and
//! never mutated; a reload builds a new store.

use spawner_types::{normalize_skill_name, SkillRecord};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::discovery::{discover_skill_files, SkillFile};
use crate::error::{Duplicate, Result, SkillError};
use crate::parser::{parse_skill, ParsedSkill};
use crate::report::{LoadIssue, LoadReport};

/// Immutable set of skills with O(1) lookup by name
#[derive(Debug, Clone, Default)]
pub struct SkillStore {
    /// Records in load order
    records: Vec<SkillRecord>,
    /// Normalized name → position in `records`
    index: HashMap<String, usize>,
}

enum FileOutcome {
    Parsed(ParsedSkill),
    Skipped(PathBuf, SkillError),
}

impl SkillStore {
    /// Build a store from already parsed documents.
    ///
    /// Fails when two documents derive the same name; every duplicated name
    /// is listed with all of its source paths, and the error keeps the report
    /// of everything else found.
    pub fn from_parsed(parsed: Vec<ParsedSkill>) -> Result<(Self, LoadReport)> {
        Self::assemble(parsed, LoadReport::default())
    }

    /// Read and parse `files` in parallel, one task per file.
    ///
    /// Unreadable files abort the load. Files that fail to parse or are not
    /// UTF-8 are skipped and listed in the report. The whole load is bounded
    /// by `timeout`.
    pub async fn load(files: Vec<SkillFile>, timeout: Duration) -> Result<(Self, LoadReport)> {
        bounded(timeout, Self::load_all(files)).await
    }

    /// Discover and load every skill under `directories`. Discovery and
    /// parsing share the one `timeout`.
    pub async fn load_directories(
        directories: Vec<PathBuf>,
        timeout: Duration,
    ) -> Result<(Self, LoadReport)> {
        bounded(timeout, Self::discover_and_load(directories)).await
    }

    async fn discover_and_load(directories: Vec<PathBuf>) -> Result<(Self, LoadReport)> {
        let files =
            tokio::task::spawn_blocking(move || discover_skill_files(&directories)).await??;
        Self::load_all(files).await
    }

    async fn load_all(files: Vec<SkillFile>) -> Result<(Self, LoadReport)> {
        info!("Loading {} skill file(s)", files.len());
        let mut slots: Vec<Option<FileOutcome>> = Vec::with_capacity(files.len());
        slots.resize_with(files.len(), || None);

        let mut tasks = JoinSet::new();
        for (idx, file) in files.into_iter().enumerate() {
            tasks.spawn(async move { (idx, load_file(file).await) });
        }

        while let Some(joined) = tasks.join_next().await {
            let (idx, outcome) = joined?;
            if let Some(slot) = slots.get_mut(idx) {
                *slot = Some(outcome?);
            }
        }

        let mut report = LoadReport::default();
        let mut parsed = Vec::with_capacity(slots.len());
        for outcome in slots.into_iter().flatten() {
            match outcome {
                FileOutcome::Parsed(skill) => parsed.push(skill),
                FileOutcome::Skipped(path, err) => {
                    warn!("Skipping {:?}: {}", path, err);
                    report.push(LoadIssue::error(Some(&path), err.to_string()));
                    report.skipped.push(path);
                }
            }
        }

        Self::assemble(parsed, report)
    }

    fn assemble(parsed: Vec<ParsedSkill>, mut report: LoadReport) -> Result<(Self, LoadReport)> {
        let mut sources: HashMap<String, Vec<PathBuf>> = HashMap::new();
        let mut order: Vec<String> = Vec::new();
        let mut records = Vec::with_capacity(parsed.len());

        for skill in parsed {
            let name = skill.record.name.clone();
            let source = skill
                .record
                .source
                .clone()
                .unwrap_or_else(|| PathBuf::from(format!("<inline:{name}>")));
            let paths = sources.entry(name.clone()).or_default();
            if paths.is_empty() {
                order.push(name);
            }
            paths.push(source);

            report.issues.extend(skill.issues);
            records.push(skill.record);
        }

        let index = records
            .iter()
            .enumerate()
            .map(|(idx, record)| (record.name.clone(), idx))
            .collect();
        let store = Self { records, index };
        store.check_references(&mut report);

        let duplicates: Vec<Duplicate> = order
            .into_iter()
            .filter_map(|name| {
                let paths = sources.remove(&name)?;
                (paths.len() > 1).then_some(Duplicate { name, paths })
            })
            .collect();
        if !duplicates.is_empty() {
            for duplicate in &duplicates {
                report.push(
                    LoadIssue::error(None, duplicate.to_string()).for_skill(duplicate.name.clone()),
                );
            }
            return Err(SkillError::DuplicateSkills {
                duplicates,
                report: Box::new(report),
            });
        }

        report.loaded = store.len();
        info!("Loaded {} skills", store.len());
        Ok((store, report))
    }

    /// Dangling collaboration references are warnings: the loaded set may be
    /// a subset of the full skill library.
    fn check_references(&self, report: &mut LoadReport) {
        for record in &self.records {
            let mut seen = HashSet::new();
            for (field, target) in record.references() {
                if self.contains(target) || !seen.insert((field, target)) {
                    continue;
                }
                debug!("{}: {} references unknown skill '{}'", record.name, field, target);
                report.push(
                    LoadIssue::warning(
                        record.source.as_deref(),
                        format!("{field} references unknown skill '{target}'"),
                    )
                    .for_skill(record.name.clone()),
                );
            }
        }
    }

    /// Get a skill by name
    pub fn get(&self, name: &str) -> Result<&SkillRecord> {
        self.lookup(name)
            .ok_or_else(|| SkillError::NotFound(name.to_string()))
    }

    /// Get a skill by name, `None` when absent
    pub fn lookup(&self, name: &str) -> Option<&SkillRecord> {
        self.position(name).and_then(|idx| self.records.get(idx))
    }

    /// Load-order position of a skill
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index
            .get(name)
            .or_else(|| self.index.get(&normalize_skill_name(name)))
            .copied()
    }

    /// Whether a skill is loaded
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// All records in load order
    pub fn all(&self) -> std::slice::Iter<'_, SkillRecord> {
        self.records.iter()
    }

    /// All records in load order, as a slice
    pub fn records(&self) -> &[SkillRecord] {
        &self.records
    }

    /// Skill names in load order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.name.as_str())
    }

    /// Get number of skills
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if store is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

async fn bounded<T>(timeout: Duration, work: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(timeout, work)
        .await
        .map_err(|_| SkillError::LoadTimeout {
            timeout_secs: timeout.as_secs(),
        })?
}

async fn load_file(file: SkillFile) -> Result<FileOutcome> {
    let bytes = tokio::fs::read(&file.path)
        .await
        .map_err(|source| SkillError::Read {
            path: file.path.clone(),
            source,
        })?;
    let content = match String::from_utf8(bytes) {
        Ok(content) => content,
        Err(source) => {
            let err = SkillError::InvalidUtf8 {
                path: file.path.clone(),
                source,
            };
            return Ok(FileOutcome::Skipped(file.path, err));
        }
    };

    match parse_skill(&content, Some(&file.path)) {
        Ok(mut parsed) => {
            if parsed.record.category.is_none() {
                parsed.record.category = file.category;
            }
            debug!("Parsed skill: {} at {:?}", parsed.record.name, file.path);
            Ok(FileOutcome::Parsed(parsed))
        }
        Err(err) => Ok(FileOutcome::Skipped(file.path, err)),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::report::IssueLevel;
    use std::path::Path;

    fn parsed(path: &str, content: &str) -> ParsedSkill {
        parse_skill(content, Some(Path::new(path))).unwrap()
    }

    #[test]
    fn test_store_new() {
        let (store, report) = SkillStore::from_parsed(Vec::new()).unwrap();
        assert!(store.is_empty());
        assert_eq!(store.len(), 0);
        assert_eq!(report.loaded, 0);
    }

    #[test]
    fn test_lookup_and_order() {
        let (store, _) = SkillStore::from_parsed(vec![
            parsed("b/zeta.md", "# Zeta"),
            parsed("a/alpha.md", "# Alpha"),
        ])
        .unwrap();

        assert_eq!(store.names().collect::<Vec<_>>(), vec!["zeta", "alpha"]);
        assert_eq!(store.get("alpha").unwrap().title, "Alpha");
        assert_eq!(store.get("Alpha").unwrap().name, "alpha");
        assert!(matches!(store.get("gamma"), Err(SkillError::NotFound(_))));

        // Iteration is restartable
        assert_eq!(store.all().count(), 2);
        assert_eq!(store.all().count(), 2);
    }

    #[test]
    fn test_duplicates_report_every_path() {
        let err = SkillStore::from_parsed(vec![
            parsed("backend/caching-patterns.md", "# Caching"),
            parsed("api/api.md", "# Api"),
            parsed("extra/caching-patterns.md", "# Caching Again"),
            parsed("a/api.md", "# Api"),
        ])
        .unwrap_err();

        let SkillError::DuplicateSkills { duplicates, report } = err else {
            panic!("expected duplicate error");
        };
        assert_eq!(report.errors().count(), 2);
        assert_eq!(report.loaded, 0);
        assert_eq!(duplicates.len(), 2);
        assert_eq!(duplicates[0].name, "caching-patterns");
        assert_eq!(
            duplicates[0].paths,
            vec![
                PathBuf::from("backend/caching-patterns.md"),
                PathBuf::from("extra/caching-patterns.md"),
            ]
        );
        assert_eq!(duplicates[1].name, "api");
    }

    #[test]
    fn test_dangling_references_are_warnings() {
        let doc = "# Backend\n\n## Collaboration\n\n### When to Hand Off\n\n\
                   | Trigger | Delegate To | Context |\n|---|---|---|\n\
                   | ui | frontend | UI |\n| k8s | devops | infra |\n\n\
                   ### Receives Work From\n\n- product\n";
        let (store, report) = SkillStore::from_parsed(vec![
            parsed("backend.md", doc),
            parsed("frontend.md", "# Frontend"),
        ])
        .unwrap();

        assert_eq!(store.len(), 2);
        assert!(!report.has_errors());
        let messages: Vec<_> = report.warnings().map(|i| i.message.as_str()).collect();
        assert_eq!(
            messages,
            vec![
                "delegate_to references unknown skill 'devops'",
                "receives_from references unknown skill 'product'",
            ]
        );
        assert!(report
            .warnings()
            .all(|i| i.skill.as_deref() == Some("backend")));
    }

    #[tokio::test]
    async fn test_load_skips_unparseable_files() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.md");
        let bad = dir.path().join("bad.md");
        std::fs::write(&good, "# Good\n\n## Identity\n\nFine.\n").unwrap();
        std::fs::write(&bad, "no heading at all\n").unwrap();

        let (store, report) = SkillStore::load(
            vec![SkillFile::new(&bad), SkillFile::new(&good)],
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(store.names().collect::<Vec<_>>(), vec!["good"]);
        assert_eq!(report.skipped, vec![bad.clone()]);
        assert_eq!(report.errors().count(), 1);
        assert_eq!(report.issues[0].level, IssueLevel::Error);
        assert_eq!(report.issues[0].path.as_deref(), Some(bad.as_path()));
    }

    #[tokio::test]
    async fn test_unreadable_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.md");

        let err = SkillStore::load(vec![SkillFile::new(&missing)], Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::Read { .. }));
    }

    #[tokio::test]
    async fn test_invalid_utf8_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.md");
        let latin1 = dir.path().join("latin1.md");
        std::fs::write(&good, "# Good\n").unwrap();
        std::fs::write(&latin1, b"# Caf\xe9\n").unwrap();

        let (store, report) = SkillStore::load(
            vec![SkillFile::new(&good), SkillFile::new(&latin1)],
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(store.names().collect::<Vec<_>>(), vec!["good"]);
        assert_eq!(report.skipped, vec![latin1.clone()]);
        let issue = report.errors().next().unwrap();
        assert_eq!(issue.path.as_deref(), Some(latin1.as_path()));
        assert!(issue.message.contains("UTF-8"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queues.md");
        std::fs::write(&path, "# Queues\n").unwrap();

        let err = SkillStore::load(vec![SkillFile::new(&path)], Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::LoadTimeout { timeout_secs: 0 }));

        let err = SkillStore::load_directories(vec![dir.path().to_path_buf()], Duration::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, SkillError::LoadTimeout { .. }));
    }

    #[tokio::test]
    async fn test_load_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("backend")).unwrap();
        std::fs::write(dir.path().join("backend/queues.md"), "# Queues\n").unwrap();

        let (store, report) =
            SkillStore::load_directories(vec![dir.path().to_path_buf()], Duration::from_secs(5))
                .await
                .unwrap();
        assert_eq!(report.loaded, 1);
        assert_eq!(
            store.get("queues").unwrap().category.as_deref(),
            Some("backend")
        );
    }

    #[tokio::test]
    async fn test_category_hint_applied() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("queues.md");
        std::fs::write(&path, "# Queues").unwrap();

        let file = SkillFile {
            path,
            category: Some("backend".into()),
        };
        let (store, _) = SkillStore::load(vec![file], Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(
            store.get("queues").unwrap().category.as_deref(),
            Some("backend")
        );
    }
}
