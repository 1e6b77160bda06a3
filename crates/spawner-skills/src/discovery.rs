//! Skill file discovery
//!
//! Skills live at `<root>/<category>/<skill-name>.md`. Files directly under a
//! root are accepted too, without a category.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::{Result, SkillError};

/// A skill file found on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillFile {
    /// Path to the Markdown document
    pub path: PathBuf,
    /// Category directory the file was found in
    pub category: Option<String>,
}

impl SkillFile {
    /// A file with no category hint
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            category: None,
        }
    }
}

/// Scan every directory for skill files.
///
/// Missing directories are skipped. The result is sorted per root so load
/// order is stable across runs.
pub fn discover_skill_files(directories: &[PathBuf]) -> Result<Vec<SkillFile>> {
    info!(
        "Starting skills discovery in {} directories",
        directories.len()
    );

    let mut files = Vec::new();
    for dir in directories {
        if !dir.exists() {
            debug!("Skills directory does not exist: {:?}", dir);
            continue;
        }
        if !dir.is_dir() {
            warn!("Skills path is not a directory: {:?}", dir);
            continue;
        }

        let mut found = scan_root(dir)?;
        found.sort_by(|a, b| a.path.cmp(&b.path));
        files.extend(found);
    }

    info!("Discovered {} skill files", files.len());
    Ok(files)
}

fn scan_root(root: &Path) -> Result<Vec<SkillFile>> {
    let mut found = Vec::new();

    for path in read_dir_paths(root)? {
        if path.is_dir() {
            if is_hidden(&path) {
                continue;
            }
            let category = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
            for inner in read_dir_paths(&path)? {
                if is_skill_document(&inner) {
                    found.push(SkillFile {
                        path: inner,
                        category: category.clone(),
                    });
                }
            }
        } else if is_skill_document(&path) {
            found.push(SkillFile::new(path));
        }
    }

    Ok(found)
}

fn read_dir_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|source| SkillError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| SkillError::Read {
            path: dir.to_path_buf(),
            source,
        })?;
        paths.push(entry.path());
    }
    Ok(paths)
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|name| name.to_string_lossy().starts_with('.'))
}

/// Markdown files other than READMEs and hidden files
fn is_skill_document(path: &Path) -> bool {
    if !path.is_file() || is_hidden(path) {
        return false;
    }
    let is_markdown = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("md"));
    let is_readme = path
        .file_stem()
        .is_some_and(|stem| stem.eq_ignore_ascii_case("readme"));
    is_markdown && !is_readme
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_discovers_category_layout() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("backend")).unwrap();
        fs::create_dir_all(root.path().join("frontend")).unwrap();
        fs::create_dir_all(root.path().join(".git")).unwrap();
        fs::write(root.path().join("backend/caching-patterns.md"), "# Caching").unwrap();
        fs::write(root.path().join("backend/notes.txt"), "not a skill").unwrap();
        fs::write(root.path().join("frontend/react.md"), "# React").unwrap();
        fs::write(root.path().join("frontend/README.md"), "# Readme").unwrap();
        fs::write(root.path().join(".git/HEAD.md"), "# hidden").unwrap();
        fs::write(root.path().join("general.md"), "# General").unwrap();

        let files = discover_skill_files(&[root.path().to_path_buf()]).unwrap();
        let described: Vec<(String, Option<String>)> = files
            .iter()
            .map(|f| {
                (
                    f.path.file_name().unwrap().to_string_lossy().into_owned(),
                    f.category.clone(),
                )
            })
            .collect();

        assert_eq!(
            described,
            vec![
                ("caching-patterns.md".to_string(), Some("backend".to_string())),
                ("react.md".to_string(), Some("frontend".to_string())),
                ("general.md".to_string(), None),
            ]
        );
    }

    #[test]
    fn test_missing_directory_is_skipped() {
        let files = discover_skill_files(&[PathBuf::from("/definitely/not/here")]).unwrap();
        assert!(files.is_empty());
    }
}
