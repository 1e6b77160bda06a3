//! Snapshot publication
//!
//! The hub owns the current [`SkillCatalog`] behind a single `Arc`. A reload
//! builds a complete new catalog first and then swaps the `Arc` in one
//! write, so readers see either the old snapshot or the new one, never a mix.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::catalog::SkillCatalog;
use crate::error::Result;
use crate::store::SkillStore;

/// Default bound on one load cycle
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(10);

/// Where skills come from and how long a load may take
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Skills directories to scan
    pub directories: Vec<PathBuf>,
    /// Bound on one load cycle
    pub load_timeout: Duration,
}

impl HubConfig {
    /// Create a config with no directories
    pub fn new() -> Self {
        Self {
            directories: Vec::new(),
            load_timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }

    /// Add a skills directory to scan
    #[must_use]
    pub fn add_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.directories.push(dir.into());
        self
    }

    /// Add personal skills directory: ~/.spawner/skills/
    #[must_use]
    pub fn with_personal_skills(self) -> Self {
        if let Some(home) = dirs::home_dir() {
            self.add_directory(home.join(".spawner").join("skills"))
        } else {
            warn!("Could not find home directory for personal skills");
            self
        }
    }

    /// Add project skills directory: ./.spawner/skills/
    #[must_use]
    pub fn with_project_skills(self) -> Self {
        self.add_directory(PathBuf::from(".spawner/skills"))
    }

    /// Bound each load cycle
    #[must_use]
    pub fn with_load_timeout(mut self, timeout: Duration) -> Self {
        self.load_timeout = timeout;
        self
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Holder of the current skill snapshot
pub struct SkillHub {
    config: HubConfig,
    current: RwLock<Arc<SkillCatalog>>,
}

impl SkillHub {
    /// Create a hub with an empty snapshot
    pub fn new(config: HubConfig) -> Self {
        Self {
            config,
            current: RwLock::new(Arc::new(SkillCatalog::empty())),
        }
    }

    /// Create a hub and run the first load
    pub async fn open(config: HubConfig) -> Result<Self> {
        let hub = Self::new(config);
        hub.reload().await?;
        Ok(hub)
    }

    /// Hub configuration
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Current snapshot. Queries on it need no further locking.
    pub async fn snapshot(&self) -> Arc<SkillCatalog> {
        Arc::clone(&*self.current.read().await)
    }

    /// Rebuild the catalog from disk and publish it.
    ///
    /// On failure the previous snapshot stays in place.
    pub async fn reload(&self) -> Result<Arc<SkillCatalog>> {
        match self.build().await {
            Ok(catalog) => {
                let report = catalog.report();
                info!(
                    "Skills reloaded: {} loaded, {} skipped, {} issue(s)",
                    report.loaded,
                    report.skipped.len(),
                    report.issues.len()
                );
                Ok(self.publish(catalog).await)
            }
            Err(e) => {
                warn!("Skills reload failed, keeping previous snapshot: {}", e);
                Err(e)
            }
        }
    }

    async fn build(&self) -> Result<SkillCatalog> {
        let loaded =
            SkillStore::load_directories(self.config.directories.clone(), self.config.load_timeout)
                .await;
        let report = match &loaded {
            Ok((_, report)) => Some(report),
            Err(e) => e.report(),
        };
        for issue in report.iter().flat_map(|report| &report.issues) {
            warn!("{}", issue);
        }

        let (store, report) = loaded?;
        Ok(SkillCatalog::new(store, report))
    }

    /// Replace the current snapshot
    pub async fn publish(&self, catalog: SkillCatalog) -> Arc<SkillCatalog> {
        let next = Arc::new(catalog);
        *self.current.write().await = Arc::clone(&next);
        next
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = HubConfig::new()
            .add_directory("/srv/skills")
            .with_project_skills()
            .with_load_timeout(Duration::from_secs(3));

        assert_eq!(
            config.directories,
            vec![PathBuf::from("/srv/skills"), PathBuf::from(".spawner/skills")]
        );
        assert_eq!(config.load_timeout, Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_new_hub_is_empty() {
        let hub = SkillHub::new(HubConfig::new());
        assert!(hub.snapshot().await.store().is_empty());
    }
}
