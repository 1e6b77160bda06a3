use serde::Deserialize;
use spawner_skills::HubConfig;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config template created when no config exists
const DEFAULT_CONFIG: &str = r#"
[skills]
# Scanned in order; each holds <category>/<skill-name>.md files
directories = ["~/.spawner/skills", ".spawner/skills"]
load_timeout_secs = 10

[logging]
level = "warn"  # trace, debug, info, warn, error
format = "pretty"  # or "json"
"#;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SkillsConfig {
    pub directories: Vec<String>,
    pub load_timeout_secs: u64,
}

impl Default for SkillsConfig {
    fn default() -> Self {
        Self {
            directories: vec!["~/.spawner/skills".into(), ".spawner/skills".into()],
            load_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "pretty".into(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    pub skills: SkillsConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// Get the global config path: ~/.spawner/spawner.toml
    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".spawner").join("spawner.toml"))
    }

    /// Ensure global config directory and file exist, creating defaults if needed
    fn ensure_global_config() -> anyhow::Result<Option<PathBuf>> {
        let Some(config_path) = Self::global_config_path() else {
            eprintln!("No home directory, skipping global config");
            return Ok(None);
        };

        if let Some(config_dir) = config_path.parent() {
            if !config_dir.exists() {
                fs::create_dir_all(config_dir)?;
                eprintln!("Created config directory: {}", config_dir.display());
            }
        }

        if !config_path.exists() {
            fs::write(&config_path, DEFAULT_CONFIG.trim())?;
            eprintln!("Created default config: {}", config_path.display());
        }

        Ok(Some(config_path))
    }

    /// Load configuration with layered approach:
    /// 1. Global config: ~/.spawner/spawner.toml (auto-created if missing)
    /// 2. Local override: ./spawner.toml (optional)
    /// 3. Explicit `--config` file
    /// 4. Environment variables (highest priority)
    pub fn load(explicit: Option<&Path>) -> anyhow::Result<Self> {
        // Load .env file from current directory
        dotenvy::dotenv().ok();

        let global_config_path = Self::ensure_global_config()?;
        Self::from_sources(global_config_path.as_deref(), explicit)
    }

    fn from_sources(global: Option<&Path>, explicit: Option<&Path>) -> anyhow::Result<Self> {
        let mut config_builder = config::Config::builder();

        // Layer 1: Global config
        if let Some(path) = global {
            config_builder = config_builder.add_source(config::File::from(path));
        }

        // Layer 2: Local workspace config (optional override)
        config_builder =
            config_builder.add_source(config::File::with_name("spawner").required(false));

        // Layer 3: Explicit file, must exist
        if let Some(path) = explicit {
            config_builder = config_builder.add_source(config::File::from(path));
        }

        // Layer 4: Environment variables with SPAWNER__ prefix
        config_builder = config_builder.add_source(
            config::Environment::with_prefix("SPAWNER")
                .separator("__")
                .try_parsing(true),
        );

        // Layer 5: Convenience override, a PATH-style list of directories
        if let Some(dirs) = env::var_os("SPAWNER_SKILLS_DIR") {
            let dirs: Vec<String> = env::split_paths(&dirs)
                .map(|p| p.to_string_lossy().into_owned())
                .collect();
            config_builder = config_builder.set_override("skills.directories", dirs)?;
        }

        let config: Self = config_builder.build()?.try_deserialize()?;
        Ok(config)
    }

    /// Skills directories with `~` expanded
    pub fn skill_directories(&self) -> Vec<PathBuf> {
        self.skills
            .directories
            .iter()
            .map(|dir| expand_tilde(dir))
            .collect()
    }

    /// Loader settings for the skill hub
    pub fn hub_config(&self) -> HubConfig {
        self.skill_directories()
            .into_iter()
            .fold(HubConfig::new(), |hub, dir| hub.add_directory(dir))
            .with_load_timeout(Duration::from_secs(self.skills.load_timeout_secs))
    }
}

/// Expand tilde in path
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
