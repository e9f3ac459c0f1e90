use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::constants::{defaults, env};
use crate::domain::Board;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub import: ImportConfig,

    pub scheduler: SchedulerConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Root of the exported sheets, laid out by board and part.
    pub data_dir: String,

    /// Event bus buffer size (default: 256)
    pub event_bus_buffer_size: usize,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/vocabili.db".to_string(),
            log_level: "info".to_string(),
            data_dir: "data".to_string(),
            event_bus_buffer_size: 256,
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

/// When an import commits its writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitPolicy {
    /// One transaction per batch; a failure keeps the batches before it.
    PerBatch,
    /// One transaction for the whole import.
    Single,
}

/// How song credits are reconciled on main-part imports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditMode {
    InsertOnly,
    Replace,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    pub batch_size: usize,

    pub commit_policy: CommitPolicy,

    pub credit_mode: CreditMode,

    /// Boards whose main part always rebuilds credits from the sheet.
    pub replace_credit_boards: Vec<Board>,

    /// Re-point videos whose sheet song name differs from the stored one.
    pub migrate_song_names: bool,

    pub streak: StreakConfig,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            batch_size: defaults::BATCH_SIZE,
            commit_policy: CommitPolicy::PerBatch,
            credit_mode: CreditMode::InsertOnly,
            replace_credit_boards: Vec::new(),
            migrate_song_names: true,
            streak: StreakConfig::default(),
        }
    }
}

impl ImportConfig {
    #[must_use]
    pub fn credit_mode_for(&self, board: Board) -> CreditMode {
        if self.replace_credit_boards.contains(&board) {
            CreditMode::Replace
        } else {
            self.credit_mode
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreakConfig {
    /// Cumulative views at which a video graduates for good.
    pub graduation_views: i64,

    /// Daily view growth at or above which the streak resets.
    pub growth_per_day: i64,
}

impl Default for StreakConfig {
    fn default() -> Self {
        Self {
            graduation_views: defaults::GRADUATION_VIEWS,
            growth_per_day: defaults::GROWTH_PER_DAY,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub enabled: bool,

    /// Six-field cron expression (seconds first).
    pub streak_cron: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            streak_cron: defaults::STREAK_CRON.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,

    pub metrics_port: Option<u16>,

    pub loki_enabled: bool,

    pub loki_url: String,

    pub loki_labels: std::collections::HashMap<String, String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        let mut labels = std::collections::HashMap::new();
        labels.insert("app".to_string(), "vocabili".to_string());

        Self {
            metrics_enabled: true,
            metrics_port: None,
            loki_enabled: false,
            loki_url: "http://localhost:3100".to_string(),
            loki_labels: labels,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var(env::DATABASE_URL) {
            if !url.trim().is_empty() {
                self.general.database_path = url;
            }
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("vocabili").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".vocabili").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.import.batch_size == 0 {
            anyhow::bail!("import.batch_size must be > 0");
        }

        if self.import.streak.graduation_views <= 0 || self.import.streak.growth_per_day <= 0 {
            anyhow::bail!("Streak thresholds must be positive");
        }

        if self.scheduler.enabled && self.scheduler.streak_cron.trim().is_empty() {
            anyhow::bail!("scheduler.streak_cron cannot be empty when the scheduler is enabled");
        }

        if self.observability.loki_enabled && self.observability.loki_url.is_empty() {
            anyhow::bail!("Loki URL cannot be empty when enabled");
        }

        Ok(())
    }

    #[must_use]
    pub fn data_dir(&self) -> &Path {
        Path::new(&self.general.data_dir)
    }
}
