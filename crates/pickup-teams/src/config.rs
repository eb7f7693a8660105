// Configuration loading and parsing (formation.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::formation::FormationSettings;

const CONFIG_FILE: &str = "formation.toml";
const DB_FILE: &str = "formations.db";

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

// ---------------------------------------------------------------------------
// Assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub draft: DraftConfig,
    pub balance: BalanceConfig,
    pub db_path: PathBuf,
    /// CSV file with the signed-up players, resolved against the base dir.
    pub pool_path: PathBuf,
}

impl Config {
    pub fn formation_settings(&self) -> FormationSettings {
        FormationSettings {
            pick_timer: Duration::from_secs(self.draft.pick_timer_seconds),
            goalkeepers_per_team: self.balance.goalkeepers_per_team,
        }
    }
}

// ---------------------------------------------------------------------------
// formation.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for formation.toml.
#[derive(Debug, Clone, Deserialize)]
struct FormationFile {
    draft: DraftConfig,
    balance: BalanceConfig,
    #[serde(default)]
    database: DatabaseSection,
    pool: PoolSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DraftConfig {
    #[serde(default = "default_pick_timer_seconds")]
    pub pick_timer_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BalanceConfig {
    #[serde(default = "default_goalkeepers_per_team")]
    pub goalkeepers_per_team: usize,
    /// Use the shuffled partition by default.
    #[serde(default)]
    pub shuffle: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct DatabaseSection {
    /// Falls back to the platform data directory when absent.
    path: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PoolSection {
    path: String,
}

fn default_pick_timer_seconds() -> u64 {
    15
}

fn default_goalkeepers_per_team() -> usize {
    1
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Load and validate `config/formation.toml` under `base_dir`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join(CONFIG_FILE);
    let text = read_file(&path)?;
    let file: FormationFile = toml::from_str(&text).map_err(|source| ConfigError::ParseError {
        path: path.clone(),
        source,
    })?;

    let db_path = match file.database.path {
        Some(p) => resolve(base_dir, &p),
        None => default_db_path(),
    };

    let config = Config {
        draft: file.draft,
        balance: file.balance,
        db_path,
        pool_path: resolve(base_dir, &file.pool.path),
    };
    validate(&config)?;
    Ok(config)
}

/// Seed `config/formation.toml` from `defaults/` when it is missing. An
/// existing config file is never overwritten. Returns the path written, if
/// any.
pub fn ensure_config_file(base_dir: &Path) -> Result<Option<PathBuf>, ConfigError> {
    let target = base_dir.join("config").join(CONFIG_FILE);
    if target.exists() {
        return Ok(None);
    }

    let source = base_dir.join("defaults").join(CONFIG_FILE);
    if !source.exists() {
        return Err(ConfigError::DefaultsCopyError {
            message: format!(
                "neither defaults/{CONFIG_FILE} nor config/{CONFIG_FILE} found in {}",
                base_dir.display()
            ),
        });
    }

    if let Some(dir) = target.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to create config directory: {e}"),
        })?;
    }
    std::fs::copy(&source, &target).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to copy {} to {}: {e}", source.display(), target.display()),
    })?;
    Ok(Some(target))
}

/// Loads config relative to the current working directory, copying
/// defaults first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_file(&cwd)?;
    load_config_from(&cwd)
}

/// `<platform data dir>/formations.db`, or `./formations.db` when the
/// platform has no home directory.
pub fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "pickup-teams")
        .map(|dirs| dirs.data_dir().join(DB_FILE))
        .unwrap_or_else(|| PathBuf::from(DB_FILE))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() || path == ":memory:" {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.draft.pick_timer_seconds == 0 {
        return Err(ConfigError::ValidationError {
            field: "draft.pick_timer_seconds".into(),
            message: "must be greater than 0".into(),
        });
    }
    if config.draft.pick_timer_seconds > 600 {
        return Err(ConfigError::ValidationError {
            field: "draft.pick_timer_seconds".into(),
            message: format!("must be at most 600, got {}", config.draft.pick_timer_seconds),
        });
    }
    if config.pool_path.as_os_str().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "pool.path".into(),
            message: "must not be empty".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
