use std::fmt;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VecInitError};

// ── Defaults ────────────────────────────────────────────────────────────────

pub const DEFAULT_DATABASE: &str = ":memory:";
pub const DEFAULT_DIMENSION: usize = 3;
pub const DEFAULT_KNN_LIMIT: usize = 2;

// ── Constants ───────────────────────────────────────────────────────────────

pub const IN_MEMORY_DATABASE: &str = ":memory:";
pub const MAX_DIMENSION: usize = 8192;

// ── Type enums ──────────────────────────────────────────────────────────────

/// How sqlite-vec gets attached to a connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InitMode {
    /// Call `sqlite3_vec_init` on each connection after it is opened.
    #[default]
    Manual,
    /// Register `sqlite3_vec_init` as an auto-extension before opening.
    /// Unavailable on WASM; falls back to `Manual` there.
    Auto,
}

impl InitMode {
    pub fn is_auto(self) -> bool {
        self == InitMode::Auto
    }
}

impl fmt::Display for InitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InitMode::Manual => write!(f, "manual"),
            InitMode::Auto => write!(f, "auto"),
        }
    }
}

// ── Settings ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: String,
    pub init_mode: InitMode,
    pub dimension: usize,
    pub knn_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database: DEFAULT_DATABASE.to_string(),
            init_mode: InitMode::default(),
            dimension: DEFAULT_DIMENSION,
            knn_limit: DEFAULT_KNN_LIMIT,
        }
    }
}

impl Settings {
    pub fn is_in_memory(&self) -> bool {
        self.database.is_empty() || self.database == IN_MEMORY_DATABASE
    }

    /// Parse settings from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let settings: Settings =
            toml::from_str(text).map_err(|e| VecInitError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimension == 0 || self.dimension > MAX_DIMENSION {
            return Err(VecInitError::InvalidDimension(self.dimension));
        }
        Ok(())
    }
}
