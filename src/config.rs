//! Server Configuration
//!
//! All settings come from environment variables, read once at startup:
//!
//! | Variable     | Default   |
//! |--------------|-----------|
//! | `DATA_DIR`   | `data`    |
//! | `MODEL_DIR`  | `models`  |
//! | `STATIC_DIR` | `static`  |
//! | `HOST`       | `0.0.0.0` |
//! | `PORT`       | `5000`    |
//! | `ERROR_MODE` | `compat`  |

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::str::FromStr;

pub const CROP_DATASET_FILE: &str = "crop_recommendation.csv";
pub const FERTILIZER_DATASET_FILE: &str = "fertilizer_recommendation.csv";

/// How internal failures are reported to HTTP callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorMode {
    /// Every failure is a 400 with `{"error": ...}`
    #[default]
    Compat,
    /// Internal failures become 500; input errors stay 400
    Strict,
}

impl FromStr for ErrorMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compat" => Ok(ErrorMode::Compat),
            "strict" => Ok(ErrorMode::Strict),
            other => anyhow::bail!(
                "Unknown ERROR_MODE '{}' (expected 'compat' or 'strict')",
                other
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub data_dir: PathBuf,
    pub model_dir: PathBuf,
    pub static_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub error_mode: ErrorMode,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("data"),
            model_dir: PathBuf::from("models"),
            static_dir: PathBuf::from("static"),
            host: "0.0.0.0".to_string(),
            port: 5000,
            error_mode: ErrorMode::Compat,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key lookup (environment, test map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("MODEL_DIR") {
            config.model_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup("STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        if let Some(port) = lookup("PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid PORT '{}'", port))?;
        }
        if let Some(mode) = lookup("ERROR_MODE") {
            config.error_mode = mode.parse()?;
        }

        Ok(config)
    }

    pub fn crop_dataset(&self) -> PathBuf {
        self.data_dir.join(CROP_DATASET_FILE)
    }

    pub fn fertilizer_dataset(&self) -> PathBuf {
        self.data_dir.join(FERTILIZER_DATASET_FILE)
    }
}
