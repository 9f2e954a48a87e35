//! Configuration for Sheetpilot.
//!
//! # Configuration Files
//!
//! - **Project config** (`sheetpilot.toml`): spreadsheet and document ids,
//!   backend endpoints, model settings and the analysis mode.
//! - **Credentials** (`~/.config/sheetpilot/credentials.toml`): secrets keyed
//!   by provider, e.g.
//!
//! ```toml
//! [credentials.google]
//! access_token = "ya29..."
//!
//! [credentials.model]
//! api_key = "sk-..."
//! ```
//!
//! # Resolution Algorithm
//!
//! The project config is found by checking, in order:
//!
//! 1. `SHEETPILOT_CONFIG_PATH`
//! 2. `sheetpilot.toml` in the current directory
//! 3. `sheetpilot.toml` in each parent directory
//!
//! A missing config is not an error; defaults apply (demo mode, no
//! document). `SHEETPILOT_SPREADSHEET_ID`, `SHEETPILOT_DOCUMENT_ID` and
//! `SHEETPILOT_ANALYSIS_MODE` override the file afterwards.
//!
//! Secrets are read from the environment variable named in the config first
//! and from the credentials file second.
//!
//! Every lookup takes the environment as a function so callers (and tests)
//! decide where variables come from.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{AnalysisMode, analysis::DEFAULT_MAX_TOKENS};

pub const CONFIG_FILE_NAME: &str = "sheetpilot.toml";
pub const CONFIG_PATH_ENV: &str = "SHEETPILOT_CONFIG_PATH";
pub const CREDENTIALS_PATH_ENV: &str = "SHEETPILOT_CREDENTIALS_PATH";
pub const SPREADSHEET_ID_ENV: &str = "SHEETPILOT_SPREADSHEET_ID";
pub const DOCUMENT_ID_ENV: &str = "SHEETPILOT_DOCUMENT_ID";
pub const ANALYSIS_MODE_ENV: &str = "SHEETPILOT_ANALYSIS_MODE";

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Reads a variable from the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Project configuration from `sheetpilot.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub spreadsheet: SpreadsheetConfig,
    pub document: DocumentConfig,
    pub google: GoogleConfig,
    pub model: ModelConfig,
    pub analysis: AnalysisConfig,
}

/// Spreadsheet to analyze. Without an id the gateway runs in demo mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadsheetConfig {
    pub id: Option<String>,
}

/// Optional document gathered alongside the spreadsheet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentConfig {
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    /// Project billed for API quota, sent as `x-goog-user-project`.
    pub project_id: Option<String>,
    /// Environment variable holding an OAuth access token.
    pub access_token_env: String,
    pub sheets_endpoint: Option<String>,
    pub docs_endpoint: Option<String>,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            access_token_env: "GOOGLE_ACCESS_TOKEN".to_string(),
            sheets_endpoint: None,
            docs_endpoint: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub model: String,
    pub max_tokens: u32,
    /// Environment variable holding the model API key.
    pub api_key_env: String,
    pub endpoint: Option<String>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            endpoint: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub mode: AnalysisMode,
}

impl Config {
    /// Loads and parses a project config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotFound`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is not valid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents =
            fs::read_to_string(path).map_err(|_e| ConfigError::NotFound(path.to_path_buf()))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Finds the project config file starting from `start`.
    pub fn find_path(start: &Path, env: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        if let Some(path) = env(CONFIG_PATH_ENV).map(PathBuf::from)
            && path.exists()
        {
            return Some(path);
        }

        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILE_NAME))
            .find(|path| path.is_file())
    }

    /// Resolves the project config from `start` and applies environment
    /// overrides. Defaults are used when no file is found.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a found file cannot be loaded or an
    /// override is invalid.
    pub fn resolve_from(
        start: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut config = match Self::find_path(start, &env) {
            Some(path) => {
                debug!(path = %path.display(), "loading project config");
                Self::load(&path)?
            }
            None => {
                debug!("no project config found, using defaults");
                Self::default()
            }
        };
        config.apply_env_overrides(&env)?;
        Ok(config)
    }

    /// Resolves the project config from the current directory and the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the current directory is unavailable, a
    /// found file cannot be loaded, or an override is invalid.
    pub fn load_resolved() -> Result<Self, ConfigError> {
        let current = std::env::current_dir()?;
        Self::resolve_from(&current, process_env)
    }

    /// Applies `SHEETPILOT_*` overrides on top of file values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an unknown analysis mode.
    pub fn apply_env_overrides(
        &mut self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(id) = env(SPREADSHEET_ID_ENV) {
            self.spreadsheet.id = Some(id);
        }
        if let Some(id) = env(DOCUMENT_ID_ENV) {
            self.document.id = Some(id);
        }
        if let Some(mode) = env(ANALYSIS_MODE_ENV) {
            self.analysis.mode = mode.parse().map_err(ConfigError::Invalid)?;
        }
        Ok(())
    }

    /// The configured spreadsheet id; blank ids count as unset.
    #[must_use]
    pub fn spreadsheet_id(&self) -> Option<&str> {
        non_blank(self.spreadsheet.id.as_deref())
    }

    /// The configured document id; blank ids count as unset.
    #[must_use]
    pub fn document_id(&self) -> Option<&str> {
        non_blank(self.document.id.as_deref())
    }

    /// Google OAuth access token from the environment or credentials file.
    pub fn google_access_token(
        &self,
        credentials: Option<&CredentialsConfig>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        resolve_secret(
            &self.google.access_token_env,
            credentials,
            "google",
            "access_token",
            env,
        )
    }

    /// Model API key from the environment or credentials file.
    pub fn model_api_key(
        &self,
        credentials: Option<&CredentialsConfig>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Option<String> {
        resolve_secret(&self.model.api_key_env, credentials, "model", "api_key", env)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn resolve_secret(
    env_name: &str,
    credentials: Option<&CredentialsConfig>,
    provider: &str,
    key: &str,
    env: impl Fn(&str) -> Option<String>,
) -> Option<String> {
    env(env_name)
        .filter(|v| !v.trim().is_empty())
        .or_else(|| credentials?.get(provider, key).map(ToString::to_string))
}

/// Credentials from `~/.config/sheetpilot/credentials.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// Map of provider name -> credential fields.
    #[serde(default)]
    pub credentials: HashMap<String, HashMap<String, String>>,
}

impl CredentialsConfig {
    /// Loads a credentials file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] when the file cannot be read and
    /// [`ConfigError::Parse`] when it is not valid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// `SHEETPILOT_CREDENTIALS_PATH`, else the user config directory.
    pub fn default_path(env: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        env(CREDENTIALS_PATH_ENV)
            .map(PathBuf::from)
            .or_else(|| dirs::config_dir().map(|dir| dir.join("sheetpilot").join("credentials.toml")))
    }

    /// Loads credentials from the default path, if that file exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when an existing file cannot be loaded.
    pub fn resolve(env: impl Fn(&str) -> Option<String>) -> Result<Option<Self>, ConfigError> {
        match Self::default_path(env) {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading credentials");
                Self::load(&path).map(Some)
            }
            _ => Ok(None),
        }
    }

    #[must_use]
    pub fn get(&self, provider: &str, key: &str) -> Option<&str> {
        self.credentials
            .get(provider)?
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }
}
