//! Configuration management
//!
//! This module handles loading, validation, and management of the auditfill
//! configuration. Configuration is stored in TOML format at
//! ~/.auditfill/config.toml and can be overridden with `--config`.
//!
//! # Configuration Sections
//!
//! - **core**: Log level, output directory
//! - **llm**: Generation backend settings
//! - **context**: Base prompt template override, company document limits
//! - **memory**: Rolling answer memory window and scope
//!
//! # Path Expansion
//!
//! The output directory supports `~` expansion and is created if missing.
//!
//! # Examples
//!
//! ```no_run
//! use auditfill_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Output: {:?}", config.core.output_dir);
//! println!("Model: {}", config.llm.gemini.model);
//! # Ok(())
//! # }
//! ```

use crate::conductor::MAX_MEMORY_WINDOW;
use auditfill_sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Core settings
    pub core: CoreConfig,

    /// Generation backend configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// System context assembly settings
    #[serde(default)]
    pub context: ContextConfig,

    /// Rolling memory settings
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Core configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Directory where artifacts are written (supports ~ expansion)
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LLMConfig {
    /// Gemini settings
    #[serde(default)]
    pub gemini: GeminiConfig,
}

/// Gemini backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeminiConfig {
    /// Base URL for Gemini API
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    // Note: API key comes from GEMINI_API_KEY or the OS keychain, never from config
}

/// System context configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextConfig {
    /// Optional base template replacing the built-in one.
    /// Must contain the {NORMAS_AUDITADAS}, {EMPRESA} and {RUC} tokens.
    #[serde(default)]
    pub prompt_file: Option<PathBuf>,

    /// Maximum characters kept from each company context document
    #[serde(default = "default_company_doc_char_limit")]
    pub company_doc_char_limit: usize,
}

/// Rolling memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Number of most recent answers injected into each prompt
    #[serde(default = "default_memory_window")]
    pub window: usize,

    /// Whether memory resets for every template or spans the whole run
    #[serde(default)]
    pub scope: MemoryScope,
}

/// Lifetime of the rolling answer memory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum MemoryScope {
    /// A fresh memory for every template
    #[default]
    PerTemplate,

    /// One memory shared by every template of the run
    PerRun,
}

// Default value functions
fn default_log_level() -> String {
    "info".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_company_doc_char_limit() -> usize {
    2000
}

fn default_memory_window() -> usize {
    MAX_MEMORY_WINDOW
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            output_dir: default_output_dir(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: default_gemini_base_url(),
            model: default_gemini_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            prompt_file: None,
            company_doc_char_limit: default_company_doc_char_limit(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window: default_memory_window(),
            scope: MemoryScope::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.auditfill/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        Self::from_toml_str(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(contents: &str) -> Result<Self, EngineError> {
        let mut config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default_config();

        // Serialize before processing so the file keeps the portable relative path
        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.auditfill/config.toml)
    fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".auditfill").join("config.toml"))
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            core: CoreConfig::default(),
            llm: LLMConfig::default(),
            context: ContextConfig::default(),
            memory: MemoryConfig::default(),
        }
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates the log level
    /// - Validates the backend and memory settings
    /// - Expands ~ in paths
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.llm.gemini.model.trim().is_empty() {
            return Err(EngineError::Config(
                "llm.gemini.model must not be empty".to_string(),
            ));
        }
        if self.llm.gemini.timeout_secs == 0 {
            return Err(EngineError::Config(
                "llm.gemini.timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.memory.window == 0 || self.memory.window > MAX_MEMORY_WINDOW {
            return Err(EngineError::Config(format!(
                "memory.window must be between 1 and {}",
                MAX_MEMORY_WINDOW
            )));
        }

        self.core.output_dir = expand_path(&self.core.output_dir)?;
        if let Some(prompt_file) = &self.context.prompt_file {
            self.context.prompt_file = Some(expand_path(prompt_file)?);
        }

        Ok(())
    }

    /// Resolve the output directory, creating it if it doesn't exist
    pub fn ensure_output_dir(&self, override_dir: Option<&Path>) -> Result<PathBuf, EngineError> {
        let dir = match override_dir {
            Some(dir) => expand_path(dir)?,
            None => self.core.output_dir.clone(),
        };
        canonicalize_or_create(&dir)
    }
}

/// Expand ~ in path to user's home directory
///
/// # Examples
///
/// ```ignore
/// let path = PathBuf::from("~/auditorias");
/// let expanded = expand_path(&path)?;
/// // expanded is now /home/user/auditorias (on Unix)
/// ```
pub fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Canonicalize path, creating it if it doesn't exist
fn canonicalize_or_create(path: &Path) -> Result<PathBuf, EngineError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            EngineError::Config(format!("Failed to create directory {:?}: {}", path, e))
        })?;
    }

    path.canonicalize()
        .map_err(|e| EngineError::PathCanonicalization(path.to_path_buf(), e.to_string()))
}
