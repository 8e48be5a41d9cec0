//! Configuration System
//!
//! Layered configuration for building isolated factories and for logging.
//! Sources, lowest precedence first: built-in defaults, the global config file
//! (`$XDG_CONFIG_HOME/serscope/config.toml` or `~/.config/serscope/config.toml`)
//! or an explicit file, then `SERSCOPE_*` environment variables
//! (`SERSCOPE_AMQP__DEFAULT_CONTEXT=storage`).

use crate::catalog::ContextCatalog;
use crate::error::SerializationError;
use crate::logging::LoggingConfig;
use crate::types::{SerializationEncoding, StackKind};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SerializationConfig {
    #[serde(default)]
    pub checkpoint: StackConfig,

    #[serde(default)]
    pub amqp: StackConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Overrides applied to one stack's built-in catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackConfig {
    /// Identifier of the context factories fall back to
    #[serde(default)]
    pub default_context: Option<String>,

    /// Per-context encoding: identifier -> "none" | "deflate"
    #[serde(default)]
    pub encodings: BTreeMap<String, String>,
}

impl StackConfig {
    pub fn parsed_encodings(
        &self,
    ) -> Result<BTreeMap<String, Option<SerializationEncoding>>, SerializationError> {
        self.encodings
            .iter()
            .map(|(id, name)| {
                SerializationEncoding::parse_optional(name)
                    .map(|encoding| (id.clone(), encoding))
                    .map_err(|e| SerializationError::Config(format!("Context '{}': {}", id, e)))
            })
            .collect()
    }

    /// Validate against the stack's built-in catalog.
    pub fn validate(&self, stack: StackKind) -> Result<(), Vec<String>> {
        let catalog = ContextCatalog::for_stack(stack);
        let mut errors = Vec::new();

        if let Some(ref id) = self.default_context {
            if !catalog.contains(id) {
                errors.push(format!("Unknown default context '{}'", id));
            }
        }
        for (id, name) in &self.encodings {
            if !catalog.contains(id) {
                errors.push(format!("Unknown context '{}' in encodings", id));
            }
            if let Err(e) = SerializationEncoding::parse_optional(name) {
                errors.push(format!("Context '{}': {}", id, e));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            errors.sort();
            Err(errors)
        }
    }
}

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub stack: StackKind,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Stack '{}': {}", self.stack, self.message)
    }
}

impl std::error::Error for ValidationError {}

impl SerializationConfig {
    pub fn stack(&self, stack: StackKind) -> &StackConfig {
        match stack {
            StackKind::Checkpoint => &self.checkpoint,
            StackKind::Amqp => &self.amqp,
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();
        for stack in [StackKind::Checkpoint, StackKind::Amqp] {
            if let Err(messages) = self.stack(stack).validate(stack) {
                errors.extend(
                    messages
                        .into_iter()
                        .map(|message| ValidationError { stack, message }),
                );
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Loads [`SerializationConfig`] from files and the environment.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the global config file (if present) and the environment.
    pub fn load() -> Result<SerializationConfig, SerializationError> {
        Self::load_layers(global_config_path().filter(|p| p.exists()))
    }

    /// Load from `path` and the environment. The file must exist.
    pub fn load_from_file(path: &Path) -> Result<SerializationConfig, SerializationError> {
        if !path.exists() {
            return Err(SerializationError::Config(format!(
                "Configuration file not found: {}",
                path.display()
            )));
        }
        Self::load_layers(Some(path.to_path_buf()))
    }

    fn load_layers(file: Option<PathBuf>) -> Result<SerializationConfig, SerializationError> {
        let mut builder = Config::builder();
        if let Some(ref path) = file {
            debug!(config_path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }
        let config: SerializationConfig = builder
            .add_source(
                Environment::with_prefix("SERSCOPE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        config.validate().map_err(|errors| {
            for error in &errors {
                warn!(%error, "Invalid configuration");
            }
            let msgs: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            SerializationError::Config(format!(
                "Configuration validation failed:\n{}",
                msgs.join("\n")
            ))
        })?;
        Ok(config)
    }
}

/// Path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Some(PathBuf::from(xdg).join("serscope").join("config.toml"));
        }
    }
    std::env::var("HOME").ok().map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("serscope")
            .join("config.toml")
    })
}
