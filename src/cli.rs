//! CLI: argument parsing and command execution for the `serscope` binary.
//!
//! Every command runs inside a [`SerializationEnvironment`] built from the
//! loaded configuration. `encode` and `decode` never pass an explicit context:
//! `--context` installs the named context in the active scope and the factory
//! resolves it from there, falling back to its default when omitted.

use crate::config::{ConfigLoader, SerializationConfig};
use crate::factory::SerializationFactory;
use crate::lifecycle::SerializationEnvironment;
use crate::stack::{AmqpStack, CheckpointStack, SerializationStack};
use crate::types::StackKind;
use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use comfy_table::presets::UTF8_FULL;
use comfy_table::Table;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Serscope CLI - context-scoped serialization
#[derive(Parser)]
#[command(name = "serscope")]
#[command(about = "Encode and decode payloads under named serialization contexts")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file)
    #[arg(long)]
    pub log_output: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the named contexts of one or both stacks
    Contexts {
        /// Stack to list (checkpoint or amqp); both when omitted
        #[arg(long)]
        stack: Option<StackKind>,
    },
    /// Encode a text payload and print the bytes as hex
    Encode {
        #[arg(long, default_value = "amqp")]
        stack: StackKind,
        /// Context identifier; the factory default when omitted
        #[arg(long)]
        context: Option<String>,
        payload: String,
    },
    /// Decode hex bytes produced by `encode` and print the text payload
    Decode {
        #[arg(long, default_value = "amqp")]
        stack: StackKind,
        #[arg(long)]
        context: Option<String>,
        hex: String,
    },
    /// Print the effective configuration as TOML
    Config,
}

/// Loaded configuration plus the factories built from it.
pub struct RunContext {
    config: SerializationConfig,
    checkpoint: Arc<SerializationFactory<CheckpointStack>>,
    amqp: Arc<SerializationFactory<AmqpStack>>,
}

impl RunContext {
    pub fn new(config: SerializationConfig) -> Result<Self> {
        let checkpoint = Arc::new(SerializationFactory::from_config(&config.checkpoint)?);
        let amqp = Arc::new(SerializationFactory::from_config(&config.amqp)?);
        Ok(Self {
            config,
            checkpoint,
            amqp,
        })
    }

    /// Load configuration from `path`, or the default locations when `None`.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        let config = match path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Self::new(config)
    }

    pub fn config(&self) -> &SerializationConfig {
        &self.config
    }

    pub fn execute(&self, command: &Commands) -> Result<String> {
        let env = SerializationEnvironment::enter(self.checkpoint.clone(), self.amqp.clone())?;
        info!(
            checkpoint_generation = env.checkpoint().generation(),
            amqp_generation = env.amqp().generation(),
            "Serialization environment ready"
        );

        match command {
            Commands::Contexts { stack } => Ok(self.contexts(*stack)),
            Commands::Encode {
                stack,
                context,
                payload,
            } => match stack {
                StackKind::Checkpoint => encode(&self.checkpoint, context.as_deref(), payload),
                StackKind::Amqp => encode(&self.amqp, context.as_deref(), payload),
            },
            Commands::Decode {
                stack,
                context,
                hex,
            } => match stack {
                StackKind::Checkpoint => decode(&self.checkpoint, context.as_deref(), hex),
                StackKind::Amqp => decode(&self.amqp, context.as_deref(), hex),
            },
            Commands::Config => {
                toml::to_string_pretty(&self.config).context("Failed to render configuration")
            }
        }
    }

    fn contexts(&self, stack: Option<StackKind>) -> String {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec![
            "Stack", "Context", "Use case", "Trust", "Encoding", "Default",
        ]);
        if stack != Some(StackKind::Amqp) {
            add_rows(&mut table, &self.checkpoint);
        }
        if stack != Some(StackKind::Checkpoint) {
            add_rows(&mut table, &self.amqp);
        }
        table.to_string()
    }
}

fn add_rows<S: SerializationStack>(table: &mut Table, factory: &SerializationFactory<S>) {
    let default_id = factory.default_context().identifier();
    for ctx in factory.catalog().contexts() {
        table.add_row(vec![
            S::KIND.to_string(),
            ctx.identifier().to_string(),
            ctx.use_case().to_string(),
            ctx.trust_boundary().to_string(),
            ctx.encoding()
                .map(|e| e.to_string())
                .unwrap_or_else(|| "none".to_string()),
            (if ctx.identifier() == default_id { "yes" } else { "" }).to_string(),
        ]);
    }
}

/// Run `f` under the ambient scope, with `id` installed as the current
/// context when given. `f` passes no explicit context, so the factory resolves
/// the ambient one (or its default).
fn with_selected_context<S, R>(
    factory: &Arc<SerializationFactory<S>>,
    id: Option<&str>,
    f: impl FnOnce(&SerializationFactory<S>) -> Result<R>,
) -> Result<R>
where
    S: SerializationStack,
{
    match id {
        Some(id) => {
            let ctx = factory.context(id)?;
            factory.with_current_context(ctx, f)?
        }
        None => f(factory),
    }
}

fn encode<S: SerializationStack>(
    factory: &Arc<SerializationFactory<S>>,
    context: Option<&str>,
    payload: &str,
) -> Result<String> {
    with_selected_context(factory, context, |f| {
        let bytes = crate::api::serialize_with(payload, f)?;
        Ok(bytes.to_hex())
    })
}

fn decode<S: SerializationStack>(
    factory: &Arc<SerializationFactory<S>>,
    context: Option<&str>,
    hex_bytes: &str,
) -> Result<String> {
    let bytes = hex::decode(hex_bytes.trim()).context("Payload is not valid hex")?;
    with_selected_context(factory, context, |f| {
        let value: String = crate::api::deserialize_with(&bytes, f)?;
        Ok(value)
    })
}

/// Render an error chain for the terminal.
pub fn map_error(e: &anyhow::Error) -> String {
    format!("{:#}", e)
}
