//! Error types for the context-scoped serialization subsystem.

use crate::types::{SerializationEncoding, SerializationMagic, StackKind};
use thiserror::Error;

/// Failures raised by the codec layer while encoding or decoding a payload.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Empty bytes")]
    EmptyBytes,

    #[error("Truncated payload: {len} bytes is shorter than the {header} byte header")]
    Truncated { len: usize, header: usize },

    #[error("Serialization magic mismatch: expected {expected}, found {found}")]
    MagicMismatch {
        expected: SerializationMagic,
        found: SerializationMagic,
    },

    #[error("Unknown encoding tag: {0}")]
    UnknownEncoding(u8),

    #[error("Encoding {encoding} is not accepted by context '{context}'")]
    EncodingNotWhitelisted {
        context: String,
        encoding: SerializationEncoding,
    },

    #[error("Type {type_name} is not whitelisted in context '{context}'")]
    NotWhitelisted { context: String, type_name: String },

    #[error("Malformed body: {0}")]
    Body(String),

    #[error("Compression error: {0}")]
    Compression(#[from] std::io::Error),
}

impl From<bincode::Error> for CodecError {
    fn from(err: bincode::Error) -> Self {
        CodecError::Body(err.to_string())
    }
}

impl From<serde_json::Error> for CodecError {
    fn from(err: serde_json::Error) -> Self {
        CodecError::Body(err.to_string())
    }
}

/// Errors surfaced by factories, catalogs, and the scope registry.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("A {0} serialization scope is already active on this thread")]
    ScopeAlreadyActive(StackKind),

    #[error("Unknown {stack} serialization context: {identifier}")]
    UnknownContext {
        stack: StackKind,
        identifier: String,
    },

    #[error("Duplicate {stack} serialization context: {identifier}")]
    DuplicateContext {
        stack: StackKind,
        identifier: String,
    },

    #[error("No serialization context available for the {0} stack")]
    NoContextAvailable(StackKind),

    #[error("Codec failure in context '{context}'")]
    CodecFailure {
        context: String,
        #[source]
        source: CodecError,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SerializationError {
    pub(crate) fn codec(context: &str, source: CodecError) -> Self {
        SerializationError::CodecFailure {
            context: context.to_string(),
            source,
        }
    }

    /// Underlying codec error, if this is a codec failure.
    pub fn codec_source(&self) -> Option<&CodecError> {
        match self {
            SerializationError::CodecFailure { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for SerializationError {
    fn from(err: config::ConfigError) -> Self {
        SerializationError::Config(err.to_string())
    }
}
