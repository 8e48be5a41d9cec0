//! Core value types shared across the serialization subsystem.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One independent serialization subsystem with its own factories and catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StackKind {
    /// Compact, internal-only stack used for fiber checkpoints.
    Checkpoint,
    /// Self-describing stack used across process and trust boundaries.
    Amqp,
}

impl StackKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StackKind::Checkpoint => "checkpoint",
            StackKind::Amqp => "amqp",
        }
    }
}

impl fmt::Display for StackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StackKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "checkpoint" | "generic" => Ok(StackKind::Checkpoint),
            "amqp" => Ok(StackKind::Amqp),
            other => Err(format!(
                "Unknown stack: {} (must be 'checkpoint' or 'amqp')",
                other
            )),
        }
    }
}

/// Whether the other side of a boundary is trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustBoundary {
    Internal,
    External,
}

impl fmt::Display for TrustBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrustBoundary::Internal => f.write_str("internal"),
            TrustBoundary::External => f.write_str("external"),
        }
    }
}

/// What a context is used for; influences which codec settings apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UseCase {
    P2p,
    RpcServer,
    RpcClient,
    Storage,
    Checkpoint,
    Testing,
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UseCase::P2p => "p2p",
            UseCase::RpcServer => "rpc-server",
            UseCase::RpcClient => "rpc-client",
            UseCase::Storage => "storage",
            UseCase::Checkpoint => "checkpoint",
            UseCase::Testing => "testing",
        };
        f.write_str(name)
    }
}

/// Transform applied to the encoded body, typically compression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerializationEncoding {
    Deflate,
}

impl SerializationEncoding {
    /// Tag written into the envelope header. Zero is reserved for "no encoding".
    pub fn tag(&self) -> u8 {
        match self {
            SerializationEncoding::Deflate => 1,
        }
    }

    pub fn from_tag(tag: u8) -> Option<Option<Self>> {
        match tag {
            0 => Some(None),
            1 => Some(Some(SerializationEncoding::Deflate)),
            _ => None,
        }
    }

    /// Parse a configuration value: `none` or `deflate`.
    pub fn parse_optional(name: &str) -> Result<Option<Self>, String> {
        match name.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(None),
            "deflate" => Ok(Some(SerializationEncoding::Deflate)),
            other => Err(format!(
                "Unknown encoding: {} (must be 'none' or 'deflate')",
                other
            )),
        }
    }
}

impl fmt::Display for SerializationEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerializationEncoding::Deflate => f.write_str("deflate"),
        }
    }
}

/// Header prefix identifying which stack produced a byte sequence.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SerializationMagic([u8; 7]);

impl SerializationMagic {
    pub const LEN: usize = 7;

    pub const fn new(bytes: [u8; 7]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SerializationMagic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SerializationMagic({})", hex::encode(self.0))
    }
}

impl fmt::Display for SerializationMagic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}
