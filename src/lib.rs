//! Serscope: Context-Scoped Serialization
//!
//! Turns values into a portable binary encoding and back, with every
//! encode/decode call governed by an explicit, named serialization context.
//! Two independent stacks (checkpoint and AMQP) each provide a catalog of named
//! contexts, a process-wide default factory, and a thread-local ambient scope
//! that is empty unless a lifecycle manager has deliberately entered one.

pub mod api;
pub mod catalog;
pub mod cli;
pub mod codec;
pub mod config;
pub mod context;
pub mod defaults;
pub mod error;
pub mod factory;
pub mod lifecycle;
pub mod logging;
pub mod scope;
pub mod stack;
pub mod types;

pub use api::{serialize, SerializedBytes};
pub use context::SerializationContext;
pub use error::{CodecError, SerializationError};
pub use factory::SerializationFactory;
pub use lifecycle::{enter_scope, exit_scope, ScopeGuard, SerializationEnvironment};
pub use stack::{AmqpStack, CheckpointStack, SerializationStack};
pub use types::{StackKind, TrustBoundary, UseCase};
