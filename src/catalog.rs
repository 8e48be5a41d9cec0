//! Context Catalog
//!
//! Fixed, named set of serialization contexts per stack. Catalogs are built once
//! through [`ContextCatalogBuilder`] and are read-only afterwards; every context
//! they hand out is an `Arc` that can be shared across threads.

use crate::context::{AllWhitelist, BuiltInWhitelist, EncodingWhitelist, SerializationContext};
use crate::error::SerializationError;
use crate::types::{SerializationEncoding, StackKind, TrustBoundary, UseCase};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub const CHECKPOINT: &str = "checkpoint";
pub const P2P: &str = "p2p";
pub const RPC_SERVER: &str = "rpc-server";
pub const RPC_CLIENT: &str = "rpc-client";
pub const STORAGE: &str = "storage";

#[derive(Debug, Clone)]
pub struct ContextCatalog {
    stack: StackKind,
    default_id: String,
    entries: BTreeMap<String, Arc<SerializationContext>>,
}

impl ContextCatalog {
    pub fn builder(stack: StackKind) -> ContextCatalogBuilder {
        ContextCatalogBuilder {
            stack,
            default_id: None,
            entries: BTreeMap::new(),
        }
    }

    /// The checkpoint stack's catalog: a single compressed, internal context.
    pub fn checkpoint() -> Self {
        let checkpoint = SerializationContext::new(
            CHECKPOINT,
            UseCase::Checkpoint,
            TrustBoundary::Internal,
            Arc::new(AllWhitelist),
        )
        .with_encoding(Some(SerializationEncoding::Deflate))
        .with_encoding_whitelist(EncodingWhitelist::all());

        Self {
            stack: StackKind::Checkpoint,
            default_id: CHECKPOINT.to_string(),
            entries: BTreeMap::from([(CHECKPOINT.to_string(), Arc::new(checkpoint))]),
        }
    }

    /// The AMQP stack's catalog: peer-to-peer, RPC server, RPC client and storage.
    pub fn amqp() -> Self {
        let external = |id: &str, use_case| {
            SerializationContext::new(
                id,
                use_case,
                TrustBoundary::External,
                Arc::new(BuiltInWhitelist),
            )
        };
        let storage = SerializationContext::new(
            STORAGE,
            UseCase::Storage,
            TrustBoundary::Internal,
            Arc::new(AllWhitelist),
        )
        .with_encoding_whitelist(EncodingWhitelist::all());

        let entries = [
            external(P2P, UseCase::P2p),
            external(RPC_SERVER, UseCase::RpcServer),
            external(RPC_CLIENT, UseCase::RpcClient),
            storage,
        ]
        .into_iter()
        .map(|ctx| (ctx.identifier().to_string(), Arc::new(ctx)))
        .collect();

        Self {
            stack: StackKind::Amqp,
            default_id: P2P.to_string(),
            entries,
        }
    }

    /// Built-in catalog for `stack`.
    pub fn for_stack(stack: StackKind) -> Self {
        match stack {
            StackKind::Checkpoint => Self::checkpoint(),
            StackKind::Amqp => Self::amqp(),
        }
    }

    pub fn stack(&self) -> StackKind {
        self.stack
    }

    /// Context used when neither an explicit nor an ambient context is supplied.
    pub fn default_context(&self) -> Arc<SerializationContext> {
        // The builder guarantees the default id is registered.
        self.entries[&self.default_id].clone()
    }

    pub fn by_identifier(&self, id: &str) -> Result<Arc<SerializationContext>, SerializationError> {
        self.entries
            .get(id)
            .cloned()
            .ok_or_else(|| SerializationError::UnknownContext {
                stack: self.stack,
                identifier: id.to_string(),
            })
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Registered identifiers in sorted order.
    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn contexts(&self) -> impl Iterator<Item = &Arc<SerializationContext>> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuild this catalog with per-context encoding overrides and, optionally,
    /// a different default context.
    pub fn with_overrides(
        &self,
        default_id: Option<&str>,
        encodings: &BTreeMap<String, Option<SerializationEncoding>>,
    ) -> Result<Self, SerializationError> {
        let mut builder = Self::builder(self.stack);
        for (id, ctx) in &self.entries {
            let ctx = match encodings.get(id) {
                Some(encoding) => ctx.with_encoding(*encoding),
                None => ctx.as_ref().clone(),
            };
            builder = builder.register(ctx)?;
        }
        for id in encodings.keys() {
            if !self.entries.contains_key(id) {
                return Err(SerializationError::UnknownContext {
                    stack: self.stack,
                    identifier: id.clone(),
                });
            }
        }
        builder
            .default_context(default_id.unwrap_or(&self.default_id))
            .build()
    }
}

pub struct ContextCatalogBuilder {
    stack: StackKind,
    default_id: Option<String>,
    entries: BTreeMap<String, Arc<SerializationContext>>,
}

impl ContextCatalogBuilder {
    /// Add a context. Identifiers must be unique within the stack.
    pub fn register(mut self, context: SerializationContext) -> Result<Self, SerializationError> {
        let id = context.identifier().to_string();
        if self.entries.contains_key(&id) {
            return Err(SerializationError::DuplicateContext {
                stack: self.stack,
                identifier: id,
            });
        }
        self.entries.insert(id, Arc::new(context));
        Ok(self)
    }

    pub fn default_context(mut self, id: impl Into<String>) -> Self {
        self.default_id = Some(id.into());
        self
    }

    /// Finish the catalog. Without an explicit default the first registered
    /// identifier in sorted order is used; an empty catalog has no default and
    /// is rejected.
    pub fn build(self) -> Result<ContextCatalog, SerializationError> {
        let default_id = match self.default_id {
            Some(id) => id,
            None => self
                .entries
                .keys()
                .next()
                .cloned()
                .ok_or(SerializationError::NoContextAvailable(self.stack))?,
        };
        if !self.entries.contains_key(&default_id) {
            return Err(SerializationError::UnknownContext {
                stack: self.stack,
                identifier: default_id,
            });
        }
        debug!(
            stack = %self.stack,
            default_context = %default_id,
            contexts = self.entries.len(),
            "Built serialization context catalog"
        );
        Ok(ContextCatalog {
            stack: self.stack,
            default_id,
            entries: self.entries,
        })
    }
}
