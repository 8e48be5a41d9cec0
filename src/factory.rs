//! Serialization Factory
//!
//! A factory binds a stack's codec to a context catalog. It resolves which
//! context governs each call (explicit, then ambient, then its own default)
//! and hands the value to the codec. It never writes the ambient slot except
//! through the scoped helpers [`SerializationFactory::as_current`] and
//! [`SerializationFactory::with_current_context`], which always restore it.

use crate::api::{ObjectWithCompatibleContext, SerializedBytes};
use crate::catalog::ContextCatalog;
use crate::codec;
use crate::config::StackConfig;
use crate::context::SerializationContext;
use crate::error::SerializationError;
use crate::lifecycle;
use crate::scope;
use crate::stack::SerializationStack;
use crate::types::StackKind;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::sync::Arc;
use tracing::trace;

pub struct SerializationFactory<S: SerializationStack> {
    codec: S::Codec,
    catalog: Arc<ContextCatalog>,
    default_context: Arc<SerializationContext>,
}

/// Where a resolved context came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextSource {
    Explicit,
    Ambient,
    Default,
}

/// The context governing one encode/decode call.
#[derive(Debug, Clone)]
pub enum ResolvedContext<'a> {
    Explicit(&'a SerializationContext),
    Ambient(Arc<SerializationContext>),
    Default(Arc<SerializationContext>),
}

impl ResolvedContext<'_> {
    pub fn source(&self) -> ContextSource {
        match self {
            ResolvedContext::Explicit(_) => ContextSource::Explicit,
            ResolvedContext::Ambient(_) => ContextSource::Ambient,
            ResolvedContext::Default(_) => ContextSource::Default,
        }
    }
}

impl Deref for ResolvedContext<'_> {
    type Target = SerializationContext;

    fn deref(&self) -> &SerializationContext {
        match self {
            ResolvedContext::Explicit(ctx) => ctx,
            ResolvedContext::Ambient(ctx) | ResolvedContext::Default(ctx) => ctx,
        }
    }
}

impl<S: SerializationStack> SerializationFactory<S> {
    /// Create a factory over `catalog` with the stack's codec.
    pub fn new(catalog: ContextCatalog) -> Result<Self, SerializationError> {
        Self::with_codec(S::Codec::default(), catalog)
    }

    pub fn with_codec(
        codec: S::Codec,
        catalog: ContextCatalog,
    ) -> Result<Self, SerializationError> {
        if catalog.stack() != S::KIND {
            return Err(SerializationError::Config(format!(
                "A {} catalog cannot back a {} factory",
                catalog.stack(),
                S::KIND
            )));
        }
        let default_context = catalog.default_context();
        Ok(Self {
            codec,
            catalog: Arc::new(catalog),
            default_context,
        })
    }

    /// Build an isolated factory from configuration overrides.
    pub fn from_config(config: &StackConfig) -> Result<Self, SerializationError> {
        let encodings = config.parsed_encodings()?;
        let catalog = ContextCatalog::for_stack(S::KIND)
            .with_overrides(config.default_context.as_deref(), &encodings)?;
        Self::new(catalog)
    }

    /// Factory installed by the calling thread's active scope, if any.
    pub fn current_factory() -> Option<Arc<Self>> {
        scope::current_factory::<S>()
    }

    /// The current factory if a scope is active, otherwise the stack's
    /// process-wide default.
    pub fn default_factory() -> Arc<Self> {
        Self::current_factory().unwrap_or_else(S::default_factory)
    }

    pub fn stack(&self) -> StackKind {
        S::KIND
    }

    pub fn catalog(&self) -> &ContextCatalog {
        &self.catalog
    }

    pub fn default_context(&self) -> &Arc<SerializationContext> {
        &self.default_context
    }

    /// Context installed by the calling thread's active scope, if any.
    pub fn current_context(&self) -> Option<Arc<SerializationContext>> {
        scope::current_context::<S>()
    }

    pub fn context(
        &self,
        identifier: &str,
    ) -> Result<Arc<SerializationContext>, SerializationError> {
        self.catalog.by_identifier(identifier)
    }

    /// Resolve the governing context: explicit, then ambient, then default.
    pub fn resolve_context<'a>(
        &self,
        explicit: Option<&'a SerializationContext>,
    ) -> Result<ResolvedContext<'a>, SerializationError> {
        let resolved = match explicit {
            Some(ctx) => ResolvedContext::Explicit(ctx),
            None => match self.current_context() {
                Some(ctx) => ResolvedContext::Ambient(ctx),
                None => ResolvedContext::Default(self.default_context.clone()),
            },
        };
        trace!(
            stack = %S::KIND,
            context = resolved.identifier(),
            source = ?resolved.source(),
            "Resolved serialization context"
        );
        Ok(resolved)
    }

    pub fn encode<T: Serialize + ?Sized>(
        &self,
        value: &T,
        context: Option<&SerializationContext>,
    ) -> Result<Vec<u8>, SerializationError> {
        let ctx = self.resolve_context(context)?;
        codec::encode(&self.codec, value, &ctx)
            .map_err(|e| SerializationError::codec(ctx.identifier(), e))
    }

    pub fn decode<T: DeserializeOwned>(
        &self,
        bytes: &[u8],
        context: Option<&SerializationContext>,
    ) -> Result<T, SerializationError> {
        let ctx = self.resolve_context(context)?;
        codec::decode(&self.codec, bytes, &ctx)
            .map(|(value, _)| value)
            .map_err(|e| SerializationError::codec(ctx.identifier(), e))
    }

    /// Decode and also return the resolved context adjusted to the encoding
    /// found in the bytes, so a reply can be written the same way.
    pub fn decode_with_compatible_context<T: DeserializeOwned>(
        &self,
        bytes: &[u8],
        context: Option<&SerializationContext>,
    ) -> Result<ObjectWithCompatibleContext<T>, SerializationError> {
        let ctx = self.resolve_context(context)?;
        let (value, encoding) = codec::decode(&self.codec, bytes, &ctx)
            .map_err(|e| SerializationError::codec(ctx.identifier(), e))?;
        let context = if ctx.encoding() == encoding {
            ctx.deref().clone()
        } else {
            ctx.with_encoding(encoding)
        };
        Ok(ObjectWithCompatibleContext { value, context })
    }

    pub fn serialize<T: Serialize + ?Sized>(
        &self,
        value: &T,
        context: &SerializationContext,
    ) -> Result<SerializedBytes<T>, SerializationError> {
        self.encode(value, Some(context)).map(SerializedBytes::from_bytes)
    }

    pub fn deserialize<T: DeserializeOwned>(
        &self,
        bytes: &[u8],
        context: &SerializationContext,
    ) -> Result<T, SerializationError> {
        self.decode(bytes, Some(context))
    }

    /// Serialize under the catalog context named `identifier`.
    pub fn serialize_named<T: Serialize + ?Sized>(
        &self,
        value: &T,
        identifier: &str,
    ) -> Result<SerializedBytes<T>, SerializationError> {
        let ctx = self.context(identifier)?;
        self.serialize(value, &ctx)
    }

    /// Run `f` with this factory installed as the current factory. Fails with
    /// [`SerializationError::ScopeAlreadyActive`] if a scope is already active.
    pub fn as_current<R>(
        self: &Arc<Self>,
        f: impl FnOnce(&Self) -> R,
    ) -> Result<R, SerializationError> {
        let _guard = lifecycle::enter_scope(self.clone(), None)?;
        Ok(f(self))
    }

    /// Run `f` with `context` as the current context, restoring the previous
    /// context afterwards. With no active scope, a temporary scope for this
    /// factory is entered for the duration of `f`.
    pub fn with_current_context<R>(
        self: &Arc<Self>,
        context: Arc<SerializationContext>,
        f: impl FnOnce(&Self) -> R,
    ) -> Result<R, SerializationError> {
        match scope::replace_context::<S>(Some(context.clone())) {
            Some((prior, generation)) => {
                let _restore = RestoreContext::<S> {
                    generation,
                    prior,
                    _stack: PhantomData,
                };
                Ok(f(self))
            }
            None => {
                let _guard = lifecycle::enter_scope(self.clone(), Some(context))?;
                Ok(f(self))
            }
        }
    }
}

/// Restores the context displaced by `with_current_context`, only into the
/// scope it was taken from.
struct RestoreContext<S: SerializationStack> {
    generation: u64,
    prior: Option<Arc<SerializationContext>>,
    _stack: PhantomData<S>,
}

impl<S: SerializationStack> Drop for RestoreContext<S> {
    fn drop(&mut self) {
        scope::restore_context::<S>(self.generation, self.prior.take());
    }
}

impl<S: SerializationStack> fmt::Debug for SerializationFactory<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationFactory")
            .field("stack", &S::KIND)
            .field("default_context", &self.default_context.identifier())
            .field("contexts", &self.catalog.identifiers().collect::<Vec<_>>())
            .finish()
    }
}
