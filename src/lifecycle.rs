//! Scope lifecycle
//!
//! The only way to install or clear an ambient scope. [`enter_scope`] returns a
//! [`ScopeGuard`] that clears the slot when dropped, so a scope is released on
//! every exit path including unwinding. The guard also carries the factory and
//! resolved context so callers can pass them down explicitly instead of reading
//! the ambient slot.

use crate::context::SerializationContext;
use crate::error::SerializationError;
use crate::factory::SerializationFactory;
use crate::scope;
use crate::stack::{AmqpStack, CheckpointStack, SerializationStack};
use std::marker::PhantomData;
use std::sync::Arc;

/// Install `factory` (and optionally `context`) as the calling thread's scope
/// for stack `S`.
///
/// Fails with [`SerializationError::ScopeAlreadyActive`] if a scope for `S` is
/// already installed on this thread.
pub fn enter_scope<S: SerializationStack>(
    factory: Arc<SerializationFactory<S>>,
    context: Option<Arc<SerializationContext>>,
) -> Result<ScopeGuard<S>, SerializationError> {
    let generation = scope::enter(factory.clone(), context.clone())?;
    Ok(ScopeGuard {
        factory,
        context,
        generation,
        _thread_bound: PhantomData,
    })
}

/// Clear the calling thread's scope for stack `S`. Safe to call when no scope
/// is active. A guard whose scope was cleared this way does nothing on drop.
pub fn exit_scope<S: SerializationStack>() {
    scope::exit::<S>();
}

/// Handle to an installed scope. Not `Send`: the scope lives in the thread
/// that entered it.
#[must_use = "the scope is exited as soon as the guard is dropped"]
pub struct ScopeGuard<S: SerializationStack> {
    factory: Arc<SerializationFactory<S>>,
    context: Option<Arc<SerializationContext>>,
    generation: u64,
    _thread_bound: PhantomData<*const ()>,
}

impl<S: SerializationStack> ScopeGuard<S> {
    pub fn factory(&self) -> &Arc<SerializationFactory<S>> {
        &self.factory
    }

    /// Context passed when the scope was entered, or the factory's default.
    ///
    /// This is fixed at entry. While
    /// [`SerializationFactory::with_current_context`] has swapped the slot,
    /// resolution uses the swapped context; read it with
    /// [`SerializationFactory::current_context`].
    pub fn context(&self) -> Arc<SerializationContext> {
        self.context
            .clone()
            .unwrap_or_else(|| self.factory.default_context().clone())
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Exit now rather than at end of scope.
    pub fn exit(self) {}
}

impl<S: SerializationStack> Drop for ScopeGuard<S> {
    fn drop(&mut self) {
        scope::exit_generation::<S>(self.generation);
    }
}

/// Scopes for both stacks, entered and released together.
pub struct SerializationEnvironment {
    checkpoint: ScopeGuard<CheckpointStack>,
    amqp: ScopeGuard<AmqpStack>,
}

impl SerializationEnvironment {
    /// Enter both stacks. If the AMQP scope cannot be entered the checkpoint
    /// scope is released before returning the error.
    pub fn enter(
        checkpoint: Arc<SerializationFactory<CheckpointStack>>,
        amqp: Arc<SerializationFactory<AmqpStack>>,
    ) -> Result<Self, SerializationError> {
        let checkpoint = enter_scope(checkpoint, None)?;
        let amqp = enter_scope(amqp, None)?;
        Ok(Self { checkpoint, amqp })
    }

    /// Enter both stacks with their process-wide default factories.
    pub fn with_defaults() -> Result<Self, SerializationError> {
        Self::enter(
            CheckpointStack::default_factory(),
            AmqpStack::default_factory(),
        )
    }

    pub fn checkpoint(&self) -> &ScopeGuard<CheckpointStack> {
        &self.checkpoint
    }

    pub fn amqp(&self) -> &ScopeGuard<AmqpStack> {
        &self.amqp
    }
}
