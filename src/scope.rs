//! Ambient Scope Registry
//!
//! One slot per stack per thread holding the current factory and, optionally,
//! the current context. The slot starts empty on every thread, is only filled
//! through [`crate::lifecycle`], and is never written by serialize/deserialize
//! calls. Reads are side-effect free and never fail.

use crate::context::SerializationContext;
use crate::error::SerializationError;
use crate::factory::SerializationFactory;
use crate::stack::SerializationStack;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct AmbientState<S: SerializationStack> {
    factory: Option<Arc<SerializationFactory<S>>>,
    context: Option<Arc<SerializationContext>>,
    generation: u64,
}

impl<S: SerializationStack> AmbientState<S> {
    pub(crate) const fn empty() -> Self {
        Self {
            factory: None,
            context: None,
            generation: 0,
        }
    }

    /// The installed context, only while a scope is active.
    fn active_context(&self) -> Option<Arc<SerializationContext>> {
        self.factory.as_ref().and(self.context.clone())
    }
}

/// Snapshot of one stack's slot on the calling thread.
pub struct AmbientSnapshot<S: SerializationStack> {
    pub factory: Option<Arc<SerializationFactory<S>>>,
    pub context: Option<Arc<SerializationContext>>,
}

impl<S: SerializationStack> AmbientSnapshot<S> {
    pub fn is_scoped(&self) -> bool {
        self.factory.is_some()
    }
}

pub fn get<S: SerializationStack>() -> AmbientSnapshot<S> {
    S::ambient().with(|slot| {
        let slot = slot.borrow();
        AmbientSnapshot {
            factory: slot.factory.clone(),
            context: slot.active_context(),
        }
    })
}

pub fn current_factory<S: SerializationStack>() -> Option<Arc<SerializationFactory<S>>> {
    S::ambient().with(|slot| slot.borrow().factory.clone())
}

pub fn current_context<S: SerializationStack>() -> Option<Arc<SerializationContext>> {
    S::ambient().with(|slot| slot.borrow().active_context())
}

pub fn is_active<S: SerializationStack>() -> bool {
    S::ambient().with(|slot| slot.borrow().factory.is_some())
}

/// Install a scope. Returns the generation identifying it.
pub(crate) fn enter<S: SerializationStack>(
    factory: Arc<SerializationFactory<S>>,
    context: Option<Arc<SerializationContext>>,
) -> Result<u64, SerializationError> {
    S::ambient().with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.factory.is_some() {
            warn!(stack = %S::KIND, "Rejected nested serialization scope");
            return Err(SerializationError::ScopeAlreadyActive(S::KIND));
        }
        slot.generation += 1;
        debug!(
            stack = %S::KIND,
            generation = slot.generation,
            context = context.as_ref().map(|c| c.identifier()).unwrap_or("<factory default>"),
            "Entered serialization scope"
        );
        slot.factory = Some(factory);
        slot.context = context;
        Ok(slot.generation)
    })
}

/// Clear the slot unconditionally.
pub(crate) fn exit<S: SerializationStack>() {
    let released = S::ambient().with(|slot| take(&mut slot.borrow_mut()));
    if released.0.is_some() {
        debug!(stack = %S::KIND, "Exited serialization scope");
    }
    drop(released);
}

/// Clear the slot only if it still holds the scope installed as `generation`.
/// Tolerates being called while the thread's locals are being torn down.
pub(crate) fn exit_generation<S: SerializationStack>(generation: u64) -> bool {
    let released = S::ambient().try_with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.factory.is_some() && slot.generation == generation {
            Some(take(&mut slot))
        } else {
            None
        }
    });
    match released {
        Ok(Some(_)) => {
            debug!(stack = %S::KIND, generation, "Exited serialization scope");
            true
        }
        _ => false,
    }
}

/// Swap the current context of an active scope. Returns the previous context
/// and the generation of the scope it was swapped into, or `None` when no
/// scope is active.
pub(crate) fn replace_context<S: SerializationStack>(
    context: Option<Arc<SerializationContext>>,
) -> Option<(Option<Arc<SerializationContext>>, u64)> {
    S::ambient().with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.factory.is_none() {
            return None;
        }
        let prior = std::mem::replace(&mut slot.context, context);
        Some((prior, slot.generation))
    })
}

/// Put `prior` back, but only into the scope installed as `generation`. A
/// scope that was exited or replaced in the meantime is left untouched.
pub(crate) fn restore_context<S: SerializationStack>(
    generation: u64,
    prior: Option<Arc<SerializationContext>>,
) -> bool {
    let displaced = S::ambient().try_with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.factory.is_some() && slot.generation == generation {
            Some(std::mem::replace(&mut slot.context, prior))
        } else {
            None
        }
    });
    matches!(displaced, Ok(Some(_)))
}

type Released<S> = (
    Option<Arc<SerializationFactory<S>>>,
    Option<Arc<SerializationContext>>,
);

// Values are handed back so they drop after the borrow is released.
fn take<S: SerializationStack>(slot: &mut AmbientState<S>) -> Released<S> {
    (slot.factory.take(), slot.context.take())
}
