//! Serialization stacks
//!
//! Each stack is a marker type tying together its codec, its execution-local
//! ambient slot, and its process-wide default factory. Factories are generic
//! over the stack, so a factory can only ever be installed in its own stack's
//! slot.

use crate::codec::{AmqpCodec, CheckpointCodec, Codec};
use crate::defaults;
use crate::factory::SerializationFactory;
use crate::scope::AmbientState;
use crate::types::StackKind;
use std::cell::RefCell;
use std::sync::Arc;
use std::thread::LocalKey;

pub trait SerializationStack: Sized + Send + Sync + 'static {
    const KIND: StackKind;

    type Codec: Codec + Default;

    /// This stack's ambient slot for the calling thread.
    fn ambient() -> &'static LocalKey<RefCell<AmbientState<Self>>>;

    /// The process-wide default factory, initialized on first use.
    fn default_factory() -> Arc<SerializationFactory<Self>>;
}

/// Compact internal stack used for checkpoints.
#[derive(Debug, Clone, Copy)]
pub struct CheckpointStack;

/// Self-describing stack used for P2P, RPC and storage.
#[derive(Debug, Clone, Copy)]
pub struct AmqpStack;

thread_local! {
    static CHECKPOINT_SCOPE: RefCell<AmbientState<CheckpointStack>> =
        const { RefCell::new(AmbientState::empty()) };
    static AMQP_SCOPE: RefCell<AmbientState<AmqpStack>> =
        const { RefCell::new(AmbientState::empty()) };
}

impl SerializationStack for CheckpointStack {
    const KIND: StackKind = StackKind::Checkpoint;

    type Codec = CheckpointCodec;

    fn ambient() -> &'static LocalKey<RefCell<AmbientState<Self>>> {
        &CHECKPOINT_SCOPE
    }

    fn default_factory() -> Arc<SerializationFactory<Self>> {
        defaults::checkpoint::SERIALIZATION_FACTORY.clone()
    }
}

impl SerializationStack for AmqpStack {
    const KIND: StackKind = StackKind::Amqp;

    type Codec = AmqpCodec;

    fn ambient() -> &'static LocalKey<RefCell<AmbientState<Self>>> {
        &AMQP_SCOPE
    }

    fn default_factory() -> Arc<SerializationFactory<Self>> {
        defaults::amqp::SERIALIZATION_FACTORY.clone()
    }
}
