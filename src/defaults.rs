//! Process-wide defaults
//!
//! One default factory per stack plus the named contexts of its catalog,
//! initialized once on first read and immutable afterwards. The contexts are
//! the same `Arc`s the default factory's catalog hands out.

/// Checkpoint stack defaults.
pub mod checkpoint {
    use crate::catalog::{self, ContextCatalog};
    use crate::context::SerializationContext;
    use crate::factory::SerializationFactory;
    use crate::stack::CheckpointStack;
    use lazy_static::lazy_static;
    use std::sync::Arc;

    lazy_static! {
        pub static ref SERIALIZATION_FACTORY: Arc<SerializationFactory<CheckpointStack>> =
            Arc::new(build_factory());
        pub static ref CHECKPOINT_CONTEXT: Arc<SerializationContext> =
            SERIALIZATION_FACTORY.catalog().default_context();
    }

    fn build_factory() -> SerializationFactory<CheckpointStack> {
        match SerializationFactory::new(ContextCatalog::checkpoint()) {
            Ok(factory) => factory,
            Err(e) => panic!("built-in {} catalog is invalid: {}", catalog::CHECKPOINT, e),
        }
    }
}

/// AMQP stack defaults.
pub mod amqp {
    use crate::catalog::{self, ContextCatalog};
    use crate::context::SerializationContext;
    use crate::factory::SerializationFactory;
    use crate::stack::AmqpStack;
    use lazy_static::lazy_static;
    use std::sync::Arc;

    lazy_static! {
        pub static ref SERIALIZATION_FACTORY: Arc<SerializationFactory<AmqpStack>> =
            Arc::new(build_factory());
        pub static ref P2P_CONTEXT: Arc<SerializationContext> = named(catalog::P2P);
        pub static ref RPC_SERVER_CONTEXT: Arc<SerializationContext> = named(catalog::RPC_SERVER);
        pub static ref RPC_CLIENT_CONTEXT: Arc<SerializationContext> = named(catalog::RPC_CLIENT);
        pub static ref STORAGE_CONTEXT: Arc<SerializationContext> = named(catalog::STORAGE);
    }

    fn build_factory() -> SerializationFactory<AmqpStack> {
        match SerializationFactory::new(ContextCatalog::amqp()) {
            Ok(factory) => factory,
            Err(e) => panic!("built-in amqp catalog is invalid: {}", e),
        }
    }

    fn named(id: &str) -> Arc<SerializationContext> {
        match SERIALIZATION_FACTORY.context(id) {
            Ok(ctx) => ctx,
            Err(e) => panic!("built-in amqp catalog is missing {}: {}", id, e),
        }
    }
}
