//! Integration tests for ambient scope handling
//!
//! Scopes are thread-local, rejected when nested, always released (including
//! on panic), and only ever consulted after an explicit context.

use serscope::catalog::{self, ContextCatalog};
use serscope::codec::peek_header;
use serscope::factory::ContextSource;
use serscope::scope;
use serscope::types::SerializationEncoding;
use serscope::{
    api, enter_scope, exit_scope, AmqpStack, CheckpointStack, CodecError, SerializationError,
    SerializationEnvironment, SerializationFactory, SerializationStack,
};
use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Invoice {
    number: u32,
}

fn isolated_amqp() -> Arc<SerializationFactory<AmqpStack>> {
    Arc::new(SerializationFactory::new(ContextCatalog::amqp()).unwrap())
}

#[test]
fn test_fresh_thread_starts_unscoped() {
    let snapshot = scope::get::<AmqpStack>();
    assert!(!snapshot.is_scoped());
    assert!(snapshot.context.is_none());
    assert!(SerializationFactory::<CheckpointStack>::current_factory().is_none());
}

#[test]
fn test_reentrant_enter_rejected() {
    let factory = isolated_amqp();
    let _guard = enter_scope(factory.clone(), None).unwrap();
    let err = enter_scope(factory, None).err().unwrap();
    assert!(matches!(err, SerializationError::ScopeAlreadyActive(_)));

    // the other stack is independent
    let _checkpoint = enter_scope(CheckpointStack::default_factory(), None).unwrap();
}

#[test]
fn test_scope_released_on_panic() {
    let factory = isolated_amqp();
    let result = catch_unwind(AssertUnwindSafe(|| {
        let _guard = enter_scope(factory.clone(), None).unwrap();
        assert!(scope::is_active::<AmqpStack>());
        panic!("scoped work failed");
    }));
    assert!(result.is_err());
    assert!(!scope::is_active::<AmqpStack>());
    assert!(enter_scope(factory, None).is_ok());
}

#[test]
fn test_scope_not_visible_to_other_threads() {
    let factory = isolated_amqp();
    let storage = factory.context(catalog::STORAGE).unwrap();
    let _guard = enter_scope(factory.clone(), Some(storage)).unwrap();
    assert!(SerializationFactory::<AmqpStack>::current_factory().is_some());

    let handle = thread::spawn(|| {
        let snapshot = scope::get::<AmqpStack>();
        let leaked = snapshot.is_scoped() || snapshot.context.is_some();

        // and the other thread can enter its own scope
        let entered = enter_scope(isolated_amqp(), None).is_ok();
        (leaked, entered)
    });
    let (leaked, entered) = handle.join().unwrap();
    assert!(!leaked);
    assert!(entered);

    assert!(Arc::ptr_eq(
        &SerializationFactory::<AmqpStack>::current_factory().unwrap(),
        &factory
    ));
}

#[test]
fn test_resolution_priority_observed_through_encoding() {
    let factory = isolated_amqp();
    let invoice = Invoice { number: 7 };

    // default: p2p, an external context that refuses unlisted types
    let err = factory.encode(&invoice, None).unwrap_err();
    match err {
        SerializationError::CodecFailure { context, source } => {
            assert_eq!(context, catalog::P2P);
            assert!(matches!(source, CodecError::NotWhitelisted { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }

    // ambient: storage accepts any type, uncompressed
    let storage = factory.context(catalog::STORAGE).unwrap();
    let guard = enter_scope(factory.clone(), Some(storage.clone())).unwrap();
    assert_eq!(
        factory.resolve_context(None).unwrap().source(),
        ContextSource::Ambient
    );
    let bytes = factory.encode(&invoice, None).unwrap();
    assert_eq!(peek_header(&bytes).unwrap().encoding, None);

    // explicit beats ambient
    let explicit = storage.with_encoding(Some(SerializationEncoding::Deflate));
    let bytes = factory.encode(&invoice, Some(&explicit)).unwrap();
    assert_eq!(
        peek_header(&bytes).unwrap().encoding,
        Some(SerializationEncoding::Deflate)
    );
    let decoded: Invoice = factory.decode(&bytes, Some(&explicit)).unwrap();
    assert_eq!(decoded, invoice);

    // back to default once the scope is gone
    drop(guard);
    assert!(factory.encode(&invoice, None).is_err());
}

#[test]
fn test_default_factory_follows_scope() {
    let factory = isolated_amqp();
    assert!(!Arc::ptr_eq(
        &SerializationFactory::<AmqpStack>::default_factory(),
        &factory
    ));
    factory
        .as_current(|_| {
            assert!(Arc::ptr_eq(
                &SerializationFactory::<AmqpStack>::default_factory(),
                &factory
            ));
            let bytes = api::serialize_default::<AmqpStack, _>("hello").unwrap();
            assert!(!bytes.is_empty());
        })
        .unwrap();
    assert!(Arc::ptr_eq(
        &SerializationFactory::<AmqpStack>::default_factory(),
        &AmqpStack::default_factory()
    ));
}

#[test]
fn test_exit_scope_clears_both_fields() {
    let factory = isolated_amqp();
    let guard = enter_scope(factory.clone(), Some(factory.context(catalog::RPC_SERVER).unwrap()))
        .unwrap();
    exit_scope::<AmqpStack>();
    let snapshot = scope::get::<AmqpStack>();
    assert!(snapshot.factory.is_none());
    assert!(snapshot.context.is_none());
    exit_scope::<AmqpStack>();
    drop(guard);
}

#[test]
fn test_environment_scopes_both_stacks_per_unit_of_work() {
    for _ in 0..3 {
        assert!(!scope::is_active::<CheckpointStack>());
        assert!(!scope::is_active::<AmqpStack>());
        let env = SerializationEnvironment::with_defaults().unwrap();
        let bytes = api::serialize_with("unit", env.amqp().factory()).unwrap();
        let value: String = api::deserialize_with(bytes.bytes(), env.amqp().factory()).unwrap();
        assert_eq!(value, "unit");
    }
    assert!(!scope::is_active::<AmqpStack>());
}

#[test]
fn test_context_swap_does_not_outlive_scope() {
    let factory = isolated_amqp();
    let storage = factory.context(catalog::STORAGE).unwrap();
    let rpc = factory.context(catalog::RPC_CLIENT).unwrap();
    let guard = enter_scope(factory.clone(), Some(storage)).unwrap();

    factory
        .with_current_context(rpc, |_| exit_scope::<AmqpStack>())
        .unwrap();
    drop(guard);

    let snapshot = scope::get::<AmqpStack>();
    assert!(!snapshot.is_scoped());
    assert!(snapshot.context.is_none());
    assert_eq!(
        factory.resolve_context(None).unwrap().source(),
        ContextSource::Default
    );
    assert!(factory.encode(&Invoice { number: 1 }, None).is_err());
}
