//! Integration tests for configuration loading
//!
//! Loads TOML files and environment overrides and checks that factories built
//! from the result honor them.

use crate::integration::test_utils::{with_config_env, write_global_config};
use serscope::catalog;
use serscope::codec::peek_header;
use serscope::config::ConfigLoader;
use serscope::types::SerializationEncoding;
use serscope::{api, AmqpStack, CheckpointStack, SerializationError, SerializationFactory};
use std::sync::Arc;
use tempfile::TempDir;

const STORAGE_DEFLATE: &str = r#"
[amqp]
default_context = "storage"

[amqp.encodings]
storage = "deflate"

[checkpoint.encodings]
checkpoint = "none"

[logging]
level = "debug"
format = "json"
"#;

#[test]
fn test_load_from_file_builds_configured_factories() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("serscope.toml");
    std::fs::write(&path, STORAGE_DEFLATE).unwrap();

    let config = with_config_env(&test_dir, &[], || ConfigLoader::load_from_file(&path)).unwrap();
    assert_eq!(config.amqp.default_context.as_deref(), Some("storage"));
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");

    let amqp = Arc::new(SerializationFactory::<AmqpStack>::from_config(&config.amqp).unwrap());
    assert_eq!(amqp.default_context().identifier(), catalog::STORAGE);
    let bytes = api::serialize_with("stored", &amqp).unwrap();
    assert_eq!(
        peek_header(bytes.bytes()).unwrap().encoding,
        Some(SerializationEncoding::Deflate)
    );
    let value: String = api::deserialize_with(bytes.bytes(), &amqp).unwrap();
    assert_eq!(value, "stored");

    let checkpoint =
        SerializationFactory::<CheckpointStack>::from_config(&config.checkpoint).unwrap();
    assert!(!checkpoint.default_context().compression_enabled());
}

#[test]
fn test_missing_file_is_an_error() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("absent.toml");
    let err = ConfigLoader::load_from_file(&path).unwrap_err();
    assert!(matches!(err, SerializationError::Config(_)));
}

#[test]
fn test_invalid_file_rejected() {
    let test_dir = TempDir::new().unwrap();
    let path = test_dir.path().join("serscope.toml");
    std::fs::write(&path, "[checkpoint]\ndefault_context = \"p2p\"\n").unwrap();

    let err = with_config_env(&test_dir, &[], || ConfigLoader::load_from_file(&path)).unwrap_err();
    match err {
        SerializationError::Config(message) => assert!(message.contains("p2p"), "{message}"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_global_file_and_env_override() {
    let test_dir = TempDir::new().unwrap();
    write_global_config(&test_dir, "[amqp]\ndefault_context = \"rpc-client\"\n");

    let from_file = with_config_env(&test_dir, &[], ConfigLoader::load).unwrap();
    assert_eq!(from_file.amqp.default_context.as_deref(), Some("rpc-client"));

    let overridden = with_config_env(
        &test_dir,
        &[("SERSCOPE_AMQP__DEFAULT_CONTEXT", "storage")],
        ConfigLoader::load,
    )
    .unwrap();
    assert_eq!(overridden.amqp.default_context.as_deref(), Some("storage"));

    let factory = SerializationFactory::<AmqpStack>::from_config(&overridden.amqp).unwrap();
    assert_eq!(factory.default_context().identifier(), catalog::STORAGE);
}

#[test]
fn test_no_global_file_yields_defaults() {
    let test_dir = TempDir::new().unwrap();
    let config = with_config_env(&test_dir, &[], ConfigLoader::load).unwrap();
    assert!(config.amqp.default_context.is_none());
    assert!(config.checkpoint.encodings.is_empty());

    let factory = SerializationFactory::<AmqpStack>::from_config(&config.amqp).unwrap();
    assert_eq!(factory.default_context().identifier(), catalog::P2P);
}
