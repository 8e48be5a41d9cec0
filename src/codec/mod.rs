//! Codec capability
//!
//! A codec turns a value into a body and back under one serialization context.
//! The shared [`envelope`] prefixes every body with the stack magic and the
//! encoding tag, applies compression, and enforces the context's whitelists.
//! Factories only resolve contexts and dispatch here.

pub mod amqp;
pub mod checkpoint;
pub mod envelope;

pub use amqp::AmqpCodec;
pub use checkpoint::CheckpointCodec;
pub use envelope::{decode, encode, peek_header, EnvelopeHeader};

use crate::context::SerializationContext;
use crate::error::CodecError;
use crate::types::SerializationMagic;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Body encoder/decoder for one stack.
pub trait Codec: Send + Sync + 'static {
    /// Header prefix written before every body this codec produces.
    fn magic(&self) -> SerializationMagic;

    fn write_body<T: Serialize + ?Sized>(
        &self,
        value: &T,
        context: &SerializationContext,
    ) -> Result<Vec<u8>, CodecError>;

    fn read_body<T: DeserializeOwned>(
        &self,
        body: &[u8],
        context: &SerializationContext,
    ) -> Result<T, CodecError>;
}
