//! Self-describing codec for the AMQP stack.
//!
//! Bodies carry their field names so that peers running different builds can
//! still read each other's payloads. The body is JSON; the envelope header is
//! what marks the bytes as belonging to this stack.

use super::Codec;
use crate::context::SerializationContext;
use crate::error::CodecError;
use crate::types::SerializationMagic;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const AMQP_MAGIC: SerializationMagic =
    SerializationMagic::new([b'c', b'o', b'r', b'd', b'a', 1, 0]);

#[derive(Debug, Clone, Copy, Default)]
pub struct AmqpCodec;

impl Codec for AmqpCodec {
    fn magic(&self) -> SerializationMagic {
        AMQP_MAGIC
    }

    fn write_body<T: Serialize + ?Sized>(
        &self,
        value: &T,
        _context: &SerializationContext,
    ) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    fn read_body<T: DeserializeOwned>(
        &self,
        body: &[u8],
        _context: &SerializationContext,
    ) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(body)?)
    }
}
