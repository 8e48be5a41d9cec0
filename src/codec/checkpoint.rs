//! Compact binary codec for the checkpoint stack.

use super::Codec;
use crate::context::SerializationContext;
use crate::error::CodecError;
use crate::types::SerializationMagic;
use serde::de::DeserializeOwned;
use serde::Serialize;

pub const CHECKPOINT_MAGIC: SerializationMagic =
    SerializationMagic::new([b'c', b'o', b'r', b'd', b'a', 0, 0]);

/// bincode bodies: no field names, no schema, smallest output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckpointCodec;

impl Codec for CheckpointCodec {
    fn magic(&self) -> SerializationMagic {
        CHECKPOINT_MAGIC
    }

    fn write_body<T: Serialize + ?Sized>(
        &self,
        value: &T,
        _context: &SerializationContext,
    ) -> Result<Vec<u8>, CodecError> {
        Ok(bincode::serialize(value)?)
    }

    fn read_body<T: DeserializeOwned>(
        &self,
        body: &[u8],
        _context: &SerializationContext,
    ) -> Result<T, CodecError> {
        Ok(bincode::deserialize(body)?)
    }
}
