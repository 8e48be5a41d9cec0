//! Envelope shared by every codec: `magic (7) | encoding tag (1) | body`.

use super::Codec;
use crate::context::SerializationContext;
use crate::error::CodecError;
use crate::types::{SerializationEncoding, SerializationMagic};
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{Read, Write};
use tracing::trace;

pub const HEADER_LEN: usize = SerializationMagic::LEN + 1;

/// Parsed envelope header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvelopeHeader {
    pub magic: SerializationMagic,
    pub encoding: Option<SerializationEncoding>,
}

/// Read the header without touching the body.
pub fn peek_header(bytes: &[u8]) -> Result<EnvelopeHeader, CodecError> {
    if bytes.is_empty() {
        return Err(CodecError::EmptyBytes);
    }
    if bytes.len() < HEADER_LEN {
        return Err(CodecError::Truncated {
            len: bytes.len(),
            header: HEADER_LEN,
        });
    }
    let mut magic = [0u8; SerializationMagic::LEN];
    magic.copy_from_slice(&bytes[..SerializationMagic::LEN]);
    let tag = bytes[SerializationMagic::LEN];
    let encoding = SerializationEncoding::from_tag(tag).ok_or(CodecError::UnknownEncoding(tag))?;
    Ok(EnvelopeHeader {
        magic: SerializationMagic::new(magic),
        encoding,
    })
}

fn check_whitelisted<T: ?Sized>(context: &SerializationContext) -> Result<(), CodecError> {
    let type_name = std::any::type_name::<T>();
    if context.class_whitelist().has_listed(type_name) {
        Ok(())
    } else {
        Err(CodecError::NotWhitelisted {
            context: context.identifier().to_string(),
            type_name: type_name.to_string(),
        })
    }
}

/// Encode `value` with `codec` under `context`.
pub fn encode<C, T>(
    codec: &C,
    value: &T,
    context: &SerializationContext,
) -> Result<Vec<u8>, CodecError>
where
    C: Codec,
    T: Serialize + ?Sized,
{
    check_whitelisted::<T>(context)?;
    let body = codec.write_body(value, context)?;

    let encoding = context.encoding();
    let body = match encoding {
        Some(SerializationEncoding::Deflate) => {
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&body)?;
            encoder.finish()?
        }
        None => body,
    };

    let mut out = Vec::with_capacity(HEADER_LEN + body.len());
    out.extend_from_slice(codec.magic().as_bytes());
    out.push(encoding.map(|e| e.tag()).unwrap_or(0));
    out.extend_from_slice(&body);

    trace!(
        context = context.identifier(),
        encoding = ?encoding,
        len = out.len(),
        "Encoded payload"
    );
    Ok(out)
}

/// Decode bytes produced by [`encode`]. Also returns the encoding found in the
/// header so callers can answer in kind.
pub fn decode<C, T>(
    codec: &C,
    bytes: &[u8],
    context: &SerializationContext,
) -> Result<(T, Option<SerializationEncoding>), CodecError>
where
    C: Codec,
    T: DeserializeOwned,
{
    let header = peek_header(bytes)?;
    let expected = codec.magic();
    if header.magic != expected {
        return Err(CodecError::MagicMismatch {
            expected,
            found: header.magic,
        });
    }

    let raw = &bytes[HEADER_LEN..];
    let body = match header.encoding {
        Some(encoding) => {
            if !context.accepts_encoding(encoding) {
                return Err(CodecError::EncodingNotWhitelisted {
                    context: context.identifier().to_string(),
                    encoding,
                });
            }
            let mut decoded = Vec::new();
            DeflateDecoder::new(raw).read_to_end(&mut decoded)?;
            decoded
        }
        None => raw.to_vec(),
    };

    check_whitelisted::<T>(context)?;
    let value = codec.read_body(&body, context)?;

    trace!(
        context = context.identifier(),
        encoding = ?header.encoding,
        len = bytes.len(),
        "Decoded payload"
    );
    Ok((value, header.encoding))
}
