//! Serialization API
//!
//! Entry points for application code. Callers hold a factory explicitly (or
//! take a stack's default factory) and never touch the ambient registry
//! directly; when no context is passed the factory resolves one.

use crate::context::SerializationContext;
use crate::error::SerializationError;
use crate::factory::SerializationFactory;
use crate::stack::SerializationStack;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::marker::PhantomData;

/// Encoded bytes tagged with the type they were produced from.
pub struct SerializedBytes<T: ?Sized> {
    bytes: Vec<u8>,
    _type: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized> SerializedBytes<T> {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            _type: PhantomData,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// BLAKE3 digest of the encoded bytes.
    pub fn hash(&self) -> blake3::Hash {
        blake3::hash(&self.bytes)
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl<T: Serialize + ?Sized> SerializedBytes<T> {
    /// Serialize `value`, letting `factory` resolve the context when `context` is `None`.
    pub fn of<S: SerializationStack>(
        value: &T,
        factory: &SerializationFactory<S>,
        context: Option<&SerializationContext>,
    ) -> Result<Self, SerializationError> {
        factory.encode(value, context).map(Self::from_bytes)
    }
}

impl<T: DeserializeOwned> SerializedBytes<T> {
    pub fn deserialize<S: SerializationStack>(
        &self,
        factory: &SerializationFactory<S>,
        context: &SerializationContext,
    ) -> Result<T, SerializationError> {
        factory.deserialize(&self.bytes, context)
    }

    pub fn deserialize_with<S: SerializationStack>(
        &self,
        factory: &SerializationFactory<S>,
    ) -> Result<T, SerializationError> {
        factory.decode(&self.bytes, None)
    }
}

impl<T: ?Sized> Clone for SerializedBytes<T> {
    fn clone(&self) -> Self {
        Self::from_bytes(self.bytes.clone())
    }
}

impl<T: ?Sized> PartialEq for SerializedBytes<T> {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}

impl<T: ?Sized> Eq for SerializedBytes<T> {}

impl<T: ?Sized> AsRef<[u8]> for SerializedBytes<T> {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl<T: ?Sized> fmt::Debug for SerializedBytes<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializedBytes")
            .field("type", &std::any::type_name::<T>())
            .field("len", &self.bytes.len())
            .field("hash", &self.hash().to_hex().as_str())
            .finish()
    }
}

/// A decoded value and the context that matches how it was encoded.
#[derive(Debug, Clone)]
pub struct ObjectWithCompatibleContext<T> {
    pub value: T,
    pub context: SerializationContext,
}

pub fn serialize<S, T>(
    value: &T,
    factory: &SerializationFactory<S>,
    context: &SerializationContext,
) -> Result<SerializedBytes<T>, SerializationError>
where
    S: SerializationStack,
    T: Serialize + ?Sized,
{
    factory.serialize(value, context)
}

/// Serialize with the context `factory` resolves (ambient, then default).
pub fn serialize_with<S, T>(
    value: &T,
    factory: &SerializationFactory<S>,
) -> Result<SerializedBytes<T>, SerializationError>
where
    S: SerializationStack,
    T: Serialize + ?Sized,
{
    SerializedBytes::of(value, factory, None)
}

/// Serialize with stack `S`'s default factory and its resolved context.
pub fn serialize_default<S, T>(value: &T) -> Result<SerializedBytes<T>, SerializationError>
where
    S: SerializationStack,
    T: Serialize + ?Sized,
{
    serialize_with(value, &SerializationFactory::<S>::default_factory())
}

pub fn deserialize<S, T>(
    bytes: &[u8],
    factory: &SerializationFactory<S>,
    context: &SerializationContext,
) -> Result<T, SerializationError>
where
    S: SerializationStack,
    T: DeserializeOwned,
{
    factory.deserialize(bytes, context)
}

pub fn deserialize_with<S, T>(
    bytes: &[u8],
    factory: &SerializationFactory<S>,
) -> Result<T, SerializationError>
where
    S: SerializationStack,
    T: DeserializeOwned,
{
    factory.decode(bytes, None)
}

pub fn deserialize_with_compatible_context<S, T>(
    bytes: &[u8],
    factory: &SerializationFactory<S>,
    context: Option<&SerializationContext>,
) -> Result<ObjectWithCompatibleContext<T>, SerializationError>
where
    S: SerializationStack,
    T: DeserializeOwned,
{
    factory.decode_with_compatible_context(bytes, context)
}
