//! Serialization contexts: immutable rules for one encode/decode boundary.
//!
//! A context names the boundary (`identifier`), records who is on the other
//! side of it (`trust_boundary`), whether the body is compressed, and which
//! types and encodings may cross it. Contexts are shared read-only through
//! `Arc`; the `with_*` helpers derive a new context and leave the receiver
//! untouched.

pub mod whitelist;

pub use whitelist::{
    AllWhitelist, BuiltInWhitelist, ClassWhitelist, EncodingWhitelist, ExtendedWhitelist,
};

use crate::types::{SerializationEncoding, TrustBoundary, UseCase};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Clone)]
pub struct SerializationContext {
    identifier: String,
    use_case: UseCase,
    trust_boundary: TrustBoundary,
    encoding: Option<SerializationEncoding>,
    class_whitelist: Arc<dyn ClassWhitelist>,
    encoding_whitelist: EncodingWhitelist,
    properties: BTreeMap<String, String>,
}

impl SerializationContext {
    /// Create a context with no encoding, an empty encoding whitelist and no properties.
    pub fn new(
        identifier: impl Into<String>,
        use_case: UseCase,
        trust_boundary: TrustBoundary,
        class_whitelist: Arc<dyn ClassWhitelist>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            use_case,
            trust_boundary,
            encoding: None,
            class_whitelist,
            encoding_whitelist: EncodingWhitelist::none(),
            properties: BTreeMap::new(),
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn use_case(&self) -> UseCase {
        self.use_case
    }

    pub fn trust_boundary(&self) -> TrustBoundary {
        self.trust_boundary
    }

    /// Encoding applied to the body when serializing, if any.
    pub fn encoding(&self) -> Option<SerializationEncoding> {
        self.encoding
    }

    pub fn compression_enabled(&self) -> bool {
        self.encoding.is_some()
    }

    pub fn class_whitelist(&self) -> &Arc<dyn ClassWhitelist> {
        &self.class_whitelist
    }

    pub fn encoding_whitelist(&self) -> &EncodingWhitelist {
        &self.encoding_whitelist
    }

    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Whether `encoding` may be read under this context. A context always
    /// accepts the encoding it writes with.
    pub fn accepts_encoding(&self, encoding: SerializationEncoding) -> bool {
        self.encoding == Some(encoding) || self.encoding_whitelist.accepts(encoding)
    }

    pub fn with_property(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.properties.insert(key.into(), value.into());
        next
    }

    pub fn with_encoding(&self, encoding: Option<SerializationEncoding>) -> Self {
        let mut next = self.clone();
        next.encoding = encoding;
        next
    }

    pub fn with_encoding_whitelist(&self, encoding_whitelist: EncodingWhitelist) -> Self {
        let mut next = self.clone();
        next.encoding_whitelist = encoding_whitelist;
        next
    }

    /// Copy of this context whose class whitelist also accepts `type_name`.
    pub fn with_whitelisted(&self, type_name: &str) -> Self {
        let mut next = self.clone();
        next.class_whitelist =
            Arc::new(ExtendedWhitelist::new(self.class_whitelist.clone()).with(type_name));
        next
    }

    /// Shorthand for [`with_whitelisted`](Self::with_whitelisted) using `T`'s type name.
    pub fn with_whitelisted_type<T: ?Sized>(&self) -> Self {
        self.with_whitelisted(std::any::type_name::<T>())
    }

    pub fn with_use_case(&self, use_case: UseCase) -> Self {
        let mut next = self.clone();
        next.use_case = use_case;
        next
    }
}

impl fmt::Debug for SerializationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SerializationContext")
            .field("identifier", &self.identifier)
            .field("use_case", &self.use_case)
            .field("trust_boundary", &self.trust_boundary)
            .field("encoding", &self.encoding)
            .field("encoding_whitelist", &self.encoding_whitelist)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}
