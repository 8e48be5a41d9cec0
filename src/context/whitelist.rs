//! Class and encoding allow-lists carried by a serialization context.

use crate::types::SerializationEncoding;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Decides which types may cross a serialization boundary.
pub trait ClassWhitelist: fmt::Debug + Send + Sync {
    fn has_listed(&self, type_name: &str) -> bool;
}

/// Accepts every type. Used for internal boundaries.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllWhitelist;

impl ClassWhitelist for AllWhitelist {
    fn has_listed(&self, _type_name: &str) -> bool {
        true
    }
}

const BUILT_IN_TYPES: &[&str] = &[
    "()",
    "bool",
    "char",
    "u8",
    "u16",
    "u32",
    "u64",
    "u128",
    "usize",
    "i8",
    "i16",
    "i32",
    "i64",
    "i128",
    "isize",
    "f32",
    "f64",
    "str",
    "alloc::string::String",
    "alloc::vec::Vec",
    "alloc::boxed::Box",
    "alloc::collections::btree::map::BTreeMap",
    "alloc::collections::btree::set::BTreeSet",
    "alloc::collections::vec_deque::VecDeque",
    "std::collections::hash::map::HashMap",
    "std::collections::hash::set::HashSet",
    "core::option::Option",
    "core::result::Result",
];

/// Accepts primitives, strings, std containers, tuples, arrays and slices.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltInWhitelist;

impl ClassWhitelist for BuiltInWhitelist {
    fn has_listed(&self, type_name: &str) -> bool {
        let outer = outer_type_name(type_name);
        // tuples, arrays and slices are structural; their elements are not inspected
        if outer.starts_with('(') || outer.starts_with('[') {
            return true;
        }
        BUILT_IN_TYPES.contains(&outer)
    }
}

/// Another whitelist plus a set of explicitly listed type names.
#[derive(Debug, Clone)]
pub struct ExtendedWhitelist {
    base: Arc<dyn ClassWhitelist>,
    extra: BTreeSet<String>,
}

impl ExtendedWhitelist {
    pub fn new(base: Arc<dyn ClassWhitelist>) -> Self {
        Self {
            base,
            extra: BTreeSet::new(),
        }
    }

    pub fn with(mut self, type_name: &str) -> Self {
        self.extra.insert(outer_type_name(type_name).to_string());
        self
    }
}

impl ClassWhitelist for ExtendedWhitelist {
    fn has_listed(&self, type_name: &str) -> bool {
        self.extra.contains(outer_type_name(type_name)) || self.base.has_listed(type_name)
    }
}

/// Strip references and generic arguments: `&alloc::vec::Vec<u8>` -> `alloc::vec::Vec`.
pub(crate) fn outer_type_name(type_name: &str) -> &str {
    let mut name = type_name.trim();
    loop {
        if let Some(rest) = name.strip_prefix('&') {
            name = rest.trim_start();
        } else if let Some(rest) = name.strip_prefix("mut ") {
            name = rest.trim_start();
        } else {
            break;
        }
    }
    if name.starts_with('(') || name.starts_with('[') {
        return name;
    }
    match name.find('<') {
        Some(idx) => &name[..idx],
        None => name,
    }
}

/// Encodings a context accepts when decoding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EncodingWhitelist {
    accepted: BTreeSet<SerializationEncoding>,
}

impl EncodingWhitelist {
    /// Accepts no encodings; only unencoded bodies decode.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn all() -> Self {
        Self {
            accepted: [SerializationEncoding::Deflate].into_iter().collect(),
        }
    }

    pub fn with(mut self, encoding: SerializationEncoding) -> Self {
        self.accepted.insert(encoding);
        self
    }

    pub fn accepts(&self, encoding: SerializationEncoding) -> bool {
        self.accepted.contains(&encoding)
    }
}
