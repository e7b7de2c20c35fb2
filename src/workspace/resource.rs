//! Resource identity.
//!
//! [`ResourceId`] is the id of a Resource Tree node and the key of content-model
//! locks. [`ResourceHandle`] is the opaque value an importer attaches to a node
//! (e.g. an entry path inside an archive); the core only passes it through.

use std::fmt;
use std::sync::Arc;

/// Identifier of a workspace resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(u64);

impl ResourceId {
    /// Wraps a raw id.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw id.
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for ResourceId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque handle to an importable/inspectable unit.
///
/// Cheap to clone (`Arc`-backed).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceHandle(Arc<str>);

impl ResourceHandle {
    /// Creates a handle from any string-like value.
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    /// Returns the handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ResourceHandle {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceHandle {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ResourceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
