//! Named runtime values attached to captured frames.
//!
//! A [`Snapshot`] is an immutable `(name, value)` pair recorded while a
//! [`Fault`](crate::Fault) unwinds. The value is stringified by the caller
//! before it reaches this module; an absent value is stored as `None`.

use std::borrow::Cow;
use std::fmt;

// ============================================================================
// Snapshot
// ============================================================================

/// One piece of runtime state observed at a frame.
///
/// ## Example
///
/// ```rust
/// use snaptrace::Snapshot;
///
/// let snap = Snapshot::new("user_id", Some("42".to_string()));
/// assert_eq!(snap.to_string(), "[user_id=42]");
///
/// let missing = Snapshot::new("session", None);
/// assert_eq!(missing.to_string(), "[session=None]");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    name: Cow<'static, str>,
    value: Option<String>,
}

impl Snapshot {
    /// Create a snapshot. Static names are stored without allocation.
    #[inline]
    pub fn new(name: impl Into<Cow<'static, str>>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    /// Name of the variable, or any other label.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stringified value, `None` if the original value was absent.
    #[inline]
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "[{}={}]", self.name, value),
            None => write!(f, "[{}=None]", self.name),
        }
    }
}

// ============================================================================
// SnapshotVec - append-only per-frame storage
// ============================================================================
//
// Most frames carry no snapshots; the ones that do rarely carry more than a
// handful. With the `smallvec` feature the first four live inline.

#[cfg(feature = "smallvec")]
pub(crate) type SnapshotVec = smallvec::SmallVec<[Snapshot; 4]>;

#[cfg(not(feature = "smallvec"))]
pub(crate) type SnapshotVec = Vec<Snapshot>;
