//! Foreign errors paired with the stack captured where they were raised.
//!
//! Plain Rust errors carry no call stack. Wrap one in [`Traced`] at the point
//! it is created and [`Fault::adopt`](crate::Fault::adopt) will build its
//! frames from that native stack instead of from the adoption site.

use std::error::Error as StdError;
use std::fmt;

use crate::stack::RawStack;

const TRACED_TYPE: &str = concat!(module_path!(), "::Traced");

/// Declared type and message of an adopted foreign failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CauseInfo {
    type_name: String,
    message: Option<String>,
}

impl CauseInfo {
    pub fn new(type_name: impl Into<String>, message: Option<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message,
        }
    }

    /// Declared type of the cause, e.g. `std::io::error::Error`.
    #[inline]
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// A foreign error with its native call stack.
///
/// ## Example
///
/// ```rust
/// use snaptrace::{Fault, Traced};
///
/// fn connect() -> Result<(), Traced> {
///     let err = std::io::Error::other("connection reset");
///     Err(Traced::capture(err))
/// }
///
/// let fault = Fault::adopt(connect().unwrap_err());
/// assert_eq!(fault.cause().map(|c| c.type_name()), Some("std::io::error::Error"));
/// ```
pub struct Traced {
    type_name: &'static str,
    message: String,
    stack: RawStack,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Traced {
    /// Wrap `error` and capture the caller's call stack.
    ///
    /// The stack starts at the caller; this constructor's own frame is dropped.
    #[inline(never)]
    pub fn capture<E: StdError + Send + Sync + 'static>(error: E) -> Self {
        let mut stack = RawStack::capture();
        stack.trim_top(|loc| loc.declared_in(TRACED_TYPE));
        Self {
            type_name: core::any::type_name::<E>(),
            message: error.to_string(),
            stack,
            source: Some(Box::new(error)),
        }
    }

    /// Build from parts, for failures whose stack was captured elsewhere.
    pub fn from_parts(type_name: &'static str, message: impl Into<String>, stack: RawStack) -> Self {
        Self {
            type_name,
            message: message.into(),
            stack,
            source: None,
        }
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Native stack, most recent location first.
    #[inline]
    pub fn stack(&self) -> &RawStack {
        &self.stack
    }

    /// Split into cause info and native stack.
    pub(crate) fn into_cause_and_stack(self) -> (CauseInfo, RawStack) {
        (
            CauseInfo::new(self.type_name, Some(self.message)),
            self.stack,
        )
    }
}

impl fmt::Debug for Traced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Traced")
            .field("type_name", &self.type_name)
            .field("message", &self.message)
            .field("frames", &self.stack.len())
            .finish()
    }
}

impl fmt::Display for Traced {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.type_name, self.message)
    }
}

impl StdError for Traced {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source.as_deref().map(|e| e as &(dyn StdError + 'static))
    }
}
