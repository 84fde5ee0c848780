//! Precondition checks that fail with a [`Fault`].
//!
//! Each helper raises a fresh fault at the call site, so the failing check
//! shows up as the most recent frames of the render.
//!
//! ```rust
//! use snaptrace::{Fault, require_non_blank, require_some};
//!
//! fn greet(name: Option<&str>) -> Result<String, Fault> {
//!     let name = require_some(name, "name")?;
//!     let name = require_non_blank(name, "name")?;
//!     Ok(format!("hello {name}"))
//! }
//!
//! assert_eq!(greet(None).unwrap_err().message(), Some("require: name is None"));
//! assert_eq!(greet(Some("  ")).unwrap_err().message(), Some("require: name is blank"));
//! ```

use crate::fault::Fault;

fn label<'a>(name: &'a str, default: &'a str) -> &'a str {
    if name.trim().is_empty() { default } else { name }
}

/// Unwrap `value`, failing with `"require: <name> is None"`.
///
/// A blank `name` reads as `value`.
pub fn require_some<T>(value: Option<T>, name: &str) -> Result<T, Fault> {
    match value {
        Some(value) => Ok(value),
        None => Err(Fault::new(format!("require: {} is None", label(name, "value")))),
    }
}

/// Pass `value` through unless it is empty or whitespace only.
///
/// Fails with `"require: <name> is blank"`; a blank `name` reads as `string`.
pub fn require_non_blank<'a>(value: &'a str, name: &str) -> Result<&'a str, Fault> {
    if value.trim().is_empty() {
        Err(Fault::new(format!("require: {} is blank", label(name, "string"))))
    } else {
        Ok(value)
    }
}

/// Fail with `message` unless `condition` holds.
pub fn require_true(condition: bool, message: &str) -> Result<(), Fault> {
    if condition {
        Ok(())
    } else {
        Err(Fault::new(message))
    }
}

/// Fail with `message` if `condition` holds.
pub fn require_false(condition: bool, message: &str) -> Result<(), Fault> {
    require_true(!condition, message)
}
