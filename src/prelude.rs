//! Convenient re-exports for common usage.
//!
//! ## Usage
//!
//! ```rust
//! use snaptrace::prelude::*;
//!
//! fn parse(raw: &str) -> Result<u32, Fault> {
//!     raw.parse::<u32>().snap("raw", || raw.to_owned())
//! }
//!
//! fn run(limit: Option<&str>) -> Result<u32, Fault> {
//!     let limit = require_some(limit, "limit")?;
//!     parse(limit)
//! }
//!
//! assert_eq!(run(Some("10")).unwrap(), 10);
//! assert!(run(Some("ten")).unwrap_err().render().contains("[raw=ten]"));
//! ```

pub use crate::Fault;
pub use crate::ResultFaultExt;
pub use crate::Traced;
pub use crate::{require_false, require_non_blank, require_some, require_true};
