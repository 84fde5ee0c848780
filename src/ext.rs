//! Extension trait for adopting errors directly on `Result`s.
//!
//! [`ResultFaultExt`] saves the `match` boilerplate at each propagation step:
//!
//! - `.fault()` adopts the error into a [`Fault`]
//! - `.snap(name, || value)` adopts and attaches a snapshot to the calling frame
//! - `.snap_debug(name, || value)` does the same with a `Debug` value
//!
//! The closures only run on the error path.

use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt;

use crate::fault::Fault;

/// Declaring path of [`ResultFaultExt`], treated as part of the fault boundary.
pub(crate) const EXT_TRAIT: &str = concat!(module_path!(), "::ResultFaultExt");

/// Adopt the error of a `Result` into a [`Fault`].
///
/// Implemented for every `Result<T, E>` whose error is a `std::error::Error`,
/// including `Result<T, Fault>`: re-adopting a fault raised on the same thread
/// hands back the same fault, so snapshots accumulate on one value.
///
/// ```rust
/// use snaptrace::{Fault, ResultFaultExt};
///
/// fn parse_port(raw: &str) -> Result<u16, Fault> {
///     raw.parse::<u16>().snap("raw", || raw.to_owned())
/// }
///
/// fn configure(raw: &str) -> Result<u16, Fault> {
///     let port = parse_port(raw).snap("stage", || "configure")?;
///     Ok(port)
/// }
///
/// let fault = configure("eighty").unwrap_err();
/// let text = fault.render();
/// assert!(text.contains("[raw=eighty]"));
/// assert!(text.contains("[stage=configure]"));
/// ```
pub trait ResultFaultExt<T> {
    /// Adopt the error, if any.
    fn fault(self) -> Result<T, Fault>;

    /// Adopt the error and attach `name = f()` to the calling frame.
    fn snap<V, F>(self, name: impl Into<Cow<'static, str>>, f: F) -> Result<T, Fault>
    where
        V: fmt::Display,
        F: FnOnce() -> V;

    /// Adopt the error and attach `name = {:?}` of `f()` to the calling frame.
    fn snap_debug<V, F>(self, name: impl Into<Cow<'static, str>>, f: F) -> Result<T, Fault>
    where
        V: fmt::Debug,
        F: FnOnce() -> V;
}

// Explicit matches rather than `map_err`: a combinator frame between this
// trait and the caller would be taken for the caller.
impl<T, E: StdError + 'static> ResultFaultExt<T> for Result<T, E> {
    #[inline(never)]
    fn fault(self) -> Result<T, Fault> {
        match self {
            Ok(value) => Ok(value),
            Err(error) => Err(Fault::adopt(error)),
        }
    }

    #[inline(never)]
    fn snap<V, F>(self, name: impl Into<Cow<'static, str>>, f: F) -> Result<T, Fault>
    where
        V: fmt::Display,
        F: FnOnce() -> V,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => {
                let mut fault = Fault::adopt(error);
                fault.snap(name, f());
                Err(fault)
            }
        }
    }

    #[inline(never)]
    fn snap_debug<V, F>(self, name: impl Into<Cow<'static, str>>, f: F) -> Result<T, Fault>
    where
        V: fmt::Debug,
        F: FnOnce() -> V,
    {
        match self {
            Ok(value) => Ok(value),
            Err(error) => {
                let mut fault = Fault::adopt(error);
                fault.snap_debug(name, f());
                Err(fault)
            }
        }
    }
}
