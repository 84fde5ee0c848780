//! # snaptrace - Call stacks with the values that mattered
//!
//! Capture the call stack of an unexpected failure once, then attach named
//! runtime values ("snapshots") to the frames that saw it while the error
//! propagates. The result renders as one numbered, bounded trace:
//!
//! ```text
//! snaptrace::fault::Fault: -:[1183924070]:- Thread: ThreadId(2). Cause: std::io::error::Error. Msg: connection reset.
//! ->> 14:app::db::fetch[src/db.rs:41]: [jj=159][data=None]
//! ->> 13:app::orders::load[src/orders.rs:12]: [order_id=54110]
//! ->> 12:app::main[src/main.rs:8]
//! ```
//!
//! ## Try It Now
//!
//! Adopt any error into a [`Fault`] and attach what you know on the way up:
//!
//! ```rust
//! use snaptrace::{Fault, ResultFaultExt};
//!
//! fn read_config(path: &str) -> Result<String, Fault> {
//!     std::fs::read_to_string(path).snap("path", || path.to_owned())
//! }
//!
//! fn start(path: &str, retries: u32) -> Result<String, Fault> {
//!     let config = read_config(path).snap("retries", || retries)?;
//!     Ok(config)
//! }
//!
//! let fault = start("/definitely/not/here.toml", 3).unwrap_err();
//! eprintln!("{}", fault.render());
//! println!("report this number: {}", fault.diagnostic_token());
//! ```
//!
//! ## Adopting Failures
//!
//! [`Fault::adopt`] is the single entry point. It never stacks one fault on
//! top of another:
//!
//! | Adopted value | Result |
//! |---------------|--------|
//! | `Fault` raised on this thread | the same fault, snapshots kept |
//! | `Fault` from another thread | a new fault; the other one is rendered into its message |
//! | [`Traced`] | a new fault with frames from the traced error's own stack |
//! | any other `Error` | a new fault with frames from the adoption site |
//!
//! Wrap errors in [`Traced`] where they are created when the origin matters:
//! frames then start at the failing call, not where the error was caught.
//!
//! ## Attaching Snapshots
//!
//! | Method | Value |
//! |--------|-------|
//! | [`fault.snap(name, v)`](Fault::snap) | `Display` |
//! | [`fault.snap_opt(name, opt)`](Fault::snap_opt) | `Option<Display>`, `None` recorded as such |
//! | [`fault.snap_debug(name, v)`](Fault::snap_debug) | `Debug` |
//! | [`result.snap(name, \|\| v)`](ResultFaultExt::snap) | lazy, error path only |
//!
//! A snapshot lands on the frame of the function that called `snap`. Frames
//! are numbered from the bottom of the stack ([`FrameIndex`]), so that
//! function is found again by index no matter how deep the fault was raised.
//! When it cannot be found the snapshot goes to the most recent frame.
//!
//! ## Rendering
//!
//! [`Fault::render`] shows at most [`DEFAULT_MAX_FRAMES`] frames, most recent
//! first. Set `SNAPTRACE_MAX_FRAMES` or call [`RenderOptions::set_global`] to
//! change the bound. Rendering never panics: formatter failures produce a
//! one-line fallback. Plug in a [`FaultFormatter`] to change the layout.
//!
//! ## Symbols
//!
//! Stacks are resolved with the `backtrace` crate. Without debuginfo, frames
//! render as `<unknown>[?]` and snapshots fall back to the most recent frame,
//! but nothing fails.
//!
//! Optimized builds can drop frames. A function whose last action is a call
//! may jump into the callee instead of calling it, so its frame never appears
//! on the stack; functions may also be inlined into their callers. A snapshot
//! taken in such a function lands on the nearest surviving caller frame. Mark
//! functions `#[inline(never)]` and keep the `snap` call out of tail position
//! when exact placement matters in release builds.
//!
//! The caller lookup assumes this crate's frames sit together at the top of
//! the stack. Code that re-enters `Fault` methods recursively (a `Display`
//! impl that snaps into another fault, say) resolves to the frame below the
//! most recent run of crate frames. See [`FrameIndex::locate`].

#![deny(unsafe_code)]

mod ext;
mod fault;
mod frame;
mod index;
pub mod prelude;
mod render;
mod require;
mod snapshot;
mod stack;
mod traced;

pub use ext::ResultFaultExt;
pub use fault::Fault;
pub use frame::{CapturedFrame, build_frames};
pub use index::FrameIndex;
pub use render::{
    ConfigError, DEFAULT_MAX_FRAMES, FaultFormatter, MAX_FRAMES_ENV, PlainFormatter, RenderError,
    RenderOptions,
};
pub use require::{require_false, require_non_blank, require_some, require_true};
pub use snapshot::Snapshot;
pub use stack::{RawStack, SourceLocation};
pub use traced::{CauseInfo, Traced};
