//! Bounded text rendering of a [`Fault`] and its snapshots.
//!
//! Rendering is a pure read and never panics: formatter errors and panics are
//! caught and replaced with a short fallback line, so reporting a fault can
//! never mask the fault being reported.
//!
//! ```text
//! snaptrace::fault::Fault: -:[1183924070]:- Thread: ThreadId(2). Cause: std::io::error::Error. Msg: connection reset.
//! ->> 14:app::db::fetch[src/db.rs:41]: [jj=159][data=None]
//! ->> 13:app::orders::load[src/orders.rs:12]: [order_id=54110]
//! ->> 12:app::main[src/main.rs:8]
//! ```

use std::any::Any;
use std::fmt;
use std::num::ParseIntError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::OnceLock;

use crate::fault::Fault;
use crate::frame::CapturedFrame;

/// Frames rendered when nothing else is configured.
pub const DEFAULT_MAX_FRAMES: usize = 32;

/// Environment variable read by [`RenderOptions::global()`].
pub const MAX_FRAMES_ENV: &str = "SNAPTRACE_MAX_FRAMES";

const BUFFER_SIZE: usize = 512;

static GLOBAL_OPTIONS: OnceLock<RenderOptions> = OnceLock::new();

// ============================================================================
// Errors
// ============================================================================

/// Why a render attempt fell back.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("formatter returned an error")]
    Format(#[from] fmt::Error),
    #[error("formatter panicked: {0}")]
    Panicked(String),
}

/// Invalid render configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SNAPTRACE_MAX_FRAMES must be a non-negative integer, got {value:?}")]
    InvalidMaxFrames {
        value: String,
        #[source]
        source: ParseIntError,
    },
}

// ============================================================================
// RenderOptions
// ============================================================================

/// Render configuration.
///
/// ## Example
///
/// ```rust
/// use snaptrace::{DEFAULT_MAX_FRAMES, RenderOptions};
///
/// const SHORT: RenderOptions = RenderOptions::new().with_max_frames(8);
/// assert_eq!(SHORT.max_frames(), 8);
/// assert_eq!(RenderOptions::default().max_frames(), DEFAULT_MAX_FRAMES);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    max_frames: usize,
}

impl RenderOptions {
    #[inline]
    pub const fn new() -> Self {
        Self {
            max_frames: DEFAULT_MAX_FRAMES,
        }
    }

    /// Render at most `max_frames` frames, most recent first.
    #[inline]
    pub const fn with_max_frames(mut self, max_frames: usize) -> Self {
        self.max_frames = max_frames;
        self
    }

    #[inline]
    pub const fn max_frames(&self) -> usize {
        self.max_frames
    }

    /// Parse the value of [`MAX_FRAMES_ENV`]. An unset variable yields the defaults.
    pub fn from_env_value(value: Option<&str>) -> Result<Self, ConfigError> {
        let Some(raw) = value else {
            return Ok(Self::new());
        };
        let max_frames = raw
            .trim()
            .parse::<usize>()
            .map_err(|source| ConfigError::InvalidMaxFrames {
                value: raw.to_owned(),
                source,
            })?;
        Ok(Self::new().with_max_frames(max_frames))
    }

    /// Options from the environment, falling back to the defaults on bad input.
    pub fn from_env() -> Self {
        let value = std::env::var(MAX_FRAMES_ENV).ok();
        match Self::from_env_value(value.as_deref()) {
            Ok(options) => options,
            Err(error) => {
                tracing::warn!(%error, "ignoring render configuration");
                Self::new()
            }
        }
    }

    /// Process-wide options used by [`Fault::render()`].
    ///
    /// Initialised on first use from [`from_env()`](Self::from_env) unless
    /// [`set_global()`](Self::set_global) ran first.
    pub fn global() -> &'static RenderOptions {
        GLOBAL_OPTIONS.get_or_init(Self::from_env)
    }

    /// Install process-wide options. Fails with `options` if already initialised.
    pub fn set_global(options: RenderOptions) -> Result<(), RenderOptions> {
        GLOBAL_OPTIONS.set(options)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// FaultFormatter
// ============================================================================

/// Hook for customising how a fault is written.
///
/// The default methods produce the plain format. Override either one; frame
/// data is available through [`Fault::frames()`].
///
/// ## Example
///
/// ```rust
/// use std::fmt;
/// use snaptrace::{CapturedFrame, Fault, FaultFormatter, RenderOptions};
///
/// struct Compact;
///
/// impl FaultFormatter for Compact {
///     fn write_frame(&self, frame: &CapturedFrame, out: &mut dyn fmt::Write) -> fmt::Result {
///         writeln!(out, "  {}", frame.location().function().unwrap_or("?"))
///     }
/// }
///
/// let fault = Fault::new("boom");
/// let text = fault.render_using(&RenderOptions::new().with_max_frames(3), &Compact);
/// assert!(text.contains("boom"));
/// ```
pub trait FaultFormatter {
    /// Write the header line: type, diagnostic token, thread, message, cause.
    fn write_header(&self, fault: &Fault, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(out, "{}: ", core::any::type_name::<Fault>())?;
        write_summary(fault, out)?;
        out.write_char('\n')
    }

    /// Write one frame line, snapshots included.
    fn write_frame(&self, frame: &CapturedFrame, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "{}", frame)
    }
}

/// The default format.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainFormatter;

impl FaultFormatter for PlainFormatter {}

/// `-:[token]:- Thread: ThreadId(n). message. Cause: type. Msg: message. `
pub(crate) fn write_summary(fault: &Fault, out: &mut dyn fmt::Write) -> fmt::Result {
    write!(
        out,
        "-:[{}]:- Thread: {:?}. ",
        fault.diagnostic_token(),
        fault.thread_id()
    )?;
    if let Some(message) = fault.message() {
        write!(out, "{}. ", message)?;
    }
    if let Some(cause) = fault.cause() {
        write!(
            out,
            "Cause: {}. Msg: {}. ",
            cause.type_name(),
            cause.message().unwrap_or("None")
        )?;
    }
    Ok(())
}

// ============================================================================
// Rendering
// ============================================================================

/// Render `fault`, substituting a fallback line for any failure.
pub(crate) fn render<F>(fault: &Fault, options: &RenderOptions, formatter: &F) -> String
where
    F: FaultFormatter + ?Sized,
{
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| {
        try_render(fault, options, formatter)
    }));
    let result = attempt.unwrap_or_else(|payload| Err(RenderError::Panicked(panic_message(&*payload))));

    match result {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!(%error, token = fault.diagnostic_token(), "failed to render fault");
            format!("failed to render fault: {}", error)
        }
    }
}

fn try_render<F>(fault: &Fault, options: &RenderOptions, formatter: &F) -> Result<String, RenderError>
where
    F: FaultFormatter + ?Sized,
{
    let mut out = String::with_capacity(BUFFER_SIZE);
    formatter.write_header(fault, &mut out)?;
    for frame in fault.frames().iter().take(options.max_frames()) {
        formatter.write_frame(frame, &mut out)?;
    }
    Ok(out)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_owned()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        String::from("unknown panic payload")
    }
}
