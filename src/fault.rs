//! The [`Fault`] wrapper: captured frames, adoption policy, snapshot attachment.
//!
//! This module provides the core type of the crate. Adoption rules:
//!
//! | Adopted value | Result |
//! |---------------|--------|
//! | `Fault` raised on this thread | the same fault, unchanged |
//! | `Fault` raised on another thread | new fault, message embeds the other's render, frames rooted here |
//! | [`Traced`] | new fault, frames from the native stack |
//! | any other error | new fault, frames from the adoption site |
//! | nothing (`adopt_opt(None)`) | new fault, no message |

use std::any::Any;
use std::borrow::Cow;
use std::error::Error as StdError;
use std::fmt::{self, Write as _};
use std::thread::{self, ThreadId};

use uuid::Uuid;

use crate::ext::EXT_TRAIT;
use crate::frame::{CapturedFrame, build_frames};
use crate::index::FrameIndex;
use crate::render::{self, FaultFormatter, PlainFormatter, RenderOptions};
use crate::snapshot::Snapshot;
use crate::stack::{RawStack, SourceLocation};
use crate::traced::{CauseInfo, Traced};

const FAULT_TYPE: &str = concat!(module_path!(), "::Fault");

/// Frames of this crate's entry points, skipped when looking for the caller.
fn is_boundary(location: &SourceLocation) -> bool {
    location.declared_in(FAULT_TYPE) || location.declared_in(EXT_TRAIT)
}

// ============================================================================
// Fault
// ============================================================================

/// An unexpected failure with its call stack and attached snapshots.
///
/// Catch broadly, [`adopt`](Self::adopt), attach what you know with
/// [`snap`](Self::snap) while propagating, then log [`render()`](Self::render)
/// or show [`diagnostic_token()`](Self::diagnostic_token) to the user.
///
/// ## Example
///
/// ```rust
/// use snaptrace::{Fault, Traced};
///
/// fn fetch(_id: u64) -> Result<String, Traced> {
///     Err(Traced::capture(std::io::Error::other("bad connection")))
/// }
///
/// fn load(id: u64) -> Result<String, Fault> {
///     match fetch(id) {
///         Ok(data) => Ok(data),
///         Err(err) => {
///             let mut fault = Fault::adopt(err);
///             fault.snap("id", id);
///             Err(fault)
///         }
///     }
/// }
///
/// let fault = load(54110).unwrap_err();
/// assert!(fault.render().contains("[id=54110]"));
/// ```
pub struct Fault {
    id: Uuid,
    thread: ThreadId,
    message: Option<String>,
    cause: Option<CauseInfo>,
    /// Most recent first. Empty only when the source stack was empty.
    frames: Vec<CapturedFrame>,
}

impl Fault {
    /// Path suffix identifying this type's frames in a raw stack.
    pub const BOUNDARY: &'static str = FAULT_TYPE;

    /// Create a fault with a message, capturing the current call stack.
    ///
    /// The first frame is the caller; this constructor's own frames are dropped.
    #[inline(never)]
    pub fn new(message: impl Into<String>) -> Self {
        Self::from_stack(Some(message.into()), None, Self::capture_here())
    }

    /// Create a fault without a message, capturing the current call stack.
    #[inline(never)]
    pub fn empty() -> Self {
        Self::from_stack(None, None, Self::capture_here())
    }

    /// Wrap a foreign failure, building frames from its native stack.
    pub fn from_traced(traced: Traced) -> Self {
        let (cause, stack) = traced.into_cause_and_stack();
        let fault = Self::from_stack(None, Some(cause), stack);
        tracing::debug!(
            token = fault.diagnostic_token(),
            frames = fault.frames.len(),
            "wrapped traced failure"
        );
        fault
    }

    /// Wrap a plain error.
    ///
    /// Plain errors carry no stack, so frames come from the call site; this
    /// crate's own frames on top of it are dropped. Use [`adopt`](Self::adopt)
    /// when `error` may already be a `Fault`.
    #[inline(never)]
    pub fn from_error<E: StdError + 'static>(error: E) -> Self {
        let cause = CauseInfo::new(core::any::type_name::<E>(), Some(display_value(&error)));
        let fault = Self::from_stack(None, Some(cause), Self::capture_here());
        tracing::debug!(
            token = fault.diagnostic_token(),
            cause = core::any::type_name::<E>(),
            "wrapped foreign error"
        );
        fault
    }

    /// Convert any error into a `Fault`.
    ///
    /// A `Fault` raised on the calling thread comes back unchanged, so one
    /// logical failure stays one fault however often it is re-adopted on the
    /// way up.
    pub fn adopt<E: StdError + 'static>(failure: E) -> Self {
        Self::adopt_opt(Some(failure))
    }

    /// [`adopt`](Self::adopt) for a possibly missing failure.
    ///
    /// `None` yields a fresh fault without a message.
    pub fn adopt_opt<E: StdError + 'static>(failure: Option<E>) -> Self {
        let mut slot = failure;

        if let Some(fault) = take_as::<Fault, E>(&mut slot) {
            if fault.thread == thread::current().id() {
                tracing::trace!(token = fault.diagnostic_token(), "reusing fault raised on this thread");
                return fault;
            }
            return Self::from_other_thread(fault);
        }

        if let Some(traced) = take_as::<Traced, E>(&mut slot) {
            return Self::from_traced(traced);
        }

        match slot {
            Some(error) => Self::from_error(error),
            None => Self::empty(),
        }
    }

    /// Re-root a fault raised on another thread at the current call site.
    ///
    /// `other` is rendered into this fault's message; its frames are not
    /// merged. Frames above the caller of the adoption are pruned.
    #[inline(never)]
    fn from_other_thread(other: Fault) -> Self {
        let message = format!("[cause fault: {}]", other.render());
        let stack = RawStack::capture();
        let caller = FrameIndex::locate_by(stack.as_slice(), is_boundary);

        let mut fault = Self::from_stack(Some(message), other.cause.clone(), stack);
        fault.prune_above(caller);
        tracing::debug!(
            token = fault.diagnostic_token(),
            origin = other.diagnostic_token(),
            "adopted fault from another thread"
        );
        fault
    }

    /// The current stack, starting at the first frame outside this crate's API.
    #[inline(never)]
    fn capture_here() -> RawStack {
        let mut stack = RawStack::capture();
        stack.trim_top(is_boundary);
        stack
    }

    fn from_stack(message: Option<String>, cause: Option<CauseInfo>, stack: RawStack) -> Self {
        Self {
            id: Uuid::new_v4(),
            thread: thread::current().id(),
            message,
            cause,
            frames: build_frames(stack),
        }
    }

    /// Drop frames more recent than `index`, keeping `index` itself.
    fn prune_above(&mut self, index: FrameIndex) {
        if index.is_undefined() {
            return;
        }
        if let Some(pos) = self.frames.iter().position(|frame| frame.index() == index) {
            self.frames.drain(..pos);
        }
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Attach `name = value` to the frame of the calling function.
    ///
    /// The calling frame is found by capturing the current stack and taking
    /// the first frame below this crate's own. If that frame is not among the
    /// fault's frames, the most recent frame gets the snapshot instead. Does
    /// nothing when the fault has no frames.
    ///
    /// A value whose `Display` impl returns an error is recorded as
    /// `<unprintable>`.
    #[inline(never)]
    pub fn snap(&mut self, name: impl Into<Cow<'static, str>>, value: impl fmt::Display) {
        self.attach(Snapshot::new(name, Some(display_value(&value))));
    }

    /// Like [`snap`](Self::snap), recording `None` for an absent value.
    #[inline(never)]
    pub fn snap_opt<V: fmt::Display>(&mut self, name: impl Into<Cow<'static, str>>, value: Option<V>) {
        self.attach(Snapshot::new(name, value.as_ref().map(display_value)));
    }

    /// Like [`snap`](Self::snap), formatting the value with `Debug`.
    #[inline(never)]
    pub fn snap_debug(&mut self, name: impl Into<Cow<'static, str>>, value: impl fmt::Debug) {
        self.attach(Snapshot::new(name, Some(debug_value(&value))));
    }

    /// Chaining form of [`snap`](Self::snap).
    #[inline(never)]
    pub fn with_snap(mut self, name: impl Into<Cow<'static, str>>, value: impl fmt::Display) -> Self {
        self.attach(Snapshot::new(name, Some(display_value(&value))));
        self
    }

    /// Attach a prepared snapshot to the frame of the calling function.
    #[inline(never)]
    pub fn attach(&mut self, snapshot: Snapshot) {
        if self.frames.is_empty() {
            tracing::debug!(name = snapshot.name(), "fault has no frames; snapshot dropped");
            return;
        }
        let caller = self.caller_frame();
        self.attach_at(caller, snapshot);
    }

    /// Index of the first frame below this crate's own on the current stack.
    #[inline(never)]
    fn caller_frame(&self) -> FrameIndex {
        let stack = RawStack::capture();
        FrameIndex::locate_by(stack.as_slice(), is_boundary)
    }

    pub(crate) fn attach_at(&mut self, index: FrameIndex, snapshot: Snapshot) {
        let found = if index.is_undefined() {
            None
        } else {
            self.frames.iter().position(|frame| frame.index() == index)
        };
        let pos = found.unwrap_or_else(|| {
            // Oldest frames are the first to be cut from a render.
            tracing::debug!(
                name = snapshot.name(),
                %index,
                "calling frame not captured; attaching to most recent frame"
            );
            0
        });
        if let Some(frame) = self.frames.get_mut(pos) {
            frame.push_snapshot(snapshot);
        }
    }

    // ========================================================================
    // Read surface
    // ========================================================================

    /// Unique id assigned at construction.
    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Non-negative number derived from [`id()`](Self::id), safe to show users.
    pub fn diagnostic_token(&self) -> u32 {
        token_from_hash(uuid_hash(&self.id))
    }

    /// Thread the fault was constructed on.
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.thread
    }

    #[inline]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Declared type and message of the adopted foreign failure, if any.
    #[inline]
    pub fn cause(&self) -> Option<&CauseInfo> {
        self.cause.as_ref()
    }

    /// Captured frames, most recent first.
    #[inline]
    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    #[inline]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Header line only: token, thread, message and cause.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        match render::write_summary(self, &mut out) {
            Ok(()) => out,
            Err(_) => String::from("failed to summarize fault"),
        }
    }

    /// Header plus up to [`RenderOptions::global()`] frames with snapshots.
    pub fn render(&self) -> String {
        render::render(self, RenderOptions::global(), &PlainFormatter)
    }

    /// Render with explicit options.
    pub fn render_with(&self, options: &RenderOptions) -> String {
        render::render(self, options, &PlainFormatter)
    }

    /// Render with explicit options and a custom formatter.
    pub fn render_using<F: FaultFormatter + ?Sized>(&self, options: &RenderOptions, formatter: &F) -> String {
        render::render(self, options, formatter)
    }
}

/// Value text used when a `Display` or `Debug` impl reports an error.
const UNPRINTABLE: &str = "<unprintable>";

fn display_value<V: fmt::Display + ?Sized>(value: &V) -> String {
    let mut out = String::new();
    match write!(out, "{}", value) {
        Ok(()) => out,
        Err(_) => {
            tracing::debug!("snapshot value failed to format");
            UNPRINTABLE.to_owned()
        }
    }
}

fn debug_value<V: fmt::Debug + ?Sized>(value: &V) -> String {
    let mut out = String::new();
    match write!(out, "{:?}", value) {
        Ok(()) => out,
        Err(_) => {
            tracing::debug!("snapshot value failed to format");
            UNPRINTABLE.to_owned()
        }
    }
}

/// Move the value out of `slot` if it is a `T`.
fn take_as<T: 'static, E: 'static>(slot: &mut Option<E>) -> Option<T> {
    (slot as &mut dyn Any)
        .downcast_mut::<Option<T>>()
        .and_then(Option::take)
}

/// 32-bit hash of a UUID: both halves XORed, then folded.
pub(crate) fn uuid_hash(id: &Uuid) -> i32 {
    let bits = id.as_u128();
    let hilo = ((bits >> 64) as u64) ^ (bits as u64);
    ((hilo >> 32) as i32) ^ (hilo as i32)
}

/// Map a signed hash into `0..=i32::MAX`.
pub(crate) fn token_from_hash(hash: i32) -> u32 {
    if hash == i32::MIN {
        i32::MAX as u32
    } else {
        hash.unsigned_abs()
    }
}

// ============================================================================
// Trait impls
// ============================================================================

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fault")
            .field("token", &self.diagnostic_token())
            .field("thread", &self.thread)
            .field("message", &self.message)
            .field("cause", &self.cause)
            .field("frames", &self.frames.len())
            .finish()
    }
}

impl StdError for Fault {}
