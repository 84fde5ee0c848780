//! Reverse-numbered frame positions and the boundary scan.
//!
//! Stack positions are numbered from the bottom: for a stack of `N` locations
//! the oldest is `0` and the most recent is `N - 1`. Two stacks captured on the
//! same thread agree on the numbers of their shared lower frames, so an index
//! taken from a fresh capture inside a handler names the same frame in a stack
//! captured earlier, deeper in the same call chain. Pruning frames from either
//! end never renumbers the survivors.

use std::fmt;

use crate::stack::SourceLocation;

/// Position of a frame in reverse numbering (`0` = oldest).
///
/// [`FrameIndex::UNDEFINED`] marks a failed lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameIndex {
    value: u32,
}

impl FrameIndex {
    /// The index was not found.
    pub const UNDEFINED: FrameIndex = FrameIndex { value: u32::MAX };

    #[inline]
    pub const fn new(value: u32) -> Self {
        Self { value }
    }

    /// The numeric index, or `None` for [`UNDEFINED`](Self::UNDEFINED).
    #[inline]
    pub const fn get(self) -> Option<u32> {
        if self.is_undefined() {
            None
        } else {
            Some(self.value)
        }
    }

    #[inline]
    pub const fn is_undefined(self) -> bool {
        self.value == Self::UNDEFINED.value
    }

    /// Find the first frame below the `boundary` type's own frames.
    ///
    /// Scans `stack` from the most recent location. Frames are skipped until
    /// one is declared in `boundary` (case-sensitive suffix match on the type
    /// or trait path); after that, the first frame *not* declared in `boundary`
    /// is the answer. Returns [`UNDEFINED`](Self::UNDEFINED) for an empty
    /// stack, or when the boundary never appears or has nothing below it.
    ///
    /// Boundary frames are assumed to be contiguous. A call chain that
    /// re-enters the boundary type recursively resolves to the frame below the
    /// most recent run of boundary frames, which is not necessarily the one the
    /// caller meant. Frames removed by tail calls or inlining in optimized
    /// builds are not on the stack at all; the scan then answers with the
    /// nearest surviving frame.
    ///
    /// ## Example
    ///
    /// ```rust
    /// use snaptrace::{FrameIndex, SourceLocation};
    ///
    /// let stack = [
    ///     SourceLocation::new("snaptrace::stack::RawStack", "capture", 1),
    ///     SourceLocation::new("snaptrace::fault::Fault", "snap", 2),
    ///     SourceLocation::new("app::orders", "load", 3),
    ///     SourceLocation::new("app", "main", 4),
    /// ];
    /// assert_eq!(FrameIndex::locate(&stack, "::Fault"), FrameIndex::new(1));
    /// ```
    pub fn locate(stack: &[SourceLocation], boundary: &str) -> FrameIndex {
        Self::locate_by(stack, |loc| loc.declared_in(boundary))
    }

    /// [`locate`](Self::locate) with an arbitrary boundary predicate.
    pub fn locate_by<P>(stack: &[SourceLocation], mut is_boundary: P) -> FrameIndex
    where
        P: FnMut(&SourceLocation) -> bool,
    {
        let mut inside_boundary = false;
        for (index, location) in reversed(stack) {
            if is_boundary(location) {
                inside_boundary = true;
                continue;
            }
            if inside_boundary {
                return index;
            }
        }
        FrameIndex::UNDEFINED
    }
}

impl fmt::Display for FrameIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(value) => write!(f, "{}", value),
            None => f.write_str("?"),
        }
    }
}

/// Pair each element with its reverse index: `len - 1` for the first, `0` for the last.
pub(crate) fn reversed<T>(items: &[T]) -> impl Iterator<Item = (FrameIndex, &T)> + '_ {
    let len = items.len();
    items
        .iter()
        .enumerate()
        .map(move |(pos, item)| (FrameIndex::new(saturating_u32(len - 1 - pos)), item))
}

fn saturating_u32(n: usize) -> u32 {
    // UNDEFINED sits at u32::MAX, so real indices stop one short of it.
    u32::try_from(n).unwrap_or(u32::MAX - 1).min(u32::MAX - 1)
}
