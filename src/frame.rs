//! Captured frames: one stack location plus the snapshots attached to it.

use std::fmt;

use crate::index::{FrameIndex, reversed};
use crate::snapshot::{Snapshot, SnapshotVec};
use crate::stack::{RawStack, SourceLocation};

/// One recorded stack position and its snapshots.
///
/// Returned by [`Fault::frames()`](crate::Fault::frames). The index and
/// location never change; snapshots are only ever appended.
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    index: FrameIndex,
    location: SourceLocation,
    snapshots: SnapshotVec,
}

impl CapturedFrame {
    /// Create a frame with no snapshots.
    pub fn new(index: FrameIndex, location: SourceLocation) -> Self {
        Self {
            index,
            location,
            snapshots: SnapshotVec::new(),
        }
    }

    /// Reverse-numbered position of this frame (`0` = oldest).
    #[inline]
    pub fn index(&self) -> FrameIndex {
        self.index
    }

    #[inline]
    pub fn location(&self) -> &SourceLocation {
        &self.location
    }

    /// Snapshots in attachment order.
    #[inline]
    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    #[inline]
    pub fn has_snapshots(&self) -> bool {
        !self.snapshots.is_empty()
    }

    #[inline]
    pub(crate) fn push_snapshot(&mut self, snapshot: Snapshot) {
        self.snapshots.push(snapshot);
    }
}

/// `->> 12:app::db::open[src/db.rs:40]: [id=7][retry=false]`
impl fmt::Display for CapturedFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "->> {}:{}", self.index, self.location)?;
        if !self.snapshots.is_empty() {
            f.write_str(": ")?;
            for snapshot in &self.snapshots {
                write!(f, "{}", snapshot)?;
            }
        }
        Ok(())
    }
}

/// Wrap every location of `stack` into a [`CapturedFrame`], keeping its order.
///
/// The first (most recent) location gets index `len - 1`, the last gets `0`.
/// An empty stack yields no frames.
pub fn build_frames(stack: RawStack) -> Vec<CapturedFrame> {
    if stack.is_empty() {
        return Vec::new();
    }
    let indices: Vec<FrameIndex> = reversed(stack.as_slice()).map(|(index, _)| index).collect();
    indices
        .into_iter()
        .zip(stack)
        .map(|(index, location)| CapturedFrame::new(index, location))
        .collect()
}
