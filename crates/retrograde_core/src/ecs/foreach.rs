//! # Foreach Stack
//!
//! Iterations over a class or group may nest, and callbacks run inside an
//! iteration may create or destroy entities. Each open iteration owns one
//! frame of a bounded stack recording the last slot it yielded; every step
//! resumes from the first list entry after that slot, so lists patched
//! mid-iteration never cause a slot to be visited twice.
//!
//! ```rust,ignore
//! let mut cursor = ForeachCursor::new();
//! while let Some(slot) = world.get_entities(ring, &mut cursor) {
//!     world.entity_mut(slot).position.y -= 0x10000;
//! }
//! ```

use super::entity::{SlotId, FOREACH_STACK_COUNT};
use crate::error::{CoreError, CoreResult};

/// Caller-side handle of one open iteration.
///
/// A fresh cursor opens a new iteration on first use. The iteration closes
/// itself (and resets the cursor) when it runs out of entities, or when the
/// cursor is passed to [`World::break_foreach_loop`](crate::World::break_foreach_loop).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ForeachCursor {
    frame: Option<FrameRef>,
}

impl ForeachCursor {
    /// Creates a cursor for a new iteration.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { frame: None }
    }

    /// Whether the cursor refers to an open iteration.
    #[inline]
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.frame.is_some()
    }

    #[inline]
    pub(crate) const fn frame(&self) -> Option<FrameRef> {
        self.frame
    }

    #[inline]
    pub(crate) fn attach(&mut self, frame: FrameRef) {
        self.frame = Some(frame);
    }

    #[inline]
    pub(crate) fn detach(&mut self) {
        self.frame = None;
    }
}

/// Identifies one stack frame for as long as it stays open.
///
/// The generation changes on every push, so a frame reopened at the same
/// depth by another loop never matches an older reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct FrameRef {
    pub(crate) depth: usize,
    generation: u32,
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    generation: u32,
    /// Last slot yielded.
    last: Option<SlotId>,
}

/// The stack of open iterations.
pub struct ForeachStack {
    frames: Vec<Frame>,
    next_generation: u32,
    /// Panic on misuse instead of logging.
    strict: bool,
}

impl ForeachStack {
    /// Creates an empty stack with all storage pre-allocated.
    #[must_use]
    pub fn new(strict: bool) -> Self {
        Self {
            frames: Vec::with_capacity(FOREACH_STACK_COUNT),
            next_generation: 0,
            strict,
        }
    }

    /// Returns the number of open iterations.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Whether misuse panics.
    #[inline]
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.strict
    }

    /// Opens an iteration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ForeachOverflow`] when [`FOREACH_STACK_COUNT`]
    /// iterations are already open.
    pub(crate) fn push(&mut self) -> CoreResult<FrameRef> {
        if self.frames.len() >= FOREACH_STACK_COUNT {
            return Err(CoreError::ForeachOverflow(self.frames.len()));
        }
        let generation = self.next_generation;
        self.next_generation = self.next_generation.wrapping_add(1);
        self.frames.push(Frame {
            generation,
            last: None,
        });
        Ok(FrameRef {
            depth: self.frames.len() - 1,
            generation,
        })
    }

    /// Whether `frame` still names an open iteration.
    #[inline]
    #[must_use]
    pub(crate) fn is_live(&self, frame: FrameRef) -> bool {
        self.frames
            .get(frame.depth)
            .is_some_and(|open| open.generation == frame.generation)
    }

    /// Closes the innermost iteration.
    ///
    /// # Returns
    ///
    /// False if no iteration was open.
    pub fn pop(&mut self) -> bool {
        self.frames.pop().is_some()
    }

    /// Returns the first slot index the iteration at `depth` may yield next.
    #[inline]
    #[must_use]
    pub fn resume_from(&self, depth: usize) -> usize {
        match self.frames.get(depth).and_then(|frame| frame.last) {
            Some(last) => last.index() + 1,
            None => 0,
        }
    }

    /// Records the slot just yielded by the iteration at `depth`.
    #[inline]
    pub fn record(&mut self, depth: usize, slot: SlotId) {
        if let Some(frame) = self.frames.get_mut(depth) {
            frame.last = Some(slot);
        }
    }

    /// Closes every iteration above `depth`.
    ///
    /// # Returns
    ///
    /// The number of iterations closed.
    pub fn truncate(&mut self, depth: usize) -> usize {
        let leaked = self.frames.len().saturating_sub(depth);
        self.frames.truncate(depth);
        leaked
    }
}
