//! Shrink-retry policy for windows that time out.

use crate::domain::Window;

/// A timed-out window is re-requested as pieces of `1 / SHRINK_DIVISOR` of
/// its own size.
pub const SHRINK_DIVISOR: u64 = 10;

/// How far a timed-out window may be broken up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShrinkPolicy {
    /// Absolute floor; a window this small that still times out is given up.
    pub min_chunk: u64,
    pub divisor: u64,
}

impl Default for ShrinkPolicy {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ShrinkPolicy {
    pub fn new(min_chunk: u64) -> Self {
        Self {
            min_chunk: min_chunk.max(1),
            divisor: SHRINK_DIVISOR,
        }
    }

    pub const fn can_shrink(&self, window: Window) -> bool {
        window.count > self.min_chunk
    }

    /// Size of the pieces a window of `count` is retried with.
    pub fn piece_size(&self, count: u64) -> u64 {
        (count / self.divisor.max(2)).max(self.min_chunk)
    }

    /// Consecutive sub-windows covering `window`, or `None` once the floor is
    /// reached.
    pub fn shrink(&self, window: Window) -> Option<Vec<Window>> {
        if !self.can_shrink(window) {
            return None;
        }
        Some(window.split(self.piece_size(window.count)))
    }

    /// Deepest shrink level a window of `count` can reach before hitting the
    /// floor.
    pub fn max_depth(&self, count: u64) -> u32 {
        let mut depth = 0;
        let mut size = count;
        while size > self.min_chunk {
            size = self.piece_size(size);
            depth += 1;
        }
        depth
    }
}
