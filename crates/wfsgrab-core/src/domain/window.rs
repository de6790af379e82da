use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Contiguous offset range `[start, start + count)` of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Window {
    pub start: u64,
    pub count: u64,
}

impl Window {
    pub const fn new(start: u64, count: u64) -> Self {
        Self { start, count }
    }

    pub const fn end(self) -> u64 {
        self.start.saturating_add(self.count)
    }

    /// Consecutive windows of `size` covering `[0, total)`; the last one is
    /// truncated to fit. Windows are produced on demand, so an absurd `total`
    /// costs nothing until iterated.
    pub fn partition(total: u64, size: u64) -> Pieces {
        Self::new(0, total).pieces(size)
    }

    /// Lazy consecutive pieces of `size`, in ascending order, the last piece
    /// truncated.
    pub fn pieces(self, size: u64) -> Pieces {
        Pieces {
            next_start: self.start,
            end: self.end(),
            size: size.max(1),
        }
    }

    /// [`Window::pieces`], collected.
    pub fn split(self, size: u64) -> Vec<Window> {
        self.pieces(size).collect()
    }
}

/// Iterator returned by [`Window::pieces`] and [`Window::partition`].
#[derive(Debug, Clone)]
pub struct Pieces {
    next_start: u64,
    end: u64,
    size: u64,
}

impl Pieces {
    /// Number of windows still to come.
    pub fn remaining(&self) -> u64 {
        (self.end - self.next_start).div_ceil(self.size)
    }
}

impl Iterator for Pieces {
    type Item = Window;

    fn next(&mut self) -> Option<Window> {
        if self.next_start >= self.end {
            return None;
        }
        let count = self.size.min(self.end - self.next_start);
        let window = Window::new(self.next_start, count);
        self.next_start += count;
        Some(window)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining()) {
            Ok(remaining) => (remaining, Some(remaining)),
            Err(_) => (usize::MAX, None),
        }
    }
}

impl Display for Window {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.start, self.end())
    }
}

/// Range that never produced data, with the request needed to retry it by
/// hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedRange {
    pub start: u64,
    pub count: u64,
    pub refetch_url: String,
}

/// Sorts windows and merges the ones that touch or overlap.
pub fn coalesce(mut windows: Vec<Window>) -> Vec<Window> {
    windows.sort();
    let mut merged: Vec<Window> = Vec::with_capacity(windows.len());
    for window in windows {
        if window.count == 0 {
            continue;
        }
        match merged.last_mut() {
            Some(last) if window.start <= last.end() => {
                let end = last.end().max(window.end());
                last.count = end - last.start;
            }
            _ => merged.push(window),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partition_truncates_last_window() {
        let windows: Vec<Window> = Window::partition(5_000, 2_000).collect();
        assert_eq!(
            windows,
            vec![
                Window::new(0, 2_000),
                Window::new(2_000, 2_000),
                Window::new(4_000, 1_000),
            ]
        );
    }

    #[test]
    fn partition_of_zero_is_empty() {
        assert_eq!(Window::partition(0, 2_000).next(), None);
    }

    #[test]
    fn partition_of_huge_total_is_lazy() {
        let total = 1_000_000_000_000_000_000;
        let mut windows = Window::partition(total, 2_000);

        assert_eq!(windows.remaining(), 500_000_000_000_000);
        assert_eq!(windows.next(), Some(Window::new(0, 2_000)));
        assert_eq!(windows.next(), Some(Window::new(2_000, 2_000)));
        assert_eq!(windows.remaining(), 499_999_999_999_998);
    }

    #[test]
    fn split_keeps_offsets_contiguous() {
        let pieces = Window::new(2_000, 2_000).split(200);
        assert_eq!(pieces.len(), 10);
        assert_eq!(pieces[0], Window::new(2_000, 200));
        assert_eq!(pieces[9], Window::new(3_800, 200));
        assert!(pieces.windows(2).all(|pair| pair[0].end() == pair[1].start));
    }

    #[test]
    fn coalesce_merges_adjacent_singletons() {
        let singles: Vec<Window> = (4_000..4_010).rev().map(|s| Window::new(s, 1)).collect();
        assert_eq!(coalesce(singles), vec![Window::new(4_000, 10)]);
    }

    #[test]
    fn coalesce_keeps_gaps_apart() {
        let merged = coalesce(vec![
            Window::new(5, 5),
            Window::new(0, 5),
            Window::new(20, 5),
        ]);
        assert_eq!(merged, vec![Window::new(0, 10), Window::new(20, 5)]);
    }

    #[test]
    fn display_shows_half_open_range() {
        assert_eq!(Window::new(2_000, 200).to_string(), "2000-2200");
    }
}
