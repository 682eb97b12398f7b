//! Scrollback history: lines retired off the top of the primary screen.
//!
//! Retired lines are converted into immutable [`ScrollbackLine`]s at the
//! handoff; the store never aliases a live grid row.

use std::collections::VecDeque;

use super::cell::Cell;
use super::grid::{Line, ScreenBuffer};

/// A line retired from the primary screen. Immutable once stored.
#[derive(Debug, Clone)]
pub struct ScrollbackLine {
    cells: Vec<Cell>,
    continuation: bool,
}

impl ScrollbackLine {
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn continuation(&self) -> bool {
        self.continuation
    }

    /// Text content with wide spacers skipped and trailing blanks trimmed.
    pub fn text(&self) -> String {
        let s: String = self
            .cells
            .iter()
            .filter(|c| !c.is_wide_spacer())
            .map(|c| c.ch)
            .collect();
        s.trim_end().to_string()
    }
}

impl From<Line> for ScrollbackLine {
    fn from(line: Line) -> Self {
        Self {
            cells: line.cells,
            continuation: line.continuation,
        }
    }
}

/// One row of a composed viewport: either a scrollback line or a snapshot
/// of a live screen row.
#[derive(Debug, Clone)]
pub struct ViewportRow {
    pub cells: Vec<Cell>,
    pub continuation: bool,
}

/// Bounded FIFO of retired lines. Append-only; exceeding capacity evicts
/// the oldest line.
#[derive(Debug)]
pub struct ScrollbackStore {
    lines: VecDeque<ScrollbackLine>,
    capacity: usize,
}

impl ScrollbackStore {
    /// A capacity of 0 disables scrollback entirely.
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Append a retired line, evicting the oldest when at capacity.
    pub fn push(&mut self, line: Line) {
        if self.capacity == 0 {
            return;
        }
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// Line by index, 0 = oldest.
    pub fn get(&self, index: usize) -> Option<&ScrollbackLine> {
        self.lines.get(index)
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Compose a viewport of `height` rows with `offset` lines of history
    /// above the live screen top: the last `min(offset, len)` stored lines
    /// followed by rows of the live screen, blank-padded past its bottom.
    pub fn view(&self, screen: &ScreenBuffer, height: u16, offset: usize) -> Vec<ViewportRow> {
        let height = height as usize;
        let from_store = offset.min(self.lines.len()).min(height);
        let mut out = Vec::with_capacity(height);

        let start = self.lines.len() - from_store;
        for line in self.lines.iter().skip(start) {
            out.push(ViewportRow {
                cells: line.cells.clone(),
                continuation: line.continuation,
            });
        }
        for row in 0..height - from_store {
            if row < screen.rows() as usize {
                let line = screen.line(row as u16);
                out.push(ViewportRow {
                    cells: line.cells.clone(),
                    continuation: line.continuation,
                });
            } else {
                out.push(ViewportRow {
                    cells: vec![Cell::default(); screen.cols() as usize],
                    continuation: false,
                });
            }
        }
        out
    }
}
