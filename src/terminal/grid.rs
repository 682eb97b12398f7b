use super::cell::{Attributes, Cell, CellFlags, Protection};
use super::color::Color;
use super::cursor::CursorState;

/// A single row of the live screen.
#[derive(Debug, Clone)]
pub struct Line {
    pub cells: Vec<Cell>,
    /// True when this line is a soft-wrap continuation of the previous line.
    pub continuation: bool,
    pub dirty: bool,
}

impl Line {
    pub fn new(cols: u16) -> Self {
        Self {
            cells: vec![Cell::default(); cols as usize],
            continuation: false,
            dirty: true,
        }
    }

    /// A blank line filled with the given background color.
    pub fn with_bg(cols: u16, bg: Color) -> Self {
        let mut line = Self::new(cols);
        for cell in &mut line.cells {
            cell.erase(bg);
        }
        line
    }

    /// Erase every cell using the given background color.
    pub fn erase_with_bg(&mut self, bg: Color) {
        for cell in &mut self.cells {
            cell.erase(bg);
        }
        self.continuation = false;
        self.dirty = true;
    }

    pub fn resize(&mut self, cols: u16) {
        let new_len = cols as usize;
        if self.cells.len() != new_len {
            self.cells.resize(new_len, Cell::default());
            // A wide cell whose spacer was truncated cannot stand alone.
            if let Some(last) = self.cells.last_mut() {
                if last.is_wide() {
                    *last = Cell::default();
                }
            }
            self.dirty = true;
        }
    }

    /// Whether every cell is a default blank.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_blank())
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

/// A rectangular grid of styled cells with cursor, tab stops, scroll region,
/// and wrap state. Holds no scrollback; lines scrolled off the top of a
/// full-screen region are returned to the caller.
#[derive(Debug, Clone)]
pub struct ScreenBuffer {
    cols: u16,
    rows: u16,
    grid: Vec<Line>,
    pub cursor: CursorState,
    tab_stops: Vec<bool>,
    scroll_top: u16,
    scroll_bottom: u16,
    origin_mode: bool,
    auto_wrap: bool,
}

impl ScreenBuffer {
    pub fn new(cols: u16, rows: u16) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        Self {
            cols,
            rows,
            grid: (0..rows).map(|_| Line::new(cols)).collect(),
            cursor: CursorState::new(),
            tab_stops: default_tab_stops(cols),
            scroll_top: 0,
            scroll_bottom: rows - 1,
            origin_mode: false,
            auto_wrap: true,
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn line(&self, row: u16) -> &Line {
        &self.grid[row as usize]
    }

    pub fn lines(&self) -> &[Line] {
        &self.grid
    }

    /// Scroll region as a 0-indexed inclusive `(top, bottom)` pair.
    pub fn scroll_region(&self) -> (u16, u16) {
        (self.scroll_top, self.scroll_bottom)
    }

    pub fn origin_mode(&self) -> bool {
        self.origin_mode
    }

    /// DECOM toggle homes the cursor.
    pub fn set_origin_mode(&mut self, enable: bool) {
        self.origin_mode = enable;
        self.cursor.row = if enable { self.scroll_top } else { 0 };
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
    }

    pub fn auto_wrap(&self) -> bool {
        self.auto_wrap
    }

    pub fn set_auto_wrap(&mut self, enable: bool) {
        self.auto_wrap = enable;
        if !enable {
            self.cursor.pending_wrap = false;
        }
    }

    // ── Printing ────────────────────────────────────────────────────

    /// Write a glyph of the given width class at the cursor using the
    /// cursor's current rendition, honoring pending wrap, auto-wrap, and
    /// insert mode. Returns lines retired off the top of a full-screen
    /// scroll region.
    pub fn put_char(&mut self, ch: char, width: u16, insert_mode: bool) -> Vec<Line> {
        let mut retired = Vec::new();
        let mut ch = ch;
        let mut width = width.clamp(1, 2);

        if self.cursor.pending_wrap && self.auto_wrap {
            self.wrap_line(&mut retired);
        }

        if width == 2 {
            if self.cols < 2 {
                ch = char::REPLACEMENT_CHARACTER;
                width = 1;
            } else if self.cursor.col + 1 >= self.cols {
                if self.auto_wrap {
                    self.wrap_line(&mut retired);
                } else {
                    ch = char::REPLACEMENT_CHARACTER;
                    width = 1;
                }
            }
        }

        if insert_mode {
            self.insert_chars(width);
        }

        let row = self.cursor.row;
        let col = self.cursor.col;
        self.clear_wide_pair_at(row, col);
        if width == 2 {
            self.clear_wide_pair_at(row, col + 1);
        }

        let attrs = self.cursor.attrs;
        let protect = self.cursor.protect;
        let line = &mut self.grid[row as usize];
        line.cells[col as usize] = Cell {
            ch,
            attrs,
            flags: if width == 2 {
                CellFlags::WIDE
            } else {
                CellFlags::empty()
            },
            protect,
        };
        if width == 2 {
            line.cells[col as usize + 1] = Cell::wide_spacer(attrs, protect);
        }
        line.dirty = true;

        let new_col = col.saturating_add(width);
        if new_col < self.cols {
            self.cursor.col = new_col;
            self.cursor.pending_wrap = false;
        } else if self.auto_wrap {
            self.cursor.pending_wrap = true;
        }
        retired
    }

    fn wrap_line(&mut self, retired: &mut Vec<Line>) {
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
        retired.extend(self.index());
        self.grid[self.cursor.row as usize].continuation = true;
    }

    /// If the cell at (row, col) is half of a wide pair, blank both halves.
    fn clear_wide_pair_at(&mut self, row: u16, col: u16) {
        let line = &mut self.grid[row as usize];
        let col = col as usize;
        if col >= line.cells.len() {
            return;
        }
        if line.cells[col].is_wide() && col + 1 < line.cells.len() {
            line.cells[col] = Cell::default();
            line.cells[col + 1] = Cell::default();
            line.dirty = true;
        } else if line.cells[col].is_wide_spacer() && col > 0 {
            line.cells[col - 1] = Cell::default();
            line.cells[col] = Cell::default();
            line.dirty = true;
        }
    }

    // ── Cursor movement ─────────────────────────────────────────────

    pub fn carriage_return(&mut self) {
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
    }

    pub fn backspace(&mut self) {
        if self.cursor.col > 0 {
            self.cursor.col -= 1;
        }
        self.cursor.pending_wrap = false;
    }

    /// Move cursor down one line; at the bottom of the scroll region the
    /// region scrolls up instead. Returns retired lines (full-screen region
    /// only).
    pub fn index(&mut self) -> Vec<Line> {
        self.cursor.pending_wrap = false;
        if self.cursor.row == self.scroll_bottom {
            self.scroll_up(1)
        } else {
            if self.cursor.row + 1 < self.rows {
                self.cursor.row += 1;
            }
            Vec::new()
        }
    }

    /// Move cursor up one line; at the top of the scroll region the region
    /// scrolls down instead.
    pub fn reverse_index(&mut self) {
        self.cursor.pending_wrap = false;
        if self.cursor.row == self.scroll_top {
            self.scroll_down(1);
        } else if self.cursor.row > 0 {
            self.cursor.row -= 1;
        }
    }

    /// Carriage return plus index.
    pub fn next_line(&mut self) -> Vec<Line> {
        self.carriage_return();
        self.index()
    }

    pub fn cursor_up(&mut self, n: u16) {
        let min_row = if self.cursor_in_region() {
            self.scroll_top
        } else {
            0
        };
        self.cursor.row = self.cursor.row.saturating_sub(n.max(1)).max(min_row);
        self.cursor.pending_wrap = false;
    }

    pub fn cursor_down(&mut self, n: u16) {
        let max_row = if self.cursor_in_region() {
            self.scroll_bottom
        } else {
            self.rows - 1
        };
        self.cursor.row = self.cursor.row.saturating_add(n.max(1)).min(max_row);
        self.cursor.pending_wrap = false;
    }

    pub fn cursor_forward(&mut self, n: u16) {
        self.cursor.col = self.cursor.col.saturating_add(n.max(1)).min(self.cols - 1);
        self.cursor.pending_wrap = false;
    }

    pub fn cursor_backward(&mut self, n: u16) {
        self.cursor.col = self.cursor.col.saturating_sub(n.max(1));
        self.cursor.pending_wrap = false;
    }

    /// CHA: move to a 1-indexed column.
    pub fn cursor_to_col(&mut self, col1: u16) {
        self.cursor.col = col1.saturating_sub(1).min(self.cols - 1);
        self.cursor.pending_wrap = false;
    }

    /// VPA: move to a 1-indexed row, honoring origin mode.
    pub fn cursor_to_row(&mut self, row1: u16) {
        let row = row1.saturating_sub(1);
        self.cursor.row = if self.origin_mode {
            self.scroll_top.saturating_add(row).min(self.scroll_bottom)
        } else {
            row.min(self.rows - 1)
        };
        self.cursor.pending_wrap = false;
    }

    /// CUP/HVP: move to a 1-indexed position, honoring origin mode.
    pub fn cursor_position(&mut self, row1: u16, col1: u16) {
        self.cursor_to_row(row1);
        self.cursor_to_col(col1);
    }

    fn cursor_in_region(&self) -> bool {
        self.cursor.row >= self.scroll_top && self.cursor.row <= self.scroll_bottom
    }

    // ── Erasing ─────────────────────────────────────────────────────

    /// ED: 0 = cursor to end, 1 = start to cursor, 2 and 3 = whole screen.
    /// Scrollback handling for mode 3 belongs to the owning engine.
    pub fn erase_in_display(&mut self, mode: u16) {
        let bg = self.cursor.attrs.bg;
        let (row, col) = (self.cursor.row, self.cursor.col);
        match mode {
            0 => {
                self.erase_cells(row, col, self.cols, bg);
                for r in (row + 1)..self.rows {
                    self.grid[r as usize].erase_with_bg(bg);
                }
            }
            1 => {
                for r in 0..row {
                    self.grid[r as usize].erase_with_bg(bg);
                }
                self.erase_cells(row, 0, col + 1, bg);
            }
            2 | 3 => {
                for r in 0..self.rows {
                    self.grid[r as usize].erase_with_bg(bg);
                }
            }
            _ => {}
        }
    }

    /// EL: 0 = cursor to end of line, 1 = start to cursor, 2 = whole line.
    pub fn erase_in_line(&mut self, mode: u16) {
        let bg = self.cursor.attrs.bg;
        let (row, col) = (self.cursor.row, self.cursor.col);
        match mode {
            0 => self.erase_cells(row, col, self.cols, bg),
            1 => self.erase_cells(row, 0, col + 1, bg),
            2 => self.grid[row as usize].erase_with_bg(bg),
            _ => {}
        }
    }

    /// DECSED: like ED but skips cells protected by DECSCA.
    pub fn selective_erase_in_display(&mut self, mode: u16) {
        let (row, col) = (self.cursor.row, self.cursor.col);
        match mode {
            0 => {
                self.selective_erase_cells(row, col, self.cols);
                for r in (row + 1)..self.rows {
                    self.selective_erase_cells(r, 0, self.cols);
                }
            }
            1 => {
                for r in 0..row {
                    self.selective_erase_cells(r, 0, self.cols);
                }
                self.selective_erase_cells(row, 0, col + 1);
            }
            2 => {
                for r in 0..self.rows {
                    self.selective_erase_cells(r, 0, self.cols);
                }
            }
            _ => {}
        }
    }

    /// DECSEL: like EL but skips cells protected by DECSCA.
    pub fn selective_erase_in_line(&mut self, mode: u16) {
        let (row, col) = (self.cursor.row, self.cursor.col);
        match mode {
            0 => self.selective_erase_cells(row, col, self.cols),
            1 => self.selective_erase_cells(row, 0, col + 1),
            2 => self.selective_erase_cells(row, 0, self.cols),
            _ => {}
        }
    }

    /// ECH: erase n cells at the cursor without moving it.
    pub fn erase_chars(&mut self, n: u16) {
        let bg = self.cursor.attrs.bg;
        let end = self.cursor.col.saturating_add(n.max(1)).min(self.cols);
        self.erase_cells(self.cursor.row, self.cursor.col, end, bg);
    }

    /// Erase `[start_col, end_col)` of a row, widening the range so a wide
    /// pair is never split.
    fn erase_cells(&mut self, row: u16, start_col: u16, end_col: u16, bg: Color) {
        let (start, end) = self.widen_to_pairs(row, start_col, end_col);
        let line = &mut self.grid[row as usize];
        for i in start..end {
            line.cells[i].erase(bg);
        }
        line.dirty = true;
    }

    fn selective_erase_cells(&mut self, row: u16, start_col: u16, end_col: u16) {
        let bg = self.cursor.attrs.bg;
        let (start, end) = self.widen_to_pairs(row, start_col, end_col);
        let line = &mut self.grid[row as usize];
        for i in start..end {
            if !line.cells[i].protect.is_protected() {
                line.cells[i].erase_selective(bg);
            }
        }
        line.dirty = true;
    }

    fn widen_to_pairs(&self, row: u16, start_col: u16, end_col: u16) -> (usize, usize) {
        let line = &self.grid[row as usize];
        let mut start = start_col as usize;
        let mut end = (end_col as usize).min(line.cells.len());
        if start > 0 && start < line.cells.len() && line.cells[start].is_wide_spacer() {
            start -= 1;
        }
        if end < line.cells.len() && line.cells[end].is_wide_spacer() {
            end += 1;
        }
        (start, end)
    }

    // ── Line and character shifting ─────────────────────────────────

    /// IL: insert blank lines at the cursor, within the scroll region.
    pub fn insert_lines(&mut self, n: u16) {
        if !self.cursor_in_region() {
            return;
        }
        let bg = self.cursor.attrs.bg;
        let row = self.cursor.row as usize;
        let bottom = self.scroll_bottom as usize;
        let n = (n.max(1) as usize).min(bottom - row + 1);
        for _ in 0..n {
            self.grid.remove(bottom);
            self.grid.insert(row, Line::with_bg(self.cols, bg));
        }
        self.mark_rows_dirty(self.cursor.row, self.scroll_bottom);
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
    }

    /// DL: delete lines at the cursor, within the scroll region.
    pub fn delete_lines(&mut self, n: u16) {
        if !self.cursor_in_region() {
            return;
        }
        let bg = self.cursor.attrs.bg;
        let row = self.cursor.row as usize;
        let bottom = self.scroll_bottom as usize;
        let n = (n.max(1) as usize).min(bottom - row + 1);
        for _ in 0..n {
            self.grid.remove(row);
            self.grid.insert(bottom, Line::with_bg(self.cols, bg));
        }
        self.mark_rows_dirty(self.cursor.row, self.scroll_bottom);
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
    }

    /// ICH: insert blank cells at the cursor, shifting the rest of the line
    /// right. Cells pushed past the right edge are dropped.
    pub fn insert_chars(&mut self, n: u16) {
        let row = self.cursor.row;
        let col = self.cursor.col;
        self.clear_wide_pair_at(row, col);
        let bg = self.cursor.attrs.bg;
        let line = &mut self.grid[row as usize];
        let col = col as usize;
        let n = (n.max(1) as usize).min(line.cells.len() - col);
        for _ in 0..n {
            line.cells.pop();
            let mut blank = Cell::default();
            blank.erase(bg);
            line.cells.insert(col, blank);
        }
        // A wide cell shifted into the last column loses its spacer.
        if let Some(last) = line.cells.last_mut() {
            if last.is_wide() {
                *last = Cell::default();
            }
        }
        line.dirty = true;
    }

    /// DCH: delete cells at the cursor, shifting the rest of the line left.
    pub fn delete_chars(&mut self, n: u16) {
        let row = self.cursor.row;
        let col = self.cursor.col;
        self.clear_wide_pair_at(row, col);
        let bg = self.cursor.attrs.bg;
        let col = col as usize;
        let n = {
            let line = &self.grid[row as usize];
            (n.max(1) as usize).min(line.cells.len() - col)
        };
        // The cell just past the deleted range may be a spacer whose leading
        // half is being removed.
        self.clear_wide_pair_at(row, (col + n) as u16);
        let line = &mut self.grid[row as usize];
        for _ in 0..n {
            line.cells.remove(col);
            let mut blank = Cell::default();
            blank.erase(bg);
            line.cells.push(blank);
        }
        line.dirty = true;
    }

    // ── Scrolling ───────────────────────────────────────────────────

    /// SU: scroll the region up by n lines. Lines scrolled off the top of a
    /// full-screen region are returned for scrollback handling.
    pub fn scroll_up(&mut self, n: u16) -> Vec<Line> {
        let bg = self.cursor.attrs.bg;
        let top = self.scroll_top as usize;
        let bottom = self.scroll_bottom as usize;
        let full_screen = self.scroll_top == 0 && self.scroll_bottom == self.rows - 1;
        let n = (n.max(1) as usize).min(bottom - top + 1);

        let mut retired = Vec::new();
        for _ in 0..n {
            let line = self.grid.remove(top);
            if full_screen {
                retired.push(line);
            }
            self.grid.insert(bottom, Line::with_bg(self.cols, bg));
        }
        self.mark_rows_dirty(self.scroll_top, self.scroll_bottom);
        retired
    }

    /// SD: scroll the region down by n lines. The bottom lines are dropped.
    pub fn scroll_down(&mut self, n: u16) {
        let bg = self.cursor.attrs.bg;
        let top = self.scroll_top as usize;
        let bottom = self.scroll_bottom as usize;
        let n = (n.max(1) as usize).min(bottom - top + 1);
        for _ in 0..n {
            self.grid.remove(bottom);
            self.grid.insert(top, Line::with_bg(self.cols, bg));
        }
        self.mark_rows_dirty(self.scroll_top, self.scroll_bottom);
    }

    /// DECSTBM: set the scroll region from 1-indexed inclusive margins and
    /// home the cursor. Invalid margins reset to the full screen.
    pub fn set_scroll_region(&mut self, top1: u16, bottom1: u16) {
        let top = top1.max(1);
        let bottom = bottom1.min(self.rows);
        if top < bottom {
            self.scroll_top = top - 1;
            self.scroll_bottom = bottom - 1;
        } else {
            self.scroll_top = 0;
            self.scroll_bottom = self.rows - 1;
        }
        self.cursor.row = if self.origin_mode { self.scroll_top } else { 0 };
        self.cursor.col = 0;
        self.cursor.pending_wrap = false;
    }

    pub fn reset_scroll_region(&mut self) {
        self.scroll_top = 0;
        self.scroll_bottom = self.rows - 1;
    }

    // ── Tab stops ───────────────────────────────────────────────────

    /// HTS: set a tab stop at the cursor column.
    pub fn set_tab_stop(&mut self) {
        let col = self.cursor.col as usize;
        if col < self.tab_stops.len() {
            self.tab_stops[col] = true;
        }
    }

    pub fn clear_tab_stop(&mut self, col: u16) {
        if let Some(stop) = self.tab_stops.get_mut(col as usize) {
            *stop = false;
        }
    }

    pub fn clear_all_tab_stops(&mut self) {
        self.tab_stops.iter_mut().for_each(|s| *s = false);
    }

    /// HT/CHT: advance to the nth next tab stop (or the last column).
    pub fn tab_forward(&mut self, n: u16) {
        let mut remaining = n.max(1);
        let mut col = self.cursor.col as usize;
        while remaining > 0 {
            match (col + 1..self.cols as usize).find(|&i| self.tab_stops[i]) {
                Some(next) => col = next,
                None => {
                    col = self.cols as usize - 1;
                    break;
                }
            }
            remaining -= 1;
        }
        self.cursor.col = col as u16;
        self.cursor.pending_wrap = false;
    }

    /// CBT: move back to the nth previous tab stop (or column 0).
    pub fn tab_backward(&mut self, n: u16) {
        let mut remaining = n.max(1);
        let mut col = self.cursor.col as usize;
        while remaining > 0 {
            match (0..col).rev().find(|&i| self.tab_stops[i]) {
                Some(prev) => col = prev,
                None => {
                    col = 0;
                    break;
                }
            }
            remaining -= 1;
        }
        self.cursor.col = col as u16;
        self.cursor.pending_wrap = false;
    }

    // ── Save / restore (DECSC / DECRC) ──────────────────────────────

    pub fn save_cursor(&mut self, charset_drawing: bool) {
        let origin = self.origin_mode;
        self.cursor.save(origin, charset_drawing);
    }

    /// Restore the DECSC slot. Returns the saved charset selection for the
    /// engine to re-apply. No-op when nothing was saved.
    pub fn restore_cursor(&mut self) -> Option<bool> {
        let (origin, charset) = self.cursor.restore()?;
        self.origin_mode = origin;
        self.clamp_cursor();
        Some(charset)
    }

    /// DECSTR's per-screen portion: origin absolute, auto-wrap off (per the
    /// DEC list), margins reset, rendition and protection defaulted, save
    /// slot dropped. Content and cursor position are untouched.
    pub fn soft_reset(&mut self) {
        self.origin_mode = false;
        self.auto_wrap = false;
        self.reset_scroll_region();
        self.cursor.attrs = Attributes::default();
        self.cursor.protect = Protection::Unset;
        self.cursor.pending_wrap = false;
        self.cursor.clear_saved();
    }

    // ── Resize ──────────────────────────────────────────────────────

    /// Resize to new dimensions. Column changes pad or truncate each line;
    /// row shrink prefers dropping blank bottom rows, then retires top rows,
    /// which are returned for scrollback handling on the primary screen.
    pub fn resize(&mut self, cols: u16, rows: u16) -> Vec<Line> {
        let cols = cols.max(1);
        let rows = rows.max(1);

        for line in &mut self.grid {
            line.resize(cols);
        }
        if cols != self.cols {
            let old_stops = std::mem::take(&mut self.tab_stops);
            let mut stops = default_tab_stops(cols);
            for (i, stop) in old_stops.into_iter().enumerate().take(cols as usize) {
                stops[i] = stop;
            }
            self.tab_stops = stops;
        }
        self.cols = cols;
        self.cursor.pending_wrap = false;

        let mut retired = Vec::new();
        let current = self.grid.len() as u16;
        if rows > current {
            for _ in current..rows {
                self.grid.push(Line::new(cols));
            }
        } else if rows < current {
            let mut excess = current - rows;
            // Drop fully blank rows from the bottom while the cursor is not
            // on them.
            while excess > 0
                && self.cursor.row + 1 < self.grid.len() as u16
                && self.grid.last().map_or(false, Line::is_blank)
            {
                self.grid.pop();
                excess -= 1;
            }
            // Retire top rows as needed.
            for _ in 0..excess {
                retired.push(self.grid.remove(0));
                self.cursor.row = self.cursor.row.saturating_sub(1);
            }
        }
        self.rows = rows;
        self.scroll_bottom = self.scroll_bottom.min(rows - 1);
        if self.scroll_top >= self.scroll_bottom {
            self.scroll_top = 0;
            self.scroll_bottom = rows - 1;
        }
        self.clamp_cursor();
        self.mark_all_dirty();
        retired
    }

    /// Pull the cursor back into its addressable area: the scroll region
    /// when origin mode is set, the full screen otherwise. The region must
    /// already be clamped to the current dimensions.
    fn clamp_cursor(&mut self) {
        self.cursor.row = if self.origin_mode {
            self.cursor.row.clamp(self.scroll_top, self.scroll_bottom)
        } else {
            self.cursor.row.min(self.rows - 1)
        };
        self.cursor.col = self.cursor.col.min(self.cols - 1);
    }

    // ── Dirty tracking ──────────────────────────────────────────────

    fn mark_rows_dirty(&mut self, first: u16, last: u16) {
        for r in first..=last.min(self.rows - 1) {
            self.grid[r as usize].dirty = true;
        }
    }

    pub fn mark_all_dirty(&mut self) {
        for line in &mut self.grid {
            line.dirty = true;
        }
    }

    /// Bounding row range of dirty lines, clearing the flags.
    pub fn take_dirty_bounds(&mut self) -> Option<(u16, u16)> {
        let mut bounds: Option<(u16, u16)> = None;
        for (i, line) in self.grid.iter_mut().enumerate() {
            if line.dirty {
                line.dirty = false;
                let row = i as u16;
                bounds = Some(match bounds {
                    Some((first, _)) => (first, row),
                    None => (row, row),
                });
            }
        }
        bounds
    }

    /// Set the DECSCA protection applied to subsequently written cells.
    pub fn set_protection(&mut self, protect: Protection) {
        self.cursor.protect = protect;
    }

    #[cfg(test)]
    pub fn row_text(&self, row: u16) -> String {
        self.grid[row as usize].text()
    }
}

fn default_tab_stops(cols: u16) -> Vec<bool> {
    (0..cols as usize).map(|i| i % 8 == 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn put_str(screen: &mut ScreenBuffer, s: &str) {
        for ch in s.chars() {
            screen.put_char(ch, 1, false);
        }
    }

    #[test]
    fn wrap_at_right_edge() {
        let mut screen = ScreenBuffer::new(80, 24);
        screen.cursor.col = 78;
        put_str(&mut screen, "Hi!");
        assert_eq!(screen.row_text(0), format!("{}Hi", " ".repeat(78)));
        assert_eq!(screen.row_text(1), "!");
        assert_eq!((screen.cursor.row, screen.cursor.col), (1, 1));
        assert!(!screen.cursor.pending_wrap);
        assert!(screen.line(1).continuation);
    }

    #[test]
    fn no_wrap_overwrites_last_column() {
        let mut screen = ScreenBuffer::new(4, 2);
        screen.set_auto_wrap(false);
        put_str(&mut screen, "abcdef");
        assert_eq!(screen.row_text(0), "abcf");
        assert_eq!(screen.cursor.row, 0);
        assert_eq!(screen.cursor.col, 3);
    }

    #[test]
    fn wide_char_occupies_pair() {
        let mut screen = ScreenBuffer::new(10, 2);
        screen.put_char('漢', 2, false);
        assert!(screen.line(0).cells[0].is_wide());
        assert!(screen.line(0).cells[1].is_wide_spacer());
        assert_eq!(screen.cursor.col, 2);
    }

    #[test]
    fn wide_char_last_column_no_wrap_becomes_replacement() {
        let mut screen = ScreenBuffer::new(4, 2);
        screen.set_auto_wrap(false);
        screen.cursor.col = 3;
        screen.put_char('漢', 2, false);
        assert_eq!(screen.line(0).cells[3].ch, char::REPLACEMENT_CHARACTER);
        assert!(!screen.line(0).cells[3].is_wide());
    }

    #[test]
    fn wide_char_last_column_wraps() {
        let mut screen = ScreenBuffer::new(4, 2);
        screen.cursor.col = 3;
        screen.put_char('漢', 2, false);
        assert_eq!(screen.cursor.row, 1);
        assert!(screen.line(1).cells[0].is_wide());
    }

    #[test]
    fn overwriting_half_of_wide_pair_clears_both() {
        let mut screen = ScreenBuffer::new(10, 2);
        screen.put_char('漢', 2, false);
        screen.cursor.col = 1;
        screen.put_char('x', 1, false);
        assert_eq!(screen.line(0).cells[0].ch, ' ');
        assert!(!screen.line(0).cells[0].is_wide());
        assert_eq!(screen.line(0).cells[1].ch, 'x');
    }

    #[test]
    fn erase_widens_over_wide_pair() {
        let mut screen = ScreenBuffer::new(10, 2);
        screen.put_char('漢', 2, false);
        screen.cursor.col = 1;
        screen.erase_chars(1);
        assert_eq!(screen.line(0).cells[0].ch, ' ');
        assert!(!screen.line(0).cells[0].is_wide());
        assert!(!screen.line(0).cells[1].is_wide_spacer());
    }

    #[test]
    fn scroll_up_full_screen_returns_top_line() {
        let mut screen = ScreenBuffer::new(4, 2);
        put_str(&mut screen, "AB");
        let retired = screen.scroll_up(1);
        assert_eq!(retired.len(), 1);
        assert_eq!(retired[0].text(), "AB");
        assert_eq!(screen.row_text(0), "");
    }

    #[test]
    fn scroll_up_inside_region_drops_lines() {
        let mut screen = ScreenBuffer::new(4, 4);
        for row in 0..4 {
            screen.cursor_position(row + 1, 1);
            put_str(&mut screen, &format!("L{row}"));
        }
        screen.set_scroll_region(2, 3);
        let retired = screen.scroll_up(1);
        assert!(retired.is_empty());
        assert_eq!(screen.row_text(0), "L0");
        assert_eq!(screen.row_text(1), "L2");
        assert_eq!(screen.row_text(2), "");
        assert_eq!(screen.row_text(3), "L3");
    }

    #[test]
    fn insert_delete_lines_respect_region() {
        let mut screen = ScreenBuffer::new(4, 4);
        for row in 0..4 {
            screen.cursor_position(row + 1, 1);
            put_str(&mut screen, &format!("L{row}"));
        }
        screen.set_scroll_region(1, 3);
        screen.cursor_position(2, 1);
        screen.insert_lines(1);
        assert_eq!(screen.row_text(0), "L0");
        assert_eq!(screen.row_text(1), "");
        assert_eq!(screen.row_text(2), "L1");
        assert_eq!(screen.row_text(3), "L3");

        screen.cursor_position(2, 1);
        screen.delete_lines(1);
        assert_eq!(screen.row_text(1), "L1");
        assert_eq!(screen.row_text(2), "");
        assert_eq!(screen.row_text(3), "L3");
    }

    #[test]
    fn insert_delete_chars() {
        let mut screen = ScreenBuffer::new(6, 1);
        put_str(&mut screen, "abcde");
        screen.cursor.col = 1;
        screen.insert_chars(2);
        assert_eq!(screen.row_text(0), "a  bcd");
        screen.delete_chars(2);
        assert_eq!(screen.row_text(0), "abcd");
    }

    #[test]
    fn selective_erase_skips_protected() {
        let mut screen = ScreenBuffer::new(6, 1);
        screen.set_protection(Protection::Protected);
        put_str(&mut screen, "ab");
        screen.set_protection(Protection::Unset);
        put_str(&mut screen, "cd");
        screen.cursor.col = 0;
        screen.selective_erase_in_line(2);
        assert_eq!(screen.row_text(0), "ab");

        screen.erase_in_line(2);
        assert_eq!(screen.row_text(0), "");
    }

    #[test]
    fn tab_stops_default_every_eight() {
        let mut screen = ScreenBuffer::new(24, 1);
        screen.tab_forward(1);
        assert_eq!(screen.cursor.col, 8);
        screen.tab_forward(1);
        assert_eq!(screen.cursor.col, 16);
        screen.tab_backward(2);
        assert_eq!(screen.cursor.col, 0);
    }

    #[test]
    fn tab_stop_set_and_clear() {
        let mut screen = ScreenBuffer::new(24, 1);
        screen.cursor.col = 3;
        screen.set_tab_stop();
        screen.cursor.col = 0;
        screen.tab_forward(1);
        assert_eq!(screen.cursor.col, 3);
        screen.clear_tab_stop(3);
        screen.cursor.col = 0;
        screen.tab_forward(1);
        assert_eq!(screen.cursor.col, 8);
    }

    #[test]
    fn origin_mode_addresses_relative_to_region() {
        let mut screen = ScreenBuffer::new(10, 10);
        screen.set_scroll_region(3, 8);
        screen.set_origin_mode(true);
        assert_eq!(screen.cursor.row, 2);
        screen.cursor_position(1, 1);
        assert_eq!(screen.cursor.row, 2);
        screen.cursor_position(99, 1);
        assert_eq!(screen.cursor.row, 7);
    }

    #[test]
    fn resize_grow_preserves_content() {
        let mut screen = ScreenBuffer::new(4, 2);
        put_str(&mut screen, "hi");
        let retired = screen.resize(8, 4);
        assert!(retired.is_empty());
        assert_eq!(screen.row_text(0), "hi");
        assert_eq!(screen.rows(), 4);
        assert_eq!(screen.cols(), 8);
    }

    #[test]
    fn resize_shrink_retires_top_rows_when_cursor_low() {
        let mut screen = ScreenBuffer::new(4, 3);
        for row in 0..3 {
            screen.cursor_position(row + 1, 1);
            put_str(&mut screen, &format!("L{row}"));
        }
        // Cursor sits on the bottom row; nothing blank below it to drop.
        let retired = screen.resize(4, 2);
        assert_eq!(retired.len(), 1);
        assert_eq!(retired[0].text(), "L0");
        assert_eq!(screen.row_text(0), "L1");
        assert_eq!(screen.cursor.row, 1);
    }

    #[test]
    fn resize_shrink_drops_blank_bottom_rows_first() {
        let mut screen = ScreenBuffer::new(4, 4);
        screen.cursor_position(1, 1);
        put_str(&mut screen, "top");
        screen.cursor_position(1, 1);
        let retired = screen.resize(4, 2);
        assert!(retired.is_empty());
        assert_eq!(screen.row_text(0), "top");
    }

    #[test]
    fn resize_clamps_scroll_region() {
        let mut screen = ScreenBuffer::new(10, 10);
        screen.set_scroll_region(5, 9);
        screen.resize(10, 4);
        assert_eq!(screen.scroll_region(), (0, 3));
    }

    #[test]
    fn resize_shrink_keeps_cursor_inside_region_with_origin_mode() {
        let mut screen = ScreenBuffer::new(10, 24);
        // Non-blank rows everywhere so the shrink cannot drop bottom rows
        // and must retire from the top.
        for row in 0..24 {
            screen.cursor_position(row + 1, 1);
            put_str(&mut screen, "x");
        }
        screen.set_scroll_region(5, 20);
        screen.set_origin_mode(true);
        screen.cursor_down(6);
        assert_eq!(screen.cursor.row, 10);

        let retired = screen.resize(10, 6);
        assert_eq!(retired.len(), 18);
        // The surviving region is 4..=5; the retirement pulled the cursor
        // row to 0, which must be clamped back up to the region top.
        assert_eq!(screen.scroll_region(), (4, 5));
        let (top, bottom) = screen.scroll_region();
        assert!(screen.cursor.row >= top && screen.cursor.row <= bottom);
    }

    #[test]
    fn region_scroll_fill_uses_current_bg() {
        let mut screen = ScreenBuffer::new(4, 2);
        screen.cursor.attrs.bg = Color::indexed(2);
        screen.scroll_up(1);
        assert_eq!(screen.line(1).cells[0].attrs.bg, Color::indexed(2));
    }
}
