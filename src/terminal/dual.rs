use super::grid::ScreenBuffer;

/// Which of the two screen buffers is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveScreen {
    Primary,
    Alternate,
}

/// Primary and alternate screens with independent cursor and per-screen
/// mode snapshots. The alternate screen never feeds scrollback.
#[derive(Debug)]
pub struct DualScreen {
    primary: ScreenBuffer,
    alternate: ScreenBuffer,
    active: ActiveScreen,
}

impl DualScreen {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            primary: ScreenBuffer::new(cols, rows),
            alternate: ScreenBuffer::new(cols, rows),
            active: ActiveScreen::Primary,
        }
    }

    pub fn active(&self) -> &ScreenBuffer {
        match self.active {
            ActiveScreen::Primary => &self.primary,
            ActiveScreen::Alternate => &self.alternate,
        }
    }

    pub fn active_mut(&mut self) -> &mut ScreenBuffer {
        match self.active {
            ActiveScreen::Primary => &mut self.primary,
            ActiveScreen::Alternate => &mut self.alternate,
        }
    }

    pub fn primary(&self) -> &ScreenBuffer {
        &self.primary
    }

    pub fn primary_mut(&mut self) -> &mut ScreenBuffer {
        &mut self.primary
    }

    pub fn alternate_mut(&mut self) -> &mut ScreenBuffer {
        &mut self.alternate
    }

    pub fn is_alternate(&self) -> bool {
        self.active == ActiveScreen::Alternate
    }

    /// Enter the alternate screen (modes 47/1047/1049). `save_cursor`
    /// records a DECSC slot on the primary screen first; `clear` wipes the
    /// alternate buffer. No-op when already active.
    pub fn switch_to_alternate(&mut self, save_cursor: bool, clear: bool, charset_drawing: bool) {
        if self.is_alternate() {
            return;
        }
        if save_cursor {
            self.primary.save_cursor(charset_drawing);
        }
        // Cursor position carries across the switch.
        self.alternate.cursor.row = self.primary.cursor.row.min(self.alternate.rows() - 1);
        self.alternate.cursor.col = self.primary.cursor.col.min(self.alternate.cols() - 1);
        self.alternate.cursor.attrs = self.primary.cursor.attrs;
        self.alternate.cursor.pending_wrap = false;
        if clear {
            let saved_bg = self.alternate.cursor.attrs.bg;
            self.alternate.cursor.attrs.bg = Default::default();
            self.alternate.erase_in_display(2);
            self.alternate.cursor.attrs.bg = saved_bg;
        }
        self.alternate.mark_all_dirty();
        self.active = ActiveScreen::Alternate;
    }

    /// Return to the primary screen. `restore_cursor` replays the primary
    /// DECSC slot; the saved charset selection is returned for the engine.
    /// No-op when already primary.
    pub fn switch_to_primary(&mut self, restore_cursor: bool) -> Option<bool> {
        if !self.is_alternate() {
            return None;
        }
        self.active = ActiveScreen::Primary;
        self.primary.mark_all_dirty();
        if restore_cursor {
            self.primary.restore_cursor()
        } else {
            None
        }
    }

    pub fn resize(&mut self, cols: u16, rows: u16) -> Vec<super::grid::Line> {
        let retired = self.primary.resize(cols, rows);
        self.alternate.resize(cols, rows);
        retired
    }
}
