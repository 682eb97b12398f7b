use serde::Serialize;

use super::cell::{Attributes, Protection};

/// Cursor shape for rendering, selected via DECSCUSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorShape {
    #[default]
    Block,
    Underline,
    Bar,
}

/// Full cursor state: position, pending wrap, current rendition, and the
/// DECSC save slot.
#[derive(Debug, Clone)]
pub struct CursorState {
    pub row: u16,
    pub col: u16,
    /// True iff the last glyph landed in the rightmost column and the next
    /// glyph must wrap before being written (DECAWM).
    pub pending_wrap: bool,
    pub attrs: Attributes,
    pub protect: Protection,
    pub shape: CursorShape,
    saved: Option<SavedCursor>,
}

#[derive(Debug, Clone)]
struct SavedCursor {
    row: u16,
    col: u16,
    attrs: Attributes,
    protect: Protection,
    origin_mode: bool,
    charset_drawing: bool,
}

impl Default for CursorState {
    fn default() -> Self {
        Self {
            row: 0,
            col: 0,
            pending_wrap: false,
            attrs: Attributes::default(),
            protect: Protection::Unset,
            shape: CursorShape::Block,
            saved: None,
        }
    }
}

impl CursorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// DECSC: save position, rendition, protection, origin mode, and the
    /// selected character set.
    pub fn save(&mut self, origin_mode: bool, charset_drawing: bool) {
        self.saved = Some(SavedCursor {
            row: self.row,
            col: self.col,
            attrs: self.attrs,
            protect: self.protect,
            origin_mode,
            charset_drawing,
        });
    }

    /// DECRC: restore the saved state. Returns the saved
    /// `(origin_mode, charset_drawing)` pair for the caller to re-apply.
    /// No-op when nothing was saved.
    pub fn restore(&mut self) -> Option<(bool, bool)> {
        let saved = self.saved.take()?;
        self.row = saved.row;
        self.col = saved.col;
        self.attrs = saved.attrs;
        self.protect = saved.protect;
        self.pending_wrap = false;
        // Keep the slot so repeated DECRC restores the same point.
        let out = (saved.origin_mode, saved.charset_drawing);
        self.saved = Some(saved);
        Some(out)
    }

    /// Drop the save slot (soft reset).
    pub fn clear_saved(&mut self) {
        self.saved = None;
    }
}
