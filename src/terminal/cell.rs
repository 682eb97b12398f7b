use bitflags::bitflags;

use super::color::Color;

bitflags! {
    /// Cell text attributes as a compact bitflag set.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct AttrFlags: u16 {
        const BOLD          = 1 << 0;
        const FAINT         = 1 << 1;
        const ITALIC        = 1 << 2;
        const BLINK         = 1 << 3;
        const RAPID_BLINK   = 1 << 4;
        const INVERSE       = 1 << 5;
        const HIDDEN        = 1 << 6;
        const STRIKETHROUGH = 1 << 7;
    }
}

bitflags! {
    /// Per-cell flags for wide character tracking.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
    pub struct CellFlags: u8 {
        /// This cell holds a wide (2-column) character
        const WIDE        = 1 << 0;
        /// This cell is the trailing spacer of a wide character
        const WIDE_SPACER = 1 << 1;
    }
}

/// Underline rendition selected via SGR 4 / 4:n / 21.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum UnderlineStyle {
    #[default]
    None,
    Single,
    Double,
    Curly,
    Dotted,
    Dashed,
}

/// Character protection state set via DECSCA (CSI Ps " q).
///
/// Selective erase (DECSED/DECSEL) skips `Protected` cells. Non-selective
/// erase resets the state to `Unset` unconditionally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub enum Protection {
    #[default]
    Unset,
    Protected,
    /// Explicitly marked erasable with DECSCA 0 or 2.
    Unprotected,
}

impl Protection {
    pub fn is_protected(self) -> bool {
        matches!(self, Protection::Protected)
    }
}

/// The style pack carried by each cell and by the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attributes {
    pub fg: Color,
    pub bg: Color,
    pub underline_color: Color,
    pub underline: UnderlineStyle,
    pub flags: AttrFlags,
    /// Hyperlink id attached by OSC 8, if any.
    pub hyperlink: Option<u32>,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            fg: Color::Default,
            bg: Color::Default,
            underline_color: Color::Default,
            underline: UnderlineStyle::None,
            flags: AttrFlags::empty(),
            hyperlink: None,
        }
    }
}

impl Attributes {
    /// Reset to the default rendition (SGR 0).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// A single terminal cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub attrs: Attributes,
    pub flags: CellFlags,
    pub protect: Protection,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            attrs: Attributes::default(),
            flags: CellFlags::empty(),
            protect: Protection::Unset,
        }
    }
}

impl Cell {
    /// Create a spacer cell for the trailing half of a wide character.
    /// It carries the same attributes as the leading cell.
    pub fn wide_spacer(attrs: Attributes, protect: Protection) -> Self {
        Self {
            ch: ' ',
            attrs,
            flags: CellFlags::WIDE_SPACER,
            protect,
        }
    }

    /// Erase the cell using the cursor's current background color (per
    /// ECMA-48): space glyph, default foreground, protection cleared.
    pub fn erase(&mut self, bg: Color) {
        self.ch = ' ';
        self.attrs = Attributes {
            bg,
            ..Attributes::default()
        };
        self.flags = CellFlags::empty();
        self.protect = Protection::Unset;
    }

    /// Erase the cell but leave the DECSCA protection state alone.
    /// Used by selective erase for cells it is allowed to touch.
    pub fn erase_selective(&mut self, bg: Color) {
        let protect = self.protect;
        self.erase(bg);
        self.protect = protect;
    }

    pub fn is_wide(&self) -> bool {
        self.flags.contains(CellFlags::WIDE)
    }

    pub fn is_wide_spacer(&self) -> bool {
        self.flags.contains(CellFlags::WIDE_SPACER)
    }

    /// Whether the cell is a blank with default rendition.
    pub fn is_blank(&self) -> bool {
        self.ch == ' ' && self.attrs == Attributes::default() && self.flags.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erase_clears_protection_and_keeps_bg() {
        let mut cell = Cell {
            ch: 'x',
            attrs: Attributes {
                fg: Color::indexed(1),
                flags: AttrFlags::BOLD,
                ..Attributes::default()
            },
            flags: CellFlags::WIDE,
            protect: Protection::Protected,
        };
        cell.erase(Color::indexed(4));
        assert_eq!(cell.ch, ' ');
        assert_eq!(cell.attrs.fg, Color::Default);
        assert_eq!(cell.attrs.bg, Color::indexed(4));
        assert_eq!(cell.protect, Protection::Unset);
        assert!(cell.flags.is_empty());
    }

    #[test]
    fn selective_erase_preserves_protection_state() {
        let mut cell = Cell {
            ch: 'x',
            protect: Protection::Unprotected,
            ..Cell::default()
        };
        cell.erase_selective(Color::Default);
        assert_eq!(cell.protect, Protection::Unprotected);
    }
}
