//! CSI classifier: maps a raw `(private, params, intermediates, final)`
//! sequence to a typed command. Total: anything unknown becomes
//! [`CsiCommand::Unrecognized`].

use super::Params;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CsiCommand {
    CursorUp(u16),
    CursorDown(u16),
    CursorForward(u16),
    CursorBack(u16),
    CursorNextLine(u16),
    CursorPrevLine(u16),
    CursorColumn(u16),
    CursorRow(u16),
    CursorPosition { row: u16, col: u16 },
    EraseDisplay(u16),
    EraseLine(u16),
    SelectiveEraseDisplay(u16),
    SelectiveEraseLine(u16),
    EraseCharacter(u16),
    ScrollUp(u16),
    ScrollDown(u16),
    InsertLine(u16),
    DeleteLine(u16),
    InsertCharacter(u16),
    DeleteCharacter(u16),
    RepeatLast(u16),
    SetScrollRegion { top: u16, bottom: u16 },
    SetMode(Vec<u16>),
    ResetMode(Vec<u16>),
    SetPrivateMode(Vec<u16>),
    ResetPrivateMode(Vec<u16>),
    SavePrivateModes(Vec<u16>),
    RestorePrivateModes(Vec<u16>),
    ReportPrivateModes(Vec<u16>),
    ReportAnsiModes(Vec<u16>),
    DeviceAttributesPrimary,
    DeviceAttributesSecondary,
    DeviceStatus(u16),
    WindowManipulation(u16),
    TabForward(u16),
    TabBackward(u16),
    TabClear(u16),
    SoftReset,
    SaveCursor,
    RestoreCursor,
    CursorStyle(u16),
    /// SGR; the engine replays the raw parameters through the SGR
    /// classifier, which needs the sub-parameter structure.
    Sgr,
    CharacterProtection(u16),
    Unrecognized,
}

/// Classify a complete CSI sequence. `bottom_default` supplies the screen
/// height for an omitted DECSTBM bottom margin.
pub fn classify(
    private: Option<u8>,
    params: &Params,
    intermediates: &[u8],
    final_byte: u8,
    bottom_default: u16,
) -> CsiCommand {
    use CsiCommand::*;

    match (private, intermediates, final_byte) {
        (None, [], b'A') => CursorUp(params.get_nonzero_or(0, 1)),
        (None, [], b'B') => CursorDown(params.get_nonzero_or(0, 1)),
        (None, [], b'C') => CursorForward(params.get_nonzero_or(0, 1)),
        (None, [], b'D') => CursorBack(params.get_nonzero_or(0, 1)),
        (None, [], b'E') => CursorNextLine(params.get_nonzero_or(0, 1)),
        (None, [], b'F') => CursorPrevLine(params.get_nonzero_or(0, 1)),
        (None, [], b'G') => CursorColumn(params.get_nonzero_or(0, 1)),
        (None, [], b'd') => CursorRow(params.get_nonzero_or(0, 1)),
        (None, [], b'H' | b'f') => CursorPosition {
            row: params.get_nonzero_or(0, 1),
            col: params.get_nonzero_or(1, 1),
        },
        (None, [], b'J') => EraseDisplay(params.get_or(0, 0)),
        (None, [], b'K') => EraseLine(params.get_or(0, 0)),
        (Some(b'?'), [], b'J') => SelectiveEraseDisplay(params.get_or(0, 0)),
        (Some(b'?'), [], b'K') => SelectiveEraseLine(params.get_or(0, 0)),
        (None, [], b'X') => EraseCharacter(params.get_nonzero_or(0, 1)),
        (None, [], b'S') => ScrollUp(params.get_nonzero_or(0, 1)),
        (None, [], b'T') => ScrollDown(params.get_nonzero_or(0, 1)),
        (None, [], b'L') => InsertLine(params.get_nonzero_or(0, 1)),
        (None, [], b'M') => DeleteLine(params.get_nonzero_or(0, 1)),
        (None, [], b'@') => InsertCharacter(params.get_nonzero_or(0, 1)),
        (None, [], b'P') => DeleteCharacter(params.get_nonzero_or(0, 1)),
        (None, [], b'b') => RepeatLast(params.get_nonzero_or(0, 1)),
        (None, [], b'r') => SetScrollRegion {
            top: params.get_nonzero_or(0, 1),
            bottom: params.get_nonzero_or(1, bottom_default),
        },
        (None, [], b'h') => SetMode(params.to_vec()),
        (None, [], b'l') => ResetMode(params.to_vec()),
        (Some(b'?'), [], b'h') => SetPrivateMode(params.to_vec()),
        (Some(b'?'), [], b'l') => ResetPrivateMode(params.to_vec()),
        (Some(b'?'), [], b's') => SavePrivateModes(params.to_vec()),
        (Some(b'?'), [], b'r') => RestorePrivateModes(params.to_vec()),
        (Some(b'?'), [b'$'], b'p') => ReportPrivateModes(params.to_vec()),
        (None, [b'$'], b'p') => ReportAnsiModes(params.to_vec()),
        (None, [], b'c') if params.get_or(0, 0) == 0 => DeviceAttributesPrimary,
        (Some(b'>'), [], b'c') if params.get_or(0, 0) == 0 => DeviceAttributesSecondary,
        (None, [], b'n') => DeviceStatus(params.get_or(0, 0)),
        (None, [], b't') => WindowManipulation(params.get_or(0, 0)),
        (None, [], b'I') => TabForward(params.get_nonzero_or(0, 1)),
        (None, [], b'Z') => TabBackward(params.get_nonzero_or(0, 1)),
        (None, [], b'g') => TabClear(params.get_or(0, 0)),
        (None, [b'!'], b'p') => SoftReset,
        (None, [], b's') => SaveCursor,
        (None, [], b'u') => RestoreCursor,
        (None, [b' '], b'q') => CursorStyle(params.get_or(0, 1)),
        (None, [b'"'], b'q') => CharacterProtection(params.get_or(0, 0)),
        (None, [], b'm') => Sgr,
        _ => Unrecognized,
    }
}
