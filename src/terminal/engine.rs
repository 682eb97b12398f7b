use std::collections::HashMap;

use unicode_width::UnicodeWidthChar;

use super::cell::{AttrFlags, Attributes, Protection};
use super::color::{indexed_to_rgb, Color};
use super::cursor::CursorShape;
use super::dual::DualScreen;
use super::grid::{Line, ScreenBuffer};
use super::modes::TerminalModes;
use super::scrollback::{ScrollbackStore, ViewportRow};
use crate::event::TerminalEvent;
use crate::input::{self, Key, Modifiers, MouseEvent};
use crate::parser::csi::{self, CsiCommand};
use crate::parser::dcs::{self, DcsCommand};
use crate::parser::osc::{self, OscCommand};
use crate::parser::sgr::{self, AttrDelta};
use crate::parser::{Dispatch, Params, Parser, OSC_MAX_PAYLOAD};
use crate::{Error, Result};

/// A parsed request from the private OSC 1010 JSON channel.
#[derive(Debug, Clone)]
pub struct RpcRequest {
    pub action: String,
    pub params: serde_json::Value,
}

/// Host hook for OSC commands with numbers >= 1000. Invoked synchronously
/// during `write`; implementations must not block.
pub trait RpcHandler: Send {
    /// A private OSC other than the JSON channel, with its raw payload.
    fn on_private_osc(&mut self, command: u32, payload: &[u8]);
    /// A parsed request from the OSC 1010 JSON channel.
    fn on_rpc(&mut self, request: RpcRequest);
}

/// Cursor state exposed to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CursorInfo {
    pub row: u16,
    pub col: u16,
    pub shape: CursorShape,
    pub visible: bool,
}

#[derive(Debug, Default)]
struct DcsCapture {
    intermediates: Vec<u8>,
    final_byte: u8,
    data: Vec<u8>,
}

/// The headless terminal: consumes PTY bytes, maintains the screen model,
/// and queues events and query responses for the owner to drain.
pub struct TerminalEngine {
    parser: Parser,
    screens: DualScreen,
    scrollback: ScrollbackStore,
    modes: TerminalModes,
    title: String,
    icon_name: String,
    /// OSC 4 palette overrides on top of the built-in 256-color ramp.
    palette: HashMap<u8, (u8, u8, u8)>,
    /// Hyperlink registry: (id parameter, uri) -> assigned id.
    hyperlink_ids: HashMap<(String, String), u32>,
    next_hyperlink_id: u32,
    /// XTSAVE/XTRESTORE slots for private modes.
    saved_modes: HashMap<u16, bool>,
    /// DEC Special Graphics selection for G0/G1 and the active shift.
    charset_g0_drawing: bool,
    charset_g1_drawing: bool,
    shift_out: bool,
    /// Last character printed, used by CSI REP.
    last_printed: Option<char>,
    dcs: Option<DcsCapture>,
    events: Vec<TerminalEvent>,
    /// Response bytes (DSR, DA, DECRQSS, OSC queries) the owner writes back
    /// to the PTY after each chunk.
    responses: Vec<Vec<u8>>,
    /// Encoded input waiting to be sent to the child.
    pending_input: Vec<u8>,
    rpc: Option<Box<dyn RpcHandler>>,
}

impl TerminalEngine {
    pub fn new(cols: u16, rows: u16, scrollback_lines: usize) -> Self {
        Self {
            parser: Parser::new(),
            screens: DualScreen::new(cols.max(1), rows.max(1)),
            scrollback: ScrollbackStore::new(scrollback_lines),
            modes: TerminalModes::default(),
            title: String::new(),
            icon_name: String::new(),
            palette: HashMap::new(),
            hyperlink_ids: HashMap::new(),
            next_hyperlink_id: 1,
            saved_modes: HashMap::new(),
            charset_g0_drawing: false,
            charset_g1_drawing: false,
            shift_out: false,
            last_printed: None,
            dcs: None,
            events: Vec::new(),
            responses: Vec::new(),
            pending_input: Vec::new(),
            rpc: None,
        }
    }

    /// Install the host hook for private OSC commands.
    pub fn set_rpc_handler(&mut self, handler: Box<dyn RpcHandler>) {
        self.rpc = Some(handler);
    }

    // ── Byte intake ─────────────────────────────────────────────────

    /// Feed bytes from the PTY. The chunk is fully parsed and applied
    /// before returning; a `ScreenUpdated` event with the dirty row range
    /// is queued when anything on the active screen changed.
    pub fn write(&mut self, bytes: &[u8]) {
        let mut parser = std::mem::take(&mut self.parser);
        parser.feed(self, bytes);
        self.parser = parser;
        self.flush_dirty();
    }

    fn flush_dirty(&mut self) {
        if let Some((first_row, last_row)) = self.screens.active_mut().take_dirty_bounds() {
            self.events
                .push(TerminalEvent::ScreenUpdated { first_row, last_row });
        }
    }

    /// Drain queued engine events, in production order.
    pub fn take_events(&mut self) -> Vec<TerminalEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain queued response bytes to write back to the PTY.
    pub fn take_pending_responses(&mut self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.responses)
    }

    // ── Input ───────────────────────────────────────────────────────

    /// Enqueue raw bytes for the child's stdin.
    pub fn input_bytes(&mut self, bytes: &[u8]) {
        self.pending_input.extend_from_slice(bytes);
    }

    /// Encode a key event per the current mode state and enqueue it.
    pub fn input_key(&mut self, key: Key, mods: Modifiers) {
        let bytes = input::encode_key(key, mods, &self.modes);
        self.pending_input.extend_from_slice(&bytes);
    }

    /// Encode pasted text, bracketed when mode 2004 is on, and enqueue it.
    pub fn input_paste(&mut self, text: &str) {
        let bytes = input::encode_paste(text, self.modes.bracketed_paste);
        self.pending_input.extend_from_slice(&bytes);
    }

    /// Encode a mouse event per the current mouse protocol and enqueue it.
    /// Ignored unless a mouse reporting mode is active.
    pub fn input_mouse(&mut self, event: &MouseEvent) {
        let bytes = input::encode_mouse(event, &self.modes);
        self.pending_input.extend_from_slice(&bytes);
    }

    /// Drain input bytes waiting to be written to the child.
    pub fn take_pending_input(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pending_input)
    }

    // ── Geometry ────────────────────────────────────────────────────

    pub fn resize(&mut self, cols: u16, rows: u16) -> Result<()> {
        if cols < 1 || rows < 1 {
            return Err(Error::InvalidGeometry { cols, rows });
        }
        // Retired lines always come from the primary screen.
        let retired = self.screens.resize(cols, rows);
        for line in retired {
            self.scrollback.push(line);
        }
        self.screens.active_mut().mark_all_dirty();
        self.flush_dirty();
        Ok(())
    }

    // ── Accessors ───────────────────────────────────────────────────

    pub fn cursor(&self) -> CursorInfo {
        let screen = self.screens.active();
        CursorInfo {
            row: screen.cursor.row,
            col: screen.cursor.col,
            shape: screen.cursor.shape,
            visible: self.modes.cursor_visible,
        }
    }

    /// The rendition applied to subsequently written cells.
    pub fn attributes(&self) -> Attributes {
        self.screens.active().cursor.attrs
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn icon(&self) -> &str {
        &self.icon_name
    }

    pub fn modes(&self) -> &TerminalModes {
        &self.modes
    }

    pub fn screen(&self) -> &ScreenBuffer {
        self.screens.active()
    }

    pub fn scrollback(&self) -> &ScrollbackStore {
        &self.scrollback
    }

    /// Compose a viewport of `height` rows with `offset` lines of history
    /// above the live screen top.
    pub fn viewport(&self, height: u16, offset: usize) -> Vec<ViewportRow> {
        self.scrollback.view(self.screens.active(), height, offset)
    }

    /// Introspect a DEC private mode by number.
    pub fn private_mode(&self, mode: u16) -> Option<bool> {
        self.private_mode_state(mode)
    }

    // ── Resets ──────────────────────────────────────────────────────

    /// DECSTR: reset modes, scroll region, rendition, and the saved cursor
    /// per DEC's list. On-screen content and cursor position are kept.
    pub fn soft_reset(&mut self) {
        self.modes.cursor_visible = true;
        self.modes.insert = false;
        self.modes.cursor_keys_application = false;
        self.modes.keypad_application = false;
        self.charset_g0_drawing = false;
        self.charset_g1_drawing = false;
        self.shift_out = false;
        let screen = self.screens.active_mut();
        screen.soft_reset();
    }

    /// RIS: full reset. Clears both screens, scrollback, tab stops, modes,
    /// and parser state. The installed RPC handler survives.
    pub fn hard_reset(&mut self) {
        let cols = self.screens.active().cols();
        let rows = self.screens.active().rows();
        if self.screens.is_alternate() {
            self.events.push(TerminalEvent::AltScreenExited);
        }
        self.parser = Parser::new();
        self.screens = DualScreen::new(cols, rows);
        self.scrollback.clear();
        self.modes = TerminalModes::default();
        self.palette.clear();
        self.saved_modes.clear();
        self.charset_g0_drawing = false;
        self.charset_g1_drawing = false;
        self.shift_out = false;
        self.last_printed = None;
        self.dcs = None;
        self.flush_dirty();
    }

    // ── Internals ───────────────────────────────────────────────────

    fn retire(&mut self, lines: Vec<Line>) {
        if self.screens.is_alternate() {
            return;
        }
        for line in lines {
            self.scrollback.push(line);
        }
    }

    fn linefeed(&mut self) {
        let retired = self.screens.active_mut().index();
        self.retire(retired);
        if self.modes.linefeed_newline {
            self.screens.active_mut().carriage_return();
        }
    }

    fn put_glyph(&mut self, ch: char, width: u16) {
        let insert = self.modes.insert;
        let retired = self.screens.active_mut().put_char(ch, width, insert);
        self.retire(retired);
    }

    fn charset_map(&self, ch: char) -> char {
        let drawing = if self.shift_out {
            self.charset_g1_drawing
        } else {
            self.charset_g0_drawing
        };
        if drawing {
            dec_line_drawing_char(ch)
        } else {
            ch
        }
    }

    fn emit_mode_changed(&mut self) {
        self.events.push(TerminalEvent::mode_changed(&self.modes));
    }

    fn respond(&mut self, bytes: Vec<u8>) {
        self.responses.push(bytes);
    }

    // ── Mode handling ───────────────────────────────────────────────

    fn set_dec_modes(&mut self, modes: &[u16], enable: bool) {
        for &mode in modes {
            self.apply_dec_mode(mode, enable);
        }
    }

    fn apply_dec_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            1 => {
                self.modes.cursor_keys_application = enable;
                self.emit_mode_changed();
            }
            6 => self.screens.active_mut().set_origin_mode(enable),
            7 => self.screens.active_mut().set_auto_wrap(enable),
            12 => {}
            25 => self.modes.cursor_visible = enable,
            47 => {
                if enable {
                    self.enter_alt_screen(false, false);
                } else {
                    self.exit_alt_screen(false, false);
                }
            }
            1047 => {
                if enable {
                    self.enter_alt_screen(true, false);
                } else {
                    self.exit_alt_screen(true, true);
                }
            }
            1048 => {
                if enable {
                    let drawing = self.charset_g0_drawing;
                    self.screens.active_mut().save_cursor(drawing);
                } else if let Some(drawing) = self.screens.active_mut().restore_cursor() {
                    self.charset_g0_drawing = drawing;
                }
            }
            1049 => {
                if enable {
                    self.enter_alt_screen(true, true);
                } else {
                    self.exit_alt_screen(true, false);
                }
            }
            1000 => {
                self.modes.mouse_tracking = enable;
                self.emit_mode_changed();
            }
            1002 => {
                self.modes.mouse_motion = enable;
                self.emit_mode_changed();
            }
            1003 => {
                self.modes.mouse_all_motion = enable;
                self.emit_mode_changed();
            }
            1004 => {
                self.modes.focus_events = enable;
                self.emit_mode_changed();
            }
            1005 => {
                self.modes.utf8_mouse = enable;
                self.emit_mode_changed();
            }
            1006 => {
                self.modes.sgr_mouse = enable;
                self.emit_mode_changed();
            }
            1007 => {
                self.modes.alternate_scroll = enable;
                self.emit_mode_changed();
            }
            2004 => {
                self.modes.bracketed_paste = enable;
                self.emit_mode_changed();
            }
            2026 => {
                self.modes.synchronized_output = enable;
                self.emit_mode_changed();
            }
            2027 => self.modes.utf8 = enable,
            _ => {
                tracing::trace!(mode, enable, "unhandled DEC private mode");
            }
        }
    }

    /// `save_cursor` and `clear` per the 47/1047/1049 semantics.
    fn enter_alt_screen(&mut self, save_cursor: bool, clear: bool) {
        if self.screens.is_alternate() {
            return;
        }
        let drawing = self.charset_g0_drawing;
        self.screens.switch_to_alternate(save_cursor, clear, drawing);
        self.modes.alt_screen = true;
        self.events.push(TerminalEvent::AltScreenEntered);
    }

    fn exit_alt_screen(&mut self, restore_cursor: bool, clear_alternate: bool) {
        if !self.screens.is_alternate() {
            return;
        }
        if clear_alternate {
            self.screens.alternate_mut().erase_in_display(2);
        }
        if let Some(drawing) = self.screens.switch_to_primary(restore_cursor) {
            self.charset_g0_drawing = drawing;
        }
        self.modes.alt_screen = false;
        self.events.push(TerminalEvent::AltScreenExited);
    }

    fn set_ansi_modes(&mut self, modes: &[u16], enable: bool) {
        for &mode in modes {
            match mode {
                4 => self.modes.insert = enable,
                20 => self.modes.linefeed_newline = enable,
                _ => tracing::trace!(mode, enable, "unhandled ANSI mode"),
            }
        }
    }

    fn private_mode_state(&self, mode: u16) -> Option<bool> {
        match mode {
            1 => Some(self.modes.cursor_keys_application),
            6 => Some(self.screens.active().origin_mode()),
            7 => Some(self.screens.active().auto_wrap()),
            25 => Some(self.modes.cursor_visible),
            47 | 1047 | 1049 => Some(self.screens.is_alternate()),
            1000 => Some(self.modes.mouse_tracking),
            1002 => Some(self.modes.mouse_motion),
            1003 => Some(self.modes.mouse_all_motion),
            1004 => Some(self.modes.focus_events),
            1005 => Some(self.modes.utf8_mouse),
            1006 => Some(self.modes.sgr_mouse),
            1007 => Some(self.modes.alternate_scroll),
            2004 => Some(self.modes.bracketed_paste),
            2026 => Some(self.modes.synchronized_output),
            2027 => Some(self.modes.utf8),
            _ => None,
        }
    }

    fn ansi_mode_state(&self, mode: u16) -> Option<bool> {
        match mode {
            4 => Some(self.modes.insert),
            20 => Some(self.modes.linefeed_newline),
            _ => None,
        }
    }

    /// DECRPM / RQM reply: 1 = set, 2 = reset, 0 = unrecognized.
    fn report_mode_state(&mut self, mode: u16, state: Option<bool>, dec_private: bool) {
        let pm = match state {
            Some(true) => 1,
            Some(false) => 2,
            None => 0,
        };
        let prefix = if dec_private { "?" } else { "" };
        self.respond(format!("\x1b[{}{};{}$y", prefix, mode, pm).into_bytes());
    }

    fn report_private_modes(&mut self, modes: &[u16]) {
        if modes.is_empty() {
            self.report_mode_state(0, None, true);
            return;
        }
        for &mode in modes {
            self.report_mode_state(mode, self.private_mode_state(mode), true);
        }
    }

    fn report_ansi_modes(&mut self, modes: &[u16]) {
        if modes.is_empty() {
            self.report_mode_state(0, None, false);
            return;
        }
        for &mode in modes {
            self.report_mode_state(mode, self.ansi_mode_state(mode), false);
        }
    }

    fn save_private_modes(&mut self, modes: &[u16]) {
        for &mode in modes {
            if let Some(state) = self.private_mode_state(mode) {
                self.saved_modes.insert(mode, state);
            }
        }
    }

    fn restore_private_modes(&mut self, modes: &[u16]) {
        for &mode in modes {
            if let Some(&state) = self.saved_modes.get(&mode) {
                self.apply_dec_mode(mode, state);
            }
        }
    }

    // ── SGR ─────────────────────────────────────────────────────────

    fn apply_sgr(&mut self, params: &Params) {
        let deltas = sgr::classify(params);
        let attrs = &mut self.screens.active_mut().cursor.attrs;
        for delta in deltas {
            match delta {
                AttrDelta::ResetAll => {
                    // The hyperlink is OSC-scoped, not SGR-scoped.
                    let hyperlink = attrs.hyperlink;
                    attrs.reset();
                    attrs.hyperlink = hyperlink;
                }
                AttrDelta::SetBold => attrs.flags.insert(AttrFlags::BOLD),
                AttrDelta::SetFaint => attrs.flags.insert(AttrFlags::FAINT),
                AttrDelta::UnsetBoldFaint => {
                    attrs.flags.remove(AttrFlags::BOLD);
                    attrs.flags.remove(AttrFlags::FAINT);
                }
                AttrDelta::SetItalic => attrs.flags.insert(AttrFlags::ITALIC),
                AttrDelta::UnsetItalic => attrs.flags.remove(AttrFlags::ITALIC),
                AttrDelta::SetUnderline(style) => attrs.underline = style,
                AttrDelta::SetBlink => attrs.flags.insert(AttrFlags::BLINK),
                AttrDelta::SetRapidBlink => attrs.flags.insert(AttrFlags::RAPID_BLINK),
                AttrDelta::UnsetBlink => {
                    attrs.flags.remove(AttrFlags::BLINK);
                    attrs.flags.remove(AttrFlags::RAPID_BLINK);
                }
                AttrDelta::SetInverse => attrs.flags.insert(AttrFlags::INVERSE),
                AttrDelta::UnsetInverse => attrs.flags.remove(AttrFlags::INVERSE),
                AttrDelta::SetHidden => attrs.flags.insert(AttrFlags::HIDDEN),
                AttrDelta::UnsetHidden => attrs.flags.remove(AttrFlags::HIDDEN),
                AttrDelta::SetStrikethrough => attrs.flags.insert(AttrFlags::STRIKETHROUGH),
                AttrDelta::UnsetStrikethrough => attrs.flags.remove(AttrFlags::STRIKETHROUGH),
                AttrDelta::SetFg(color) => attrs.fg = color,
                AttrDelta::SetBg(color) => attrs.bg = color,
                AttrDelta::SetUnderlineColor(color) => attrs.underline_color = color,
            }
        }
    }

    // ── OSC ─────────────────────────────────────────────────────────

    fn handle_osc(&mut self, payload: &[u8]) {
        match osc::classify(payload) {
            OscCommand::SetTitleAndIcon(text) => {
                self.title = text.clone();
                self.icon_name = text.clone();
                self.events.push(TerminalEvent::TitleChanged { title: text.clone() });
                self.events.push(TerminalEvent::IconChanged { name: text });
            }
            OscCommand::SetIcon(name) => {
                self.icon_name = name.clone();
                self.events.push(TerminalEvent::IconChanged { name });
            }
            OscCommand::SetTitle(title) => {
                self.title = title.clone();
                self.events.push(TerminalEvent::TitleChanged { title });
            }
            OscCommand::SetPaletteColor { index, rgb } => {
                self.palette.insert(index, rgb);
            }
            OscCommand::QueryPaletteColor { index } => {
                let (r, g, b) = self
                    .palette
                    .get(&index)
                    .copied()
                    .unwrap_or_else(|| indexed_to_rgb(index));
                self.respond(
                    format!(
                        "\x1b]4;{};rgb:{:04x}/{:04x}/{:04x}\x1b\\",
                        index,
                        u16::from(r) * 0x0101,
                        u16::from(g) * 0x0101,
                        u16::from(b) * 0x0101
                    )
                    .into_bytes(),
                );
            }
            OscCommand::Hyperlink { id, uri } => {
                let key = (id.unwrap_or_default(), uri.clone());
                let id = match self.hyperlink_ids.get(&key) {
                    Some(&id) => id,
                    None => {
                        let id = self.next_hyperlink_id;
                        self.next_hyperlink_id += 1;
                        self.hyperlink_ids.insert(key, id);
                        self.events
                            .push(TerminalEvent::HyperlinkRegistered { id, uri });
                        id
                    }
                };
                self.screens.active_mut().cursor.attrs.hyperlink = Some(id);
            }
            OscCommand::HyperlinkEnd => {
                self.screens.active_mut().cursor.attrs.hyperlink = None;
            }
            OscCommand::QueryDefaultForeground => {
                self.respond(b"\x1b]10;rgb:d4d4/d4d4/d4d4\x1b\\".to_vec());
            }
            OscCommand::QueryDefaultBackground => {
                self.respond(b"\x1b]11;rgb:0e0e/0e0e/0e0e\x1b\\".to_vec());
            }
            OscCommand::QueryTitle => {
                self.respond(format!("\x1b]21;{}\x1b\\", self.title).into_bytes());
            }
            OscCommand::ClipboardSet { selection, data } => {
                self.events.push(TerminalEvent::ClipboardWrite {
                    selection,
                    text: String::from_utf8_lossy(&data).into_owned(),
                });
            }
            OscCommand::ClipboardQuery { selection } => {
                self.events.push(TerminalEvent::PasteRequest { selection });
            }
            OscCommand::ClipboardClear { selection } => {
                self.events.push(TerminalEvent::ClipboardWrite {
                    selection,
                    text: String::new(),
                });
            }
            OscCommand::Private { command, payload } => self.handle_private_osc(command, &payload),
            OscCommand::Unrecognized => {
                tracing::trace!(payload = %String::from_utf8_lossy(payload), "unrecognized OSC");
            }
        }
    }

    fn handle_private_osc(&mut self, command: u32, payload: &[u8]) {
        let Some(rpc) = self.rpc.as_mut() else {
            tracing::trace!(command, "private OSC dropped: no RPC handler installed");
            return;
        };
        if command == 1010 {
            match serde_json::from_slice::<serde_json::Value>(payload) {
                Ok(value) => match value.get("action").and_then(|a| a.as_str()) {
                    Some(action) => rpc.on_rpc(RpcRequest {
                        action: action.to_string(),
                        params: value,
                    }),
                    None => tracing::debug!("OSC 1010 payload missing \"action\" field"),
                },
                Err(err) => tracing::debug!(%err, "OSC 1010 payload is not valid JSON"),
            }
        } else {
            rpc.on_private_osc(command, payload);
        }
    }

    // ── DCS ─────────────────────────────────────────────────────────

    fn handle_decrqss(&mut self, selector: &str) {
        let screen = self.screens.active();
        let status = match selector {
            // SGR
            "m" => Some("0m".to_string()),
            // DECSCUSR
            " q" => {
                let style = match screen.cursor.shape {
                    CursorShape::Block => 2,
                    CursorShape::Underline => 4,
                    CursorShape::Bar => 6,
                };
                Some(format!("{} q", style))
            }
            // DECSTBM
            "r" => {
                let (top, bottom) = screen.scroll_region();
                Some(format!("{};{}r", top + 1, bottom + 1))
            }
            // DECSCA
            "\"q" => {
                let state = if screen.cursor.protect.is_protected() {
                    1
                } else {
                    0
                };
                Some(format!("{}\"q", state))
            }
            _ => None,
        };
        match status {
            Some(pt) => self.respond(format!("\x1bP1$r{}\x1b\\", pt).into_bytes()),
            None => self.respond(b"\x1bP0$r\x1b\\".to_vec()),
        }
    }

    // ── Device queries ──────────────────────────────────────────────

    fn device_status(&mut self, kind: u16) {
        match kind {
            // Operating status: OK
            5 => self.respond(b"\x1b[0n".to_vec()),
            // CPR, 1-indexed, origin-mode honored
            6 => {
                let screen = self.screens.active();
                let (top, _) = screen.scroll_region();
                let row = if screen.origin_mode() {
                    screen.cursor.row.saturating_sub(top)
                } else {
                    screen.cursor.row
                };
                let response = format!("\x1b[{};{}R", row + 1, screen.cursor.col + 1);
                self.respond(response.into_bytes());
            }
            _ => tracing::trace!(kind, "unhandled DSR"),
        }
    }

    fn window_manipulation(&mut self, op: u16) {
        match op {
            // Report text-area size in characters
            18 => {
                let screen = self.screens.active();
                let response = format!("\x1b[8;{};{}t", screen.rows(), screen.cols());
                self.respond(response.into_bytes());
            }
            _ => tracing::trace!(op, "unhandled window manipulation"),
        }
    }

    fn set_cursor_style(&mut self, style: u16) {
        let shape = match style {
            0 | 1 | 2 => CursorShape::Block,
            3 | 4 => CursorShape::Underline,
            5 | 6 => CursorShape::Bar,
            _ => return,
        };
        self.screens.primary_mut().cursor.shape = shape;
        self.screens.alternate_mut().cursor.shape = shape;
    }

    fn repeat_last(&mut self, count: u16) {
        let Some(ch) = self.last_printed else {
            return;
        };
        let width = UnicodeWidthChar::width(ch).unwrap_or(1) as u16;
        for _ in 0..count.min(2048) {
            self.put_glyph(ch, width);
        }
    }
}

impl Dispatch for TerminalEngine {
    fn print(&mut self, ch: char) {
        let ch = self.charset_map(ch);
        let width = UnicodeWidthChar::width(ch).unwrap_or(1) as u16;
        if width == 0 {
            // Combining marks are not representable in the single-scalar
            // cell model.
            tracing::trace!(codepoint = ch as u32, "dropping zero-width codepoint");
            return;
        }
        self.last_printed = Some(ch);
        self.put_glyph(ch, width);
    }

    fn execute(&mut self, byte: u8) {
        match byte {
            0x07 => self.events.push(TerminalEvent::Bell),
            0x08 => self.screens.active_mut().backspace(),
            0x09 => self.screens.active_mut().tab_forward(1),
            0x0a | 0x0b | 0x0c => self.linefeed(),
            0x0d => self.screens.active_mut().carriage_return(),
            0x0e => self.shift_out = true,
            0x0f => self.shift_out = false,
            _ => {}
        }
    }

    fn esc_dispatch(&mut self, intermediates: &[u8], byte: u8) {
        match (byte, intermediates) {
            (b'D', []) => {
                let retired = self.screens.active_mut().index();
                self.retire(retired);
            }
            (b'E', []) => {
                let retired = self.screens.active_mut().next_line();
                self.retire(retired);
            }
            (b'H', []) => self.screens.active_mut().set_tab_stop(),
            (b'M', []) => self.screens.active_mut().reverse_index(),
            (b'7', []) => {
                let drawing = self.charset_g0_drawing;
                self.screens.active_mut().save_cursor(drawing);
            }
            (b'8', []) => {
                if let Some(drawing) = self.screens.active_mut().restore_cursor() {
                    self.charset_g0_drawing = drawing;
                }
            }
            (b'c', []) => self.hard_reset(),
            (b'=', []) => self.modes.keypad_application = true,
            (b'>', []) => self.modes.keypad_application = false,
            (b'0', [b'(']) => self.charset_g0_drawing = true,
            (b'B', [b'(']) => self.charset_g0_drawing = false,
            (b'0', [b')']) => self.charset_g1_drawing = true,
            (b'B', [b')']) => self.charset_g1_drawing = false,
            // ST terminators arrive here after string sequences.
            (b'\\', []) => {}
            _ => {
                tracing::trace!(byte, ?intermediates, "unrecognized ESC sequence");
            }
        }
    }

    fn csi_dispatch(
        &mut self,
        private: Option<u8>,
        params: &Params,
        intermediates: &[u8],
        final_byte: u8,
    ) {
        let rows = self.screens.active().rows();
        let command = csi::classify(private, params, intermediates, final_byte, rows);
        match command {
            CsiCommand::CursorUp(n) => self.screens.active_mut().cursor_up(n),
            CsiCommand::CursorDown(n) => self.screens.active_mut().cursor_down(n),
            CsiCommand::CursorForward(n) => self.screens.active_mut().cursor_forward(n),
            CsiCommand::CursorBack(n) => self.screens.active_mut().cursor_backward(n),
            CsiCommand::CursorNextLine(n) => {
                let screen = self.screens.active_mut();
                screen.carriage_return();
                screen.cursor_down(n);
            }
            CsiCommand::CursorPrevLine(n) => {
                let screen = self.screens.active_mut();
                screen.carriage_return();
                screen.cursor_up(n);
            }
            CsiCommand::CursorColumn(col) => self.screens.active_mut().cursor_to_col(col),
            CsiCommand::CursorRow(row) => self.screens.active_mut().cursor_to_row(row),
            CsiCommand::CursorPosition { row, col } => {
                self.screens.active_mut().cursor_position(row, col)
            }
            CsiCommand::EraseDisplay(mode) => {
                self.screens.active_mut().erase_in_display(mode);
                if mode == 3 && !self.screens.is_alternate() {
                    self.scrollback.clear();
                    self.events.push(TerminalEvent::ScrollbackCleared);
                }
            }
            CsiCommand::EraseLine(mode) => self.screens.active_mut().erase_in_line(mode),
            CsiCommand::SelectiveEraseDisplay(mode) => {
                self.screens.active_mut().selective_erase_in_display(mode)
            }
            CsiCommand::SelectiveEraseLine(mode) => {
                self.screens.active_mut().selective_erase_in_line(mode)
            }
            CsiCommand::EraseCharacter(n) => self.screens.active_mut().erase_chars(n),
            CsiCommand::ScrollUp(n) => {
                let retired = self.screens.active_mut().scroll_up(n);
                self.retire(retired);
            }
            CsiCommand::ScrollDown(n) => self.screens.active_mut().scroll_down(n),
            CsiCommand::InsertLine(n) => self.screens.active_mut().insert_lines(n),
            CsiCommand::DeleteLine(n) => self.screens.active_mut().delete_lines(n),
            CsiCommand::InsertCharacter(n) => self.screens.active_mut().insert_chars(n),
            CsiCommand::DeleteCharacter(n) => self.screens.active_mut().delete_chars(n),
            CsiCommand::RepeatLast(n) => self.repeat_last(n),
            CsiCommand::SetScrollRegion { top, bottom } => {
                self.screens.active_mut().set_scroll_region(top, bottom)
            }
            CsiCommand::SetMode(modes) => self.set_ansi_modes(&modes, true),
            CsiCommand::ResetMode(modes) => self.set_ansi_modes(&modes, false),
            CsiCommand::SetPrivateMode(modes) => self.set_dec_modes(&modes, true),
            CsiCommand::ResetPrivateMode(modes) => self.set_dec_modes(&modes, false),
            CsiCommand::SavePrivateModes(modes) => self.save_private_modes(&modes),
            CsiCommand::RestorePrivateModes(modes) => self.restore_private_modes(&modes),
            CsiCommand::ReportPrivateModes(modes) => self.report_private_modes(&modes),
            CsiCommand::ReportAnsiModes(modes) => self.report_ansi_modes(&modes),
            CsiCommand::DeviceAttributesPrimary => {
                // VT220 with ANSI color support
                self.respond(b"\x1b[?62;22c".to_vec());
            }
            CsiCommand::DeviceAttributesSecondary => {
                self.respond(b"\x1b[>0;10;0c".to_vec());
            }
            CsiCommand::DeviceStatus(kind) => self.device_status(kind),
            CsiCommand::WindowManipulation(op) => self.window_manipulation(op),
            CsiCommand::TabForward(n) => self.screens.active_mut().tab_forward(n),
            CsiCommand::TabBackward(n) => self.screens.active_mut().tab_backward(n),
            CsiCommand::TabClear(kind) => match kind {
                0 => {
                    let col = self.screens.active().cursor.col;
                    self.screens.active_mut().clear_tab_stop(col);
                }
                3 => self.screens.active_mut().clear_all_tab_stops(),
                _ => {}
            },
            CsiCommand::SoftReset => self.soft_reset(),
            CsiCommand::SaveCursor => {
                let drawing = self.charset_g0_drawing;
                self.screens.active_mut().save_cursor(drawing);
            }
            CsiCommand::RestoreCursor => {
                if let Some(drawing) = self.screens.active_mut().restore_cursor() {
                    self.charset_g0_drawing = drawing;
                }
            }
            CsiCommand::CursorStyle(style) => self.set_cursor_style(style),
            CsiCommand::Sgr => self.apply_sgr(params),
            CsiCommand::CharacterProtection(kind) => {
                let protect = match kind {
                    1 => Protection::Protected,
                    2 => Protection::Unprotected,
                    _ => Protection::Unset,
                };
                self.screens.active_mut().set_protection(protect);
            }
            CsiCommand::Unrecognized => {
                tracing::trace!(
                    final_byte,
                    ?private,
                    ?intermediates,
                    "unrecognized CSI sequence"
                );
            }
        }
    }

    fn osc_dispatch(&mut self, payload: &[u8]) {
        self.handle_osc(payload);
    }

    fn dcs_hook(&mut self, _params: &Params, intermediates: &[u8], final_byte: u8) {
        self.dcs = Some(DcsCapture {
            intermediates: intermediates.to_vec(),
            final_byte,
            data: Vec::new(),
        });
    }

    fn dcs_put(&mut self, byte: u8) {
        if let Some(capture) = self.dcs.as_mut() {
            if capture.data.len() < OSC_MAX_PAYLOAD {
                capture.data.push(byte);
            }
        }
    }

    fn dcs_unhook(&mut self) {
        let Some(capture) = self.dcs.take() else {
            return;
        };
        match dcs::classify(&capture.intermediates, capture.final_byte, &capture.data) {
            DcsCommand::RequestStatus(selector) => self.handle_decrqss(&selector),
            DcsCommand::Unrecognized => {
                tracing::trace!(final_byte = capture.final_byte, "discarding DCS");
            }
        }
    }
}

/// Map ASCII to DEC Special Graphics (line-drawing) characters.
fn dec_line_drawing_char(c: char) -> char {
    match c {
        '`' => '◆',
        'a' => '▒',
        'j' => '┘',
        'k' => '┐',
        'l' => '┌',
        'm' => '└',
        'n' => '┼',
        'o' => '⎺',
        'p' => '⎻',
        'q' => '─',
        'r' => '⎼',
        's' => '⎽',
        't' => '├',
        'u' => '┤',
        'v' => '┴',
        'w' => '┬',
        'x' => '│',
        'y' => '≤',
        'z' => '≥',
        '{' => 'π',
        '|' => '≠',
        '}' => '£',
        '~' => '·',
        _ => c,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terminal::cell::UnderlineStyle;

    fn engine() -> TerminalEngine {
        TerminalEngine::new(80, 24, 100)
    }

    fn responses_string(engine: &mut TerminalEngine) -> String {
        engine
            .take_pending_responses()
            .into_iter()
            .map(|r| String::from_utf8_lossy(&r).into_owned())
            .collect()
    }

    #[test]
    fn hello_wrap_at_column_78() {
        let mut term = engine();
        term.write(b"\x1b[1;79H");
        term.write(b"Hi!");
        let screen = term.screen();
        assert_eq!(screen.line(0).cells[78].ch, 'H');
        assert_eq!(screen.line(0).cells[79].ch, 'i');
        assert_eq!(screen.line(1).cells[0].ch, '!');
        assert_eq!((screen.cursor.row, screen.cursor.col), (1, 1));
        assert!(!screen.cursor.pending_wrap);
    }

    #[test]
    fn cursor_position_then_erase_to_end_of_line() {
        let mut term = engine();
        term.write(b"\x1b[5;10HX\x1b[K");
        let screen = term.screen();
        assert_eq!(screen.line(4).cells[9].ch, 'X');
        assert_eq!((screen.cursor.row, screen.cursor.col), (4, 10));
        for col in 10..80 {
            assert_eq!(screen.line(4).cells[col].ch, ' ', "col {col}");
        }
    }

    #[test]
    fn scroll_off_feeds_scrollback_and_viewport_composes() {
        let mut term = TerminalEngine::new(4, 2, 10);
        term.write(b"AB\r\nCD\r\nEF");
        assert_eq!(term.screen().line(0).text(), "CD");
        assert_eq!(term.screen().line(1).text(), "EF");
        assert_eq!(term.scrollback().len(), 1);
        assert_eq!(term.scrollback().get(0).unwrap().text(), "AB");

        let view = term.viewport(2, 1);
        let texts: Vec<String> = view
            .iter()
            .map(|r| {
                r.cells
                    .iter()
                    .map(|c| c.ch)
                    .collect::<String>()
                    .trim_end()
                    .to_string()
            })
            .collect();
        assert_eq!(texts, vec!["AB", "CD"]);
    }

    #[test]
    fn alt_screen_isolation() {
        let mut term = TerminalEngine::new(10, 3, 10);
        term.write(b"primary");
        term.write(b"\x1b[?1049h");
        term.write(b"alt\r\nmore\r\nlines\r\npast");
        term.write(b"\x1b[?1049l");
        assert_eq!(term.screen().line(0).text(), "primary");
        assert!(term.scrollback().is_empty());
        let cursor = term.cursor();
        assert_eq!((cursor.row, cursor.col), (0, 7));
    }

    #[test]
    fn sgr_bold_truecolor_and_reset() {
        let mut term = engine();
        term.write(b"\x1b[1;38;2;10;20;30mA\x1b[0mB");
        let screen = term.screen();
        let a = &screen.line(0).cells[0];
        assert!(a.attrs.flags.contains(AttrFlags::BOLD));
        assert_eq!(a.attrs.fg, Color::rgb(10, 20, 30));
        let b = &screen.line(0).cells[1];
        assert!(!b.attrs.flags.contains(AttrFlags::BOLD));
        assert_eq!(b.attrs.fg, Color::Default);
    }

    #[test]
    fn sgr_reset_round_trip() {
        let mut term = engine();
        term.write(b"\x1b[1;3;4:3;5;7;9;38;5;99;48;2;1;2;3;58;5;12m");
        assert_ne!(term.attributes(), Attributes::default());
        term.write(b"\x1b[0m");
        assert_eq!(term.attributes(), Attributes::default());
    }

    #[test]
    fn underline_style_applied() {
        let mut term = engine();
        term.write(b"\x1b[4:3mU");
        assert_eq!(
            term.screen().line(0).cells[0].attrs.underline,
            UnderlineStyle::Curly
        );
    }

    #[test]
    fn cpr_reports_cursor_position() {
        let mut term = engine();
        term.write(b"\x1b[3;5H\x1b[6n");
        assert_eq!(responses_string(&mut term), "\x1b[3;5R");
    }

    #[test]
    fn cpr_honors_origin_mode() {
        let mut term = engine();
        term.write(b"\x1b[5;20r\x1b[?6h\x1b[2;3H\x1b[6n");
        assert_eq!(responses_string(&mut term), "\x1b[2;3R");
    }

    #[test]
    fn cpr_stays_in_bounds_after_origin_mode_shrink() {
        let mut term = TerminalEngine::new(10, 24, 50);
        // Non-blank rows everywhere so the shrink retires from the top.
        for _ in 0..23 {
            term.write(b"x\r\n");
        }
        term.write(b"x");
        term.write(b"\x1b[5;20r\x1b[?6h\x1b[7;1H");
        term.resize(10, 6).unwrap();
        term.write(b"\x1b[6n");
        assert_eq!(responses_string(&mut term), "\x1b[1;1R");
    }

    #[test]
    fn device_attributes() {
        let mut term = engine();
        term.write(b"\x1b[c\x1b[>c\x1b[5n");
        assert_eq!(
            responses_string(&mut term),
            "\x1b[?62;22c\x1b[>0;10;0c\x1b[0n"
        );
    }

    #[test]
    fn window_size_report() {
        let mut term = engine();
        term.write(b"\x1b[18t");
        assert_eq!(responses_string(&mut term), "\x1b[8;24;80t");
    }

    #[test]
    fn decrqss_scroll_region() {
        let mut term = engine();
        term.write(b"\x1b[3;10r");
        term.write(b"\x1bP$qr\x1b\\");
        assert_eq!(responses_string(&mut term), "\x1bP1$r3;10r\x1b\\");
        term.write(b"\x1bP$qz\x1b\\");
        assert_eq!(responses_string(&mut term), "\x1bP0$r\x1b\\");
    }

    #[test]
    fn decsc_decrc_round_trip() {
        let mut term = engine();
        term.write(b"\x1b[1;31m\x1b[10;20H\x1b7");
        term.write(b"\x1b[0m\x1b[1;1Hmoved");
        term.write(b"\x1b8");
        let cursor = term.cursor();
        assert_eq!((cursor.row, cursor.col), (9, 19));
        assert_eq!(term.attributes().fg, Color::indexed(1));
    }

    #[test]
    fn soft_reset_follows_dec_list() {
        let mut term = engine();
        term.write(b"content\x1b[5;10r\x1b[?6h\x1b[4h\x1b[?25l\x1b[1m");
        term.write(b"\x1b[!p");
        assert!(term.modes().cursor_visible);
        assert!(!term.modes().insert);
        assert!(!term.screen().origin_mode());
        assert!(!term.screen().auto_wrap());
        assert_eq!(term.screen().scroll_region(), (0, 23));
        assert_eq!(term.attributes(), Attributes::default());
        // Content survives a soft reset.
        assert_eq!(term.screen().line(0).text(), "content");
    }

    #[test]
    fn hard_reset_clears_everything() {
        let mut term = TerminalEngine::new(4, 2, 10);
        term.write(b"AB\r\nCD\r\nEF");
        assert!(!term.scrollback().is_empty());
        term.write(b"\x1bc");
        assert!(term.scrollback().is_empty());
        assert_eq!(term.screen().line(0).text(), "");
        assert_eq!(term.cursor().row, 0);
    }

    #[test]
    fn erase_display_3_clears_scrollback_from_primary_only() {
        let mut term = TerminalEngine::new(4, 2, 10);
        term.write(b"AB\r\nCD\r\nEF");
        assert_eq!(term.scrollback().len(), 1);
        term.write(b"\x1b[?1049h\x1b[3J");
        assert_eq!(term.scrollback().len(), 1);
        term.write(b"\x1b[?1049l\x1b[3J");
        assert!(term.scrollback().is_empty());
        let events = term.take_events();
        assert!(events.contains(&TerminalEvent::ScrollbackCleared));
    }

    #[test]
    fn bracketed_paste_wraps_and_neutralizes() {
        let mut term = engine();
        term.write(b"\x1b[?2004h");
        term.input_paste("hello");
        assert_eq!(term.take_pending_input(), b"\x1b[200~hello\x1b[201~");

        term.input_paste("bad\x1b[201~tail");
        let bytes = term.take_pending_input();
        let body = &bytes[6..bytes.len() - 6];
        assert!(!windows_contains(body, b"\x1b[201~"));
    }

    fn windows_contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    #[test]
    fn arrow_key_encoding_follows_cursor_mode() {
        let mut term = engine();
        term.input_key(Key::Up, Modifiers::empty());
        assert_eq!(term.take_pending_input(), b"\x1b[A");
        term.write(b"\x1b[?1h");
        term.input_key(Key::Up, Modifiers::empty());
        assert_eq!(term.take_pending_input(), b"\x1bOA");
    }

    #[test]
    fn title_and_icon_events() {
        let mut term = engine();
        term.write(b"\x1b]2;my title\x07");
        assert_eq!(term.title(), "my title");
        let events = term.take_events();
        assert!(events.contains(&TerminalEvent::TitleChanged {
            title: "my title".into()
        }));
        term.write(b"\x1b]21;\x07");
        assert_eq!(responses_string(&mut term), "\x1b]21;my title\x1b\\");
    }

    #[test]
    fn bell_event_emitted() {
        let mut term = engine();
        term.write(b"\x07");
        assert!(term.take_events().contains(&TerminalEvent::Bell));
    }

    #[test]
    fn screen_updated_carries_dirty_bounds() {
        let mut term = engine();
        // Flush the initial full-screen dirty state.
        term.write(b"");
        term.take_events();
        term.write(b"\x1b[5;1Hx");
        let events = term.take_events();
        assert!(events.iter().any(|e| matches!(
            e,
            TerminalEvent::ScreenUpdated {
                first_row: 4,
                last_row: 4
            }
        )));
    }

    #[test]
    fn mode_report_decrpm() {
        let mut term = engine();
        term.write(b"\x1b[?2004h\x1b[?2004$p\x1b[?1$p");
        assert_eq!(responses_string(&mut term), "\x1b[?2004;1$y\x1b[?1;2$y");
    }

    #[test]
    fn save_restore_private_modes() {
        let mut term = engine();
        term.write(b"\x1b[?2004h\x1b[?2004s\x1b[?2004l");
        assert_eq!(term.private_mode(2004), Some(false));
        term.write(b"\x1b[?2004r");
        assert_eq!(term.private_mode(2004), Some(true));
    }

    #[test]
    fn osc52_query_raises_paste_request() {
        let mut term = engine();
        term.write(b"\x1b]52;c;?\x07");
        assert!(term
            .take_events()
            .contains(&TerminalEvent::PasteRequest {
                selection: "c".into()
            }));
    }

    #[test]
    fn osc52_set_raises_clipboard_write() {
        let mut term = engine();
        term.write(b"\x1b]52;c;aGVsbG8=\x07");
        assert!(term.take_events().contains(&TerminalEvent::ClipboardWrite {
            selection: "c".into(),
            text: "hello".into()
        }));
    }

    #[test]
    fn hyperlink_registration() {
        let mut term = engine();
        term.write(b"\x1b]8;;https://example.com\x1b\\link\x1b]8;;\x1b\\plain");
        let events = term.take_events();
        assert!(events.contains(&TerminalEvent::HyperlinkRegistered {
            id: 1,
            uri: "https://example.com".into()
        }));
        let screen = term.screen();
        assert_eq!(screen.line(0).cells[0].attrs.hyperlink, Some(1));
        assert_eq!(screen.line(0).cells[4].attrs.hyperlink, None);
    }

    #[test]
    fn rpc_hook_receives_json_channel() {
        use std::sync::{Arc, Mutex};

        #[derive(Default)]
        struct Recorder {
            actions: Arc<Mutex<Vec<String>>>,
            raw: Arc<Mutex<Vec<u32>>>,
        }
        impl RpcHandler for Recorder {
            fn on_private_osc(&mut self, command: u32, _payload: &[u8]) {
                self.raw.lock().unwrap().push(command);
            }
            fn on_rpc(&mut self, request: RpcRequest) {
                self.actions.lock().unwrap().push(request.action);
            }
        }

        let actions = Arc::new(Mutex::new(Vec::new()));
        let raw = Arc::new(Mutex::new(Vec::new()));
        let mut term = engine();
        term.set_rpc_handler(Box::new(Recorder {
            actions: Arc::clone(&actions),
            raw: Arc::clone(&raw),
        }));
        term.write(b"\x1b]1010;{\"action\":\"open-door\",\"which\":3}\x1b\\");
        term.write(b"\x1b]1234;payload\x1b\\");
        // Malformed JSON is dropped silently.
        term.write(b"\x1b]1010;not json\x1b\\");
        assert_eq!(actions.lock().unwrap().as_slice(), ["open-door"]);
        assert_eq!(raw.lock().unwrap().as_slice(), [1234]);
    }

    #[test]
    fn resize_preserves_content_and_rejects_zero() {
        let mut term = TerminalEngine::new(4, 2, 10);
        term.write(b"hi");
        term.resize(8, 4).unwrap();
        assert_eq!(term.screen().line(0).text(), "hi");
        assert!(matches!(
            term.resize(0, 4),
            Err(Error::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn shrink_resize_retires_rows_to_scrollback() {
        let mut term = TerminalEngine::new(4, 3, 10);
        term.write(b"L0\r\nL1\r\nL2");
        term.resize(4, 2).unwrap();
        assert_eq!(term.scrollback().len(), 1);
        assert_eq!(term.scrollback().get(0).unwrap().text(), "L0");
    }

    #[test]
    fn dec_graphics_charset_maps_line_drawing() {
        let mut term = engine();
        term.write(b"\x1b(0qx\x1b(Bq");
        let line = term.screen().line(0);
        assert_eq!(line.cells[0].ch, '─');
        assert_eq!(line.cells[1].ch, '│');
        assert_eq!(line.cells[2].ch, 'q');
    }

    #[test]
    fn repeat_last_character() {
        let mut term = engine();
        term.write(b"x\x1b[3b");
        assert_eq!(term.screen().line(0).text(), "xxxx");
    }

    #[test]
    fn insert_mode_shifts_existing_text() {
        let mut term = TerminalEngine::new(8, 1, 0);
        term.write(b"abc\x1b[1;1H\x1b[4hXY\x1b[4l");
        assert_eq!(term.screen().line(0).text(), "XYabc");
    }

    #[test]
    fn split_feed_equals_whole_feed() {
        let stream: &[u8] = b"\x1b[2J\x1b[3;4Hws \x1b[1;31mred\x1b[0m\x1b]2;t\x07\xe4\xb8\xad";
        let mut whole = TerminalEngine::new(20, 5, 10);
        whole.write(stream);

        for chunk_size in [1usize, 2, 3, 5] {
            let mut split = TerminalEngine::new(20, 5, 10);
            for chunk in stream.chunks(chunk_size) {
                split.write(chunk);
            }
            for row in 0..5 {
                assert_eq!(
                    split.screen().line(row).text(),
                    whole.screen().line(row).text(),
                    "row {row} chunk {chunk_size}"
                );
            }
            assert_eq!(split.cursor(), whole.cursor());
            assert_eq!(split.title(), whole.title());
        }
    }

    #[test]
    fn cursor_style_report() {
        let mut term = engine();
        term.write(b"\x1b[6 q\x1bP$q q\x1b\\");
        assert_eq!(responses_string(&mut term), "\x1bP1$r6 q\x1b\\");
        assert_eq!(term.cursor().shape, CursorShape::Bar);
    }
}
