//! Byte-level escape-sequence parser.
//!
//! A deterministic state machine over the VT500 parser states (Williams)
//! that turns a raw byte stream into print, control, ESC, CSI, OSC, and DCS
//! dispatches. The parser owns its buffers and keeps state across calls, so
//! any sequence may be split at any byte boundary: feeding a stream in
//! chunks produces exactly the same dispatches as feeding it whole.
//!
//! C0 controls that arrive in the middle of a sequence are executed
//! immediately without abandoning the sequence, except ESC (restarts) and
//! CAN/SUB (cancel). OSC, DCS, SOS, PM, and APC strings terminate on BEL or
//! ST (`ESC \` or 0x9C). UTF-8 is decoded in ground state; malformed or
//! overlong input prints U+FFFD and resynchronizes at the next valid byte.

pub mod csi;
pub mod dcs;
pub mod osc;
pub mod sgr;

/// Hard cap on CSI/DCS parameters; sequences exceeding it are discarded.
pub const CSI_MAX_PARAMS: usize = 16;
/// Hard cap on an accumulated OSC payload; larger payloads are discarded.
pub const OSC_MAX_PAYLOAD: usize = 4 * 1024 * 1024;

const MAX_INTERMEDIATES: usize = 2;

/// Receiver for parser dispatches. Implemented by the terminal engine.
pub trait Dispatch {
    /// A decoded printable codepoint.
    fn print(&mut self, ch: char);
    /// A C0 control byte.
    fn execute(&mut self, byte: u8);
    /// A two-byte (or intermediate-prefixed) escape sequence.
    fn esc_dispatch(&mut self, intermediates: &[u8], byte: u8);
    /// A complete CSI sequence.
    fn csi_dispatch(
        &mut self,
        private: Option<u8>,
        params: &Params,
        intermediates: &[u8],
        final_byte: u8,
    );
    /// A complete OSC string (raw payload, terminator stripped).
    fn osc_dispatch(&mut self, payload: &[u8]);
    /// Start of a DCS passthrough.
    fn dcs_hook(&mut self, params: &Params, intermediates: &[u8], final_byte: u8);
    /// One byte of DCS passthrough data.
    fn dcs_put(&mut self, byte: u8);
    /// End of a DCS passthrough.
    fn dcs_unhook(&mut self);
}

/// CSI/DCS parameter list. Each parameter is a run of colon-separated
/// sub-parameters; an omitted parameter list stays empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    params: Vec<Vec<u16>>,
}

impl Params {
    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    /// First sub-parameter of the parameter at `idx`.
    pub fn get(&self, idx: usize) -> Option<u16> {
        self.params.get(idx).and_then(|p| p.first().copied())
    }

    /// Parameter value, or `default` when omitted.
    pub fn get_or(&self, idx: usize, default: u16) -> u16 {
        self.get(idx).unwrap_or(default)
    }

    /// Parameter value, treating both omission and 0 as `default`. This is
    /// the common CSI convention for count arguments.
    pub fn get_nonzero_or(&self, idx: usize, default: u16) -> u16 {
        match self.get(idx) {
            Some(0) | None => default,
            Some(v) => v,
        }
    }

    /// The full sub-parameter run at `idx`.
    pub fn subparams(&self, idx: usize) -> &[u16] {
        self.params.get(idx).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &[u16]> {
        self.params.iter().map(Vec::as_slice)
    }

    /// First sub-parameter of every parameter, for mode lists.
    pub fn to_vec(&self) -> Vec<u16> {
        self.params
            .iter()
            .map(|p| p.first().copied().unwrap_or(0))
            .collect()
    }
}

impl From<&[u16]> for Params {
    fn from(values: &[u16]) -> Self {
        Self {
            params: values.iter().map(|&v| vec![v]).collect(),
        }
    }
}

impl From<Vec<Vec<u16>>> for Params {
    fn from(params: Vec<Vec<u16>>) -> Self {
        Self { params }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    CsiIgnore,
    OscString,
    DcsEntry,
    DcsParam,
    DcsIntermediate,
    DcsPassthrough,
    SosPmApcString,
    Utf8Continuation,
}

/// Parser state held across `feed` calls.
#[derive(Debug)]
pub struct Parser {
    state: State,
    intermediates: Vec<u8>,
    private: Option<u8>,
    params: Vec<Vec<u16>>,
    cur_param: Vec<u16>,
    cur_value: u16,
    cur_has_value: bool,
    param_seen: bool,
    osc: Vec<u8>,
    osc_overflow: bool,
    utf8_buf: Vec<u8>,
    utf8_remaining: u8,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::Ground,
            intermediates: Vec::new(),
            private: None,
            params: Vec::new(),
            cur_param: Vec::new(),
            cur_value: 0,
            cur_has_value: false,
            param_seen: false,
            osc: Vec::new(),
            osc_overflow: false,
            utf8_buf: Vec::with_capacity(4),
            utf8_remaining: 0,
        }
    }

    /// Feed a chunk of bytes, dispatching as sequences complete.
    pub fn feed(&mut self, dispatch: &mut impl Dispatch, bytes: &[u8]) {
        for &b in bytes {
            self.advance(dispatch, b);
        }
    }

    /// Advance the state machine by one byte.
    pub fn advance(&mut self, dispatch: &mut impl Dispatch, byte: u8) {
        match self.state {
            State::Ground => self.advance_ground(dispatch, byte),
            State::Escape => self.advance_escape(dispatch, byte),
            State::CsiEntry => self.advance_csi_entry(dispatch, byte),
            State::CsiParam => self.advance_csi_param(dispatch, byte),
            State::CsiIntermediate => self.advance_csi_intermediate(dispatch, byte),
            State::CsiIgnore => self.advance_csi_ignore(dispatch, byte),
            State::OscString => self.advance_osc(dispatch, byte),
            State::DcsEntry | State::DcsParam => self.advance_dcs_param(dispatch, byte),
            State::DcsIntermediate => self.advance_dcs_intermediate(dispatch, byte),
            State::DcsPassthrough => self.advance_dcs_passthrough(dispatch, byte),
            State::SosPmApcString => self.advance_sos_pm_apc(byte),
            State::Utf8Continuation => self.advance_utf8(dispatch, byte),
        }
    }

    fn enter_escape(&mut self) {
        self.state = State::Escape;
        self.intermediates.clear();
    }

    fn clear_sequence(&mut self) {
        self.intermediates.clear();
        self.private = None;
        self.params.clear();
        self.cur_param.clear();
        self.cur_value = 0;
        self.cur_has_value = false;
        self.param_seen = false;
    }

    // ── Ground & UTF-8 ──────────────────────────────────────────────

    fn advance_ground(&mut self, dispatch: &mut impl Dispatch, byte: u8) {
        match byte {
            0x1b => self.enter_escape(),
            0x00..=0x1f => dispatch.execute(byte),
            0x20..=0x7e => dispatch.print(byte as char),
            0x7f => {}
            0xc2..=0xdf => self.start_utf8(byte, 1),
            0xe0..=0xef => self.start_utf8(byte, 2),
            0xf0..=0xf4 => self.start_utf8(byte, 3),
            // Stray continuation or invalid lead byte.
            _ => dispatch.print(char::REPLACEMENT_CHARACTER),
        }
    }

    fn start_utf8(&mut self, lead: u8, remaining: u8) {
        self.utf8_buf.clear();
        self.utf8_buf.push(lead);
        self.utf8_remaining = remaining;
        self.state = State::Utf8Continuation;
    }

    fn advance_utf8(&mut self, dispatch: &mut impl Dispatch, byte: u8) {
        if (0x80..=0xbf).contains(&byte) {
            self.utf8_buf.push(byte);
            self.utf8_remaining -= 1;
            if self.utf8_remaining == 0 {
                let ch = std::str::from_utf8(&self.utf8_buf)
                    .ok()
                    .and_then(|s| s.chars().next())
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                dispatch.print(ch);
                self.state = State::Ground;
            }
        } else {
            // Truncated sequence; resynchronize on this byte.
            dispatch.print(char::REPLACEMENT_CHARACTER);
            self.state = State::Ground;
            self.advance(dispatch, byte);
        }
    }

    // ── Escape ──────────────────────────────────────────────────────

    fn advance_escape(&mut self, dispatch: &mut impl Dispatch, byte: u8) {
        match byte {
            0x18 | 0x1a => {
                dispatch.execute(byte);
                self.state = State::Ground;
            }
            0x1b => self.enter_escape(),
            0x00..=0x1f => dispatch.execute(byte),
            0x20..=0x2f => {
                if self.intermediates.len() < MAX_INTERMEDIATES {
                    self.intermediates.push(byte);
                }
            }
            b'[' => {
                self.clear_sequence();
                self.state = State::CsiEntry;
            }
            b']' => {
                self.osc.clear();
                self.osc_overflow = false;
                self.state = State::OscString;
            }
            b'P' => {
                self.clear_sequence();
                self.state = State::DcsEntry;
            }
            b'X' | b'^' | b'_' => self.state = State::SosPmApcString,
            0x30..=0x7e => {
                dispatch.esc_dispatch(&self.intermediates, byte);
                self.state = State::Ground;
            }
            _ => {}
        }
    }

    // ── CSI ─────────────────────────────────────────────────────────

    /// Handle a C0 byte inside a control sequence. Returns true when the
    /// byte was consumed.
    fn sequence_c0(&mut self, dispatch: &mut impl Dispatch, byte: u8) -> bool {
        match byte {
            0x18 | 0x1a => {
                self.state = State::Ground;
                true
            }
            0x1b => {
                self.enter_escape();
                true
            }
            0x00..=0x1f => {
                dispatch.execute(byte);
                true
            }
            _ => false,
        }
    }

    fn push_subparam(&mut self) {
        let value = if self.cur_has_value { self.cur_value } else { 0 };
        if self.cur_param.len() < CSI_MAX_PARAMS {
            self.cur_param.push(value);
        }
        self.cur_value = 0;
        self.cur_has_value = false;
    }

    /// Accumulate a parameter byte. Returns false on overflow, in which
    /// case the remainder of the sequence must be discarded.
    fn accumulate_param(&mut self, byte: u8) -> bool {
        self.param_seen = true;
        match byte {
            b'0'..=b'9' => {
                self.cur_value = self
                    .cur_value
                    .saturating_mul(10)
                    .saturating_add(u16::from(byte - b'0'));
                self.cur_has_value = true;
                true
            }
            b':' => {
                self.push_subparam();
                true
            }
            b';' => {
                self.push_subparam();
                if self.params.len() >= CSI_MAX_PARAMS {
                    return false;
                }
                self.params.push(std::mem::take(&mut self.cur_param));
                true
            }
            _ => true,
        }
    }

    fn finish_params(&mut self) -> Params {
        if self.param_seen {
            self.push_subparam();
            self.params.push(std::mem::take(&mut self.cur_param));
        }
        Params {
            params: std::mem::take(&mut self.params),
        }
    }

    fn dispatch_csi(&mut self, dispatch: &mut impl Dispatch, final_byte: u8) {
        let params = self.finish_params();
        dispatch.csi_dispatch(self.private, &params, &self.intermediates, final_byte);
        self.state = State::Ground;
    }

    fn advance_csi_entry(&mut self, dispatch: &mut impl Dispatch, byte: u8) {
        if self.sequence_c0(dispatch, byte) {
            return;
        }
        match byte {
            0x20..=0x2f => {
                self.intermediates.push(byte);
                self.state = State::CsiIntermediate;
            }
            b'0'..=b'9' | b';' | b':' => {
                if self.accumulate_param(byte) {
                    self.state = State::CsiParam;
                } else {
                    self.state = State::CsiIgnore;
                }
            }
            0x3c..=0x3f => {
                self.private = Some(byte);
                self.state = State::CsiParam;
            }
            0x40..=0x7e => self.dispatch_csi(dispatch, byte),
            _ => {}
        }
    }

    fn advance_csi_param(&mut self, dispatch: &mut impl Dispatch, byte: u8) {
        if self.sequence_c0(dispatch, byte) {
            return;
        }
        match byte {
            b'0'..=b'9' | b';' | b':' => {
                if !self.accumulate_param(byte) {
                    self.state = State::CsiIgnore;
                }
            }
            0x20..=0x2f => {
                self.intermediates.push(byte);
                self.state = State::CsiIntermediate;
            }
            0x3c..=0x3f => self.state = State::CsiIgnore,
            0x40..=0x7e => self.dispatch_csi(dispatch, byte),
            _ => {}
        }
    }

    fn advance_csi_intermediate(&mut self, dispatch: &mut impl Dispatch, byte: u8) {
        if self.sequence_c0(dispatch, byte) {
            return;
        }
        match byte {
            0x20..=0x2f => {
                if self.intermediates.len() < MAX_INTERMEDIATES {
                    self.intermediates.push(byte);
                } else {
                    self.state = State::CsiIgnore;
                }
            }
            0x30..=0x3f => self.state = State::CsiIgnore,
            0x40..=0x7e => self.dispatch_csi(dispatch, byte),
            _ => {}
        }
    }

    fn advance_csi_ignore(&mut self, dispatch: &mut impl Dispatch, byte: u8) {
        if self.sequence_c0(dispatch, byte) {
            return;
        }
        if (0x40..=0x7e).contains(&byte) {
            self.state = State::Ground;
        }
    }

    // ── DCS ─────────────────────────────────────────────────────────

    fn advance_dcs_param(&mut self, dispatch: &mut impl Dispatch, byte: u8) {
        match byte {
            0x18 | 0x1a => self.state = State::Ground,
            0x1b => self.enter_escape(),
            0x00..=0x1f | 0x7f => {}
            b'0'..=b'9' | b';' | b':' => {
                if self.accumulate_param(byte) {
                    self.state = State::DcsParam;
                } else {
                    // Discard the rest of the malformed string.
                    self.state = State::SosPmApcString;
                }
            }
            0x3c..=0x3f if self.state == State::DcsEntry && !self.param_seen => {
                self.private = Some(byte);
                self.state = State::DcsParam;
            }
            0x20..=0x2f => {
                self.intermediates.push(byte);
                self.state = State::DcsIntermediate;
            }
            0x40..=0x7e => {
                let params = self.finish_params();
                dispatch.dcs_hook(&params, &self.intermediates, byte);
                self.state = State::DcsPassthrough;
            }
            _ => self.state = State::SosPmApcString,
        }
    }

    fn advance_dcs_intermediate(&mut self, dispatch: &mut impl Dispatch, byte: u8) {
        match byte {
            0x18 | 0x1a => self.state = State::Ground,
            0x1b => self.enter_escape(),
            0x00..=0x1f | 0x7f => {}
            0x20..=0x2f => {
                if self.intermediates.len() < MAX_INTERMEDIATES {
                    self.intermediates.push(byte);
                } else {
                    self.state = State::SosPmApcString;
                }
            }
            0x30..=0x3f => self.state = State::SosPmApcString,
            0x40..=0x7e => {
                let params = self.finish_params();
                dispatch.dcs_hook(&params, &self.intermediates, byte);
                self.state = State::DcsPassthrough;
            }
            _ => self.state = State::SosPmApcString,
        }
    }

    fn advance_dcs_passthrough(&mut self, dispatch: &mut impl Dispatch, byte: u8) {
        match byte {
            0x18 | 0x1a => {
                dispatch.dcs_unhook();
                self.state = State::Ground;
            }
            0x1b => {
                dispatch.dcs_unhook();
                self.enter_escape();
            }
            0x07 | 0x9c => {
                dispatch.dcs_unhook();
                self.state = State::Ground;
            }
            _ => dispatch.dcs_put(byte),
        }
    }

    // ── OSC / SOS / PM / APC ────────────────────────────────────────

    fn advance_osc(&mut self, dispatch: &mut impl Dispatch, byte: u8) {
        match byte {
            0x07 | 0x9c => {
                self.osc_end(dispatch);
                self.state = State::Ground;
            }
            0x1b => {
                self.osc_end(dispatch);
                self.enter_escape();
            }
            0x18 | 0x1a => {
                self.osc.clear();
                self.state = State::Ground;
            }
            0x00..=0x1f => {}
            _ => {
                if self.osc.len() < OSC_MAX_PAYLOAD {
                    self.osc.push(byte);
                } else {
                    self.osc_overflow = true;
                }
            }
        }
    }

    fn osc_end(&mut self, dispatch: &mut impl Dispatch) {
        if !self.osc_overflow {
            dispatch.osc_dispatch(&self.osc);
        }
        self.osc.clear();
        self.osc_overflow = false;
    }

    fn advance_sos_pm_apc(&mut self, byte: u8) {
        match byte {
            0x07 | 0x9c | 0x18 | 0x1a => self.state = State::Ground,
            0x1b => self.enter_escape(),
            _ => {}
        }
    }
}
