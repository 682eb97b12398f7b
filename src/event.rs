use serde::Serialize;

use crate::pty::session::SessionId;
use crate::terminal::modes::TerminalModes;

/// Events emitted by the terminal engine, drained by the session owner
/// after each `write` call.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type")]
pub enum TerminalEvent {
    /// Something on the active screen changed; the range is the smallest
    /// bounding row span that needs repainting.
    ScreenUpdated { first_row: u16, last_row: u16 },
    /// Terminal title changed (via OSC 0 or OSC 2)
    TitleChanged { title: String },
    /// Icon name changed (via OSC 0 or OSC 1)
    IconChanged { name: String },
    /// Bell character received
    Bell,
    /// Entered alternate screen buffer (e.g. vim, less)
    AltScreenEntered,
    /// Exited alternate screen buffer
    AltScreenExited,
    /// Scrollback buffer was cleared (CSI 3J)
    ScrollbackCleared,
    /// Input-relevant mode flags changed
    ModeChanged {
        tracking: bool,
        motion: bool,
        all_motion: bool,
        sgr: bool,
        utf8: bool,
        focus: bool,
        alt_scroll: bool,
        synchronized_output: bool,
        bracketed_paste: bool,
        cursor_keys_application: bool,
    },
    /// A hyperlink was attached via OSC 8
    HyperlinkRegistered { id: u32, uri: String },
    /// The child asked to write the host clipboard (OSC 52)
    ClipboardWrite { selection: String, text: String },
    /// The child asked for the host clipboard contents (OSC 52 query)
    PasteRequest { selection: String },
}

impl TerminalEvent {
    pub(crate) fn mode_changed(modes: &TerminalModes) -> Self {
        TerminalEvent::ModeChanged {
            tracking: modes.mouse_tracking,
            motion: modes.mouse_motion,
            all_motion: modes.mouse_all_motion,
            sgr: modes.sgr_mouse,
            utf8: modes.utf8_mouse,
            focus: modes.focus_events,
            alt_scroll: modes.alternate_scroll,
            synchronized_output: modes.synchronized_output,
            bracketed_paste: modes.bracketed_paste,
            cursor_keys_application: modes.cursor_keys_application,
        }
    }
}

/// Events delivered to the host over the session event channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum HostEvent {
    /// An engine event from one session.
    Terminal {
        session_id: SessionId,
        event: TerminalEvent,
    },
    /// A session's child process exited.
    SessionExited {
        session_id: SessionId,
        exit_code: Option<i32>,
    },
    /// The session manager's active session changed.
    ActiveChanged { session_id: Option<SessionId> },
}
