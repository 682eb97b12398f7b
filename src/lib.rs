//! A headless VT100/xterm-compatible terminal emulator engine.
//!
//! The crate consumes the byte stream of a child process running through a
//! pseudo-terminal, maintains the full state of a virtual character
//! terminal (styled cell grid, cursor, modes, scrollback, alternate
//! screen), and exposes that state for a host front-end to paint. Input
//! goes the other way: key, paste, and mouse events are encoded per the
//! current mode state and written to the child's stdin.
//!
//! The layers, bottom-up:
//!
//! - [`parser`]: byte-level escape-sequence state machine and per-family
//!   classifiers (CSI, SGR, OSC, DCS).
//! - [`terminal`]: the screen model ([`terminal::ScreenBuffer`],
//!   [`terminal::ScrollbackStore`], [`terminal::DualScreen`]) and the
//!   orchestrating [`terminal::TerminalEngine`].
//! - [`input`]: key/paste/mouse encoding toward the child.
//! - [`pty`]: the child process bridge and per-session reader pump.
//! - [`session`]: the session manager the host embeds.

pub mod config;
pub mod error;
pub mod event;
pub mod input;
pub mod parser;
pub mod pty;
pub mod session;
pub mod terminal;

pub use config::{Config, LaunchOptions};
pub use error::{Error, Result};
pub use event::{HostEvent, TerminalEvent};
pub use input::{Key, Modifiers, MouseButton, MouseEvent, MouseEventKind};
pub use pty::{PtyBridge, Session, SessionId, SessionState};
pub use session::SessionManager;
pub use terminal::{RpcHandler, RpcRequest, TerminalEngine};
