use std::fmt;
use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LaunchOptions;
use crate::event::HostEvent;
use crate::input::{Key, Modifiers, MouseEvent};
use crate::terminal::TerminalEngine;
use crate::Result;

use super::reader::{self, ReaderContext};
use super::PtyBridge;

/// Opaque session identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Short prefix for log lines.
    pub(crate) fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Starting,
    Running,
    Exited,
}

/// A live terminal session: one engine wired to one PTY bridge.
///
/// The reader thread feeds PTY output into the engine, flushes device-query
/// responses back to the child, and forwards engine events to the host
/// channel. Input goes the other way through the bridge's shared writer.
pub struct Session {
    id: SessionId,
    engine: Arc<Mutex<TerminalEngine>>,
    bridge: PtyBridge,
}

impl Session {
    /// Spawn the child and start the reader pump.
    pub(crate) fn spawn(
        id: SessionId,
        cols: u16,
        rows: u16,
        scrollback_lines: usize,
        launch: &LaunchOptions,
        events: Sender<HostEvent>,
    ) -> Result<Self> {
        let (mut bridge, pty_reader) = PtyBridge::start(cols, rows, launch)?;
        let engine = Arc::new(Mutex::new(TerminalEngine::new(cols, rows, scrollback_lines)));

        let handle = reader::spawn_reader(
            pty_reader,
            ReaderContext {
                engine: Arc::clone(&engine),
                writer: bridge.writer(),
                child: bridge.child(),
                exit_code: bridge.exit_code(),
                running: bridge.running(),
                events,
                session_id: id,
            },
        );
        bridge.set_reader_handle(handle);

        tracing::info!("created session {} ({}x{})", id.short(), cols, rows);
        Ok(Self { id, engine, bridge })
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Shared engine handle for render snapshots and introspection.
    pub fn engine(&self) -> Arc<Mutex<TerminalEngine>> {
        Arc::clone(&self.engine)
    }

    pub fn title(&self) -> String {
        self.engine.lock().title().to_string()
    }

    pub fn state(&self) -> SessionState {
        if self.exit_code().is_some() || !self.bridge.is_running() {
            SessionState::Exited
        } else {
            SessionState::Running
        }
    }

    pub fn exit_code(&self) -> Option<i32> {
        *self.bridge.exit_code().lock()
    }

    /// Write raw bytes to the child's stdin.
    pub fn write_input(&self, bytes: &[u8]) -> Result<()> {
        self.bridge.write(bytes)
    }

    /// Encode a key event per the engine's mode state and send it.
    pub fn send_key(&self, key: Key, mods: Modifiers) -> Result<()> {
        let bytes = {
            let mut engine = self.engine.lock();
            engine.input_key(key, mods);
            engine.take_pending_input()
        };
        self.forward_input(bytes)
    }

    pub fn send_paste(&self, text: &str) -> Result<()> {
        let bytes = {
            let mut engine = self.engine.lock();
            engine.input_paste(text);
            engine.take_pending_input()
        };
        self.forward_input(bytes)
    }

    pub fn send_mouse(&self, event: &MouseEvent) -> Result<()> {
        let bytes = {
            let mut engine = self.engine.lock();
            engine.input_mouse(event);
            engine.take_pending_input()
        };
        self.forward_input(bytes)
    }

    fn forward_input(&self, bytes: Vec<u8>) -> Result<()> {
        if bytes.is_empty() {
            return Ok(());
        }
        self.bridge.write(&bytes)
    }

    /// Resize the grid and the PTY.
    ///
    /// The grid is resized first, while holding the engine lock, so the
    /// reader thread never parses bytes against stale dimensions.
    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        let mut engine = self.engine.lock();
        engine.resize(cols, rows)?;
        self.bridge.resize(cols, rows)?;
        Ok(())
    }

    /// Terminate the child and join the reader. Idempotent.
    pub fn shutdown(&mut self) {
        self.bridge.shutdown();
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.shutdown();
    }
}
