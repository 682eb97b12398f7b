//! Session manager: a collection of terminal sessions with an active
//! pointer, sharing one host event channel.

use std::collections::HashMap;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::config::{Config, LaunchOptions};
use crate::event::HostEvent;
use crate::input::{Key, Modifiers, MouseEvent};
use crate::pty::{Session, SessionId};
use crate::{Error, Result};

struct Inner {
    sessions: HashMap<SessionId, Session>,
    /// Insertion order, for round-robin switching.
    order: Vec<SessionId>,
    active: Option<SessionId>,
    default_launch: LaunchOptions,
    scrollback_lines: usize,
    /// Last dimensions reported by the front-end; new sessions start here.
    last_dim: (u16, u16),
}

/// Owns all sessions. Mutating operations are serialized under one lock;
/// the per-session reader threads never take it.
pub struct SessionManager {
    inner: Mutex<Inner>,
    events_tx: Sender<HostEvent>,
    events_rx: Receiver<HostEvent>,
}

impl SessionManager {
    pub fn new(config: Config) -> Self {
        let (events_tx, events_rx) = unbounded();
        Self {
            inner: Mutex::new(Inner {
                sessions: HashMap::new(),
                order: Vec::new(),
                active: None,
                default_launch: config.launch,
                scrollback_lines: config.scrollback_lines,
                last_dim: (config.cols.max(1), config.rows.max(1)),
            }),
            events_tx,
            events_rx,
        }
    }

    /// The host's end of the event channel. Sessions and the manager both
    /// publish here.
    pub fn events(&self) -> Receiver<HostEvent> {
        self.events_rx.clone()
    }

    /// Spawn a new session from `options` merged with the default launch
    /// options. The first session becomes active.
    pub fn create(&self, options: Option<LaunchOptions>) -> Result<SessionId> {
        let mut inner = self.inner.lock();
        let launch = options
            .unwrap_or_default()
            .merged_with(&inner.default_launch);
        let (cols, rows) = inner.last_dim;
        let id = SessionId::new();
        let session = Session::spawn(
            id,
            cols,
            rows,
            inner.scrollback_lines,
            &launch,
            self.events_tx.clone(),
        )?;
        inner.sessions.insert(id, session);
        inner.order.push(id);
        if inner.active.is_none() {
            inner.active = Some(id);
            self.notify_active(Some(id));
        }
        Ok(id)
    }

    pub fn active(&self) -> Option<SessionId> {
        self.inner.lock().active
    }

    pub fn session_ids(&self) -> Vec<SessionId> {
        self.inner.lock().order.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn switch_to(&self, id: SessionId) -> Result<()> {
        let mut inner = self.inner.lock();
        if !inner.sessions.contains_key(&id) {
            return Err(Error::SessionNotFound(id));
        }
        if inner.active != Some(id) {
            inner.active = Some(id);
            self.notify_active(Some(id));
        }
        Ok(())
    }

    pub fn switch_next(&self) -> Option<SessionId> {
        self.rotate(1)
    }

    pub fn switch_prev(&self) -> Option<SessionId> {
        self.rotate(-1)
    }

    fn rotate(&self, step: isize) -> Option<SessionId> {
        let mut inner = self.inner.lock();
        let next = rotate_order(&inner.order, inner.active, step)?;
        if inner.active != Some(next) {
            inner.active = Some(next);
            self.notify_active(Some(next));
        }
        Some(next)
    }

    /// Shut the session down and remove it. If it was active, the next
    /// session in insertion order (if any) becomes active.
    pub fn close(&self, id: SessionId) -> Result<()> {
        let mut session = {
            let mut inner = self.inner.lock();
            let session = inner
                .sessions
                .remove(&id)
                .ok_or(Error::SessionNotFound(id))?;
            let position = inner.order.iter().position(|s| *s == id).unwrap_or(0);
            inner.order.retain(|s| *s != id);
            if inner.active == Some(id) {
                let next = if inner.order.is_empty() {
                    None
                } else {
                    Some(inner.order[position.min(inner.order.len() - 1)])
                };
                inner.active = next;
                self.notify_active(next);
            }
            session
        };
        // Kill outside the manager lock; shutdown joins the reader thread.
        session.shutdown();
        Ok(())
    }

    /// Close and re-create a session under the same id, keeping its slot in
    /// the switching order.
    pub fn restart(&self, id: SessionId, options: Option<LaunchOptions>) -> Result<()> {
        let (mut old, launch, cols, rows, scrollback) = {
            let mut inner = self.inner.lock();
            let old = inner
                .sessions
                .remove(&id)
                .ok_or(Error::SessionNotFound(id))?;
            let launch = options
                .unwrap_or_default()
                .merged_with(&inner.default_launch);
            let (cols, rows) = inner.last_dim;
            (old, launch, cols, rows, inner.scrollback_lines)
        };
        old.shutdown();
        drop(old);

        let session = Session::spawn(id, cols, rows, scrollback, &launch, self.events_tx.clone())?;
        self.inner.lock().sessions.insert(id, session);
        Ok(())
    }

    /// Resize the active session and remember the dimensions for future
    /// sessions. Rejects degenerate geometry before touching anything.
    pub fn resize_active(&self, cols: u16, rows: u16) -> Result<()> {
        if cols < 1 || rows < 1 {
            return Err(Error::InvalidGeometry { cols, rows });
        }
        let inner = &mut *self.inner.lock();
        inner.last_dim = (cols, rows);
        if let Some(id) = inner.active {
            if let Some(session) = inner.sessions.get(&id) {
                session.resize(cols, rows)?;
            }
        }
        Ok(())
    }

    pub fn write_input(&self, id: SessionId, bytes: &[u8]) -> Result<()> {
        self.with_session(id, |session| session.write_input(bytes))
    }

    pub fn send_key(&self, id: SessionId, key: Key, mods: Modifiers) -> Result<()> {
        self.with_session(id, |session| session.send_key(key, mods))
    }

    pub fn send_paste(&self, id: SessionId, text: &str) -> Result<()> {
        self.with_session(id, |session| session.send_paste(text))
    }

    pub fn send_mouse(&self, id: SessionId, event: &MouseEvent) -> Result<()> {
        self.with_session(id, |session| session.send_mouse(event))
    }

    /// Shared engine handle for a session, for viewport reads.
    pub fn engine(
        &self,
        id: SessionId,
    ) -> Result<std::sync::Arc<Mutex<crate::terminal::TerminalEngine>>> {
        self.with_session(id, |session| Ok(session.engine()))
    }

    fn with_session<R>(&self, id: SessionId, f: impl FnOnce(&Session) -> Result<R>) -> Result<R> {
        let inner = self.inner.lock();
        let session = inner.sessions.get(&id).ok_or(Error::SessionNotFound(id))?;
        f(session)
    }

    fn notify_active(&self, session_id: Option<SessionId>) {
        let _ = self.events_tx.send(HostEvent::ActiveChanged { session_id });
    }
}

/// Round-robin step over the insertion order.
fn rotate_order(order: &[SessionId], active: Option<SessionId>, step: isize) -> Option<SessionId> {
    if order.is_empty() {
        return None;
    }
    let len = order.len() as isize;
    let current = active
        .and_then(|id| order.iter().position(|s| *s == id))
        .map(|i| i as isize)
        .unwrap_or(0);
    let next = (current + step).rem_euclid(len);
    Some(order[next as usize])
}
