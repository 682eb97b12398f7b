pub mod reader;
pub mod session;

pub use session::{Session, SessionId, SessionState};

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use portable_pty::{native_pty_system, Child, CommandBuilder, MasterPty, PtySize};

use crate::config::LaunchOptions;
use crate::{Error, Result};

/// Shared writer handle so both the session (keyboard input) and the reader
/// thread (DSR/DA responses) can write to the PTY.
pub type SharedWriter = Arc<Mutex<Box<dyn Write + Send>>>;

/// Shared slot for the child process exit code, written by the reader
/// thread when it detects EOF.
pub type SharedExitCode = Arc<Mutex<Option<i32>>>;

/// Shared child handle so the reader thread can call `try_wait` after EOF.
pub type SharedChild = Arc<Mutex<Box<dyn Child + Send + Sync>>>;

/// A child process connected through a pseudo-terminal: writer, resize,
/// and shutdown. The read side is handed to the reader thread at start.
pub struct PtyBridge {
    /// Master PTY handle (Option so it can be dropped before thread join).
    master: Option<Box<dyn MasterPty + Send>>,
    child: SharedChild,
    writer: SharedWriter,
    running: Arc<AtomicBool>,
    exit_code: SharedExitCode,
    reader_handle: Option<std::thread::JoinHandle<()>>,
}

impl PtyBridge {
    /// Spawn the child attached to a new PTY. Returns the bridge and the
    /// read end, which must be transferred to the reader task.
    pub fn start(
        cols: u16,
        rows: u16,
        launch: &LaunchOptions,
    ) -> Result<(Self, Box<dyn Read + Send>)> {
        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::SpawnFailed(e.to_string()))?;

        let program = launch
            .command
            .clone()
            .filter(|c| !c.is_empty())
            .unwrap_or_else(default_shell);
        let mut cmd = CommandBuilder::new(&program);
        for arg in &launch.args {
            cmd.arg(arg);
        }
        if let Some(dir) = &launch.cwd {
            cmd.cwd(dir);
        } else if let Some(home) = dirs::home_dir() {
            cmd.cwd(home);
        }
        cmd.env("TERM", "xterm-256color");
        cmd.env("COLORTERM", "truecolor");
        for (key, value) in &launch.env {
            let key = key.trim();
            if !key.is_empty() {
                cmd.env(key, value);
            }
        }

        let child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| Error::SpawnFailed(e.to_string()))?;
        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| Error::SpawnFailed(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| Error::SpawnFailed(e.to_string()))?;

        let bridge = Self {
            master: Some(pair.master),
            child: Arc::new(Mutex::new(child)),
            writer: Arc::new(Mutex::new(writer)),
            running: Arc::new(AtomicBool::new(true)),
            exit_code: Arc::new(Mutex::new(None)),
            reader_handle: None,
        };
        Ok((bridge, reader))
    }

    pub fn writer(&self) -> SharedWriter {
        Arc::clone(&self.writer)
    }

    pub fn child(&self) -> SharedChild {
        Arc::clone(&self.child)
    }

    pub fn running(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn exit_code(&self) -> SharedExitCode {
        Arc::clone(&self.exit_code)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub(crate) fn set_reader_handle(&mut self, handle: std::thread::JoinHandle<()>) {
        self.reader_handle = Some(handle);
    }

    /// Push bytes to the child's stdin. Writes are serialized on the
    /// shared writer lock.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.write_all(bytes)?;
        writer.flush()?;
        Ok(())
    }

    pub fn resize(&self, cols: u16, rows: u16) -> Result<()> {
        self.master
            .as_ref()
            .ok_or_else(|| Error::Io(std::io::Error::other("pty master already closed")))?
            .resize(PtySize {
                rows,
                cols,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))
    }

    /// Terminate the child, close the PTY handles, and join the reader.
    /// Idempotent.
    pub fn shutdown(&mut self) {
        self.running.store(false, Ordering::Release);

        {
            let mut child = self.child.lock();
            // portable-pty's `kill` delivers SIGHUP on Unix, so shells get a
            // chance to run their exit hooks before we escalate.
            let _ = child.kill();
            match reap_with_grace(child.as_mut(), SHUTDOWN_GRACE) {
                Some(status) => {
                    let mut slot = self.exit_code.lock();
                    if slot.is_none() {
                        *slot = Some(status.exit_code() as i32);
                    }
                }
                None => force_kill(child.as_mut()),
            }
        }

        // Close the master fd so the reader thread's blocking read returns
        // EOF and the join below cannot hang.
        drop(self.master.take());

        if let Some(handle) = self.reader_handle.take() {
            let _ = handle.join();
        }
    }
}

/// How long `shutdown` waits for the child to exit on its own.
const SHUTDOWN_GRACE: std::time::Duration = std::time::Duration::from_millis(250);
/// Interval between `try_wait` polls while waiting out the grace period.
const REAP_POLL: std::time::Duration = std::time::Duration::from_millis(15);

/// Poll `try_wait` until the child is reaped or the grace period lapses.
fn reap_with_grace(
    child: &mut (dyn Child + Send + Sync),
    grace: std::time::Duration,
) -> Option<portable_pty::ExitStatus> {
    let start = std::time::Instant::now();
    loop {
        if let Ok(Some(status)) = child.try_wait() {
            return Some(status);
        }
        if start.elapsed() >= grace {
            return None;
        }
        std::thread::sleep(REAP_POLL);
    }
}

/// Escalate to SIGKILL. The PTY child leads its own session, so signaling
/// the negated pid takes the whole group; the direct signal covers a child
/// that moved itself to another group.
fn force_kill(child: &mut (dyn Child + Send + Sync)) {
    #[cfg(unix)]
    if let Some(pid) = child.process_id() {
        unsafe {
            libc::kill(-(pid as i32), libc::SIGKILL);
            libc::kill(pid as i32, libc::SIGKILL);
        }
    }
    let _ = child.try_wait();
}

impl Drop for PtyBridge {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Resolve the default shell: `$SHELL`, falling back to `/bin/sh`.
fn default_shell() -> String {
    match std::env::var("SHELL") {
        Ok(shell) if !shell.is_empty() => shell,
        _ => "/bin/sh".to_string(),
    }
}
