use std::io::{Read, Write};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crossbeam_channel::Sender;
use parking_lot::Mutex;

use crate::event::HostEvent;
use crate::terminal::TerminalEngine;

use super::session::SessionId;
use super::{SharedChild, SharedExitCode, SharedWriter};

/// Everything the reader thread needs; all handles are shared with the
/// owning session.
pub(crate) struct ReaderContext {
    pub engine: Arc<Mutex<TerminalEngine>>,
    pub writer: SharedWriter,
    pub child: SharedChild,
    pub exit_code: SharedExitCode,
    pub running: Arc<std::sync::atomic::AtomicBool>,
    pub events: Sender<HostEvent>,
    pub session_id: SessionId,
}

/// Spawn the background reader pump for one session.
///
/// Reads PTY output in chunks, applies each chunk to the engine, flushes
/// any queued query responses back to the PTY, and forwards engine events
/// to the host channel. Emits `SessionExited` exactly once, when the loop
/// ends.
pub(crate) fn spawn_reader(
    mut reader: Box<dyn Read + Send>,
    ctx: ReaderContext,
) -> std::thread::JoinHandle<()> {
    std::thread::Builder::new()
        .name(format!("pty-reader-{}", ctx.session_id.short()))
        .spawn(move || {
            let mut buf = [0u8; 4096];

            while ctx.running.load(Ordering::Acquire) {
                match reader.read(&mut buf) {
                    Ok(0) => {
                        tracing::info!("PTY reader EOF for session {}", ctx.session_id.short());
                        capture_exit_code(&ctx);
                        ctx.running.store(false, Ordering::Release);
                        break;
                    }
                    Ok(n) => {
                        let mut engine = ctx.engine.lock();
                        engine.write(&buf[..n]);
                        let responses = engine.take_pending_responses();
                        let events = engine.take_events();
                        drop(engine);

                        if !responses.is_empty() {
                            let mut writer = ctx.writer.lock();
                            for response in &responses {
                                let _ = writer.write_all(response);
                            }
                            let _ = writer.flush();
                        }
                        for event in events {
                            let _ = ctx.events.send(HostEvent::Terminal {
                                session_id: ctx.session_id,
                                event,
                            });
                        }
                    }
                    Err(err) => {
                        if ctx.running.load(Ordering::Acquire) {
                            tracing::error!(
                                "PTY read error for session {}: {}",
                                ctx.session_id.short(),
                                err
                            );
                        }
                        capture_exit_code(&ctx);
                        ctx.running.store(false, Ordering::Release);
                        break;
                    }
                }
            }

            let exit_code = *ctx.exit_code.lock();
            let _ = ctx.events.send(HostEvent::SessionExited {
                session_id: ctx.session_id,
                exit_code,
            });
        })
        .expect("failed to spawn PTY reader thread")
}

fn capture_exit_code(ctx: &ReaderContext) {
    if let Ok(Some(status)) = ctx.child.lock().try_wait() {
        let mut slot = ctx.exit_code.lock();
        if slot.is_none() {
            *slot = Some(status.exit_code() as i32);
            tracing::info!(
                "session {} exited with code {}",
                ctx.session_id.short(),
                status.exit_code()
            );
        }
    }
}
