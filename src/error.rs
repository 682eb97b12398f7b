use crate::pty::session::SessionId;

/// Errors surfaced by the public API. Parsing and semantic errors never
/// appear here; they are absorbed by the engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to spawn child process: {0}")]
    SpawnFailed(String),

    #[error("pty i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("invalid terminal geometry: {cols}x{rows}")]
    InvalidGeometry { cols: u16, rows: u16 },
}

pub type Result<T> = std::result::Result<T, Error>;
