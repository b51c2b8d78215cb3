use std::path::PathBuf;

/// Errors that stop a session before it can produce a report.
///
/// Everything that goes wrong inside the stream is part of the
/// [`SessionReport`](crate::SessionReport) instead.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The decoder could not be started.
    #[error("failed to start decoder {}: {source}", program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The decoder's stdout was already taken.
    #[error("decoder stdout is not available")]
    StdoutUnavailable,

    /// Waiting for the decoder to exit failed.
    #[error("failed to wait for decoder: {0}")]
    Wait(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SessionError>;
