// src/error.rs
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChallengeError {
    /// The pose stream could not be opened. Fatal to session start.
    #[error("pose source acquisition failed: {0}")]
    Acquisition(String),

    #[error(transparent)]
    Playlist(#[from] PlaylistError),

    #[error("session task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Error)]
pub enum PlaylistError {
    #[error("playlist contains no dance moves")]
    Empty,

    #[error("catalog entry '{0}' not found")]
    UnknownCatalogEntry(String),

    #[error("invalid playlist JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read playlist: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ChallengeError>;
