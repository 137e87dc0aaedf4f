use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Scraping failed: {0}")]
    Scraping(String),
    #[error("Playlist creation failed: {0}")]
    PlaylistCreation(String),
    #[error("Adding tracks failed: {0}")]
    TrackAddition(String),
    #[error("Spotify authentication failed: {0}")]
    Auth(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid page cursor: {0}")]
    Pagination(String),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Spotify API error: {0}")]
    SpotifyApi(#[from] rspotify::ClientError),
    #[error("Invalid Spotify id: {0}")]
    InvalidId(#[from] rspotify::model::IdError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),
}

/// A single rejected field of a playlist request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub String);

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Terminal failure states of a chart-to-playlist run.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("{0}")]
    Scraping(Error),
    #[error("Invalid playlist request: {}", join_messages(.0))]
    Validation(Vec<ValidationError>),
    #[error("Unexpected error: {0}")]
    Unexpected(Error),
}

fn join_messages(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.0.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
