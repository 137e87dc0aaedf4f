use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Spotify accepts at most this many URIs per add/remove call.
pub const BATCH_SIZE: usize = 100;
/// Page size used when walking the user's playlists.
pub const PLAYLIST_PAGE_SIZE: u32 = 50;

pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_DESCRIPTION_LENGTH: usize = 300;
pub const MIN_TRACK_COUNT: usize = 1;
pub const MAX_TRACK_COUNT: usize = 10_000;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
}

impl Track {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            artist: None,
            album: None,
        }
    }

    pub fn uri(&self) -> String {
        track_uri(&self.id)
    }
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.artist, &self.name) {
            (Some(artist), Some(name)) => write!(f, "{artist} - {name}"),
            _ => f.write_str(&self.id),
        }
    }
}

pub fn track_uri(track_id: &str) -> String {
    format!("spotify:track:{}", track_id.trim())
}

/// One ranked row of a scraped chart table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartEntry {
    pub track_id: String,
    pub position: usize,
    pub region: String,
}

impl ChartEntry {
    pub fn to_track(&self) -> Track {
        Track::new(self.track_id.clone())
    }
}

/// A playlist as the remote service reports it. Also the value stored in the lookup cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemotePlaylist {
    pub id: String,
    pub name: String,
    pub external_url: String,
    pub track_count: u32,
    pub public: bool,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateMode {
    Replace,
    Append,
    New,
}

impl UpdateMode {
    pub const ALL: [&'static str; 3] = ["replace", "append", "new"];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateMode::Replace => "replace",
            UpdateMode::Append => "append",
            UpdateMode::New => "new",
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(UpdateMode::Replace),
            "append" => Ok(UpdateMode::Append),
            "new" => Ok(UpdateMode::New),
            _ => Err(ValidationError::new(format!("Invalid update mode: {s}"))),
        }
    }
}

/// What the caller asked for when running a chart against a playlist.
#[derive(Debug, Clone)]
pub struct PlaylistCommand {
    pub region: String,
    pub limit: usize,
    pub name: String,
    pub description: String,
    pub public: bool,
    pub update_mode: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistRequest {
    pub name: String,
    pub track_ids: Vec<String>,
    pub description: String,
    pub public: bool,
    pub update_mode: String,
}

impl PlaylistRequest {
    /// Runs every check and returns all failures, or the parsed update mode.
    pub fn validate(&self) -> Result<UpdateMode, Vec<ValidationError>> {
        let mut errors = Vec::new();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(ValidationError::new("Playlist name is required"));
        } else if name.chars().count() > MAX_NAME_LENGTH {
            errors.push(ValidationError::new(format!(
                "Playlist name too long (max {MAX_NAME_LENGTH} characters)"
            )));
        }

        let mode = match self.update_mode.parse::<UpdateMode>() {
            Ok(mode) => Some(mode),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        if self.track_ids.len() < MIN_TRACK_COUNT {
            errors.push(ValidationError::new(format!(
                "At least {MIN_TRACK_COUNT} track is required"
            )));
        } else if self.track_ids.len() > MAX_TRACK_COUNT {
            errors.push(ValidationError::new(format!(
                "Too many tracks (max {MAX_TRACK_COUNT})"
            )));
        }

        if self.track_ids.iter().any(|id| id.trim().is_empty()) {
            errors.push(ValidationError::new("Track IDs cannot be empty"));
        }

        if self.description.chars().count() > MAX_DESCRIPTION_LENGTH {
            errors.push(ValidationError::new(format!(
                "Description too long (max {MAX_DESCRIPTION_LENGTH} characters)"
            )));
        }

        match mode {
            Some(mode) if errors.is_empty() => Ok(mode),
            _ => Err(errors),
        }
    }

    pub fn track_uris(&self) -> Vec<String> {
        self.track_ids.iter().map(|id| track_uri(id)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistReport {
    pub playlist_id: String,
    pub playlist_name: String,
    pub playlist_url: String,
    pub tracks_added: usize,
    pub tracks_failed: usize,
    pub was_updated: bool,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ChartPreview {
    pub region: String,
    pub tracks: Vec<Track>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionInfo {
    pub name: String,
    pub display_name: String,
    pub url: String,
}

/// One page of the user's playlists.
#[derive(Debug, Clone, Default)]
pub struct PlaylistPage {
    pub items: Vec<RemotePlaylist>,
    pub has_next: bool,
}

/// One page of a playlist's track URIs. `next` is an opaque continuation token.
#[derive(Debug, Clone, Default)]
pub struct TrackPage {
    pub uris: Vec<String>,
    pub next: Option<String>,
}

/// Upper-cases the first letter, the way region names are shown to users.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn default_playlist_name(limit: usize, region: &str) -> String {
    format!("Top {limit} - {}", capitalize(region))
}

pub fn default_description(limit: usize, region: &str) -> String {
    format!("Top {limit} from Kworb {} charts", capitalize(region))
}
