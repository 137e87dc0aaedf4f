use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::{
    error::Result,
    models::{UpdateMode, BATCH_SIZE},
    spotify::PlaylistApi,
};

/// How an existing playlist is brought in line with a chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStrategy {
    /// Clear the playlist, then add every desired track in order.
    Replace,
    /// Add only the desired tracks not already present. Never removes.
    Append,
}

/// What a batched write managed to do.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub added: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl UpdateStrategy {
    /// `New` has no strategy; it always creates a fresh playlist.
    pub fn from_mode(mode: UpdateMode) -> Option<Self> {
        match mode {
            UpdateMode::Replace => Some(Self::Replace),
            UpdateMode::Append => Some(Self::Append),
            UpdateMode::New => None,
        }
    }

    pub async fn apply(
        &self,
        api: &dyn PlaylistApi,
        playlist_id: &str,
        desired_uris: &[String],
    ) -> Result<BatchOutcome> {
        let current = current_uris(api, playlist_id).await?;

        match self {
            Self::Replace => {
                info!(
                    "Replacing {} tracks in {playlist_id} with {}",
                    current.len(),
                    desired_uris.len()
                );
                let removal_errors = remove_in_batches(api, playlist_id, &current).await;
                let mut outcome = add_in_batches(api, playlist_id, desired_uris).await;
                let mut errors = removal_errors;
                errors.append(&mut outcome.errors);
                outcome.errors = errors;
                Ok(outcome)
            }
            Self::Append => {
                let existing: HashSet<&str> = current.iter().map(String::as_str).collect();
                let new: Vec<String> = desired_uris
                    .iter()
                    .filter(|uri| !existing.contains(uri.as_str()))
                    .cloned()
                    .collect();

                if new.is_empty() {
                    info!("All {} tracks already in {playlist_id}", desired_uris.len());
                    return Ok(BatchOutcome::default());
                }
                info!("Appending {} new tracks to {playlist_id}", new.len());
                Ok(add_in_batches(api, playlist_id, &new).await)
            }
        }
    }
}

/// Every track URI currently in the playlist, in playlist order.
pub async fn current_uris(api: &dyn PlaylistApi, playlist_id: &str) -> Result<Vec<String>> {
    let mut uris = Vec::new();
    let mut cursor = None;

    loop {
        let page = api.get_tracks(playlist_id, cursor).await?;
        uris.extend(page.uris);
        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    debug!("Playlist {playlist_id} holds {} tracks", uris.len());
    Ok(uris)
}

/// Adds `uris` in order, at most [`BATCH_SIZE`] per call. A failed batch does not stop
/// the remaining ones; its tracks are counted as failed.
pub async fn add_in_batches(
    api: &dyn PlaylistApi,
    playlist_id: &str,
    uris: &[String],
) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();

    for (index, chunk) in uris.chunks(BATCH_SIZE).enumerate() {
        match api.add_tracks(playlist_id, chunk).await {
            Ok(()) => {
                debug!("Batch {}: added {} tracks", index + 1, chunk.len());
                outcome.added += chunk.len();
            }
            Err(e) => {
                warn!("Batch {}: failed to add {} tracks: {e}", index + 1, chunk.len());
                outcome.failed += chunk.len();
                outcome.errors.push(format!("Batch {} failed: {e}", index + 1));
            }
        }
    }

    outcome
}

pub async fn remove_in_batches(
    api: &dyn PlaylistApi,
    playlist_id: &str,
    uris: &[String],
) -> Vec<String> {
    let mut errors = Vec::new();

    for (index, chunk) in uris.chunks(BATCH_SIZE).enumerate() {
        match api.remove_tracks(playlist_id, chunk).await {
            Ok(()) => debug!("Removal batch {}: {} tracks", index + 1, chunk.len()),
            Err(e) => {
                warn!("Removal batch {} failed: {e}", index + 1);
                errors.push(format!("Removal batch {} failed: {e}", index + 1));
            }
        }
    }

    errors
}
