use std::sync::Arc;

use tracing::{error, info, warn};

use crate::{
    error::{Error, ReconcileError, Result},
    locator::PlaylistLocator,
    models::{
        ChartPreview, PlaylistCommand, PlaylistReport, PlaylistRequest, RegionInfo,
        RemotePlaylist, UpdateMode, PLAYLIST_PAGE_SIZE,
    },
    spotify::PlaylistApi,
    strategy::{add_in_batches, UpdateStrategy},
    web_scraper::ChartSource,
};

/// Everything a chart-to-playlist run needs, wired once by the binary.
pub struct PlaylistService {
    charts: Arc<dyn ChartSource>,
    api: Arc<dyn PlaylistApi>,
    locator: PlaylistLocator,
}

impl PlaylistService {
    pub fn new(
        charts: Arc<dyn ChartSource>,
        api: Arc<dyn PlaylistApi>,
        locator: PlaylistLocator,
    ) -> Self {
        Self {
            charts,
            api,
            locator,
        }
    }

    /// Scrapes the chart and creates or updates the named playlist from it.
    pub async fn create_from_chart(
        &mut self,
        command: PlaylistCommand,
    ) -> std::result::Result<PlaylistReport, ReconcileError> {
        info!(
            "Building playlist '{}' from {} charts (limit {}, mode {})",
            command.name, command.region, command.limit, command.update_mode
        );

        let tracks = self
            .charts
            .get_charts(&command.region, command.limit)
            .await
            .map_err(|e| {
                error!("Chart scraping failed: {e}");
                ReconcileError::Scraping(e)
            })?;

        if tracks.is_empty() {
            error!("No tracks found for region {}", command.region);
            return Err(ReconcileError::Scraping(Error::Scraping(format!(
                "No tracks found for region: {}",
                command.region
            ))));
        }

        let request = PlaylistRequest {
            name: command.name.trim().to_string(),
            track_ids: tracks.into_iter().map(|t| t.id).collect(),
            description: command.description,
            public: command.public,
            update_mode: command.update_mode,
        };

        let mode = request.validate().map_err(|errors| {
            for e in &errors {
                warn!("Validation: {e}");
            }
            ReconcileError::Validation(errors)
        })?;

        self.reconcile(&request, mode).await.map_err(|e| {
            error!("Playlist update failed: {e}");
            ReconcileError::Unexpected(e)
        })
    }

    async fn reconcile(
        &mut self,
        request: &PlaylistRequest,
        mode: UpdateMode,
    ) -> Result<PlaylistReport> {
        let uris = request.track_uris();

        let existing = match UpdateStrategy::from_mode(mode) {
            Some(strategy) => self
                .locator
                .find_by_name(self.api.as_ref(), &request.name)
                .await?
                .map(|playlist| (playlist, strategy)),
            None => None,
        };

        match existing {
            Some((playlist, strategy)) => {
                let result = self
                    .update_existing(request, playlist, strategy, &uris)
                    .await;
                if result.is_err() {
                    // the cached id may point at a playlist that no longer exists
                    self.locator.forget(&request.name);
                }
                result
            }
            None => self.create_new(request, &uris).await,
        }
    }

    async fn create_new(
        &mut self,
        request: &PlaylistRequest,
        uris: &[String],
    ) -> Result<PlaylistReport> {
        let playlist = self
            .api
            .create(&request.name, &request.description, request.public)
            .await?;
        self.locator.remember(&request.name, playlist.clone());

        let outcome = add_in_batches(self.api.as_ref(), &playlist.id, uris).await;
        info!(
            "Created '{}' with {} tracks ({} failed)",
            playlist.name, outcome.added, outcome.failed
        );

        Ok(PlaylistReport {
            playlist_id: playlist.id,
            playlist_name: playlist.name,
            playlist_url: playlist.external_url,
            tracks_added: outcome.added,
            tracks_failed: outcome.failed,
            was_updated: false,
            errors: outcome.errors,
        })
    }

    async fn update_existing(
        &mut self,
        request: &PlaylistRequest,
        playlist: RemotePlaylist,
        strategy: UpdateStrategy,
        uris: &[String],
    ) -> Result<PlaylistReport> {
        let mut outcome = strategy.apply(self.api.as_ref(), &playlist.id, uris).await?;

        if !request.description.is_empty() {
            if let Err(e) = self
                .api
                .update_details(&playlist.id, &request.description)
                .await
            {
                warn!("Could not update description of '{}': {e}", playlist.name);
                outcome
                    .errors
                    .push(format!("Failed to update description: {e}"));
            }
        }

        info!(
            "Updated '{}' ({strategy:?}): {} added, {} failed",
            playlist.name, outcome.added, outcome.failed
        );

        Ok(PlaylistReport {
            playlist_id: playlist.id,
            playlist_name: playlist.name,
            playlist_url: playlist.external_url,
            tracks_added: outcome.added,
            tracks_failed: outcome.failed,
            was_updated: true,
            errors: outcome.errors,
        })
    }

    /// Up to `limit` of the user's playlists, read in pages of 50.
    pub async fn list_playlists(&self, limit: usize) -> Result<Vec<RemotePlaylist>> {
        let mut playlists = Vec::new();
        let mut offset = 0;

        while playlists.len() < limit {
            let page = self.api.list_mine(PLAYLIST_PAGE_SIZE, offset).await?;
            playlists.extend(page.items);
            if !page.has_next {
                break;
            }
            offset += PLAYLIST_PAGE_SIZE;
        }

        playlists.truncate(limit);
        Ok(playlists)
    }
}

/// Scrapes a chart without touching any playlist.
pub async fn preview_charts(
    charts: &dyn ChartSource,
    region: &str,
    limit: usize,
) -> Result<ChartPreview> {
    let tracks = charts.get_charts(region, limit).await?;
    Ok(ChartPreview {
        region: region.to_string(),
        total: tracks.len(),
        tracks,
    })
}

pub fn list_regions(charts: &dyn ChartSource) -> Vec<RegionInfo> {
    charts.available_regions()
}
