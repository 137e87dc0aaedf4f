use std::collections::HashMap;

use async_trait::async_trait;
use rspotify::{
    model::{FullPlaylist, PlayableId, PlayableItem, PlaylistId, SimplifiedPlaylist, TrackId},
    prelude::*,
    AuthCodeSpotify,
};
use tracing::{debug, error, info};
use url::Url;

use crate::{
    error::{Error, Result},
    models::{PlaylistPage, RemotePlaylist, TrackPage},
    retry::RetryPolicy,
};

/// Page size used when reading a playlist's tracks.
const TRACK_PAGE_SIZE: u32 = 100;

/// The remote playlist operations the reconciliation workflow relies on.
///
/// Track lists are exchanged as `spotify:track:<id>` URIs. Callers keep add and remove
/// batches at or below [`crate::models::BATCH_SIZE`].
#[async_trait]
pub trait PlaylistApi: Send + Sync {
    async fn create(&self, name: &str, description: &str, public: bool) -> Result<RemotePlaylist>;

    async fn list_mine(&self, limit: u32, offset: u32) -> Result<PlaylistPage>;

    /// `cursor` is `None` for the first page, then the `next` of the previous page.
    async fn get_tracks(&self, playlist_id: &str, cursor: Option<String>) -> Result<TrackPage>;

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;

    async fn remove_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()>;

    async fn update_details(&self, playlist_id: &str, description: &str) -> Result<()>;
}

pub struct SpotifyPlaylistApi {
    client: AuthCodeSpotify,
    retry: RetryPolicy,
}

impl SpotifyPlaylistApi {
    pub fn new(client: AuthCodeSpotify, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

#[async_trait]
impl PlaylistApi for SpotifyPlaylistApi {
    async fn create(&self, name: &str, description: &str, public: bool) -> Result<RemotePlaylist> {
        let client = &self.client;
        let playlist = self
            .retry
            .run(&format!("create playlist '{name}'"), || async move {
                let user = client.current_user().await?;
                let description = (!description.is_empty()).then_some(description);
                let playlist = client
                    .user_playlist_create(user.id, name, Some(public), Some(false), description)
                    .await?;
                Ok::<_, Error>(playlist)
            })
            .await
            .map_err(|e| {
                error!("Failed to create playlist '{name}': {e}");
                Error::PlaylistCreation(e.to_string())
            })?;

        info!("Created playlist '{}' ({})", playlist.name, playlist.id.id());
        Ok(from_full(playlist))
    }

    async fn list_mine(&self, limit: u32, offset: u32) -> Result<PlaylistPage> {
        let client = &self.client;
        let page = self
            .retry
            .run(&format!("list playlists at offset {offset}"), || async move {
                Ok::<_, Error>(
                    client
                        .current_user_playlists_manual(Some(limit), Some(offset))
                        .await?,
                )
            })
            .await?;

        debug!("Got {} playlists at offset {offset}", page.items.len());
        Ok(PlaylistPage {
            has_next: page.next.is_some(),
            items: page.items.into_iter().map(from_simplified).collect(),
        })
    }

    async fn get_tracks(&self, playlist_id: &str, cursor: Option<String>) -> Result<TrackPage> {
        let offset = match cursor {
            Some(c) => c
                .parse::<u32>()
                .map_err(|_| Error::Pagination(c.clone()))?,
            None => 0,
        };
        let id = PlaylistId::from_id(playlist_id)?;
        let (client, id) = (&self.client, &id);
        let page = self
            .retry
            .run(&format!("read tracks of {playlist_id} at offset {offset}"), || async move {
                Ok::<_, Error>(
                    client
                        .playlist_items_manual(
                            id.clone(),
                            None,
                            None,
                            Some(TRACK_PAGE_SIZE),
                            Some(offset),
                        )
                        .await?,
                )
            })
            .await?;

        let uris = page
            .items
            .into_iter()
            .filter_map(|item| match item.track {
                Some(PlayableItem::Track(track)) => track.id.map(|id| id.uri()),
                Some(_) => {
                    debug!("Skipping non-track playlist item");
                    None
                }
                None => None,
            })
            .collect();

        Ok(TrackPage {
            uris,
            next: page
                .next
                .as_deref()
                .and_then(offset_from_next)
                .map(|o| o.to_string()),
        })
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let id = PlaylistId::from_id(playlist_id)?;
        let items = playable_ids(uris)?;
        let (client, id, items) = (&self.client, &id, &items);

        self.retry
            .run(&format!("add {} tracks to {playlist_id}", uris.len()), || async move {
                client
                    .playlist_add_items(id.clone(), items.clone(), None)
                    .await?;
                Ok::<_, Error>(())
            })
            .await
            .map_err(|e| Error::TrackAddition(e.to_string()))?;

        debug!("Added {} tracks to {playlist_id}", uris.len());
        Ok(())
    }

    async fn remove_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let id = PlaylistId::from_id(playlist_id)?;
        let items = playable_ids(uris)?;
        let (client, id, items) = (&self.client, &id, &items);

        self.retry
            .run(&format!("remove {} tracks from {playlist_id}", uris.len()), || async move {
                client
                    .playlist_remove_all_occurrences_of_items(id.clone(), items.clone(), None)
                    .await?;
                Ok::<_, Error>(())
            })
            .await?;

        debug!("Removed {} tracks from {playlist_id}", uris.len());
        Ok(())
    }

    async fn update_details(&self, playlist_id: &str, description: &str) -> Result<()> {
        let id = PlaylistId::from_id(playlist_id)?;
        let (client, id) = (&self.client, &id);

        self.retry
            .run(&format!("update details of {playlist_id}"), || async move {
                client
                    .playlist_change_detail(id.clone(), None, None, Some(description), None)
                    .await?;
                Ok::<_, Error>(())
            })
            .await?;

        info!("Updated description of {playlist_id}");
        Ok(())
    }
}

fn playable_ids(uris: &[String]) -> Result<Vec<PlayableId<'static>>> {
    uris.iter()
        .map(|uri| -> Result<PlayableId<'static>> {
            Ok(PlayableId::Track(TrackId::from_uri(uri)?.into_static()))
        })
        .collect()
}

/// Reads the `offset` query parameter of a Spotify paging URL.
pub fn offset_from_next(next_url: &str) -> Option<u32> {
    let url = Url::parse(next_url).ok()?;
    let query_pairs: HashMap<String, String> = url.query_pairs().into_owned().collect();
    query_pairs.get("offset")?.parse().ok()
}

fn external_url(urls: &HashMap<String, String>) -> String {
    urls.get("spotify").cloned().unwrap_or_default()
}

fn from_simplified(playlist: SimplifiedPlaylist) -> RemotePlaylist {
    RemotePlaylist {
        id: playlist.id.id().to_string(),
        external_url: external_url(&playlist.external_urls),
        name: playlist.name,
        track_count: playlist.tracks.total,
        public: playlist.public.unwrap_or(false),
        description: String::new(),
    }
}

fn from_full(playlist: FullPlaylist) -> RemotePlaylist {
    RemotePlaylist {
        id: playlist.id.id().to_string(),
        external_url: external_url(&playlist.external_urls),
        name: playlist.name,
        track_count: playlist.tracks.total,
        public: playlist.public.unwrap_or(false),
        description: playlist.description.unwrap_or_default(),
    }
}
