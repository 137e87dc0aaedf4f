use tracing::{debug, info};

use crate::{
    cache::{cache_key, PlaylistCache},
    error::Result,
    models::{RemotePlaylist, PLAYLIST_PAGE_SIZE},
    spotify::PlaylistApi,
};

/// Finds the user's playlists by name, case-insensitively, through the lookup cache.
pub struct PlaylistLocator {
    cache: PlaylistCache,
}

impl PlaylistLocator {
    pub fn new(cache: PlaylistCache) -> Self {
        Self { cache }
    }

    pub async fn find_by_name(
        &mut self,
        api: &dyn PlaylistApi,
        name: &str,
    ) -> Result<Option<RemotePlaylist>> {
        if let Some(playlist) = self.cache.get(name) {
            return Ok(Some(playlist));
        }

        let wanted = cache_key(name);
        let mut offset = 0;

        loop {
            let page = api.list_mine(PLAYLIST_PAGE_SIZE, offset).await?;
            debug!("Scanning {} playlists at offset {offset}", page.items.len());

            if let Some(playlist) = page
                .items
                .into_iter()
                .find(|p| cache_key(&p.name) == wanted)
            {
                info!("Found existing playlist '{}' ({})", playlist.name, playlist.id);
                self.cache.set(name, playlist.clone());
                return Ok(Some(playlist));
            }

            if !page.has_next {
                break;
            }
            offset += PLAYLIST_PAGE_SIZE;
        }

        debug!("No playlist named '{name}'");
        Ok(None)
    }

    pub fn remember(&mut self, name: &str, playlist: RemotePlaylist) {
        self.cache.set(name, playlist);
    }

    pub fn forget(&mut self, name: &str) {
        self.cache.remove(name);
    }
}
