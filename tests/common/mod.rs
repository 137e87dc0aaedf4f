#![allow(dead_code)]

use std::{collections::HashSet, sync::Mutex};

use async_trait::async_trait;
use chartsync::{
    cache::PlaylistCache,
    error::{Error, Result},
    locator::PlaylistLocator,
    models::{PlaylistPage, RegionInfo, RemotePlaylist, Track, TrackPage},
    spotify::PlaylistApi,
    web_scraper::ChartSource,
};

const FAKE_TRACK_PAGE: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Create(String),
    ListMine { limit: u32, offset: u32 },
    GetTracks(String),
    Add { playlist: String, count: usize },
    Remove { playlist: String, count: usize },
    UpdateDetails(String),
}

#[derive(Default)]
struct State {
    playlists: Vec<(RemotePlaylist, Vec<String>)>,
    calls: Vec<Call>,
    add_calls: usize,
    failing_adds: HashSet<usize>,
    remove_calls: usize,
    failing_removes: HashSet<usize>,
    fail_list: bool,
    fail_update_details: bool,
}

/// In-memory stand-in for the Spotify playlist endpoints, recording every call.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<State>,
}

impl FakeApi {
    pub fn with_playlist(self, name: &str, uris: &[String]) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let id = format!("pl{}", state.playlists.len() + 1);
            state.playlists.push((playlist(&id, name), uris.to_vec()));
        }
        self
    }

    pub fn with_playlists(self, count: usize) -> Self {
        (0..count).fold(self, |api, i| api.with_playlist(&format!("Filler {i}"), &[]))
    }

    /// Makes the `n`-th add call (1-based, counted across the whole run) fail.
    pub fn failing_add(self, n: usize) -> Self {
        self.state.lock().unwrap().failing_adds.insert(n);
        self
    }

    /// Makes the `n`-th remove call (1-based, counted across the whole run) fail.
    pub fn failing_remove(self, n: usize) -> Self {
        self.state.lock().unwrap().failing_removes.insert(n);
        self
    }

    pub fn failing_list(self) -> Self {
        self.state.lock().unwrap().fail_list = true;
        self
    }

    pub fn failing_update_details(self) -> Self {
        self.state.lock().unwrap().fail_update_details = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn add_sizes(&self) -> Vec<usize> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Add { count, .. } => Some(count),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    pub fn tracks_of(&self, playlist_id: &str) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state
            .playlists
            .iter()
            .find(|(p, _)| p.id == playlist_id)
            .map(|(_, uris)| uris.clone())
            .unwrap_or_default()
    }

    pub fn id_of(&self, name: &str) -> Option<String> {
        let state = self.state.lock().unwrap();
        state
            .playlists
            .iter()
            .find(|(p, _)| p.name == name)
            .map(|(p, _)| p.id.clone())
    }
}

#[async_trait]
impl PlaylistApi for FakeApi {
    async fn create(&self, name: &str, description: &str, public: bool) -> Result<RemotePlaylist> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::Create(name.to_string()));
        let id = format!("pl{}", state.playlists.len() + 1);
        let mut created = playlist(&id, name);
        created.description = description.to_string();
        created.public = public;
        state.playlists.push((created.clone(), Vec::new()));
        Ok(created)
    }

    async fn list_mine(&self, limit: u32, offset: u32) -> Result<PlaylistPage> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::ListMine { limit, offset });
        if state.fail_list {
            return Err(Error::PlaylistCreation("listing rejected".into()));
        }
        let (limit, offset) = (limit as usize, offset as usize);
        let items: Vec<RemotePlaylist> = state
            .playlists
            .iter()
            .skip(offset)
            .take(limit)
            .map(|(p, uris)| RemotePlaylist {
                track_count: uris.len() as u32,
                ..p.clone()
            })
            .collect();
        Ok(PlaylistPage {
            has_next: offset + limit < state.playlists.len(),
            items,
        })
    }

    async fn get_tracks(&self, playlist_id: &str, cursor: Option<String>) -> Result<TrackPage> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::GetTracks(playlist_id.to_string()));
        let offset: usize = match cursor {
            Some(c) => c.parse().map_err(|_| Error::Pagination(c))?,
            None => 0,
        };
        let uris = state
            .playlists
            .iter()
            .find(|(p, _)| p.id == playlist_id)
            .map(|(_, uris)| uris.clone())
            .ok_or_else(|| Error::Scraping(format!("no playlist {playlist_id}")))?;
        let end = (offset + FAKE_TRACK_PAGE).min(uris.len());
        Ok(TrackPage {
            uris: uris[offset..end].to_vec(),
            next: (end < uris.len()).then(|| end.to_string()),
        })
    }

    async fn add_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        assert!(uris.len() <= 100, "add batch of {} exceeds 100", uris.len());
        state.calls.push(Call::Add {
            playlist: playlist_id.to_string(),
            count: uris.len(),
        });
        state.add_calls += 1;
        if state.failing_adds.contains(&state.add_calls) {
            return Err(Error::TrackAddition("rate limited".into()));
        }
        if let Some((_, existing)) = state.playlists.iter_mut().find(|(p, _)| p.id == playlist_id)
        {
            existing.extend_from_slice(uris);
        }
        Ok(())
    }

    async fn remove_tracks(&self, playlist_id: &str, uris: &[String]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        assert!(uris.len() <= 100, "remove batch of {} exceeds 100", uris.len());
        state.calls.push(Call::Remove {
            playlist: playlist_id.to_string(),
            count: uris.len(),
        });
        state.remove_calls += 1;
        let n = state.remove_calls;
        if state.failing_removes.contains(&n) {
            return Err(Error::PlaylistCreation(format!("remove {n} rejected")));
        }
        if let Some((_, existing)) = state.playlists.iter_mut().find(|(p, _)| p.id == playlist_id)
        {
            existing.retain(|u| !uris.contains(u));
        }
        Ok(())
    }

    async fn update_details(&self, playlist_id: &str, description: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call::UpdateDetails(playlist_id.to_string()));
        if state.fail_update_details {
            return Err(Error::PlaylistCreation("details rejected".into()));
        }
        if let Some((p, _)) = state.playlists.iter_mut().find(|(p, _)| p.id == playlist_id) {
            p.description = description.to_string();
        }
        Ok(())
    }
}

/// A chart source serving a fixed track list, or a fixed failure.
pub struct FakeCharts {
    tracks: Vec<Track>,
    fail: bool,
}

impl FakeCharts {
    pub fn with_tracks(count: usize) -> Self {
        Self {
            tracks: (1..=count).map(|i| Track::new(format!("t{i}"))).collect(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            tracks: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl ChartSource for FakeCharts {
    async fn get_charts(&self, region: &str, limit: usize) -> Result<Vec<Track>> {
        if self.fail {
            return Err(Error::Scraping(format!("Failed to fetch {region}")));
        }
        Ok(self.tracks.iter().take(limit).cloned().collect())
    }

    fn available_regions(&self) -> Vec<RegionInfo> {
        vec![RegionInfo {
            name: "brazil".into(),
            display_name: "Brazil".into(),
            url: "https://kworb.net/spotify/country/br_weekly_totals.html".into(),
        }]
    }
}

pub fn playlist(id: &str, name: &str) -> RemotePlaylist {
    RemotePlaylist {
        id: id.to_string(),
        name: name.to_string(),
        external_url: format!("https://open.spotify.com/playlist/{id}"),
        track_count: 0,
        public: false,
        description: String::new(),
    }
}

pub fn uris(ids: &[&str]) -> Vec<String> {
    ids.iter().map(|id| format!("spotify:track:{id}")).collect()
}

pub fn numbered_uris(count: usize) -> Vec<String> {
    (1..=count).map(|i| format!("spotify:track:t{i}")).collect()
}

pub fn locator() -> PlaylistLocator {
    PlaylistLocator::new(PlaylistCache::in_memory(24))
}
