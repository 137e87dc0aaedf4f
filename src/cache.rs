use std::{
    collections::HashMap,
    fs::{self, File},
    io::{BufReader, BufWriter},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{error::Result, models::RemotePlaylist};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    playlist: RemotePlaylist,
    cached_at: DateTime<Utc>,
}

/// Name → playlist lookups, expired purely by age.
///
/// Keys are trimmed and lower-cased names. With a backing file every change is written
/// through immediately; without one the cache lives only in memory.
#[derive(Debug)]
pub struct PlaylistCache {
    path: Option<PathBuf>,
    ttl: Duration,
    entries: HashMap<String, CacheEntry>,
}

/// Ten years; longer TTLs are clamped to this.
pub const MAX_CACHE_TTL_HOURS: i64 = 24 * 365 * 10;

pub fn cache_key(name: &str) -> String {
    name.trim().to_lowercase()
}

fn ttl_from_hours(hours: i64) -> Duration {
    match Duration::try_hours(hours) {
        Some(ttl) if hours <= MAX_CACHE_TTL_HOURS => ttl,
        _ => {
            warn!("Cache TTL of {hours}h is out of range, using {MAX_CACHE_TTL_HOURS}h");
            Duration::hours(MAX_CACHE_TTL_HOURS)
        }
    }
}

impl PlaylistCache {
    pub fn in_memory(ttl_hours: i64) -> Self {
        Self {
            path: None,
            ttl: ttl_from_hours(ttl_hours),
            entries: HashMap::new(),
        }
    }

    /// Opens the cache file, dropping expired entries. A missing or corrupt file yields an
    /// empty cache.
    pub fn open(path: impl Into<PathBuf>, ttl_hours: i64) -> Self {
        let path = path.into();
        let mut cache = Self {
            ttl: ttl_from_hours(ttl_hours),
            entries: HashMap::new(),
            path: None,
        };

        match read_entries(&path) {
            Ok(Some(entries)) => {
                let now = Utc::now();
                cache.entries = entries
                    .into_iter()
                    .filter(|(_, entry)| cache.is_fresh(entry, now))
                    .collect();
                info!(
                    "Loaded {} playlist cache entries from {}",
                    cache.entries.len(),
                    path.display()
                );
            }
            Ok(None) => debug!("No playlist cache at {}", path.display()),
            Err(e) => warn!("Ignoring unreadable playlist cache {}: {e}", path.display()),
        }

        cache.path = Some(path);
        cache
    }

    fn is_fresh(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.cached_at < self.ttl
    }

    pub fn get(&self, name: &str) -> Option<RemotePlaylist> {
        let key = cache_key(name);
        match self.entries.get(&key) {
            Some(entry) if self.is_fresh(entry, Utc::now()) => {
                debug!("Cache hit for playlist '{name}'");
                Some(entry.playlist.clone())
            }
            Some(_) => {
                debug!("Cache entry for playlist '{name}' expired");
                None
            }
            None => {
                debug!("Cache miss for playlist '{name}'");
                None
            }
        }
    }

    pub fn set(&mut self, name: &str, playlist: RemotePlaylist) {
        self.set_at(name, playlist, Utc::now());
    }

    fn set_at(&mut self, name: &str, playlist: RemotePlaylist, cached_at: DateTime<Utc>) {
        self.entries.insert(
            cache_key(name),
            CacheEntry {
                playlist,
                cached_at,
            },
        );
        debug!("Cached playlist '{name}'");
        self.save();
    }

    pub fn remove(&mut self, name: &str) {
        if self.entries.remove(&cache_key(name)).is_some() {
            debug!("Removed playlist '{name}' from cache");
            self.save();
        }
    }

    /// Failures are logged; the in-memory state stays authoritative for this run.
    fn save(&self) {
        let Some(path) = &self.path else {
            return;
        };
        match write_entries(path, &self.entries) {
            Ok(()) => debug!("Saved {} cache entries to {}", self.entries.len(), path.display()),
            Err(e) => warn!("Failed to save playlist cache to {}: {e}", path.display()),
        }
    }
}

fn read_entries(path: &Path) -> Result<Option<HashMap<String, CacheEntry>>> {
    if !path.exists() {
        return Ok(None);
    }
    let file = File::open(path)?;
    Ok(Some(serde_json::from_reader(BufReader::new(file))?))
}

fn write_entries(path: &Path, entries: &HashMap<String, CacheEntry>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    serde_json::to_writer_pretty(BufWriter::new(file), entries)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn playlist(id: &str, name: &str) -> RemotePlaylist {
        RemotePlaylist {
            id: id.to_string(),
            name: name.to_string(),
            external_url: format!("https://open.spotify.com/playlist/{id}"),
            track_count: 50,
            public: false,
            description: String::new(),
        }
    }

    #[test]
    fn keys_are_normalized() {
        let mut cache = PlaylistCache::in_memory(24);
        cache.set("  Top 50 - Brazil ", playlist("p1", "Top 50 - Brazil"));

        assert_eq!(cache.get("top 50 - brazil").unwrap().id, "p1");
        assert!(cache.get("TOP 50 - BRAZIL").is_some());
        assert!(cache.get("Top 50 - Global").is_none());
        assert_eq!(cache_key("  MiXeD "), "mixed");
    }

    #[test]
    fn zero_ttl_never_hits() {
        let mut cache = PlaylistCache::in_memory(0);
        cache.set("Foo", playlist("p1", "Foo"));
        assert_eq!(cache.entries.len(), 1);
        assert!(cache.get("Foo").is_none());
    }

    #[test]
    fn oversized_ttl_is_clamped_instead_of_panicking() {
        let cache = PlaylistCache::in_memory(3_000_000_000_000);
        assert_eq!(cache.ttl, Duration::hours(MAX_CACHE_TTL_HOURS));

        let cache = PlaylistCache::in_memory(i64::MAX);
        assert_eq!(cache.ttl, Duration::hours(MAX_CACHE_TTL_HOURS));

        assert_eq!(PlaylistCache::in_memory(48).ttl, Duration::hours(48));
    }

    #[test]
    fn remove_is_case_insensitive() {
        let mut cache = PlaylistCache::in_memory(24);
        cache.set("a", playlist("1", "a"));
        cache.set("b", playlist("2", "b"));
        cache.remove("A");
        assert!(cache.get("a").is_none());
        assert_eq!(cache.entries.len(), 1);
    }

    #[test]
    fn persists_and_drops_expired_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("playlists.json");

        {
            let mut cache = PlaylistCache::open(&path, 24);
            cache.set("Fresh", playlist("p1", "Fresh"));
            cache.set_at(
                "Stale",
                playlist("p2", "Stale"),
                Utc::now() - Duration::hours(25),
            );
        }
        assert!(path.exists());

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert!(raw["fresh"]["cached_at"].is_string());
        assert_eq!(raw["fresh"]["playlist"]["id"], "p1");

        let reloaded = PlaylistCache::open(&path, 24);
        assert_eq!(reloaded.entries.len(), 1);
        assert_eq!(reloaded.get("fresh").unwrap().id, "p1");
        assert!(reloaded.get("stale").is_none());
        assert_eq!(reloaded.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("playlists.json");
        fs::write(&path, "{ not json").unwrap();

        let cache = PlaylistCache::open(&path, 24);
        assert!(cache.entries.is_empty());
    }
}
