mod common;

use chartsync::{cache::PlaylistCache, locator::PlaylistLocator};
use common::{locator, playlist, Call, FakeApi};

fn list_calls(api: &FakeApi) -> Vec<u32> {
    api.calls()
        .into_iter()
        .filter_map(|c| match c {
            Call::ListMine { offset, .. } => Some(offset),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn second_lookup_within_ttl_uses_the_cache() {
    let api = FakeApi::default().with_playlist("Foo", &[]);
    let mut locator = locator();

    let first = locator.find_by_name(&api, "Foo").await.unwrap();
    let second = locator.find_by_name(&api, "  foo ").await.unwrap();

    assert_eq!(first.unwrap().id, "pl1");
    assert_eq!(second.unwrap().id, "pl1");
    assert_eq!(list_calls(&api), vec![0]);
}

#[tokio::test]
async fn lookup_pages_through_playlists_in_fifties() {
    let api = FakeApi::default()
        .with_playlists(110)
        .with_playlist("Deep Cut", &[]);
    let mut locator = locator();

    let found = locator.find_by_name(&api, "deep cut").await.unwrap();

    assert_eq!(found.unwrap().name, "Deep Cut");
    assert_eq!(list_calls(&api), vec![0, 50, 100]);
}

#[tokio::test]
async fn unknown_name_exhausts_pagination() {
    let api = FakeApi::default().with_playlists(60);
    let mut locator = locator();

    assert!(locator.find_by_name(&api, "Missing").await.unwrap().is_none());
    assert_eq!(list_calls(&api), vec![0, 50]);

    // misses are not cached
    assert!(locator.find_by_name(&api, "Missing").await.unwrap().is_none());
    assert_eq!(list_calls(&api).len(), 4);
}

#[tokio::test]
async fn expired_cache_goes_back_to_the_api() {
    let api = FakeApi::default().with_playlist("Foo", &[]);
    let mut locator = PlaylistLocator::new(PlaylistCache::in_memory(0));

    locator.find_by_name(&api, "Foo").await.unwrap();
    locator.find_by_name(&api, "Foo").await.unwrap();

    assert_eq!(list_calls(&api).len(), 2);
}

#[tokio::test]
async fn remembered_playlists_skip_the_api_and_can_be_forgotten() {
    let api = FakeApi::default();
    let mut locator = locator();

    locator.remember("Fresh", playlist("new1", "Fresh"));
    let found = locator.find_by_name(&api, "fresh").await.unwrap();
    assert_eq!(found.unwrap().id, "new1");
    assert!(api.calls().is_empty());

    locator.forget("FRESH");
    assert!(locator.find_by_name(&api, "fresh").await.unwrap().is_none());
    assert_eq!(list_calls(&api), vec![0]);
}

#[tokio::test]
async fn cache_survives_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("playlists.json");
    let api = FakeApi::default().with_playlist("Foo", &[]);

    {
        let mut locator = PlaylistLocator::new(PlaylistCache::open(&path, 24));
        locator.find_by_name(&api, "Foo").await.unwrap();
    }
    let mut locator = PlaylistLocator::new(PlaylistCache::open(&path, 24));
    let found = locator.find_by_name(&api, "foo").await.unwrap();

    assert_eq!(found.unwrap().id, "pl1");
    assert_eq!(list_calls(&api), vec![0]);
}
