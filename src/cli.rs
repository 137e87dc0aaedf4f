use std::{process::ExitCode, sync::Arc, time::Duration};

use indicatif::{ProgressBar, ProgressStyle};
use tabled::{Table, Tabled};

use crate::{
    cache::PlaylistCache,
    config::{mask, playlist_cache_path, Settings},
    error::{ReconcileError, Result},
    failure,
    locator::PlaylistLocator,
    models::{PlaylistCommand, PlaylistReport},
    notice,
    retry::RetryPolicy,
    service::{self, PlaylistService},
    spotify::SpotifyPlaylistApi,
    spotify_auth::get_spotify_client,
    success, warning,
    web_scraper::KworbChartSource,
};

#[derive(Tabled)]
struct TrackRow {
    #[tabled(rename = "#")]
    position: usize,
    track: String,
    uri: String,
}

#[derive(Tabled)]
struct RegionRow {
    region: String,
    name: String,
    url: String,
}

#[derive(Tabled)]
struct PlaylistRow {
    name: String,
    tracks: u32,
    public: bool,
    url: String,
}

#[derive(Tabled)]
struct SettingRow {
    setting: &'static str,
    value: String,
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    if let Ok(style) = ProgressStyle::with_template("{spinner:.blue} {msg}") {
        pb.set_style(style.tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"));
    }
    pb
}

/// Authenticates and wires the chart source, Spotify client and playlist cache together.
pub async fn connect(settings: &Settings) -> Result<PlaylistService> {
    settings.ensure_valid()?;

    let client = get_spotify_client(settings).await?;
    let api = SpotifyPlaylistApi::new(client, RetryPolicy::from_settings(settings));
    let charts = KworbChartSource::from_settings(settings)?;
    let cache = PlaylistCache::open(playlist_cache_path(), settings.cache_ttl_hours);

    Ok(PlaylistService::new(
        Arc::new(charts),
        Arc::new(api),
        PlaylistLocator::new(cache),
    ))
}

pub async fn create(settings: &Settings, command: PlaylistCommand) -> ExitCode {
    let mut service = match connect(settings).await {
        Ok(service) => service,
        Err(e) => {
            failure!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let pb = spinner(&format!(
        "Building '{}' from {} charts...",
        command.name, command.region
    ));
    let result = service.create_from_chart(command).await;
    pb.finish_and_clear();

    match result {
        Ok(report) => {
            print_report(&report);
            ExitCode::SUCCESS
        }
        Err(ReconcileError::Validation(errors)) => {
            failure!("Invalid playlist request:");
            for e in errors {
                println!("    - {e}");
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            failure!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn print_report(report: &PlaylistReport) {
    if report.was_updated {
        success!("Updated playlist '{}'", report.playlist_name);
    } else {
        success!("Created playlist '{}'", report.playlist_name);
    }
    notice!("Tracks added: {}", report.tracks_added);
    if report.tracks_failed > 0 {
        warning!("Tracks failed: {}", report.tracks_failed);
    }
    for e in &report.errors {
        warning!("{e}");
    }
    if !report.playlist_url.is_empty() {
        notice!("{}", report.playlist_url);
    }
}

pub async fn preview(settings: &Settings, region: &str, limit: usize) -> ExitCode {
    let charts = match KworbChartSource::from_settings(settings) {
        Ok(charts) => charts,
        Err(e) => {
            failure!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let pb = spinner(&format!("Fetching {region} charts..."));
    let result = service::preview_charts(&charts, region, limit).await;
    pb.finish_and_clear();

    match result {
        Ok(preview) if preview.tracks.is_empty() => {
            warning!("No tracks found for region: {}", preview.region);
            ExitCode::FAILURE
        }
        Ok(preview) => {
            let rows: Vec<TrackRow> = preview
                .tracks
                .iter()
                .enumerate()
                .map(|(i, track)| TrackRow {
                    position: i + 1,
                    track: track.to_string(),
                    uri: track.uri(),
                })
                .collect();
            println!("{}", Table::new(rows));
            success!("{} tracks from {}", preview.total, preview.region);
            ExitCode::SUCCESS
        }
        Err(e) => {
            failure!("{e}");
            ExitCode::FAILURE
        }
    }
}

pub fn regions(settings: &Settings) -> ExitCode {
    let charts = match KworbChartSource::from_settings(settings) {
        Ok(charts) => charts,
        Err(e) => {
            failure!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let rows: Vec<RegionRow> = service::list_regions(&charts)
        .into_iter()
        .map(|r| RegionRow {
            region: r.name,
            name: r.display_name,
            url: r.url,
        })
        .collect();
    println!("{}", Table::new(rows));
    ExitCode::SUCCESS
}

pub async fn list_playlists(settings: &Settings, limit: usize) -> ExitCode {
    let service = match connect(settings).await {
        Ok(service) => service,
        Err(e) => {
            failure!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let pb = spinner("Fetching your playlists...");
    let result = service.list_playlists(limit).await;
    pb.finish_and_clear();

    match result {
        Ok(playlists) if playlists.is_empty() => {
            notice!("No playlists found");
            ExitCode::SUCCESS
        }
        Ok(playlists) => {
            let rows: Vec<PlaylistRow> = playlists
                .into_iter()
                .map(|p| PlaylistRow {
                    name: p.name,
                    tracks: p.track_count,
                    public: p.public,
                    url: p.external_url,
                })
                .collect();
            println!("{}", Table::new(rows));
            ExitCode::SUCCESS
        }
        Err(e) => {
            failure!("{e}");
            ExitCode::FAILURE
        }
    }
}

pub fn show_config(settings: &Settings) -> ExitCode {
    let rows = vec![
        SettingRow {
            setting: "Client ID",
            value: mask(&settings.client_id),
        },
        SettingRow {
            setting: "Client secret",
            value: mask(&settings.client_secret),
        },
        SettingRow {
            setting: "Redirect URI",
            value: settings.redirect_uri.clone(),
        },
        SettingRow {
            setting: "Default limit",
            value: settings.default_limit.to_string(),
        },
        SettingRow {
            setting: "Request timeout",
            value: format!("{}s", settings.request_timeout.as_secs()),
        },
        SettingRow {
            setting: "Max retries",
            value: settings.max_retries.to_string(),
        },
        SettingRow {
            setting: "Retry delay",
            value: format!("{}s", settings.retry_delay.as_secs()),
        },
        SettingRow {
            setting: "Cache TTL",
            value: format!("{}h", settings.cache_ttl_hours),
        },
        SettingRow {
            setting: "Log level",
            value: settings.log_level.clone(),
        },
        SettingRow {
            setting: "Regions",
            value: settings.regions.keys().cloned().collect::<Vec<_>>().join(", "),
        },
        SettingRow {
            setting: "Config file",
            value: settings
                .config_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "None".to_string()),
        },
        SettingRow {
            setting: "Playlist cache",
            value: playlist_cache_path().display().to_string(),
        },
    ];
    println!("{}", Table::new(rows));

    let problems = settings.validate();
    if problems.is_empty() {
        success!("Configuration is valid");
        ExitCode::SUCCESS
    } else {
        for problem in problems {
            failure!("{problem}");
        }
        ExitCode::FAILURE
    }
}
