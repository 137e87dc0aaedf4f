//! Builds and maintains Spotify playlists from kworb.net chart pages.
//!
//! A run scrapes one regional chart, validates the resulting request and then either
//! creates a playlist or reconciles an existing one by name (replace or append), writing
//! tracks in batches of at most 100.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod locator;
pub mod logging;
pub mod models;
pub mod retry;
pub mod service;
pub mod spotify;
pub mod spotify_auth;
pub mod strategy;
pub mod web_scraper;

pub use error::{Error, ReconcileError, Result, ValidationError};
pub use models::{PlaylistCommand, PlaylistReport, Track, UpdateMode};
pub use service::PlaylistService;

/// Prints a status line with a blue bullet.
#[macro_export]
macro_rules! notice {
    ($($arg:tt)*) => ({
        use colored::Colorize;
        println!("[{}] {}", "o".blue().bold(), std::format_args!($($arg)*));
    })
}

/// Prints a line with a green checkmark.
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => ({
        use colored::Colorize;
        println!("[{}] {}", "✓".green().bold(), std::format_args!($($arg)*));
    })
}

/// Prints a line with a yellow exclamation mark.
#[macro_export]
macro_rules! warning {
    ($($arg:tt)*) => ({
        use colored::Colorize;
        println!("[{}] {}", "!".yellow().bold(), std::format_args!($($arg)*));
    })
}

/// Prints a line with a red exclamation mark. Unlike a panic, the caller decides the
/// exit code.
#[macro_export]
macro_rules! failure {
    ($($arg:tt)*) => ({
        use colored::Colorize;
        println!("[{}] {}", "!".red().bold(), std::format_args!($($arg)*));
    })
}
