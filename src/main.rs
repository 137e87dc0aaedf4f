use std::process::ExitCode;

use clap::{
    builder::{
        styling::{AnsiColor, Effects},
        Styles,
    },
    Args, Parser, Subcommand,
};

use chartsync::{
    cli,
    config::Settings,
    failure, logging,
    models::{default_description, default_playlist_name, PlaylistCommand},
};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug)]
#[clap(
    version = env!("CARGO_PKG_VERSION"),
    name = env!("CARGO_PKG_NAME"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    styles = styles(),
)]
struct Cli {
    /// Verbose logging
    #[clap(long, global = true)]
    debug: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or update a playlist from a chart
    Create(CreateOptions),

    /// Show a chart without touching Spotify
    Preview(PreviewOptions),

    /// List the chart regions that can be scraped
    Regions,

    /// List your Spotify playlists
    ListPlaylists(ListPlaylistsOptions),

    /// Show the effective configuration
    Config,
}

#[derive(Args, Debug)]
struct CreateOptions {
    #[clap(long, default_value = "brazil")]
    region: String,

    /// Number of chart positions to take (defaults to PLAYLIST_LIMIT)
    #[clap(long)]
    limit: Option<usize>,

    /// Defaults to "Top <limit> - <Region>"
    #[clap(long)]
    name: Option<String>,

    #[clap(long)]
    description: Option<String>,

    #[clap(long)]
    public: bool,

    /// replace, append or new
    #[clap(long, default_value = "replace")]
    update_mode: String,
}

#[derive(Args, Debug)]
struct PreviewOptions {
    #[clap(long)]
    region: String,

    #[clap(long, default_value_t = 10)]
    limit: usize,
}

#[derive(Args, Debug)]
struct ListPlaylistsOptions {
    #[clap(long, default_value_t = 50)]
    limit: usize,
}

impl CreateOptions {
    fn into_command(self, settings: &Settings) -> PlaylistCommand {
        let limit = self.limit.unwrap_or(settings.default_limit);
        PlaylistCommand {
            name: self
                .name
                .unwrap_or_else(|| default_playlist_name(limit, &self.region)),
            description: self
                .description
                .unwrap_or_else(|| default_description(limit, &self.region)),
            region: self.region,
            limit,
            public: self.public,
            update_mode: self.update_mode,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = Settings::load();
    let log_level = settings
        .as_ref()
        .map(|s| s.log_level.as_str())
        .unwrap_or("info");
    logging::init(cli.debug, log_level);

    let settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            failure!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Command::Create(opts) => cli::create(&settings, opts.into_command(&settings)).await,
        Command::Preview(opts) => cli::preview(&settings, &opts.region, opts.limit).await,
        Command::Regions => cli::regions(&settings),
        Command::ListPlaylists(opts) => cli::list_playlists(&settings, opts.limit).await,
        Command::Config => cli::show_config(&settings),
    }
}
