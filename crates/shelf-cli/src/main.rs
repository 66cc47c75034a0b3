use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use media_shelf_config::{Config, PathManager};
use media_shelf_models::MediaKind;
use std::path::PathBuf;

use commands::{config, favorites, recent, session};

mod commands;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "shelf")]
#[command(about = "Media Shelf - favorites and recently viewed movies, books and music")]
#[command(version)]
struct Cli {
    /// Enable verbose output (use multiple times for more verbosity: -v, -vv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Use this config file instead of the default location
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KindArg {
    Movie,
    Book,
    Music,
}

impl From<KindArg> for MediaKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Movie => MediaKind::Movie,
            KindArg::Book => MediaKind::Book,
            KindArg::Music => MediaKind::Music,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in or out
    Session {
        #[command(subcommand)]
        cmd: SessionCommands,
    },
    /// List and toggle favorites
    #[command(long_about = "Work with the signed-in user's favorites. Items are given as a kind plus the item's JSON payload, e.g. shelf favorites toggle movie '{\"id\":42,\"title\":\"X\",\"releaseDate\":\"2020\"}'")]
    Favorites {
        #[command(subcommand)]
        cmd: FavoritesCommands,
    },
    /// List, record and clear recently viewed items
    Recent {
        #[command(subcommand)]
        cmd: RecentCommands,
    },
    /// Show or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Sign in. With the Firestore backend this uses email and password; otherwise pass --user-id
    Login {
        /// Account email (prompted if missing)
        #[arg(long, conflicts_with = "user_id")]
        email: Option<String>,

        /// Local user id for the memory and file backends
        #[arg(long)]
        user_id: Option<String>,
    },
    /// Forget the signed-in user
    Logout,
    /// Show the signed-in user
    Show,
}

#[derive(Subcommand)]
enum FavoritesCommands {
    /// List favorites, newest first
    List {
        /// Only show one kind
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
    /// Favorite the item, or unfavorite it if already favorited
    Toggle {
        #[arg(value_enum)]
        kind: KindArg,
        /// Item payload as JSON
        data: String,
    },
    /// Check whether the item is favorited
    Check {
        #[arg(value_enum)]
        kind: KindArg,
        /// Item payload as JSON
        data: String,
    },
}

#[derive(Subcommand)]
enum RecentCommands {
    /// List recently viewed items, newest first
    List {
        /// Show at most this many items
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Record that an item was opened
    Visit {
        #[arg(value_enum)]
        kind: KindArg,
        /// Item payload as JSON
        data: String,
    },
    /// Delete every recently viewed item
    Clear,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration (API keys masked)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();

    let paths = PathManager::default();
    let config_path = cli.config.clone().unwrap_or_else(|| paths.config_file());
    let config = Config::load_or_default(&config_path)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load config from {}: {}", config_path.display(), e))?;

    logging::init_logging(cli.verbose, cli.quiet, &config.logging).map_err(|e| color_eyre::eyre::eyre!("{}", e))?;

    let output = output::Output::new(cli.output, cli.quiet);
    let env = commands::Env {
        paths,
        config_path,
        config,
    };

    match cli.command {
        Commands::Session { cmd } => session::run_session(cmd, &env, &output).await,
        Commands::Favorites { cmd } => favorites::run_favorites(cmd, &env, &output).await,
        Commands::Recent { cmd } => recent::run_recent(cmd, &env, &output).await,
        Commands::Config { cmd } => config::run_config(cmd, &env, &output),
    }
}
