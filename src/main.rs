use std::sync::Arc;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use spotisort::{cli, config, error, types::PkceToken};
use tokio::sync::Mutex;

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  author=env!("CARGO_PKG_AUTHORS"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Authorize with Spotify API
    Auth,

    /// Sort the saved-track library into the managed playlists
    Sync(SyncOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
#[command(about = "Sort the saved-track library into the managed playlists")]
pub struct SyncOptions {
    /// Re-fetch saved tracks and the playlisted union before syncing
    #[clap(long)]
    pub refresh: bool,

    /// Re-fetch only the playlisted union before syncing
    #[clap(long)]
    pub categories: bool,

    /// Empty the entire cache before syncing
    #[clap(long)]
    pub fresh: bool,

    /// Run the unplaylisted pass; without pass flags all passes run
    #[clap(long)]
    pub unplaylisted: bool,

    /// Run the year bucketing pass; without pass flags all passes run
    #[clap(long)]
    pub years: bool,

    /// Run the flagged-playlist pass; without pass flags all passes run
    #[clap(long)]
    pub flagged: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Command::Auth => {
            let oauth_result: Arc<Mutex<Option<PkceToken>>> = Arc::new(Mutex::new(None));
            cli::auth(Arc::clone(&oauth_result)).await;
        }
        Command::Sync(opt) => {
            cli::sync(
                opt.refresh,
                opt.categories,
                opt.fresh,
                opt.unplaylisted,
                opt.years,
                opt.flagged,
            )
            .await
        }
        Command::Completions(opt) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
