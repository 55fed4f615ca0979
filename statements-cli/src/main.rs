use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use statements_client::StatementsClient;
use statements_core::{TransactionFilters, ViewerState};
use std::path::PathBuf;
use tracing::debug;

mod browse;
mod config;
mod fetch_worker;
mod list_cmd;
mod logging;
mod state;
mod upload_cmd;

#[derive(Parser, Debug)]
#[command(
    name = "statements",
    version,
    about = "Upload bank statements and browse their transactions"
)]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Less log output
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,

    /// Backend base URL (overrides config and STATEMENTS_API_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload a PDF bank statement
    Upload {
        file: PathBuf,

        /// Declared media type (defaults to a guess from the extension)
        #[arg(long)]
        media_type: Option<String>,
    },

    /// Print one page of transactions
    List(list_cmd::ListArgs),

    /// Interactive transaction browser
    Browse,

    /// Manage ~/.statements/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config if none exists
    Init,
    /// Print the effective config (password masked)
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    // The browser owns the terminal, so its logs go to a file.
    let log_file = match cli.command {
        Command::Browse => Some(state::browse_log_path()?),
        _ => None,
    };
    logging::init_logging(cli.verbose, cli.quiet, log_file.as_deref())?;

    let mut cfg = config::load_config()?;
    if let Some(url) = cli.base_url {
        cfg.api.base_url = url;
    }
    debug!(base_url = %cfg.api.base_url, ordering = %cfg.viewer.ordering, "config loaded");

    match cli.command {
        Command::Upload { file, media_type } => {
            let client = build_client(&cfg)?;
            upload_cmd::run_upload(&client, &file, media_type.as_deref()).await?;
        }

        Command::List(args) => {
            let client = build_client(&cfg)?;
            list_cmd::run_list(&client, &args, cfg.viewer.page_size).await?;
        }

        Command::Browse => {
            let client = build_client(&cfg)?;
            let viewer = ViewerState::new(
                TransactionFilters::with_page_size(cfg.viewer.page_size),
                cfg.viewer.ordering,
            );
            let rt = tokio::runtime::Handle::current();
            tokio::task::spawn_blocking(move || browse::run_browse(rt, client, viewer))
                .await
                .context("browser thread panicked")??;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => config::show_config(&cfg)?,
        },
    }

    Ok(())
}

fn build_client(cfg: &config::Config) -> Result<StatementsClient> {
    StatementsClient::new(cfg.client_config()).context("build HTTP client")
}
