use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feedline_common::observability::init_logging;
use feedline_config::{FeedlineConfig, FeedlineConfigLoader};
use feedline_feed::RouteInput;
use std::path::PathBuf;
use wiring::{build_handler, log_config};
mod wiring;

#[derive(Parser)]
#[command(name = "feedline")]
#[command(about = "Build a feed document from a user's X timeline")]
#[command(version)]
struct Cli {
    /// YAML config file; `FEEDLINE_*` environment variables override it
    #[arg(long, global = true, default_value = "feedline.yaml", env = "FEEDLINE_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch the feed for one account
    User {
        /// Handle, or `+` followed by the numeric account id
        account_id: String,

        /// Modifier string, e.g. `exclude_rts` or `count=5&includeRts=0`
        modifiers: Option<String>,

        /// Opaque pagination token from a previous feed
        #[arg(long)]
        cursor: Option<String>,

        /// Skip cached timelines (always fetches authored posts only)
        #[arg(long)]
        no_cache: bool,
    },
    /// Fetch the feed for a route such as `/user/DIYgod/exclude_rts?cursor=...`
    Route { route: String },
}

impl Command {
    fn into_input(self) -> Result<RouteInput> {
        Ok(match self {
            Command::User {
                account_id,
                modifiers,
                cursor,
                no_cache,
            } => {
                let mut input = RouteInput::new(account_id).with_no_cache(no_cache);
                if let Some(m) = modifiers {
                    input = input.with_modifiers(m);
                }
                if let Some(c) = cursor {
                    input = input.with_cursor(c);
                }
                input
            }
            Command::Route { route } => RouteInput::from_route(&route)?,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1) Load config (env wins)
    let cfg: FeedlineConfig = FeedlineConfigLoader::new()
        .with_optional_file(&cli.config)
        .load()
        .with_context(|| format!("loading {}", cli.config.display()))?;

    // 2) Logging from the `logging` section; stdout stays reserved for the feed
    if let Some(path) = init_logging(log_config(&cfg.logging))? {
        tracing::debug!(path = %path.display(), "app.logging.file");
    }

    let handler = build_handler(&cfg)?;
    let input = cli.command.into_input()?;
    let doc = handler.handle(&input).await?;

    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(())
}
