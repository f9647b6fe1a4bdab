use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use newsdesk::app::{App, AssumeYes, Confirm};
use newsdesk::clock::SystemClock;
use newsdesk::config::{Config, API_KEY_ENV};
use newsdesk::gateway::{HttpGateway, Provider};
use newsdesk::media::DataUrlEncoder;
use newsdesk::storage::{Database, DatabaseError};
use newsdesk::ui::{self, StdinConfirm};

/// Get the config directory path (~/.config/newsdesk/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("newsdesk"))
}

#[derive(Parser, Debug)]
#[command(
    name = "newsdesk",
    version,
    about = "News headlines, bookmarks and a personal blog from the terminal"
)]
struct Args {
    /// Config file (default: ~/.config/newsdesk/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Database file (default: ~/.config/newsdesk/newsdesk.db)
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    /// News provider, overriding the config file (gnews or newsapi)
    #[arg(long)]
    provider: Option<Provider>,

    /// Do not ask before deleting blog posts
    #[arg(long)]
    yes: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they never interleave with shell output on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    // User-only access: the directory holds the API key and the database.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| config_dir.join("config.toml"));
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    if let Some(provider) = args.provider {
        config.provider = provider;
    }
    tracing::debug!(?config, "Effective configuration");

    let api_key = config.resolve_api_key(std::env::var(API_KEY_ENV).ok());
    if api_key.is_none() {
        eprintln!(
            "Warning: no API key configured. Set {} or api_key in {}.",
            API_KEY_ENV,
            config_path.display()
        );
    }

    let gateway = HttpGateway::new(config.gateway_settings(api_key))
        .context("Failed to set up news provider")?;

    let db_path = args.db.clone().unwrap_or_else(|| config_dir.join("newsdesk.db"));
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of newsdesk appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    let mut app = App::new(
        db,
        Arc::new(gateway),
        Arc::new(SystemClock),
        Arc::new(DataUrlEncoder),
        config.feed_settings(),
    )
    .await;

    let confirm: &dyn Confirm = if args.yes { &AssumeYes } else { &StdinConfirm };
    ui::run(&mut app, confirm).await?;

    println!("Goodbye!");
    Ok(())
}
