use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use roster::config::Overrides;
use roster::mail::LogMailer;
use roster::{ConfigLoader, DbHandle};

/// Employee and role administration API.
#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML config file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Database path or `:memory:`
    #[arg(long, value_name = "URL")]
    database_url: Option<String>,

    /// Session token signing secret (at least 32 bytes)
    #[arg(long)]
    jwt_secret: Option<String>,

    /// `production` or `development`
    #[arg(long)]
    posture: Option<String>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

#[tokio::main]
async fn main() -> roster::Result<()> {
    let args = Args::parse();
    init_tracing();

    let overrides = Overrides {
        host: args.host,
        port: args.port,
        database_url: args.database_url,
        jwt_secret: args.jwt_secret,
        posture: args.posture.as_deref().map(str::parse).transpose()?,
    };
    let config = Arc::new(ConfigLoader::default().load(args.config.as_deref(), &overrides)?);
    tracing::info!(posture = ?config.server.posture, database = %config.database.url, "starting");

    let db = DbHandle::open(&config.database.url).await?;
    let mailer = Arc::new(LogMailer::new(config.mail.sender.clone()));
    let server = roster::server::start(
        config,
        Some(db.clone()),
        mailer,
        roster::api::router().into_handle(),
    )
    .await?;

    // Serve immediately; store-backed routes answer 503 until this finishes.
    tokio::spawn(async move {
        let report = db.reconcile().await;
        let failed = report.failed().len();
        if failed == 0 {
            tracing::info!("store ready");
        } else {
            tracing::warn!(failed, "store ready with failed schema steps");
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    server.shutdown().await
}
