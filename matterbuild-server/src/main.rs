use anyhow::{Context, Result};
use clap::Parser;
use matterbuild_client::JenkinsClient;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod scheduler;
pub mod service;

#[cfg(test)]
mod testing;

use config::Config;
use scheduler::{PollPolicy, ShutdownSignal};
use service::Dispatcher;
use service::probe::HttpReleaseProbe;

/// Build and release automation driven by chat slash commands
#[derive(Debug, Parser)]
#[command(name = "matterbuild", version, about)]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, env = "MATTERBUILD_CONFIG", default_value = "config.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "matterbuild_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    tracing::info!("Starting Matterbuild...");

    let config = Arc::new(Config::load(&args.config)?);

    let runner = Arc::new(
        JenkinsClient::new(&config.jenkins.url)
            .with_credentials(&config.jenkins.username, &config.jenkins.password),
    );
    let probe = Arc::new(HttpReleaseProbe::new(&config.release_artifacts_url));

    let (events, receiver) = events::channel();
    let _sink = events::spawn_sink(receiver);

    let (shutdown_sender, shutdown) = ShutdownSignal::channel();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            let _ = shutdown_sender.send(true);
        }
    });

    let dispatcher = Dispatcher::new(
        config.clone(),
        runner,
        probe,
        PollPolicy::from(&config.polling),
        events,
        shutdown.clone(),
    );
    let app = api::create_router(Arc::new(dispatcher));

    tracing::info!(
        "Listening on {} (job runner at {})",
        config.listen_address,
        config.jenkins.url
    );

    let listener = tokio::net::TcpListener::bind(&config.listen_address)
        .await
        .with_context(|| format!("Failed to bind to {}", config.listen_address))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.triggered().await })
        .await
        .context("Server error")?;

    tracing::info!("Matterbuild stopped");
    Ok(())
}
