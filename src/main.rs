mod checkin;
mod command;
mod config;
mod orchestrator;
mod pubsub;
mod push;
#[cfg(test)]
mod test_support;

use anyhow::{Context, Result};
use checkin::ProtobufCheckinDecoder;
use command::InMemoryCommandQueue;
use crate::config::ServiceConfig;
use mdm_shared::profile::BootstrapProfile;
use orchestrator::{BootstrapOrchestrator, Collaborators};
use pubsub::{IngestListener, InMemoryPubSub};
use push::PubSubPushService;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::from_env().context("Failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)))
        .init();

    info!("MDM bootstrap server starting");
    info!("  Ingest: {}", config.ingest_addr);
    info!("  Authenticate topic: {}", config.authenticate_topic);
    info!("  Push delay: {}ms", config.push_delay_ms);

    let profile = BootstrapProfile::load(config.bootstrap_profile_path.as_deref())
        .context("Failed to load bootstrap profile")?;
    info!(source = ?profile.source(), bytes = profile.len(), "Bootstrap profile loaded");

    let shutdown = CancellationToken::new();
    let broker = Arc::new(InMemoryPubSub::new(config.subscription_buffer));
    let queue = Arc::new(InMemoryCommandQueue::new(config.max_queued_per_device));
    let push = Arc::new(PubSubPushService::new(broker.clone(), config.push_topic.clone()));

    let orchestrator = BootstrapOrchestrator::subscribe(
        broker.as_ref(),
        &config.orchestrator(),
        Collaborators {
            decoder: Arc::new(ProtobufCheckinDecoder),
            submitter: queue,
            push,
        },
        profile,
        shutdown.clone(),
    )
    .await?;
    let orchestrator_handle = tokio::spawn(orchestrator.run());

    let ingest = IngestListener::bind(&config.ingest_addr)
        .await
        .with_context(|| format!("Failed to bind ingest on {}", config.ingest_addr))?;
    let ingest_handle = tokio::spawn(ingest.run(broker, shutdown.clone()));

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    shutdown.cancel();

    if let Err(e) = orchestrator_handle.await {
        error!("Orchestrator task failed: {}", e);
    }
    match ingest_handle.await {
        Ok(Err(e)) => error!("Ingest stopped with error: {}", e),
        Err(e) => error!("Ingest task failed: {}", e),
        Ok(Ok(())) => {}
    }

    info!("MDM bootstrap server stopped");
    Ok(())
}
