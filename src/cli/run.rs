use crate::config::{load_config, load_config_from_env, Config};
use crate::graphql::GraphQlClient;
use crate::pipeline::{create_channel, LogFilters};
use crate::sink::{run_distributor, run_status_reporter, DeliveryStats, Sink, WebhookSink};
use crate::subscription::{StreamSupervisor, SupervisorError, WsConnector};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("API client error: {0}")]
    Api(#[from] crate::graphql::ApiError),

    #[error("sink error: {0}")]
    Sink(#[from] crate::sink::SinkError),

    #[error("stream error: {0}")]
    Supervisor(#[from] SupervisorError),

    #[error("task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub async fn run(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &config_path {
        Some(path) => {
            info!(config_path = %path.display(), "Loading configuration");
            load_config(path)?
        }
        None => {
            info!("No config file found, loading configuration from environment");
            load_config_from_env()?
        }
    };

    run_pipeline(config).await.map_err(|e| e.into())
}

fn build_sinks(config: &Config) -> Result<Vec<Arc<dyn Sink>>, RunError> {
    let mut sinks: Vec<Arc<dyn Sink>> = Vec::new();

    if let Some(webhook) = &config.webhook {
        info!(url = %webhook.url, "Configuring webhook sink");
        sinks.push(Arc::new(WebhookSink::new(
            webhook,
            config.stream.request_timeout,
        )?));
    }

    Ok(sinks)
}

pub async fn run_pipeline(config: Config) -> Result<(), RunError> {
    let target = config.target();
    info!(
        environment_id = %target.environment_id,
        project_id = ?target.project_id,
        services = ?target.services,
        "Configuration loaded"
    );

    let api = Arc::new(GraphQlClient::new(
        &config.railway.api_url,
        &config.railway.api_key,
        config.stream.request_timeout,
    )?);
    let connector = Arc::new(WsConnector::new(
        &config.railway.subscription_url,
        &config.railway.api_key,
    ));
    let sinks = build_sinks(&config)?;

    let (batch_tx, batch_rx) = create_channel(config.stream.channel_capacity);
    let stats = DeliveryStats::new();
    let cancel = CancellationToken::new();

    info!("Starting distributor task");
    let distributor_handle = tokio::spawn(run_distributor(
        batch_rx,
        sinks,
        Arc::clone(&stats),
        cancel.child_token(),
    ));

    let reporter_handle = tokio::spawn(run_status_reporter(
        Arc::clone(&stats),
        config.stream.report_status_every,
        cancel.child_token(),
    ));

    info!("Starting log stream");
    let supervisor = StreamSupervisor::new(
        api,
        connector,
        target,
        LogFilters::from(&config.filters),
    );
    let mut supervisor_handle = tokio::spawn(supervisor.run(batch_tx, cancel.clone()));

    let result = tokio::select! {
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received");
            cancel.cancel();
            supervisor_handle.await?
        }
        result = &mut supervisor_handle => result?,
    };

    if let Err(e) = &result {
        error!(error = %e, "Log stream stopped");
    }

    // Dropping the supervisor's sender lets the distributor drain and exit
    match distributor_handle.await {
        Ok(()) => info!("Distributor task completed"),
        Err(e) => error!(error = %e, "Distributor task join error"),
    }

    cancel.cancel();
    let _ = reporter_handle.await;

    info!("Shutdown complete");

    result.map_err(RunError::from)
}
