use super::protocol::{decode_frame, Frame, ResumeWindow, SubscribeRequest};
use super::session::{ConnectError, Session, StreamError};
use super::transport::Connector;
use crate::graphql::PlatformApi;
use crate::metadata::{self, NameTable, ResolutionError};
use crate::pipeline::{process, BatchSender, LogFilters};
use crate::target::{ServiceSelector, Target};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// How far back the first subscription replays, in seconds.
pub const RESUME_LOOKBACK_SECS: i64 = 5 * 60;

/// Maximum backlog replayed on every (re)subscribe.
pub const RESUME_LIMIT: u32 = 500;

/// Conditions that end the supervisor. Transient stream failures never
/// surface here; they are handled by resubscribing.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("error building metadata map: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("failed to open subscription: {0}")]
    Connect(#[from] ConnectError),

    #[error("malformed next envelope: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("output channel closed")]
    ChannelClosed,
}

/// Keeps one subscription alive for the lifetime of the process and feeds
/// every inbound batch through the enrichment pipeline.
pub struct StreamSupervisor {
    api: Arc<dyn PlatformApi>,
    connector: Arc<dyn Connector>,
    target: Target,
    filters: LogFilters,
}

impl StreamSupervisor {
    pub fn new(
        api: Arc<dyn PlatformApi>,
        connector: Arc<dyn Connector>,
        target: Target,
        filters: LogFilters,
    ) -> Self {
        Self {
            api,
            connector,
            target,
            filters,
        }
    }

    /// Run until cancelled or a fatal error occurs.
    ///
    /// Returns `Ok(())` only on cancellation.
    pub async fn run(
        self,
        output: BatchSender,
        cancel: CancellationToken,
    ) -> Result<(), SupervisorError> {
        let started_at = Utc::now();

        let Some(table) = until_cancelled(metadata::resolve(self.api.as_ref(), &self.target), &cancel).await else {
            return Ok(());
        };
        let table = table?;

        let Some(service_ids) = until_cancelled(self.service_ids(), &cancel).await else {
            return Ok(());
        };
        let service_ids = service_ids?;

        let mut request = SubscribeRequest::new(
            self.target.environment_id.clone(),
            service_ids,
            ResumeWindow {
                from: started_at - chrono::Duration::seconds(RESUME_LOOKBACK_SECS),
                limit: RESUME_LIMIT,
            },
        );

        let Some(mut session) = self.open(&request, &cancel).await? else {
            return Ok(());
        };

        info!(
            environment_id = %request.environment_id,
            services = request.service_ids.len(),
            "Subscribed to environment logs"
        );

        self.stream(&mut session, &mut request, &table, started_at, &output, &cancel)
            .await
    }

    async fn stream(
        &self,
        session: &mut Session,
        request: &mut SubscribeRequest,
        table: &NameTable,
        started_at: DateTime<Utc>,
        output: &BatchSender,
        cancel: &CancellationToken,
    ) -> Result<(), SupervisorError> {
        let mut watermark = started_at;

        loop {
            let frame = match session.read(cancel).await {
                Ok(frame) => frame,
                Err(StreamError::Cancelled) => {
                    let _ = session.close().await;
                    return Ok(());
                }
                Err(e) => {
                    debug!(reason = %e, "resubscribing");
                    if !self.resubscribe(session, request, watermark, cancel).await? {
                        return Ok(());
                    }
                    continue;
                }
            };

            let batch = match decode_frame(&frame)? {
                Frame::Logs(batch) => batch,
                Frame::Other(kind) => {
                    debug!(reason = %format!("log type not next: {kind}"), "resubscribing");
                    if !self.resubscribe(session, request, watermark, cancel).await? {
                        return Ok(());
                    }
                    continue;
                }
            };

            let (surviving, advanced) = process(batch, watermark, table, &self.filters);
            watermark = advanced;

            if surviving.is_empty() {
                continue;
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = session.close().await;
                    return Ok(());
                }
                sent = output.send(surviving) => {
                    if sent.is_err() {
                        let _ = session.close().await;
                        return Err(SupervisorError::ChannelClosed);
                    }
                }
            }
        }
    }

    /// Replace `session` with a fresh one resuming from `watermark`.
    ///
    /// Returns `false` if cancelled while reconnecting.
    async fn resubscribe(
        &self,
        session: &mut Session,
        request: &mut SubscribeRequest,
        watermark: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<bool, SupervisorError> {
        if let Err(e) = session.close().await {
            debug!(error = %e, "error closing broken session");
        }

        request.resume = ResumeWindow {
            from: watermark,
            limit: RESUME_LIMIT,
        };

        match self.open(request, cancel).await? {
            Some(fresh) => {
                *session = fresh;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn open(
        &self,
        request: &SubscribeRequest,
        cancel: &CancellationToken,
    ) -> Result<Option<Session>, SupervisorError> {
        match Session::open(self.connector.as_ref(), request, cancel).await {
            Ok(session) => Ok(Some(session)),
            Err(ConnectError::Cancelled) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn service_ids(&self) -> Result<Vec<String>, ResolutionError> {
        match &self.target.services {
            ServiceSelector::Pinned(ids) => Ok(ids.clone()),
            ServiceSelector::Discover => {
                let project_id = self
                    .target
                    .project_id
                    .as_deref()
                    .ok_or(ResolutionError::MissingProject)?;
                metadata::discover(self.api.as_ref(), project_id, &self.target.environment_id)
                    .await
            }
        }
    }
}

async fn until_cancelled<F: Future>(fut: F, cancel: &CancellationToken) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}
