//! HTTP proxy to the Core retrieval/answer service.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::time::{timeout, Instant};
use tracing::{debug, trace, warn};

use goftar_core::{
    defaults, Error, QueryChunk, QueryRequest, QueryResult, RemoteConversations, Result,
};

use crate::sse::{SseEvent, SseParser};
use crate::types::CoreQueryBody;

/// Default Core API endpoint.
pub const DEFAULT_CORE_URL: &str = "http://localhost:8000/api/v1";

/// Caller-facing stream of answer chunks. Lazy, ordered, finite, and not
/// restartable: retrying means opening a new request.
pub type QueryStream = Pin<Box<dyn Stream<Item = Result<QueryChunk>> + Send>>;

/// Configuration for the Core proxy.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Base URL for the Core API.
    pub base_url: String,
    /// Buffered query timeout in seconds. Long, to accommodate retrieval
    /// plus generation latency.
    pub query_timeout_secs: u64,
    /// Maximum silence between streamed chunks.
    pub stream_idle_timeout_secs: u64,
    /// Overall ceiling for one streamed response.
    pub stream_total_timeout_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_CORE_URL.to_string(),
            query_timeout_secs: defaults::QUERY_TIMEOUT_SECS,
            stream_idle_timeout_secs: defaults::STREAM_IDLE_TIMEOUT_SECS,
            stream_total_timeout_secs: defaults::STREAM_TOTAL_TIMEOUT_SECS,
        }
    }
}

impl CoreConfig {
    /// Create a config for the given base URL with default timeouts.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Create from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `CORE_BASE_URL` | `http://localhost:8000/api/v1` | Core API endpoint |
    /// | `CORE_QUERY_TIMEOUT_SECS` | `300` | Buffered query timeout |
    /// | `CORE_STREAM_IDLE_TIMEOUT_SECS` | `60` | Per-chunk idle timeout |
    /// | `CORE_STREAM_TOTAL_TIMEOUT_SECS` | `600` | Streaming ceiling |
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            base_url: std::env::var("CORE_BASE_URL").unwrap_or(base.base_url),
            query_timeout_secs: std::env::var("CORE_QUERY_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.query_timeout_secs),
            stream_idle_timeout_secs: std::env::var("CORE_STREAM_IDLE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.stream_idle_timeout_secs),
            stream_total_timeout_secs: std::env::var("CORE_STREAM_TOTAL_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.stream_total_timeout_secs),
        }
    }
}

/// Proxy over the Core service's query and conversation endpoints.
pub struct CoreProxy {
    client: reqwest::Client,
    config: CoreConfig,
}

impl CoreProxy {
    /// Create a new proxy with the given configuration.
    ///
    /// No client-wide timeout is set: buffered calls get a per-request
    /// deadline and streaming connections are bounded by the idle/total
    /// timers instead.
    pub fn new(config: CoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Config(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    /// Send a buffered query. One HTTP round-trip: the whole answer or an
    /// error, never partial data.
    pub async fn send(&self, request: &QueryRequest, bearer: &str) -> Result<QueryResult> {
        request.validate()?;

        debug!(
            subsystem = "bridge",
            component = "proxy",
            op = "send",
            language = %request.language,
            attachments = request.attachments.len(),
            "Sending buffered query"
        );

        let response = self
            .client
            .post(self.url("/query"))
            .bearer_auth(bearer)
            .json(&CoreQueryBody::from(request))
            .timeout(Duration::from_secs(self.config.query_timeout_secs))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        // The per-request deadline covers the body read too, so a stall
        // here is still a timeout; only decode failures are serialization
        // errors.
        let result: QueryResult = response.json().await.map_err(|e| {
            if e.is_decode() {
                Error::Serialization(format!("invalid Core response: {}", e))
            } else {
                Error::from(e)
            }
        })?;

        debug!(
            subsystem = "bridge",
            component = "proxy",
            op = "send",
            conversation_id = %result.conversation_id,
            tokens_used = result.tokens_used,
            "Buffered query answered"
        );
        Ok(result)
    }

    /// Open a streamed query.
    ///
    /// The upstream body is consumed by a dedicated task and handed to the
    /// caller through a bounded channel, so a slow caller applies
    /// backpressure instead of unbounded buffering and nothing busy-polls.
    /// Dropping the returned stream closes the channel; the reader task
    /// notices immediately and drops the upstream connection.
    pub async fn send_stream(&self, request: &QueryRequest, bearer: &str) -> Result<QueryStream> {
        request.validate()?;

        let response = self
            .client
            .post(self.url("/query/stream"))
            .bearer_auth(bearer)
            .json(&CoreQueryBody::from(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream {
                status: status.as_u16(),
                body,
            });
        }

        let idle = Duration::from_secs(self.config.stream_idle_timeout_secs);
        let deadline = Instant::now() + Duration::from_secs(self.config.stream_total_timeout_secs);
        let (tx, rx) = mpsc::channel(defaults::STREAM_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            let mut body = response.bytes_stream();
            let mut parser = SseParser::new();

            // Start marker first: lets callers tell "connected" from
            // "no data yet".
            if tx.send(Ok(QueryChunk::Start)).await.is_err() {
                return;
            }

            loop {
                let remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    let _ = tx
                        .send(Err(Error::StreamInterrupted(
                            "stream exceeded total time ceiling".to_string(),
                        )))
                        .await;
                    return;
                }

                // Watch for caller disconnect while waiting on the body;
                // otherwise a silent upstream holds the connection until
                // the idle timer fires.
                let next = tokio::select! {
                    _ = tx.closed() => return,
                    next = timeout(idle.min(remaining), body.next()) => match next {
                        Ok(next) => next,
                        Err(_) => {
                            let _ = tx
                                .send(Err(Error::StreamInterrupted(
                                    "idle timeout between chunks".to_string(),
                                )))
                                .await;
                            return;
                        }
                    },
                };

                match next {
                    Some(Ok(bytes)) => {
                        trace!(
                            subsystem = "bridge",
                            component = "proxy",
                            bytes = bytes.len(),
                            "Stream chunk received"
                        );
                        for event in parser.push(&bytes) {
                            match event {
                                Ok(SseEvent::Delta(text)) => {
                                    if tx.send(Ok(QueryChunk::Delta(text))).await.is_err() {
                                        return;
                                    }
                                }
                                Ok(SseEvent::Done) => {
                                    let _ = tx.send(Ok(QueryChunk::End)).await;
                                    return;
                                }
                                Err(e) => {
                                    let _ = tx.send(Err(e)).await;
                                    return;
                                }
                            }
                        }
                    }
                    Some(Err(e)) => {
                        let _ = tx
                            .send(Err(Error::StreamInterrupted(format!(
                                "upstream read failed: {}",
                                e
                            ))))
                            .await;
                        return;
                    }
                    // Connection closed without the end sentinel: a silent
                    // end is indistinguishable from a complete answer, so
                    // this must surface as an error.
                    None => {
                        let _ = tx
                            .send(Err(Error::StreamInterrupted(
                                "upstream closed before end marker".to_string(),
                            )))
                            .await;
                        return;
                    }
                }
            }
        });

        let stream = futures::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|item| (item, rx))
        });
        Ok(Box::pin(stream))
    }
}

#[async_trait]
impl RemoteConversations for CoreProxy {
    async fn delete_conversation(&self, remote_id: &str, bearer: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/conversations/{}", remote_id)))
            .bearer_auth(bearer)
            .timeout(Duration::from_secs(self.config.query_timeout_secs))
            .send()
            .await?;

        let status = response.status();
        // 404 means the conversation is already gone, which is the goal
        // state of a deletion.
        if status.is_success() || status.as_u16() == 404 {
            debug!(
                subsystem = "bridge",
                component = "proxy",
                op = "delete_conversation",
                conversation_id = %remote_id,
                status = status.as_u16(),
                "Remote conversation deleted"
            );
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(
            subsystem = "bridge",
            component = "proxy",
            op = "delete_conversation",
            conversation_id = %remote_id,
            status = status.as_u16(),
            "Remote conversation delete failed"
        );
        Err(Error::Upstream {
            status: status.as_u16(),
            body,
        })
    }
}
