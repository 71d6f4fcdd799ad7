//! Telemetry channel: a persistent pub/sub subscription with auto-reconnect.
//!
//! Connects to the farm broker's websocket endpoint and streams decoded
//! [`TelemetryFrame`]s through a [`tokio::sync::broadcast`] channel.
//! Reconnects with exponential backoff + jitter. Malformed frames are
//! dropped with a debug log — a single bad frame must never stall the
//! stream (the dashboard simply stays stale until the next good one).
//!
//! # Example
//!
//! ```rust,ignore
//! use aquamon_api::channel::{ReconnectConfig, TelemetryChannel};
//! use tokio_util::sync::CancellationToken;
//! use url::Url;
//!
//! let cancel = CancellationToken::new();
//! let url = Url::parse("wss://broker.farm.local/sub")?;
//!
//! let channel = TelemetryChannel::connect(url, ReconnectConfig::default(), cancel.clone(), None).await?;
//! let mut rx = channel.subscribe();
//!
//! while let Ok(frame) = rx.recv().await {
//!     println!("{frame:?}");
//! }
//!
//! channel.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::payload::{AckEnvelope, AckPayload, LiveDataPayload};

// ── Broadcast channel capacity ───────────────────────────────────────

const FRAME_CHANNEL_CAPACITY: usize = 1024;

// ── Topic suffixes ───────────────────────────────────────────────────

/// Last topic segment for command acknowledgements.
pub const COMMAND_ACK_TOPIC: &str = "cmd_ack";
/// Last topic segment for mode-change acknowledgements.
pub const MODE_ACK_TOPIC: &str = "mode_ack";
/// Last topic segment for live telemetry snapshots.
pub const LIVE_DATA_TOPIC: &str = "live_data";

// ── TelemetryFrame ───────────────────────────────────────────────────

/// One decoded frame off the wire, classified by topic.
#[derive(Debug, Clone)]
pub enum TelemetryFrame {
    /// Start/stop command acknowledgement.
    CommandAck(AckPayload),
    /// Control-mode change acknowledgement.
    ModeAck(AckPayload),
    /// Live electrical telemetry snapshot.
    LiveData(LiveDataPayload),
}

// ── ReconnectConfig ──────────────────────────────────────────────────

/// Exponential backoff configuration for channel reconnection.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Delay before the first reconnection attempt. Default: 1s.
    pub initial_delay: Duration,

    /// Upper bound on backoff delay. Default: 30s.
    pub max_delay: Duration,

    /// Maximum reconnection attempts before giving up.
    /// `None` means retry forever.
    pub max_retries: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            max_retries: None,
        }
    }
}

// ── TelemetryChannel ─────────────────────────────────────────────────

/// Handle to a running telemetry subscription.
///
/// Drop all receivers and call [`shutdown`](Self::shutdown) to tear down
/// the background task.
pub struct TelemetryChannel {
    frame_rx: broadcast::Receiver<Arc<TelemetryFrame>>,
    cancel: CancellationToken,
}

impl TelemetryChannel {
    /// Connect to the broker and spawn the reconnection loop.
    ///
    /// Returns immediately once the background task is spawned; the first
    /// connection attempt happens asynchronously. If `auth_token` is set,
    /// it is sent as a bearer `Authorization` header on the upgrade
    /// request.
    pub async fn connect(
        ws_url: Url,
        reconnect: ReconnectConfig,
        cancel: CancellationToken,
        auth_token: Option<String>,
    ) -> Result<Self, Error> {
        let (frame_tx, frame_rx) = broadcast::channel(FRAME_CHANNEL_CAPACITY);

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            channel_loop(ws_url, frame_tx, reconnect, task_cancel, auth_token).await;
        });

        Ok(Self { frame_rx, cancel })
    }

    /// Get a new broadcast receiver for the frame stream.
    ///
    /// Multiple consumers can subscribe concurrently. A consumer that
    /// falls behind receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TelemetryFrame>> {
        self.frame_rx.resubscribe()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → read → on error, backoff → reconnect.
async fn channel_loop(
    ws_url: Url,
    frame_tx: broadcast::Sender<Arc<TelemetryFrame>>,
    reconnect: ReconnectConfig,
    cancel: CancellationToken,
    auth_token: Option<String>,
) {
    let mut attempt: u32 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = connect_and_read(&ws_url, &frame_tx, &cancel, auth_token.as_deref()) => {
                match result {
                    // Clean disconnect: reset the attempt counter and
                    // reconnect immediately.
                    Ok(()) => {
                        tracing::info!("telemetry channel disconnected cleanly, reconnecting");
                        attempt = 0;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, attempt, "telemetry channel error");

                        if let Some(max) = reconnect.max_retries {
                            if attempt >= max {
                                tracing::error!(
                                    max_retries = max,
                                    "telemetry channel reconnection limit reached, giving up"
                                );
                                break;
                            }
                        }

                        let delay = calculate_backoff(attempt, &reconnect);
                        tracing::info!(
                            delay_ms = delay.as_millis() as u64,
                            attempt,
                            "waiting before reconnect"
                        );

                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(delay) => {}
                        }

                        attempt += 1;
                    }
                }
            }
        }
    }
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one websocket connection, read frames until it drops.
async fn connect_and_read(
    url: &Url,
    frame_tx: &broadcast::Sender<Arc<TelemetryFrame>>,
    cancel: &CancellationToken,
    auth_token: Option<&str>,
) -> Result<(), Error> {
    tracing::info!(url = %url, "connecting telemetry channel");

    let uri: tungstenite::http::Uri = url
        .as_str()
        .parse()
        .map_err(|e: tungstenite::http::uri::InvalidUri| Error::ChannelConnect(e.to_string()))?;

    let mut request = ClientRequestBuilder::new(uri);
    if let Some(token) = auth_token {
        request = request.with_header("Authorization", format!("Bearer {token}"));
    }

    let (ws_stream, _response) = tokio_tungstenite::connect_async(request)
        .await
        .map_err(|e| Error::ChannelConnect(e.to_string()))?;

    tracing::info!("telemetry channel connected");

    let (_write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        decode_and_publish(&text, frame_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite replies with pong automatically
                        tracing::trace!("telemetry channel ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "telemetry channel close frame received"
                            );
                        } else {
                            tracing::info!("telemetry channel close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::ChannelConnect(e.to_string()));
                    }
                    None => {
                        tracing::info!("telemetry channel stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

// ── Frame decoding ───────────────────────────────────────────────────

/// Broker envelope: every published message carries its topic alongside
/// the payload.
#[derive(Debug, Deserialize)]
struct WireEnvelope {
    topic: String,
    payload: Value,
}

/// Parse one text frame and broadcast the decoded payload, if any.
fn decode_and_publish(text: &str, frame_tx: &broadcast::Sender<Arc<TelemetryFrame>>) {
    let envelope: WireEnvelope = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(e) => {
            tracing::debug!(error = %e, "failed to parse telemetry envelope");
            return;
        }
    };

    match decode_frame(&envelope.topic, envelope.payload, text) {
        Ok(Some(frame)) => {
            // Ignore send errors -- just means no active subscribers right now
            let _ = frame_tx.send(Arc::new(frame));
        }
        Ok(None) => {
            tracing::debug!(topic = %envelope.topic, "ignoring frame on unhandled topic");
        }
        Err(e) => {
            tracing::debug!(error = %e, topic = %envelope.topic, "dropping undecodable frame");
        }
    }
}

/// Classify a frame by the last segment of its topic and decode the
/// payload accordingly. Unknown topics yield `Ok(None)`.
fn decode_frame(topic: &str, payload: Value, raw: &str) -> Result<Option<TelemetryFrame>, Error> {
    let kind = topic.rsplit('/').next().unwrap_or(topic);
    let frame = match kind {
        COMMAND_ACK_TOPIC => decode_ack(payload, raw)?.map(TelemetryFrame::CommandAck),
        MODE_ACK_TOPIC => decode_ack(payload, raw)?.map(TelemetryFrame::ModeAck),
        LIVE_DATA_TOPIC => {
            let live: LiveDataPayload =
                serde_json::from_value(payload).map_err(|e| Error::deserialization(&e, raw))?;
            Some(TelemetryFrame::LiveData(live))
        }
        _ => None,
    };
    Ok(frame)
}

/// Decode an ack payload, normalizing the bare-vs-array envelope shape.
fn decode_ack(payload: Value, raw: &str) -> Result<Option<AckPayload>, Error> {
    let envelope: AckEnvelope =
        serde_json::from_value(payload).map_err(|e| Error::deserialization(&e, raw))?;
    Ok(envelope.into_payload())
}

// ── Backoff calculation ──────────────────────────────────────────────

/// Exponential backoff with jitter.
///
/// `delay = min(initial * 2^attempt, max) + jitter`
///
/// Jitter is +-25% to spread out reconnection storms from multiple clients.
fn calculate_backoff(attempt: u32, config: &ReconnectConfig) -> Duration {
    let base = config.initial_delay.as_secs_f64() * 2.0_f64.powi(attempt as i32);
    let capped = base.min(config.max_delay.as_secs_f64());

    // Deterministic "jitter" seeded from the attempt number.
    // Not cryptographically random, but good enough for backoff spread.
    let jitter_factor = 1.0 + 0.25 * ((attempt as f64 * 7.3).sin());
    let with_jitter = (capped * jitter_factor).max(0.0);

    Duration::from_secs_f64(with_jitter)
}

// ── Tests ────────────────────────────────────────────────────────────
