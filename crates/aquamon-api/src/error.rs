use thiserror::Error;

/// Top-level error type for the `aquamon-api` crate.
///
/// Covers the transport and decode failure modes of the telemetry channel.
/// `aquamon-core` maps these into user-facing diagnostics.
#[derive(Debug, Error)]
pub enum Error {
    // ── Channel ─────────────────────────────────────────────────────
    /// Websocket connection to the broker failed or dropped mid-read.
    /// Broker-initiated close frames are a clean disconnect, not an error.
    #[error("Telemetry channel connection failed: {0}")]
    ChannelConnect(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Wrap a serde failure together with the frame body that caused it.
    pub(crate) fn deserialization(err: &serde_json::Error, body: impl Into<String>) -> Self {
        Self::Deserialization {
            message: err.to_string(),
            body: body.into(),
        }
    }
}
