// ── Core error types ──
//
// User-facing errors from aquamon-core. Consumers never see raw
// websocket or JSON failures directly; the `From<aquamon_api::Error>`
// impl wraps transport-layer errors.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Configuration ────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("Motor not found: {identifier}")]
    MotorNotFound { identifier: String },

    #[error("Starter box {mac} has no gateway assigned")]
    GatewayUnassigned { mac: String },

    // ── Channel ──────────────────────────────────────────────────────
    #[error("Telemetry channel error: {0}")]
    Channel(#[from] aquamon_api::Error),
}

impl CoreError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}
