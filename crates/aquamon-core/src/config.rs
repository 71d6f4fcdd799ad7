// ── Runtime connection configuration ──
//
// Describes *how* to reach one farm site's telemetry broker. Carries
// credential data and connection tuning, but never touches disk -- the
// embedding dashboard constructs a `SiteConfig` and hands it in.

use secrecy::SecretString;
use url::Url;

use crate::error::CoreError;
use aquamon_api::ReconnectConfig;

/// Configuration for one farm site's telemetry connection.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Broker websocket URL (e.g., `wss://broker.farm.local/sub`).
    pub broker_url: Url,

    /// Bearer token for the broker, if it requires auth.
    /// `SecretString` keeps it out of Debug output.
    pub auth_token: Option<SecretString>,

    /// Leading topic segment all of this site's topics share
    /// (e.g. `"farm-07"` → `farm-07/<gateway>/live_data`).
    pub topic_prefix: String,

    /// Human-readable site label, used in diagnostics only.
    pub site_name: String,

    /// Channel reconnect tuning, passed through to the transport.
    pub reconnect: ReconnectConfig,

    /// Whether to open the telemetry channel on connect. Disabled sites
    /// are fed by the embedder calling the store directly.
    pub channel_enabled: bool,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            // Local mosquitto-over-websocket default.
            broker_url: Url::parse("ws://127.0.0.1:9001/sub")
                .unwrap_or_else(|_| unreachable!("static default URL is valid")),
            auth_token: None,
            topic_prefix: "farm".into(),
            site_name: "default".into(),
            reconnect: ReconnectConfig::default(),
            channel_enabled: true,
        }
    }
}

impl SiteConfig {
    /// Check invariants the rest of the core relies on.
    pub fn validate(&self) -> Result<(), CoreError> {
        match self.broker_url.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(CoreError::config(format!(
                    "broker URL must use ws:// or wss://, got {other}://"
                )));
            }
        }
        if self.topic_prefix.is_empty() {
            return Err(CoreError::config("topic prefix must not be empty"));
        }
        if self.topic_prefix.contains('/') {
            return Err(CoreError::config(
                "topic prefix must be a single segment (no '/')",
            ));
        }
        if self.site_name.is_empty() {
            return Err(CoreError::config("site name must not be empty"));
        }
        Ok(())
    }
}
