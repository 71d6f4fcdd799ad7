// ── Site controller ──
//
// Owns the lifecycle of one site's telemetry connection: opens the
// channel, pumps decoded frames into the store, and exposes command
// building over the current snapshot. The embedding dashboard holds a
// `Controller` (cheap to clone) and reads state through the store's
// watch channels.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use aquamon_api::TelemetryChannel;
use tokio::sync::broadcast::error::RecvError;

use crate::command::{CommandFrame, MotorCommandRequest, build_command_frames};
use crate::config::SiteConfig;
use crate::error::CoreError;
use crate::store::TelemetryStore;

/// Connection lifecycle of a site's telemetry channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// Handle to one monitored farm site.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: SiteConfig,
    store: Arc<TelemetryStore>,
    connection_state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
    channel: Mutex<Option<TelemetryChannel>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl Controller {
    pub fn new(config: SiteConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(ControllerInner {
                config,
                store: Arc::new(TelemetryStore::new()),
                connection_state,
                cancel: CancellationToken::new(),
                channel: Mutex::new(None),
                pump: Mutex::new(None),
            }),
        }
    }

    /// The site's reactive store.
    pub fn store(&self) -> Arc<TelemetryStore> {
        Arc::clone(&self.inner.store)
    }

    pub fn config(&self) -> &SiteConfig {
        &self.inner.config
    }

    pub fn connection_state(&self) -> ConnectionState {
        *self.inner.connection_state.borrow()
    }

    /// Subscribe to connection lifecycle changes.
    pub fn subscribe_connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    /// Validate the config and open the telemetry channel.
    ///
    /// For sites with the channel disabled, this only validates and
    /// reports `Connected`; the embedder feeds the store directly.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner.config.validate()?;

        if !self.inner.config.channel_enabled {
            tracing::info!(
                site = %self.inner.config.site_name,
                "telemetry channel disabled, store is externally fed"
            );
            self.set_state(ConnectionState::Connected);
            return Ok(());
        }

        self.set_state(ConnectionState::Connecting);

        let auth_token = self
            .inner
            .config
            .auth_token
            .as_ref()
            .map(|t| t.expose_secret().to_owned());

        let channel = TelemetryChannel::connect(
            self.inner.config.broker_url.clone(),
            self.inner.config.reconnect.clone(),
            self.inner.cancel.child_token(),
            auth_token,
        )
        .await
        .inspect_err(|_| self.set_state(ConnectionState::Failed))?;

        let mut rx = channel.subscribe();
        let store = Arc::clone(&self.inner.store);
        let state = self.inner.connection_state.clone();
        let site = self.inner.config.site_name.clone();

        let pump = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(frame) => store.apply_frame(&frame),
                    Err(RecvError::Lagged(skipped)) => {
                        // Next live snapshot restores the full picture.
                        tracing::warn!(site = %site, skipped, "telemetry pump lagged, frames dropped");
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!(site = %site, "telemetry pump stopped");
                        let _ = state.send(ConnectionState::Disconnected);
                        break;
                    }
                }
            }
        });

        *self.inner.channel.lock().await = Some(channel);
        *self.inner.pump.lock().await = Some(pump);

        self.set_state(ConnectionState::Connected);
        tracing::info!(site = %self.inner.config.site_name, "site controller connected");
        Ok(())
    }

    /// Tear down the channel and the frame pump.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        if let Some(channel) = self.inner.channel.lock().await.take() {
            channel.shutdown();
        }
        if let Some(pump) = self.inner.pump.lock().await.take() {
            pump.abort();
        }

        self.set_state(ConnectionState::Disconnected);
        tracing::info!(site = %self.inner.config.site_name, "site controller shut down");
    }

    /// Build per-gateway command frames against the current snapshot.
    pub fn build_commands(
        &self,
        requests: &[MotorCommandRequest],
    ) -> Result<Vec<CommandFrame>, CoreError> {
        let snapshot = self.inner.store.snapshot();
        build_command_frames(requests, &snapshot)
    }

    fn set_state(&self, state: ConnectionState) {
        let _ = self.inner.connection_state.send(state);
    }
}
