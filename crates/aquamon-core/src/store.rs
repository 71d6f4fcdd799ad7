// ── Reactive telemetry store ──
//
// Single owner of the pond collection. Inbound frames and listing
// refreshes mutate the owned collection under one lock; subscribers get
// cheap `Arc` snapshots through `watch` channels. This is the
// concurrency story for the in-place reconciliation functions: nothing
// outside the store ever holds a mutable reference.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use aquamon_api::TelemetryFrame;

use crate::model::Pond;
use crate::reconcile::reconcile_ponds;

/// Reactive storage for the pond/motor collection.
pub struct TelemetryStore {
    /// The owned collection. Lock is held only for synchronous merges,
    /// never across an await.
    ponds: Mutex<Vec<Pond>>,

    /// Full snapshot, rebuilt on mutation for efficient subscription.
    snapshot: watch::Sender<Arc<Vec<Pond>>>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// When the store last changed (frame or listing).
    last_update: watch::Sender<Option<DateTime<Utc>>>,
}

impl Default for TelemetryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryStore {
    pub fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        let (version, _) = watch::channel(0u64);
        let (last_update, _) = watch::channel(None);

        Self {
            ponds: Mutex::new(Vec::new()),
            snapshot,
            version,
            last_update,
        }
    }

    /// Route one decoded frame through the reconciliation orchestrator.
    pub fn apply_frame(&self, frame: &TelemetryFrame) {
        let mut ponds = self.lock_ponds();

        match frame {
            TelemetryFrame::CommandAck(ack) => {
                tracing::debug!("applying command ack");
                reconcile_ponds(&mut ponds, Some(ack), None, None);
            }
            TelemetryFrame::ModeAck(ack) => {
                tracing::debug!("applying mode ack");
                reconcile_ponds(&mut ponds, None, Some(ack), None);
            }
            TelemetryFrame::LiveData(live) => {
                tracing::debug!(device = live.d_id.as_deref().unwrap_or("<none>"), "applying live data");
                reconcile_ponds(&mut ponds, None, None, Some(live));
            }
        }

        self.publish(&ponds);
    }

    /// Replace the collection with a fresh provisioning listing.
    ///
    /// Runtime fields (state, mode, readings, faults) are preserved for
    /// motors that survive the refresh, keyed by (MAC, ref label) --
    /// listings come from the provisioning backend and carry none of
    /// the live telemetry, so replacing wholesale would blank the
    /// dashboard until the next frame.
    pub fn apply_listing(&self, mut incoming: Vec<Pond>) {
        let mut ponds = self.lock_ponds();

        let mut runtime: HashMap<(String, String), RuntimeFields> = HashMap::new();
        for pond in ponds.iter() {
            for m in &pond.motors {
                runtime.insert(
                    (
                        m.starter_box.mac.as_str().to_owned(),
                        m.motor_ref.label().to_owned(),
                    ),
                    RuntimeFields {
                        state: m.state,
                        mode: m.mode,
                        parameters: m.parameters.clone(),
                        faults: m.faults.clone(),
                    },
                );
            }
        }

        let mut preserved = 0usize;
        for pond in &mut incoming {
            for m in &mut pond.motors {
                let key = (
                    m.starter_box.mac.as_str().to_owned(),
                    m.motor_ref.label().to_owned(),
                );
                if let Some(fields) = runtime.get(&key) {
                    m.state = fields.state;
                    m.mode = fields.mode;
                    m.parameters = fields.parameters.clone();
                    m.faults = fields.faults.clone();
                    preserved += 1;
                }
            }
        }

        tracing::info!(
            ponds = incoming.len(),
            preserved,
            "applied pond listing refresh"
        );

        *ponds = incoming;
        self.publish(&ponds);
    }

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<Vec<Pond>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Vec<Pond>>> {
        self.snapshot.subscribe()
    }

    /// Subscribe to the mutation counter.
    pub fn subscribe_version(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// When the store last changed, if ever.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        *self.last_update.borrow()
    }

    pub fn motor_count(&self) -> usize {
        self.lock_ponds().iter().map(|p| p.motors.len()).sum()
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// A poisoned lock just means another thread panicked mid-merge;
    /// the data itself is a plain collection, keep serving it.
    fn lock_ponds(&self) -> MutexGuard<'_, Vec<Pond>> {
        match self.ponds.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn publish(&self, ponds: &[Pond]) {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(ponds.to_vec()));
        self.version.send_modify(|v| *v += 1);
        self.last_update.send_modify(|t| *t = Some(Utc::now()));
    }
}

struct RuntimeFields {
    state: crate::model::MotorState,
    mode: crate::model::ControlMode,
    parameters: Vec<crate::model::StarterBoxReading>,
    faults: crate::model::FaultStatus,
}
