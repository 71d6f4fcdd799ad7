// ── Telemetry reconciliation ──
//
// Merges the three independently-arriving frame kinds -- command acks,
// mode acks, live telemetry -- into a consistent in-memory view of
// every motor, keyed by device MAC and motor ref.
//
// The application order is fixed: command ack, then mode ack, then
// live data. Later steps may overwrite earlier ones and downstream
// consumers rely on that precedence; callers hand each received frame
// to the orchestrator exactly once, in arrival order.
//
// Everything here mutates the caller's collection in place and never
// clones -- these functions run on every inbound frame. Callers that
// need an immutable view copy first (or go through `TelemetryStore`,
// which owns the collection and publishes snapshots).

pub mod ack;
pub mod live;

pub use ack::{AckField, apply_ack};
pub use live::{FaultTarget, apply_live_data};

use aquamon_api::payload::{AckPayload, LiveDataPayload};

use crate::model::{Motor, Pond};

/// Reconcile one delivery of frames into a pond-nested motor collection.
///
/// Fault codes land in `motor.faults.fault_code` on this path (see
/// [`FaultTarget`] for why the flat path differs).
pub fn reconcile_ponds(
    ponds: &mut [Pond],
    cmd_ack: Option<&AckPayload>,
    mode_ack: Option<&AckPayload>,
    live_data: Option<&LiveDataPayload>,
) {
    if let Some(ack) = cmd_ack {
        for pond in ponds.iter_mut() {
            apply_ack(ack, &mut pond.motors, AckField::State);
        }
    }
    if let Some(ack) = mode_ack {
        for pond in ponds.iter_mut() {
            apply_ack(ack, &mut pond.motors, AckField::Mode);
        }
    }
    if let Some(data) = live_data {
        for pond in ponds.iter_mut() {
            apply_live_data(data, &mut pond.motors, FaultTarget::FaultStatus);
        }
    }
}

/// Reconcile one delivery of frames into a flat motor listing.
///
/// Identical outcome to [`reconcile_ponds`] for the same motors, except
/// fault codes land in `parameters[0].fault_code` on this path.
pub fn reconcile_motors(
    motors: &mut [Motor],
    cmd_ack: Option<&AckPayload>,
    mode_ack: Option<&AckPayload>,
    live_data: Option<&LiveDataPayload>,
) {
    if let Some(ack) = cmd_ack {
        apply_ack(ack, motors, AckField::State);
    }
    if let Some(ack) = mode_ack {
        apply_ack(ack, motors, AckField::Mode);
    }
    if let Some(data) = live_data {
        apply_live_data(data, motors, FaultTarget::Reading);
    }
}
