// ── Domain model ──
//
// Canonical representations of the pond/motor/starter-box world.
// Wire payloads (`aquamon_api::payload`) are merged into these by the
// reconciliation core; UI consumers only ever see these types.

pub mod ids;
pub mod mode;
pub mod motor;
pub mod pond;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use aquamon_core::model::*` gives you everything.

pub use ids::{MacAddress, MotorRef};
pub use mode::ControlMode;
pub use motor::{FaultStatus, Motor, MotorState, StarterBox, StarterBoxReading};
pub use pond::Pond;
