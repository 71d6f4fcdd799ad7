//! Reconciliation and state layer between `aquamon-api` and UI consumers.
//!
//! This crate owns the domain model and the merge logic that turns the
//! three independent telemetry streams of a pond-aquaculture site into
//! one consistent in-memory view:
//!
//! - **[`Controller`]** — Facade managing one site's lifecycle:
//!   [`connect()`](Controller::connect) validates the configuration, opens
//!   the telemetry channel, and pumps decoded frames into the store until
//!   [`shutdown()`](Controller::shutdown).
//!
//! - **[`TelemetryStore`]** — Single-owner reactive storage for the pond
//!   collection. Mutations go through the reconciliation core; consumers
//!   subscribe to `tokio::sync::watch` snapshots.
//!
//! - **Reconciliation** ([`reconcile`]) — The merge core: command acks
//!   and mode acks ([`reconcile::apply_ack`]), live telemetry
//!   ([`reconcile::apply_live_data`]), and the fixed-order orchestrators
//!   ([`reconcile::reconcile_ponds`] / [`reconcile::reconcile_motors`]).
//!
//! - **Command grouping** ([`command`]) — Turns per-motor action requests
//!   into per-gateway publish frames, folding motors on the same starter
//!   box into one device entry.
//!
//! - **Domain model** ([`model`]) — Canonical types (`Pond`, `Motor`,
//!   `StarterBox`, `ControlMode`, …) with [`MacAddress`] normalizing the
//!   device identifiers the wire formats disagree on.

pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use command::{CommandFrame, MotorAction, MotorCommandRequest, build_command_frames};
pub use config::SiteConfig;
pub use controller::{ConnectionState, Controller};
pub use error::CoreError;
pub use reconcile::{AckField, FaultTarget, reconcile_motors, reconcile_ponds};
pub use store::TelemetryStore;

// Re-export model types at the crate root for ergonomics.
pub use model::{
    ControlMode,
    FaultStatus,
    MacAddress,
    Motor,
    MotorRef,
    MotorState,
    Pond,
    StarterBox,
    StarterBoxReading,
};
