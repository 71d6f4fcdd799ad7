//! Wire-level layer for aquamon: payload types and the telemetry channel.
//!
//! Starter boxes publish three kinds of JSON frames over a persistent
//! pub/sub connection:
//!
//! - **command acks** — confirmation that a start/stop request was applied,
//! - **mode acks** — confirmation that a control-mode change was applied,
//! - **live data** — periodic electrical telemetry snapshots per device.
//!
//! This crate decodes those frames into canonical payload structs
//! ([`payload`]) and streams them through [`channel::TelemetryChannel`],
//! a websocket subscription with auto-reconnect. All shape normalization
//! (bare object vs. singleton array acks, non-array `mtr` fields, numeric
//! strings where integers are expected) happens here, once, at the decode
//! boundary — consumers in `aquamon-core` only ever see canonical records.

pub mod channel;
pub mod error;
pub mod payload;

pub use channel::{ReconnectConfig, TelemetryChannel, TelemetryFrame};
pub use error::Error;
pub use payload::{
    AckEnvelope, AckPayload, CommandDevice, CommandPayload, DeviceAck, LiveDataPayload, LiveMotor,
};
