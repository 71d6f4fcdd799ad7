//! Canonical payload types for the three inbound frame kinds, plus the
//! outbound command frame shape.
//!
//! Field names mirror the starter-box firmware wire format (`d_id`, `ll_v`,
//! `mtr_sts`, ...). Everything the firmware may omit is `Option`: telemetry
//! transports are best-effort and a sparse frame must decode, not fail.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

// ── Acknowledgement frames ──────────────────────────────────────────

/// Ack frames arrive either as a bare object or as a singleton array
/// wrapping it. Decode accepts both; [`into_payload`](Self::into_payload)
/// collapses to the canonical single-object form.
///
/// `Batch` must stay first: untagged decoding tries variants in order,
/// and the derived `AckPayload` visitor would otherwise accept `[]` as
/// an empty object.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AckEnvelope {
    Batch(Vec<AckPayload>),
    Single(AckPayload),
}

impl AckEnvelope {
    /// Normalize to a single payload. An array takes element 0; an empty
    /// array yields `None`.
    pub fn into_payload(self) -> Option<AckPayload> {
        match self {
            Self::Single(payload) => Some(payload),
            Self::Batch(batch) => batch.into_iter().next(),
        }
    }
}

/// A batch acknowledgement from device firmware.
///
/// One entry per starter box; a missing `dev` sequence makes the whole
/// frame a no-op downstream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AckPayload {
    #[serde(default)]
    pub dev: Option<Vec<DeviceAck>>,
}

/// Per-device portion of an ack: the device MAC plus a sparse map of
/// motor-ref labels (`"mtr_1"`, `"mtr_2"`, ...) to control codes. An ack
/// batch may cover one or many of the device's motors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceAck {
    #[serde(default)]
    pub d_id: Option<String>,

    /// All remaining keys: motor-ref label → control code.
    #[serde(flatten)]
    pub motors: serde_json::Map<String, Value>,
}

impl DeviceAck {
    /// Whether this ack names the given motor-ref label at all.
    /// A motor not named must be left untouched by the merger.
    pub fn names(&self, motor_ref: &str) -> bool {
        self.motors.contains_key(motor_ref)
    }

    /// Control code for a motor-ref label, if present and numeric.
    pub fn code_for(&self, motor_ref: &str) -> Option<i64> {
        self.motors.get(motor_ref).and_then(Value::as_i64)
    }
}

// ── Live data frames ────────────────────────────────────────────────

/// A periodic telemetry snapshot from one starter box, covering all its
/// motors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveDataPayload {
    /// Device MAC address. Absent → the frame is a no-op.
    #[serde(default)]
    pub d_id: Option<String>,

    /// Per-phase line voltages (VRY, VYB, VBR). Missing slots stay empty.
    #[serde(default)]
    pub ll_v: Option<Vec<Option<f64>>>,

    /// Mains-power-present flag for the whole device.
    #[serde(default)]
    pub pwr: Option<i64>,

    /// Device-level mode code — only consulted when a motor entry carries
    /// no mode of its own.
    #[serde(default)]
    pub mode: Option<i64>,

    /// Per-motor readings. `None` when the field is absent or not a JSON
    /// array, which makes the frame a no-op downstream.
    #[serde(default, deserialize_with = "motor_array_or_none")]
    pub mtr: Option<Vec<LiveMotor>>,
}

/// One motor's slice of a live-data frame.
///
/// Every field decodes leniently: a wrong-typed value becomes `None`
/// rather than failing the entry, so one garbled reading never discards
/// the rest of the motor's snapshot.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveMotor {
    /// Numeric motor index. Firmware sometimes sends this as a string
    /// (`"2"`), so decode coerces.
    #[serde(default, deserialize_with = "int_or_numeric_string")]
    pub mtr_id: Option<i64>,

    /// Mode code for this motor.
    #[serde(default, deserialize_with = "int_or_none")]
    pub mode: Option<i64>,

    /// Per-phase currents (I1, I2, I3). `None` when absent or not a
    /// JSON array — downstream skips only the current assignment.
    #[serde(default, deserialize_with = "number_array_or_none")]
    pub amp: Option<Vec<Option<f64>>>,

    /// Running state: 1 = running, anything else = stopped.
    #[serde(default, deserialize_with = "int_or_none")]
    pub mtr_sts: Option<i64>,

    /// Fault code reported by the starter box.
    #[serde(default, deserialize_with = "int_or_none")]
    pub flt: Option<i64>,
}

/// Accept `mtr` only when it is a JSON array; any other shape becomes
/// `None` instead of a decode error. Array elements that fail to decode
/// are dropped individually.
fn motor_array_or_none<'de, D>(deserializer: D) -> Result<Option<Vec<LiveMotor>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|item| serde_json::from_value(item).ok())
                .collect(),
        ),
        _ => None,
    })
}

/// Accept an integer, or a string containing one.
fn int_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(|v| match v {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Accept an integer; any other shape becomes `None`.
fn int_or_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(Value::as_i64))
}

/// Accept an array of numbers; non-numeric elements decode to `None`
/// slots, and any non-array shape becomes `None` as a whole.
fn number_array_or_none<'de, D>(deserializer: D) -> Result<Option<Vec<Option<f64>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => Some(items.iter().map(Value::as_f64).collect()),
        _ => None,
    })
}

// ── Outbound command frames ─────────────────────────────────────────

/// Publish-side mirror of the ack shape: one frame per gateway, one entry
/// per device MAC, control codes keyed by motor-ref label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandPayload {
    pub dev: Vec<CommandDevice>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDevice {
    pub d_id: String,

    /// Motor-ref label → control code. `BTreeMap` keeps serialized frames
    /// deterministic.
    #[serde(flatten)]
    pub motors: BTreeMap<String, i64>,
}

// ── Tests ───────────────────────────────────────────────────────────
