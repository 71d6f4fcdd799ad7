// ── Core identity types ──
//
// MacAddress and MotorRef are the join keys of the whole system: every
// inbound frame is addressed by device MAC, and each motor inside a
// frame is addressed by its ref label / numeric index.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ── MacAddress ──────────────────────────────────────────────────────

/// MAC address, normalized to lowercase colon-separated format (aa:bb:cc:dd:ee:ff).
///
/// Firmware and the provisioning backend disagree on casing and
/// separators; normalizing once at construction makes every comparison
/// in the mergers a plain equality check.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress(String);

impl MacAddress {
    /// Create a normalized MAC address from any common format.
    /// Accepts colon-separated, dash-separated, or bare hex.
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw.as_ref().to_lowercase().replace('-', ":");
        Self(normalized)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// ── MotorRef ────────────────────────────────────────────────────────

/// Logical motor slot on a starter box: the string label the firmware
/// uses in ack payloads (`"mtr_1"`, `"mtr_2"`) plus the numeric index
/// used to join against live-data entries.
///
/// The index is derived once here, by stripping non-digit characters
/// from the label, instead of being re-derived on every live-data
/// frame. A label with no digits has no index and never matches a
/// live-data entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MotorRef {
    label: String,
    index: Option<u32>,
}

impl MotorRef {
    pub fn new(label: impl Into<String>) -> Self {
        let label = label.into();
        let digits: String = label.chars().filter(char::is_ascii_digit).collect();
        let index = if digits.is_empty() {
            None
        } else {
            digits.parse().ok()
        };
        Self { label, index }
    }

    /// The wire label, as it appears as a key in ack payloads.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Numeric index joining this slot to a live-data `mtr_id`.
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// Whether the label is set at all. Motors without a ref label are
    /// skipped by the live-data merger.
    pub fn is_set(&self) -> bool {
        !self.label.is_empty()
    }
}

impl fmt::Display for MotorRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label)
    }
}

impl From<String> for MotorRef {
    fn from(label: String) -> Self {
        Self::new(label)
    }
}

impl From<MotorRef> for String {
    fn from(motor_ref: MotorRef) -> Self {
        motor_ref.label
    }
}

impl From<&str> for MotorRef {
    fn from(label: &str) -> Self {
        Self::new(label)
    }
}
