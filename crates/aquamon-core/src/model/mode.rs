// ── Control mode codec ──
//
// Firmware communicates mode as a small integer; everything above the
// wire operates on this enum so display and comparison code never sees
// the encoding. Both directions are total functions -- no error cases
// in the hot per-frame update path.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Control locus (LOCAL/REMOTE) + control style (MANUAL/AUTO) governing
/// how a motor accepts commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlMode {
    #[default]
    #[serde(rename = "LOCAL + MANUAL")]
    LocalManual,
    #[serde(rename = "LOCAL + AUTO")]
    LocalAuto,
    #[serde(rename = "REMOTE + MANUAL")]
    RemoteManual,
    #[serde(rename = "REMOTE + AUTO")]
    RemoteAuto,
}

impl ControlMode {
    /// Decode a firmware mode code. Total: any unmapped code falls back
    /// to `LocalManual`.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => Self::LocalAuto,
            2 => Self::RemoteManual,
            3 => Self::RemoteAuto,
            // 0 and everything unrecognized
            _ => Self::LocalManual,
        }
    }

    /// Decode an optional code, falling back like [`from_code`](Self::from_code).
    pub fn from_code_or_default(code: Option<i64>) -> Self {
        code.map_or_else(Self::default, Self::from_code)
    }

    /// Firmware code for this mode.
    pub fn code(self) -> i64 {
        match self {
            Self::LocalManual => 0,
            Self::LocalAuto => 1,
            Self::RemoteManual => 2,
            Self::RemoteAuto => 3,
        }
    }

    /// Canonical display label.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LocalManual => "LOCAL + MANUAL",
            Self::LocalAuto => "LOCAL + AUTO",
            Self::RemoteManual => "REMOTE + MANUAL",
            Self::RemoteAuto => "REMOTE + AUTO",
        }
    }

    /// Encode a display label to its firmware code. All whitespace is
    /// stripped before matching, so `"LOCAL+MANUAL"` and
    /// `" LOCAL +  MANUAL "` both encode to 0.
    ///
    /// An unrecognized label encodes to `1` (`LOCAL + AUTO`) -- note the
    /// asymmetry with [`from_code`](Self::from_code), whose fallback is
    /// `LocalManual` (code 0). This mirrors observed firmware/dashboard
    /// behavior and is kept as-is.
    pub fn encode_label(label: &str) -> i64 {
        let stripped: String = label.chars().filter(|c| !c.is_whitespace()).collect();
        match stripped.as_str() {
            "LOCAL+MANUAL" => 0,
            "LOCAL+AUTO" => 1,
            "REMOTE+MANUAL" => 2,
            "REMOTE+AUTO" => 3,
            _ => 1,
        }
    }

    pub fn is_remote(self) -> bool {
        matches!(self, Self::RemoteManual | Self::RemoteAuto)
    }

    pub fn is_auto(self) -> bool {
        matches!(self, Self::LocalAuto | Self::RemoteAuto)
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL: [ControlMode; 4] = [
        ControlMode::LocalManual,
        ControlMode::LocalAuto,
        ControlMode::RemoteManual,
        ControlMode::RemoteAuto,
    ];

    #[test]
    fn canonical_labels_round_trip() {
        for mode in ALL {
            let code = ControlMode::encode_label(mode.as_str());
            assert_eq!(ControlMode::from_code(code), mode);
        }
    }

    #[test]
    fn codes_round_trip() {
        for mode in ALL {
            assert_eq!(ControlMode::from_code(mode.code()), mode);
        }
    }

    #[test]
    fn out_of_range_code_decodes_to_local_manual() {
        assert_eq!(ControlMode::from_code(99), ControlMode::LocalManual);
        assert_eq!(ControlMode::from_code(-1), ControlMode::LocalManual);
        assert_eq!(ControlMode::from_code_or_default(None), ControlMode::LocalManual);
    }

    #[test]
    fn encode_ignores_whitespace() {
        assert_eq!(ControlMode::encode_label("REMOTE+AUTO"), 3);
        assert_eq!(ControlMode::encode_label("  REMOTE +  AUTO "), 3);
        assert_eq!(ControlMode::encode_label("LOCAL\t+\tMANUAL"), 0);
    }

    #[test]
    fn unknown_label_encodes_to_one_not_zero() {
        // Asymmetric with the decode fallback; observed behavior.
        assert_eq!(ControlMode::encode_label("SOMETHING ELSE"), 1);
        assert_eq!(ControlMode::encode_label(""), 1);
    }

    #[test]
    fn unknown_label_does_not_round_trip() {
        let code = ControlMode::encode_label("bogus");
        assert_eq!(ControlMode::from_code(code), ControlMode::LocalAuto);
    }

    #[test]
    fn serializes_to_canonical_string() {
        let json = serde_json::to_string(&ControlMode::RemoteAuto).unwrap();
        assert_eq!(json, "\"REMOTE + AUTO\"");
        let back: ControlMode = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ControlMode::RemoteAuto);
    }

    #[test]
    fn predicates() {
        assert!(ControlMode::RemoteAuto.is_remote());
        assert!(ControlMode::RemoteAuto.is_auto());
        assert!(!ControlMode::LocalManual.is_remote());
        assert!(!ControlMode::RemoteManual.is_auto());
    }
}
