// ── Motor domain types ──

use serde::{Deserialize, Serialize};

use super::ids::{MacAddress, MotorRef};
use super::mode::ControlMode;

/// Running state of a motor. Firmware encodes this as 0/1.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MotorState {
    #[default]
    Off,
    On,
}

impl MotorState {
    /// Interpret a firmware running flag: exactly `1` means running,
    /// anything else (including absent or non-numeric) means stopped.
    pub fn from_flag(flag: Option<i64>) -> Self {
        if flag == Some(1) { Self::On } else { Self::Off }
    }

    pub fn is_running(self) -> bool {
        matches!(self, Self::On)
    }
}

/// The starter box a motor is attached to.
///
/// Lookup data only -- the pond listing owns the motor records, and the
/// starter box is how device-level identity (MAC) and the owning
/// gateway are reached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StarterBox {
    pub id: u32,
    pub mac: MacAddress,
    /// Gateway this box reports through; outbound command frames are
    /// grouped by it.
    pub gateway_id: Option<String>,
}

/// One row of electrical readings for a motor. Element 0 of
/// [`Motor::parameters`] is the live row the mergers maintain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StarterBoxReading {
    pub motor_id: u32,
    pub starter_id: u32,

    // Per-phase currents (amps)
    pub current_i1: Option<f64>,
    pub current_i2: Option<f64>,
    pub current_i3: Option<f64>,

    // Per-phase line voltages
    pub line_voltage_vry: Option<f64>,
    pub line_voltage_vyb: Option<f64>,
    pub line_voltage_vbr: Option<f64>,

    /// Mains-power-present flag from the device.
    pub power_present: Option<i64>,

    /// Fault code (flat-listing reconciliation writes it here).
    pub fault_code: Option<i64>,
}

/// Device-reported fault status (pond-nested reconciliation writes the
/// fault code here).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultStatus {
    pub fault_code: Option<i64>,
}

/// One physical motor attached to a starter box.
///
/// `state`, `mode`, `parameters[0]`, and `faults` are runtime fields
/// owned exclusively by the reconciliation core; everything else comes
/// from the provisioning listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Motor {
    pub id: u32,
    pub motor_ref: MotorRef,
    pub starter_box: StarterBox,

    #[serde(default)]
    pub state: MotorState,
    #[serde(default)]
    pub mode: ControlMode,
    #[serde(default)]
    pub parameters: Vec<StarterBoxReading>,
    #[serde(default)]
    pub faults: FaultStatus,
}

impl Motor {
    /// A freshly listed motor with no telemetry applied yet.
    pub fn new(id: u32, motor_ref: MotorRef, starter_box: StarterBox) -> Self {
        Self {
            id,
            motor_ref,
            starter_box,
            state: MotorState::default(),
            mode: ControlMode::default(),
            parameters: Vec::new(),
            faults: FaultStatus::default(),
        }
    }

    /// The live reading row, lazily initialized.
    ///
    /// Live-data frames may arrive before any provisioning-sourced
    /// parameter row exists (first telemetry after provisioning); a
    /// minimal row is synthesized rather than dropping the frame.
    pub(crate) fn live_reading_mut(&mut self) -> &mut StarterBoxReading {
        if self.parameters.is_empty() {
            self.parameters.push(StarterBoxReading {
                motor_id: self.id,
                starter_id: self.starter_box.id,
                ..StarterBoxReading::default()
            });
        }
        &mut self.parameters[0]
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn test_motor() -> Motor {
        Motor::new(
            7,
            MotorRef::new("mtr_1"),
            StarterBox {
                id: 3,
                mac: MacAddress::new("AA:BB:CC:DD:EE:FF"),
                gateway_id: Some("gw-01".into()),
            },
        )
    }

    #[test]
    fn state_flag_semantics() {
        assert_eq!(MotorState::from_flag(Some(1)), MotorState::On);
        assert_eq!(MotorState::from_flag(Some(0)), MotorState::Off);
        assert_eq!(MotorState::from_flag(Some(2)), MotorState::Off);
        assert_eq!(MotorState::from_flag(None), MotorState::Off);
    }

    #[test]
    fn new_motor_has_no_readings() {
        let motor = test_motor();
        assert!(motor.parameters.is_empty());
        assert_eq!(motor.state, MotorState::Off);
        assert_eq!(motor.mode, ControlMode::LocalManual);
    }

    #[test]
    fn live_reading_initialized_on_first_access() {
        let mut motor = test_motor();
        {
            let reading = motor.live_reading_mut();
            assert_eq!(reading.motor_id, 7);
            assert_eq!(reading.starter_id, 3);
            assert!(reading.current_i1.is_none());
            assert!(reading.fault_code.is_none());
        }
        assert_eq!(motor.parameters.len(), 1);
    }

    #[test]
    fn live_reading_reuses_existing_row() {
        let mut motor = test_motor();
        motor.live_reading_mut().current_i1 = Some(4.2);
        motor.live_reading_mut();
        assert_eq!(motor.parameters.len(), 1);
        assert_eq!(motor.parameters[0].current_i1, Some(4.2));
    }
}
