// ── Live data merger ──
//
// Applies one telemetry snapshot (per-device, multi-motor) onto a motor
// collection: mode, per-phase currents, per-phase line voltages, power
// flag, fault code, and running state.

use aquamon_api::payload::LiveDataPayload;

use crate::model::{ControlMode, MacAddress, Motor, MotorState};

/// Where the live-data merger records a motor's fault code.
///
/// The pond-nested and flat reconciliation paths historically disagree
/// on this: one writes `faults.fault_code`, the other
/// `parameters[0].fault_code`. Which UI binding reads which location is
/// unconfirmed, so both paths are kept explicit rather than unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultTarget {
    /// Write to `motor.faults.fault_code` (pond-nested path).
    FaultStatus,
    /// Write to `motor.parameters[0].fault_code` (flat path).
    Reading,
}

/// Apply a live telemetry snapshot onto `motors`, in place.
///
/// No-op when `d_id` is absent or `mtr` was not a JSON array (the
/// decode boundary maps that shape to `None`). Motors without a ref
/// label, without a derivable index, or without a matching `mtr_id`
/// entry are left untouched.
pub fn apply_live_data(live: &LiveDataPayload, motors: &mut [Motor], fault_target: FaultTarget) {
    let Some(d_id) = live.d_id.as_deref() else {
        return;
    };
    let Some(entries) = live.mtr.as_ref() else {
        return;
    };

    let mac = MacAddress::new(d_id);
    let line_voltages = live.ll_v.as_deref().unwrap_or(&[]);

    for motor in motors.iter_mut() {
        if motor.starter_box.mac != mac || !motor.motor_ref.is_set() {
            continue;
        }
        let Some(index) = motor.motor_ref.index() else {
            continue;
        };
        let Some(entry) = entries
            .iter()
            .find(|m| m.mtr_id == Some(i64::from(index)))
        else {
            continue;
        };

        motor.mode = ControlMode::from_code_or_default(entry.mode);

        {
            let reading = motor.live_reading_mut();

            if let Some(amp) = entry.amp.as_ref() {
                reading.current_i1 = amp.first().copied().flatten();
                reading.current_i2 = amp.get(1).copied().flatten();
                reading.current_i3 = amp.get(2).copied().flatten();
            }

            // Line voltages apply regardless of whether currents were present.
            reading.line_voltage_vry = line_voltages.first().copied().flatten();
            reading.line_voltage_vyb = line_voltages.get(1).copied().flatten();
            reading.line_voltage_vbr = line_voltages.get(2).copied().flatten();

            reading.power_present = live.pwr;

            if fault_target == FaultTarget::Reading {
                reading.fault_code = entry.flt;
            }
        }

        if fault_target == FaultTarget::FaultStatus {
            motor.faults.fault_code = entry.flt;
        }

        // Second mode assignment, this time with the device-level mode as
        // fallback when the motor entry carries none. Overwrites the first
        // assignment on purpose.
        motor.mode = ControlMode::from_code_or_default(entry.mode.or(live.mode));
        motor.state = MotorState::from_flag(entry.mtr_sts);
    }
}
