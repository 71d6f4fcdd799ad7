// ── Acknowledgement merger ──
//
// Applies one batch ack (addressed by device MAC) onto a motor
// collection. The same function serves command acks and mode-change
// acks; the caller says which field the batch updates.

use aquamon_api::payload::AckPayload;

use crate::model::{ControlMode, MacAddress, Motor, MotorState};

/// Which motor field an ack batch updates.
///
/// Command acks carry running flags, mode acks carry mode codes; the
/// merger never assumes which kind it is processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AckField {
    State,
    Mode,
}

/// Apply an acknowledgement batch onto `motors`, in place.
///
/// A payload without a `dev` sequence is a no-op. A motor is updated
/// iff its starter box MAC equals the entry's `d_id` AND its own ref
/// label appears as a key in the entry -- ack batches routinely cover
/// only some of a device's motors, and unmentioned motors must keep
/// their current state.
pub fn apply_ack(ack: &AckPayload, motors: &mut [Motor], field: AckField) {
    let Some(devices) = ack.dev.as_ref() else {
        return;
    };

    for device in devices {
        let Some(d_id) = device.d_id.as_deref() else {
            continue;
        };
        let mac = MacAddress::new(d_id);

        for motor in motors.iter_mut() {
            if motor.starter_box.mac != mac || !device.names(motor.motor_ref.label()) {
                continue;
            }

            let code = device.code_for(motor.motor_ref.label());
            match field {
                AckField::State => motor.state = MotorState::from_flag(code),
                AckField::Mode => motor.mode = ControlMode::from_code_or_default(code),
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{MotorRef, StarterBox};
    use serde_json::json;

    fn motor(id: u32, mac: &str, label: &str) -> Motor {
        Motor::new(
            id,
            MotorRef::new(label),
            StarterBox {
                id: id * 10,
                mac: MacAddress::new(mac),
                gateway_id: Some("gw-01".into()),
            },
        )
    }

    fn ack(value: serde_json::Value) -> AckPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn command_ack_turns_named_motor_on() {
        let mut motors = vec![motor(1, "AA:AA", "mtr_1"), motor(2, "AA:AA", "mtr_2")];
        let payload = ack(json!({ "dev": [{ "d_id": "AA:AA", "mtr_1": 1 }] }));

        apply_ack(&payload, &mut motors, AckField::State);

        assert_eq!(motors[0].state, MotorState::On);
        // mtr_2 not named -- untouched
        assert_eq!(motors[1].state, MotorState::Off);
    }

    #[test]
    fn non_one_values_mean_stopped() {
        for value in [json!(0), json!(2), json!("running")] {
            let mut motors = vec![motor(1, "AA:AA", "mtr_1")];
            motors[0].state = MotorState::On;

            let payload = ack(json!({ "dev": [{ "d_id": "AA:AA", "mtr_1": value }] }));
            apply_ack(&payload, &mut motors, AckField::State);

            assert_eq!(motors[0].state, MotorState::Off, "value {value:?}");
        }
    }

    #[test]
    fn mode_ack_decodes_code() {
        let mut motors = vec![motor(1, "AA:AA", "mtr_1")];
        let payload = ack(json!({ "dev": [{ "d_id": "AA:AA", "mtr_1": 3 }] }));

        apply_ack(&payload, &mut motors, AckField::Mode);

        assert_eq!(motors[0].mode, ControlMode::RemoteAuto);
        // state interpretation was not applied
        assert_eq!(motors[0].state, MotorState::Off);
    }

    #[test]
    fn mode_ack_unknown_code_falls_back_to_local_manual() {
        let mut motors = vec![motor(1, "AA:AA", "mtr_1")];
        motors[0].mode = ControlMode::RemoteAuto;

        let payload = ack(json!({ "dev": [{ "d_id": "AA:AA", "mtr_1": 42 }] }));
        apply_ack(&payload, &mut motors, AckField::Mode);

        assert_eq!(motors[0].mode, ControlMode::LocalManual);
    }

    #[test]
    fn mac_mismatch_leaves_motor_untouched() {
        let mut motors = vec![motor(1, "AA:AA", "mtr_1")];
        let payload = ack(json!({ "dev": [{ "d_id": "BB:BB", "mtr_1": 1 }] }));

        apply_ack(&payload, &mut motors, AckField::State);

        assert_eq!(motors[0].state, MotorState::Off);
    }

    #[test]
    fn mac_comparison_is_normalized() {
        // Listing has lowercase colons, ack arrives uppercase with dashes.
        let mut motors = vec![motor(1, "aa:bb:cc:dd:ee:ff", "mtr_1")];
        let payload = ack(json!({ "dev": [{ "d_id": "AA-BB-CC-DD-EE-FF", "mtr_1": 1 }] }));

        apply_ack(&payload, &mut motors, AckField::State);

        assert_eq!(motors[0].state, MotorState::On);
    }

    #[test]
    fn missing_dev_is_a_no_op() {
        let mut motors = vec![motor(1, "AA:AA", "mtr_1")];
        motors[0].state = MotorState::On;

        apply_ack(&ack(json!({})), &mut motors, AckField::State);

        assert_eq!(motors[0].state, MotorState::On);
    }

    #[test]
    fn entry_without_d_id_is_skipped() {
        let mut motors = vec![motor(1, "AA:AA", "mtr_1")];
        let payload = ack(json!({ "dev": [{ "mtr_1": 1 }] }));

        apply_ack(&payload, &mut motors, AckField::State);

        assert_eq!(motors[0].state, MotorState::Off);
    }

    #[test]
    fn batch_covers_multiple_devices() {
        let mut motors = vec![
            motor(1, "AA:AA", "mtr_1"),
            motor(2, "BB:BB", "mtr_1"),
            motor(3, "BB:BB", "mtr_2"),
        ];
        let payload = ack(json!({
            "dev": [
                { "d_id": "AA:AA", "mtr_1": 1 },
                { "d_id": "BB:BB", "mtr_1": 0, "mtr_2": 1 }
            ]
        }));

        apply_ack(&payload, &mut motors, AckField::State);

        assert_eq!(motors[0].state, MotorState::On);
        assert_eq!(motors[1].state, MotorState::Off);
        assert_eq!(motors[2].state, MotorState::On);
    }
}
