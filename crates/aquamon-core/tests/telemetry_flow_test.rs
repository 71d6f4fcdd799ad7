//! End-to-end flow through the store: provisioning listing in, telemetry
//! frames applied in arrival order, snapshots out, listing refresh on top.

#![allow(clippy::unwrap_used)]

use aquamon_api::TelemetryFrame;
use aquamon_core::{
    ControlMode, MacAddress, Motor, MotorAction, MotorCommandRequest, MotorRef, MotorState, Pond,
    StarterBox, TelemetryStore, build_command_frames,
};
use pretty_assertions::assert_eq;
use serde_json::json;

const GATEWAY_MAC: &str = "aa:bb:cc:dd:ee:ff";
const ISLAND_MAC: &str = "11:22:33:44:55:66";

fn motor(id: u32, mac: &str, label: &str) -> Motor {
    Motor::new(
        id,
        MotorRef::new(label),
        StarterBox {
            id: id * 100,
            mac: MacAddress::new(mac),
            gateway_id: Some("gw-01".into()),
        },
    )
}

fn site_listing() -> Vec<Pond> {
    vec![
        Pond::with_motors(
            1,
            "North pond",
            vec![
                motor(1, GATEWAY_MAC, "mtr_1"),
                motor(2, GATEWAY_MAC, "mtr_2"),
            ],
        ),
        Pond::with_motors(2, "South pond", vec![motor(3, ISLAND_MAC, "mtr_1")]),
    ]
}

fn command_ack(value: serde_json::Value) -> TelemetryFrame {
    TelemetryFrame::CommandAck(serde_json::from_value(value).unwrap())
}

fn mode_ack(value: serde_json::Value) -> TelemetryFrame {
    TelemetryFrame::ModeAck(serde_json::from_value(value).unwrap())
}

fn live_data(value: serde_json::Value) -> TelemetryFrame {
    TelemetryFrame::LiveData(serde_json::from_value(value).unwrap())
}

#[test]
fn frames_accumulate_into_consistent_state() {
    let store = TelemetryStore::new();
    store.apply_listing(site_listing());

    // Operator starts motor 1; the box confirms.
    store.apply_frame(&command_ack(
        json!({ "dev": [{ "d_id": GATEWAY_MAC, "mtr_1": 1 }] }),
    ));

    // Mode change confirmed for motor 2.
    store.apply_frame(&mode_ack(
        json!({ "dev": [{ "d_id": GATEWAY_MAC, "mtr_2": 3 }] }),
    ));

    // Periodic live snapshot covering both motors on the device.
    store.apply_frame(&live_data(json!({
        "d_id": GATEWAY_MAC,
        "ll_v": [398.5, 401.2, 399.8],
        "pwr": 1,
        "mtr": [
            { "mtr_id": 1, "amp": [12.1, 12.4, 12.0], "mtr_sts": 1, "mode": 2, "flt": 0 },
            { "mtr_id": 2, "amp": [0.0, 0.0, 0.0], "mtr_sts": 0, "flt": 4 }
        ]
    })));

    let snapshot = store.snapshot();
    let north = &snapshot[0];

    let m1 = &north.motors[0];
    assert_eq!(m1.state, MotorState::On);
    assert_eq!(m1.mode, ControlMode::RemoteManual);
    assert_eq!(m1.parameters[0].current_i1, Some(12.1));
    assert_eq!(m1.parameters[0].line_voltage_vyb, Some(401.2));
    assert_eq!(m1.faults.fault_code, Some(0));

    // Live data carried no mode for motor 2 and the device sent none,
    // so the mode-ack value is overwritten by the decode fallback.
    let m2 = &north.motors[1];
    assert_eq!(m2.state, MotorState::Off);
    assert_eq!(m2.mode, ControlMode::LocalManual);
    assert_eq!(m2.faults.fault_code, Some(4));

    // The other device's motor never appeared in any frame.
    let south = &snapshot[1];
    assert_eq!(south.motors[0].state, MotorState::Off);
    assert!(south.motors[0].parameters.is_empty());
}

#[test]
fn listing_refresh_keeps_telemetry_and_tracks_assignment_changes() {
    let store = TelemetryStore::new();
    store.apply_listing(site_listing());

    store.apply_frame(&live_data(json!({
        "d_id": GATEWAY_MAC,
        "ll_v": [400.0, 400.0, 400.0],
        "mtr": [{ "mtr_id": 1, "amp": [8.0, 8.1, 8.2], "mtr_sts": 1, "mode": 3 }]
    })));

    // Backend refresh: motor 2 was unassigned, a new motor 4 appears.
    let mut refreshed = site_listing();
    refreshed[0].motors.remove(1);
    refreshed[0].motors.push(motor(4, GATEWAY_MAC, "mtr_3"));
    store.apply_listing(refreshed);

    let snapshot = store.snapshot();
    let north = &snapshot[0];
    assert_eq!(north.motors.len(), 2);

    // Surviving motor kept its telemetry.
    assert_eq!(north.motors[0].state, MotorState::On);
    assert_eq!(north.motors[0].mode, ControlMode::RemoteAuto);
    assert_eq!(north.motors[0].parameters[0].current_i1, Some(8.0));

    // The new motor starts clean.
    assert_eq!(north.motors[1].id, 4);
    assert_eq!(north.motors[1].state, MotorState::Off);
    assert!(north.motors[1].parameters.is_empty());
}

#[test]
fn command_frames_built_from_snapshot_target_the_right_gateway() {
    let store = TelemetryStore::new();
    store.apply_listing(site_listing());

    let snapshot = store.snapshot();
    let frames = build_command_frames(
        &[
            MotorCommandRequest::new(1, MotorAction::Start),
            MotorCommandRequest::new(2, MotorAction::SetMode(ControlMode::RemoteAuto)),
            MotorCommandRequest::new(3, MotorAction::Stop),
        ],
        &snapshot,
    )
    .unwrap();

    assert_eq!(frames.len(), 1, "one gateway, one frame");
    let devices = &frames[0].payload.dev;
    assert_eq!(devices.len(), 2, "two starter boxes on the gateway");
    assert_eq!(devices[0].motors.get("mtr_1"), Some(&0));
    assert_eq!(devices[1].motors.get("mtr_1"), Some(&1));
    assert_eq!(devices[1].motors.get("mtr_2"), Some(&3));
    assert_eq!(frames[0].topic("farm-07"), "farm-07/gw-01/cmd_req");
}

#[tokio::test]
async fn watch_subscribers_observe_every_mutation() {
    let store = TelemetryStore::new();
    let mut snapshots = store.subscribe();
    let mut versions = store.subscribe_version();

    store.apply_listing(site_listing());
    snapshots.changed().await.unwrap();
    assert_eq!(snapshots.borrow_and_update().len(), 2);

    store.apply_frame(&command_ack(
        json!({ "dev": [{ "d_id": GATEWAY_MAC, "mtr_1": 1 }] }),
    ));
    snapshots.changed().await.unwrap();
    assert_eq!(
        snapshots.borrow_and_update()[0].motors[0].state,
        MotorState::On
    );

    versions.changed().await.unwrap();
    assert_eq!(*versions.borrow_and_update(), 2);
    assert!(store.last_update().is_some());
}

#[test]
fn malformed_shapes_normalized_at_decode_never_corrupt_state() {
    let store = TelemetryStore::new();
    store.apply_listing(site_listing());

    // Array-wrapped ack, the other envelope shape the broker emits.
    let ack: aquamon_api::AckEnvelope = serde_json::from_value(json!([
        { "dev": [{ "d_id": GATEWAY_MAC, "mtr_1": 1 }] }
    ]))
    .unwrap();
    store.apply_frame(&TelemetryFrame::CommandAck(ack.into_payload().unwrap()));

    // Non-array `mtr` decodes to None and the frame is a no-op.
    store.apply_frame(&live_data(json!({ "d_id": GATEWAY_MAC, "mtr": 17 })));

    let snapshot = store.snapshot();
    assert_eq!(snapshot[0].motors[0].state, MotorState::On);
    assert!(snapshot[0].motors[0].parameters.is_empty());
}
