// ── Command grouping ──
//
// Turns high-level motor actions into per-gateway publish frames. Each
// gateway gets at most one frame per batch; motors on the same starter
// box fold into a single device entry so the firmware sees one object
// per MAC.

use std::collections::BTreeMap;

use aquamon_api::payload::{CommandDevice, CommandPayload};

use crate::error::CoreError;
use crate::model::{ControlMode, Pond};

/// A requested change for one motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorAction {
    Start,
    Stop,
    SetMode(ControlMode),
}

impl MotorAction {
    /// The wire code the starter box expects for this action.
    pub fn control_code(self) -> i64 {
        match self {
            Self::Start => 1,
            Self::Stop => 0,
            Self::SetMode(mode) => mode.code(),
        }
    }
}

/// One motor plus the action requested for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MotorCommandRequest {
    pub motor_id: u32,
    pub action: MotorAction,
}

impl MotorCommandRequest {
    pub fn new(motor_id: u32, action: MotorAction) -> Self {
        Self { motor_id, action }
    }
}

/// A ready-to-publish command frame for one gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    pub gateway_id: String,
    pub payload: CommandPayload,
}

impl CommandFrame {
    /// Publish topic for this frame under the site's topic prefix.
    pub fn topic(&self, prefix: &str) -> String {
        format!("{prefix}/{}/cmd_req", self.gateway_id)
    }
}

/// Group a batch of requests into one [`CommandFrame`] per gateway.
///
/// Every request must resolve to a motor in `ponds` whose starter box
/// has a gateway assigned; otherwise the whole batch is rejected, so a
/// partially-published batch can never happen.
pub fn build_command_frames(
    requests: &[MotorCommandRequest],
    ponds: &[Pond],
) -> Result<Vec<CommandFrame>, CoreError> {
    // gateway -> mac -> ref label -> code
    let mut grouped: BTreeMap<String, BTreeMap<String, BTreeMap<String, i64>>> = BTreeMap::new();

    for request in requests {
        let motor = ponds
            .iter()
            .flat_map(|p| p.motors.iter())
            .find(|m| m.id == request.motor_id)
            .ok_or_else(|| CoreError::MotorNotFound {
                identifier: request.motor_id.to_string(),
            })?;

        let gateway = motor
            .starter_box
            .gateway_id
            .as_deref()
            .ok_or_else(|| CoreError::GatewayUnassigned {
                mac: motor.starter_box.mac.as_str().to_owned(),
            })?;

        grouped
            .entry(gateway.to_owned())
            .or_default()
            .entry(motor.starter_box.mac.as_str().to_owned())
            .or_default()
            .insert(motor.motor_ref.label().to_owned(), request.action.control_code());
    }

    let frames = grouped
        .into_iter()
        .map(|(gateway_id, devices)| CommandFrame {
            gateway_id,
            payload: CommandPayload {
                dev: devices
                    .into_iter()
                    .map(|(d_id, motors)| CommandDevice { d_id, motors })
                    .collect(),
            },
        })
        .collect();

    Ok(frames)
}
