//! Motor command messages as sent by the control code, one per H-bridge.
//!
//! A motor is addressed by the two GPIO pins of its driver. The pin pair is looked up in a
//! [`PinMap`] to find the wheel, the command is turned into a signed target speed, and an
//! [`Acknowledgement`] is produced for the sender.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::WheelId;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommandError {
    #[error("invalid wheel identifier `{0}`")]
    InvalidWheelIdentifier(String),
    #[error("unknown motor pins ({0}, {1})")]
    UnknownPins(i64, i64),
    #[error("unknown command: {0}")]
    UnknownCommand(String),
}

/// Pin pairs of the four motor drivers. Lookups ignore the order of the two pins.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PinMap {
    pairs: BTreeMap<(i64, i64), WheelId>,
}

impl PinMap {
    pub fn new(pairs: impl IntoIterator<Item = ((i64, i64), WheelId)>) -> Self {
        Self {
            pairs: pairs
                .into_iter()
                .map(|((pin1, pin2), wheel_id)| (ordered(pin1, pin2), wheel_id))
                .collect(),
        }
    }

    pub fn wheel(&self, pin1: i64, pin2: i64) -> Option<WheelId> {
        self.pairs.get(&ordered(pin1, pin2)).copied()
    }
}

impl Default for PinMap {
    fn default() -> Self {
        Self::new([
            ((17, 27), WheelId::North),
            ((22, 23), WheelId::South),
            ((24, 25), WheelId::East),
            ((5, 6), WheelId::West),
        ])
    }
}

fn ordered(pin1: i64, pin2: i64) -> (i64, i64) {
    (pin1.min(pin2), pin1.max(pin2))
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandParams {
    #[serde(default)]
    pub speed: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MotorCommand {
    pub command: String,
    pub pin1: i64,
    pub pin2: i64,
    #[serde(default)]
    pub params: CommandParams,
}

impl MotorCommand {
    pub fn new(command: &str, pin1: i64, pin2: i64, speed: f64) -> Self {
        Self {
            command: command.to_owned(),
            pin1,
            pin2,
            params: CommandParams { speed },
        }
    }

    /// Wheel and signed target speed this command asks for.
    ///
    /// `move` takes a signed speed, `forward` and `backward` take a magnitude in `[0, 1]`.
    pub fn resolve(&self, pins: &PinMap) -> Result<(WheelId, f64), CommandError> {
        let wheel_id = pins
            .wheel(self.pin1, self.pin2)
            .ok_or(CommandError::UnknownPins(self.pin1, self.pin2))?;
        let speed = nan_to_zero(self.params.speed);
        let target = match self.command.as_str() {
            "move" => speed.clamp(-1.0, 1.0),
            "forward" => speed.clamp(0.0, 1.0),
            "backward" => -speed.clamp(0.0, 1.0),
            "stop" => 0.0,
            other => return Err(CommandError::UnknownCommand(other.to_owned())),
        };
        Ok((wheel_id, target))
    }
}

fn nan_to_zero(speed: f64) -> f64 {
    if speed.is_nan() {
        0.0
    } else {
        speed
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AckStatus {
    Ok,
    Warning,
    Error,
}

/// Reply to a [`MotorCommand`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Acknowledgement {
    pub status: AckStatus,
    pub command: String,
    pub pin1: i64,
    pub pin2: i64,
    pub wheel: Option<WheelId>,
    pub message: String,
}

impl Acknowledgement {
    pub fn accepted(command: &MotorCommand, wheel_id: WheelId, speed: f64) -> Self {
        let message = if speed.abs() < 0.01 {
            format!("{wheel_id} stopped")
        } else if speed > 0.0 {
            format!("{wheel_id} forward at {speed}")
        } else {
            format!("{wheel_id} backward at {}", speed.abs())
        };
        Self {
            status: AckStatus::Ok,
            command: command.command.clone(),
            pin1: command.pin1,
            pin2: command.pin2,
            wheel: Some(wheel_id),
            message,
        }
    }

    pub fn rejected(command: &MotorCommand, pins: &PinMap, error: &CommandError) -> Self {
        let status = match error {
            CommandError::UnknownPins(..) => AckStatus::Warning,
            _ => AckStatus::Error,
        };
        Self {
            status,
            command: command.command.clone(),
            pin1: command.pin1,
            pin2: command.pin2,
            wheel: pins.wheel(command.pin1, command.pin2),
            message: error.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == AckStatus::Ok
    }
}
