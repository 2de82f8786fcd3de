//! Wheel actuators. Each of the four omniwheels is driven towards a commanded target speed
//! through a first-order lag that stands in for motor inertia.

use std::{collections::BTreeMap, fmt, slice::Iter, str::FromStr};

use serde::{Deserialize, Serialize};

use super::{CommandError, NoiseGenerator};

/// Wheel slots at the four poles of the circular body.
///
/// North/South wheels are mounted horizontally and strafe, East/West wheels are mounted
/// vertically and drive forward/backward.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WheelId {
    North,
    South,
    East,
    West,
}

impl WheelId {
    pub fn iter() -> Iter<'static, WheelId> {
        static WHEELS: [WheelId; 4] = [
            WheelId::North,
            WheelId::South,
            WheelId::East,
            WheelId::West,
        ];
        WHEELS.iter()
    }

    pub fn name(self) -> &'static str {
        match self {
            WheelId::North => "north",
            WheelId::South => "south",
            WheelId::East => "east",
            WheelId::West => "west",
        }
    }
}

impl fmt::Display for WheelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WheelId {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "n" | "north" => Ok(WheelId::North),
            "s" | "south" => Ok(WheelId::South),
            "e" | "east" => Ok(WheelId::East),
            "w" | "west" => Ok(WheelId::West),
            _ => Err(CommandError::InvalidWheelIdentifier(s.to_owned())),
        }
    }
}

/// Normalized speeds of a single motor, both always within `[-1, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct WheelChannel {
    target_speed: f64,
    actual_speed: f64,
}

impl WheelChannel {
    pub fn target_speed(&self) -> f64 {
        self.target_speed
    }

    pub fn actual_speed(&self) -> f64 {
        self.actual_speed
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WheelActuator {
    wheels: BTreeMap<WheelId, WheelChannel>,
    time_constant: f64,
}

impl WheelActuator {
    pub fn new(time_constant: f64) -> Self {
        Self {
            wheels: BTreeMap::from_iter(
                WheelId::iter().map(|wheel_id| (*wheel_id, WheelChannel::default())),
            ),
            time_constant,
        }
    }

    pub fn channel(&self, wheel_id: WheelId) -> WheelChannel {
        self.wheels[&wheel_id]
    }

    pub fn actual_speed(&self, wheel_id: WheelId) -> f64 {
        self.wheels[&wheel_id].actual_speed
    }

    pub fn target_speed(&self, wheel_id: WheelId) -> f64 {
        self.wheels[&wheel_id].target_speed
    }

    /// Actual speeds in `(north, south, east, west)` order.
    pub fn actual_speeds(&self) -> [f64; 4] {
        [
            self.actual_speed(WheelId::North),
            self.actual_speed(WheelId::South),
            self.actual_speed(WheelId::East),
            self.actual_speed(WheelId::West),
        ]
    }

    /// Out-of-range speeds saturate like a real motor driver; NaN is treated as a stop.
    pub fn set_target(&mut self, wheel_id: WheelId, speed: f64) {
        if let Some(wheel) = self.wheels.get_mut(&wheel_id) {
            wheel.target_speed = clamp_speed(speed);
        }
    }

    pub fn stop(&mut self, wheel_id: WheelId) {
        self.set_target(wheel_id, 0.0);
    }

    /// Stop every motor immediately, bypassing the lag.
    pub fn halt(&mut self) {
        for wheel in self.wheels.values_mut() {
            *wheel = WheelChannel::default();
        }
    }

    pub fn advance(&mut self, dt: f64) {
        let gain = (dt / self.time_constant).clamp(0.0, 1.0);
        for wheel in self.wheels.values_mut() {
            let actual = wheel.actual_speed + (wheel.target_speed - wheel.actual_speed) * gain;
            wheel.actual_speed = clamp_speed(actual);
        }
    }

    /// Random fluctuation of running motors, `amount` being the standard deviation in
    /// normalized speed units.
    pub fn perturb(&mut self, noise: &mut NoiseGenerator, amount: f64) {
        for wheel in self.wheels.values_mut() {
            if wheel.actual_speed.abs() > 0.01 {
                wheel.actual_speed = clamp_speed(wheel.actual_speed + noise.gaussian(amount));
            }
        }
    }
}

fn clamp_speed(speed: f64) -> f64 {
    if speed.is_nan() {
        0.0
    } else {
        speed.clamp(-1.0, 1.0)
    }
}
