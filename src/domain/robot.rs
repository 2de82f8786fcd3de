//! Circular robot body with four omniwheels at its poles.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{Angle, BodyVelocity, Position, WheelActuator, WheelId};

/// Authoritative pose and velocity of the robot.
///
/// Linear velocity is kept in the body frame (ahead, right); `world_velocity` rotates it by
/// the heading.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct RobotState {
    position: Position,
    heading: Angle,
    velocity: BodyVelocity,
}

impl RobotState {
    pub fn new(position: Position, heading: Angle) -> Self {
        Self {
            position,
            heading: heading.wrapped(),
            velocity: BodyVelocity::default(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn heading(&self) -> Angle {
        self.heading
    }

    pub fn body_velocity(&self) -> BodyVelocity {
        self.velocity
    }

    pub fn angular_velocity(&self) -> f64 {
        self.velocity.omega
    }

    pub fn world_velocity(&self) -> Position {
        self.velocity.world_linear(self.heading)
    }

    pub(crate) fn set_position(&mut self, position: Position) {
        self.position = position;
    }

    pub(crate) fn set_heading(&mut self, heading: Angle) {
        self.heading = heading.wrapped();
    }

    pub(crate) fn set_body_velocity(&mut self, velocity: BodyVelocity) {
        self.velocity = velocity;
    }

    pub(crate) fn set_world_velocity(&mut self, velocity: Position) {
        self.velocity = self.velocity.with_world_linear(velocity, self.heading);
    }

    /// Zero all motion, keeping the pose.
    pub(crate) fn freeze(&mut self) {
        self.velocity = BodyVelocity::default();
    }

    /// World position of a wheel on the body perimeter. North is ahead, East to the right.
    pub fn wheel_position(&self, wheel_id: WheelId, radius: f64) -> Position {
        let local = match wheel_id {
            WheelId::North => Position::new(radius, 0.0),
            WheelId::South => Position::new(-radius, 0.0),
            WheelId::East => Position::new(0.0, -radius),
            WheelId::West => Position::new(0.0, radius),
        };
        self.position + local.rotate_vector(self.heading)
    }
}

/// Copy of everything a renderer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RobotSnapshot {
    pub tick: u64,
    pub position: Position,
    pub heading: Angle,
    pub world_velocity: Position,
    pub angular_velocity: f64,
    pub radius: f64,
    pub wheel_speeds: BTreeMap<WheelId, f64>,
    pub wheel_positions: BTreeMap<WheelId, Position>,
}

impl RobotSnapshot {
    pub fn capture(tick: u64, state: &RobotState, wheels: &WheelActuator, radius: f64) -> Self {
        Self {
            tick,
            position: state.position(),
            heading: state.heading(),
            world_velocity: state.world_velocity(),
            angular_velocity: state.angular_velocity(),
            radius,
            wheel_speeds: WheelId::iter()
                .map(|wheel_id| (*wheel_id, wheels.actual_speed(*wheel_id)))
                .collect(),
            wheel_positions: WheelId::iter()
                .map(|wheel_id| (*wheel_id, state.wheel_position(*wheel_id, radius)))
                .collect(),
        }
    }
}
