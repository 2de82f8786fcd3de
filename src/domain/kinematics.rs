//! Forward kinematics of the N/S/E/W omniwheel layout.
//!
//! Every wheel is tangent to the body circle, so every wheel contributes a moment arm of
//! one body radius to rotation. With `k = r·v_max/2`:
//!
//! ```text
//! vx    = k (e + w)
//! vy    = k (s - n)
//! omega = k (n + s + e + w) / R
//! ```
//!
//! `vx` points ahead, `vy` to the robot's right, `omega` is counter-clockwise.

use nalgebra::{Matrix3x4, RowVector4, Vector4};
use serde::{Deserialize, Serialize};

use super::{Angle, PhysicalConstants, Position};

/// Velocity expressed in the robot's own frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct BodyVelocity {
    pub vx: f64,
    pub vy: f64,
    pub omega: f64,
}

impl BodyVelocity {
    pub const fn new(vx: f64, vy: f64, omega: f64) -> Self {
        Self { vx, vy, omega }
    }

    /// Linear part in the world frame. The lateral body axis points to the robot's right,
    /// i.e. clockwise from the heading.
    pub fn world_linear(&self, heading: Angle) -> Position {
        Position::new(self.vx, -self.vy).rotate_vector(heading)
    }

    pub fn with_world_linear(self, velocity: Position, heading: Angle) -> Self {
        let local = velocity.rotate_vector(-heading);
        Self {
            vx: local.x(),
            vy: -local.y(),
            ..self
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct KinematicsSolver {
    jacobian: Matrix3x4<f64>,
}

impl KinematicsSolver {
    pub fn new(constants: &PhysicalConstants) -> Self {
        let k = constants.wheel_radius * constants.max_speed / 2.0;
        let k_r = k / constants.body_radius;
        // columns: north, south, east, west
        let jacobian = Matrix3x4::from_rows(&[
            RowVector4::new(0.0, 0.0, k, k),
            RowVector4::new(-k, k, 0.0, 0.0),
            RowVector4::new(k_r, k_r, k_r, k_r),
        ]);
        Self { jacobian }
    }

    pub fn solve(&self, n: f64, s: f64, e: f64, w: f64) -> BodyVelocity {
        let q = self.jacobian * Vector4::new(n, s, e, w);
        BodyVelocity::new(q[0], q[1], q[2])
    }
}
