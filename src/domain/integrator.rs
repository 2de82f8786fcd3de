//! Explicit Euler integration of the robot pose.
//!
//! Damping acts on the body-frame velocity before it is rotated into the world frame, so
//! the decay does not depend on the current heading.

use super::{Angle, BodyVelocity, Position, RobotState};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionIntegrator {
    damping: f64,
}

impl MotionIntegrator {
    pub fn new(damping: f64) -> Self {
        Self { damping }
    }

    /// Damping only ever shrinks a velocity, it never flips its sign.
    pub fn damp(&self, velocity: BodyVelocity, dt: f64) -> BodyVelocity {
        let factor = (1.0 - self.damping * dt).max(0.0);
        BodyVelocity::new(
            velocity.vx * factor,
            velocity.vy * factor,
            velocity.omega * factor,
        )
    }

    pub fn step(&self, state: &mut RobotState, velocity: BodyVelocity, dt: f64) {
        let velocity = self.damp(velocity, dt);
        state.set_body_velocity(velocity);
        self.drift(state, dt);
    }

    /// Advance the pose by `dt` using the velocity already stored in the state.
    pub fn drift(&self, state: &mut RobotState, dt: f64) {
        let world_velocity = state.world_velocity();
        let omega = state.angular_velocity();
        state.set_position(state.position() + world_velocity * dt);
        state.set_heading(Angle::new(state.heading().radians() + omega * dt));
    }

    /// World displacement one `step` with `velocity` would produce.
    pub fn displacement(&self, state: &RobotState, velocity: BodyVelocity, dt: f64) -> Position {
        self.damp(velocity, dt).world_linear(state.heading()) * dt
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_abs_diff_eq;
    use rstest::rstest;

    use super::*;

    const EPSILON: f64 = 1e-12;

    #[rstest]
    #[case::right(     0.0, ( 0.999,  0.0  ))]
    #[case::up(   0.5 * PI, ( 0.0,    0.999))]
    #[case::left(       PI, (-0.999,  0.0  ))]
    #[case::down( 1.5 * PI, ( 0.0,   -0.999))]
    fn test_step_forward(#[case] heading: f64, #[case] expected: (f64, f64)) {
        let integrator = MotionIntegrator::new(0.1);
        let mut state = RobotState::new(Position::default(), Angle::new(heading));
        integrator.step(&mut state, BodyVelocity::new(1.0, 0.0, 0.0), 0.01);
        assert_abs_diff_eq!(
            state.position(),
            Position::new(expected.0 * 0.01, expected.1 * 0.01),
            epsilon = EPSILON
        );
        assert_abs_diff_eq!(state.heading().radians(), heading, epsilon = EPSILON);
    }

    #[test]
    fn test_step_positive_vy_moves_right_of_heading() {
        let integrator = MotionIntegrator::new(0.0);
        let mut state = RobotState::new(Position::default(), Angle::new(0.5 * PI));
        integrator.step(&mut state, BodyVelocity::new(0.0, 1.0, 0.0), 1.0);
        assert_abs_diff_eq!(state.position(), Position::new(1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_damping_is_heading_independent() {
        let integrator = MotionIntegrator::new(0.1);
        let velocity = BodyVelocity::new(0.3, -0.2, 0.5);
        for heading in [0.0, 0.7, 2.0, 4.0] {
            let mut state = RobotState::new(Position::default(), Angle::new(heading));
            integrator.step(&mut state, velocity, 0.01);
            let damped = state.body_velocity();
            assert_abs_diff_eq!(damped.vx, 0.3 * 0.999, epsilon = EPSILON);
            assert_abs_diff_eq!(damped.vy, -0.2 * 0.999, epsilon = EPSILON);
            assert_abs_diff_eq!(damped.omega, 0.5 * 0.999, epsilon = EPSILON);
        }
    }

    #[test]
    fn test_damping_never_reverses() {
        let integrator = MotionIntegrator::new(50.0);
        let damped = integrator.damp(BodyVelocity::new(1.0, -1.0, 2.0), 0.1);
        assert_eq!(damped.vx, 0.0);
        assert_eq!(damped.vy, 0.0);
        assert_eq!(damped.omega, 0.0);
    }

    #[rstest]
    #[case::past_full_turn(2.0 * PI - 0.001, 1.0, 0.001)]
    #[case::below_zero(0.0005, -1.0, 2.0 * PI - 0.0015)]
    fn test_heading_wraps(#[case] heading: f64, #[case] omega: f64, #[case] expected: f64) {
        let integrator = MotionIntegrator::new(0.0);
        let mut state = RobotState::new(Position::default(), Angle::new(heading));
        integrator.step(&mut state, BodyVelocity::new(0.0, 0.0, omega), 0.002);
        let heading = state.heading().radians();
        assert!((0.0..2.0 * PI).contains(&heading));
        assert_abs_diff_eq!(heading, expected, epsilon = 1e-9);
    }

    #[test]
    fn test_displacement_matches_step() {
        let integrator = MotionIntegrator::new(0.1);
        let velocity = BodyVelocity::new(0.25, 0.1, 0.0);
        let mut state = RobotState::new(Position::new(1.0, 1.0), Angle::new(1.0));
        let displacement = integrator.displacement(&state, velocity, 0.01);
        integrator.step(&mut state, velocity, 0.01);
        assert_abs_diff_eq!(
            state.position(),
            Position::new(1.0, 1.0) + displacement,
            epsilon = EPSILON
        );
    }
}
