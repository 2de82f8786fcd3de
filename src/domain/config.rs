//! Simulation configuration.
//!
//! ```text
//! SimulationConfig
//! ├── PhysicalConstants     # body, wheels, motors, damping, tick length
//! ├── SensorConfig          # encoders, inertial unit, range finders, seed
//! ├── max_collision_passes
//! └── motor_noise
//! ```
//!
//! Every structure has defaults matching the physical robot, so `SimulationConfig::default()`
//! is a complete configuration.

use std::f64::consts::TAU;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive and finite, got {value}")]
    NonPositive { name: &'static str, value: f64 },
    #[error("range sensor count must be between 4 and 8, got {0}")]
    RangeSensorCount(usize),
    #[error("range sensor limits are inverted: min {min} > max {max}")]
    RangeLimits { min: f64, max: f64 },
}

/// Immutable physical parameters of the robot and the physics tick.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub struct PhysicalConstants {
    /// Body radius, also the collision radius (m).
    pub body_radius: f64,
    /// Mass (kg).
    pub mass: f64,
    /// Wheel radius (m).
    pub wheel_radius: f64,
    /// Tangential wheel speed at full throttle (m/s).
    pub max_speed: f64,
    /// Motor response time constant (s).
    pub motor_time_constant: f64,
    /// Linear and angular damping coefficient (1/s).
    pub damping: f64,
    /// Physics tick (s).
    pub dt: f64,
}

impl PhysicalConstants {
    pub const DEFAULT: PhysicalConstants =
        PhysicalConstants::new(0.075, 1.5, 0.025, 0.3, 0.05, 0.1, 0.01);

    pub const fn new(
        body_radius: f64,
        mass: f64,
        wheel_radius: f64,
        max_speed: f64,
        motor_time_constant: f64,
        damping: f64,
        dt: f64,
    ) -> Self {
        PhysicalConstants {
            body_radius,
            mass,
            wheel_radius,
            max_speed,
            motor_time_constant,
            damping,
            dt,
        }
    }

    /// Solid disc: `I = m·R²/2`.
    pub fn moment_of_inertia(&self) -> f64 {
        0.5 * self.mass * self.body_radius.powi(2)
    }

    pub fn wheel_circumference(&self) -> f64 {
        TAU * self.wheel_radius
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("body_radius", self.body_radius)?;
        positive("mass", self.mass)?;
        positive("wheel_radius", self.wheel_radius)?;
        positive("max_speed", self.max_speed)?;
        positive("motor_time_constant", self.motor_time_constant)?;
        positive("dt", self.dt)?;
        if !(self.damping.is_finite() && self.damping >= 0.0) {
            return Err(ConfigError::NonPositive {
                name: "damping",
                value: self.damping,
            });
        }
        Ok(())
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct SensorConfig {
    /// `None` draws a fresh seed per process.
    pub seed: Option<u64>,
    pub ticks_per_revolution: f64,
    /// Relative standard deviation of each encoder increment.
    pub encoder_slip_stddev: f64,
    /// Angular rate noise (rad/s).
    pub gyro_stddev: f64,
    /// Gyro bias random walk (rad/s per √s).
    pub gyro_bias_walk: f64,
    /// Acceleration noise (m/s²).
    pub accel_stddev: f64,
    pub range_sensor_count: usize,
    pub range_min: f64,
    pub range_max: f64,
    /// Range noise (m).
    pub range_stddev: f64,
}

impl SensorConfig {
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..self
        }
    }

    pub fn with_range_sensor_count(self, range_sensor_count: usize) -> Self {
        Self {
            range_sensor_count,
            ..self
        }
    }

    /// Same configuration with every noise source switched off.
    pub fn noiseless(self) -> Self {
        Self {
            encoder_slip_stddev: 0.0,
            gyro_stddev: 0.0,
            gyro_bias_walk: 0.0,
            accel_stddev: 0.0,
            range_stddev: 0.0,
            ..self
        }
    }

    /// Sensor headings relative to the robot heading, evenly spaced and starting straight
    /// ahead.
    pub fn range_sensor_offsets(&self) -> Vec<f64> {
        (0..self.range_sensor_count)
            .map(|i| i as f64 * TAU / self.range_sensor_count as f64)
            .collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(4..=8).contains(&self.range_sensor_count) {
            return Err(ConfigError::RangeSensorCount(self.range_sensor_count));
        }
        positive("ticks_per_revolution", self.ticks_per_revolution)?;
        positive("range_min", self.range_min)?;
        positive("range_max", self.range_max)?;
        if self.range_min > self.range_max {
            return Err(ConfigError::RangeLimits {
                min: self.range_min,
                max: self.range_max,
            });
        }
        Ok(())
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            seed: None,
            ticks_per_revolution: 1000.0,
            encoder_slip_stddev: 0.005,
            gyro_stddev: 0.002,
            gyro_bias_walk: 0.0005,
            accel_stddev: 0.02,
            range_sensor_count: 8,
            range_min: 0.05,
            range_max: 1.0,
            range_stddev: 0.01,
        }
    }
}

#[derive(Clone, Debug, PartialEq, PartialOrd)]
pub struct SimulationConfig {
    pub constants: PhysicalConstants,
    pub sensors: SensorConfig,
    /// Upper bound on push-out passes per collision resolution.
    pub max_collision_passes: usize,
    /// Standard deviation of motor speed fluctuation, `None` for ideal motors.
    pub motor_noise: Option<f64>,
}

impl SimulationConfig {
    pub fn with_constants(self, constants: PhysicalConstants) -> Self {
        Self { constants, ..self }
    }

    pub fn with_sensors(self, sensors: SensorConfig) -> Self {
        Self { sensors, ..self }
    }

    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            sensors: self.sensors.with_seed(seed),
            ..self
        }
    }

    pub fn with_motor_noise(self, amount: f64) -> Self {
        Self {
            motor_noise: Some(amount),
            ..self
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.constants.validate()?;
        self.sensors.validate()
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            constants: PhysicalConstants::DEFAULT,
            sensors: SensorConfig::default(),
            max_collision_passes: 4,
            motor_noise: None,
        }
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NonPositive { name, value })
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use approx::assert_abs_diff_eq;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use super::*;

    #[test]
    fn test_default_constants() {
        let constants = PhysicalConstants::default();
        assert_abs_diff_eq!(constants.body_radius, 0.075);
        assert_abs_diff_eq!(constants.dt, 0.01);
        assert_abs_diff_eq!(constants.moment_of_inertia(), 0.5 * 1.5 * 0.075 * 0.075);
        assert_eq!(constants.validate(), Ok(()));
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[rstest]
    #[case(4, vec![0.0, 0.5 * PI, PI, 1.5 * PI])]
    #[case(6, vec![0.0, PI / 3.0, 2.0 * PI / 3.0, PI, 4.0 * PI / 3.0, 5.0 * PI / 3.0])]
    fn test_range_sensor_offsets(#[case] count: usize, #[case] expected: Vec<f64>) {
        let offsets = SensorConfig::default()
            .with_range_sensor_count(count)
            .range_sensor_offsets();
        assert_eq!(offsets.len(), expected.len());
        for (offset, expected) in offsets.iter().zip(expected) {
            assert_abs_diff_eq!(*offset, expected, epsilon = 1e-12);
        }
    }

    #[rstest]
    #[case(3)]
    #[case(9)]
    fn test_range_sensor_count_rejected(#[case] count: usize) {
        let config = SensorConfig::default().with_range_sensor_count(count);
        assert_eq!(config.validate(), Err(ConfigError::RangeSensorCount(count)));
    }

    #[test]
    fn test_non_positive_constant_rejected() {
        let constants = PhysicalConstants {
            dt: 0.0,
            ..PhysicalConstants::DEFAULT
        };
        let error = SimulationConfig::default()
            .with_constants(constants)
            .validate()
            .unwrap_err();
        insta::assert_snapshot!(error.to_string(), @"dt must be positive and finite, got 0");
    }
}
