//! Synthetic sensors derived from the authoritative robot state.
//!
//! ```text
//! SensorModel
//! ├── EncoderSimulator    # wheel ticks with multiplicative slip
//! ├── InertialSimulator   # gyro with drifting bias, world-frame accelerometer
//! └── RangeSimulator      # 4..=8 grid ray casts from the body perimeter
//! ```
//!
//! Every simulator draws from its own noise stream of the same seed, so enabling or
//! disabling one source does not shift the samples of another.

use std::collections::BTreeMap;

use serde::Serialize;

use super::{
    noise::resolve_seed, Angle, MazeGrid, NoiseGenerator, PhysicalConstants, Position, RobotState,
    SensorConfig, WheelActuator, WheelId,
};

const ENCODER_STREAM: u64 = 1;
const INERTIAL_STREAM: u64 = 2;
const RANGE_STREAM: u64 = 3;

/// Everything the sensors reported for one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct SensorReading {
    pub tick: u64,
    /// Cumulative encoder ticks per wheel, negative when driven backwards.
    pub encoders: BTreeMap<WheelId, i64>,
    /// Angular rate (rad/s).
    pub angular_rate: f64,
    /// Linear acceleration in the world frame (m/s²).
    pub acceleration: Position,
    /// Distances (m) ordered by sensor index, sensor 0 looking straight ahead.
    pub ranges: Vec<f64>,
}

pub struct EncoderSimulator {
    /// Ticks per unit of normalized speed per second.
    ticks_per_speed: f64,
    slip_stddev: f64,
    noise: NoiseGenerator,
    /// Fractional tick totals.
    accumulators: BTreeMap<WheelId, f64>,
}

impl EncoderSimulator {
    pub fn new(
        config: &SensorConfig,
        max_speed: f64,
        wheel_circumference: f64,
        noise: NoiseGenerator,
    ) -> Self {
        Self {
            ticks_per_speed: max_speed / wheel_circumference * config.ticks_per_revolution,
            slip_stddev: config.encoder_slip_stddev,
            noise,
            accumulators: WheelId::iter().map(|wheel_id| (*wheel_id, 0.0)).collect(),
        }
    }

    pub fn update(&mut self, wheels: &WheelActuator, dt: f64) -> BTreeMap<WheelId, i64> {
        for wheel_id in WheelId::iter() {
            let slip = (1.0 + self.noise.gaussian(self.slip_stddev)).max(0.0);
            let delta = wheels.actual_speed(*wheel_id) * self.ticks_per_speed * dt * slip;
            *self.accumulators.entry(*wheel_id).or_default() += delta;
        }
        self.counts()
    }

    pub fn counts(&self) -> BTreeMap<WheelId, i64> {
        self.accumulators
            .iter()
            .map(|(wheel_id, total)| (*wheel_id, total.trunc() as i64))
            .collect()
    }
}

pub struct InertialSimulator {
    gyro_stddev: f64,
    bias_walk: f64,
    accel_stddev: f64,
    bias: f64,
    last_velocity: Position,
    noise: NoiseGenerator,
}

impl InertialSimulator {
    pub fn new(config: &SensorConfig, noise: NoiseGenerator) -> Self {
        Self {
            gyro_stddev: config.gyro_stddev,
            bias_walk: config.gyro_bias_walk,
            accel_stddev: config.accel_stddev,
            bias: 0.0,
            last_velocity: Position::default(),
            noise,
        }
    }

    /// Returns `(angular_rate, acceleration)`.
    pub fn update(&mut self, state: &RobotState, dt: f64) -> (f64, Position) {
        self.bias += self.noise.gaussian(self.bias_walk * dt.sqrt());
        let angular_rate =
            state.angular_velocity() + self.bias + self.noise.gaussian(self.gyro_stddev);

        let velocity = state.world_velocity();
        let acceleration = (velocity - self.last_velocity) * (1.0 / dt)
            + Position::new(
                self.noise.gaussian(self.accel_stddev),
                self.noise.gaussian(self.accel_stddev),
            );
        self.last_velocity = velocity;

        (angular_rate, acceleration)
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Forget the previous velocity, e.g. after the robot was teleported.
    pub fn rebase(&mut self, state: &RobotState) {
        self.last_velocity = state.world_velocity();
    }
}

pub struct RangeSimulator {
    offsets: Vec<f64>,
    range_min: f64,
    range_max: f64,
    stddev: f64,
    noise: NoiseGenerator,
}

impl RangeSimulator {
    pub fn new(config: &SensorConfig, noise: NoiseGenerator) -> Self {
        Self {
            offsets: config.range_sensor_offsets(),
            range_min: config.range_min,
            range_max: config.range_max,
            stddev: config.range_stddev,
            noise,
        }
    }

    pub fn update(&mut self, state: &RobotState, radius: f64, maze: &MazeGrid) -> Vec<f64> {
        self.measure(state, radius, maze, self.stddev)
    }

    /// Exact distances for `state`, leaving the noise stream untouched.
    pub fn scan(&mut self, state: &RobotState, radius: f64, maze: &MazeGrid) -> Vec<f64> {
        self.measure(state, radius, maze, 0.0)
    }

    fn measure(
        &mut self,
        state: &RobotState,
        radius: f64,
        maze: &MazeGrid,
        stddev: f64,
    ) -> Vec<f64> {
        self.offsets
            .iter()
            .map(|offset| {
                let direction = Angle::new(state.heading().radians() + offset);
                let origin = state.position() + direction.unit_vector() * radius;
                match maze.ray_cast(origin, direction, self.range_max) {
                    Some(distance) => (distance + self.noise.gaussian(stddev))
                        .clamp(self.range_min, self.range_max),
                    None => self.range_max,
                }
            })
            .collect()
    }
}

pub struct SensorModel {
    encoders: EncoderSimulator,
    inertial: InertialSimulator,
    ranging: RangeSimulator,
    radius: f64,
}

impl SensorModel {
    pub fn new(config: &SensorConfig, constants: &PhysicalConstants) -> Self {
        let seed = resolve_seed(config.seed);
        let stream = |id| NoiseGenerator::stream(seed, id);
        Self {
            encoders: EncoderSimulator::new(
                config,
                constants.max_speed,
                constants.wheel_circumference(),
                stream(ENCODER_STREAM),
            ),
            inertial: InertialSimulator::new(config, stream(INERTIAL_STREAM)),
            ranging: RangeSimulator::new(config, stream(RANGE_STREAM)),
            radius: constants.body_radius,
        }
    }

    /// Sample every sensor for the tick that just completed. The state is only read.
    pub fn update(
        &mut self,
        tick: u64,
        state: &RobotState,
        wheels: &WheelActuator,
        maze: &MazeGrid,
        dt: f64,
    ) -> SensorReading {
        let encoders = self.encoders.update(wheels, dt);
        let (angular_rate, acceleration) = self.inertial.update(state, dt);
        let ranges = self.ranging.update(state, self.radius, maze);
        SensorReading {
            tick,
            encoders,
            angular_rate,
            acceleration,
            ranges,
        }
    }

    /// Reading at rest for `state` before any tick ran: current counts, no motion, exact
    /// ranges.
    pub fn initial(&mut self, state: &RobotState, maze: &MazeGrid) -> SensorReading {
        SensorReading {
            tick: 0,
            encoders: self.encoders.counts(),
            angular_rate: 0.0,
            acceleration: Position::default(),
            ranges: self.ranging.scan(state, self.radius, maze),
        }
    }

    pub fn rebase(&mut self, state: &RobotState) {
        self.inertial.rebase(state);
    }
}
