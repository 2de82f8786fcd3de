//! The simulation aggregate. It owns every piece of mutable state and runs the tick pipeline:
//!
//! ```text
//! WheelActuator::advance → KinematicsSolver::solve → MotionIntegrator::step
//!     → CollisionResolver::resolve → SensorModel::update
//! ```
//!
//! Integration is split into sub-steps whenever one tick would move the body further than
//! half its radius, each sub-step followed by collision resolution, so walls cannot be
//! skipped at high speed or with a long tick.

use std::{f64::consts::FRAC_PI_2, sync::Arc};

use thiserror::Error;

use super::{
    collision::CollisionOutcome, noise::resolve_seed, Angle, CollisionResolver, ConfigError,
    KinematicsSolver, MazeGrid, MotionIntegrator, NoiseGenerator, Position, RobotSnapshot,
    RobotState, SensorModel, SensorReading, SimulationClock, SimulationConfig, WheelActuator,
    WheelChannel, WheelId,
};

const MOTOR_STREAM: u64 = 4;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SimulationError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("no free position for the robot near ({x}, {y})")]
    NoFreePosition { x: f64, y: f64 },
}

/// What happened during one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub sub_steps: usize,
    pub collided: bool,
    pub unresolved_collision: bool,
}

/// What happened during one `advance` call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameReport {
    pub ticks: u64,
    /// Ticks in which the robot touched a wall.
    pub collisions: u64,
    /// Ticks whose collision resolution hit the pass limit with overlap left.
    pub unresolved_collisions: u64,
}

impl FrameReport {
    fn record(&mut self, tick: &TickReport) {
        self.ticks += 1;
        self.collisions += u64::from(tick.collided);
        self.unresolved_collisions += u64::from(tick.unresolved_collision);
    }
}

pub struct Simulation {
    config: SimulationConfig,
    maze: Arc<MazeGrid>,
    state: RobotState,
    wheels: WheelActuator,
    kinematics: KinematicsSolver,
    integrator: MotionIntegrator,
    collision: CollisionResolver,
    sensors: SensorModel,
    clock: SimulationClock,
    motor_noise: Option<(NoiseGenerator, f64)>,
    reading: SensorReading,
}

impl Simulation {
    /// Robot starts at rest at the free spot nearest to the maze center, facing +Y. Until the
    /// first tick the sensor reading is the one at that pose.
    pub fn new(maze: Arc<MazeGrid>, config: SimulationConfig) -> Result<Self, SimulationError> {
        config.validate()?;
        let constants = config.constants;
        let seed = resolve_seed(config.sensors.seed);
        let sensors = config.sensors.clone().with_seed(seed);

        let mut simulation = Self {
            maze,
            state: RobotState::default(),
            wheels: WheelActuator::new(constants.motor_time_constant),
            kinematics: KinematicsSolver::new(&constants),
            integrator: MotionIntegrator::new(constants.damping),
            collision: CollisionResolver::new(config.max_collision_passes),
            sensors: SensorModel::new(&sensors, &constants),
            clock: SimulationClock::new(constants.dt),
            motor_noise: config
                .motor_noise
                .map(|amount| (NoiseGenerator::stream(seed, MOTOR_STREAM), amount)),
            reading: SensorReading::default(),
            config,
        };

        let center = simulation.maze.extent() * 0.5;
        let start = simulation
            .collision
            .find_free_position(center, constants.body_radius, &simulation.maze)
            .ok_or(SimulationError::NoFreePosition {
                x: center.x(),
                y: center.y(),
            })?;
        simulation.state = RobotState::new(start, Angle::new(FRAC_PI_2));
        simulation.reading = simulation
            .sensors
            .initial(&simulation.state, &simulation.maze);
        Ok(simulation)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn set_wheel_target(&mut self, wheel_id: WheelId, speed: f64) {
        self.wheels.set_target(wheel_id, speed);
    }

    pub fn stop(&mut self, wheel_id: WheelId) {
        self.wheels.stop(wheel_id);
    }

    /// Apply several targets between two ticks.
    pub fn apply_targets(&mut self, targets: impl IntoIterator<Item = (WheelId, f64)>) {
        for (wheel_id, speed) in targets {
            self.wheels.set_target(wheel_id, speed);
        }
    }

    /// Stop every wheel and all motion immediately.
    pub fn halt(&mut self) {
        self.wheels.halt();
        self.state.freeze();
        self.sensors.rebase(&self.state);
    }

    /// Move the robot to the free position nearest to `(x, y)`, at rest.
    pub fn place_robot(&mut self, x: f64, y: f64, theta: f64) -> Result<Position, SimulationError> {
        if !(x.is_finite() && y.is_finite() && theta.is_finite()) {
            return Err(SimulationError::NoFreePosition { x, y });
        }
        let position = self
            .collision
            .find_free_position(Position::new(x, y), self.radius(), &self.maze)
            .ok_or(SimulationError::NoFreePosition { x, y })?;
        self.state = RobotState::new(position, Angle::new(theta));
        self.sensors.rebase(&self.state);
        Ok(position)
    }

    /// Feed elapsed wall-clock time and run every whole tick it covers.
    pub fn advance(&mut self, frame_time: f64) -> FrameReport {
        self.clock.accumulate(frame_time);
        let mut report = FrameReport::default();
        while self.clock.next_step() {
            let tick = self.step();
            report.record(&tick);
        }
        report
    }

    /// Run exactly one tick regardless of accumulated time.
    pub fn tick(&mut self) -> TickReport {
        self.clock.force_step();
        self.step()
    }

    fn step(&mut self) -> TickReport {
        let dt = self.clock.dt();
        let radius = self.radius();

        self.wheels.advance(dt);
        if let Some((noise, amount)) = self.motor_noise.as_mut() {
            self.wheels.perturb(noise, *amount);
        }
        let [n, s, e, w] = self.wheels.actual_speeds();
        let velocity = self.kinematics.solve(n, s, e, w);

        let travel = self
            .integrator
            .displacement(&self.state, velocity, dt)
            .length();
        let sub_steps = ((travel / (0.5 * radius)).ceil() as usize).max(1);
        let sub_dt = dt / sub_steps as f64;

        let mut outcome = CollisionOutcome::default();
        for _ in 0..sub_steps {
            self.integrator.step(&mut self.state, velocity, sub_dt);
            let sub_outcome = self.collision.resolve(&mut self.state, radius, &self.maze);
            outcome.contacts += sub_outcome.contacts;
            outcome.passes += sub_outcome.passes;
            outcome.unresolved |= sub_outcome.unresolved;
        }

        let tick = self.clock.ticks();
        self.reading = self
            .sensors
            .update(tick, &self.state, &self.wheels, &self.maze, dt);

        TickReport {
            tick,
            sub_steps,
            collided: outcome.collided(),
            unresolved_collision: outcome.unresolved,
        }
    }

    pub fn robot_state(&self) -> &RobotState {
        &self.state
    }

    pub fn snapshot(&self) -> RobotSnapshot {
        RobotSnapshot::capture(self.clock.ticks(), &self.state, &self.wheels, self.radius())
    }

    /// Reading of the last completed tick.
    pub fn sensor_reading(&self) -> &SensorReading {
        &self.reading
    }

    pub fn wheel(&self, wheel_id: WheelId) -> WheelChannel {
        self.wheels.channel(wheel_id)
    }

    pub fn radius(&self) -> f64 {
        self.config.constants.body_radius
    }

    pub fn maze(&self) -> &MazeGrid {
        &self.maze
    }

    pub fn ticks(&self) -> u64 {
        self.clock.ticks()
    }

    /// Fraction of the next tick already accumulated, for render interpolation.
    pub fn alpha(&self) -> f64 {
        self.clock.alpha()
    }
}
