//! The domain module encapsulates the physics of the omniwheel robot. It defines the robot
//! state, the wheel actuators, the maze and the sensors, along with the rules governing their
//! interactions within one fixed-length tick.
//!
//! Nothing in here depends on Bevy. Outcomes that deserve attention, such as a collision that
//! could not be resolved, are reported to the caller instead of being logged.

mod basis;
mod clock;
mod collision;
mod command;
mod config;
mod integrator;
mod kinematics;
mod maze;
mod noise;
mod robot;
mod sensor;
mod simulation;
mod wheel;

pub use basis::{Angle, Position};
pub use clock::SimulationClock;
pub use collision::{CollisionOutcome, CollisionResolver, Contact};
pub use command::{AckStatus, Acknowledgement, CommandError, CommandParams, MotorCommand, PinMap};
pub use config::{ConfigError, PhysicalConstants, SensorConfig, SimulationConfig};
pub use integrator::MotionIntegrator;
pub use kinematics::{BodyVelocity, KinematicsSolver};
pub use maze::{Cell, CellRect, MazeError, MazeGrid};
pub use noise::NoiseGenerator;
pub use robot::{RobotSnapshot, RobotState};
pub use sensor::{EncoderSimulator, InertialSimulator, RangeSimulator, SensorModel, SensorReading};
pub use simulation::{FrameReport, Simulation, SimulationError, TickReport};
pub use wheel::{WheelActuator, WheelChannel, WheelId};
