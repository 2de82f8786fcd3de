//! Simulation of the robot in the maze.
//!
//! Every frame the elapsed time is handed to the simulation, which runs as many fixed-length
//! ticks as have accumulated. Collisions that could not be resolved are reported, and the pose
//! is logged periodically.

use bevy::prelude::*;

use crate::resource::SimulationRes;

/// Ticks between two pose log lines.
const POSE_LOG_INTERVAL: u64 = 100;

pub struct Simulator;

impl Plugin for Simulator {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, announce)
            .add_systems(Update, simulate);
    }
}

fn announce(simulation: Res<SimulationRes>) {
    let maze = simulation.maze();
    let state = simulation.robot_state();
    info!(
        "Maze {}x{} cells of {} m, robot at ({:.3}, {:.3}) heading {:.1}°",
        maze.width(),
        maze.height(),
        maze.cell_size(),
        state.position().x(),
        state.position().y(),
        state.heading().to_deg(),
    );
}

fn simulate(time: Res<Time>, mut simulation: ResMut<SimulationRes>, mut logged_tick: Local<u64>) {
    let report = simulation.advance(time.delta_seconds_f64());

    if report.unresolved_collisions > 0 {
        let position = simulation.robot_state().position();
        warn!(
            "Collision left unresolved in {} tick(s), robot at ({:.3}, {:.3})",
            report.unresolved_collisions,
            position.x(),
            position.y(),
        );
    }

    if simulation.ticks() >= *logged_tick + POSE_LOG_INTERVAL {
        *logged_tick = simulation.ticks();
        let snapshot = simulation.snapshot();
        debug!(
            "Tick {}: position ({:.3}, {:.3}), heading {:.1}°, velocity ({:.3}, {:.3}), ranges {:?}",
            snapshot.tick,
            snapshot.position.x(),
            snapshot.position.y(),
            snapshot.heading.to_deg(),
            snapshot.world_velocity.x(),
            snapshot.world_velocity.y(),
            simulation.sensor_reading().ranges,
        );
    }
}
