use std::{env, error::Error, sync::Arc, time::Duration};

use bevy::{app::ScheduleRunnerPlugin, log::LogPlugin, prelude::*};

use omniwheel_maze::{
    controller::{CommandInbox, Controller},
    domain::{MazeGrid, PinMap, Simulation, SimulationConfig},
    resource::SimulationRes,
    simulator::Simulator,
};

const FRAME_RATE: f64 = 60.0;

/// 2 m × 2 m arena, bottom row first.
const MAZE: [[u8; 8]; 8] = [
    [1, 1, 1, 1, 1, 1, 1, 1],
    [1, 0, 0, 0, 0, 0, 0, 1],
    [1, 0, 1, 1, 0, 1, 0, 1],
    [1, 0, 0, 1, 0, 1, 0, 1],
    [1, 1, 0, 0, 0, 0, 0, 1],
    [1, 0, 0, 1, 1, 0, 1, 1],
    [1, 0, 0, 0, 0, 0, 0, 1],
    [1, 1, 1, 1, 1, 1, 1, 1],
];
const CELL_SIZE: f64 = 0.25;

fn main() -> Result<(), Box<dyn Error>> {
    let seed = env::var("OMNIWHEEL_SEED")
        .ok()
        .map(|seed| seed.parse::<u64>())
        .transpose()?;
    let demo = env::var_os("OMNIWHEEL_DEMO").is_some();

    let mut config = SimulationConfig::default();
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    let maze = MazeGrid::from_rows(&MAZE, CELL_SIZE)?;
    let simulation = Simulation::new(Arc::new(maze), config)?;

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(
            Duration::from_secs_f64(1.0 / FRAME_RATE),
        )))
        .add_plugins(LogPlugin::default())
        .insert_resource(SimulationRes::from(simulation))
        .add_plugins(Controller::new(CommandInbox::new(PinMap::default())).with_demo(demo))
        .add_plugins(Simulator)
        .run();

    Ok(())
}
