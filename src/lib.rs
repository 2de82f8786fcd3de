//! Physics and collision simulation of a four-omniwheel robot in a grid maze.
//!
//! [`domain`] holds the simulation itself and has no dependency on Bevy. [`controller`],
//! [`resource`] and [`simulator`] host it in a headless Bevy app.

pub mod controller;
pub mod domain;
pub mod resource;
pub mod simulator;
