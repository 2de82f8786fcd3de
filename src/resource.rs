//! The resource module encapsulates domain entities for use with Bevy.

use std::ops::{Deref, DerefMut};

use bevy::ecs::system::Resource;

use crate::{controller::CommandInbox, domain};

#[derive(Resource)]
pub struct SimulationRes(domain::Simulation);

impl Deref for SimulationRes {
    type Target = domain::Simulation;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for SimulationRes {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl From<domain::Simulation> for SimulationRes {
    fn from(value: domain::Simulation) -> Self {
        Self(value)
    }
}

#[derive(Resource, Clone)]
pub struct CommandInboxRes(CommandInbox);

impl Deref for CommandInboxRes {
    type Target = CommandInbox;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<CommandInbox> for CommandInboxRes {
    fn from(value: CommandInbox) -> Self {
        Self(value)
    }
}
