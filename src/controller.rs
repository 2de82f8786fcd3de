//! Controller steering the robot.
//!
//! External control code never touches the simulation directly. It writes wheel targets into a
//! [`CommandInbox`], which the simulation drains once per frame before running any tick. Every
//! write, single wheel or batch, happens under one lock, so a tick never sees half a batch.
//!
//! Optionally a demo driver thread replays a fixed motor program through the same inbox.

use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    thread,
    time::Duration,
};

use bevy::prelude::*;

use crate::{
    domain::{Acknowledgement, MotorCommand, PinMap, Simulation, WheelId},
    resource::{CommandInboxRes, SimulationRes},
};

/// Wheel updates received since the last frame.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PendingTargets {
    halt: bool,
    targets: BTreeMap<WheelId, f64>,
}

impl PendingTargets {
    pub fn is_empty(&self) -> bool {
        !self.halt && self.targets.is_empty()
    }

    pub fn target(&self, wheel_id: WheelId) -> Option<f64> {
        self.targets.get(&wheel_id).copied()
    }

    pub fn halts(&self) -> bool {
        self.halt
    }

    /// A halt is applied before any target received after it.
    pub fn apply(self, simulation: &mut Simulation) {
        if self.halt {
            simulation.halt();
        }
        simulation.apply_targets(self.targets);
    }
}

/// Cloneable handle through which control code commands the wheels.
#[derive(Clone, Debug, Default)]
pub struct CommandInbox {
    pending: Arc<Mutex<PendingTargets>>,
    pins: Arc<PinMap>,
}

impl CommandInbox {
    pub fn new(pins: PinMap) -> Self {
        Self {
            pending: Arc::default(),
            pins: Arc::new(pins),
        }
    }

    pub fn set_wheel_target(&self, wheel_id: WheelId, speed: f64) {
        self.lock().targets.insert(wheel_id, speed);
    }

    pub fn stop(&self, wheel_id: WheelId) {
        self.set_wheel_target(wheel_id, 0.0);
    }

    /// Several targets that must take effect in the same tick.
    pub fn set_targets(&self, targets: impl IntoIterator<Item = (WheelId, f64)>) {
        let targets = targets.into_iter().collect::<Vec<_>>();
        self.lock().targets.extend(targets);
    }

    /// Stop all wheels and motion. Targets queued before are discarded.
    pub fn halt(&self) {
        let mut pending = self.lock();
        pending.halt = true;
        pending.targets.clear();
    }

    pub fn handle(&self, command: &MotorCommand) -> Acknowledgement {
        let (target, ack) = self.acknowledge(command);
        if let Some((wheel_id, speed)) = target {
            self.set_wheel_target(wheel_id, speed);
        }
        ack
    }

    /// Commands whose targets must take effect in the same tick. Rejected commands do not
    /// hold back the others.
    pub fn handle_all(&self, commands: &[MotorCommand]) -> Vec<Acknowledgement> {
        let (targets, acks): (Vec<_>, Vec<_>) = commands
            .iter()
            .map(|command| self.acknowledge(command))
            .unzip();
        self.set_targets(targets.into_iter().flatten());
        acks
    }

    fn acknowledge(&self, command: &MotorCommand) -> (Option<(WheelId, f64)>, Acknowledgement) {
        match command.resolve(&self.pins) {
            Ok((wheel_id, speed)) => (
                Some((wheel_id, speed)),
                Acknowledgement::accepted(command, wheel_id, speed),
            ),
            Err(error) => {
                warn!("Dropped motor command `{}`: {error}", command.command);
                (None, Acknowledgement::rejected(command, &self.pins, &error))
            }
        }
    }

    /// Everything received so far, leaving the inbox empty.
    pub fn take(&self) -> PendingTargets {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> MutexGuard<'_, PendingTargets> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub struct Controller {
    inbox: CommandInbox,
    demo: bool,
}

impl Controller {
    pub fn new(inbox: CommandInbox) -> Self {
        Self { inbox, demo: false }
    }

    pub fn with_demo(self, demo: bool) -> Self {
        Self { demo, ..self }
    }
}

impl Plugin for Controller {
    fn build(&self, app: &mut App) {
        if self.demo {
            spawn(self.inbox.clone());
        }

        app.insert_resource(CommandInboxRes::from(self.inbox.clone()))
            .add_systems(PreUpdate, control);
    }
}

fn control(inbox: Res<CommandInboxRes>, mut simulation: ResMut<SimulationRes>) {
    let pending = inbox.take();
    if pending.is_empty() {
        return;
    }
    debug!("Applying wheel targets {:?}", pending);
    pending.apply(&mut simulation);
}

struct DemoStep {
    name: &'static str,
    /// `(command, pin1, pin2, speed)`
    commands: &'static [(&'static str, i64, i64, f64)],
    seconds: f64,
}

const STOP_ALL: &[(&str, i64, i64, f64)] = &[
    ("stop", 17, 27, 0.0),
    ("stop", 22, 23, 0.0),
    ("stop", 24, 25, 0.0),
    ("stop", 5, 6, 0.0),
];

const DEMO_PROGRAM: &[DemoStep] = &[
    DemoStep {
        name: "forward",
        commands: &[("forward", 24, 25, 0.6), ("forward", 5, 6, 0.6)],
        seconds: 2.0,
    },
    DemoStep {
        name: "backward",
        commands: &[("backward", 24, 25, 0.6), ("backward", 5, 6, 0.6)],
        seconds: 2.0,
    },
    DemoStep {
        name: "strafe right",
        commands: &[("backward", 17, 27, 0.6), ("forward", 22, 23, 0.6)],
        seconds: 2.0,
    },
    DemoStep {
        name: "strafe left",
        commands: &[("forward", 17, 27, 0.6), ("backward", 22, 23, 0.6)],
        seconds: 2.0,
    },
    DemoStep {
        name: "rotate",
        commands: &[("move", 17, 27, 0.4), ("move", 22, 23, 0.4)],
        seconds: 2.0,
    },
];

fn spawn(inbox: CommandInbox) {
    let _ = thread::spawn(move || loop {
        for step in DEMO_PROGRAM {
            info!("Demo: {}", step.name);
            send(&inbox, step.commands);
            thread::sleep(Duration::from_secs_f64(step.seconds));
            send(&inbox, STOP_ALL);
            thread::sleep(Duration::from_secs(1));
        }
    });
}

fn send(inbox: &CommandInbox, commands: &[(&str, i64, i64, f64)]) {
    let commands = commands
        .iter()
        .map(|(command, pin1, pin2, speed)| MotorCommand::new(command, *pin1, *pin2, *speed))
        .collect::<Vec<_>>();
    for ack in inbox.handle_all(&commands) {
        debug!("{}", ack.message);
    }
}
