//! Defines all public event types of the Dragtree engine.
//!
//! `LoopEvent` is what the driving loop feeds into the race state machine.
//! `RaceEvent` is what comes back out of a transition and is broadcast to
//! subscribers. `SystemEvent` reports the lifecycle of the engine itself.

use crate::common::{Intent, Stage};
use crate::time::Tick;
use std::time::Duration;
use tokio::time::Instant;

/// Everything the driving loop can hand to the state machine.
#[derive(Debug, Clone, Copy)]
pub enum LoopEvent {
    /// The activity pump asked for a re-evaluation of the stage thresholds.
    Tick(Tick),
    /// A key press that mapped to an intent.
    Key(Intent),
}

/// The outcome of a race state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceEvent {
    /// An idle tree started a new run at PreStage.
    Armed,
    /// A timed stage held for its full duration and the next light came on.
    StageAdvanced { from: Stage, to: Stage },
    /// The driver reacted to the green light.
    Finished { reaction_time: Duration },
    /// The driver left early. `stage` is the stage that was jumped.
    FalseStart { stage: Stage },
    /// The false-start cool-down ran out and the tree went idle.
    CooldownElapsed,
    /// A finished run was on display long enough and the tree went idle.
    HoldElapsed,
    /// The driver reset the tree.
    Reset,
    /// The help overlay was shown or hidden.
    HelpToggled { visible: bool },
    /// The driver asked to quit.
    QuitRequested,
}

/// Events related to the lifecycle of the engine itself.
#[derive(Debug, Clone)]
pub enum SystemEvent {
    /// Fired once when the engine's `run` loop begins.
    EngineStarted { timestamp: Instant },
    /// Fired once when the engine's `run` loop has exited.
    EngineShutdown,
    /// A key arrived that is not bound to any intent.
    KeyIgnored { key: String },
}
