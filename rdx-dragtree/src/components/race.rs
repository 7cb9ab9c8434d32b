//! The race state machine: staged lights, reaction timing and false starts.

use crate::common::{Intent, RaceMessage, Stage};
use crate::config::StageTiming;
use crate::events::{LoopEvent, RaceEvent};
use crate::time::{elapsed, has_elapsed};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// The mutable state of the tree.
///
/// Only `RaceStateMachine` writes to it. Every transition that changes
/// `stage` also moves `anchor` to the instant of the transition.
#[derive(Debug, Clone)]
pub struct RaceState {
    pub stage: Stage,
    /// The timed sequence is advancing on its own.
    pub active: bool,
    pub false_started: bool,
    /// Start of the current stage's hold.
    pub anchor: Instant,
    /// Set by a valid reaction, meaningful while `stage == Finished`.
    pub reaction_time: Option<Duration>,
    pub message: Option<RaceMessage>,
}

impl RaceState {
    fn new(now: Instant) -> Self {
        Self {
            stage: Stage::Idle,
            active: false,
            false_started: false,
            anchor: now,
            reaction_time: None,
            message: None,
        }
    }

    fn enter(&mut self, stage: Stage, now: Instant) {
        self.stage = stage;
        self.anchor = now;
    }
}

/// A read-only copy of the race state, taken after each transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub stage: Stage,
    pub active: bool,
    pub false_started: bool,
    pub reaction_time: Option<Duration>,
    pub message: Option<RaceMessage>,
    /// Presentation only; never affects the race.
    pub help_visible: bool,
}

/// Drives a `RaceState` from ticks and key intents.
///
/// Both entry points are synchronous and total: any input in any state yields
/// a valid next state, plus the `RaceEvent` describing what changed, if
/// anything did.
#[derive(Debug, Clone)]
pub struct RaceStateMachine {
    timing: StageTiming,
    state: RaceState,
    help_visible: bool,
}

impl RaceStateMachine {
    pub fn new(timing: StageTiming, now: Instant) -> Self {
        Self {
            timing,
            state: RaceState::new(now),
            help_visible: false,
        }
    }

    pub fn state(&self) -> &RaceState {
        &self.state
    }

    pub fn timing(&self) -> &StageTiming {
        &self.timing
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            stage: self.state.stage,
            active: self.state.active,
            false_started: self.state.false_started,
            reaction_time: self.state.reaction_time,
            message: self.state.message,
            help_visible: self.help_visible,
        }
    }

    /// Routes a loop event to the matching entry point.
    pub fn dispatch(&mut self, event: LoopEvent, now: Instant) -> Option<RaceEvent> {
        match event {
            LoopEvent::Tick(_) => self.on_tick(now),
            LoopEvent::Key(intent) => self.on_intent(intent, now),
        }
    }

    /// Re-evaluates the stage thresholds at `now`.
    pub fn on_tick(&mut self, now: Instant) -> Option<RaceEvent> {
        let state = &mut self.state;

        if !state.active {
            if state.false_started && state.message.is_some() {
                if !has_elapsed(state.anchor, now, self.timing.cooldown()) {
                    return None;
                }
                // false_started stays set until the next run arms.
                state.message = None;
                state.enter(Stage::Idle, now);
                debug!("False-start cool-down over, tree is idle.");
                return Some(RaceEvent::CooldownElapsed);
            }
            if state.stage == Stage::Idle {
                state.active = true;
                state.false_started = false;
                state.reaction_time = None;
                state.enter(Stage::PreStage, now);
                debug!("Tree armed.");
                return Some(RaceEvent::Armed);
            }
            return None;
        }

        let hold = self.timing.hold(state.stage)?;
        if !has_elapsed(state.anchor, now, hold) {
            return None;
        }

        if state.stage == Stage::Finished {
            state.active = false;
            state.reaction_time = None;
            state.message = None;
            state.enter(Stage::Idle, now);
            debug!("Finish hold over, tree is idle.");
            return Some(RaceEvent::HoldElapsed);
        }

        let from = state.stage;
        let to = self.timing.next_after(from)?;
        if from == Stage::PreStage {
            state.message = None;
        }
        if to == Stage::Launch {
            state.active = false;
        }
        state.enter(to, now);
        debug!("Stage {} -> {}", from, to);
        Some(RaceEvent::StageAdvanced { from, to })
    }

    /// Applies a key intent at `now`.
    pub fn on_intent(&mut self, intent: Intent, now: Instant) -> Option<RaceEvent> {
        match intent {
            Intent::Quit => Some(RaceEvent::QuitRequested),
            Intent::ToggleHelp => {
                self.help_visible = !self.help_visible;
                Some(RaceEvent::HelpToggled {
                    visible: self.help_visible,
                })
            }
            Intent::Action => self.on_action(now),
            Intent::Reset => {
                let state = &mut self.state;
                state.active = false;
                state.false_started = false;
                state.reaction_time = None;
                state.message = Some(RaceMessage::Reset);
                state.enter(Stage::Idle, now);
                debug!("Tree reset.");
                Some(RaceEvent::Reset)
            }
        }
    }

    fn on_action(&mut self, now: Instant) -> Option<RaceEvent> {
        let state = &mut self.state;
        match state.stage {
            Stage::Launch => {
                let reaction_time = elapsed(state.anchor, now);
                state.reaction_time = Some(reaction_time);
                state.active = true;
                state.message = Some(RaceMessage::Finished);
                state.enter(Stage::Finished, now);
                debug!("Reaction time {:?}", reaction_time);
                Some(RaceEvent::Finished { reaction_time })
            }
            // Anywhere outside the reaction window, including a result on
            // display, leaving counts as a red light.
            stage => {
                state.false_started = true;
                state.active = false;
                state.reaction_time = None;
                state.message = Some(RaceMessage::FalseStart);
                state.enter(Stage::FalseStart, now);
                debug!("False start during {}", stage);
                Some(RaceEvent::FalseStart { stage })
            }
        }
    }
}
