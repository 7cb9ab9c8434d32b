//! Contains common, primitive types shared across the engine.
//!
//! `Stage` is the position of the tree in its light sequence, `Intent` is what
//! a key press means to the race, and `RaceMessage` is the status line shown
//! to the driver. Using small `Copy` enums keeps the state machine's
//! transitions exhaustive and cheap to snapshot.

use std::fmt;

/// The discrete position of the tree in its light sequence.
///
/// Variants are ordered the way a run progresses, so `stage > Stage::PreStage`
/// reads as "the pre-stage bulbs are lit". A timed stage lights its own bulbs
/// once its hold has elapsed, which is the moment the machine moves past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    /// Nothing is running. The next tick arms the tree.
    Idle,
    /// The car is rolling into the pre-stage beams.
    PreStage,
    /// Pre-stage bulbs lit, rolling into the stage beams.
    FullStage,
    /// Counting down an amber light. Indexed from zero when several yellow
    /// stages are configured.
    Yellow(u8),
    /// Ambers lit, counting down to green.
    Green,
    /// Green is lit and the reaction window is open.
    Launch,
    /// A valid reaction was measured; the result is on display.
    Finished,
    /// The driver left before green.
    FalseStart,
}

impl Stage {
    /// Returns `true` for stages that hold for a configured duration and then
    /// auto-advance to the next light.
    pub fn is_timed(self) -> bool {
        matches!(
            self,
            Stage::PreStage | Stage::FullStage | Stage::Yellow(_) | Stage::Green
        )
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Idle => write!(f, "idle"),
            Stage::PreStage => write!(f, "pre-stage"),
            Stage::FullStage => write!(f, "full stage"),
            Stage::Yellow(n) => write!(f, "yellow #{}", n + 1),
            Stage::Green => write!(f, "green"),
            Stage::Launch => write!(f, "launch"),
            Stage::Finished => write!(f, "finished"),
            Stage::FalseStart => write!(f, "false start"),
        }
    }
}

/// What a key press means to the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Intent {
    /// Leave the line.
    Action,
    /// Abort the current run and go back to idle.
    Reset,
    /// Show or hide the full key help.
    ToggleHelp,
    /// Stop the driving loop.
    Quit,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Action => write!(f, "Action"),
            Intent::Reset => write!(f, "Reset"),
            Intent::ToggleHelp => write!(f, "toggle help"),
            Intent::Quit => write!(f, "Quit"),
        }
    }
}

/// The last user-facing status of the race.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaceMessage {
    FalseStart,
    Finished,
    Reset,
}

impl fmt::Display for RaceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RaceMessage::FalseStart => write!(f, "FALSE START"),
            RaceMessage::Finished => write!(f, "FINISHED"),
            RaceMessage::Reset => write!(f, "RESET"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stages_are_ordered_like_a_run() {
        let run = [
            Stage::Idle,
            Stage::PreStage,
            Stage::FullStage,
            Stage::Yellow(0),
            Stage::Yellow(1),
            Stage::Yellow(2),
            Stage::Green,
            Stage::Launch,
            Stage::Finished,
        ];
        assert!(run.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
