//! Contains the building blocks of the tree.
//!
//! The race state machine owns the lights and the timing rules. The input
//! mapper and the activity pump feed it, one with key intents and one with
//! ticks. The scoreboard listens to what comes out. The `TreeEngine` wires
//! them together in its driving loop.

pub mod input;
pub mod pump;
pub mod race;
pub mod scoreboard;
