//! # Dragtree
//!
//! An event-driven drag racing "Christmas tree" for the terminal.
//!
//! Dragtree runs the staging lights of a drag strip on a timed schedule,
//! measures how fast the driver reacts to the green light, and catches
//! drivers who leave before it ("red-lighting"). The crate is the engine only;
//! drawing the tree and reading the keyboard are left to the application.
//!
//! ## Core Concepts
//!
//! - **Stage Clock**: Pure elapsed-time arithmetic over monotonic instants.
//!   Every stage holds until its configured duration has passed since the
//!   stage's anchor.
//! - **Race State Machine**: The single owner of the race state. It consumes
//!   ticks and key intents and answers with an optional `RaceEvent`.
//! - **Activity Pump**: A background task that wakes the driving loop through
//!   a one-slot channel so time thresholds are re-evaluated continuously.
//! - **Input Mapper**: A static key table turning raw key names into intents
//!   (`Action`, `Reset`, `ToggleHelp`, `Quit`).
//! - **Configuration-Driven**: Stage durations, the number of yellow lights,
//!   cool-downs and key bindings come from a `TreeConfig`, usually loaded
//!   from a TOML file.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use dragtree::prelude::*;
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // 1. Create a default configuration and the engine.
//!     let engine = TreeEngine::new(TreeConfig::default());
//!
//!     // 2. Subscribe before running; `run` consumes the engine.
//!     let mut race_events = engine.subscribe_race_events();
//!     tokio::spawn(async move {
//!         while let Ok(event) = race_events.recv().await {
//!             println!("Race event: {:?}", event);
//!         }
//!     });
//!
//!     // 3. Feed key presses from wherever they come from.
//!     let (key_tx, key_rx) = mpsc::channel(16);
//!     tokio::spawn(async move {
//!         tokio::time::sleep(std::time::Duration::from_secs(6)).await;
//!         key_tx.send("g".to_string()).await.ok();
//!         key_tx.send("q".to_string()).await.ok();
//!     });
//!
//!     // 4. Run until Quit.
//!     let scoreboard = engine.run(key_rx).await?;
//!     println!("Best reaction: {:?}", scoreboard.best());
//!     Ok(())
//! }
//! ```

pub const ENGINE_NAME: &str = "Drag Tree";
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod common;
pub mod components;
pub mod config;
pub mod engine;
pub mod events;
pub mod time;

/// A prelude module for easy importing of the most common Dragtree types.
pub mod prelude {
    pub use crate::common::{Intent, RaceMessage, Stage};
    pub use crate::components::input::InputMapper;
    pub use crate::components::race::{RaceStateMachine, Snapshot};
    pub use crate::components::scoreboard::Scoreboard;
    pub use crate::config::{StageTiming, TreeConfig};
    pub use crate::engine::{Frame, TreeEngine};
    pub use crate::events::{LoopEvent, RaceEvent, SystemEvent};
}
