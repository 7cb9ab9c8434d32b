//! The driving loop that owns the tree and connects it to the outside world.

use crate::components::input::InputMapper;
use crate::components::pump::ActivityPump;
use crate::components::race::{RaceStateMachine, Snapshot};
use crate::components::scoreboard::Scoreboard;
use crate::config::TreeConfig;
use crate::events::{LoopEvent, RaceEvent, SystemEvent};
use crate::ENGINE_NAME;
use anyhow::Context;
use chrono::Utc;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, info, trace};

/// Everything the presentation needs to draw one screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub race: Snapshot,
    /// Fastest reaction of the session.
    pub best: Option<Duration>,
    pub runs: u32,
    pub false_starts: u32,
}

/// The main Dragtree engine.
///
/// The engine owns the race state machine outright. `run` consumes the
/// engine and is the only place the race state is ever written, so there is
/// no shared state and no locking. The outside world talks to it through
/// channels: key identifiers go in, `RaceEvent`s and `Frame`s come out.
pub struct TreeEngine {
    config: TreeConfig,
    mapper: InputMapper,
    machine: RaceStateMachine,
    scoreboard: Scoreboard,
    race_event_sender: broadcast::Sender<RaceEvent>,
    system_event_sender: broadcast::Sender<SystemEvent>,
    frame_sender: watch::Sender<Frame>,
}

// Core implementation block for internal logic.
impl TreeEngine {
    /// Creates a new `TreeEngine` with the given configuration.
    ///
    /// The tree starts idle and arms itself on the first tick of `run`.
    pub fn new(config: TreeConfig) -> Self {
        const EVENT_CHANNEL_CAPACITY: usize = 64;
        let (race_event_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (system_event_sender, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let machine = RaceStateMachine::new(config.timing.clone(), Instant::now());
        let scoreboard = Scoreboard::new(config.scoreboard.history_len);
        let mapper = InputMapper::new(&config.keys);
        let (frame_sender, _) = watch::channel(Frame {
            race: machine.snapshot(),
            best: None,
            runs: 0,
            false_starts: 0,
        });

        Self {
            config,
            mapper,
            machine,
            scoreboard,
            race_event_sender,
            system_event_sender,
            frame_sender,
        }
    }

    /// Runs the driving loop until a Quit intent or until `keys` is closed.
    ///
    /// This method will:
    /// 1. Spawn the `ActivityPump` task.
    /// 2. Feed every tick and every mapped key into the state machine.
    /// 3. Broadcast each resulting `RaceEvent` and publish the new `Frame`.
    /// 4. Stop the pump and return the session's `Scoreboard`.
    pub async fn run(mut self, mut keys: mpsc::Receiver<String>) -> anyhow::Result<Scoreboard> {
        info!("{} starting up...", ENGINE_NAME);
        let (shutdown_tx, _) = broadcast::channel(1);

        let (pump, mut tick_rx) = ActivityPump::channel(self.config.pump.interval());
        let pump_handle = tokio::spawn(pump.run(shutdown_tx.subscribe()));

        self.system_event_sender
            .send(SystemEvent::EngineStarted {
                timestamp: Instant::now(),
            })
            .ok();
        info!(
            "Tree running, {:?} from staging to green.",
            self.config.timing.time_to_green()
        );

        loop {
            let event = tokio::select! {
                biased;
                key = keys.recv() => match key {
                    Some(key) => match self.mapper.map(&key) {
                        Some(intent) => LoopEvent::Key(intent),
                        None => {
                            trace!("Ignoring unbound key {:?}.", key);
                            self.system_event_sender
                                .send(SystemEvent::KeyIgnored { key })
                                .ok();
                            continue;
                        }
                    },
                    None => {
                        info!("Key input closed.");
                        break;
                    }
                },
                Some(tick) = tick_rx.recv() => {
                    trace!("Tick #{} received.", tick.tick_count);
                    LoopEvent::Tick(tick)
                }
            };
            if self.process(event, Instant::now()) {
                break;
            }
        }

        info!("Shutting down...");
        if shutdown_tx.send(()).is_err() {
            debug!("Activity pump had already stopped.");
        }
        drop(tick_rx);
        pump_handle.await.context("activity pump task failed")?;
        self.system_event_sender
            .send(SystemEvent::EngineShutdown)
            .ok();
        info!(
            "{} has shut down after {} runs.",
            ENGINE_NAME,
            self.scoreboard.runs()
        );
        Ok(self.scoreboard)
    }

    /// Applies one loop event. Returns `true` when the loop should stop.
    fn process(&mut self, event: LoopEvent, now: Instant) -> bool {
        let Some(race_event) = self.machine.dispatch(event, now) else {
            return false;
        };
        debug!("Race event: {:?}", race_event);
        if let Some(record) = self.scoreboard.record(&race_event, Utc::now()) {
            info!("Run recorded: {:?}", record.result);
        }
        self.race_event_sender.send(race_event).ok();
        self.publish_frame();
        race_event == RaceEvent::QuitRequested
    }

    fn publish_frame(&self) {
        let frame = self.frame();
        self.frame_sender.send_if_modified(|current| {
            if *current == frame {
                false
            } else {
                *current = frame;
                true
            }
        });
    }
}

// Public API implementation block.
impl TreeEngine {
    /// The current screen, as the presentation would draw it.
    pub fn frame(&self) -> Frame {
        Frame {
            race: self.machine.snapshot(),
            best: self.scoreboard.best(),
            runs: self.scoreboard.runs(),
            false_starts: self.scoreboard.false_starts(),
        }
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// The key table, for drawing help.
    pub fn mapper(&self) -> &InputMapper {
        &self.mapper
    }

    /// Subscribes to the `RaceEvent` stream.
    pub fn subscribe_race_events(&self) -> broadcast::Receiver<RaceEvent> {
        self.race_event_sender.subscribe()
    }

    /// Subscribes to the `SystemEvent` stream.
    pub fn subscribe_system_events(&self) -> broadcast::Receiver<SystemEvent> {
        self.system_event_sender.subscribe()
    }

    /// Watches the latest `Frame`. Only changed frames wake the receiver.
    pub fn watch_frames(&self) -> watch::Receiver<Frame> {
        self.frame_sender.subscribe()
    }
}
