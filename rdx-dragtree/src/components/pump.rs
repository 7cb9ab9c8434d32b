//! The activity pump: a background task that keeps the driving loop awake.

use crate::time::Tick;
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tokio::time::Instant;
use tracing::debug;

/// Capacity of the pump's channel. One slot makes every send a blocking
/// handoff, so at most one tick is ever waiting for the loop.
pub const PUMP_CAPACITY: usize = 1;

/// Emits `Tick`s into a one-slot channel for as long as someone receives them.
///
/// The pump has no rate of its own: `send` waits while the previous tick is
/// still unconsumed, so it runs exactly as fast as the loop drains it. A
/// non-zero `interval` adds a pause between ticks.
pub struct ActivityPump {
    interval: Duration,
    sender: mpsc::Sender<Tick>,
}

impl ActivityPump {
    pub fn new(interval: Duration, sender: mpsc::Sender<Tick>) -> Self {
        Self { interval, sender }
    }

    /// Creates a pump together with the receiving end of its channel.
    pub fn channel(interval: Duration) -> (Self, mpsc::Receiver<Tick>) {
        let (sender, receiver) = mpsc::channel(PUMP_CAPACITY);
        (Self::new(interval, sender), receiver)
    }

    /// Runs until the receiver is dropped or a shutdown signal arrives.
    pub async fn run(self, mut shutdown_rx: broadcast::Receiver<()>) {
        let mut tick_count: u64 = 0;
        loop {
            let tick = Tick {
                tick_count,
                timestamp: Instant::now(),
            };
            tokio::select! {
                biased;
                _ = shutdown_rx.recv() => break,
                sent = self.sender.send(tick) => {
                    if sent.is_err() {
                        break;
                    }
                }
            }
            tick_count = tick_count.wrapping_add(1);
            if self.interval.is_zero() {
                tokio::task::yield_now().await;
            } else {
                tokio::time::sleep(self.interval).await;
            }
        }
        debug!("Activity pump stopped after {} ticks.", tick_count);
    }
}
