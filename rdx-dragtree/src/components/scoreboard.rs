//! Session statistics: best reaction, run counts and a short history.

use crate::common::Stage;
use crate::events::RaceEvent;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::time::Duration;

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunResult {
    Reaction(Duration),
    /// The driver jumped the given stage.
    FalseStart(Stage),
}

/// One finished run, stamped with wall-clock time for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRecord {
    pub recorded_at: DateTime<Utc>,
    pub result: RunResult,
}

/// Aggregates `RaceEvent`s into session statistics.
#[derive(Debug, Clone)]
pub struct Scoreboard {
    history: VecDeque<RunRecord>,
    capacity: usize,
    best: Option<Duration>,
    runs: u32,
    false_starts: u32,
}

impl Scoreboard {
    /// Creates an empty scoreboard that remembers the last `capacity` runs.
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity,
            best: None,
            runs: 0,
            false_starts: 0,
        }
    }

    /// Records the event if it ends a run. Returns the new record, if any.
    pub fn record(&mut self, event: &RaceEvent, at: DateTime<Utc>) -> Option<&RunRecord> {
        let result = match *event {
            RaceEvent::Finished { reaction_time } => {
                self.runs += 1;
                if self.best.map_or(true, |best| reaction_time < best) {
                    self.best = Some(reaction_time);
                }
                RunResult::Reaction(reaction_time)
            }
            RaceEvent::FalseStart { stage } => {
                self.runs += 1;
                self.false_starts += 1;
                RunResult::FalseStart(stage)
            }
            _ => return None,
        };

        if self.capacity == 0 {
            return None;
        }
        if self.history.len() == self.capacity {
            self.history.pop_front();
        }
        self.history.push_back(RunRecord {
            recorded_at: at,
            result,
        });
        self.history.back()
    }

    /// Fastest valid reaction of the session.
    pub fn best(&self) -> Option<Duration> {
        self.best
    }

    /// Runs that ended in a reaction or a false start.
    pub fn runs(&self) -> u32 {
        self.runs
    }

    pub fn false_starts(&self) -> u32 {
        self.false_starts
    }

    /// Recent runs, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &RunRecord> {
        self.history.iter()
    }

    pub fn last(&self) -> Option<&RunRecord> {
        self.history.back()
    }

    /// Mean of the valid reactions still in the history.
    pub fn recent_average(&self) -> Option<Duration> {
        let reactions: Vec<Duration> = self
            .history
            .iter()
            .filter_map(|record| match record.result {
                RunResult::Reaction(time) => Some(time),
                RunResult::FalseStart(_) => None,
            })
            .collect();
        if reactions.is_empty() {
            return None;
        }
        let total: Duration = reactions.iter().sum();
        Some(total / reactions.len() as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(ms: u64) -> RaceEvent {
        RaceEvent::Finished {
            reaction_time: Duration::from_millis(ms),
        }
    }

    #[test]
    fn keeps_the_fastest_reaction() {
        let mut board = Scoreboard::new(10);
        let now = Utc::now();
        board.record(&finished(310), now);
        board.record(&finished(180), now);
        board.record(&finished(250), now);
        assert_eq!(board.best(), Some(Duration::from_millis(180)));
        assert_eq!(board.runs(), 3);
        assert_eq!(board.false_starts(), 0);
    }

    #[test]
    fn false_starts_count_as_runs_but_not_times() {
        let mut board = Scoreboard::new(10);
        let now = Utc::now();
        let record = board
            .record(
                &RaceEvent::FalseStart {
                    stage: Stage::Yellow(0),
                },
                now,
            )
            .cloned();
        assert_eq!(
            record.map(|r| r.result),
            Some(RunResult::FalseStart(Stage::Yellow(0)))
        );
        assert_eq!(board.best(), None);
        assert_eq!(board.runs(), 1);
        assert_eq!(board.false_starts(), 1);
        assert_eq!(board.recent_average(), None);
    }

    #[test]
    fn other_events_are_not_runs() {
        let mut board = Scoreboard::new(10);
        let now = Utc::now();
        assert!(board.record(&RaceEvent::Armed, now).is_none());
        assert!(board.record(&RaceEvent::Reset, now).is_none());
        assert!(board.record(&RaceEvent::HoldElapsed, now).is_none());
        assert_eq!(board.runs(), 0);
        assert_eq!(board.history().count(), 0);
    }

    #[test]
    fn history_is_bounded() {
        let mut board = Scoreboard::new(2);
        let now = Utc::now();
        board.record(&finished(100), now);
        board.record(&finished(200), now);
        board.record(&finished(300), now);

        let kept: Vec<RunResult> = board.history().map(|r| r.result).collect();
        assert_eq!(
            kept,
            vec![
                RunResult::Reaction(Duration::from_millis(200)),
                RunResult::Reaction(Duration::from_millis(300)),
            ]
        );
        // The best time outlives the history.
        assert_eq!(board.best(), Some(Duration::from_millis(100)));
        assert_eq!(board.recent_average(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn zero_capacity_still_counts() {
        let mut board = Scoreboard::new(0);
        assert!(board.record(&finished(120), Utc::now()).is_none());
        assert_eq!(board.runs(), 1);
        assert_eq!(board.best(), Some(Duration::from_millis(120)));
        assert!(board.last().is_none());
    }
}
