//! Round countdown.
//!
//! `Countdown` is the pure, tick-driven state kept inside a round.
//! `RoundTicker` is the session-side clock that produces one tick per second
//! while a round is active. It is disarmed in the same step that resolves the
//! round, and every tick carries the id of the round it was armed for.

use std::future;
use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

pub const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Seconds left after this tick.
    Running(u32),
    /// Reached zero on this tick. Reported once.
    Expired,
    /// Already expired earlier; nothing happens.
    Stopped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Countdown {
    remaining: u32,
    expired: bool,
}

impl Countdown {
    pub fn new(secs: u32) -> Self {
        Self { remaining: secs, expired: secs == 0 }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn tick(&mut self) -> TickOutcome {
        if self.expired {
            return TickOutcome::Stopped;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.expired = true;
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining)
        }
    }
}

/// One-second tick source bound to a single round id.
#[derive(Debug, Default)]
pub struct RoundTicker {
    armed: Option<(u64, Interval)>,
}

impl RoundTicker {
    pub fn idle() -> Self {
        Self { armed: None }
    }

    /// Start ticking for `round_id`, replacing any previous round's ticks.
    pub fn arm(&mut self, round_id: u64) {
        let mut iv = interval_at(Instant::now() + TICK, TICK);
        iv.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.armed = Some((round_id, iv));
    }

    pub fn disarm(&mut self) {
        self.armed = None;
    }

    pub fn armed_for(&self) -> Option<u64> {
        self.armed.as_ref().map(|(id, _)| *id)
    }

    /// Match the engine's active round: re-arm for a new round, disarm when none.
    pub fn follow(&mut self, active_round: Option<u64>) {
        match active_round {
            Some(id) if self.armed_for() != Some(id) => self.arm(id),
            Some(_) => {}
            None => self.disarm(),
        }
    }

    /// Wait for the next tick. Pends forever while disarmed.
    pub async fn next(&mut self) -> u64 {
        match &mut self.armed {
            Some((id, iv)) => {
                iv.tick().await;
                *id
            }
            None => future::pending().await,
        }
    }
}
