//! Per-connection heartbeat.
//!
//! The monitor is plain state: the connection task owns the ticker it hands
//! out, so the timer is dropped together with the connection.

use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    Alive,
    Terminated,
}

/// What the connection must do on a heartbeat tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Peer answered the previous ping; send another.
    Ping,
    /// No pong since the last tick; force-close the transport.
    Terminate,
}

#[derive(Debug)]
pub struct LivenessMonitor {
    period: Duration,
    state: LivenessState,
    pong_seen: bool,
}

impl LivenessMonitor {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            state: LivenessState::Alive,
            // A fresh connection counts as responsive until the first tick.
            pong_seen: true,
        }
    }

    pub fn state(&self) -> LivenessState {
        self.state
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn record_pong(&mut self) {
        self.pong_seen = true;
    }

    pub fn on_tick(&mut self) -> Tick {
        if self.state == LivenessState::Terminated || !self.pong_seen {
            self.state = LivenessState::Terminated;
            return Tick::Terminate;
        }
        self.pong_seen = false;
        Tick::Ping
    }

    /// Interval whose first tick fires one full period from now.
    pub fn ticker(&self) -> Interval {
        let mut ticker = interval_at(Instant::now() + self.period, self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker
    }
}
