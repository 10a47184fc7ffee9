//! Historical replay scheduler
//!
//! Walks the channels' loaded historical series at a fixed tick rate and
//! feeds each entry back through the live update path, looping at the end.
//! The scheduler owns no timer; the host loop calls [`PlaybackScheduler::advance`]
//! once per tick, which keeps it trivially cancellable.

use std::time::Duration;

use super::MixEngine;

/// Default tick rate: one history step per second.
const DEFAULT_TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PlaybackState {
    Stopped,
    Playing,
}

pub struct PlaybackScheduler {
    state: PlaybackState,
    index: usize,
    tick_interval: Duration,
}

impl PlaybackScheduler {
    pub fn new() -> Self {
        Self {
            state: PlaybackState::Stopped,
            index: 0,
            tick_interval: DEFAULT_TICK,
        }
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.set_tick_interval(interval);
        self
    }

    pub fn set_tick_interval(&mut self, interval: Duration) {
        self.tick_interval = interval.max(Duration::from_millis(10));
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn position(&self) -> usize {
        self.index
    }

    /// Begin replay from the start of the data.
    pub fn start(&mut self) {
        self.index = 0;
        self.state = PlaybackState::Playing;
    }

    /// Halt replay. The position rewinds on the next start.
    pub fn stop(&mut self) {
        self.state = PlaybackState::Stopped;
    }

    /// One tick: step the loop position and feed every channel its entry.
    /// The loop length is re-read each tick because channels can be added
    /// or removed mid-playback; channels shorter than the position freeze
    /// on their last value.
    pub fn advance(&mut self, engine: &mut MixEngine) {
        if self.state != PlaybackState::Playing {
            return;
        }
        let max_len = engine.max_history_len();
        self.index = (self.index + 1) % max_len.max(1);
        engine.feed_history(self.index);
    }
}

impl Default for PlaybackScheduler {
    fn default() -> Self {
        Self::new()
    }
}
