//! Audio engine state
//!
//! The explicitly constructed core that the old window-global audio context
//! becomes: sample rate, the transport clock, the smoothed master gain, and
//! the ready/suspended flag that gates channel creation.

use crate::synth::{SmoothedParam, DEFAULT_SMOOTHING};

/// Default master gain.
const MASTER_DEFAULT: f64 = 0.5;

pub struct AudioEngine {
    sample_rate: f64,
    samples_elapsed: u64,
    master: SmoothedParam,
    ready: bool,
}

impl AudioEngine {
    /// A ready engine at the given sample rate.
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            samples_elapsed: 0,
            master: SmoothedParam::new(MASTER_DEFAULT, sample_rate),
            ready: true,
        }
    }

    /// An engine whose synthesis subsystem has not come up yet. Operations
    /// against it degrade to queued/no-op until [`AudioEngine::resume`].
    pub fn suspended(sample_rate: f64) -> Self {
        let mut engine = Self::new(sample_rate);
        engine.ready = false;
        engine
    }

    pub fn resume(&mut self) {
        self.ready = true;
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// Transport time in seconds: samples processed so far over the rate.
    pub fn now(&self) -> f64 {
        self.samples_elapsed as f64 / self.sample_rate
    }

    /// Advance the transport by one sample.
    pub fn advance(&mut self) {
        self.samples_elapsed += 1;
    }

    /// Advance the transport without rendering. Used by offline drivers and
    /// tests that need time to pass between updates.
    pub(crate) fn skip_ahead(&mut self, secs: f64) {
        self.samples_elapsed += (secs.max(0.0) * self.sample_rate) as u64;
    }

    pub fn set_master_volume(&mut self, volume: f64) {
        self.master
            .set_target(volume.clamp(0.0, 1.0), DEFAULT_SMOOTHING);
    }

    pub fn master_volume(&self) -> f64 {
        self.master.target()
    }

    /// Next smoothed master gain sample.
    pub fn master_gain_next(&mut self) -> f64 {
        self.master.next()
    }
}
