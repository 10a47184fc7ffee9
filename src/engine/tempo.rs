//! Tempo negotiation with an external rhythm generator
//!
//! The mix engine publishes tempo changes to injected subscriber callbacks
//! and accepts inbound tempo from the rhythm generator while sync is on.
//! Neither side knows the other's type; the contract is just these two
//! directions.

/// Transport tempo bounds in BPM.
pub const TEMPO_MIN: f64 = 60.0;
pub const TEMPO_MAX: f64 = 200.0;

pub type TempoCallback = Box<dyn Fn(f64) + Send>;

pub struct TempoLink {
    bpm: f64,
    sync_enabled: bool,
    subscribers: Vec<TempoCallback>,
}

impl TempoLink {
    pub fn new(bpm: f64) -> Self {
        Self {
            bpm: bpm.clamp(TEMPO_MIN, TEMPO_MAX),
            sync_enabled: true,
            subscribers: Vec::new(),
        }
    }

    pub fn bpm(&self) -> f64 {
        self.bpm
    }

    /// Register a consumer of outbound tempo changes.
    pub fn subscribe(&mut self, callback: TempoCallback) {
        self.subscribers.push(callback);
    }

    /// Local tempo change: clamp, store, publish. Returns the clamped BPM.
    pub fn set_bpm(&mut self, bpm: f64) -> f64 {
        self.bpm = bpm.clamp(TEMPO_MIN, TEMPO_MAX);
        for subscriber in &self.subscribers {
            subscriber(self.bpm);
        }
        self.bpm
    }

    /// Inbound tempo from the external rhythm generator. Applied only while
    /// sync is enabled, and never re-published (no feedback loop). Returns
    /// whether the change was taken.
    pub fn receive(&mut self, bpm: f64) -> bool {
        if !self.sync_enabled {
            return false;
        }
        self.bpm = bpm.clamp(TEMPO_MIN, TEMPO_MAX);
        true
    }

    pub fn set_sync_enabled(&mut self, enabled: bool) {
        self.sync_enabled = enabled;
    }

    pub fn sync_enabled(&self) -> bool {
        self.sync_enabled
    }
}
