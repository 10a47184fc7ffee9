//! Source trait and Reading definition
//!
//! The boundary the external data service implements: a source pushes one
//! `Reading` per datastream per polling cycle over a broadcast channel.

use std::time::Instant;

use tokio::sync::broadcast;

/// One sensor reading for one datastream.
#[derive(Debug, Clone)]
pub struct Reading {
    /// Datastream id, e.g. "site1_co2".
    pub stream: String,

    /// When the reading was produced.
    pub timestamp: Instant,

    /// Raw value in the stream's own unit.
    pub value: f64,

    /// True when the producer substituted a synthetic value (degraded
    /// upstream). The engine treats it like any other reading; the flag is
    /// only surfaced for display.
    pub simulated: bool,
}

impl Reading {
    pub fn new(stream: impl Into<String>, value: f64) -> Self {
        Self {
            stream: stream.into(),
            timestamp: Instant::now(),
            value,
            simulated: false,
        }
    }

    pub fn simulated(mut self) -> Self {
        self.simulated = true;
        self
    }
}

/// A producer of readings.
pub trait Source: Send + Sync {
    fn name(&self) -> &str;

    /// Start pushing readings.
    fn start(&mut self) -> anyhow::Result<()>;

    /// Stop pushing readings.
    fn stop(&mut self);

    fn is_running(&self) -> bool;

    /// Subscribe to this source's readings.
    fn subscribe(&self) -> broadcast::Receiver<Reading>;
}
