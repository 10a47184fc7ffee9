//! Synthesis engine
//!
//! Oscillators, envelopes, filters, delay, smoothed parameters and the two
//! channel strip types built from them.

mod continuous;
mod delay;
mod envelope;
mod filter;
mod instrument;
mod oscillator;
mod param;

pub use continuous::ContinuousStrip;
pub use delay::DelayLine;
pub use envelope::{Envelope, EnvelopeStage};
pub use filter::{Filter, FilterMode};
pub use instrument::InstrumentStrip;
pub use oscillator::{Oscillator, Waveform};
pub use param::{SmoothedParam, DEFAULT_SMOOTHING};
