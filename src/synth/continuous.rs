//! Continuous channel strip
//!
//! Synthesis graph for the direct mapping family: one oscillator through a
//! resonant low-pass, a gain stage with an optional rhythm pulse, an echo
//! tap and an equal-power stereo panner. Every audible parameter is a
//! [`SmoothedParam`] so mapping updates ramp instead of clicking.

use std::f64::consts::FRAC_PI_4;

use super::delay::DelayLine;
use super::filter::{Filter, FilterMode};
use super::oscillator::{Oscillator, Waveform};
use super::param::SmoothedParam;

/// Length of the rhythm gain boost in seconds.
const PULSE_LEN: f64 = 0.1;
/// Gain multiplier while a pulse is sounding.
const PULSE_BOOST: f64 = 1.5;

/// Recurring gain pulse, tracked as transport timestamps rather than an OS
/// timer so it dies with the strip and cannot outlive a stop.
struct Pulse {
    interval: f64,
    next_fire: f64,
    boost_until: f64,
}

pub struct ContinuousStrip {
    osc: Oscillator,
    filter: Filter,
    delay: DelayLine,

    frequency: SmoothedParam,
    gain: SmoothedParam,
    cutoff: SmoothedParam,
    resonance: SmoothedParam,
    pan: SmoothedParam,
    delay_time: SmoothedParam,

    pulse: Option<Pulse>,
}

impl ContinuousStrip {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            osc: Oscillator::new(Waveform::Sine, 440.0, sample_rate),
            filter: Filter::new(FilterMode::LowPass, 1000.0, sample_rate),
            delay: DelayLine::new(sample_rate),
            frequency: SmoothedParam::new(440.0, sample_rate),
            gain: SmoothedParam::new(0.0, sample_rate),
            cutoff: SmoothedParam::new(1000.0, sample_rate),
            resonance: SmoothedParam::new(1.0, sample_rate),
            pan: SmoothedParam::new(0.0, sample_rate),
            delay_time: SmoothedParam::new(0.25, sample_rate),
            pulse: None,
        }
    }

    pub fn set_frequency_target(&mut self, hz: f64, tau: f64) {
        self.frequency.set_target(hz, tau);
    }

    pub fn set_gain_target(&mut self, gain: f64, tau: f64) {
        self.gain.set_target(gain.clamp(0.0, 1.0), tau);
    }

    pub fn gain_target(&self) -> f64 {
        self.gain.target()
    }

    pub fn set_cutoff_target(&mut self, hz: f64, tau: f64) {
        self.cutoff.set_target(hz, tau);
    }

    pub fn set_resonance_target(&mut self, q: f64, tau: f64) {
        self.resonance.set_target(q, tau);
    }

    pub fn set_pan_target(&mut self, pan: f64, tau: f64) {
        self.pan.set_target(pan.clamp(-1.0, 1.0), tau);
    }

    pub fn set_delay_time_target(&mut self, secs: f64, tau: f64) {
        self.delay_time.set_target(secs, tau);
        // The echo tap only becomes audible once a mapping asks for it.
        if self.delay.mix() == 0.0 {
            self.delay.set_mix(0.3);
        }
    }

    /// Arm the recurring pulse. Once armed the rate is locked in; further
    /// requests are ignored until the pulse is disarmed.
    pub fn arm_pulse(&mut self, bpm: f64, now: f64) -> bool {
        if self.pulse.is_some() {
            return false;
        }
        let interval = 60.0 / bpm.max(1.0);
        self.pulse = Some(Pulse {
            interval,
            next_fire: now + interval,
            boost_until: 0.0,
        });
        true
    }

    pub fn disarm_pulse(&mut self) {
        self.pulse = None;
    }

    pub fn pulse_armed(&self) -> bool {
        self.pulse.is_some()
    }

    pub fn pulse_interval(&self) -> Option<f64> {
        self.pulse.as_ref().map(|p| p.interval)
    }

    /// Ramp the strip to silence and drop the pulse. In-flight smoothing is
    /// left to finish its ramp to zero.
    pub fn quiesce(&mut self, tau: f64) {
        self.gain.set_target(0.0, tau);
        self.pulse = None;
    }

    fn pulse_boost(&mut self, now: f64) -> f64 {
        let Some(pulse) = self.pulse.as_mut() else {
            return 1.0;
        };
        if now >= pulse.next_fire {
            pulse.boost_until = now + PULSE_LEN;
            while pulse.next_fire <= now {
                pulse.next_fire += pulse.interval;
            }
        }
        if now < pulse.boost_until {
            PULSE_BOOST
        } else {
            1.0
        }
    }

    /// Generate one stereo frame.
    pub fn process_frame(&mut self, now: f64) -> [f64; 2] {
        self.osc.set_frequency(self.frequency.next());
        let sample = self.osc.generate();

        self.filter.tune(self.cutoff.next(), self.resonance.next());
        let filtered = self.filter.process(sample);

        let gain = self.gain.next() * self.pulse_boost(now);
        let shaped = self.delay.process(filtered * gain, self.delay_time.next());

        // Equal-power pan.
        let angle = (self.pan.next() + 1.0) * FRAC_PI_4;
        [shaped * angle.cos(), shaped * angle.sin()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 1000.0;

    fn run(strip: &mut ContinuousStrip, from: f64, samples: usize) -> Vec<[f64; 2]> {
        (0..samples)
            .map(|i| strip.process_frame(from + i as f64 / SR))
            .collect()
    }

    #[test]
    fn test_silent_by_default() {
        let mut strip = ContinuousStrip::new(SR);
        for frame in run(&mut strip, 0.0, 200) {
            assert_eq!(frame, [0.0, 0.0]);
        }
    }

    #[test]
    fn test_audible_after_gain_up() {
        let mut strip = ContinuousStrip::new(SR);
        strip.set_frequency_target(220.0, 0.0);
        strip.set_gain_target(0.8, 0.01);

        let frames = run(&mut strip, 0.0, 1000);
        let peak = frames
            .iter()
            .map(|f| f[0].abs().max(f[1].abs()))
            .fold(0.0f64, f64::max);
        assert!(peak > 0.0, "expected audio");
    }

    #[test]
    fn test_pan_hard_left() {
        let mut strip = ContinuousStrip::new(SR);
        strip.set_frequency_target(100.0, 0.0);
        strip.set_gain_target(1.0, 0.0);
        strip.set_pan_target(-1.0, 0.0);

        let frames = run(&mut strip, 0.0, 500);
        let left: f64 = frames.iter().map(|f| f[0].abs()).sum();
        let right: f64 = frames.iter().map(|f| f[1].abs()).sum();
        assert!(left > 0.0);
        assert!(right < left * 1e-6, "right should be silent, got {}", right);
    }

    #[test]
    fn test_pulse_arm_is_idempotent() {
        let mut strip = ContinuousStrip::new(SR);
        assert!(strip.arm_pulse(120.0, 0.0));
        let interval = strip.pulse_interval().unwrap();

        // Second request at a different rate must not change the lock-in.
        assert!(!strip.arm_pulse(60.0, 0.0));
        assert_eq!(strip.pulse_interval().unwrap(), interval);
    }

    #[test]
    fn test_pulse_boosts_gain_periodically() {
        let mut strip = ContinuousStrip::new(SR);
        strip.set_frequency_target(50.0, 0.0);
        strip.set_gain_target(0.5, 0.0);
        strip.arm_pulse(120.0, 0.0); // 0.5s interval

        // Sample amplitude envelope in the boost window after the first fire.
        let frames = run(&mut strip, 0.0, 1200);
        let rms = |range: std::ops::Range<usize>| -> f64 {
            let slice = &frames[range.clone()];
            (slice.iter().map(|f| f[0] * f[0] + f[1] * f[1]).sum::<f64>() / slice.len() as f64)
                .sqrt()
        };
        let before = rms(300..480);
        let during = rms(510..580);
        assert!(during > before * 1.2, "before={} during={}", before, during);
    }

    #[test]
    fn test_quiesce_drops_pulse_and_gain() {
        let mut strip = ContinuousStrip::new(SR);
        strip.set_gain_target(0.7, 0.0);
        strip.arm_pulse(100.0, 0.0);

        strip.quiesce(0.05);
        assert!(!strip.pulse_armed());
        assert_eq!(strip.gain_target(), 0.0);

        // Cooperative ramp-down: silence after a few time constants.
        let frames = run(&mut strip, 0.0, 1000);
        let tail = &frames[900..];
        assert!(tail.iter().all(|f| f[0].abs() < 1e-3));
    }
}
