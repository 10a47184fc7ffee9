//! Instrument channel strip
//!
//! Synthesis graph for the musical mapping family: one to three enveloped
//! note voices with a per-mapping tone profile, summed through an optional
//! shaping filter into a smoothed output gain.

use std::f64::consts::FRAC_PI_4;

use super::envelope::Envelope;
use super::filter::{Filter, FilterMode};
use super::oscillator::{Oscillator, Waveform};
use super::param::SmoothedParam;

/// ADSR settings for one instrument profile.
#[derive(Debug, Clone, Copy)]
struct Adsr {
    attack: f64,
    decay: f64,
    sustain: f64,
    release: f64,
}

/// One playable note: oscillator(s), envelope, velocity and an optional
/// scheduled release timestamp for fixed-duration notes.
struct NoteVoice {
    osc: Oscillator,
    detuned: Option<Oscillator>,
    detune_ratio: f64,
    env: Envelope,
    velocity: f64,
    release_at: Option<f64>,
}

impl NoteVoice {
    fn new(waveform: Waveform, adsr: Adsr, detune_ratio: f64, sample_rate: f64) -> Self {
        Self {
            osc: Oscillator::new(waveform, 220.0, sample_rate),
            detuned: (detune_ratio != 1.0)
                .then(|| Oscillator::new(waveform, 220.0 * detune_ratio, sample_rate)),
            detune_ratio,
            env: Envelope::with_adsr(sample_rate, adsr.attack, adsr.decay, adsr.sustain, adsr.release),
            velocity: 0.0,
            release_at: None,
        }
    }

    fn note_on(&mut self, hz: f64, velocity: f64) {
        self.osc.set_frequency(hz);
        if let Some(detuned) = self.detuned.as_mut() {
            detuned.set_frequency(hz * self.detune_ratio);
        }
        self.velocity = velocity.clamp(0.0, 1.0);
        self.release_at = None;
        self.env.trigger();
    }

    fn note_on_until(&mut self, hz: f64, velocity: f64, release_at: f64) {
        self.note_on(hz, velocity);
        self.release_at = Some(release_at);
    }

    fn note_off(&mut self) {
        self.release_at = None;
        self.env.release();
    }

    fn is_sounding(&self) -> bool {
        !self.env.is_idle()
    }

    fn process(&mut self, now: f64) -> f64 {
        if let Some(at) = self.release_at {
            if now >= at {
                self.note_off();
            }
        }
        if self.env.is_idle() {
            return 0.0;
        }
        let mut sample = self.osc.generate();
        if let Some(detuned) = self.detuned.as_mut() {
            sample = (sample + detuned.generate()) * 0.5;
        }
        sample * self.env.process() * self.velocity
    }
}

pub struct InstrumentStrip {
    voices: Vec<NoteVoice>,
    filter: Option<Filter>,
    gain: SmoothedParam,
}

impl InstrumentStrip {
    fn build(
        waveform: Waveform,
        adsr: Adsr,
        voice_count: usize,
        detune_ratio: f64,
        filter: Option<Filter>,
        sample_rate: f64,
    ) -> Self {
        Self {
            voices: (0..voice_count)
                .map(|_| NoteVoice::new(waveform, adsr, detune_ratio, sample_rate))
                .collect(),
            filter,
            gain: SmoothedParam::new(0.0, sample_rate),
        }
    }

    /// Lead line: clear triangle with a bright high-pass.
    pub fn melody(sample_rate: f64) -> Self {
        Self::build(
            Waveform::Triangle,
            Adsr { attack: 0.1, decay: 0.3, sustain: 0.6, release: 0.8 },
            1,
            1.0,
            Some(Filter::new(FilterMode::HighPass, 3000.0, sample_rate)),
            sample_rate,
        )
    }

    /// Deep foundation: square wave under a closed low-pass.
    pub fn bass(sample_rate: f64) -> Self {
        Self::build(
            Waveform::Square,
            Adsr { attack: 0.02, decay: 0.1, sustain: 0.9, release: 0.4 },
            1,
            1.0,
            Some(Filter::new(FilterMode::LowPass, 400.0, sample_rate)),
            sample_rate,
        )
    }

    /// Chordal accompaniment: three saw voices, softened.
    pub fn harmony(sample_rate: f64) -> Self {
        Self::build(
            Waveform::Saw,
            Adsr { attack: 0.2, decay: 0.4, sustain: 0.7, release: 1.0 },
            3,
            1.0,
            Some(Filter::new(FilterMode::LowPass, 1500.0, sample_rate)),
            sample_rate,
        )
    }

    /// Atmospheric pad: slow sine triads.
    pub fn ambient(sample_rate: f64) -> Self {
        Self::build(
            Waveform::Sine,
            Adsr { attack: 2.0, decay: 1.0, sustain: 0.8, release: 3.0 },
            3,
            1.0,
            None,
            sample_rate,
        )
    }

    /// Accent voice: detuned pair with a fast metallic decay.
    pub fn bells(sample_rate: f64) -> Self {
        Self::build(
            Waveform::Triangle,
            Adsr { attack: 0.001, decay: 1.4, sustain: 0.0, release: 0.2 },
            1,
            1.007,
            Some(Filter::new(FilterMode::HighPass, 2000.0, sample_rate)),
            sample_rate,
        )
    }

    /// Sustained attack on the primary voice; any previous note is released
    /// first so the envelope restarts from its current level.
    pub fn play_attack(&mut self, hz: f64, velocity: f64) {
        self.voices[0].note_on(hz, velocity);
    }

    pub fn play_release(&mut self) {
        for voice in &mut self.voices {
            voice.note_off();
        }
    }

    /// Fixed-duration note or chord. Each frequency takes one voice; extra
    /// frequencies beyond the voice count are dropped rather than stealing.
    pub fn play_timed(&mut self, freqs: &[f64], velocity: f64, duration: f64, now: f64) {
        for (voice, &hz) in self.voices.iter_mut().zip(freqs) {
            voice.note_on_until(hz, velocity, now + duration);
        }
    }

    pub fn set_gain_target(&mut self, gain: f64, tau: f64) {
        self.gain.set_target(gain.clamp(0.0, 1.0), tau);
    }

    pub fn gain_target(&self) -> f64 {
        self.gain.target()
    }

    pub fn any_sounding(&self) -> bool {
        self.voices.iter().any(NoteVoice::is_sounding)
    }

    /// Release everything and ramp the output to silence.
    pub fn quiesce(&mut self, tau: f64) {
        self.play_release();
        self.gain.set_target(0.0, tau);
    }

    /// Generate one stereo frame (instrument strips sit center-stage).
    pub fn process_frame(&mut self, now: f64) -> [f64; 2] {
        let mut sum = 0.0;
        for voice in &mut self.voices {
            sum += voice.process(now);
        }
        if let Some(filter) = self.filter.as_mut() {
            sum = filter.process(sum);
        }
        let center = sum * self.gain.next() * FRAC_PI_4.cos();
        [center, center]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f64 = 1000.0;

    fn peak(strip: &mut InstrumentStrip, from: f64, samples: usize) -> f64 {
        (0..samples)
            .map(|i| strip.process_frame(from + i as f64 / SR)[0].abs())
            .fold(0.0f64, f64::max)
    }

    #[test]
    fn test_silent_until_note_on() {
        let mut strip = InstrumentStrip::melody(SR);
        strip.set_gain_target(1.0, 0.0);
        assert_eq!(peak(&mut strip, 0.0, 300), 0.0);
    }

    #[test]
    fn test_attack_produces_audio() {
        let mut strip = InstrumentStrip::melody(SR);
        strip.set_gain_target(1.0, 0.0);
        strip.play_attack(5000.0, 0.7);
        assert!(peak(&mut strip, 0.0, 1000) > 0.0);
        assert!(strip.any_sounding());
    }

    #[test]
    fn test_timed_note_releases_itself() {
        let mut strip = InstrumentStrip::bass(SR);
        strip.set_gain_target(1.0, 0.0);
        strip.play_timed(&[110.0], 0.6, 0.2, 0.0);
        assert!(strip.any_sounding());

        // Run well past the scheduled release plus the release tail.
        peak(&mut strip, 0.0, 1500);
        assert!(!strip.any_sounding());
    }

    #[test]
    fn test_chord_uses_three_voices() {
        let mut strip = InstrumentStrip::harmony(SR);
        strip.set_gain_target(1.0, 0.0);
        strip.play_timed(&[220.0, 277.0, 330.0], 0.5, 1.0, 0.0);

        let sounding = strip.voices.iter().filter(|v| v.is_sounding()).count();
        assert_eq!(sounding, 3);
    }

    #[test]
    fn test_extra_chord_tones_dropped() {
        let mut strip = InstrumentStrip::melody(SR); // one voice
        strip.play_timed(&[220.0, 330.0], 0.5, 1.0, 0.0);
        let sounding = strip.voices.iter().filter(|v| v.is_sounding()).count();
        assert_eq!(sounding, 1);
    }

    #[test]
    fn test_bells_decay_to_idle_without_release() {
        let mut strip = InstrumentStrip::bells(SR);
        strip.set_gain_target(1.0, 0.0);
        strip.play_attack(2000.0, 0.8);

        // Zero sustain: the voice dies on its own after the decay.
        peak(&mut strip, 0.0, 2000);
        assert!(!strip.any_sounding());
    }

    #[test]
    fn test_quiesce_releases_and_silences() {
        let mut strip = InstrumentStrip::ambient(SR);
        strip.set_gain_target(0.8, 0.0);
        strip.play_timed(&[220.0, 262.0, 330.0], 0.5, 10.0, 0.0);

        strip.quiesce(0.05);
        assert_eq!(strip.gain_target(), 0.0);

        // Voices enter release; with a 3 s release they may still sound, but
        // the gain ramp silences the output.
        let mut last = f64::MAX;
        for i in 0..800 {
            last = strip.process_frame(i as f64 / SR)[0].abs();
        }
        assert!(last < 1e-3, "still audible: {}", last);
    }
}
