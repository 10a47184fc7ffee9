//! Mixer channel
//!
//! One channel per datastream: owns the stream's normalizer, its bulk
//! historical series, the bound mapping, and the synthesis strip the
//! mapping drives. Synthesis resources live exactly as long as the channel;
//! only a mapping change rebuilds them.

use tracing::{debug, warn};

use crate::mapping::{
    EmittedToken, MappingContext, MappingKind, MappingRegistry, NoteEvent, Param,
    ParameterUpdate, ScaleQuantizer, ValueNormalizer,
};
use crate::synth::{ContinuousStrip, InstrumentStrip, DEFAULT_SMOOTHING};

/// Default channel fader.
const CHANNEL_VOLUME_DEFAULT: f64 = 0.7;

/// Snapshot handed to UI collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelInfo {
    pub id: String,
    pub name: String,
    pub mapping: MappingKind,
    pub volume: f64,
    pub is_playing: bool,
    pub current_value: f64,
}

/// The synthesis backend for one channel, chosen by mapping family.
enum Strip {
    Continuous(ContinuousStrip),
    Instrument(InstrumentStrip),
}

impl Strip {
    fn for_mapping(mapping: MappingKind, sample_rate: f64) -> Self {
        match mapping {
            MappingKind::Melody => Self::Instrument(InstrumentStrip::melody(sample_rate)),
            MappingKind::Bass => Self::Instrument(InstrumentStrip::bass(sample_rate)),
            MappingKind::Harmony => Self::Instrument(InstrumentStrip::harmony(sample_rate)),
            MappingKind::Ambient => Self::Instrument(InstrumentStrip::ambient(sample_rate)),
            MappingKind::Bells => Self::Instrument(InstrumentStrip::bells(sample_rate)),
            MappingKind::Pitch
            | MappingKind::Volume
            | MappingKind::Filter
            | MappingKind::Panning
            | MappingKind::Rhythm => Self::Continuous(ContinuousStrip::new(sample_rate)),
        }
    }

    fn quiesce(&mut self) {
        match self {
            Self::Continuous(strip) => strip.quiesce(DEFAULT_SMOOTHING),
            Self::Instrument(strip) => strip.quiesce(DEFAULT_SMOOTHING),
        }
    }

    fn set_gain_target(&mut self, gain: f64, tau: f64) {
        match self {
            Self::Continuous(strip) => strip.set_gain_target(gain, tau),
            Self::Instrument(strip) => strip.set_gain_target(gain, tau),
        }
    }

    fn process_frame(&mut self, now: f64) -> [f64; 2] {
        match self {
            Self::Continuous(strip) => strip.process_frame(now),
            Self::Instrument(strip) => strip.process_frame(now),
        }
    }
}

pub struct Channel {
    id: String,
    name: String,
    mapping: MappingKind,
    volume: f64,
    current_value: f64,
    last_normalized: f64,
    normalizer: ValueNormalizer,
    /// Bulk-loaded historical series for replay; distinct from the
    /// normalizer's rolling window.
    history: Vec<f64>,
    is_playing: bool,
    last_event_time: f64,
    last_token: Option<EmittedToken>,
    strip: Strip,
    sample_rate: f64,
}

impl Channel {
    pub fn new(id: impl Into<String>, name: impl Into<String>, mapping: MappingKind, sample_rate: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mapping,
            volume: CHANNEL_VOLUME_DEFAULT,
            current_value: 0.0,
            last_normalized: 0.5,
            normalizer: ValueNormalizer::new(),
            history: Vec::new(),
            is_playing: false,
            last_event_time: f64::NEG_INFINITY,
            last_token: None,
            strip: Strip::for_mapping(mapping, sample_rate),
            sample_rate,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mapping(&self) -> MappingKind {
        self.mapping
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn current_value(&self) -> f64 {
        self.current_value
    }

    pub fn last_token(&self) -> Option<&EmittedToken> {
        self.last_token.as_ref()
    }

    pub fn info(&self) -> ChannelInfo {
        ChannelInfo {
            id: self.id.clone(),
            name: self.name.clone(),
            mapping: self.mapping,
            volume: self.volume,
            is_playing: self.is_playing,
            current_value: self.current_value,
        }
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_at(&self, index: usize) -> Option<f64> {
        self.history.get(index).copied()
    }

    pub fn window_len(&self) -> usize {
        self.normalizer.len()
    }

    pub fn range(&self) -> Option<(f64, f64)> {
        self.normalizer.range()
    }

    pub fn pulse_armed(&self) -> bool {
        matches!(&self.strip, Strip::Continuous(strip) if strip.pulse_armed())
    }

    pub fn pulse_interval(&self) -> Option<f64> {
        match &self.strip {
            Strip::Continuous(strip) => strip.pulse_interval(),
            Strip::Instrument(_) => None,
        }
    }

    /// Pin the normalizer's range directly (e.g. from a known sensor span).
    pub fn set_range(&mut self, min: f64, max: f64) {
        self.normalizer.set_range(min, max);
    }

    /// Install the bulk historical series and seed auto-ranging from its
    /// extremes.
    pub fn load_history(&mut self, values: &[f64]) {
        self.history = values.to_vec();
        let mut iter = values.iter().copied();
        if let Some(first) = iter.next() {
            let (min, max) = iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));
            self.normalizer.set_range(min, max);
        }
    }

    /// Feed one reading. Always recorded; audible only while playing.
    pub fn update_value(
        &mut self,
        value: f64,
        now: f64,
        registry: &MappingRegistry,
        quantizer: &ScaleQuantizer,
        tempo_bpm: f64,
    ) {
        self.normalizer.observe(value);
        self.current_value = value;

        let normalized = self.normalizer.normalize(value);
        let previous = self.last_normalized;
        self.last_normalized = normalized;

        if self.is_playing {
            self.apply_mapping(normalized, previous, now, registry, quantizer, tempo_bpm);
        }
    }

    /// Re-run the mapping over the stored value without re-observing it.
    fn reapply_current(
        &mut self,
        now: f64,
        registry: &MappingRegistry,
        quantizer: &ScaleQuantizer,
        tempo_bpm: f64,
    ) {
        let normalized = self.normalizer.normalize(self.current_value);
        let previous = self.last_normalized;
        self.last_normalized = normalized;
        self.apply_mapping(normalized, previous, now, registry, quantizer, tempo_bpm);
    }

    fn apply_mapping(
        &mut self,
        normalized: f64,
        previous: f64,
        now: f64,
        registry: &MappingRegistry,
        quantizer: &ScaleQuantizer,
        tempo_bpm: f64,
    ) {
        let Some(strategy) = registry.get(self.mapping) else {
            warn!(channel = %self.id, mapping = self.mapping.name(), "no strategy registered");
            return;
        };
        let ctx = MappingContext {
            quantizer,
            tempo_bpm,
            channel_volume: self.volume,
            last_event_time: self.last_event_time,
            last_token: self.last_token.as_ref(),
        };
        let update = strategy.apply(&ctx, normalized, previous, now);
        self.commit(update, now, quantizer);
    }

    fn commit(&mut self, update: ParameterUpdate, now: f64, quantizer: &ScaleQuantizer) {
        for change in &update.changes {
            self.apply_change(change.param, change.value, change.smoothing);
        }
        if let Some(event) = update.event {
            self.play_event(&event, now, quantizer);
            self.last_token = Some(event.token());
            self.last_event_time = now;
        }
        if let Some(pulse) = update.pulse {
            if let Strip::Continuous(strip) = &mut self.strip {
                strip.arm_pulse(pulse.bpm, now);
            }
        }
    }

    fn apply_change(&mut self, param: Param, value: f64, tau: f64) {
        match &mut self.strip {
            Strip::Continuous(strip) => match param {
                Param::Frequency => strip.set_frequency_target(value, tau),
                Param::Gain => strip.set_gain_target(value, tau),
                Param::FilterCutoff => strip.set_cutoff_target(value, tau),
                Param::FilterQ => strip.set_resonance_target(value, tau),
                Param::Pan => strip.set_pan_target(value, tau),
                Param::DelayTime => strip.set_delay_time_target(value, tau),
            },
            Strip::Instrument(strip) => match param {
                Param::Gain => strip.set_gain_target(value, tau),
                // Instrument tone is fixed by its profile.
                other => debug!(channel = %self.id, ?other, "parameter ignored by instrument strip"),
            },
        }
    }

    fn play_event(&mut self, event: &NoteEvent, now: f64, quantizer: &ScaleQuantizer) {
        let Strip::Instrument(strip) = &mut self.strip else {
            debug!(channel = %self.id, "note event on continuous strip ignored");
            return;
        };
        match event {
            NoteEvent::Attack { pitch, velocity } => {
                strip.play_attack(quantizer.frequency(*pitch), *velocity);
            }
            NoteEvent::AttackRelease {
                pitches,
                velocity,
                duration,
            } => {
                let freqs: Vec<f64> = pitches.iter().map(|&p| quantizer.frequency(p)).collect();
                strip.play_timed(&freqs, *velocity, *duration, now);
            }
        }
    }

    /// Swap the mapping: tear down the old strip, build the one the new
    /// mapping needs, and immediately re-apply the current value so the
    /// channel does not go silent across the switch.
    pub fn set_mapping(
        &mut self,
        mapping: MappingKind,
        now: f64,
        registry: &MappingRegistry,
        quantizer: &ScaleQuantizer,
        tempo_bpm: f64,
    ) {
        self.mapping = mapping;
        self.strip = Strip::for_mapping(mapping, self.sample_rate);
        self.last_token = None;
        self.last_event_time = f64::NEG_INFINITY;

        if self.is_playing {
            self.open_fader();
            self.reapply_current(now, registry, quantizer, tempo_bpm);
        }
    }

    fn open_fader(&mut self) {
        // The volume mapping owns the gain itself; everything else sits at
        // the channel fader.
        if self.mapping != MappingKind::Volume {
            self.strip.set_gain_target(self.volume, DEFAULT_SMOOTHING);
        }
    }

    pub fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
        if self.is_playing && self.mapping != MappingKind::Volume {
            self.strip.set_gain_target(self.volume, DEFAULT_SMOOTHING);
        }
    }

    /// Begin sounding. Idempotent; re-applies the current value so the
    /// channel speaks right away.
    pub fn start(
        &mut self,
        now: f64,
        registry: &MappingRegistry,
        quantizer: &ScaleQuantizer,
        tempo_bpm: f64,
    ) {
        if self.is_playing {
            return;
        }
        self.is_playing = true;
        self.open_fader();
        self.reapply_current(now, registry, quantizer, tempo_bpm);
    }

    /// Go silent. Idempotent. Releases sounding notes, drops the rhythm
    /// pulse, and lets the gain ramp finish its run to zero.
    pub fn stop(&mut self) {
        if !self.is_playing {
            return;
        }
        self.is_playing = false;
        self.strip.quiesce();
    }

    /// Generate one stereo frame.
    pub fn process_frame(&mut self, now: f64) -> [f64; 2] {
        self.strip.process_frame(now)
    }
}

impl Drop for Channel {
    fn drop(&mut self) {
        // Safe whether or not the channel ever started.
        self.stop();
    }
}
