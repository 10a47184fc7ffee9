//! Mapping strategy contract
//!
//! A mapping converts one normalized reading into a set of synthesis
//! parameter targets and, for the musical family, discrete note events.
//! Strategies themselves are stateless; per-channel trigger state travels
//! in the [`MappingContext`] and updated state comes back with the
//! [`ParameterUpdate`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::quantize::ScaleQuantizer;
use crate::synth::DEFAULT_SMOOTHING;

/// Minimum gap between discrete re-triggers on one channel (seconds).
pub const RETRIGGER_GUARD: f64 = 0.5;

/// The fixed set of mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MappingKind {
    // Musical family: quantized note events
    Melody,
    Bass,
    Harmony,
    Ambient,
    Bells,
    // Direct family: continuous parameter maps
    Pitch,
    Volume,
    Filter,
    Panning,
    Rhythm,
}

/// The two mutually exclusive mapping families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingFamily {
    /// Discrete events through the scale quantizer.
    Musical,
    /// Linear parameter modulation, no quantization.
    Direct,
}

impl MappingKind {
    pub fn family(self) -> MappingFamily {
        match self {
            Self::Melody | Self::Bass | Self::Harmony | Self::Ambient | Self::Bells => {
                MappingFamily::Musical
            }
            Self::Pitch | Self::Volume | Self::Filter | Self::Panning | Self::Rhythm => {
                MappingFamily::Direct
            }
        }
    }

    pub fn all() -> &'static [MappingKind] {
        &[
            Self::Melody,
            Self::Bass,
            Self::Harmony,
            Self::Ambient,
            Self::Bells,
            Self::Pitch,
            Self::Volume,
            Self::Filter,
            Self::Panning,
            Self::Rhythm,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Melody => "melody",
            Self::Bass => "bass",
            Self::Harmony => "harmony",
            Self::Ambient => "ambient",
            Self::Bells => "bells",
            Self::Pitch => "pitch",
            Self::Volume => "volume",
            Self::Filter => "filter",
            Self::Panning => "panning",
            Self::Rhythm => "rhythm",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::all().iter().copied().find(|k| k.name() == name)
    }
}

/// Addressable synthesis parameters on a channel strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Frequency,
    Gain,
    FilterCutoff,
    FilterQ,
    Pan,
    DelayTime,
}

/// One smoothed parameter target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamChange {
    pub param: Param,
    pub value: f64,
    /// Smoothing time constant in seconds.
    pub smoothing: f64,
}

impl ParamChange {
    pub fn new(param: Param, value: f64) -> Self {
        Self {
            param,
            value,
            smoothing: DEFAULT_SMOOTHING,
        }
    }
}

/// A discrete musical event.
#[derive(Debug, Clone, PartialEq)]
pub enum NoteEvent {
    /// Sustain a new note, releasing whatever was sounding.
    Attack { pitch: i32, velocity: f64 },
    /// Play one or more pitches for a fixed duration (seconds).
    AttackRelease {
        pitches: Vec<i32>,
        velocity: f64,
        duration: f64,
    },
}

impl NoteEvent {
    /// The token remembered on the channel for re-trigger hysteresis.
    pub fn token(&self) -> EmittedToken {
        match self {
            Self::Attack { pitch, .. } => EmittedToken::Note(*pitch),
            Self::AttackRelease { pitches, .. } => {
                if pitches.len() == 1 {
                    EmittedToken::Note(pitches[0])
                } else {
                    EmittedToken::Chord(pitches.clone())
                }
            }
        }
    }
}

/// What a channel last emitted.
#[derive(Debug, Clone, PartialEq)]
pub enum EmittedToken {
    Note(i32),
    Chord(Vec<i32>),
}

/// Request to arm the recurring rhythm pulse.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseRequest {
    pub bpm: f64,
}

/// The output of one mapping application.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParameterUpdate {
    pub changes: Vec<ParamChange>,
    pub event: Option<NoteEvent>,
    pub pulse: Option<PulseRequest>,
}

impl ParameterUpdate {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.event.is_none() && self.pulse.is_none()
    }
}

/// Channel-side state a strategy needs to decide what to emit.
pub struct MappingContext<'a> {
    pub quantizer: &'a ScaleQuantizer,
    /// Global transport tempo in BPM.
    pub tempo_bpm: f64,
    /// The channel's own volume fader, [0, 1].
    pub channel_volume: f64,
    /// Transport time of the channel's last discrete event.
    pub last_event_time: f64,
    pub last_token: Option<&'a EmittedToken>,
}

impl MappingContext<'_> {
    /// Seconds per `beats` beats at the current tempo.
    pub fn beats(&self, beats: f64) -> f64 {
        beats * 60.0 / self.tempo_bpm.max(1.0)
    }

    /// Seconds since the last discrete event on this channel.
    pub fn since_last_event(&self, now: f64) -> f64 {
        now - self.last_event_time
    }
}

/// A value-to-sound transform.
pub trait MappingStrategy: Send + Sync {
    fn kind(&self) -> MappingKind;

    /// Compute the update for one reading. `normalized` and `previous` are
    /// the current and prior normalized values; `now` is transport time in
    /// seconds.
    fn apply(
        &self,
        ctx: &MappingContext,
        normalized: f64,
        previous: f64,
        now: f64,
    ) -> ParameterUpdate;
}

/// Lookup table of one registered strategy per mapping kind. Adding a
/// mapping means registering it here, not growing a dispatch switch.
pub struct MappingRegistry {
    table: HashMap<MappingKind, Box<dyn MappingStrategy>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// All ten built-in mappings.
    pub fn with_defaults() -> Self {
        use super::direct::{FilterMapping, PanningMapping, PitchMapping, RhythmMapping, VolumeMapping};
        use super::musical::{AmbientMapping, BassMapping, BellsMapping, HarmonyMapping, MelodyMapping};

        let mut registry = Self::new();
        registry.register(Box::new(MelodyMapping));
        registry.register(Box::new(BassMapping));
        registry.register(Box::new(HarmonyMapping));
        registry.register(Box::new(AmbientMapping));
        registry.register(Box::new(BellsMapping));
        registry.register(Box::new(PitchMapping));
        registry.register(Box::new(VolumeMapping));
        registry.register(Box::new(FilterMapping));
        registry.register(Box::new(PanningMapping));
        registry.register(Box::new(RhythmMapping));
        registry
    }

    pub fn register(&mut self, strategy: Box<dyn MappingStrategy>) {
        self.table.insert(strategy.kind(), strategy);
    }

    pub fn get(&self, kind: MappingKind) -> Option<&dyn MappingStrategy> {
        self.table.get(&kind).map(Box::as_ref)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Default for MappingRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_families_are_disjoint() {
        let musical = [
            MappingKind::Melody,
            MappingKind::Bass,
            MappingKind::Harmony,
            MappingKind::Ambient,
            MappingKind::Bells,
        ];
        let direct = [
            MappingKind::Pitch,
            MappingKind::Volume,
            MappingKind::Filter,
            MappingKind::Panning,
            MappingKind::Rhythm,
        ];
        for kind in musical {
            assert_eq!(kind.family(), MappingFamily::Musical);
        }
        for kind in direct {
            assert_eq!(kind.family(), MappingFamily::Direct);
        }
    }

    #[test]
    fn test_name_round_trip() {
        for &kind in MappingKind::all() {
            assert_eq!(MappingKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(MappingKind::from_name("theremin"), None);
    }

    #[test]
    fn test_registry_covers_every_kind() {
        let registry = MappingRegistry::with_defaults();
        assert_eq!(registry.len(), MappingKind::all().len());
        for &kind in MappingKind::all() {
            let strategy = registry.get(kind).expect("unregistered mapping");
            assert_eq!(strategy.kind(), kind);
        }
    }

    #[test]
    fn test_event_tokens() {
        let attack = NoteEvent::Attack {
            pitch: 60,
            velocity: 0.5,
        };
        assert_eq!(attack.token(), EmittedToken::Note(60));

        let chord = NoteEvent::AttackRelease {
            pitches: vec![60, 64, 67],
            velocity: 0.4,
            duration: 1.0,
        };
        assert_eq!(chord.token(), EmittedToken::Chord(vec![60, 64, 67]));

        let single = NoteEvent::AttackRelease {
            pitches: vec![36],
            velocity: 0.4,
            duration: 1.0,
        };
        assert_eq!(single.token(), EmittedToken::Note(36));
    }

    #[test]
    fn test_context_beat_math() {
        let quantizer = ScaleQuantizer::default();
        let ctx = MappingContext {
            quantizer: &quantizer,
            tempo_bpm: 120.0,
            channel_volume: 1.0,
            last_event_time: 10.0,
            last_token: None,
        };
        assert_eq!(ctx.beats(1.0), 0.5);
        assert_eq!(ctx.beats(4.0), 2.0);
        assert_eq!(ctx.since_last_event(10.75), 0.75);
    }
}
