//! Direct mapping family
//!
//! Continuous parameter transforms: the normalized value drives one synthesis
//! parameter linearly, bypassing the scale quantizer entirely.

use super::strategy::{
    MappingContext, MappingKind, MappingStrategy, Param, ParamChange, ParameterUpdate,
    PulseRequest,
};

/// Frequency sweep 200-800 Hz.
pub struct PitchMapping;

impl MappingStrategy for PitchMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Pitch
    }

    fn apply(&self, _ctx: &MappingContext, normalized: f64, _previous: f64, _now: f64) -> ParameterUpdate {
        ParameterUpdate {
            changes: vec![ParamChange::new(Param::Frequency, 200.0 + normalized * 600.0)],
            ..Default::default()
        }
    }
}

/// Gain follows the value, floored so the channel never fully vanishes.
pub struct VolumeMapping;

impl MappingStrategy for VolumeMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Volume
    }

    fn apply(&self, ctx: &MappingContext, normalized: f64, _previous: f64, _now: f64) -> ParameterUpdate {
        ParameterUpdate {
            changes: vec![ParamChange::new(
                Param::Gain,
                normalized.max(0.1) * ctx.channel_volume,
            )],
            ..Default::default()
        }
    }
}

/// Low-pass cutoff 200-2200 Hz with resonance rising alongside.
pub struct FilterMapping;

impl MappingStrategy for FilterMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Filter
    }

    fn apply(&self, _ctx: &MappingContext, normalized: f64, _previous: f64, _now: f64) -> ParameterUpdate {
        ParameterUpdate {
            changes: vec![
                ParamChange::new(Param::FilterCutoff, 200.0 + normalized * 2000.0),
                ParamChange::new(Param::FilterQ, 1.0 + normalized * 10.0),
            ],
            ..Default::default()
        }
    }
}

/// Stereo position across the full field.
pub struct PanningMapping;

impl MappingStrategy for PanningMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Panning
    }

    fn apply(&self, _ctx: &MappingContext, normalized: f64, _previous: f64, _now: f64) -> ParameterUpdate {
        ParameterUpdate {
            changes: vec![ParamChange::new(Param::Pan, (normalized - 0.5) * 2.0)],
            ..Default::default()
        }
    }
}

/// Pulse tempo 60-120 BPM plus an echo tap spaced 0.1-0.5 s.
///
/// The pulse request is honored only while no pulse is armed; the rate
/// locks in on the first sound and stays there until the channel stops.
pub struct RhythmMapping;

impl MappingStrategy for RhythmMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Rhythm
    }

    fn apply(&self, _ctx: &MappingContext, normalized: f64, _previous: f64, _now: f64) -> ParameterUpdate {
        ParameterUpdate {
            changes: vec![ParamChange::new(Param::DelayTime, 0.1 + normalized * 0.4)],
            pulse: Some(PulseRequest {
                bpm: 60.0 + normalized * 60.0,
            }),
            ..Default::default()
        }
    }
}
