//! Musical mapping family
//!
//! Discrete note events through the scale quantizer. Each variant has its
//! own re-trigger policy so sensor jitter turns into phrasing instead of
//! machine-gun notes.

use super::strategy::{
    EmittedToken, MappingContext, MappingKind, MappingStrategy, NoteEvent, ParameterUpdate,
    RETRIGGER_GUARD,
};

/// Lead line. Re-triggers when the quantized note changes or the guard
/// interval has passed, whichever comes first.
pub struct MelodyMapping;

impl MappingStrategy for MelodyMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Melody
    }

    fn apply(&self, ctx: &MappingContext, normalized: f64, _previous: f64, now: f64) -> ParameterUpdate {
        let pitch = ctx.quantizer.note_for(normalized, 0);
        let is_new_note = !matches!(ctx.last_token, Some(EmittedToken::Note(p)) if *p == pitch);

        if !is_new_note && ctx.since_last_event(now) < RETRIGGER_GUARD {
            return ParameterUpdate::default();
        }
        ParameterUpdate {
            event: Some(NoteEvent::Attack {
                pitch,
                velocity: 0.3 + normalized * 0.4,
            }),
            ..Default::default()
        }
    }
}

/// Foundation voice two octaves down, on a fixed once-per-second cadence
/// regardless of how the value moves.
pub struct BassMapping;

impl MappingStrategy for BassMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Bass
    }

    fn apply(&self, ctx: &MappingContext, normalized: f64, _previous: f64, now: f64) -> ParameterUpdate {
        if ctx.since_last_event(now) < 1.0 {
            return ParameterUpdate::default();
        }
        ParameterUpdate {
            event: Some(NoteEvent::AttackRelease {
                pitches: vec![ctx.quantizer.note_for(normalized, -2)],
                velocity: 0.4 + normalized * 0.3,
                duration: ctx.beats(1.0),
            }),
            ..Default::default()
        }
    }
}

/// Triad one octave up, every two seconds.
pub struct HarmonyMapping;

impl MappingStrategy for HarmonyMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Harmony
    }

    fn apply(&self, ctx: &MappingContext, normalized: f64, _previous: f64, now: f64) -> ParameterUpdate {
        if ctx.since_last_event(now) < 2.0 {
            return ParameterUpdate::default();
        }
        ParameterUpdate {
            event: Some(NoteEvent::AttackRelease {
                pitches: ctx.quantizer.chord_for(normalized, 1).to_vec(),
                velocity: 0.2 + normalized * 0.3,
                duration: ctx.beats(2.0),
            }),
            ..Default::default()
        }
    }
}

/// Slow-moving atmosphere: the harmony triad in the base register, every
/// four seconds, quiet and a full measure long.
pub struct AmbientMapping;

impl MappingStrategy for AmbientMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Ambient
    }

    fn apply(&self, ctx: &MappingContext, normalized: f64, _previous: f64, now: f64) -> ParameterUpdate {
        if ctx.since_last_event(now) < 4.0 {
            return ParameterUpdate::default();
        }
        ParameterUpdate {
            event: Some(NoteEvent::AttackRelease {
                pitches: ctx.quantizer.chord_for(normalized, 0).to_vec(),
                velocity: 0.1 + normalized * 0.2,
                duration: ctx.beats(4.0),
            }),
            ..Default::default()
        }
    }
}

/// Accent voice: a transient/peak detector, not a continuous line. Fires
/// two octaves up on peaks (n > 0.7) or jumps (|delta| > 0.15).
pub struct BellsMapping;

/// Normalized level above which bells always ring.
const BELLS_PEAK: f64 = 0.7;
/// Normalized jump size that rings regardless of level.
const BELLS_JUMP: f64 = 0.15;

impl MappingStrategy for BellsMapping {
    fn kind(&self) -> MappingKind {
        MappingKind::Bells
    }

    fn apply(&self, ctx: &MappingContext, normalized: f64, previous: f64, now: f64) -> ParameterUpdate {
        let interesting = normalized > BELLS_PEAK || (normalized - previous).abs() > BELLS_JUMP;
        if !interesting || ctx.since_last_event(now) < RETRIGGER_GUARD {
            return ParameterUpdate::default();
        }
        ParameterUpdate {
            event: Some(NoteEvent::AttackRelease {
                pitches: vec![ctx.quantizer.note_for(normalized, 2)],
                velocity: 0.3 + normalized * 0.4,
                duration: ctx.beats(2.0),
            }),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::quantize::{Scale, ScaleQuantizer};

    fn ctx<'a>(
        quantizer: &'a ScaleQuantizer,
        last_event_time: f64,
        last_token: Option<&'a EmittedToken>,
    ) -> MappingContext<'a> {
        MappingContext {
            quantizer,
            tempo_bpm: 120.0,
            channel_volume: 0.7,
            last_event_time,
            last_token,
        }
    }

    #[test]
    fn test_melody_first_value_triggers() {
        let q = ScaleQuantizer::new(Scale::pentatonic());
        let c = ctx(&q, f64::NEG_INFINITY, None);
        let update = MelodyMapping.apply(&c, 0.4, 0.5, 0.0);
        match update.event {
            Some(NoteEvent::Attack { pitch, velocity }) => {
                assert_eq!(pitch, q.note_for(0.4, 0));
                assert!((velocity - (0.3 + 0.4 * 0.4)).abs() < 1e-12);
            }
            other => panic!("expected attack, got {:?}", other),
        }
    }

    #[test]
    fn test_melody_same_note_within_guard_is_silent() {
        let q = ScaleQuantizer::new(Scale::pentatonic());
        let token = EmittedToken::Note(q.note_for(0.5, 0));
        let c = ctx(&q, 10.0, Some(&token));
        // 0.2s after the last trigger, same quantized note.
        assert!(MelodyMapping.apply(&c, 0.5, 0.5, 10.2).event.is_none());
    }

    #[test]
    fn test_melody_same_note_after_guard_retriggers() {
        let q = ScaleQuantizer::new(Scale::pentatonic());
        let token = EmittedToken::Note(q.note_for(0.5, 0));
        let c = ctx(&q, 10.0, Some(&token));
        assert!(MelodyMapping.apply(&c, 0.5, 0.5, 10.6).event.is_some());
    }

    #[test]
    fn test_melody_new_note_ignores_guard() {
        let q = ScaleQuantizer::new(Scale::pentatonic());
        let token = EmittedToken::Note(q.note_for(0.1, 0));
        let c = ctx(&q, 10.0, Some(&token));
        // Different note only 0.1s later still triggers.
        assert!(MelodyMapping.apply(&c, 0.9, 0.1, 10.1).event.is_some());
    }

    #[test]
    fn test_bass_fixed_cadence() {
        let q = ScaleQuantizer::new(Scale::minor());
        let c = ctx(&q, 5.0, None);
        // Value changed a lot, but only 0.5s since the last note.
        assert!(BassMapping.apply(&c, 0.9, 0.1, 5.5).event.is_none());
        // Past the one-second cadence it plays.
        let update = BassMapping.apply(&c, 0.9, 0.1, 6.1);
        match update.event {
            Some(NoteEvent::AttackRelease { pitches, duration, .. }) => {
                assert_eq!(pitches, vec![q.note_for(0.9, -2)]);
                // One beat at 120 BPM.
                assert_eq!(duration, 0.5);
            }
            other => panic!("expected timed note, got {:?}", other),
        }
    }

    #[test]
    fn test_bass_two_octaves_down() {
        let q = ScaleQuantizer::new(Scale::pentatonic());
        let c = ctx(&q, f64::NEG_INFINITY, None);
        let update = BassMapping.apply(&c, 0.3, 0.5, 0.0);
        let Some(NoteEvent::AttackRelease { pitches, .. }) = update.event else {
            panic!("expected event");
        };
        assert_eq!(pitches[0], q.note_for(0.3, 0) - 24);
    }

    #[test]
    fn test_harmony_chord_every_two_seconds() {
        let q = ScaleQuantizer::new(Scale::major());
        let c = ctx(&q, 0.0, None);
        assert!(HarmonyMapping.apply(&c, 0.5, 0.5, 1.9).event.is_none());

        let update = HarmonyMapping.apply(&c, 0.5, 0.5, 2.1);
        let Some(NoteEvent::AttackRelease { pitches, velocity, duration }) = update.event else {
            panic!("expected chord");
        };
        assert_eq!(pitches.len(), 3);
        assert_eq!(pitches, q.chord_for(0.5, 1).to_vec());
        assert!((velocity - 0.35).abs() < 1e-12);
        assert_eq!(duration, 1.0); // two beats at 120 BPM
    }

    #[test]
    fn test_ambient_slower_and_quieter_than_harmony() {
        let q = ScaleQuantizer::new(Scale::major());
        let c = ctx(&q, 0.0, None);
        assert!(AmbientMapping.apply(&c, 0.5, 0.5, 3.9).event.is_none());

        let update = AmbientMapping.apply(&c, 0.5, 0.5, 4.1);
        let Some(NoteEvent::AttackRelease { pitches, velocity, duration }) = update.event else {
            panic!("expected chord");
        };
        // Base register, no octave lift.
        assert_eq!(pitches, q.chord_for(0.5, 0).to_vec());
        assert!((velocity - 0.2).abs() < 1e-12);
        assert_eq!(duration, 2.0); // four beats at 120 BPM
    }

    #[test]
    fn test_bells_fire_on_peak() {
        let q = ScaleQuantizer::new(Scale::pentatonic());
        let c = ctx(&q, f64::NEG_INFINITY, None);
        let update = BellsMapping.apply(&c, 0.8, 0.79, 0.0);
        let Some(NoteEvent::AttackRelease { pitches, .. }) = update.event else {
            panic!("expected bell");
        };
        assert_eq!(pitches[0], q.note_for(0.8, 2));
    }

    #[test]
    fn test_bells_fire_on_jump() {
        let q = ScaleQuantizer::new(Scale::pentatonic());
        let c = ctx(&q, f64::NEG_INFINITY, None);
        // Low level but a big move.
        assert!(BellsMapping.apply(&c, 0.4, 0.1, 0.0).event.is_some());
    }

    #[test]
    fn test_bells_quiet_on_small_drift() {
        let q = ScaleQuantizer::new(Scale::pentatonic());
        let c = ctx(&q, f64::NEG_INFINITY, None);
        assert!(BellsMapping.apply(&c, 0.5, 0.45, 0.0).event.is_none());
    }

    #[test]
    fn test_bells_respect_retrigger_guard() {
        let q = ScaleQuantizer::new(Scale::pentatonic());
        let c = ctx(&q, 20.0, None);
        assert!(BellsMapping.apply(&c, 0.95, 0.1, 20.3).event.is_none());
        assert!(BellsMapping.apply(&c, 0.95, 0.1, 20.6).event.is_some());
    }
}
