//! Value-to-sound mapping system
//!
//! Normalizes raw readings against a rolling window, quantizes to musical
//! scales, and converts normalized positions into synthesis parameter
//! updates via per-mapping strategies.

mod direct;
mod musical;
mod normalize;
mod quantize;
mod strategy;

pub use direct::{FilterMapping, PanningMapping, PitchMapping, RhythmMapping, VolumeMapping};
pub use musical::{AmbientMapping, BassMapping, BellsMapping, HarmonyMapping, MelodyMapping};
pub use normalize::ValueNormalizer;
pub use quantize::{Scale, ScaleQuantizer, BASE_FREQUENCY};
pub use strategy::{
    EmittedToken, MappingContext, MappingFamily, MappingKind, MappingRegistry, MappingStrategy,
    NoteEvent, Param, ParamChange, ParameterUpdate, PulseRequest, RETRIGGER_GUARD,
};
