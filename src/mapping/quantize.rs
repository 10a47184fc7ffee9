//! Musical scale quantization
//!
//! Snaps a normalized [0, 1] position to a pitch inside a named scale.
//! Pitches are semitone counts in a MIDI-like numbering where 0 = C0;
//! frequency conversion is equal temperament referenced to A3 = 220 Hz
//! (pitch 57).

/// Reference frequency for pitch 57 (A3).
pub const BASE_FREQUENCY: f64 = 220.0;
const BASE_PITCH: f64 = 57.0;

/// A named scale: ordered semitone offsets from the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scale {
    name: String,
    degrees: Vec<i32>,
}

impl Scale {
    pub fn new(name: &str, degrees: Vec<i32>) -> Self {
        Self {
            name: name.to_string(),
            degrees,
        }
    }

    pub fn major() -> Self {
        Self::new("major", vec![0, 2, 4, 5, 7, 9, 11])
    }

    pub fn minor() -> Self {
        Self::new("minor", vec![0, 2, 3, 5, 7, 8, 10])
    }

    pub fn pentatonic() -> Self {
        Self::new("pentatonic", vec![0, 2, 4, 7, 9])
    }

    pub fn blues() -> Self {
        Self::new("blues", vec![0, 3, 5, 6, 7, 10])
    }

    pub fn dorian() -> Self {
        Self::new("dorian", vec![0, 2, 3, 5, 7, 9, 10])
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "major" => Some(Self::major()),
            "minor" | "natural_minor" => Some(Self::minor()),
            "pentatonic" => Some(Self::pentatonic()),
            "blues" => Some(Self::blues()),
            "dorian" => Some(Self::dorian()),
            _ => None,
        }
    }

    /// Names accepted by [`Scale::from_name`].
    pub fn available() -> &'static [&'static str] {
        &["major", "minor", "pentatonic", "blues", "dorian"]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn degrees(&self) -> &[i32] {
        &self.degrees
    }
}

/// Maps normalized positions to in-scale pitches. The active scale is
/// swappable at runtime and only affects subsequent lookups.
pub struct ScaleQuantizer {
    scale: Scale,
}

impl ScaleQuantizer {
    pub fn new(scale: Scale) -> Self {
        Self { scale }
    }

    pub fn set_scale(&mut self, scale: Scale) {
        self.scale = scale;
    }

    pub fn scale(&self) -> &Scale {
        &self.scale
    }

    /// Pitch for a normalized position. Low positions pick low scale
    /// degrees; the upper half of the range also shifts up an octave.
    pub fn note_for(&self, normalized: f64, octave_offset: i32) -> i32 {
        let n = normalized.clamp(0.0, 1.0);
        let degrees = self.scale.degrees();
        let index = ((n * degrees.len() as f64).floor() as usize).min(degrees.len() - 1);
        let octave = 4 + octave_offset + (n * 2.0).floor() as i32;
        degrees[index] + octave * 12
    }

    /// Triad rooted at the degree index for `normalized`: root, +2 degrees,
    /// and +4 degrees (wrapping to +1 when the scale runs out).
    pub fn chord_for(&self, normalized: f64, octave_offset: i32) -> [i32; 3] {
        let n = normalized.clamp(0.0, 1.0);
        let degrees = self.scale.degrees();
        let len = degrees.len();
        let base = ((n * (len - 3) as f64).floor() as usize).min(len - 3);
        let octave = (4 + octave_offset) * 12;

        let third = degrees[base + 2];
        let fifth = if base + 4 < len {
            degrees[base + 4]
        } else {
            degrees[base + 1]
        };
        [degrees[base] + octave, third + octave, fifth + octave]
    }

    /// Equal-temperament frequency for a pitch.
    pub fn frequency(&self, pitch: i32) -> f64 {
        BASE_FREQUENCY * 2.0_f64.powf((pitch as f64 - BASE_PITCH) / 12.0)
    }
}

impl Default for ScaleQuantizer {
    fn default() -> Self {
        Self::new(Scale::pentatonic())
    }
}
