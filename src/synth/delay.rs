//! Feedback delay line
//!
//! Circular-buffer echo with a variable read tap, used by the rhythm
//! mapping to modulate echo spacing with the data.

/// Maximum delay time in seconds the buffer is sized for.
pub const MAX_DELAY_SECS: f64 = 1.0;

pub struct DelayLine {
    buffer: Vec<f64>,
    write_pos: usize,
    sample_rate: f64,
    feedback: f64,
    mix: f64,
}

impl DelayLine {
    pub fn new(sample_rate: f64) -> Self {
        let size = (MAX_DELAY_SECS * sample_rate).ceil() as usize + 1;
        Self {
            buffer: vec![0.0; size],
            write_pos: 0,
            sample_rate,
            feedback: 0.35,
            mix: 0.0,
        }
    }

    /// Wet/dry mix, 0 = fully dry.
    pub fn set_mix(&mut self, mix: f64) {
        self.mix = mix.clamp(0.0, 1.0);
    }

    pub fn mix(&self) -> f64 {
        self.mix
    }

    pub fn set_feedback(&mut self, feedback: f64) {
        self.feedback = feedback.clamp(0.0, 0.95);
    }

    pub fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.write_pos = 0;
    }

    fn read(&self, delay_samples: usize) -> f64 {
        let size = self.buffer.len();
        let delay = delay_samples.clamp(1, size - 1);
        let read_pos = (self.write_pos + size - delay) % size;
        self.buffer[read_pos]
    }

    /// Process one sample with the tap at `delay_secs` behind the write
    /// head.
    pub fn process(&mut self, input: f64, delay_secs: f64) -> f64 {
        let delay_samples = (delay_secs.clamp(0.0, MAX_DELAY_SECS) * self.sample_rate) as usize;
        let delayed = self.read(delay_samples.max(1));

        self.buffer[self.write_pos] = input + delayed * self.feedback;
        self.write_pos = (self.write_pos + 1) % self.buffer.len();

        input * (1.0 - self.mix) + delayed * self.mix
    }
}
