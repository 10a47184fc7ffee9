//! Biquad filter (low-pass / high-pass with resonance)

use std::f64::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    LowPass,
    HighPass,
}

#[derive(Debug, Clone, Copy, Default)]
struct Coefficients {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

/// RBJ biquad, Direct Form II transposed.
pub struct Filter {
    mode: FilterMode,
    sample_rate: f64,
    cutoff: f64,
    q: f64,
    coeffs: Coefficients,
    z1: f64,
    z2: f64,
}

impl Filter {
    pub fn new(mode: FilterMode, cutoff: f64, sample_rate: f64) -> Self {
        let mut filter = Self {
            mode,
            sample_rate,
            cutoff: cutoff.clamp(20.0, sample_rate * 0.45),
            q: 1.0,
            coeffs: Coefficients::default(),
            z1: 0.0,
            z2: 0.0,
        };
        filter.update_coefficients();
        filter
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    pub fn q(&self) -> f64 {
        self.q
    }

    /// Retune the filter. Coefficients are only recomputed when a parameter
    /// actually moved, so this is safe to call per sample.
    pub fn tune(&mut self, cutoff: f64, q: f64) {
        let cutoff = cutoff.clamp(20.0, self.sample_rate * 0.45);
        let q = q.clamp(0.1, 20.0);
        if (cutoff - self.cutoff).abs() < 1e-3 && (q - self.q).abs() < 1e-4 {
            return;
        }
        self.cutoff = cutoff;
        self.q = q;
        self.update_coefficients();
    }

    pub fn reset(&mut self) {
        self.z1 = 0.0;
        self.z2 = 0.0;
    }

    fn update_coefficients(&mut self) {
        let omega = 2.0 * PI * self.cutoff / self.sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * self.q);

        let (b0, b1, b2) = match self.mode {
            FilterMode::LowPass => {
                let b1 = 1.0 - cos_omega;
                (b1 / 2.0, b1, b1 / 2.0)
            }
            FilterMode::HighPass => {
                let b1 = -(1.0 + cos_omega);
                (-b1 / 2.0, b1, -b1 / 2.0)
            }
        };
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        self.coeffs = Coefficients {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        };
    }

    pub fn process(&mut self, input: f64) -> f64 {
        let output = self.coeffs.b0 * input + self.z1;
        self.z1 = self.coeffs.b1 * input - self.coeffs.a1 * output + self.z2;
        self.z2 = self.coeffs.b2 * input - self.coeffs.a2 * output;
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn max_response(filter: &mut Filter, freq: f64, samples: usize, skip: usize) -> f64 {
        let mut max = 0.0f64;
        for i in 0..samples {
            let t = i as f64 / 44100.0;
            let out = filter.process((2.0 * PI * freq * t).sin());
            if i > skip {
                max = max.max(out.abs());
            }
        }
        max
    }

    #[test]
    fn test_lowpass_attenuates_highs() {
        let mut filter = Filter::new(FilterMode::LowPass, 100.0, 44100.0);
        let max = max_response(&mut filter, 5000.0, 2000, 200);
        assert!(max < 0.1, "expected attenuation, got {}", max);
    }

    #[test]
    fn test_lowpass_passes_lows() {
        let mut filter = Filter::new(FilterMode::LowPass, 5000.0, 44100.0);
        let max = max_response(&mut filter, 100.0, 4410, 500);
        assert!(max > 0.9, "expected passthrough, got {}", max);
    }

    #[test]
    fn test_highpass_attenuates_lows() {
        let mut filter = Filter::new(FilterMode::HighPass, 2000.0, 44100.0);
        let max = max_response(&mut filter, 50.0, 4410, 500);
        assert!(max < 0.2, "expected attenuation, got {}", max);
    }

    #[test]
    fn test_tune_clamps() {
        let mut filter = Filter::new(FilterMode::LowPass, 1000.0, 44100.0);
        filter.tune(5.0, 0.01);
        assert_eq!(filter.cutoff(), 20.0);
        assert_eq!(filter.q(), 0.1);

        filter.tune(30000.0, 100.0);
        assert!(filter.cutoff() < 22050.0);
        assert_eq!(filter.q(), 20.0);
    }

    #[test]
    fn test_reset_clears_state() {
        let mut filter = Filter::new(FilterMode::LowPass, 1000.0, 44100.0);
        for _ in 0..100 {
            filter.process(1.0);
        }
        filter.reset();
        assert!(filter.process(0.0).abs() < 1e-6);
    }
}
