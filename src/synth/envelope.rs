//! ADSR amplitude envelope

/// Envelope stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStage {
    Idle,
    Attack,
    Decay,
    Sustain,
    Release,
}

/// Linear-segment ADSR envelope.
///
/// Retriggering while active restarts the attack from the current level, so
/// fast note changes stay click-free.
pub struct Envelope {
    sample_rate: f64,

    attack: f64,
    decay: f64,
    sustain: f64,
    release: f64,

    stage: EnvelopeStage,
    level: f64,
    release_from: f64,
}

impl Envelope {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
            stage: EnvelopeStage::Idle,
            level: 0.0,
            release_from: 0.0,
        }
    }

    /// Build an envelope with the given ADSR times (seconds) and sustain
    /// level.
    pub fn with_adsr(sample_rate: f64, attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        let mut env = Self::new(sample_rate);
        env.attack = attack.max(0.001);
        env.decay = decay.max(0.001);
        env.sustain = sustain.clamp(0.0, 1.0);
        env.release = release.max(0.001);
        env
    }

    /// Start (or restart) the attack phase.
    pub fn trigger(&mut self) {
        self.stage = EnvelopeStage::Attack;
    }

    /// Enter the release phase from wherever the level currently is.
    pub fn release(&mut self) {
        if self.stage != EnvelopeStage::Idle && self.stage != EnvelopeStage::Release {
            self.release_from = self.level;
            self.stage = EnvelopeStage::Release;
        }
    }

    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    pub fn is_idle(&self) -> bool {
        self.stage == EnvelopeStage::Idle
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    /// Advance one sample and return the envelope level in [0, 1].
    pub fn process(&mut self) -> f64 {
        let dt = 1.0 / self.sample_rate;

        match self.stage {
            EnvelopeStage::Idle => {
                self.level = 0.0;
            }
            EnvelopeStage::Attack => {
                self.level += dt / self.attack;
                if self.level >= 1.0 {
                    self.level = 1.0;
                    self.stage = EnvelopeStage::Decay;
                }
            }
            EnvelopeStage::Decay => {
                self.level -= (1.0 - self.sustain).max(0.0) / self.decay * dt;
                if self.level <= self.sustain {
                    self.level = self.sustain;
                    // A zero-sustain envelope (bells) falls straight through
                    // to release once the decay completes.
                    self.stage = if self.sustain <= 0.0 {
                        self.level = 0.0;
                        EnvelopeStage::Idle
                    } else {
                        EnvelopeStage::Sustain
                    };
                }
            }
            EnvelopeStage::Sustain => {
                self.level = self.sustain;
            }
            EnvelopeStage::Release => {
                self.level -= self.release_from.max(1e-6) / self.release * dt;
                if self.level <= 0.0 {
                    self.level = 0.0;
                    self.stage = EnvelopeStage::Idle;
                }
            }
        }

        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_until_triggered() {
        let mut env = Envelope::new(44100.0);
        assert!(env.is_idle());
        assert_eq!(env.process(), 0.0);
    }

    #[test]
    fn test_attack_reaches_peak() {
        let mut env = Envelope::with_adsr(44100.0, 0.01, 0.1, 0.7, 0.3);
        env.trigger();

        for _ in 0..600 {
            env.process();
        }
        assert!(env.level() > 0.9);
    }

    #[test]
    fn test_decays_to_sustain() {
        let mut env = Envelope::with_adsr(44100.0, 0.001, 0.001, 0.5, 0.3);
        env.trigger();

        for _ in 0..500 {
            env.process();
        }
        assert_eq!(env.stage(), EnvelopeStage::Sustain);
        assert!((env.level() - 0.5).abs() < 0.01);
    }

    #[test]
    fn test_release_returns_to_idle() {
        let mut env = Envelope::with_adsr(44100.0, 0.001, 0.001, 0.5, 0.01);
        env.trigger();
        for _ in 0..200 {
            env.process();
        }

        env.release();
        assert_eq!(env.stage(), EnvelopeStage::Release);

        for _ in 0..1000 {
            env.process();
        }
        assert!(env.is_idle());
        assert_eq!(env.level(), 0.0);
    }

    #[test]
    fn test_zero_sustain_self_terminates() {
        // Percussive shape: no sustain, decay straight to idle.
        let mut env = Envelope::with_adsr(1000.0, 0.001, 0.05, 0.0, 0.2);
        env.trigger();

        for _ in 0..2000 {
            env.process();
        }
        assert!(env.is_idle());
    }

    #[test]
    fn test_retrigger_from_current_level() {
        let mut env = Envelope::with_adsr(1000.0, 0.1, 0.1, 0.8, 0.3);
        env.trigger();
        for _ in 0..50 {
            env.process();
        }
        let before = env.level();
        assert!(before > 0.0);

        env.trigger();
        // Restarting attack must not drop the level to zero.
        assert!(env.process() >= before);
    }

    #[test]
    fn test_release_while_idle_is_noop() {
        let mut env = Envelope::new(44100.0);
        env.release();
        assert!(env.is_idle());
    }
}
