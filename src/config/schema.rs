//! Configuration schema definitions

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::mapping::{MappingKind, Scale};

/// Main configuration for Sonde.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SondeConfig {
    /// Audio output settings
    pub audio: AudioConfig,

    /// Master settings (tempo, scale, volume)
    pub master: MasterConfig,

    /// Mixer channels, one per datastream
    #[serde(default)]
    pub channels: Vec<ChannelConfig>,
}

impl SondeConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.audio.sample_rate < 8000 || self.audio.sample_rate > 192_000 {
            bail!("Sample rate must be between 8000 and 192000");
        }
        if self.audio.buffer_size < 64 || self.audio.buffer_size > 8192 {
            bail!("Buffer size must be between 64 and 8192");
        }

        if !(0.0..=1.0).contains(&self.master.volume) {
            bail!("Master volume must be between 0.0 and 1.0");
        }
        if !(60.0..=200.0).contains(&self.master.bpm) {
            bail!("BPM must be between 60 and 200");
        }
        if Scale::from_name(&self.master.scale).is_none() {
            bail!(
                "Unknown scale '{}' (available: {})",
                self.master.scale,
                Scale::available().join(", ")
            );
        }

        for (i, channel) in self.channels.iter().enumerate() {
            if channel.id.is_empty() {
                bail!("Channel {} has an empty id", i);
            }
            if !(0.0..=1.0).contains(&channel.volume) {
                bail!("Channel '{}' volume must be between 0.0 and 1.0", channel.id);
            }
            if self.channels[..i].iter().any(|c| c.id == channel.id) {
                bail!("Duplicate channel id '{}'", channel.id);
            }
        }

        Ok(())
    }
}

/// Audio output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    /// Buffer size in samples (default: 512)
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Output device name (None = default device)
    pub device: Option<String>,
}

fn default_sample_rate() -> u32 {
    44100
}
fn default_buffer_size() -> usize {
    512
}

/// Master settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    /// Beats per minute, 60-200 (default: 120)
    #[serde(default = "default_bpm")]
    pub bpm: f32,

    /// Musical scale for the musical mapping family (default: pentatonic)
    #[serde(default = "default_scale")]
    pub scale: String,

    /// Master volume 0.0-1.0 (default: 0.5)
    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_bpm() -> f32 {
    120.0
}
fn default_scale() -> String {
    "pentatonic".to_string()
}
fn default_volume() -> f32 {
    0.5
}

/// One mixer channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Datastream id this channel listens to, e.g. "site1_co2"
    pub id: String,

    /// Display name (default: the id)
    #[serde(default)]
    pub name: String,

    /// Mapping for this channel (default: melody)
    #[serde(default = "default_mapping")]
    pub mapping: MappingKind,

    /// Channel volume 0.0-1.0 (default: 0.7)
    #[serde(default = "default_channel_volume")]
    pub volume: f32,
}

fn default_mapping() -> MappingKind {
    MappingKind::Melody
}
fn default_channel_volume() -> f32 {
    0.7
}
