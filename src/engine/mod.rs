//! Mix engine
//!
//! Owns the channel collection, the audio engine, the master fader, the
//! global tempo and musical scale, and orchestrates start/stop across
//! channels. The audio callback pulls stereo frames out of `process_frame`;
//! everything else mutates state between pulls.

mod audio;
mod channel;
mod playback;
mod player;
mod recorder;
mod tempo;

pub use audio::AudioEngine;
pub use channel::{Channel, ChannelInfo};
pub use playback::PlaybackScheduler;
pub use player::{list_output_devices, Player};
pub use recorder::Recorder;
pub use tempo::{TempoCallback, TempoLink, TEMPO_MAX, TEMPO_MIN};

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SondeConfig;
use crate::mapping::{MappingKind, MappingRegistry, Scale, ScaleQuantizer};

/// Engine error taxonomy. Most failure modes degrade to no-ops instead of
/// surfacing here; these are the ones a caller can act on.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("audio output unavailable: {0}")]
    AudioUnavailable(String),
    #[error("unsupported sample format {0}")]
    UnsupportedSampleFormat(String),
}

/// A channel requested while the audio subsystem was still down, waiting
/// for `resume_audio`.
struct PendingChannel {
    id: String,
    name: String,
    mapping: MappingKind,
}

pub struct MixEngine {
    audio: AudioEngine,
    channels: HashMap<String, Channel>,
    pending: Vec<PendingChannel>,
    registry: MappingRegistry,
    quantizer: ScaleQuantizer,
    tempo: TempoLink,
    is_playing: bool,
}

impl MixEngine {
    pub fn new(audio: AudioEngine) -> Self {
        Self {
            audio,
            channels: HashMap::new(),
            pending: Vec::new(),
            registry: MappingRegistry::with_defaults(),
            quantizer: ScaleQuantizer::default(),
            tempo: TempoLink::new(120.0),
            is_playing: false,
        }
    }

    /// Build an engine wired from a validated configuration.
    pub fn from_config(config: &SondeConfig) -> Self {
        let mut engine = Self::new(AudioEngine::new(config.audio.sample_rate as f64));
        engine.set_master_volume(config.master.volume as f64);
        engine.set_beat_tempo(config.master.bpm as f64);
        if !engine.set_musical_scale(&config.master.scale) {
            warn!(scale = %config.master.scale, "unknown scale, keeping pentatonic");
        }
        for channel in &config.channels {
            let name = if channel.name.is_empty() {
                &channel.id
            } else {
                &channel.name
            };
            engine.add_channel(&channel.id, name, channel.mapping);
            engine.set_channel_volume(&channel.id, channel.volume as f64);
        }
        engine
    }

    pub fn sample_rate(&self) -> f64 {
        self.audio.sample_rate()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    /// Transport time in seconds.
    pub fn now(&self) -> f64 {
        self.audio.now()
    }

    pub(crate) fn skip_ahead(&mut self, secs: f64) {
        self.audio.skip_ahead(secs);
    }

    // ---- channel lifecycle ----

    /// Create a channel for a datastream. No-op if the id already exists.
    /// While the audio subsystem is down the request is queued and replayed
    /// by [`MixEngine::resume_audio`]. Returns whether a live channel exists
    /// for the id afterwards.
    pub fn add_channel(&mut self, id: &str, name: &str, mapping: MappingKind) -> bool {
        if self.channels.contains_key(id) {
            debug!(channel = id, "add ignored, id exists");
            return true;
        }
        if !self.audio.is_ready() {
            if self.pending.iter().all(|p| p.id != id) {
                info!(channel = id, "audio not ready, queueing channel");
                self.pending.push(PendingChannel {
                    id: id.to_string(),
                    name: name.to_string(),
                    mapping,
                });
            }
            return false;
        }
        let channel = Channel::new(id, name, mapping, self.audio.sample_rate());
        self.channels.insert(id.to_string(), channel);
        true
    }

    /// Bring the audio subsystem up and create every queued channel.
    pub fn resume_audio(&mut self) {
        self.audio.resume();
        for pending in std::mem::take(&mut self.pending) {
            self.add_channel(&pending.id, &pending.name, pending.mapping);
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Remove a channel and release its synthesis resources. Unknown ids
    /// are a silent no-op.
    pub fn remove_channel(&mut self, id: &str) {
        if self.channels.remove(id).is_none() {
            self.pending.retain(|p| p.id != id);
            debug!(channel = id, "remove ignored, unknown id");
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel_ids(&self) -> Vec<String> {
        self.channels.keys().cloned().collect()
    }

    pub fn channel_info(&self, id: &str) -> Option<ChannelInfo> {
        self.channel(id).map(Channel::info)
    }

    pub(crate) fn channel(&self, id: &str) -> Option<&Channel> {
        self.channels.get(id)
    }

    // ---- data path ----

    /// Feed one live reading into a channel.
    pub fn update_channel_value(&mut self, id: &str, value: f64) {
        let now = self.audio.now();
        let tempo = self.tempo.bpm();
        match self.channels.get_mut(id) {
            Some(channel) => {
                channel.update_value(value, now, &self.registry, &self.quantizer, tempo)
            }
            None => debug!(channel = id, "update ignored, unknown id"),
        }
    }

    /// Install a bulk historical series on a channel (seeds auto-ranging).
    pub fn load_channel_history(&mut self, id: &str, values: &[f64]) {
        if let Some(channel) = self.channels.get_mut(id) {
            channel.load_history(values);
        }
    }

    pub fn set_channel_range(&mut self, id: &str, min: f64, max: f64) {
        if let Some(channel) = self.channels.get_mut(id) {
            channel.set_range(min, max);
        }
    }

    // ---- per-channel controls ----

    pub fn set_channel_mapping(&mut self, id: &str, mapping: MappingKind) {
        let now = self.audio.now();
        let tempo = self.tempo.bpm();
        if let Some(channel) = self.channels.get_mut(id) {
            channel.set_mapping(mapping, now, &self.registry, &self.quantizer, tempo);
        }
    }

    pub fn set_channel_volume(&mut self, id: &str, volume: f64) {
        if let Some(channel) = self.channels.get_mut(id) {
            channel.set_volume(volume);
        }
    }

    pub fn start_channel(&mut self, id: &str) {
        let now = self.audio.now();
        let tempo = self.tempo.bpm();
        if let Some(channel) = self.channels.get_mut(id) {
            channel.start(now, &self.registry, &self.quantizer, tempo);
        }
    }

    pub fn stop_channel(&mut self, id: &str) {
        if let Some(channel) = self.channels.get_mut(id) {
            channel.stop();
        }
    }

    // ---- transport ----

    /// Start every channel. Safe to call before the audio subsystem is up;
    /// queued channels come up stopped and can be started once created.
    pub fn start_all(&mut self) {
        self.is_playing = true;
        if !self.audio.is_ready() {
            info!("start_all before audio ready, deferred");
            return;
        }
        let now = self.audio.now();
        let tempo = self.tempo.bpm();
        for channel in self.channels.values_mut() {
            channel.start(now, &self.registry, &self.quantizer, tempo);
        }
    }

    /// Stop every channel. Channel stop cannot fail, so one channel can
    /// never prevent the rest from stopping.
    pub fn stop_all(&mut self) {
        self.is_playing = false;
        for channel in self.channels.values_mut() {
            channel.stop();
        }
    }

    pub fn set_master_volume(&mut self, volume: f64) {
        self.audio.set_master_volume(volume);
    }

    pub fn master_volume(&self) -> f64 {
        self.audio.master_volume()
    }

    /// Switch the process-wide musical scale. Affects only subsequent
    /// quantization. Returns false (and keeps the old scale) for unknown
    /// names.
    pub fn set_musical_scale(&mut self, name: &str) -> bool {
        match Scale::from_name(name) {
            Some(scale) => {
                self.quantizer.set_scale(scale);
                true
            }
            None => false,
        }
    }

    pub fn current_scale(&self) -> &str {
        self.quantizer.scale().name()
    }

    pub fn available_mappings(&self) -> Vec<&'static str> {
        MappingKind::all().iter().map(|k| k.name()).collect()
    }

    pub fn available_scales(&self) -> Vec<&'static str> {
        Scale::available().to_vec()
    }

    // ---- tempo bridge ----

    /// Set the transport tempo, clamped to [60, 200], and publish the
    /// change to every subscribed rhythm generator. Returns the clamped
    /// value.
    pub fn set_beat_tempo(&mut self, bpm: f64) -> f64 {
        self.tempo.set_bpm(bpm)
    }

    pub fn current_tempo(&self) -> f64 {
        self.tempo.bpm()
    }

    /// Register a consumer of outbound tempo changes.
    pub fn subscribe_tempo(&mut self, callback: TempoCallback) {
        self.tempo.subscribe(callback);
    }

    /// Inbound tempo from the external rhythm generator.
    pub fn receive_external_tempo(&mut self, bpm: f64) -> bool {
        self.tempo.receive(bpm)
    }

    pub fn set_tempo_sync(&mut self, enabled: bool) {
        self.tempo.set_sync_enabled(enabled);
    }

    // ---- introspection for tests and the playback scheduler ----

    /// Channels with an armed rhythm pulse.
    pub fn active_pulse_count(&self) -> usize {
        self.channels.values().filter(|c| c.pulse_armed()).count()
    }

    /// Longest loaded history across currently active channels.
    pub fn max_history_len(&self) -> usize {
        self.channels
            .values()
            .map(Channel::history_len)
            .max()
            .unwrap_or(0)
    }

    /// Feed every channel its history entry at `index`; channels with
    /// shorter histories freeze on their last value.
    pub fn feed_history(&mut self, index: usize) {
        let frozen: Vec<(String, f64)> = self
            .channels
            .values()
            .filter(|c| c.history_len() > 0)
            .filter_map(|c| {
                let at = index.min(c.history_len() - 1);
                c.history_at(at).map(|v| (c.id().to_string(), v))
            })
            .collect();
        for (id, value) in frozen {
            self.update_channel_value(&id, value);
        }
    }

    // ---- audio pull path ----

    /// Generate one stereo frame and advance the transport.
    pub fn process_frame(&mut self) -> [f64; 2] {
        let now = self.audio.now();
        let mut mix = [0.0f64; 2];
        for channel in self.channels.values_mut() {
            let frame = channel.process_frame(now);
            mix[0] += frame[0];
            mix[1] += frame[1];
        }
        let master = self.audio.master_gain_next();
        self.audio.advance();
        [mix[0] * master, mix[1] * master]
    }

    /// Fill an interleaved output buffer with `channels` samples per frame.
    /// Mono gets a downmix; extra channels beyond stereo get silence.
    pub fn fill_buffer(&mut self, buffer: &mut [f32], channels: usize) {
        for frame in buffer.chunks_mut(channels.max(1)) {
            let [l, r] = self.process_frame();
            if frame.len() == 1 {
                frame[0] = ((l + r) * 0.5) as f32;
            } else {
                frame[0] = l as f32;
                frame[1] = r as f32;
                for extra in frame.iter_mut().skip(2) {
                    *extra = 0.0;
                }
            }
        }
    }
}
