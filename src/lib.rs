//! Sonde - continuous sonification of environmental sensor streams
//!
//! Turns time-series sensor readings into sound. Each datastream drives one
//! mixer channel; the channel's mapping converts auto-ranged values into
//! pitch, timbre, volume, pan or rhythm, quantized to a shared musical scale
//! where the mapping is a musical one.

pub mod config;
pub mod engine;
pub mod mapping;
pub mod sources;
pub mod synth;

pub use config::SondeConfig;
pub use engine::MixEngine;
