//! Data sources
//!
//! The push boundary between the engine and whatever produces sensor
//! readings. The real HTTP-polling data service lives outside this crate
//! and implements [`Source`]; [`ScriptedSource`] is the in-crate reference
//! producer for demos and tests.

mod scripted;
mod source;

pub use scripted::ScriptedSource;
pub use source::{Reading, Source};
