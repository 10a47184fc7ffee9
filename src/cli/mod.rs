//! CLI interface for Sonde

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Continuous sonification of environmental sensor streams
#[derive(Parser)]
#[command(name = "sonde")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Play live, feeding channels from a scripted reading file or a
    /// built-in demo walk
    Play {
        /// Configuration file path
        #[arg(short, long, default_value = "sonde.yaml")]
        config: PathBuf,

        /// Scripted readings YAML (stream/value pairs); demo walk if absent
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Seconds between readings
        #[arg(long, default_value = "0.5")]
        interval: f64,
    },

    /// Replay per-channel historical series through the playback scheduler
    Replay {
        /// Configuration file path
        #[arg(short, long, default_value = "sonde.yaml")]
        config: PathBuf,

        /// History YAML: map of channel id to list of values
        #[arg(long)]
        history: PathBuf,

        /// Seconds per playback tick
        #[arg(long, default_value = "1.0")]
        tick: f64,
    },

    /// Render to a stereo WAV file offline
    Record {
        /// Configuration file path
        #[arg(short, long, default_value = "sonde.yaml")]
        config: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Duration in seconds
        #[arg(short, long, default_value = "60")]
        duration: u64,

        /// Scripted readings YAML; demo walk if absent
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Seconds between readings
        #[arg(long, default_value = "0.5")]
        interval: f64,
    },

    /// List available audio output devices
    Devices,

    /// Validate a configuration file
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "sonde.yaml")]
        config: PathBuf,
    },

    /// Generate an example configuration file
    Init,
}
