//! Sonde - continuous sonification of environmental sensor streams

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use sonde::config::{self, SondeConfig};
use sonde::engine::{list_output_devices, MixEngine, PlaybackScheduler, Player, Recorder};
use sonde::sources::{ScriptedSource, Source};

mod cli;

use cli::{Cli, Commands};

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            config,
            input,
            interval,
        } => play(&config, input.as_deref(), interval),

        Commands::Replay {
            config,
            history,
            tick,
        } => replay(&config, &history, tick),

        Commands::Record {
            config,
            output,
            duration,
            input,
            interval,
        } => record(&config, &output, duration, input.as_deref(), interval),

        Commands::Devices => {
            devices();
            Ok(())
        }

        Commands::Check { config } => check(&config),

        Commands::Init => init(),
    }
}

/// One scripted reading in an --input file.
#[derive(Debug, Deserialize)]
struct ScriptEntry {
    stream: String,
    value: f64,
}

fn load_script(input: Option<&Path>, config: &SondeConfig) -> Result<Vec<(String, f64)>> {
    match input {
        Some(path) => {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read script {:?}", path))?;
            let entries: Vec<ScriptEntry> = serde_yaml::from_str(&contents)?;
            Ok(entries.into_iter().map(|e| (e.stream, e.value)).collect())
        }
        None => Ok(demo_walk(config)),
    }
}

/// Deterministic demo feed: a slow sine per channel with a little jitter,
/// standing in for the external data service.
fn demo_walk(config: &SondeConfig) -> Vec<(String, f64)> {
    let mut rng: u64 = 0x5eed_c0de;
    let mut script = Vec::new();
    for step in 0..240 {
        for (i, channel) in config.channels.iter().enumerate() {
            rng ^= rng << 13;
            rng ^= rng >> 7;
            rng ^= rng << 17;
            let jitter = (rng as f64 / u64::MAX as f64 - 0.5) * 6.0;
            let phase = step as f64 * 0.35 + i as f64 * 1.7;
            script.push((channel.id.clone(), 50.0 + 30.0 * phase.sin() + jitter));
        }
    }
    script
}

fn install_stop_flag() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let handle = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        handle.store(true, Ordering::SeqCst);
    })?;
    Ok(stop)
}

fn play(config_path: &Path, input: Option<&Path>, interval: f64) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let script = load_script(input, &cfg)?;

    println!("Starting sonde...");
    println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
    println!("  Scale: {}", cfg.master.scale);
    println!("  Tempo: {} BPM", cfg.master.bpm);
    println!("  Channels: {}", cfg.channels.len());

    let engine = Arc::new(Mutex::new(MixEngine::from_config(&cfg)));
    engine.lock().unwrap().start_all();

    let mut player = Player::new();
    player.start(Arc::clone(&engine))?;

    let runtime = tokio::runtime::Runtime::new()?;

    let mut source = ScriptedSource::new(
        "feed",
        script,
        Duration::from_secs_f64(interval.max(0.01)),
    )
    .looped();
    let mut rx = source.subscribe();
    {
        // The source spawns its polling task, so it needs the runtime
        // context; the guard must not outlive this block or block_on panics.
        let _guard = runtime.enter();
        source.start()?;
    }

    let stop = install_stop_flag()?;
    println!("Playing. Ctrl-C to stop.");

    runtime.block_on(async {
        while !stop.load(Ordering::SeqCst) {
            if let Ok(Ok(reading)) =
                tokio::time::timeout(Duration::from_millis(100), rx.recv()).await
            {
                let mut engine = engine.lock().unwrap();
                engine.update_channel_value(&reading.stream, reading.value);
            }
        }
    });

    source.stop();
    engine.lock().unwrap().stop_all();
    player.stop();
    println!("Stopped.");
    Ok(())
}

fn replay(config_path: &Path, history_path: &Path, tick: f64) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let contents = std::fs::read_to_string(history_path)
        .with_context(|| format!("failed to read history {:?}", history_path))?;
    let histories: HashMap<String, Vec<f64>> = serde_yaml::from_str(&contents)?;

    let engine = Arc::new(Mutex::new(MixEngine::from_config(&cfg)));
    {
        let mut engine = engine.lock().unwrap();
        for (id, values) in &histories {
            engine.load_channel_history(id, values);
            println!("  {} <- {} historical values", id, values.len());
        }
        engine.start_all();
    }

    let mut player = Player::new();
    player.start(Arc::clone(&engine))?;

    let mut scheduler =
        PlaybackScheduler::new().with_tick_interval(Duration::from_secs_f64(tick.max(0.01)));
    scheduler.start();

    let stop = install_stop_flag()?;
    println!("Replaying (looped). Ctrl-C to stop.");

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async {
        let mut ticker = tokio::time::interval(scheduler.tick_interval());
        while !stop.load(Ordering::SeqCst) {
            ticker.tick().await;
            scheduler.advance(&mut engine.lock().unwrap());
        }
    });

    scheduler.stop();
    engine.lock().unwrap().stop_all();
    player.stop();
    println!("Stopped.");
    Ok(())
}

fn record(
    config_path: &Path,
    output: &PathBuf,
    duration: u64,
    input: Option<&Path>,
    interval: f64,
) -> Result<()> {
    let cfg = config::load_config(config_path)?;
    let script = load_script(input, &cfg)?;

    println!("Rendering {} seconds to {:?}...", duration, output);

    let mut engine = MixEngine::from_config(&cfg);
    engine.start_all();

    let sample_rate = cfg.audio.sample_rate;
    let mut recorder = Recorder::new(output, sample_rate)?;

    let total_frames = sample_rate as u64 * duration;
    let frames_per_reading = (interval.max(0.01) * sample_rate as f64) as u64;
    let mut script_iter = script.iter().cycle();

    for frame_index in 0..total_frames {
        if frame_index % frames_per_reading == 0 {
            if let Some((stream, value)) = script_iter.next() {
                engine.update_channel_value(stream, *value);
            }
        }

        let [l, r] = engine.process_frame();
        recorder.write_frame([l as f32, r as f32])?;

        if frame_index % sample_rate as u64 == 0 {
            print!(
                "\r  Progress: {}s / {}s",
                frame_index / sample_rate as u64,
                duration
            );
            use std::io::Write;
            std::io::stdout().flush()?;
        }
    }

    recorder.finalize()?;
    println!("\nWrote {:?}", output);
    Ok(())
}

fn devices() {
    println!("Available audio output devices:\n");
    let devices = list_output_devices();
    if devices.is_empty() {
        println!("  (none found)");
        return;
    }
    for (name, config) in devices {
        println!(
            "  - {} ({} Hz, {} ch)",
            name, config.sample_rate.0, config.channels
        );
    }
}

fn check(config_path: &Path) -> Result<()> {
    println!("Checking configuration at {:?}...", config_path);

    match config::load_config(config_path) {
        Ok(cfg) => {
            println!("Configuration is valid!");
            println!("  Sample rate: {} Hz", cfg.audio.sample_rate);
            println!("  Buffer size: {}", cfg.audio.buffer_size);
            println!("  Master volume: {:.0}%", cfg.master.volume * 100.0);
            println!("  BPM: {}", cfg.master.bpm);
            println!("  Scale: {}", cfg.master.scale);
            println!("  Channels: {}", cfg.channels.len());
            for channel in &cfg.channels {
                println!(
                    "    - {} ({:?}, volume {:.2})",
                    channel.id, channel.mapping, channel.volume
                );
            }
            Ok(())
        }
        Err(e) => {
            println!("Configuration is invalid: {}", e);
            std::process::exit(1);
        }
    }
}

fn init() -> Result<()> {
    let example_config = include_str!("../sonde.example.yaml");

    let path = "sonde.yaml";
    if std::path::Path::new(path).exists() {
        println!("sonde.yaml already exists. Not overwriting.");
    } else {
        std::fs::write(path, example_config)?;
        println!("Created sonde.yaml with example configuration.");
    }
    Ok(())
}
