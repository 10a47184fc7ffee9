//! Scripted source
//!
//! Replays a fixed sequence of readings at a steady interval. The reference
//! implementation of the source boundary, used by the demo commands and by
//! tests; a real deployment wires the HTTP-polling data service in its
//! place.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::{Reading, Source};

pub struct ScriptedSource {
    name: String,
    interval: Duration,
    script: Arc<Vec<(String, f64)>>,
    looped: bool,
    running: Arc<AtomicBool>,
    sender: broadcast::Sender<Reading>,
    task: Option<JoinHandle<()>>,
}

impl ScriptedSource {
    /// `script` is a sequence of (stream id, value) pairs emitted in order,
    /// one per `interval`.
    pub fn new(name: impl Into<String>, script: Vec<(String, f64)>, interval: Duration) -> Self {
        let (sender, _) = broadcast::channel(64);
        Self {
            name: name.into(),
            interval,
            script: Arc::new(script),
            looped: false,
            running: Arc::new(AtomicBool::new(false)),
            sender,
            task: None,
        }
    }

    /// Restart from the top when the script runs out.
    pub fn looped(mut self) -> Self {
        self.looped = true;
        self
    }

    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl Source for ScriptedSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&mut self) -> anyhow::Result<()> {
        if self.is_running() {
            return Ok(());
        }
        self.running.store(true, Ordering::SeqCst);

        let script = Arc::clone(&self.script);
        let looped = self.looped;
        let interval = self.interval;
        let running = Arc::clone(&self.running);
        let sender = self.sender.clone();

        let task = tokio::spawn(async move {
            let mut position = 0usize;
            while running.load(Ordering::SeqCst) {
                if script.is_empty() {
                    break;
                }
                if position >= script.len() {
                    if !looped {
                        break;
                    }
                    position = 0;
                }

                let (stream, value) = &script[position];
                position += 1;

                // Ignore send errors: no receivers is fine.
                let _ = sender.send(Reading::new(stream.clone(), *value).simulated());

                tokio::time::sleep(interval).await;
            }
            running.store(false, Ordering::SeqCst);
        });

        self.task = Some(task);
        Ok(())
    }

    fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn subscribe(&self) -> broadcast::Receiver<Reading> {
        self.sender.subscribe()
    }
}

impl Drop for ScriptedSource {
    fn drop(&mut self) {
        self.stop();
    }
}
