//! The single update loop.
//!
//! A dedicated thread owns the [`HeartRateModel`] and waits on two channels:
//! commands from the presentation layer and events from the sensor adapter.
//! Each message is handled to completion before the next one is taken, so the
//! model never sees concurrent mutation.

use crate::core::display::DisplayState;
use crate::core::model::HeartRateModel;
use crossbeam_channel::{select, unbounded, Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::thread::{self, JoinHandle};

/// A user intent sent from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    RequestAuth,
    Start,
    Pause,
    Resume,
    End,
    Reset,
    Foreground,
    Background,
}

impl Intent {
    /// Apply this intent to `model`.
    pub fn dispatch(self, model: &mut HeartRateModel) {
        match self {
            Intent::RequestAuth => model.request_auth(),
            Intent::Start => model.start(),
            Intent::Pause => model.pause(),
            Intent::Resume => model.resume(),
            Intent::End => model.end(),
            Intent::Reset => model.reset(),
            Intent::Foreground => model.on_foreground(),
            Intent::Background => model.on_background(),
        }
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auth" | "allow" => Ok(Intent::RequestAuth),
            "start" => Ok(Intent::Start),
            "pause" => Ok(Intent::Pause),
            "resume" => Ok(Intent::Resume),
            "end" | "stop" => Ok(Intent::End),
            "reset" => Ok(Intent::Reset),
            "fg" | "foreground" => Ok(Intent::Foreground),
            "bg" | "background" => Ok(Intent::Background),
            other => Err(format!("unknown command '{other}'")),
        }
    }
}

enum Command {
    Intent(Intent),
    Subscribe(Sender<DisplayState>),
    Shutdown,
}

/// Errors talking to the update loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// The update loop has exited
    Stopped,
    /// The update loop panicked
    Panicked,
}

impl std::fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::Stopped => write!(f, "Update loop is not running"),
            RuntimeError::Panicked => write!(f, "Update loop panicked"),
        }
    }
}

impl std::error::Error for RuntimeError {}

/// Cloneable handle for sending commands to the update loop.
#[derive(Clone)]
pub struct RuntimeHandle {
    commands: Sender<Command>,
}

impl RuntimeHandle {
    pub fn send(&self, intent: Intent) -> Result<(), RuntimeError> {
        self.commands
            .send(Command::Intent(intent))
            .map_err(|_| RuntimeError::Stopped)
    }

    /// Subscribe to display updates. The current state is delivered first.
    pub fn subscribe(&self) -> Result<Receiver<DisplayState>, RuntimeError> {
        let (tx, rx) = unbounded();
        self.commands
            .send(Command::Subscribe(tx))
            .map_err(|_| RuntimeError::Stopped)?;
        Ok(rx)
    }

    /// Ask the loop to close any open session and exit.
    pub fn request_shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

/// The update loop thread.
pub struct Runtime {
    handle: RuntimeHandle,
    thread_handle: Option<JoinHandle<()>>,
}

impl Runtime {
    /// Move `model` onto its own thread and start processing.
    pub fn spawn(model: HeartRateModel) -> Self {
        let (commands_tx, commands_rx) = unbounded();

        let thread_handle = thread::spawn(move || run_loop(model, commands_rx));

        Self {
            handle: RuntimeHandle {
                commands: commands_tx,
            },
            thread_handle: Some(thread_handle),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn send(&self, intent: Intent) -> Result<(), RuntimeError> {
        self.handle.send(intent)
    }

    pub fn subscribe(&self) -> Result<Receiver<DisplayState>, RuntimeError> {
        self.handle.subscribe()
    }

    /// Stop the loop and wait for it to exit.
    pub fn shutdown(mut self) -> Result<(), RuntimeError> {
        self.handle.request_shutdown();
        self.join()
    }

    /// Wait for the loop to exit on its own.
    pub fn join(&mut self) -> Result<(), RuntimeError> {
        match self.thread_handle.take() {
            Some(handle) => handle.join().map_err(|_| RuntimeError::Panicked),
            None => Ok(()),
        }
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        if self.thread_handle.is_some() {
            self.handle.request_shutdown();
            let _ = self.join();
        }
    }
}

fn run_loop(mut model: HeartRateModel, commands: Receiver<Command>) {
    let events = model.events();
    tracing::debug!(sensor = model.sensor_name(), "update loop started");

    loop {
        select! {
            recv(commands) -> command => match command {
                Ok(Command::Intent(intent)) => {
                    tracing::debug!(?intent, "intent");
                    intent.dispatch(&mut model);
                }
                Ok(Command::Subscribe(subscriber)) => model.add_subscriber(subscriber),
                // Every handle dropped counts as a shutdown request.
                Ok(Command::Shutdown) | Err(_) => break,
            },
            recv(events) -> event => {
                // The model holds a sender, so this channel never disconnects.
                if let Ok(event) = event {
                    model.ingest(event);
                }
            }
        }
    }

    model.shutdown();
    tracing::debug!("update loop exited");
}
