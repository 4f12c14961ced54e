//! heartlive CLI
//!
//! Terminal front end for the heart-rate view-model.

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use crossbeam_channel::{after, never, select, unbounded, Receiver};
use heartlive::{
    config::{Config, SourceKind},
    core::{sparkline, summarize, Cue, DisplayState, Haptics},
    create_shared_stats, HeartRateModel, Intent, MockGenerator, MockSensor, ReplaySensor,
    Runtime, RuntimeError, RuntimeHandle, SensorSession, SharedSessionStats, Status, VERSION,
};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "heartlive")]
#[command(version = VERSION)]
#[command(about = "Live heart-rate readout with a rolling trend line", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an interactive heart-rate session
    Run {
        /// Heart-rate source (mock or replay)
        #[arg(long)]
        source: Option<String>,

        /// Recording to play back (implies --source replay)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Seconds between readings
        #[arg(long)]
        interval: Option<u64>,

        /// Number of readings kept for the trend line
        #[arg(long)]
        capacity: Option<usize>,

        /// Seed for the synthetic generator
        #[arg(long)]
        seed: Option<u64>,

        /// Don't request authorization at launch
        #[arg(long)]
        no_auth: bool,

        /// Start a session as soon as access is granted
        #[arg(long)]
        start: bool,

        /// Stop after this many seconds
        #[arg(long)]
        duration: Option<u64>,

        /// Print display updates as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show configuration
    Config {
        /// Write the default configuration if none exists
        #[arg(long)]
        init: bool,
    },
}

enum Step {
    Line(String),
    InputClosed,
    Stop,
}

struct RunOptions {
    source: Option<String>,
    file: Option<PathBuf>,
    interval: Option<u64>,
    capacity: Option<usize>,
    seed: Option<u64>,
    no_auth: bool,
    start: bool,
    duration: Option<u64>,
    json: bool,
}

fn main() {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            source,
            file,
            interval,
            capacity,
            seed,
            no_auth,
            start,
            duration,
            json,
        } => cmd_run(RunOptions {
            source,
            file,
            interval,
            capacity,
            seed,
            no_auth,
            start,
            duration,
            json,
        }),
        Commands::Config { init } => cmd_config(init),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Logs go to stderr so the readout on stdout stays clean.
fn init_logging() {
    let filter =
        EnvFilter::try_from_env("HEARTLIVE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_run(opts: RunOptions) -> anyhow::Result<()> {
    let mut config = Config::load().context("loading configuration")?;
    apply_overrides(&mut config, &opts)?;
    config.validate().context("invalid configuration")?;

    if !opts.json {
        println!("heartlive v{VERSION}");
        println!();
        println!("  Source: {}", config.source);
        if let Some(path) = &config.replay_path {
            if config.source == SourceKind::Replay {
                println!("  Recording: {}", path.display());
            }
        }
        println!("  Interval: {}s", config.tick_interval.as_secs());
        println!("  History: {} readings", config.history_capacity);
        println!();
        print_help();
    }

    let sensor = build_sensor(&config, opts.seed)?;
    let stats = create_shared_stats();
    let model = HeartRateModel::from_boxed(sensor, config.history_capacity)
        .with_haptics(TerminalHaptics)
        .with_stats(stats.clone());

    let runtime = Runtime::spawn(model);
    let updates = runtime.subscribe()?;

    // The printer exits when the update loop drops its subscribers, which
    // also disconnects `done`.
    let (done_tx, done) = unbounded::<()>();
    let json = opts.json;
    let printer = thread::spawn(move || {
        let _done = done_tx;
        let mut last = None;
        for state in updates.iter() {
            print_state(&state, json);
            last = Some(state);
        }
        last
    });

    let handle = runtime.handle();
    ctrlc::set_handler(move || handle.request_shutdown())
        .context("setting Ctrl+C handler")?;

    if !opts.no_auth {
        runtime.send(Intent::RequestAuth)?;
        if opts.start {
            start_when_authorized(&runtime.handle())?;
        }
    } else if opts.start {
        runtime.send(Intent::Start)?;
    }

    let mut lines = spawn_line_reader();
    let deadline = match opts.duration {
        Some(secs) => after(Duration::from_secs(secs)),
        None => never(),
    };

    loop {
        let step = select! {
            recv(lines) -> line => match line {
                Ok(line) => Step::Line(line),
                Err(_) => Step::InputClosed,
            },
            recv(done) -> _ => Step::Stop,
            recv(deadline) -> _ => Step::Stop,
        };

        match step {
            Step::Line(line) => {
                if !handle_line(&runtime, &line, &stats)? {
                    break;
                }
            }
            // Input closed; keep running until the deadline.
            Step::InputClosed if opts.duration.is_some() => lines = never(),
            Step::InputClosed | Step::Stop => break,
        }
    }

    runtime.shutdown()?;
    let last = printer
        .join()
        .map_err(|_| anyhow!("display thread panicked"))?;

    if !opts.json {
        println!();
        if let Some(summary) = last.as_ref().and_then(|s| summarize(&s.recent_bpm)) {
            println!(
                "Trend window: {} readings, min {} / mean {:.1} / max {} bpm (sd {:.1})",
                summary.count, summary.min, summary.mean, summary.max, summary.std_dev
            );
        }
        println!("{}", stats.summary());
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, opts: &RunOptions) -> anyhow::Result<()> {
    if let Some(file) = &opts.file {
        config.replay_path = Some(file.clone());
        config.source = SourceKind::Replay;
    }
    if let Some(source) = &opts.source {
        config.source = source.parse()?;
    }
    if let Some(secs) = opts.interval {
        config.tick_interval = Duration::from_secs(secs);
    }
    if let Some(capacity) = opts.capacity {
        config.history_capacity = capacity;
    }
    Ok(())
}

fn build_sensor(config: &Config, seed: Option<u64>) -> anyhow::Result<Box<dyn SensorSession>> {
    match config.source {
        SourceKind::Mock => {
            let generator = match seed {
                Some(seed) => MockGenerator::seeded(config.mock, seed),
                None => MockGenerator::new(config.mock),
            };
            Ok(Box::new(MockSensor::new(generator, config.tick_interval)))
        }
        SourceKind::Replay => {
            let path = config
                .replay_path
                .clone()
                .context("replay source needs a recording (--file)")?;
            Ok(Box::new(ReplaySensor::new(path, config.tick_interval)))
        }
    }
}

/// Wait for the authorization outcome, then start if it was granted.
fn start_when_authorized(handle: &RuntimeHandle) -> anyhow::Result<()> {
    let updates = match handle.subscribe() {
        Ok(updates) => updates,
        Err(RuntimeError::Stopped) => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    let timeout = after(Duration::from_secs(10));

    loop {
        select! {
            recv(updates) -> state => {
                // Shut down while waiting, e.g. by Ctrl+C.
                let Ok(state) = state else {
                    return Ok(());
                };
                if state.authorized {
                    return match handle.send(Intent::Start) {
                        Ok(()) | Err(RuntimeError::Stopped) => Ok(()),
                        Err(e) => Err(e.into()),
                    };
                }
                if state.status != Status::NotStarted.label() {
                    // Authorization failed; the status line already says why.
                    return Ok(());
                }
            }
            recv(timeout) -> _ => {
                tracing::warn!("no authorization outcome after 10s, not starting");
                return Ok(());
            }
        }
    }
}

/// Handle one line of user input. Returns `false` to quit.
fn handle_line(
    runtime: &Runtime,
    line: &str,
    stats: &SharedSessionStats,
) -> anyhow::Result<bool> {
    let command = line.trim();
    match command {
        "" => {}
        "q" | "quit" | "exit" => return Ok(false),
        "h" | "help" | "?" => print_help(),
        "status" | "stats" => println!("{}", stats.summary()),
        other => match other.parse::<Intent>() {
            Ok(intent) => runtime.send(intent)?,
            Err(e) => eprintln!("{e} (type 'help' for commands)"),
        },
    }
    Ok(true)
}

fn spawn_line_reader() -> Receiver<String> {
    let (tx, rx) = unbounded();
    thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "stopped reading input");
                    break;
                }
            }
        }
    });
    rx
}

fn print_state(state: &DisplayState, json: bool) {
    if json {
        match serde_json::to_string(state) {
            Ok(line) => println!("{line}"),
            Err(e) => tracing::warn!(error = %e, "could not serialize display state"),
        }
        return;
    }

    let access = if state.authorized { "" } else { "  [no access]" };
    println!(
        "{:>4} bpm  {:<22} {}{}",
        state.bpm_text,
        state.status,
        sparkline::render(&state.recent_bpm),
        access
    );
}

fn print_help() {
    println!("Commands:");
    println!("  auth     request heart-rate access");
    println!("  start    start a session");
    println!("  pause    pause the session");
    println!("  resume   resume a paused session");
    println!("  end      end the session");
    println!("  reset    clear everything");
    println!("  fg / bg  simulate the app coming to the foreground / background");
    println!("  status   show session statistics");
    println!("  quit     exit");
    println!();
}

fn cmd_config(init: bool) -> anyhow::Result<()> {
    let path = Config::config_path();

    if init {
        if path.exists() {
            println!("Config already exists at {path:?}");
        } else {
            Config::default()
                .save()
                .context("writing default configuration")?;
            println!("Wrote default configuration to {path:?}");
        }
        println!();
    }

    let config = Config::load().context("loading configuration")?;

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {path:?}");
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Terminal stand-in for a haptic engine: rings the bell.
struct TerminalHaptics;

impl Haptics for TerminalHaptics {
    fn play(&mut self, cue: Cue) {
        tracing::info!(?cue, "haptic cue");
        let mut stderr = std::io::stderr();
        let _ = stderr.write_all(b"\x07");
        let _ = stderr.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heartlive::config::MockConfig;
    use std::time::Instant;

    fn idle_runtime() -> Runtime {
        let sensor = MockSensor::manual(MockGenerator::seeded(MockConfig::default(), 1));
        Runtime::spawn(HeartRateModel::new(sensor, 24))
    }

    #[test]
    fn test_shutdown_while_waiting_for_authorization() {
        let runtime = idle_runtime();
        let handle = runtime.handle();
        let started = Instant::now();
        let waiter = thread::spawn(move || start_when_authorized(&handle));

        thread::sleep(Duration::from_millis(50));
        runtime.shutdown().unwrap();

        assert!(waiter.join().unwrap().is_ok());
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_wait_after_loop_stopped() {
        let runtime = idle_runtime();
        let handle = runtime.handle();
        runtime.shutdown().unwrap();

        assert!(start_when_authorized(&handle).is_ok());
    }

    #[test]
    fn test_starts_once_authorized() {
        let runtime = idle_runtime();
        let updates = runtime.subscribe().unwrap();
        runtime.send(Intent::RequestAuth).unwrap();
        start_when_authorized(&runtime.handle()).unwrap();

        let running = updates
            .iter()
            .find(|s| s.session == heartlive::SessionState::Running)
            .unwrap();
        assert_eq!(running.recent_bpm.len(), 1);
        runtime.shutdown().unwrap();
    }
}
