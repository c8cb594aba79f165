//! courtside CLI: run the field controller against a camera or a replayed
//! frame directory.

use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use courtside::capture::{CaptureBackend, ReplayBackend, ReplayCamera};
use courtside::link::{MemoryBackend, SerialBackend, SerialPortBackend};
use courtside::{
    AllDetections, Camp, DetectionLoop, LargestArea, ReconfigurationCoordinator,
    ReconfigureReport, SharedPipeline, SystemConfig,
};
use crossbeam_channel::select;
use log::LevelFilter;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "courtside")]
#[command(about = "Track two camps' vehicles on a court and stream their poses over serial")]
#[command(version)]
struct Cli {
    /// Path to the JSON configuration snapshot.
    #[arg(long)]
    config: PathBuf,

    /// Replay the images in this directory instead of opening a camera.
    #[arg(long)]
    replay: Option<PathBuf>,

    /// Delay between replayed frames, in milliseconds.
    #[arg(long, default_value = "33")]
    replay_interval_ms: u64,

    /// Write poses to in-memory ports instead of serial devices.
    #[arg(long)]
    dry_run: bool,

    /// Send every detection instead of only the largest per camp.
    #[arg(long)]
    all_detections: bool,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Stop after this many processed frames.
    #[arg(long)]
    max_frames: Option<u64>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

enum Command {
    Reload,
    Quit,
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_logging(level: LogLevel) -> CliResult<()> {
    #[cfg(feature = "tracing")]
    {
        courtside::core::init_tracing(level.into(), false);
    }
    #[cfg(not(feature = "tracing"))]
    courtside::core::init_with_level(level.into())?;
    Ok(())
}

fn run(cli: Cli) -> CliResult<()> {
    init_logging(cli.log_level)?;

    let config = load(&cli.config)?;
    let capture = capture_backend(&cli, &config)?;
    let memory = cli.dry_run.then(MemoryBackend::new);
    let serial: Arc<dyn SerialBackend> = match &memory {
        Some(memory) => {
            add_ports(memory, &config);
            Arc::new(memory.clone())
        }
        None => Arc::new(SerialPortBackend::default()),
    };

    let pipeline = Arc::new(SharedPipeline::new());
    let coordinator = Arc::new(ReconfigurationCoordinator::new(
        pipeline.clone(),
        capture,
        serial,
    ));
    print_report(&coordinator.apply(config))?;

    let mut detection = DetectionLoop::new(pipeline.clone());
    if cli.all_detections {
        detection = detection.with_selector(AllDetections);
    } else {
        detection = detection.with_selector(LargestArea);
    }
    if let Some(max) = cli.max_frames {
        detection = detection.with_max_frames(max);
    }
    let stop = detection.stop_flag();
    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    std::thread::spawn(move || {
        let _ = done_tx.send(detection.run());
    });
    // Holding a sender keeps `commands` open after stdin reaches EOF.
    let (command_tx, commands) = crossbeam_channel::unbounded();
    spawn_stdin_reader(command_tx.clone());

    let outcome = loop {
        select! {
            recv(done_rx) -> result => break result?,
            recv(commands) -> cmd => match cmd {
                Ok(Command::Reload) => match load(&cli.config) {
                    Ok(config) => {
                        if let Some(memory) = &memory {
                            add_ports(memory, &config);
                        }
                        let report = coordinator.spawn_apply(config).recv()?;
                        print_report(&report)?;
                    }
                    Err(e) => log::error!("reload failed: {e}"),
                },
                Ok(Command::Quit) => {
                    stop.raise();
                    break done_rx.recv()?;
                }
                Err(_) => {}
            },
        }
    };

    if let Some(memory) = &memory {
        if let Some(config) = pipeline.config() {
            for camp in Camp::ALL {
                let port = &config.vehicle(camp).serial_port;
                if !port.is_empty() {
                    let bytes = memory.written(port);
                    log::info!(
                        "dry run: {camp} wrote {} line(s) to {port}",
                        bytes.iter().filter(|b| **b == b'\n').count()
                    );
                }
            }
        }
    }
    pipeline.shutdown();
    drop(command_tx);

    let stats = outcome?;
    log::info!(
        "{} frame(s), {} pose(s) sent, {} transient error(s)",
        stats.frames,
        stats.poses_sent,
        stats.transient_errors
    );
    Ok(())
}

fn load(path: &Path) -> CliResult<Arc<SystemConfig>> {
    Ok(Arc::new(courtside::io::load_config(path)?))
}

fn add_ports(memory: &MemoryBackend, config: &SystemConfig) {
    for camp in Camp::ALL {
        let port = &config.vehicle(camp).serial_port;
        if !port.is_empty() {
            memory.add_port(port);
        }
    }
}

fn capture_backend(cli: &Cli, config: &SystemConfig) -> CliResult<Arc<dyn CaptureBackend>> {
    if let Some(dir) = &cli.replay {
        let camera = ReplayCamera::from_dir(dir)?
            .with_interval(Duration::from_millis(cli.replay_interval_ms));
        return Ok(Arc::new(
            ReplayBackend::new().with_camera(config.camera, camera),
        ));
    }
    live_backend()
}

#[cfg(feature = "opencv")]
fn live_backend() -> CliResult<Arc<dyn CaptureBackend>> {
    Ok(Arc::new(courtside::capture::OpenCvBackend))
}

#[cfg(not(feature = "opencv"))]
fn live_backend() -> CliResult<Arc<dyn CaptureBackend>> {
    Err("no live camera support in this build (enable the `opencv` feature or pass --replay)".into())
}

fn spawn_stdin_reader(tx: crossbeam_channel::Sender<Command>) {
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let cmd = match line.trim() {
                "reload" => Command::Reload,
                "quit" | "exit" => Command::Quit,
                "" => continue,
                other => {
                    log::warn!("unknown command {other:?} (expected `reload` or `quit`)");
                    continue;
                }
            };
            if tx.send(cmd).is_err() {
                break;
            }
        }
    });
}

fn print_report(report: &ReconfigureReport) -> CliResult<()> {
    println!("{}", serde_json::to_string(&report.summary())?);
    Ok(())
}
