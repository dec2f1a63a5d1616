use clap::{Args, Parser, Subcommand};
use ppg_pulse::config::Config;
use ppg_pulse::recorder::{read_recording, CsvRecorder, RecordedRow};
use ppg_pulse::replay;
use ppg_pulse::tap::TapEstimator;
use std::path::PathBuf;
use std::time::Duration;

/// Offline heart-rate analysis of camera PPG recordings
#[derive(Debug, Parser)]
#[command(name = "ppg-pulse", version, args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    replay: ReplayArgs,
}

#[derive(Debug, Args)]
struct ReplayArgs {
    /// CSV recording (time,red,green,blue,quality)
    recording: Option<PathBuf>,

    /// Samples analysed by each periodic estimate
    #[arg(long)]
    window: Option<usize>,

    /// Period of the real-time estimate in recording time
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Only compute the session-end estimate
    #[arg(long)]
    final_only: bool,

    /// Write the analysed samples with recomputed quality to a new
    /// recording in the configured recording directory
    #[arg(long)]
    record: bool,

    /// Settings file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Heart rate from tap timestamps in milliseconds
    Taps {
        #[arg(required = true)]
        times: Vec<u64>,
    },
    /// Print the settings file location and contents
    Config,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Command::Taps { times }) => run_taps(&times),
        Some(Command::Config) => {
            let path = Config::config_path();
            let config = Config::load_from(&path)?;
            println!("# {}", path.display());
            print!("{}", toml::to_string_pretty(&config)?);
            Ok(())
        }
        None => run_replay(cli.replay),
    }
}

fn run_replay(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let Some(recording) = args.recording else {
        return Err("no recording given (see --help)".into());
    };

    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let mut session_config = config.session();
    if let Some(window) = args.window {
        session_config.realtime_window = window.max(1);
    }
    if let Some(interval_ms) = args.interval_ms {
        session_config.update_interval = Duration::from_millis(interval_ms.max(1));
    }

    log::info!("Replaying {}", recording.display());
    let rows = read_recording(&recording)?;
    let recorder = CsvRecorder::new();
    if args.record {
        recorder.start_recording(config.recording_dir())?;
    }

    let report = replay::replay_into(
        rows.iter().map(RecordedRow::to_sample),
        &session_config,
        args.final_only,
        Some(&recorder),
    );

    println!("{}", report);
    if let Some(path) = recorder.stop_recording()? {
        println!("Recorded to {}", path.display());
    }
    Ok(())
}

fn run_taps(times: &[u64]) -> Result<(), Box<dyn std::error::Error>> {
    let mut taps = TapEstimator::new();
    for &time in times {
        taps.tick(time);
        match taps.tap(time) {
            Some(bpm) => println!("{:>8} ms  {} BPM", time, bpm),
            None => println!("{:>8} ms  --", time),
        }
    }
    Ok(())
}
