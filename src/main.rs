// src/main.rs
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pose_challenge::recorder::record_moves;
use pose_challenge::{
    start_session, ChallengeEngine, EngineEvent, GameConfig, PlaylistSource, ReplayPoseSource,
    ScoreExporter, SessionTiming,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

/// Headless driver for the pose challenge game.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(after_help = r#"Examples:
    pose_challenge play dancing_queen recording.json
    pose_challenge play moves/custom.json recording.json --config game.json
    pose_challenge record recording.json moves/mine.json --moves 12"#)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Play a playlist against a recorded pose stream
    Play(PlayArgs),
    /// Capture one pose per round from a recording into a playlist
    Record(RecordArgs),
}

#[derive(Args, Debug)]
struct PlayArgs {
    /// Playlist file, or the name of a catalog entry
    playlist: String,

    /// Recorded frames to use as the live pose stream
    recording: PathBuf,

    /// Game configuration (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory for rounds.csv and summary.json [default: from config]
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct RecordArgs {
    /// Recorded frames to sample
    recording: PathBuf,

    /// Where to write the playlist
    output: PathBuf,

    /// Number of dance moves to capture
    #[arg(short, long, default_value_t = 8)]
    moves: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Play(args) => play(args).await,
        Commands::Record(args) => record(args).await,
    }
}

async fn play(args: PlayArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => GameConfig::load(path)?,
        None => GameConfig::default(),
    };

    let playlist = PlaylistSource::from_arg(&args.playlist)
        .load(&config)
        .with_context(|| format!("Failed to load playlist '{}'", args.playlist))?;

    let timing = SessionTiming::from_config(&config);
    let output_dir = args.output.unwrap_or_else(|| config.output_dir.clone());
    let engine = ChallengeEngine::new(config, playlist);
    let source = ReplayPoseSource::from_file(&args.recording);

    let mut session = start_session(engine, source, timing)
        .await
        .context("Failed to start session")?;

    println!("Get ready! The first move starts in {:.1}s", timing.setup_delay.as_secs_f64());
    while let Some(event) = session.next_event().await {
        match event {
            EngineEvent::ScoreFeedback { outcome, delta, message } => {
                println!("{message} ({delta:+}, {outcome:?})");
            }
            EngineEvent::CountdownTick { seconds_remaining } => debug!("{}s", seconds_remaining),
            EngineEvent::CalibrationStatus { phase } => info!("Calibration: {:?}", phase),
            EngineEvent::SessionComplete { final_score, message } => {
                println!("\nFinal score: {final_score}\n{message}");
            }
        }
    }

    let report = session.wait().await?;
    let exporter = ScoreExporter::new(&output_dir, None);
    let (csv_path, summary_path) = exporter.export(&report)?;
    println!("Rounds saved to {}", csv_path.display());
    println!("Summary saved to {}", summary_path.display());

    Ok(())
}

async fn record(args: RecordArgs) -> Result<()> {
    // One captured pose per round
    let config = GameConfig::default();
    let interval = Duration::from_millis(config.tick_period_ms * u64::from(config.ticks_per_round));

    let source = ReplayPoseSource::from_file(&args.recording);
    let playlist = record_moves(source, args.moves, interval).await?;
    playlist
        .save(&args.output)
        .with_context(|| format!("Failed to save playlist to {}", args.output.display()))?;

    println!("Recorded {} moves to {}", playlist.len(), args.output.display());
    Ok(())
}
