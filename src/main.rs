//! Smoke Annotator command line: replays recorded editor events through an
//! annotation session and prints the resulting annotation.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use smoke_annotator::{
    AnnotationSession, EditorEvent, EngineConfig, SequenceAnnotation, parse_predictions,
};

#[derive(Parser, Debug)]
#[command(
    name = "smoke-annotator",
    version,
    about = "Replay bounding-box annotation sessions for wildfire smoke detections"
)]
struct Cli {
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a JSON list of editor events and print the resulting annotation
    Replay {
        /// JSON array of editor events
        events: PathBuf,
        /// JSON array of model predictions to offer for import
        #[arg(long)]
        predictions: Option<PathBuf>,
        /// Previously saved annotation to start from
        #[arg(long)]
        payload: Option<PathBuf>,
        /// Write the final annotation here as well
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the default configuration
    DefaultConfig,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();

    match cli.command {
        Commands::Replay {
            events,
            predictions,
            payload,
            output,
        } => command_replay(
            config,
            &events,
            predictions.as_deref(),
            payload.as_deref(),
            output.as_deref(),
        ),
        Commands::DefaultConfig => {
            println!("{}", EngineConfig::default().to_json()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load_from_path(path)
            .with_context(|| format!("failed to load config {}", path.display())),
        None => Ok(EngineConfig::load_from_default_path().unwrap_or_default()),
    }
}

fn command_replay(
    config: EngineConfig,
    events_path: &Path,
    predictions_path: Option<&Path>,
    payload_path: Option<&Path>,
    output_path: Option<&Path>,
) -> Result<()> {
    let raw = std::fs::read_to_string(events_path)
        .with_context(|| format!("failed to read {}", events_path.display()))?;
    let events: Vec<EditorEvent> = serde_json::from_str(&raw)
        .with_context(|| format!("invalid event list in {}", events_path.display()))?;

    let mut session = AnnotationSession::new(config);

    if let Some(path) = payload_path {
        let payload = SequenceAnnotation::load_from_path(path)
            .with_context(|| format!("failed to load annotation {}", path.display()))?;
        session.load_payload(&payload)?;
    }

    if let Some(path) = predictions_path {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        session.set_predictions(parse_predictions(&json)?);
    }

    log::info!("Replaying {} events", events.len());
    let mut submitted = None;
    for event in events {
        let response = session.apply(event);
        if let Some(submission) = response.submission {
            submitted = Some(submission);
        }
    }

    let payload = session.to_payload();
    if let Some(path) = output_path {
        payload
            .save_to_path(path)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    let validation: Vec<String> = smoke_annotator::progress::validation_messages(
        session.rectangles(),
        session.secondary_review(),
    );
    let report = json!({
        "annotation": payload,
        "progress": session.progress(),
        "revision": session.revision(),
        "importable_predictions": session.importable_count(),
        "submitted": matches!(submitted, Some(smoke_annotator::Submission::Accepted(_))),
        "validation_errors": validation,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
