use std::{path::PathBuf, sync::mpsc, thread};

use clap::{Parser, Subcommand};
use spotter::SpotterError;
use spotter::config::AppConfig;
use spotter::vision::{DirectoryFrameSource, RemoteClassifier};
use spotter::workout::{ExerciseKind, SessionOutput, WorkoutSession, replay_session};
use spotter::writer;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Count reps live from a frame spool directory
    Live {
        /// Exercise to track: pushup, squat, situp, or pullup
        #[arg(short, long)]
        exercise: ExerciseKind,

        /// Directory the capture tool writes still frames into
        #[arg(short, long)]
        frames: PathBuf,

        /// Classifier inference endpoint; defaults to the configured one
        #[arg(long)]
        endpoint: Option<String>,

        /// Record the session to a JSON-lines file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Replay a recorded session file and print a summary
    Replay {
        #[arg(short, long)]
        input: PathBuf,
    },
}

fn live(
    exercise: ExerciseKind,
    frames: PathBuf,
    endpoint: Option<String>,
    output: Option<PathBuf>,
) -> Result<(), SpotterError> {
    let config = AppConfig::from_local_file().unwrap_or_default();
    let endpoint = endpoint.unwrap_or_else(|| config.classifier_endpoint.clone());

    let (session_tx, session_rx) = mpsc::channel::<SessionOutput>();

    // when recording, the sampler sends to both the terminal and writer channels
    let writer_tx = if let Some(output_file) = output {
        let (writer_tx, writer_rx) = mpsc::channel::<SessionOutput>();
        thread::spawn(move || writer::write_session(&output_file, writer_rx));
        Some(writer_tx)
    } else {
        None
    };

    let session = WorkoutSession::new(
        DirectoryFrameSource::new(frames),
        RemoteClassifier::new(&endpoint)?,
        config.sampler_settings(),
        session_tx,
        writer_tx,
    )?;

    session.select_exercise(exercise);
    if !session.start() {
        println!("{}", session.snapshot().feedback);
        return Ok(());
    }

    for output in &session_rx {
        match output {
            SessionOutput::SessionChange(info) => {
                if let Some(exercise) = info.exercise {
                    println!(
                        "Tracking {}, sampling every {}ms",
                        exercise, info.sample_interval_ms
                    );
                }
            }
            SessionOutput::Sample(sample) => {
                println!(
                    "[{:>4}] reps: {:>3}  {}",
                    sample.sample_no, sample.rep_count, sample.feedback
                );
            }
        }
    }
    Ok(())
}

fn load(input: &PathBuf) -> Result<(), SpotterError> {
    let summary = replay_session(input)?;
    print!("{}", summary);
    Ok(())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let cli = Args::parse();
    ctrlc::set_handler(move || {
        println!("Exiting...");
        std::process::exit(0);
    })
    .expect("Could not set Ctrl-C handler");
    match &cli.command {
        Commands::Replay { input } => {
            load(input).expect("Error while replaying session file");
        }
        Commands::Live {
            exercise,
            frames,
            endpoint,
            output,
        } => live(*exercise, frames.clone(), endpoint.clone(), output.clone())
            .expect("Error while running live session"),
    };
}
