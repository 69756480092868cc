// Error types for spotter

use crate::workout::SessionOutput;
use snafu::Snafu;
use std::{io, sync::mpsc::SendError};

#[derive(Debug, Snafu)]
pub enum SpotterError {
    // Errors for the frame source
    #[snafu(display("Frame spool directory not found: {path}"))]
    NoFrameDir { path: String },
    #[snafu(display("Error reading frame from the frame source"))]
    FrameReadError { source: io::Error },
    #[snafu(display("No frame available from the frame source"))]
    NoFrameAvailable,

    // Errors for the remote classifier; none of these cross the adapter
    // boundary, they all degrade to a Neutral label before the counter sees them
    #[snafu(display("Could not build the classifier runtime"))]
    ClassifierRuntimeError { source: io::Error },
    #[snafu(display("Classifier request failed"))]
    ClassifierRequestError { source: reqwest::Error },
    #[snafu(display("Unusable classifier response: {description}"))]
    ClassifierResponseError { description: String },

    // Errors while broadcasting session events
    #[snafu(display("Error broadcasting session event"))]
    SessionBroadcastError {
        source: Box<SendError<SessionOutput>>,
    },

    // Errors for the session writer
    #[snafu(display("Error writing session file"))]
    WriterError { source: io::Error },

    // Config management errors
    #[snafu(display("Could not find application data directory to save config file"))]
    NoConfigDir,
    #[snafu(display("Error writing config file"))]
    ConfigIOError { source: io::Error },
    #[snafu(display("Error serializing config file"))]
    ConfigSerializeError { source: serde_json::Error },

    // Replay errors
    #[snafu(display("Invalid session file: {path}"))]
    InvalidSessionFile { path: String },
    #[snafu(display("Error loading session file"))]
    SessionLoaderError { source: io::Error },
}

impl From<SendError<SessionOutput>> for SpotterError {
    fn from(value: SendError<SessionOutput>) -> Self {
        SpotterError::SessionBroadcastError {
            source: Box::new(value),
        }
    }
}
