use std::time::Duration;

use log::warn;
use reqwest::Client;

use crate::errors::SpotterError;
use crate::workout::{ExerciseKind, PositionLabel};

use super::Frame;

const DEFAULT_REQUEST_TIMEOUT_S: u64 = 10;

/// Maps a frame to a coarse body-position label for the selected exercise.
///
/// Implementations never fail: the counting loop must keep ticking no matter
/// how unreliable the upstream signal is, so any internal failure degrades to
/// `PositionLabel::Neutral` instead of surfacing.
pub trait PositionClassifier {
    fn classify(&mut self, frame: &Frame, exercise: ExerciseKind) -> PositionLabel;
}

/// Classifies frames through a remote pose-inference endpoint.
///
/// Posts the raw frame bytes to `<endpoint>/classify` with the exercise slug as
/// a query parameter and expects a JSON body of the form
/// `{"position": "up" | "down" | "neutral"}`. The request carries its own
/// timeout; a hung endpoint resolves as a failed classification rather than a
/// stalled session.
pub struct RemoteClassifier {
    endpoint: String,
    client: Client,
    runtime: tokio::runtime::Runtime,
    request_timeout: Duration,
}

impl RemoteClassifier {
    /// Create a classifier against an inference endpoint base URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the async runtime driving the HTTP client cannot be
    /// built.
    pub fn new(endpoint: &str) -> Result<Self, SpotterError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| SpotterError::ClassifierRuntimeError { source: e })?;

        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: Client::new(),
            runtime,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_S),
        })
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    fn request_label(
        &self,
        frame: &Frame,
        exercise: ExerciseKind,
    ) -> Result<PositionLabel, SpotterError> {
        let url = format!("{}/classify", self.endpoint);

        let response = self
            .runtime
            .block_on(
                self.client
                    .post(&url)
                    .query(&[("exercise", exercise.slug())])
                    .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                    .body(frame.bytes.clone())
                    .timeout(self.request_timeout)
                    .send(),
            )
            .map_err(|e| SpotterError::ClassifierRequestError { source: e })?;

        if !response.status().is_success() {
            return Err(SpotterError::ClassifierResponseError {
                description: format!("endpoint returned {}", response.status()),
            });
        }

        let body: serde_json::Value = self
            .runtime
            .block_on(response.json())
            .map_err(|e| SpotterError::ClassifierRequestError { source: e })?;

        let raw = body["position"]
            .as_str()
            .ok_or_else(|| SpotterError::ClassifierResponseError {
                description: "no position field in response".to_string(),
            })?;

        parse_label(raw).ok_or_else(|| SpotterError::ClassifierResponseError {
            description: format!("unrecognized position label: {}", raw),
        })
    }
}

impl PositionClassifier for RemoteClassifier {
    fn classify(&mut self, frame: &Frame, exercise: ExerciseKind) -> PositionLabel {
        match self.request_label(frame, exercise) {
            Ok(label) => label,
            Err(e) => {
                warn!("Classification failed, treating frame as neutral: {}", e);
                PositionLabel::Neutral
            }
        }
    }
}

fn parse_label(raw: &str) -> Option<PositionLabel> {
    match raw.trim().to_lowercase().as_str() {
        "up" => Some(PositionLabel::Up),
        "down" => Some(PositionLabel::Down),
        "neutral" => Some(PositionLabel::Neutral),
        _ => None,
    }
}

/// A scripted classifier for tests and offline replay.
///
/// Replays a fixed label sequence regardless of the frames it is handed; once
/// the script runs out every call resolves to `Neutral`, the same shape a
/// failing live classifier would produce.
pub struct ScriptedClassifier {
    cur_tick: usize,
    labels: Vec<PositionLabel>,
}

impl ScriptedClassifier {
    pub fn from_labels(labels: Vec<PositionLabel>) -> Self {
        Self {
            cur_tick: 0,
            labels,
        }
    }
}

impl PositionClassifier for ScriptedClassifier {
    fn classify(&mut self, _frame: &Frame, _exercise: ExerciseKind) -> PositionLabel {
        let label = self
            .labels
            .get(self.cur_tick)
            .copied()
            .unwrap_or(PositionLabel::Neutral);
        self.cur_tick += 1;
        label
    }
}
