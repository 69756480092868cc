pub(crate) mod counter;
pub(crate) mod replay;
pub(crate) mod sampler;

pub use counter::RepCounter;
pub use replay::{ReplaySummary, replay_session};
pub use sampler::{SamplerSettings, WorkoutSession};

use serde::{Deserialize, Serialize};

/// The movement being tracked. The classifier interprets "up" and "down"
/// differently per exercise (torso-to-floor distance for push-ups, hip-to-knee
/// relation for squats); the counter only ever sees the resulting label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExerciseKind {
    Pushup,
    Squat,
    Situp,
    PullUp,
}

impl ExerciseKind {
    /// Identifier sent to the classifier endpoint.
    pub fn slug(&self) -> &'static str {
        match self {
            ExerciseKind::Pushup => "pushup",
            ExerciseKind::Squat => "squat",
            ExerciseKind::Situp => "situp",
            ExerciseKind::PullUp => "pullup",
        }
    }
}

impl std::fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExerciseKind::Pushup => write!(f, "Push-ups"),
            ExerciseKind::Squat => write!(f, "Squats"),
            ExerciseKind::Situp => write!(f, "Sit-ups"),
            ExerciseKind::PullUp => write!(f, "Pull-ups"),
        }
    }
}

impl std::str::FromStr for ExerciseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "").as_str() {
            "pushup" | "pushups" => Ok(ExerciseKind::Pushup),
            "squat" | "squats" => Ok(ExerciseKind::Squat),
            "situp" | "situps" => Ok(ExerciseKind::Situp),
            "pullup" | "pullups" => Ok(ExerciseKind::PullUp),
            other => Err(format!("Unknown exercise: {}", other)),
        }
    }
}

/// Coarse body-position classification of a single frame. Produced only by the
/// classifier adapter, never inferred by the counter itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionLabel {
    Up,
    Down,
    /// Also what every classifier failure degrades to.
    Neutral,
}

impl std::fmt::Display for PositionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PositionLabel::Up => write!(f, "up"),
            PositionLabel::Down => write!(f, "down"),
            PositionLabel::Neutral => write!(f, "neutral"),
        }
    }
}

/// Session metadata emitted whenever the selection or cadence changes and
/// written at the head of session recordings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    pub exercise: Option<ExerciseKind>,
    pub sample_interval_ms: u64,
    pub cooldown_ms: u64,
}

/// One processed sampling tick.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SampleRecord {
    pub sample_no: usize,
    /// Milliseconds since the epoch when the frame was captured
    pub timestamp_ms: u128,
    /// Label the classifier produced for the frame
    pub label: PositionLabel,
    /// Whether this tick counted a repetition
    pub rep_counted: bool,
    /// Running count after the tick was applied
    pub rep_count: u32,
    pub cooldown_active: bool,
    pub feedback: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum SessionOutput {
    SessionChange(SessionInfo),
    Sample(Box<SampleRecord>),
}

/// Read-only view of the counter for the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub exercise: Option<ExerciseKind>,
    pub rep_count: u32,
    pub last_position: PositionLabel,
    pub cooldown_active: bool,
    pub is_running: bool,
    pub feedback: String,
}
