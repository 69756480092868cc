// Library interface for spotter
// This allows integration tests to access internal modules

pub mod config;
pub mod errors;
pub mod vision;
pub mod workout;
pub mod writer;

// Re-export commonly used types
pub use errors::SpotterError;
pub use vision::{Frame, FrameSource, PositionClassifier};
pub use workout::{
    ExerciseKind, PositionLabel, RepCounter, SessionOutput, SessionSnapshot, WorkoutSession,
};
