use std::collections::HashMap;
use std::path::Path;

use itertools::Itertools;
use serde_jsonlines::json_lines;

use crate::SpotterError;

use super::counter::RepCounter;
use super::{ExerciseKind, PositionLabel, SessionOutput};

/// Result of re-running a recorded session through a fresh counter.
#[derive(Clone, Debug)]
pub struct ReplaySummary {
    pub exercise: Option<ExerciseKind>,
    pub sample_count: usize,
    /// Count produced by replaying the recorded labels
    pub final_rep_count: u32,
    /// Count the live session had recorded on its last sample
    pub recorded_rep_count: u32,
    /// How many labels of each kind the classifier produced
    pub label_counts: HashMap<PositionLabel, usize>,
    /// Samples where the replayed count disagreed with the recording
    pub mismatches: usize,
}

impl std::fmt::Display for ReplaySummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let exercise = self
            .exercise
            .map(|e| e.to_string())
            .unwrap_or_else(|| "No exercise".to_string());
        writeln!(f, "{}: {} reps over {} samples", exercise, self.final_rep_count, self.sample_count)?;
        for label in [PositionLabel::Up, PositionLabel::Down, PositionLabel::Neutral] {
            writeln!(
                f,
                "  {} labels: {}",
                label,
                self.label_counts.get(&label).copied().unwrap_or(0)
            )?;
        }
        if self.mismatches > 0 {
            writeln!(
                f,
                "  WARNING: {} samples disagree with the recorded count (recorded {})",
                self.mismatches, self.recorded_rep_count
            )?;
        }
        Ok(())
    }
}

/// Re-run a recorded session file through the transition rule.
///
/// The recording carries enough state per sample to reconstruct when the live
/// cooldown timer fired between ticks, so a replay counts exactly the reps the
/// live session counted; any disagreement is reported as a mismatch and points
/// at a recording produced by a different version of the counting rule.
///
/// # Errors
///
/// Returns an error if the file is missing or a line cannot be parsed.
pub fn replay_session(path: &Path) -> Result<ReplaySummary, SpotterError> {
    if !path.exists() {
        return Err(SpotterError::InvalidSessionFile {
            path: format!("{}", path.display()),
        });
    }

    let lines = json_lines::<SessionOutput, _>(path)
        .map_err(|e| SpotterError::SessionLoaderError { source: e })?;

    let mut counter = RepCounter::new();
    let mut labels: Vec<PositionLabel> = Vec::new();
    let mut recorded_rep_count = 0u32;
    let mut mismatches = 0usize;

    for line in lines {
        let output = line.map_err(|e| SpotterError::SessionLoaderError { source: e })?;
        match output {
            SessionOutput::SessionChange(info) => {
                // a selection resets the count mid-recording exactly as it
                // did live, even when the same exercise is picked again
                if let Some(exercise) = info.exercise {
                    counter.select_exercise(exercise);
                }
            }
            SessionOutput::Sample(sample) => {
                // reconstruct the cooldown state the live tick entered with:
                // a counted rep can only happen with the cooldown released,
                // otherwise the recorded flag is exactly the entering state
                let cooldown_entering = if sample.rep_counted {
                    false
                } else {
                    sample.cooldown_active
                };
                if counter.cooldown_active() && !cooldown_entering {
                    counter.clear_cooldown(counter.cooldown_epoch());
                }

                counter.apply_label(sample.label);
                labels.push(sample.label);
                recorded_rep_count = sample.rep_count;
                if counter.rep_count() != sample.rep_count {
                    mismatches += 1;
                }
            }
        }
    }

    Ok(ReplaySummary {
        exercise: counter.selected_exercise(),
        sample_count: labels.len(),
        final_rep_count: counter.rep_count(),
        recorded_rep_count,
        label_counts: labels.into_iter().counts(),
        mismatches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workout::{SampleRecord, SessionInfo};
    use std::io::Write;

    fn sample(
        sample_no: usize,
        label: PositionLabel,
        rep_counted: bool,
        rep_count: u32,
        cooldown_active: bool,
    ) -> SessionOutput {
        SessionOutput::Sample(Box::new(SampleRecord {
            sample_no,
            timestamp_ms: (sample_no * 1000) as u128,
            label,
            rep_counted,
            rep_count,
            cooldown_active,
            feedback: String::new(),
        }))
    }

    fn write_session_file(outputs: &[SessionOutput]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for output in outputs {
            writeln!(file, "{}", serde_json::to_string(output).unwrap()).unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_replay_matches_recorded_counts() {
        let file = write_session_file(&[
            SessionOutput::SessionChange(SessionInfo {
                exercise: Some(ExerciseKind::Pushup),
                sample_interval_ms: 1000,
                cooldown_ms: 500,
            }),
            sample(1, PositionLabel::Neutral, false, 0, false),
            sample(2, PositionLabel::Down, false, 0, false),
            // rep counted, cooldown armed and released before the next tick
            sample(3, PositionLabel::Up, true, 1, true),
            sample(4, PositionLabel::Down, false, 1, false),
            sample(5, PositionLabel::Up, true, 2, true),
        ]);

        let summary = replay_session(file.path()).unwrap();
        assert_eq!(summary.exercise, Some(ExerciseKind::Pushup));
        assert_eq!(summary.sample_count, 5);
        assert_eq!(summary.final_rep_count, 2);
        assert_eq!(summary.recorded_rep_count, 2);
        assert_eq!(summary.mismatches, 0);
        assert_eq!(summary.label_counts.get(&PositionLabel::Up), Some(&2));
        assert_eq!(summary.label_counts.get(&PositionLabel::Down), Some(&2));
        assert_eq!(summary.label_counts.get(&PositionLabel::Neutral), Some(&1));
    }

    #[test]
    fn test_replay_respects_recorded_cooldown() {
        let file = write_session_file(&[
            SessionOutput::SessionChange(SessionInfo {
                exercise: Some(ExerciseKind::Squat),
                sample_interval_ms: 200,
                cooldown_ms: 500,
            }),
            sample(1, PositionLabel::Down, false, 0, false),
            sample(2, PositionLabel::Up, true, 1, true),
            // flicker inside the live cooldown window did not count
            sample(3, PositionLabel::Down, false, 1, true),
            sample(4, PositionLabel::Up, false, 1, true),
        ]);

        let summary = replay_session(file.path()).unwrap();
        assert_eq!(summary.final_rep_count, 1);
        assert_eq!(summary.mismatches, 0);
    }

    #[test]
    fn test_replay_flags_divergent_recording() {
        let file = write_session_file(&[
            SessionOutput::SessionChange(SessionInfo {
                exercise: Some(ExerciseKind::Situp),
                sample_interval_ms: 1000,
                cooldown_ms: 500,
            }),
            // a recording claiming a rep on an up-up pair cannot be reproduced
            sample(1, PositionLabel::Up, false, 0, false),
            sample(2, PositionLabel::Up, true, 1, true),
        ]);

        let summary = replay_session(file.path()).unwrap();
        assert_eq!(summary.final_rep_count, 0);
        assert_eq!(summary.recorded_rep_count, 1);
        assert!(summary.mismatches > 0);
    }

    #[test]
    fn test_replay_missing_file() {
        let result = replay_session(Path::new("/no/such/session.jsonl"));
        assert!(matches!(
            result,
            Err(SpotterError::InvalidSessionFile { .. })
        ));
    }
}
