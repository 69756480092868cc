use super::{ExerciseKind, PositionLabel, SessionSnapshot};

/// The rep-detection state machine.
///
/// Consumes one position label per completed classification and turns the noisy
/// stream into a debounced, monotonically increasing repetition count. A rep is
/// counted only on a down-to-up edge; a short cooldown after every counted rep
/// absorbs classifier flicker around the top of the movement.
///
/// The counter itself is synchronous and single-writer. `WorkoutSession` wraps
/// it in a mutex and drives it from the sampling thread; two version counters
/// keep stale async work from touching a newer session:
///
/// * `generation` changes whenever sampling is invalidated (stop, reset, new
///   exercise). The sampling thread only applies a classification result that
///   still matches the generation it was issued under.
/// * `cooldown_epoch` changes whenever the cooldown flag is armed or wiped, so
///   a pending cooldown-clear timer cannot release a cooldown armed by a later
///   run.
pub struct RepCounter {
    selected_exercise: Option<ExerciseKind>,
    rep_count: u32,
    last_position: PositionLabel,
    cooldown_active: bool,
    cooldown_epoch: u64,
    running: bool,
    generation: u64,
    feedback: String,
}

impl Default for RepCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl RepCounter {
    pub fn new() -> Self {
        Self {
            selected_exercise: None,
            rep_count: 0,
            last_position: PositionLabel::Neutral,
            cooldown_active: false,
            cooldown_epoch: 0,
            running: false,
            generation: 0,
            feedback: "Select an exercise to begin.".to_string(),
        }
    }

    /// Switch the tracked movement. Stops a running session and resets the
    /// count, the last observed position, and the cooldown.
    pub fn select_exercise(&mut self, kind: ExerciseKind) {
        self.halt_sampling();
        self.wipe_progress();
        self.selected_exercise = Some(kind);
        self.feedback = format!("Tracking {}. Start when you're in position.", kind);
    }

    /// Begin counting. Rejected with user-facing feedback when no exercise is
    /// selected or the session is already running; returns whether sampling
    /// should begin.
    pub fn start(&mut self) -> bool {
        if self.running {
            self.feedback = "Already counting.".to_string();
            return false;
        }
        let Some(exercise) = self.selected_exercise else {
            self.feedback = "Pick an exercise before starting.".to_string();
            return false;
        };
        self.running = true;
        self.feedback = format!("Counting {}. Get moving!", exercise);
        true
    }

    /// Pause counting. The count and any pending cooldown survive; a
    /// classification still in flight is discarded by the generation bump.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.halt_sampling();
        self.feedback = "Paused. Start again when you're ready.".to_string();
    }

    /// Zero the count and clear position/cooldown state. Unlike
    /// `select_exercise` the current exercise is preserved.
    pub fn reset(&mut self) {
        self.halt_sampling();
        self.wipe_progress();
        self.feedback = "Count reset to zero.".to_string();
    }

    /// Apply one classified label. Returns whether a repetition was counted on
    /// this tick.
    pub fn apply_label(&mut self, label: PositionLabel) -> bool {
        self.feedback = match label {
            PositionLabel::Up => "In the up position.".to_string(),
            PositionLabel::Down => "In the down position.".to_string(),
            PositionLabel::Neutral => "No clear position, keep your body in frame.".to_string(),
        };

        // cooldown suppresses counting but not position tracking
        if self.cooldown_active {
            self.last_position = label;
            return false;
        }

        let counted =
            self.last_position == PositionLabel::Down && label == PositionLabel::Up;
        if counted {
            self.rep_count += 1;
            self.cooldown_active = true;
            self.cooldown_epoch += 1;
            self.feedback = format!("Rep {}! Keep it up.", self.rep_count);
        }
        self.last_position = label;
        counted
    }

    /// Release the cooldown armed under `epoch`. A stale epoch is ignored so a
    /// slow timer cannot release a cooldown that belongs to a later run.
    pub fn clear_cooldown(&mut self, epoch: u64) {
        if self.cooldown_active && self.cooldown_epoch == epoch {
            self.cooldown_active = false;
        }
    }

    /// Whether a sample issued under `generation` may still be applied.
    pub fn accepts_generation(&self, generation: u64) -> bool {
        self.running && self.generation == generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn cooldown_epoch(&self) -> u64 {
        self.cooldown_epoch
    }

    pub fn cooldown_active(&self) -> bool {
        self.cooldown_active
    }

    pub fn selected_exercise(&self) -> Option<ExerciseKind> {
        self.selected_exercise
    }

    pub fn rep_count(&self) -> u32 {
        self.rep_count
    }

    pub fn last_position(&self) -> PositionLabel {
        self.last_position
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            exercise: self.selected_exercise,
            rep_count: self.rep_count,
            last_position: self.last_position,
            cooldown_active: self.cooldown_active,
            is_running: self.running,
            feedback: self.feedback.clone(),
        }
    }

    fn halt_sampling(&mut self) {
        if self.running {
            self.running = false;
        }
        // invalidate any classification still in flight
        self.generation += 1;
    }

    fn wipe_progress(&mut self) {
        self.rep_count = 0;
        self.last_position = PositionLabel::Neutral;
        self.cooldown_active = false;
        self.cooldown_epoch += 1;
    }
}
