use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use log::{debug, warn};

use crate::SpotterError;
use crate::vision::{FrameSource, PositionClassifier};

use super::counter::RepCounter;
use super::{ExerciseKind, SampleRecord, SessionInfo, SessionOutput, SessionSnapshot};

pub(crate) const DEFAULT_SAMPLE_INTERVAL_MS: u64 = 1000;
pub(crate) const DEFAULT_COOLDOWN_MS: u64 = 500;

/// Cadence of the sampling loop and the debounce window. Both are fixed for
/// the duration of a run; changing them takes effect on the next `start()`.
#[derive(Clone, Debug)]
pub struct SamplerSettings {
    pub sample_interval: Duration,
    pub cooldown: Duration,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            sample_interval: Duration::from_millis(DEFAULT_SAMPLE_INTERVAL_MS),
            cooldown: Duration::from_millis(DEFAULT_COOLDOWN_MS),
        }
    }
}

/// Thread-safe handle around the rep counter and its sampling loop.
///
/// User-facing operations and the sampling thread all funnel through the one
/// mutex-guarded `RepCounter`. `start()` spawns a tick thread that captures the
/// counter's current generation; `stop()`, `reset()`, and `select_exercise()`
/// advance the generation, which both winds the thread down and voids any
/// classification result still in flight. Processed samples are broadcast as
/// `SessionOutput` events to the presentation channel and, when recording, to
/// the writer channel.
pub struct WorkoutSession {
    counter: Arc<Mutex<RepCounter>>,
    frame_source: Arc<Mutex<dyn FrameSource + Send>>,
    classifier: Arc<Mutex<dyn PositionClassifier + Send>>,
    settings: SamplerSettings,
    output_sender: Sender<SessionOutput>,
    writer_sender: Option<Sender<SessionOutput>>,
}

impl WorkoutSession {
    /// Create a session over a frame source and a classifier.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame source fails to start.
    pub fn new(
        mut frame_source: impl FrameSource + Send + 'static,
        classifier: impl PositionClassifier + Send + 'static,
        settings: SamplerSettings,
        output_sender: Sender<SessionOutput>,
        writer_sender: Option<Sender<SessionOutput>>,
    ) -> Result<Self, SpotterError> {
        frame_source.start()?;

        Ok(Self {
            counter: Arc::new(Mutex::new(RepCounter::new())),
            frame_source: Arc::new(Mutex::new(frame_source)),
            classifier: Arc::new(Mutex::new(classifier)),
            settings,
            output_sender,
            writer_sender,
        })
    }

    /// Switch the tracked exercise. Stops a running loop and resets progress.
    pub fn select_exercise(&self, kind: ExerciseKind) {
        let info = {
            let mut state = lock(&self.counter);
            state.select_exercise(kind);
            self.session_info(&state)
        };
        self.broadcast(SessionOutput::SessionChange(info));
    }

    /// Begin the sampling loop. Returns whether the loop actually started;
    /// when it did not (no exercise selected, or already running) the refusal
    /// is reported through the feedback text.
    pub fn start(&self) -> bool {
        let generation = {
            let mut state = lock(&self.counter);
            if !state.start() {
                return false;
            }
            state.generation()
        };

        self.spawn_sampler(generation);
        true
    }

    /// Pause the sampling loop. A classification already in flight resolves
    /// into a dead generation and is discarded.
    pub fn stop(&self) {
        lock(&self.counter).stop();
    }

    /// Zero the count, keep the exercise selection, stop sampling.
    pub fn reset(&self) {
        lock(&self.counter).reset();
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.counter).snapshot()
    }

    fn session_info(&self, state: &RepCounter) -> SessionInfo {
        SessionInfo {
            exercise: state.selected_exercise(),
            sample_interval_ms: self.settings.sample_interval.as_millis() as u64,
            cooldown_ms: self.settings.cooldown.as_millis() as u64,
        }
    }

    fn broadcast(&self, output: SessionOutput) {
        if self.output_sender.send(output.clone()).is_err() {
            debug!("Session event receiver dropped");
        }
        if let Some(ref writer) = self.writer_sender {
            if writer.send(output).is_err() {
                warn!("Session writer receiver dropped");
            }
        }
    }

    fn spawn_sampler(&self, generation: u64) {
        let counter = Arc::clone(&self.counter);
        let frame_source = Arc::clone(&self.frame_source);
        let classifier = Arc::clone(&self.classifier);
        let settings = self.settings.clone();
        let output_sender = self.output_sender.clone();
        let writer_sender = self.writer_sender.clone();

        thread::spawn(move || {
            if let Err(e) = run_sampler(
                generation,
                counter,
                frame_source,
                classifier,
                settings,
                output_sender,
                writer_sender,
            ) {
                debug!("Sampling loop ended: {}", e);
            }
        });
    }
}

/// The periodic sampling loop: one frame, one classification, one transition
/// per tick. Classification happens outside the counter lock, so user
/// operations never wait on a slow classifier; a tick can never overlap the
/// previous one because the next sleep only starts after the classification
/// resolved.
fn run_sampler(
    generation: u64,
    counter: Arc<Mutex<RepCounter>>,
    frame_source: Arc<Mutex<dyn FrameSource + Send>>,
    classifier: Arc<Mutex<dyn PositionClassifier + Send>>,
    settings: SamplerSettings,
    output_sender: Sender<SessionOutput>,
    mut writer_sender: Option<Sender<SessionOutput>>,
) -> Result<(), SpotterError> {
    let mut sample_no: usize = 0;

    loop {
        thread::sleep(settings.sample_interval);

        let exercise = {
            let state = lock(&counter);
            if !state.accepts_generation(generation) {
                debug!("Sampling generation {} superseded, winding down", generation);
                break;
            }
            match state.selected_exercise() {
                Some(exercise) => exercise,
                None => break,
            }
        };

        let frame = match lock(&frame_source).current_frame() {
            Ok(frame) => frame,
            Err(e) => {
                // no frame, no transition; state is left untouched this cycle
                warn!("No frame available this tick, skipping: {}", e);
                continue;
            }
        };

        let label = lock(&classifier).classify(&frame, exercise);

        sample_no += 1;
        let record = {
            let mut state = lock(&counter);
            // the session may have been stopped, reset, or repointed while the
            // classification was in flight; a stale result must not count
            if !state.accepts_generation(generation) {
                debug!("Discarding stale classification for generation {}", generation);
                break;
            }

            let rep_counted = state.apply_label(label);
            if rep_counted {
                schedule_cooldown_clear(
                    Arc::clone(&counter),
                    state.cooldown_epoch(),
                    settings.cooldown,
                );
            }

            SampleRecord {
                sample_no,
                timestamp_ms: frame.timestamp_ms,
                label,
                rep_counted,
                rep_count: state.rep_count(),
                cooldown_active: state.cooldown_active(),
                feedback: state.feedback().to_string(),
            }
        };

        let output = SessionOutput::Sample(Box::new(record));
        output_sender.send(output.clone())?;

        // recording is best-effort; a dropped writer must not end the session
        let writer_gone = writer_sender
            .as_ref()
            .is_some_and(|writer| writer.send(output).is_err());
        if writer_gone {
            warn!("Session writer receiver dropped, no longer recording");
            writer_sender = None;
        }
    }

    Ok(())
}

/// Clears the cooldown flag after the debounce window on a timer independent
/// of the sampling loop. The epoch keeps a late timer from releasing a
/// cooldown armed by a later run.
fn schedule_cooldown_clear(counter: Arc<Mutex<RepCounter>>, epoch: u64, cooldown: Duration) {
    thread::spawn(move || {
        thread::sleep(cooldown);
        lock(&counter).clear_cooldown(epoch);
    });
}

// a poisoned lock means a sampler tick panicked; the counter state itself is
// still consistent, so recover the guard rather than cascading the panic
fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
