//! Guided workout session: the state machine behind a live workout.
//!
//! ```text
//! Preparing ──start──▶ Active ──complete_set──▶ Rest ──timer/skip──▶ Active
//!     │                  │  ▲                     │
//!   load fails           │  └──── resume ◀── Paused ◀── pause
//!     ▼                  ▼
//! LoadFailed             Pr ──dismiss──▶ Rest | Active | Complete
//!
//! any live state ──end_workout / last set──▶ Complete
//! ```
//!
//! The session owns no clock. Its owner calls [`GuidedSession::tick`] once per
//! second; that drives both the elapsed-time counter and the rest countdown.
//! All actions return immediately. Side effects go to the notifier, the wake
//! lock and the record sink; observers drain [`SessionEvent`]s.

use crate::config::SessionSettings;
use crate::notify::Notifier;
use crate::persist::{PersistRequest, RecordSink};
use crate::store::TrainingStore;
use crate::timer::{CountdownTimer, TimerEvent};
use crate::wake_lock::ScreenWakeLock;
use crate::{
    Error, Exercise, NewPr, PersonalRecord, Result, SetInput, SetLog, WorkoutDefinition,
    WorkoutLog, WorkoutSummary, PR_XP, SET_XP, WORKOUT_BASE_XP,
};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    /// Waiting for the definition to load, or for `start_workout`
    Preparing,
    /// The definition could not be loaded; `retry_load` may fix it
    LoadFailed(String),
    Active,
    Rest,
    Paused,
    /// Celebrating a personal record; advancement waits for dismissal
    Pr,
    Complete,
}

impl SessionStatus {
    /// Whether elapsed time accumulates in this status
    fn counts_time(&self) -> bool {
        matches!(
            self,
            SessionStatus::Active | SessionStatus::Rest | SessionStatus::Pr
        )
    }

    fn is_live(&self) -> bool {
        matches!(
            self,
            SessionStatus::Active | SessionStatus::Rest | SessionStatus::Pr | SessionStatus::Paused
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Preparing => write!(f, "preparing"),
            SessionStatus::LoadFailed(reason) => write!(f, "failed to load ({})", reason),
            SessionStatus::Active => write!(f, "active"),
            SessionStatus::Rest => write!(f, "resting"),
            SessionStatus::Paused => write!(f, "paused"),
            SessionStatus::Pr => write!(f, "celebrating a PR"),
            SessionStatus::Complete => write!(f, "complete"),
        }
    }
}

/// Where the session goes after a set, decided when the set is logged
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Advance {
    NextSet,
    NextExercise,
    Finish,
}

/// Notable things that happened, in order
#[derive(Clone, Debug, PartialEq)]
pub enum SessionEvent {
    Started,
    SetLogged(SetLog),
    PrAchieved(NewPr),
    RestStarted { seconds: u32 },
    RestWarning { remaining: u32 },
    RestFinished,
    ExerciseChanged { index: usize },
    Paused,
    Resumed,
    Completed(WorkoutSummary),
}

/// Partial settings update; `None` fields keep their current value
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SettingsPatch {
    pub auto_start_timer: Option<bool>,
    pub default_rest_time: Option<u32>,
    pub timer_warning_at: Option<u32>,
    pub keep_screen_on: Option<bool>,
}

type CompletionCallback = Box<dyn FnMut(&WorkoutSummary)>;

pub struct GuidedSession {
    workout_id: String,
    definition: Option<WorkoutDefinition>,
    status: SessionStatus,

    exercise_index: usize,
    set_index: u32,
    exercise_sets: Vec<SetLog>,
    completed_sets: Vec<SetLog>,

    started_at: Option<DateTime<Utc>>,
    elapsed_seconds: u64,
    rest_timer: CountdownTimer,
    paused_from: Option<SessionStatus>,

    known_prs: HashMap<String, f64>,
    prs: Vec<NewPr>,
    celebrating: Option<NewPr>,
    pending: Option<Advance>,

    settings: SessionSettings,
    summary: Option<WorkoutSummary>,
    events: Vec<SessionEvent>,

    notifier: Notifier,
    wake_lock: ScreenWakeLock,
    sink: Box<dyn RecordSink>,
    on_complete: Option<CompletionCallback>,
}

impl GuidedSession {
    pub fn new(
        workout_id: impl Into<String>,
        settings: SessionSettings,
        notifier: Notifier,
        wake_lock: ScreenWakeLock,
        sink: Box<dyn RecordSink>,
    ) -> Self {
        Self {
            workout_id: workout_id.into(),
            definition: None,
            status: SessionStatus::Preparing,
            exercise_index: 0,
            set_index: 0,
            exercise_sets: Vec::new(),
            completed_sets: Vec::new(),
            started_at: None,
            elapsed_seconds: 0,
            rest_timer: CountdownTimer::new(),
            paused_from: None,
            known_prs: HashMap::new(),
            prs: Vec::new(),
            celebrating: None,
            pending: None,
            settings,
            summary: None,
            events: Vec::new(),
            notifier,
            wake_lock,
            sink,
            on_complete: None,
        }
    }

    /// Register a callback invoked once with the final summary
    pub fn set_on_complete(&mut self, callback: impl FnMut(&WorkoutSummary) + 'static) {
        self.on_complete = Some(Box::new(callback));
    }

    // ========================================================================
    // Loading
    // ========================================================================

    /// Fetch the workout definition and the user's history
    ///
    /// On failure the session moves to [`SessionStatus::LoadFailed`] and the
    /// error is returned; [`GuidedSession::retry_load`] can try again.
    pub fn load(&mut self, store: &dyn TrainingStore) -> Result<()> {
        self.ensure(
            "load the workout",
            matches!(
                self.status,
                SessionStatus::Preparing | SessionStatus::LoadFailed(_)
            ),
        )?;

        match crate::loader::load_definition(store, &self.workout_id) {
            Ok(definition) => {
                self.install(definition);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Failed to load workout {}: {}", self.workout_id, e);
                self.status = SessionStatus::LoadFailed(e.to_string());
                Err(e)
            }
        }
    }

    /// Load again, typically after a failure; any loaded definition is replaced
    pub fn retry_load(&mut self, store: &dyn TrainingStore) -> Result<()> {
        self.ensure(
            "retry loading",
            matches!(
                self.status,
                SessionStatus::Preparing | SessionStatus::LoadFailed(_)
            ),
        )?;
        tracing::info!("Retrying load of workout {}", self.workout_id);
        self.load(store)
    }

    /// Use an already-built definition instead of loading one
    pub fn with_definition(mut self, definition: WorkoutDefinition) -> Self {
        self.workout_id = definition.id.clone();
        self.install(definition);
        self
    }

    fn install(&mut self, definition: WorkoutDefinition) {
        self.known_prs = definition
            .exercises
            .iter()
            .filter_map(|ex| ex.current_pr.map(|pr| (ex.id.clone(), pr)))
            .collect();
        tracing::info!(
            "Workout {} ready: {} exercises, {} sets",
            definition.id,
            definition.exercises.len(),
            definition.total_sets()
        );
        self.definition = Some(definition);
        self.status = SessionStatus::Preparing;
    }

    // ========================================================================
    // Actions
    // ========================================================================

    pub fn start_workout(&mut self) -> Result<()> {
        self.ensure(
            "start the workout",
            self.status == SessionStatus::Preparing && self.definition.is_some(),
        )?;

        self.elapsed_seconds = 0;
        self.started_at = Some(Utc::now());
        self.status = SessionStatus::Active;
        if self.settings.keep_screen_on {
            self.wake_lock.request();
        }

        let first = self
            .current_exercise()
            .map(|ex| ex.name.clone())
            .unwrap_or_default();
        self.notifier
            .speak_text(&format!("Let's start! First up: {}", first));
        self.events.push(SessionEvent::Started);
        tracing::info!("Workout {} started", self.workout_id);
        Ok(())
    }

    /// Log the set the user just finished
    pub fn complete_set(&mut self, input: SetInput) -> Result<()> {
        self.ensure("complete a set", self.status == SessionStatus::Active)?;
        let exercise = self.current_exercise().cloned().ok_or_else(|| {
            Error::State(format!("no exercise at index {}", self.exercise_index))
        })?;

        let best = self.known_prs.get(&exercise.id).copied().unwrap_or(0.0);
        let is_new_pr = input.weight > best && input.reps >= 1;

        let log = SetLog {
            exercise_id: exercise.id.clone(),
            set_number: self.set_index + 1,
            weight: input.weight,
            reps: input.reps,
            rpe: input.rpe,
            is_new_pr,
            completed_at: Utc::now(),
        };
        tracing::debug!(
            "Set {} of {} logged: {} x {}",
            log.set_number,
            exercise.id,
            log.weight,
            log.reps
        );
        self.exercise_sets.push(log.clone());
        self.completed_sets.push(log.clone());
        self.events.push(SessionEvent::SetLogged(log.clone()));

        let advance = self.next_advance(&exercise);

        if is_new_pr {
            let pr = NewPr {
                exercise_id: exercise.id.clone(),
                exercise_name: exercise.name.clone(),
                new_record: input.weight,
                previous_record: best,
                improvement: input.weight - best,
                xp_earned: PR_XP,
            };
            tracing::info!(
                "New PR on {}: {} (was {})",
                exercise.id,
                pr.new_record,
                pr.previous_record
            );

            self.known_prs.insert(exercise.id.clone(), input.weight);
            self.prs.push(pr.clone());
            self.celebrating = Some(pr.clone());
            self.pending = Some(advance);
            self.status = SessionStatus::Pr;

            self.notifier.play_pr();
            self.notifier.vibrate_celebration();
            self.sink
                .submit(PersistRequest::PersonalRecord(PersonalRecord {
                    exercise_id: exercise.id,
                    weight: log.weight,
                    reps: log.reps,
                    achieved_on: log.completed_at.date_naive(),
                }));
            self.events.push(SessionEvent::PrAchieved(pr));
            return Ok(());
        }

        self.apply(advance);
        Ok(())
    }

    /// Continue after the PR celebration, exactly as a normal set would have
    pub fn dismiss_pr_celebration(&mut self) -> Result<()> {
        self.ensure("dismiss the PR celebration", self.status == SessionStatus::Pr)?;
        self.celebrating = None;
        match self.pending.take() {
            Some(advance) => self.apply(advance),
            None => self.status = SessionStatus::Active,
        }
        Ok(())
    }

    /// End the rest period now
    pub fn skip_rest(&mut self) -> Result<()> {
        self.ensure("skip rest", self.status == SessionStatus::Rest)?;
        let event = self.rest_timer.skip();
        self.on_timer_event(event);
        Ok(())
    }

    /// Start the rest countdown by hand when auto-start is off
    pub fn start_rest_timer(&mut self) -> Result<()> {
        self.ensure(
            "start the rest timer",
            self.status == SessionStatus::Rest && !self.rest_timer.is_running(),
        )?;
        let seconds = self.current_exercise().map(|ex| self.rest_for(ex)).unwrap_or(0);
        self.begin_rest(seconds);
        Ok(())
    }

    /// Move on to the next exercise without finishing this one
    pub fn skip_exercise(&mut self) -> Result<()> {
        self.ensure(
            "skip the exercise",
            matches!(self.status, SessionStatus::Active | SessionStatus::Rest),
        )?;
        self.rest_timer.cancel();

        if self.is_last_exercise() {
            self.finish();
            return Ok(());
        }

        self.move_to_exercise(self.exercise_index + 1);
        self.status = SessionStatus::Active;
        Ok(())
    }

    /// Go back one exercise; does nothing on the first exercise
    ///
    /// Sets already logged stay in the workout's log.
    pub fn go_to_previous_exercise(&mut self) -> Result<()> {
        self.ensure(
            "go to the previous exercise",
            matches!(self.status, SessionStatus::Active | SessionStatus::Rest),
        )?;
        if self.exercise_index == 0 {
            return Ok(());
        }

        self.rest_timer.cancel();
        self.move_to_exercise(self.exercise_index - 1);
        self.status = SessionStatus::Active;
        Ok(())
    }

    pub fn pause(&mut self) -> Result<()> {
        self.ensure(
            "pause",
            matches!(self.status, SessionStatus::Active | SessionStatus::Rest),
        )?;
        self.rest_timer.pause();
        self.paused_from = Some(std::mem::replace(
            &mut self.status,
            SessionStatus::Paused,
        ));
        self.events.push(SessionEvent::Paused);
        Ok(())
    }

    pub fn resume(&mut self) -> Result<()> {
        self.ensure("resume", self.status == SessionStatus::Paused)?;
        let was_resting = self.paused_from.take() == Some(SessionStatus::Rest);
        self.status = if self.rest_timer.time_remaining() > 0 {
            self.rest_timer.resume();
            SessionStatus::Rest
        } else if was_resting {
            // A rest whose timer was never started still waits to be started or skipped
            SessionStatus::Rest
        } else {
            SessionStatus::Active
        };
        self.events.push(SessionEvent::Resumed);
        Ok(())
    }

    /// Finish now, whatever remains
    pub fn end_workout(&mut self) -> Result<()> {
        self.ensure(
            "end the workout",
            self.definition.is_some()
                && !matches!(
                    self.status,
                    SessionStatus::Complete | SessionStatus::LoadFailed(_)
                ),
        )?;
        self.finish();
        Ok(())
    }

    /// Merge changed settings; they apply from the next relevant action
    pub fn update_settings(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.auto_start_timer {
            self.settings.auto_start_timer = v;
        }
        if let Some(v) = patch.default_rest_time {
            self.settings.default_rest_time = v;
        }
        if let Some(v) = patch.timer_warning_at {
            self.settings.timer_warning_at = v;
        }
        if let Some(v) = patch.keep_screen_on {
            self.settings.keep_screen_on = v;
            if self.status.is_live() {
                if v {
                    self.wake_lock.request();
                } else {
                    self.wake_lock.release();
                }
            }
        }
        tracing::debug!("Session settings now {:?}", self.settings);
    }

    /// One second has passed
    pub fn tick(&mut self) {
        if self.status.counts_time() {
            self.elapsed_seconds += 1;
        }
        if self.status == SessionStatus::Rest {
            if let Some(event) = self.rest_timer.tick() {
                self.on_timer_event(event);
            }
        }
        self.wake_lock.poll();
    }

    /// The app became visible or hidden
    pub fn on_visibility_change(&mut self, visible: bool) {
        self.wake_lock.on_visibility_change(visible);
    }

    /// Drain everything that happened since the last call
    pub fn take_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn ensure(&self, action: &'static str, allowed: bool) -> Result<()> {
        if allowed {
            Ok(())
        } else {
            Err(Error::InvalidTransition {
                action,
                status: self.status.to_string(),
            })
        }
    }

    fn exercise_count(&self) -> usize {
        self.definition
            .as_ref()
            .map(|d| d.exercises.len())
            .unwrap_or(0)
    }

    fn is_last_exercise(&self) -> bool {
        self.exercise_index + 1 >= self.exercise_count()
    }

    fn next_advance(&self, exercise: &Exercise) -> Advance {
        if self.set_index + 1 < exercise.sets {
            Advance::NextSet
        } else if self.is_last_exercise() {
            Advance::Finish
        } else {
            Advance::NextExercise
        }
    }

    fn rest_for(&self, exercise: &Exercise) -> u32 {
        if exercise.rest_time > 0 {
            exercise.rest_time
        } else {
            self.settings.default_rest_time
        }
    }

    fn apply(&mut self, advance: Advance) {
        match advance {
            Advance::Finish => self.finish(),
            Advance::NextExercise => {
                self.notifier.play_exercise_complete();
                self.notifier.vibrate_double();
                self.move_to_exercise(self.exercise_index + 1);
                self.status = SessionStatus::Rest;
                let seconds = self.current_exercise().map(|ex| self.rest_for(ex)).unwrap_or(0);
                self.begin_rest(seconds);
            }
            Advance::NextSet => {
                self.notifier.play_set_complete();
                self.notifier.vibrate_short();
                self.set_index += 1;
                self.status = SessionStatus::Rest;
                if self.settings.auto_start_timer {
                    let seconds =
                        self.current_exercise().map(|ex| self.rest_for(ex)).unwrap_or(0);
                    self.begin_rest(seconds);
                } else {
                    self.rest_timer.cancel();
                }
            }
        }
    }

    fn move_to_exercise(&mut self, index: usize) {
        self.exercise_index = index;
        self.set_index = 0;
        self.exercise_sets.clear();
        self.events.push(SessionEvent::ExerciseChanged { index });

        if let Some(name) = self.current_exercise().map(|ex| ex.name.clone()) {
            tracing::info!("Moving to exercise {}: {}", index + 1, name);
            self.notifier.speak_text(&format!("Next up: {}", name));
        }
    }

    fn begin_rest(&mut self, seconds: u32) {
        self.rest_timer.start(seconds);
        self.events.push(SessionEvent::RestStarted { seconds });
    }

    fn on_timer_event(&mut self, event: TimerEvent) {
        match event {
            TimerEvent::Tick(remaining) => {
                if remaining <= self.settings.timer_warning_at {
                    self.notifier.play_countdown();
                    self.events.push(SessionEvent::RestWarning { remaining });
                }
            }
            TimerEvent::Completed => {
                self.status = SessionStatus::Active;
                self.notifier.vibrate_timer_complete();
                self.notifier.play_beep();
                self.events.push(SessionEvent::RestFinished);
            }
        }
    }

    fn finish(&mut self) {
        self.rest_timer.cancel();
        self.celebrating = None;
        self.pending = None;

        let summary = self.build_summary();
        self.wake_lock.release();
        self.status = SessionStatus::Complete;

        self.notifier.play_workout_complete();
        self.notifier
            .speak_text("Workout complete! Great job today.");

        if let Some(callback) = self.on_complete.as_mut() {
            callback(&summary);
        }

        self.sink.submit(PersistRequest::WorkoutLog(WorkoutLog::from_summary(
            &summary,
            &self.completed_sets,
        )));

        tracing::info!(
            "Workout {} complete: {} sets, volume {}, {} XP",
            summary.workout_id,
            summary.sets_completed,
            summary.total_volume,
            summary.xp_earned
        );
        self.events.push(SessionEvent::Completed(summary.clone()));
        self.summary = Some(summary);
    }

    fn build_summary(&self) -> WorkoutSummary {
        let (workout_name, total_exercises, total_sets) = match &self.definition {
            Some(d) => (d.name.clone(), d.exercises.len() as u32, d.total_sets()),
            None => (String::new(), 0, 0),
        };

        let exercises_completed = self
            .completed_sets
            .iter()
            .map(|s| s.exercise_id.as_str())
            .collect::<HashSet<_>>()
            .len() as u32;
        let sets_completed = self.completed_sets.len() as u32;
        let total_volume = self.completed_sets.iter().map(SetLog::volume).sum();
        let total_reps = self.completed_sets.iter().map(|s| s.reps).sum();
        let xp_earned =
            WORKOUT_BASE_XP + PR_XP * self.prs.len() as u32 + SET_XP * sets_completed;

        WorkoutSummary {
            workout_id: self.workout_id.clone(),
            workout_name,
            duration: self.elapsed_seconds,
            exercises_completed,
            total_exercises,
            sets_completed,
            total_sets,
            total_volume,
            total_reps,
            prs_achieved: self.prs.clone(),
            xp_earned,
            completed_at: Utc::now(),
        }
    }

    // ========================================================================
    // Read access
    // ========================================================================

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn definition(&self) -> Option<&WorkoutDefinition> {
        self.definition.as_ref()
    }

    pub fn current_exercise(&self) -> Option<&Exercise> {
        self.definition
            .as_ref()
            .and_then(|d| d.exercises.get(self.exercise_index))
    }

    pub fn exercise_index(&self) -> usize {
        self.exercise_index
    }

    /// 0-based index of the set in progress within the current exercise
    pub fn set_index(&self) -> u32 {
        self.set_index
    }

    /// Sets logged for the current exercise since it was entered
    pub fn exercise_sets(&self) -> &[SetLog] {
        &self.exercise_sets
    }

    /// Every set logged in this session
    pub fn completed_sets(&self) -> &[SetLog] {
        &self.completed_sets
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// When `start_workout` was called
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn rest_timer(&self) -> &CountdownTimer {
        &self.rest_timer
    }

    pub fn prs(&self) -> &[NewPr] {
        &self.prs
    }

    pub fn celebrating(&self) -> Option<&NewPr> {
        self.celebrating.as_ref()
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn summary(&self) -> Option<&WorkoutSummary> {
        self.summary.as_ref()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn is_wake_lock_active(&self) -> bool {
        self.wake_lock.is_active()
    }
}
