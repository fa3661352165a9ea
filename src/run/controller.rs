use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::normalize;
use super::store::ResultStore;
use super::stream::{SessionEvent, StreamSession};
use super::types::{Envelope, ProgressSnapshot, RunState};

/// A per-model failure reported over the feed. The run continues past
/// these; they are kept for display alongside the results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoftError {
    pub model_name: String,
    pub message: String,
}

/// Notification pushed to the rendering collaborator. Pure data; emitting
/// one never mutates controller state.
#[derive(Debug, Clone, PartialEq)]
pub enum RunUpdate {
    State {
        state: RunState,
        /// Completion message or fatal error text, when the transition
        /// carries one.
        message: Option<String>,
    },
    Progress(ProgressSnapshot),
    /// A result was accepted and inserted at `index` in arrival order.
    ResultAdded { index: usize },
    SoftError { model_name: String, message: String },
}

/// Callback the view layer subscribes with. Invoked synchronously from
/// the controller's command and event handlers.
pub type UpdateSink = Arc<dyn Fn(&RunUpdate) + Send + Sync>;

/// State machine for one live benchmark run.
///
/// Owns the run state, progress snapshot, and result store for the
/// lifetime of the run; every mutation funnels through [`apply`] and the
/// command methods, one event processed to completion at a time.
///
/// [`apply`]: RunController::apply
pub struct RunController {
    run_id: Uuid,
    state: RunState,
    progress: ProgressSnapshot,
    store: ResultStore,
    session: Option<StreamSession>,
    soft_errors: Vec<SoftError>,
    started_at: Option<DateTime<Utc>>,
    message: Option<String>,
    sink: Option<UpdateSink>,
}

impl RunController {
    pub fn new() -> Self {
        RunController {
            run_id: Uuid::new_v4(),
            state: RunState::Idle,
            progress: ProgressSnapshot::default(),
            store: ResultStore::new(),
            session: None,
            soft_errors: Vec::new(),
            started_at: None,
            message: None,
            sink: None,
        }
    }

    /// Subscribe the rendering collaborator.
    pub fn set_sink(&mut self, sink: UpdateSink) {
        self.sink = Some(sink);
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn progress(&self) -> &ProgressSnapshot {
        &self.progress
    }

    pub fn store(&self) -> &ResultStore {
        &self.store
    }

    /// Mutable store access for user sort commands. Result insertion
    /// still only happens through [`RunController::apply`].
    pub fn store_mut(&mut self) -> &mut ResultStore {
        &mut self.store
    }

    pub fn soft_errors(&self) -> &[SoftError] {
        &self.soft_errors
    }

    /// Completion message or fatal error text of the last terminal
    /// transition.
    pub fn last_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    // -------------------------------------------------------------------
    // Commands
    // -------------------------------------------------------------------

    /// Begin a run over an opened session. Any previous subscription is
    /// closed first; progress, results, and soft errors reset.
    pub fn start(&mut self, session: StreamSession) {
        if let Some(mut old) = self.session.take() {
            old.close();
        }
        self.run_id = Uuid::new_v4();
        self.progress = ProgressSnapshot::default();
        self.store.clear();
        self.soft_errors.clear();
        self.message = None;
        self.started_at = Some(Utc::now());
        self.session = Some(session);
        self.transition(RunState::Running, None);
        tracing::info!(run_id = %self.run_id, "run started");
    }

    /// Suppress application of data events. Only meaningful while
    /// Running; a no-op everywhere else.
    pub fn pause(&mut self) {
        if self.state == RunState::Running {
            self.transition(RunState::Paused, None);
            tracing::info!(run_id = %self.run_id, "run paused");
        }
    }

    /// Resume applying events after a pause. Dropped events are not
    /// replayed.
    pub fn resume(&mut self) {
        if self.state == RunState::Paused {
            self.transition(RunState::Running, None);
            tracing::info!(run_id = %self.run_id, "run resumed");
        }
    }

    /// Synchronous cancel: the session is closed and the state is
    /// Cancelled before this returns. Safe from any non-terminal state
    /// and redundantly from a terminal one (no-op).
    pub fn cancel(&mut self) {
        if self.state.is_terminal() {
            return;
        }
        self.close_session();
        self.transition(RunState::Cancelled, None);
        tracing::info!(run_id = %self.run_id, elapsed_ms = self.elapsed_ms(), "run cancelled");
    }

    // -------------------------------------------------------------------
    // Event intake
    // -------------------------------------------------------------------

    /// Await the next session event. None when no subscription is open
    /// or the feed has ended.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        match self.session.as_mut() {
            Some(session) => session.next().await,
            None => None,
        }
    }

    /// Apply one event to completion. This is the only mutation path for
    /// run state, progress, and result insertion.
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Envelope(envelope) => self.apply_envelope(envelope),
            SessionEvent::TransportFailed(message) => self.fail(message),
        }
    }

    fn apply_envelope(&mut self, envelope: Envelope) {
        let paused = match self.state {
            RunState::Running => false,
            RunState::Paused => true,
            // Idle or terminal: late events are dropped.
            _ => return,
        };

        match envelope {
            // Terminal envelopes act from Running and Paused alike.
            Envelope::Complete { message } => self.complete(message),
            Envelope::Error { model_name: None, error_message } => self.fail(error_message),

            // Data events while paused are discarded, not queued; resume
            // does not replay them.
            _ if paused => {
                tracing::debug!(run_id = %self.run_id, "paused, event discarded");
            }

            Envelope::Total { total_models } => {
                self.progress.total = total_models;
                self.emit(&RunUpdate::Progress(self.progress.clone()));
            }

            Envelope::Progress(update) => {
                self.progress.completed = update.current_model_count;
                self.progress.total = update.total_models;
                self.progress.elapsed_seconds = update.elapsed_time;
                self.progress.estimated_remaining_seconds = update.estimated_remaining;
                self.progress.current_model_name = update.testing_model_name;
                self.emit(&RunUpdate::Progress(self.progress.clone()));
            }

            Envelope::Result(payload) => {
                let result = normalize::normalize(&payload);
                tracing::debug!(
                    run_id = %self.run_id,
                    model_name = %result.model_name,
                    score = result.score,
                    "result received"
                );
                self.store.insert(result);
                self.emit(&RunUpdate::ResultAdded { index: self.store.len() - 1 });
            }

            Envelope::Error { model_name: Some(model_name), error_message } => {
                tracing::warn!(
                    run_id = %self.run_id,
                    model_name = %model_name,
                    "model failed: {}",
                    error_message
                );
                self.soft_errors.push(SoftError {
                    model_name: model_name.clone(),
                    message: error_message.clone(),
                });
                self.emit(&RunUpdate::SoftError { model_name, message: error_message });
            }
        }
    }

    // -------------------------------------------------------------------
    // Terminal transitions
    // -------------------------------------------------------------------

    fn complete(&mut self, message: String) {
        self.close_session();
        // Final stable sort under the last active sort state.
        self.store.resort();
        tracing::info!(
            run_id = %self.run_id,
            results = self.store.len(),
            soft_errors = self.soft_errors.len(),
            elapsed_ms = self.elapsed_ms(),
            "run complete"
        );
        self.transition(RunState::Completed, Some(message));
    }

    fn fail(&mut self, message: String) {
        if self.state.is_terminal() {
            return;
        }
        self.close_session();
        tracing::error!(run_id = %self.run_id, elapsed_ms = self.elapsed_ms(), "run failed: {}", message);
        self.transition(RunState::Errored, Some(message));
    }

    fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            session.close();
        }
    }

    fn transition(&mut self, state: RunState, message: Option<String>) {
        self.state = state;
        self.message = message.clone();
        self.emit(&RunUpdate::State { state, message });
    }

    fn emit(&self, update: &RunUpdate) {
        if let Some(sink) = &self.sink {
            sink(update);
        }
    }

    fn elapsed_ms(&self) -> i64 {
        self.started_at
            .map(|started| (Utc::now() - started).num_milliseconds())
            .unwrap_or(0)
    }
}

impl Default for RunController {
    fn default() -> Self {
        Self::new()
    }
}
