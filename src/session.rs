// src/session.rs
// Game session state machine.
//
// A Session owns the session status, the values currently on display and the
// handle of the single periodic poll task. States: NotStarted -> Running on
// start, Running -> Over when the server reports game_over, Over -> Running
// on a server-confirmed restart.
//
// Every fetch and restart request takes a sequence number; a poll response is
// only applied if its number is still the latest one issued. The first
// confirmed restart wins, later confirmations are ignored. The state mutex is
// never held across an await.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::api_client::GameService;
use crate::defs::{Cue, DisplayFields, GameState, SessionStatus, POLL_INTERVAL_MS};
use crate::logging::{log_error, log_info, log_warning};
use crate::view::GameView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// The operation is not allowed in the current status
    InvalidState {
        operation: &'static str,
        status: SessionStatus,
    },
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidState { operation, status } => {
                write!(f, "Cannot {operation} while the game is {status}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The session was not running, nothing was requested
    Skipped,
    /// The state was rendered and the game goes on
    Applied,
    /// The state was rendered and reported the end of the game
    Ended,
    /// A newer request was issued meanwhile, the response was dropped
    Stale,
    /// The request failed, the error was logged
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartOutcome {
    Restarted,
    /// The server refused or could not be reached; still over
    Failed,
    /// Another start or restart was applied first
    Superseded,
}

struct SessionState<V> {
    status: SessionStatus,
    latest_seq: u64,
    fields: DisplayFields,
    restart_visible: bool,
    poll_task: Option<AbortHandle>,
    /// Last poll failure, cleared by the next answer
    poll_error: Option<String>,
    view: V,
}

impl<V: GameView> SessionState<V> {
    fn next_seq(&mut self) -> u64 {
        self.latest_seq += 1;
        self.latest_seq
    }

    /// Record a poll failure, returns false when it repeats the previous one
    fn note_poll_error(&mut self, message: String) -> bool {
        let repeated = self.poll_error.as_deref() == Some(message.as_str());
        self.poll_error = Some(message);
        !repeated
    }

    fn show_restart(&mut self, visible: bool) {
        self.restart_visible = visible;
        self.view.set_restart_visible(visible);
    }

    fn cancel_polling(&mut self) {
        if let Some(handle) = self.poll_task.take() {
            handle.abort();
        }
    }

    fn reset_display(&mut self) {
        self.fields = DisplayFields::default();
        self.view.render(&self.fields);
    }

    /// Render a fresh game state, returns true when it ends the game
    fn apply(&mut self, game_state: &GameState) -> bool {
        self.fields = DisplayFields::from_state(game_state);
        self.view.render(&self.fields);

        if game_state.success {
            self.view.play_cue(Cue::Success);
        }

        if game_state.over && self.status != SessionStatus::Over {
            self.status = SessionStatus::Over;
            self.view.play_cue(Cue::End);
            self.show_restart(true);
            self.cancel_polling();
            return true;
        }

        false
    }
}

struct Shared<S, V> {
    service: S,
    poll_interval: Duration,
    state: Mutex<SessionState<V>>,
}

pub struct Session<S, V> {
    shared: Arc<Shared<S, V>>,
}

impl<S, V> Clone for Session<S, V> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared) }
    }
}

impl<S: GameService, V: GameView> Session<S, V> {
    pub fn new(service: S, view: V, poll_interval: Duration) -> Self {
        let poll_interval = if poll_interval.is_zero() {
            log_warning(&format!("Poll interval cannot be zero, using {POLL_INTERVAL_MS} ms"));
            Duration::from_millis(POLL_INTERVAL_MS)
        } else {
            poll_interval
        };

        Self {
            shared: Arc::new(Shared {
                service,
                poll_interval,
                state: Mutex::new(SessionState {
                    status: SessionStatus::NotStarted,
                    latest_seq: 0,
                    fields: DisplayFields::default(),
                    restart_visible: false,
                    poll_task: None,
                    poll_error: None,
                    view,
                }),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState<V>> {
        // View calls cannot leave the state half-updated, so a poisoned lock is still usable
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> SessionStatus {
        self.lock().status
    }

    /// Values currently on display
    pub fn fields(&self) -> DisplayFields {
        self.lock().fields.clone()
    }

    pub fn restart_visible(&self) -> bool {
        self.lock().restart_visible
    }

    pub fn has_active_poll_task(&self) -> bool {
        self.lock()
            .poll_task
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Show the start control until the first game begins
    pub fn show_start_screen(&self) {
        let mut state = self.lock();
        if state.status == SessionStatus::NotStarted {
            state.view.set_start_visible(true);
        }
    }

    /// Start a session from the start screen (or after a game ended)
    pub async fn start(&self) -> Result<(), SessionError> {
        {
            let mut state = self.lock();
            if state.status == SessionStatus::Running {
                return Err(SessionError::InvalidState { operation: "start", status: state.status });
            }

            state.view.set_start_visible(false);
            state.show_restart(false);
            state.view.play_cue(Cue::Start);
            state.status = SessionStatus::Running;
        }

        log_info("Game started");
        self.poll().await;
        self.arm_polling();
        Ok(())
    }

    /// Fetch the game state once and render it
    pub async fn poll(&self) -> PollOutcome {
        let seq = {
            let mut state = self.lock();
            if state.status != SessionStatus::Running {
                return PollOutcome::Skipped;
            }
            state.next_seq()
        };

        let result = self.shared.service.fetch_state().await;

        let mut state = self.lock();
        let game_state = match result {
            Ok(game_state) => game_state,
            Err(e) => {
                // a server that stays down would otherwise log on every tick
                if state.note_poll_error(e.to_string()) {
                    log_error(&format!("Failed to fetch game data: {e}"));
                }
                return PollOutcome::Failed;
            }
        };

        if state.poll_error.take().is_some() {
            log_info("Game data available again");
        }

        if seq != state.latest_seq || state.status != SessionStatus::Running {
            log_info(&format!("Dropping stale game data (request {seq}, latest {})", state.latest_seq));
            return PollOutcome::Stale;
        }

        if state.apply(&game_state) {
            log_info(&format!("Game over, final score: {}", game_state.score));
            PollOutcome::Ended
        } else {
            PollOutcome::Applied
        }
    }

    /// Ask the server for a new game once the current one is over
    pub async fn restart(&self) -> Result<RestartOutcome, SessionError> {
        let seq = {
            let mut state = self.lock();
            if state.status != SessionStatus::Over {
                return Err(SessionError::InvalidState { operation: "restart", status: state.status });
            }
            state.next_seq()
        };

        if let Err(e) = self.shared.service.restart().await {
            log_error(&format!("Failed to restart game: {e}"));
            return Ok(RestartOutcome::Failed);
        }

        {
            let mut state = self.lock();
            // first confirmed restart wins
            if state.status != SessionStatus::Over {
                log_info(&format!("Ignoring restart confirmation {seq}, the game is already {}", state.status));
                return Ok(RestartOutcome::Superseded);
            }

            state.status = SessionStatus::Running;
            state.show_restart(false);
            state.view.play_cue(Cue::Start);
            state.reset_display();
        }

        log_info("Game restarted");
        self.poll().await;
        self.arm_polling();
        Ok(RestartOutcome::Restarted)
    }

    /// Stop the periodic poll task, if any
    pub fn shutdown(&self) {
        self.lock().cancel_polling();
    }

    // At most one poll task: the previous handle is always released first
    fn arm_polling(&self) {
        let mut state = self.lock();
        state.cancel_polling();

        if state.status != SessionStatus::Running {
            return;
        }

        let session = self.clone();
        let handle = tokio::spawn(session.poll_loop());
        state.poll_task = Some(handle.abort_handle());
    }

    async fn poll_loop(self) {
        let period = self.shared.poll_interval;
        let mut ticker = time::interval_at(Instant::now() + period, period);
        // a slow response delays the next tick instead of bursting
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match self.poll().await {
                PollOutcome::Ended | PollOutcome::Skipped => break,
                _ => {}
            }
        }
    }
}
