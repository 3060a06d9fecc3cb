// src/defs.rs
// Shared constants and data types for the reaction game client.

use serde::Deserialize;
use std::fmt;

/// Total duration of a round, used as the denominator of the progress bar
pub const TOTAL_TIME_SECS: u32 = 60;

/// Default delay between two polls of the game state
pub const POLL_INTERVAL_MS: u64 = 500;

pub const GAME_DATA_PATH: &str = "/get_game_data";
pub const RESTART_PATH: &str = "/restart_game";

/// Game state as reported by the server on every poll
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GameState {
    pub command: String,
    pub score: u32,
    pub remaining_time: u32,
    pub success: bool,
    #[serde(rename = "game_over")]
    pub over: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    NotStarted,
    Running,
    Over,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::NotStarted => "not started",
            SessionStatus::Running => "running",
            SessionStatus::Over => "over",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sound cues triggered by game events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Start,
    Success,
    End,
}

/// Values currently shown on the display surface
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayFields {
    pub command: String,
    pub score: u32,
    pub remaining_time: u32,
    pub progress_percent: f64,
}

impl Default for DisplayFields {
    fn default() -> Self {
        Self {
            command: String::new(),
            score: 0,
            remaining_time: TOTAL_TIME_SECS,
            progress_percent: 100.0,
        }
    }
}

impl DisplayFields {
    pub fn from_state(state: &GameState) -> Self {
        Self {
            command: state.command.clone(),
            score: state.score,
            remaining_time: state.remaining_time,
            progress_percent: progress_percent(state.remaining_time),
        }
    }

    pub fn command_text(&self) -> String {
        format!("Commande : {}", self.command)
    }

    pub fn score_text(&self) -> String {
        format!("Score : {}", self.score)
    }

    pub fn timer_text(&self) -> String {
        format!("Temps restant : {}s", self.remaining_time)
    }

    /// Width of the progress indicator, e.g. "75%"
    pub fn progress_text(&self) -> String {
        format!("{}%", self.progress_percent)
    }
}

/// Remaining time as a percentage of the full round, clamped to [0, 100]
pub fn progress_percent(remaining_time: u32) -> f64 {
    let ratio = f64::from(remaining_time) / f64::from(TOTAL_TIME_SECS);
    (ratio * 100.0).clamp(0.0, 100.0)
}
