// src/terminal.rs
// Keyboard input for the terminal client.
//
// Controls:
// - ENTER: start the game from the start screen
// - R: restart once the game is over
// - ESC / Ctrl-C: exit the client

use std::io;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use tokio::sync::mpsc;

use crate::logging::log_error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Start,
    Restart,
    Exit,
}

/// Map a key press to a client action, `None` for keys without a binding
pub fn key_to_action(key_event: &KeyEvent) -> Option<KeyAction> {
    // Only process key press events, not key release events
    if key_event.kind != KeyEventKind::Press {
        return None;
    }

    match key_event.code {
        KeyCode::Enter => Some(KeyAction::Start),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(KeyAction::Restart),
        KeyCode::Esc => Some(KeyAction::Exit),
        KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => Some(KeyAction::Exit),
        _ => None,
    }
}

/// Keeps the terminal in raw mode for as long as it lives
pub struct RawModeGuard;

impl RawModeGuard {
    pub fn enable() -> io::Result<Self> {
        enable_raw_mode()?;
        Ok(RawModeGuard)
    }
}

impl Drop for RawModeGuard {
    fn drop(&mut self) {
        if let Err(e) = disable_raw_mode() {
            log_error(&format!("Failed to restore terminal mode: {e}"));
        }
    }
}

/// Read key presses on a dedicated thread and forward the bound ones.
///
/// The thread stops once the receiver is dropped or after forwarding `Exit`.
pub fn spawn_key_reader() -> mpsc::UnboundedReceiver<KeyAction> {
    let (tx, rx) = mpsc::unbounded_channel();

    thread::spawn(move || {
        while !tx.is_closed() {
            match event::poll(Duration::from_millis(100)) {
                Ok(false) => continue,
                Ok(true) => {}
                Err(e) => {
                    log_error(&format!("Failed to poll keyboard: {e}"));
                    let _ = tx.send(KeyAction::Exit);
                    break;
                }
            }

            let action = match event::read() {
                Ok(Event::Key(key_event)) => key_to_action(&key_event),
                Ok(_) => None,
                Err(e) => {
                    log_error(&format!("Failed to read keyboard: {e}"));
                    Some(KeyAction::Exit)
                }
            };

            if let Some(action) = action {
                if tx.send(action).is_err() || action == KeyAction::Exit {
                    break;
                }
            }
        }
    });

    rx
}
