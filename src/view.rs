// src/view.rs
// Display surface for the game session.
//
// GameView is the sink the session renders into. TerminalView draws the
// game screen with crossterm and signals cues with the terminal bell.

use std::io::{self, Write};

use crossterm::{
    cursor::MoveTo,
    queue,
    style::{Print, Stylize},
    terminal::{Clear, ClearType},
};

use crate::defs::{Cue, DisplayFields};
use crate::logging::log_error;

/// Width of the progress bar in columns
pub const PROGRESS_BAR_WIDTH: usize = 40;

pub trait GameView: Send + 'static {
    /// Show command, score, timer and progress
    fn render(&mut self, fields: &DisplayFields);

    fn play_cue(&mut self, cue: Cue);

    fn set_start_visible(&mut self, visible: bool);

    fn set_restart_visible(&mut self, visible: bool);
}

fn cue_label(cue: Cue) -> &'static str {
    match cue {
        Cue::Start => "C'est parti !",
        Cue::Success => "Bravo !",
        Cue::End => "Temps écoulé !",
    }
}

/// Render the progress indicator as a bar of `width` columns
pub fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

pub struct TerminalView<W: Write + Send + 'static> {
    out: W,
    sound: bool,
    fields: DisplayFields,
    start_visible: bool,
    restart_visible: bool,
    last_cue: Option<Cue>,
}

impl TerminalView<io::Stdout> {
    pub fn stdout(sound: bool) -> Self {
        Self::new(io::stdout(), sound)
    }
}

impl<W: Write + Send + 'static> TerminalView<W> {
    pub fn new(out: W, sound: bool) -> Self {
        Self {
            out,
            sound,
            fields: DisplayFields::default(),
            start_visible: true,
            restart_visible: false,
            last_cue: None,
        }
    }

    pub fn writer(&self) -> &W {
        &self.out
    }

    fn redraw(&mut self) {
        if let Err(e) = self.draw() {
            log_error(&format!("Failed to draw game screen: {e}"));
        }
    }

    // Raw mode is on while the client runs, so every line ends with \r\n
    fn draw(&mut self) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        queue!(self.out, Print("Jeu de réaction".bold()), Print("\r\n\r\n"))?;

        if self.start_visible {
            queue!(self.out, Print("Appuyez sur ENTRÉE pour commencer, ÉCHAP pour quitter\r\n"))?;
            return self.out.flush();
        }

        queue!(
            self.out,
            Print(self.fields.command_text().yellow()),
            Print("\r\n"),
            Print(self.fields.score_text()),
            Print("\r\n"),
            Print(self.fields.timer_text()),
            Print("\r\n"),
            Print(progress_bar(self.fields.progress_percent, PROGRESS_BAR_WIDTH)),
            Print(format!(" {}\r\n", self.fields.progress_text())),
        )?;

        if let Some(cue) = self.last_cue {
            let label = match cue {
                Cue::End => cue_label(cue).red(),
                _ => cue_label(cue).green(),
            };
            queue!(self.out, Print("\r\n"), Print(label), Print("\r\n"))?;
        }

        if self.restart_visible {
            queue!(self.out, Print("\r\nAppuyez sur R pour rejouer, ÉCHAP pour quitter\r\n"))?;
        }

        self.out.flush()
    }
}

impl<W: Write + Send + 'static> GameView for TerminalView<W> {
    fn render(&mut self, fields: &DisplayFields) {
        self.fields = fields.clone();
        self.redraw();
    }

    fn play_cue(&mut self, cue: Cue) {
        self.last_cue = Some(cue);
        if self.sound {
            // BEL
            if let Err(e) = self.out.write_all(b"\x07") {
                log_error(&format!("Failed to play cue: {e}"));
            }
        }
        self.redraw();
    }

    fn set_start_visible(&mut self, visible: bool) {
        self.start_visible = visible;
        self.redraw();
    }

    fn set_restart_visible(&mut self, visible: bool) {
        self.restart_visible = visible;
        self.redraw();
    }
}
