// src/reaction_client.rs
//
// Terminal client for the reaction game. Polls the game server while a game
// is running and shows command, score and remaining time.
//
// Interactive Controls:
// - ENTER: Start the game
// - R: Restart once the game is over
// - ESC: Exit the client
//
// CLI Options:
// - --host / --port: Override the server address from conf/client.conf
// - --interval: Poll interval in milliseconds
// - --quiet: Do not ring the terminal bell on cues
// - --autostart: Start the game without waiting for ENTER

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use reaction_game::api_client::{GameService, HttpGameService};
use reaction_game::config::{ClientConfig, DEFAULT_CONFIG_PATH};
use reaction_game::defs::SessionStatus;
use reaction_game::logging::{log_info, log_warning};
use reaction_game::session::{RestartOutcome, Session};
use reaction_game::terminal::{self, KeyAction, RawModeGuard};
use reaction_game::view::TerminalView;

#[derive(Parser)]
#[command(name = env!("CARGO_BIN_NAME"))]
#[command(about = "Reaction Game Client - Follow the commands before the time runs out")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Args {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Game server host
    #[arg(long)]
    host: Option<String>,

    /// Game server port
    #[arg(long)]
    port: Option<u16>,

    /// Poll interval in milliseconds
    #[arg(long)]
    interval: Option<u64>,

    /// Do not ring the terminal bell on cues
    #[arg(long)]
    quiet: bool,

    /// Start the game right away
    #[arg(long)]
    autostart: bool,
}

impl Args {
    fn apply_to(&self, config: &mut ClientConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(interval) = self.interval.filter(|i| *i > 0) {
            config.poll_interval_ms = interval;
        }
        if self.quiet {
            config.sound = false;
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();

    match run_client_with_args(args).await {
        Ok(_) => {
            println!("Client finished successfully.");
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run_client_with_args(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = ClientConfig::load_from_or_default(&args.config);
    args.apply_to(&mut config);
    let server_base_url = config.server_url();

    let service = HttpGameService::new(&server_base_url, config.request_timeout())?;

    print!("Connecting to server at {server_base_url}...");
    match service.fetch_state().await {
        Ok(_) => println!("Ok. ✓"),
        Err(e) => {
            eprintln!("Error. ✗ Failed to reach the game server: {e}");
            eprintln!("Make sure the game server is running on {server_base_url}");
            return Err(e.into());
        }
    }

    let _raw_mode = RawModeGuard::enable()?;
    let session = Session::new(service, TerminalView::stdout(config.sound), config.poll_interval());
    let result = run_session(&session, args.autostart).await;
    session.shutdown();
    result
}

async fn run_session(
    session: &Session<HttpGameService, TerminalView<std::io::Stdout>>,
    autostart: bool,
) -> Result<(), Box<dyn Error>> {
    let mut actions = terminal::spawn_key_reader();

    if autostart {
        session.start().await?;
    } else {
        session.show_start_screen();
    }

    while let Some(action) = actions.recv().await {
        match action {
            KeyAction::Start if session.status() == SessionStatus::NotStarted => {
                session.start().await?;
            }
            KeyAction::Restart if session.restart_visible() => {
                match session.restart().await? {
                    RestartOutcome::Restarted => {}
                    RestartOutcome::Failed => log_warning("Restart failed, press R to try again"),
                    RestartOutcome::Superseded => log_info("Restart superseded by a newer request"),
                }
            }
            KeyAction::Exit => {
                log_info("Exiting the client.");
                break;
            }
            ignored => {
                log_info(&format!("{ignored:?} is not available while the game is {}", session.status()));
            }
        }
    }

    Ok(())
}
