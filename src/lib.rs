use std::io::{self, IsTerminal, Stdout};
use std::time::Duration;

use clap::Parser;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    Event, KeyCode, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use ratatui::crossterm::execute;
use ratatui::crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use tracing::{info, warn};

mod app;
pub mod cli;
mod editor_input;
pub mod error;
mod keybinds;
mod logging;
mod persistence;
mod runner;
mod settings;
mod tab;
mod theme;
mod types;
mod ui;
mod util;
use app::App;
use cli::CliArgs;
pub use error::{Error, Result};
use ui::draw;

pub fn run() -> Result<()> {
    let args = CliArgs::parse();

    // Held until return so the file writer flushes.
    let _log_guard = if args.no_log {
        None
    } else {
        persistence::config_dir().and_then(|dir| match logging::init(&dir, &args.log_level) {
            Ok(guard) => Some(guard),
            Err(err) => {
                eprintln!("cedit: {err}");
                None
            }
        })
    };
    info!(version = env!("CARGO_PKG_VERSION"), "starting");

    if !io::stdout().is_terminal() {
        return Err(Error::Terminal("stdout is not a terminal".to_string()));
    }

    let mut app = App::new()?;
    app.restore_session();
    app.open_startup_files(args.files);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste
    )?;

    let enhanced_keys =
        ratatui::crossterm::terminal::supports_keyboard_enhancement().unwrap_or(false);
    if enhanced_keys {
        let _ = execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES)
        );
    } else if let Some(alt) = app
        .keybinds
        .map
        .get(&keybinds::KeyAction::Run)
        .and_then(|binds| binds.iter().find(|b| b.code != KeyCode::Enter))
    {
        let msg = format!("Terminal cannot report Ctrl+Enter: {} builds and runs", alt.display());
        app.set_status(msg);
    }

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), PopKeyboardEnhancementFlags);
        let _ = execute!(
            io::stdout(),
            LeaveAlternateScreen,
            DisableMouseCapture,
            DisableBracketedPaste
        );
        original_hook(info);
    }));

    let backend = CrosstermBackend::new(stdout);
    let result = match Terminal::new(backend) {
        Ok(terminal) => run_app(terminal, &mut app),
        Err(err) => Err(err.into()),
    };
    app.shutdown();

    disable_raw_mode()?;
    let mut stdout = io::stdout();
    if enhanced_keys {
        let _ = execute!(stdout, PopKeyboardEnhancementFlags);
    }
    execute!(
        stdout,
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste
    )?;

    if let Err(err) = &result {
        warn!(%err, "exited with error");
    }
    result
}

fn run_app(mut terminal: Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.poll_runner();
        terminal.draw(|f| draw(app, f))?;
        if app.quit {
            return Ok(());
        }
        if event::poll(Duration::from_millis(50))? {
            // Drain everything pending so fast scrolling or pasting needs one redraw.
            loop {
                let outcome = match event::read()? {
                    Event::Key(key) => app.handle_key(key),
                    Event::Mouse(mouse) => app.handle_mouse(mouse),
                    Event::Paste(text) => {
                        app.handle_paste(text);
                        Ok(())
                    }
                    _ => Ok(()),
                };
                if let Err(err) = outcome {
                    warn!(%err, "action failed");
                    app.set_status(format!("Action failed: {err}"));
                }
                if app.quit {
                    return Ok(());
                }
                if !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }
    }
}
