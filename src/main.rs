//! # mktui Entry Point
//!
//! Interactive dashboard for the targets of the `Makefile` in the current
//! directory.
//!
//! ## Usage
//!
//! ```bash
//! cd my-project
//! mktui
//! ```
//!
//! ## Architecture
//!
//! 1. **Catalog**: the Makefile is scanned into a sorted `target -> doc` map
//! 2. **Setup**: views are laid out, styled and populated once
//! 3. **Loop**: wait for a key, run its command, drain queued output, redraw
//! 4. **Execution**: `make <target>` runs in the background; a pump task
//!    streams its stdout back through a generation-tagged channel
//!
//! ## Key Bindings
//!
//! - `Up` / `k` - Move selection up
//! - `Down` / `j` - Move selection down
//! - `Enter` - Run the selected target
//! - `q` / `Ctrl+c` - Quit (running commands are left behind)

use mktui::catalog;
use mktui::config::Config;
use mktui::logging;
use mktui::ui::{self, App, Flow};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::panic;
use std::time::Duration;

/// Trait for reading terminal events (allows dependency injection for testing)
trait EventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>>;
}

/// Production event reader that uses crossterm's event polling + read
struct CrosstermEventReader;

impl EventReader for CrosstermEventReader {
    fn read_event(&mut self, timeout: Duration) -> Result<Option<Event>> {
        if event::poll(timeout).context("Failed to poll for events")? {
            Ok(Some(
                event::read().context("Failed to read keyboard event")?,
            ))
        } else {
            Ok(None)
        }
    }
}

/// mktui - browse and run Makefile targets
#[derive(Parser, Debug)]
#[command(name = "mktui")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Browse and run the targets of ./Makefile", long_about = None)]
struct Args {}

#[tokio::main]
async fn main() -> Result<()> {
    let _args = Args::parse();

    // Set up panic hook to ensure terminal is restored on panic
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);

        original_hook(panic_info);
    }));

    let result = run_application();

    // Restore panic hook
    let _ = panic::take_hook();

    result
}

fn run_application() -> Result<()> {
    let (config, config_error) = match Config::try_load() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    // Logging is best effort; the dashboard works without it.
    if let Ok(path) = logging::init(&config.log_level) {
        tracing::debug!("logging to {}", path.display());
    }
    if let Some(e) = config_error {
        tracing::warn!("Ignoring config file: {e:#}");
    }

    let current_dir = std::env::current_dir().context("Failed to get current working directory")?;
    let descriptor = config.descriptor_path(&current_dir);

    // Load before touching the terminal so a missing Makefile prints cleanly.
    let targets = catalog::load(&descriptor)?;
    tracing::info!(
        descriptor = %descriptor.display(),
        targets = targets.len(),
        "loaded catalog"
    );

    let mut app = App::from_config(targets, &config, &current_dir);

    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let mut event_reader = CrosstermEventReader;
    let run_result = run_app(&mut terminal, &mut app, &mut event_reader);

    // Restore terminal (always runs, even if run_app failed)
    let cleanup_result = cleanup_terminal(&mut terminal);

    run_result?;
    cleanup_result?;

    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    event_reader: &mut dyn EventReader,
) -> Result<()> {
    // First pass: one-time setup.
    let size = terminal.size().context("Failed to read terminal size")?;
    app.layout(size.width, size.height);
    app.setup()?;
    terminal
        .draw(|f| ui::render(f, app))
        .context("Failed to draw terminal UI")?;

    loop {
        if step(app, event_reader)? == Flow::Quit {
            tracing::info!("quit requested");
            return Ok(());
        }

        let size = terminal.size().context("Failed to read terminal size")?;
        app.layout(size.width, size.height);
        if let Err(e) = app.update() {
            tracing::warn!("update failed: {e:#}");
        }
        terminal
            .draw(|f| ui::render(f, app))
            .context("Failed to draw terminal UI")?;
    }
}

/// Wait for one input event (or a poll timeout), handle it, then apply any
/// output queued by running executions.
fn step(app: &mut App, event_reader: &mut dyn EventReader) -> Result<Flow> {
    // Short timeout while output is streaming so new lines show up promptly
    let poll_timeout = if app.is_streaming() {
        Duration::from_millis(16)
    } else {
        Duration::from_millis(100)
    };

    if let Some(event) = event_reader.read_event(poll_timeout)? {
        if app.handle_event(&event) == Flow::Quit {
            return Ok(Flow::Quit);
        }
    }

    app.drain_updates();
    Ok(Flow::Continue)
}

/// Clean up terminal state
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;

    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("Failed to restore terminal")?;

    terminal.show_cursor().context("Failed to show cursor")?;

    Ok(())
}
