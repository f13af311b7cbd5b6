mod controller;
mod view;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use tubeplay::config::{Config, OutputKind};
use tubeplay::logging;
use tubeplay::output::{self, DeviceEventSender, OutputDevice, SimulatedOptions, SimulatedOutput};
use tubeplay::resolver::{PipedFactory, RetryingResolver, TrackResolver};
use tubeplay::{Session, SessionHandle};

use controller::AppController;
use view::AppView;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::parse();

    let _log_guard = match logging::init_logging(&config.log_dir) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: Failed to initialize logging: {}", e);
            None
        }
    };

    tracing::info!(instance = %config.instance, output = ?config.output, "=== tubeplay starting ===");

    let resolver: Arc<dyn TrackResolver> = Arc::new(
        RetryingResolver::new(Arc::new(PipedFactory::new(config.instance.clone())))
            .context("Failed to create resolver")?,
    );

    let (device_events, device_events_rx) = output::device_channel();
    let device = open_output(config.output, device_events)?;

    let session = SessionHandle::spawn(config.session_config(), resolver, device, device_events_rx);
    let controller = AppController::new(session.clone());

    if let Some(query) = config.query.clone() {
        controller.start_search(query);
    }

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &session, controller).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    if session.close().is_err() {
        tracing::debug!("Session already closed");
    }
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, session.closed()).await.is_err() {
        tracing::warn!("Playback session did not shut down in time");
    }

    tracing::info!("tubeplay shutting down");
    Ok(())
}

fn open_output(kind: OutputKind, events: DeviceEventSender) -> Result<Box<dyn OutputDevice>> {
    match kind {
        OutputKind::Simulated => Ok(Box::new(SimulatedOutput::spawn(events, SimulatedOptions::default()))),
        OutputKind::Rodio => open_rodio(events),
    }
}

#[cfg(feature = "rodio-output")]
fn open_rodio(events: DeviceEventSender) -> Result<Box<dyn OutputDevice>> {
    let device = output::RodioOutput::spawn(events, tokio::runtime::Handle::current())?;
    Ok(Box::new(device))
}

#[cfg(not(feature = "rodio-output"))]
fn open_rodio(events: DeviceEventSender) -> Result<Box<dyn OutputDevice>> {
    tracing::warn!("Built without the rodio-output feature; falling back to simulated output");
    Ok(Box::new(SimulatedOutput::spawn(events, SimulatedOptions::default())))
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &SessionHandle,
    controller: AppController,
) -> Result<()> {
    loop {
        let snapshot = session.state();
        let ui_state = controller.ui_state().await;

        terminal.draw(|f| {
            AppView::render(f, &snapshot, &ui_state);
        })?;

        if ui_state.should_quit {
            break;
        }

        // Handle input with shorter poll time for smoother UI updates
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Err(e) = controller.handle_key_event(key, &snapshot).await {
                    tracing::warn!(error = %e, "Key handling failed");
                }
            }
        }

        if session.is_closed() {
            tracing::warn!("Playback session ended unexpectedly");
            break;
        }
    }

    Ok(())
}
