//! Keystroke Stream - keystroke timing capture client
//!
//! Streams key timing to the configured server while this terminal window
//! has focus.

use anyhow::{Context, Result};
use crossterm::{
    event::{
        self, DisableFocusChange, EnableFocusChange, Event, KeyCode as CtKeyCode, KeyEventKind,
        KeyModifiers,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use std::fs::OpenOptions;
use std::io::{stdout, Stdout};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Instant;

use keystroke_stream::{
    capture::{KeystrokeCapture, Visibility},
    config::{data_dir, Config},
    keyboard::{KeyEvent, KeyboardListener},
    transport::{MemoryTransport, TransportChannel, WebSocketTransport},
    ui::{App, AppState, AppView, HelpPanel, RecordsPanel, StatusBar, SummaryPanel},
};

#[cfg(target_os = "linux")]
use keystroke_stream::keyboard::{evdev_status, EvdevListener};

type Backend = CrosstermBackend<Stdout>;

/// Send log output to a file; the terminal belongs to the UI
fn init_logging() {
    let Ok(dir) = data_dir() else {
        return;
    };
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("keystroke-stream.log"))
    else {
        return;
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .init();
}

/// Keyboard source: evdev on Linux when readable, device_query otherwise
enum KeySource {
    Polling(KeyboardListener),
    #[cfg(target_os = "linux")]
    Evdev(EvdevListener),
}

impl KeySource {
    fn poll(&mut self) -> usize {
        match self {
            Self::Polling(listener) => listener.poll(),
            #[cfg(target_os = "linux")]
            Self::Evdev(listener) => listener.poll(),
        }
    }
}

fn open_key_source(event_tx: mpsc::Sender<KeyEvent>) -> KeySource {
    #[cfg(target_os = "linux")]
    {
        if let Some(evdev) = EvdevListener::try_new(event_tx.clone()) {
            info!("evdev: {} device(s)", evdev.device_count());
            return KeySource::Evdev(evdev);
        }
        warn!("evdev unavailable ({}), using device_query", evdev_status());
    }
    KeySource::Polling(KeyboardListener::new(event_tx))
}

fn main() -> Result<()> {
    let config = Config::load()
        .context("Failed to load config")?
        .with_env_overrides();
    init_logging();

    let endpoint = config.endpoint().context("Invalid server endpoint")?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let transport: Box<dyn TransportChannel> = if config.server.offline {
        info!("offline mode, events stay in process");
        Box::new(MemoryTransport::opened())
    } else {
        Box::new(WebSocketTransport::connect(&endpoint, runtime.handle()))
    };

    let capture = KeystrokeCapture::new(transport, Instant::now())
        .with_pending_on_hide(config.capture.pending_on_hide);
    let mut app = App::new(config.clone(), capture, endpoint.to_string());

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let interrupted = Arc::clone(&interrupted);
        ctrlc::set_handler(move || interrupted.store(true, Ordering::SeqCst))
            .context("Failed to install signal handler")?;
    }

    let (event_tx, event_rx) = mpsc::channel::<KeyEvent>();
    let mut source = open_key_source(event_tx);

    enable_raw_mode()?;
    let mut out = stdout();
    execute!(out, EnterAlternateScreen, EnableFocusChange)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(out))?;

    let result = run(&mut terminal, &mut app, &mut source, &event_rx, &interrupted);

    // Restore the terminal even when the loop failed
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableFocusChange
    )?;
    terminal.show_cursor()?;

    app.close();
    if config.report.export_on_exit {
        match config.report_dir() {
            Ok(dir) => match app.export_report(&dir) {
                Ok(path) => println!("Report written to {}", path.display()),
                Err(e) => warn!("report export failed: {}", e),
            },
            Err(e) => warn!("no report directory: {}", e),
        }
    }

    println!("\nKeystroke Stream session complete.");
    println!("Keystrokes sent: {}", app.stats.keystrokes());
    println!("Session duration: {}", app.elapsed_formatted());

    drop(app);
    runtime.shutdown_timeout(std::time::Duration::from_millis(500));

    result
}

/// Deliver every key event the source has seen so far
fn drain_keys(
    app: &mut App<Box<dyn TransportChannel>>,
    source: &mut KeySource,
    event_rx: &mpsc::Receiver<KeyEvent>,
) {
    source.poll();
    while let Ok(key_event) = event_rx.try_recv() {
        app.process_event(&key_event);
    }
}

fn run(
    terminal: &mut Terminal<Backend>,
    app: &mut App<Box<dyn TransportChannel>>,
    source: &mut KeySource,
    event_rx: &mpsc::Receiver<KeyEvent>,
    interrupted: &AtomicBool,
) -> Result<()> {
    let tick_rate = app.config.refresh_interval();

    loop {
        drain_keys(app, source, event_rx);
        app.pump_status();

        terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(8), // Session summary
                    Constraint::Min(5),    // Records or help
                    Constraint::Length(1), // Status bar
                ])
                .split(frame.area());

            let entries = app.summary_entries();
            frame.render_widget(SummaryPanel::new(&entries), chunks[0]);

            match app.view {
                AppView::Help => frame.render_widget(HelpPanel, chunks[1]),
                AppView::Capture => frame.render_widget(RecordsPanel::new(&app.recent), chunks[1]),
            }

            let state = if app.capture.is_visible() {
                "CAPTURING"
            } else {
                "PAUSED"
            };
            let elapsed = app.elapsed_formatted();
            let status = StatusBar::new(state, app.view.name(), &elapsed, app.stats.keystrokes())
                .message(app.status.text());
            frame.render_widget(status, chunks[2]);
        })?;

        if event::poll(tick_rate)? {
            match event::read()? {
                // Keys from the blocked tick belong to the state before the change
                Event::FocusLost => {
                    drain_keys(app, source, event_rx);
                    app.set_visibility(Visibility::Hidden, Instant::now());
                }
                Event::FocusGained => {
                    drain_keys(app, source, event_rx);
                    app.set_visibility(Visibility::Visible, Instant::now());
                }
                Event::Key(key) if key.kind == KeyEventKind::Press => match key.code {
                    CtKeyCode::Char('q') | CtKeyCode::Esc => app.quit(),
                    CtKeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.quit()
                    }
                    CtKeyCode::Char('?') => app.toggle_help(),
                    CtKeyCode::Char('r') => app.reset_stats(),
                    CtKeyCode::Char('e') => match app.config.report_dir() {
                        Ok(dir) => {
                            if let Err(e) = app.export_report(&dir) {
                                app.set_status(&format!("Export failed: {}", e));
                            }
                        }
                        Err(e) => app.set_status(&format!("Export failed: {}", e)),
                    },
                    _ => {}
                },
                _ => {}
            }
        }

        if interrupted.load(Ordering::SeqCst) {
            app.quit();
        }
        if app.state == AppState::Quitting {
            return Ok(());
        }
    }
}
