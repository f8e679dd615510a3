//! ## Terminal UI
//!
//! Renders a [`DashboardState`] with ratatui: a title bar carrying the connectivity indicator,
//! the throughput chart, the alert list and a one-line status bar.
//!
//! Rendering is a pure function of the state so it can be exercised against a `TestBackend`.
//! [`PanelTerminal`] owns the real terminal and restores it on drop.

mod alert_log;
mod chart;
mod header;

use std::io::{self, Stdout};

use apollo_apps::state::DashboardState;
use crossterm::{
    event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};

pub use alert_log::{country_flag, severity_color, NEUTRAL_FLAG};
pub use chart::CHART_TITLE;
pub use header::indicator;

/// Draws the whole panel.
pub fn draw(f: &mut Frame, state: &DashboardState, backend_url: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Title + indicator
            Constraint::Percentage(45), // Chart
            Constraint::Min(5),         // Alerts
            Constraint::Length(1),      // Status bar
        ])
        .split(f.area());

    header::draw_header(f, state, chunks[0]);
    chart::draw_throughput(f, &state.throughput, chunks[1]);
    alert_log::draw_alerts(f, &state.alerts, chunks[2]);
    header::draw_status_bar(f, state, backend_url, chunks[3]);
}

/// Whether a terminal event asks the panel to quit (`q`, `Esc`, `Ctrl+C`).
pub fn is_quit(event: &Event) -> bool {
    match event {
        Event::Key(KeyEvent {
            code,
            modifiers,
            kind: KeyEventKind::Press,
            ..
        }) => match code {
            KeyCode::Char('q') | KeyCode::Esc => true,
            KeyCode::Char('c') => modifiers.contains(KeyModifiers::CONTROL),
            _ => false,
        },
        _ => false,
    }
}

/// Raw-mode alternate-screen terminal, restored when dropped.
pub struct PanelTerminal {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    restored: bool,
}

impl PanelTerminal {
    pub fn enter() -> io::Result<Self> {
        Self::enter_with(|stdout| Terminal::new(CrosstermBackend::new(stdout)))
    }

    // Any failure after raw mode is enabled leaves the terminal as it was found.
    fn enter_with<F>(build: F) -> io::Result<Self>
    where
        F: FnOnce(Stdout) -> io::Result<Terminal<CrosstermBackend<Stdout>>>,
    {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(e) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(e);
        }
        match build(stdout) {
            Ok(terminal) => Ok(Self {
                terminal,
                restored: false,
            }),
            Err(e) => {
                leave_screen();
                Err(e)
            }
        }
    }

    pub fn draw(&mut self, state: &DashboardState, backend_url: &str) -> io::Result<()> {
        self.terminal.draw(|f| draw(f, state, backend_url))?;
        Ok(())
    }

    /// Leaves the alternate screen and raw mode.
    pub fn restore(&mut self) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }
}

fn leave_screen() {
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
    let _ = disable_raw_mode();
}

impl Drop for PanelTerminal {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
