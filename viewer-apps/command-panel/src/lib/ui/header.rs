//! Title bar with the connectivity indicator, and the bottom status line.

use apollo_apps::state::{ConnectionState, DashboardState};
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub(crate) const ACTIVE_COLOR: Color = Color::Rgb(82, 196, 26);
pub(crate) const INACTIVE_COLOR: Color = Color::Rgb(233, 69, 96);

/// Styled indicator span: green "Active" or red "Inactive".
pub fn indicator(connection: ConnectionState) -> Span<'static> {
    let color = if connection.is_connected() {
        ACTIVE_COLOR
    } else {
        INACTIVE_COLOR
    };
    Span::styled(
        format!(" ● {} ", connection.label()),
        Style::default()
            .fg(Color::Black)
            .bg(color)
            .add_modifier(Modifier::BOLD),
    )
}

pub fn draw_header(f: &mut Frame, state: &DashboardState, area: Rect) {
    let title = Line::from(vec![
        Span::styled(
            " Apollo Command Panel ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        indicator(state.connection),
    ]);

    let header = Paragraph::new(title).block(Block::default().borders(Borders::ALL));
    f.render_widget(header, area);
}

pub fn draw_status_bar(f: &mut Frame, state: &DashboardState, backend_url: &str, area: Rect) {
    let counters = &state.counters;
    let mut spans = vec![
        Span::raw(format!(" {backend_url}  ")),
        Span::raw(format!(
            "frames:{} throughput:{} alerts:{} ignored:{} ",
            counters.total_frames(),
            counters.throughput_frames,
            counters.alert_frames,
            counters.ignored_frames,
        )),
    ];
    if counters.malformed_frames > 0 {
        spans.push(Span::styled(
            format!("malformed:{} ", counters.malformed_frames),
            Style::default().fg(Color::Yellow),
        ));
    }
    spans.push(Span::raw(format!(
        "reconnects:{} ",
        counters.reconnects_scheduled
    )));
    spans.push(Span::styled(
        " q:quit ",
        Style::default().fg(Color::DarkGray),
    ));

    let status = Paragraph::new(Line::from(spans)).alignment(Alignment::Left);
    f.render_widget(status, area);
}
