//! Newest-first alert list.

use apollo_apps::{message::AlertRecord, stores::AlertLog, time_fmt::clock_label_f64};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Shown instead of a flag when the country is unknown.
pub const NEUTRAL_FLAG: &str = "🌐";

/// Regional-indicator flag for a two-letter ISO country code.
pub fn country_flag(country_code: Option<&str>) -> String {
    let Some(code) = country_code else {
        return NEUTRAL_FLAG.to_string();
    };
    let code = code.trim();
    if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return NEUTRAL_FLAG.to_string();
    }
    code.chars()
        .filter_map(|c| {
            let offset = c.to_ascii_uppercase() as u32 - 'A' as u32;
            char::from_u32(0x1F1E6 + offset)
        })
        .collect()
}

/// Row color for a lower-cased severity.
pub fn severity_color(severity: Option<&str>) -> Color {
    match severity {
        Some("critical") | Some("high") => Color::Red,
        Some("medium") => Color::Yellow,
        Some("low") => Color::Blue,
        _ => Color::Reset,
    }
}

fn alert_line(alert: &AlertRecord) -> Line<'static> {
    let severity = alert.severity_class();
    let style = Style::default().fg(severity_color(severity.as_deref()));
    let country = alert.country_class();

    Line::from(vec![
        Span::raw(format!("{} ", country_flag(country.as_deref()))),
        Span::styled(
            format!("{:<16}", alert.ip),
            style.add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            format!(" {} ", clock_label_f64(alert.timestamp)),
            Style::default().fg(Color::Gray),
        ),
        Span::raw(format!("{:<24} ", alert.hostname().unwrap_or("N/A"))),
        Span::styled(
            alert.reason.clone().unwrap_or_default(),
            style,
        ),
        Span::styled(
            alert
                .action
                .as_ref()
                .map(|a| format!("  [{a}]"))
                .unwrap_or_default(),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

pub fn draw_alerts(f: &mut Frame, alerts: &AlertLog, area: Rect) {
    let items: Vec<ListItem> = if alerts.is_empty() {
        vec![ListItem::new(Span::styled(
            "No alerts received",
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
        ))]
    } else {
        alerts.iter().map(|a| ListItem::new(alert_line(a))).collect()
    };

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!(" Security Alerts ({}) ", alerts.len())),
    );
    f.render_widget(list, area);
}
