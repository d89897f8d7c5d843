//! Common UI components shared across views.
//!
//! This module contains the header bar, alert banner, tab bar, status bar,
//! and help overlay.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, View};
use crate::data::risk::RiskLevel;

/// Render the header bar with a roster overview.
///
/// Displays: patient counts by risk level and the current patient.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    if app.session.patient_count() == 0 {
        let line = Line::from(vec![
            Span::styled(" VITALWATCH ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("| Waiting for upload..."),
        ]);
        frame.render_widget(Paragraph::new(line), area);
        return;
    }

    let mut low = 0;
    let mut medium = 0;
    let mut high = 0;
    for p in app.session.patients() {
        match RiskLevel::of(&p.record) {
            RiskLevel::Low => low += 1,
            RiskLevel::Medium => medium += 1,
            RiskLevel::High => high += 1,
        }
    }

    let status_style = if app.session.alert().active {
        Style::default().fg(app.theme.critical).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(app.theme.healthy)
    };

    let current = app
        .session
        .selected_id()
        .map(|id| format!("Patient {}", id))
        .unwrap_or_else(|| "no patient selected".to_string());

    let count = |n: usize, level: RiskLevel| {
        if n > 0 {
            Span::styled(n.to_string(), app.theme.risk_style(level))
        } else {
            Span::styled("0", Style::default().add_modifier(Modifier::DIM))
        }
    };

    let line = Line::from(vec![
        Span::styled(" ● ", status_style),
        Span::styled("VITALWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        count(low, RiskLevel::Low),
        Span::raw(" low "),
        count(medium, RiskLevel::Medium),
        Span::raw(" med "),
        count(high, RiskLevel::High),
        Span::raw(" high │ "),
        Span::styled(
            app.session.patient_count().to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" patients │ "),
        Span::raw(current),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the alert banner for the current patient.
///
/// Empty when no rule fires.
pub fn render_alert_banner(frame: &mut Frame, app: &App, area: Rect) {
    let alert = app.session.alert();
    if !alert.active {
        return;
    }
    let banner = Paragraph::new(format!(" ⚠ {} ", alert.message)).style(app.theme.banner);
    frame.render_widget(banner, area);
}

/// Render the tab bar showing available views.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = vec![Line::from(" 1:Patients "), Line::from(" 2:Vitals ")];

    let selected = match app.current_view {
        View::Roster => 0,
        View::Vitals => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Render the status bar at the bottom.
///
/// Shows: data source, last upload, available controls. Also displays
/// temporary status messages and errors.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    if let Some(ref err) = app.load_error {
        let paragraph = Paragraph::new(format!(" Error: {} | q:quit", err))
            .style(Style::default().fg(app.theme.critical));
        frame.render_widget(paragraph, area);
        return;
    }

    let controls = match app.current_view {
        View::Roster if app.filter_active => "Type to search | Enter:apply Esc:cancel",
        View::Roster => "/:search s:sort f:risk Enter:select d:deselect ?:help q:quit",
        View::Vitals => "i:detail r:re-check d:deselect Esc:back ?:help q:quit",
    };

    let status = format!(
        " {} | {} | {}",
        app.source_description(),
        app.last_upload.as_deref().unwrap_or("no upload yet"),
        controls
    );

    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));
    frame.render_widget(paragraph, area);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ←/→ h/l     Switch views"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from("  Home/End    Jump to first/last"),
        Line::from("  Enter       Select patient"),
        Line::from("  i           Admission detail"),
        Line::from("  Esc         Go back"),
        Line::from(""),
        section(" Patients"),
        Line::from("  /         Search id or diagnosis"),
        Line::from("  c         Clear search"),
        Line::from("  f         Cycle risk filter"),
        Line::from("  s         Cycle sort column"),
        Line::from("  S         Toggle sort direction"),
        Line::from("  d         Deselect patient"),
        Line::from(""),
        section(" General"),
        Line::from("  r         Re-check alerts"),
        Line::from("  e         Export to JSON"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 28u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(ratatui::widgets::Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
