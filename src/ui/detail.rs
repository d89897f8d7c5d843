//! Detail overlay rendering.
//!
//! Displays a modal overlay with admission attributes and risk scores for
//! the highlighted (roster) or selected (vitals) patient.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table},
    Frame,
};
use vitalwatch_types::ChannelKind;

use crate::app::App;
use crate::data::risk::RiskLevel;

/// Minimum width required for the detail overlay to render properly.
const MIN_OVERLAY_WIDTH: u16 = 50;
/// Minimum height required for the detail overlay to render properly.
const MIN_OVERLAY_HEIGHT: u16 = 16;

/// Render the patient detail as a modal overlay.
pub fn render_overlay(frame: &mut Frame, app: &App, area: Rect) {
    if area.width < MIN_OVERLAY_WIDTH || area.height < MIN_OVERLAY_HEIGHT {
        return;
    }

    let Some(entry) = app.detail_patient() else {
        return;
    };
    let record = &entry.record;
    let admission = &record.admission;

    let overlay_width = (area.width * 80 / 100).clamp(MIN_OVERLAY_WIDTH, 90);
    let overlay_height = (area.height * 80 / 100).clamp(MIN_OVERLAY_HEIGHT, 30);
    let x = area.x + (area.width.saturating_sub(overlay_width)) / 2;
    let y = area.y + (area.height.saturating_sub(overlay_height)) / 2;
    let overlay_area = Rect::new(x, y, overlay_width, overlay_height);

    frame.render_widget(Clear, overlay_area);

    let chunks = Layout::vertical([
        Constraint::Length(9), // Admission
        Constraint::Min(6),    // Channel coverage
        Constraint::Length(1), // Footer
    ])
    .split(overlay_area);

    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());
    let number = |v: Option<f64>, unit: &str| {
        v.map(|n| format!("{:.1}{}", n, unit))
            .unwrap_or_else(|| "-".into())
    };

    let level = RiskLevel::of(record);
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let header_lines = vec![
        Line::from(vec![Span::styled(format!(" Patient {} ", record.id), bold)]),
        Line::from(""),
        Line::from(vec![
            Span::raw(" Hospital: "),
            Span::styled(text(&admission.hospital_id), bold),
            Span::raw("    Admitted: "),
            Span::styled(text(&admission.admission_time), bold),
        ]),
        Line::from(vec![
            Span::raw(" Diagnosis: "),
            Span::styled(text(&admission.diagnosis), bold),
        ]),
        Line::from(vec![
            Span::raw(" Age: "),
            Span::styled(
                admission.age.map(|a| a.to_string()).unwrap_or_else(|| "-".into()),
                bold,
            ),
            Span::raw("    Gender: "),
            Span::styled(text(&admission.gender), bold),
        ]),
        Line::from(vec![
            Span::raw(" Weight: "),
            Span::styled(number(admission.weight_kg, " kg"), bold),
            Span::raw("    Height: "),
            Span::styled(number(admission.height_cm, " cm"), bold),
            Span::raw("    BMI: "),
            Span::styled(number(admission.bmi(), ""), bold),
        ]),
        Line::from(vec![
            Span::raw(" Mortality: "),
            Span::styled(
                format!("{:.1}% {}", record.risk.mortality * 100.0, level.label()),
                app.theme.risk_style(level),
            ),
            Span::raw("    Decompensation: "),
            Span::styled(format!("{:.1}%", record.risk.decompensation * 100.0), bold),
            Span::raw("    LOS: "),
            Span::styled(format!("{:.1} days", record.risk.los_days), bold),
        ]),
    ];

    let header = Paragraph::new(header_lines).block(
        Block::default()
            .title(" Admission ")
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.highlight)),
    );
    frame.render_widget(header, chunks[0]);

    let coverage_header = Row::new(vec![
        Cell::from("Channel"),
        Cell::from("Points"),
        Cell::from("Observed"),
        Cell::from("Missing"),
    ])
    .height(1)
    .style(app.theme.header);

    let coverage_rows: Vec<Row> = ChannelKind::ALL
        .iter()
        .map(|kind| {
            let (len, observed) = record
                .channel(*kind)
                .map(|c| (c.len(), c.observed_count()))
                .unwrap_or((0, 0));
            let missing = len - observed;
            let missing_cell = if missing > 0 {
                Cell::from(missing.to_string()).style(Style::default().fg(app.theme.warning))
            } else {
                Cell::from("0")
            };
            Row::new(vec![
                Cell::from(kind.label()),
                Cell::from(len.to_string()),
                Cell::from(observed.to_string()),
                missing_cell,
            ])
        })
        .collect();

    let coverage = Table::new(
        coverage_rows,
        [
            Constraint::Fill(2),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(9),
        ],
    )
    .header(coverage_header)
    .block(
        Block::default()
            .title(format!(" Channels ({} points) ", record.point_count()))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(coverage, chunks[1]);

    let footer = Paragraph::new(Line::from(vec![Span::styled(
        " Press Esc to close ",
        Style::default().add_modifier(Modifier::DIM),
    )]));
    frame.render_widget(footer, chunks[2]);
}
