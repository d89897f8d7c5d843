//! Vitals view rendering.
//!
//! One row per channel of the selected patient: latest raw value against
//! its normal range, latest z-score, observation count and a sparkline of
//! the normalized series. Fired alert rules are listed underneath.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};
use vitalwatch_types::ChannelKind;

use crate::app::App;
use crate::data::duration::format_offset;
use crate::data::trend::sparkline;

/// Sparkline characters (8 levels of height).
const SPARKLINE_CHARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(entry) = app.session.selected() else {
        let empty = Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "  No patient selected. Pick one from the roster with Enter.",
                Style::default().add_modifier(Modifier::DIM),
            )),
        ])
        .block(
            Block::default()
                .title(" Vitals ")
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        );
        frame.render_widget(empty, area);
        return;
    };

    let findings = app.session.findings();
    let chunks = Layout::vertical([
        Constraint::Min(6),
        Constraint::Length(findings.len().max(1) as u16 + 2),
    ])
    .split(area);

    let record = &entry.record;
    let header = Row::new(vec![
        Cell::from("Channel"),
        Cell::from("Latest"),
        Cell::from("Unit"),
        Cell::from("Normal"),
        Cell::from("Z"),
        Cell::from("Obs"),
        Cell::from("Trend"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = ChannelKind::ALL
        .iter()
        .map(|kind| {
            let channel = record.channel(*kind);
            let latest = record.latest(*kind);
            let latest_cell = match latest {
                Some(v) => Cell::from(format!("{:.1}", v))
                    .style(app.theme.value_style(kind.is_abnormal(v))),
                None => Cell::from("-"),
            };
            let range = kind
                .normal_range()
                .map(|r| format!("{}-{}", r.min, r.max))
                .unwrap_or_else(|| "-".into());
            let score = entry
                .latest_score(*kind)
                .map(|z| format!("{:+.2}", z))
                .unwrap_or_else(|| "-".into());
            let observed = channel
                .map(|c| format!("{}/{}", c.observed_count(), c.len()))
                .unwrap_or_else(|| "0/0".into());
            let trend = entry
                .normalized(*kind)
                .map(|c| render_sparkline(&sparkline(c, app.window)))
                .unwrap_or_default();

            let label = if kind.is_lab() {
                format!("{} (lab)", kind.label())
            } else {
                kind.label().to_string()
            };

            Row::new(vec![
                Cell::from(label),
                latest_cell,
                Cell::from(kind.unit()),
                Cell::from(range),
                Cell::from(score),
                Cell::from(observed),
                Cell::from(trend),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(16),
        Constraint::Length(8),
        Constraint::Length(12),
        Constraint::Length(10),
        Constraint::Length(7),
        Constraint::Length(9),
        Constraint::Fill(1),
    ];

    let last_offset = record
        .channels
        .values()
        .filter_map(|c| c.latest())
        .map(|p| p.offset)
        .max();
    let title = format!(
        " Vitals: Patient {} [{} pts{}] ",
        record.id,
        app.window,
        last_offset
            .map(|o| format!(", last {}", format_offset(o)))
            .unwrap_or_default()
    );

    let table = Table::new(rows, widths).header(header).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(table, chunks[0]);

    let lines: Vec<Line> = if findings.is_empty() {
        vec![Line::from(Span::styled(
            "  No alert rules firing",
            Style::default().fg(app.theme.healthy),
        ))]
    } else {
        findings
            .iter()
            .map(|f| {
                Line::from(vec![
                    Span::styled(
                        format!(" {} ", f.severity().symbol()),
                        app.theme.severity_style(f.severity()),
                    ),
                    Span::raw(f.message.clone()),
                ])
            })
            .collect()
    };

    let alerts = Paragraph::new(lines).block(
        Block::default()
            .title(format!(" Alert Rules ({}) ", findings.len()))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    );
    frame.render_widget(alerts, chunks[1]);
}

fn render_sparkline(data: &[u8]) -> String {
    data.iter()
        .map(|&v| SPARKLINE_CHARS[v.min(7) as usize])
        .collect()
}
