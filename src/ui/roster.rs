//! Patient roster rendering.
//!
//! Displays a table of loaded patients with risk scores, risk level and the
//! number of alert rules currently firing for each.

use std::cmp::Ordering;

use ratatui::{
    layout::{Constraint, Rect},
    style::{Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use crate::app::App;
use crate::data::alerts::{triggered, worst_severity};
use crate::data::risk::RiskLevel;
use crate::session::PatientEntry;

/// Column to sort the roster by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortColumn {
    #[default]
    Id,
    Mortality,
    Decompensation,
    LengthOfStay,
}

impl SortColumn {
    /// Cycle to the next sort column.
    pub fn next(self) -> Self {
        match self {
            SortColumn::Id => SortColumn::Mortality,
            SortColumn::Mortality => SortColumn::Decompensation,
            SortColumn::Decompensation => SortColumn::LengthOfStay,
            SortColumn::LengthOfStay => SortColumn::Id,
        }
    }

    fn indicator(&self) -> &'static str {
        match self {
            SortColumn::Id => "id",
            SortColumn::Mortality => "mortality",
            SortColumn::Decompensation => "decomp",
            SortColumn::LengthOfStay => "los",
        }
    }
}

/// Render the roster table.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let patients = app.visible_patients();
    let thresholds = app.session.thresholds();
    let selected_id = app.session.selected_id();

    let header = Row::new(vec![
        Cell::from(format_header("Patient", SortColumn::Id, app)),
        Cell::from("Diagnosis"),
        Cell::from("Age"),
        Cell::from(format_header("Mortality", SortColumn::Mortality, app)),
        Cell::from(format_header("Decomp", SortColumn::Decompensation, app)),
        Cell::from(format_header("LOS", SortColumn::LengthOfStay, app)),
        Cell::from("Risk"),
        Cell::from("Alerts"),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = patients
        .iter()
        .map(|p| {
            let record = &p.record;
            let level = RiskLevel::of(record);
            let findings = triggered(record, thresholds);
            let alert_cell = match worst_severity(&findings) {
                Some(severity) => Cell::from(format!("{} {}", severity.symbol(), findings.len()))
                    .style(app.theme.severity_style(severity)),
                None => Cell::from("-"),
            };

            let id_cell = if selected_id == Some(p.id()) {
                Cell::from(format!("● {}", p.id()))
                    .style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                Cell::from(format!("  {}", p.id()))
            };

            Row::new(vec![
                id_cell,
                Cell::from(record.admission.diagnosis.clone().unwrap_or_else(|| "-".into())),
                Cell::from(
                    record
                        .admission
                        .age
                        .map(|a| a.to_string())
                        .unwrap_or_else(|| "-".into()),
                ),
                Cell::from(format!("{:.0}%", record.risk.mortality * 100.0)),
                Cell::from(format!("{:.0}%", record.risk.decompensation * 100.0)),
                Cell::from(format!("{:.1}d", record.risk.los_days)),
                Cell::from(level.symbol()).style(app.theme.risk_style(level)),
                alert_cell,
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),   // Patient
        Constraint::Fill(3),   // Diagnosis
        Constraint::Length(5), // Age
        Constraint::Length(11),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Length(6), // Risk
        Constraint::Length(8), // Alerts
    ];

    let selected_visual_index = app.selected_index.min(patients.len().saturating_sub(1));
    let sort_dir = if app.sort_ascending { "↑" } else { "↓" };

    let filter_info = if app.filter_active {
        format!(" /{}_", app.filter_text)
    } else if !app.filter_text.is_empty() {
        format!(" /{}/ [c:clear]", app.filter_text)
    } else {
        String::new()
    };

    let position_info = if !patients.is_empty() {
        format!(" [{}/{}]", selected_visual_index + 1, patients.len())
    } else {
        String::new()
    };

    let title = format!(
        " Patients ({}/{}) [s:sort {}{}] [f:risk {}]{}{} ",
        patients.len(),
        app.session.patient_count(),
        app.sort_column.indicator(),
        sort_dir,
        app.risk_filter.label(),
        filter_info,
        position_info
    );

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(selected_visual_index));

    frame.render_stateful_widget(table, area, &mut state);
}

fn format_header(name: &str, col: SortColumn, app: &App) -> Span<'static> {
    if app.sort_column == col {
        let arrow = if app.sort_ascending { "↑" } else { "↓" };
        Span::raw(format!("{}{}", name, arrow))
    } else {
        Span::raw(name.to_string())
    }
}

/// Sort patients by the given column and direction, ties broken by id.
pub fn sort_patients_by(patients: &mut [&PatientEntry], column: SortColumn, ascending: bool) {
    patients.sort_by(|a, b| {
        let (ra, rb) = (&a.record.risk, &b.record.risk);
        let primary = match column {
            SortColumn::Id => a.id().cmp(b.id()),
            SortColumn::Mortality => ra.mortality.total_cmp(&rb.mortality),
            SortColumn::Decompensation => ra.decompensation.total_cmp(&rb.decompensation),
            SortColumn::LengthOfStay => ra.los_days.total_cmp(&rb.los_days),
        };

        let primary = if ascending {
            primary
        } else {
            primary.reverse()
        };

        if primary == Ordering::Equal {
            a.id().cmp(b.id())
        } else {
            primary
        }
    });
}
