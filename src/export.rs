//! JSON export of the roster with each patient's evaluated alert.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use vitalwatch_types::{Admission, AlertState, ChannelKind, PatientId, RiskScores};

use crate::data::alerts::evaluate_alerts;
use crate::data::risk::RiskLevel;
use crate::session::{PatientEntry, Session};

/// Default file written by the `e` key.
pub const DEFAULT_EXPORT_FILE: &str = "vitalwatch_export.json";

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub summary: ReportSummary,
    pub patients: Vec<PatientReport>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReportSummary {
    pub total_patients: usize,
    pub high_risk: usize,
    pub medium_risk: usize,
    pub low_risk: usize,
    /// Patients for whom at least one alert rule fires.
    pub alerting: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatientReport {
    pub id: PatientId,
    pub admission: Admission,
    pub risk: RiskScores,
    pub risk_level: RiskLevel,
    /// Latest raw value per channel, keyed by CSV header.
    pub latest: BTreeMap<&'static str, Option<f64>>,
    pub alert: AlertState,
}

impl PatientReport {
    fn new(entry: &PatientEntry, session: &Session) -> Self {
        let record = &entry.record;
        let latest = ChannelKind::ALL
            .iter()
            .map(|kind| (kind.csv_header(), record.latest(*kind)))
            .collect();
        Self {
            id: record.id.clone(),
            admission: record.admission.clone(),
            risk: record.risk,
            risk_level: RiskLevel::of(record),
            latest,
            alert: evaluate_alerts(record, session.thresholds()),
        }
    }
}

/// Evaluate every patient in the session.
///
/// Evaluation here is independent of the session's own alert state, which
/// only tracks the selected patient.
pub fn build_report(session: &Session) -> Report {
    let patients: Vec<PatientReport> = session
        .patients()
        .map(|entry| PatientReport::new(entry, session))
        .collect();

    let mut summary = ReportSummary {
        total_patients: patients.len(),
        ..Default::default()
    };
    for p in &patients {
        match p.risk_level {
            RiskLevel::High => summary.high_risk += 1,
            RiskLevel::Medium => summary.medium_risk += 1,
            RiskLevel::Low => summary.low_risk += 1,
        }
        if p.alert.active {
            summary.alerting += 1;
        }
    }

    Report { summary, patients }
}

/// Write a report as pretty-printed JSON.
pub fn write_report(report: &Report, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    let mut file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(json.as_bytes())?;
    Ok(())
}
