//! Threshold rules evaluated against a patient's latest data.
//!
//! Rules are checked in a fixed order and every rule that fires contributes
//! one clause to the alert message. A rule whose input is absent (empty
//! channel, or a missing latest point) simply does not fire.

use serde::{Deserialize, Serialize};
use vitalwatch_types::{AlertState, ChannelKind, PatientRecord};

/// Joins the clauses of a multi-rule alert.
pub const CLAUSE_SEPARATOR: &str = " | ";

/// Thresholds for the alert rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertThresholds {
    /// Latest O2 saturation at or below this fires (percent).
    pub o2_critical: f64,
    /// Latest respiratory rate above this fires (breaths/min).
    pub resp_rate_high: f64,
    /// Decompensation risk above this percentage fires.
    pub decompensation_pct: f64,
    /// Length-of-stay estimate above this many days fires.
    pub los_days: f64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            o2_critical: 50.0,
            resp_rate_high: 30.0,
            decompensation_pct: 70.0,
            los_days: 14.0,
        }
    }
}

/// How urgent a fired rule is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Severity {
    Warning,
    Critical,
}

impl Severity {
    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            Severity::Warning => "WARN",
            Severity::Critical => "CRIT",
        }
    }
}

/// The fixed rule set, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlertRule {
    LowO2Saturation,
    HighRespiratoryRate,
    HighDecompensationRisk,
    ExtendedStay,
}

impl AlertRule {
    pub const ALL: [AlertRule; 4] = [
        AlertRule::LowO2Saturation,
        AlertRule::HighRespiratoryRate,
        AlertRule::HighDecompensationRisk,
        AlertRule::ExtendedStay,
    ];

    pub fn severity(&self) -> Severity {
        match self {
            AlertRule::LowO2Saturation => Severity::Critical,
            _ => Severity::Warning,
        }
    }

    /// Check this rule. Returns the finding if it fires.
    pub fn check(&self, patient: &PatientRecord, thresholds: &AlertThresholds) -> Option<Finding> {
        let (value, fires) = match self {
            AlertRule::LowO2Saturation => {
                let v = patient.latest(ChannelKind::O2Saturation)?;
                (v, v <= thresholds.o2_critical)
            }
            AlertRule::HighRespiratoryRate => {
                let v = patient.latest(ChannelKind::RespiratoryRate)?;
                (v, v > thresholds.resp_rate_high)
            }
            AlertRule::HighDecompensationRisk => {
                let pct = patient.risk.decompensation * 100.0;
                (pct, pct > thresholds.decompensation_pct)
            }
            AlertRule::ExtendedStay => {
                let v = patient.risk.los_days;
                (v, v > thresholds.los_days)
            }
        };

        fires.then(|| Finding {
            rule: *self,
            value,
            message: self.describe(value),
        })
    }

    fn describe(&self, value: f64) -> String {
        match self {
            AlertRule::LowO2Saturation => format!("Critical: O2 saturation at {:.1}%", value),
            AlertRule::HighRespiratoryRate => {
                format!("High respiratory rate: {:.1} breaths/min", value)
            }
            AlertRule::HighDecompensationRisk => {
                format!("High decompensation risk: {:.1}%", value)
            }
            AlertRule::ExtendedStay => format!("Extended stay likely: {:.1} days", value),
        }
    }
}

/// A rule that fired, with the value that triggered it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub rule: AlertRule,
    pub value: f64,
    pub message: String,
}

impl Finding {
    pub fn severity(&self) -> Severity {
        self.rule.severity()
    }
}

/// All rules that currently fire, in rule order.
pub fn triggered(patient: &PatientRecord, thresholds: &AlertThresholds) -> Vec<Finding> {
    AlertRule::ALL
        .iter()
        .filter_map(|rule| rule.check(patient, thresholds))
        .collect()
}

/// Evaluate the rule set for a patient.
///
/// Active iff at least one rule fires. The message is the patient id
/// followed by every fired clause joined with [`CLAUSE_SEPARATOR`].
/// Pure: the same record and thresholds always give the same state.
pub fn evaluate_alerts(patient: &PatientRecord, thresholds: &AlertThresholds) -> AlertState {
    let findings = triggered(patient, thresholds);
    if findings.is_empty() {
        return AlertState::quiet(patient.id.clone());
    }

    let clauses: Vec<&str> = findings.iter().map(|f| f.message.as_str()).collect();
    let message = format!("Patient {}: {}", patient.id, clauses.join(CLAUSE_SEPARATOR));
    AlertState::alerting(patient.id.clone(), message)
}

/// Highest severity among the fired rules, if any fired.
pub fn worst_severity(findings: &[Finding]) -> Option<Severity> {
    findings.iter().map(Finding::severity).max()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalwatch_types::{Offset, RiskScores};

    fn patient(o2: Option<f64>, rr: Option<f64>, decomp: f64, los: f64) -> PatientRecord {
        let mut p = PatientRecord::new("141168");
        p.risk = RiskScores::new(0.1, decomp, los);
        if let Some(v) = o2 {
            p.channel_mut(ChannelKind::O2Saturation).push(Offset(0), Some(97.0));
            p.channel_mut(ChannelKind::O2Saturation).push(Offset(60), Some(v));
        }
        if let Some(v) = rr {
            p.channel_mut(ChannelKind::RespiratoryRate).push(Offset(60), Some(v));
        }
        p
    }

    #[test]
    fn low_o2_only() {
        let p = patient(Some(48.0), None, 0.4, 5.0);
        let state = evaluate_alerts(&p, &AlertThresholds::default());
        assert!(state.active);
        assert_eq!(state.message, "Patient 141168: Critical: O2 saturation at 48.0%");
        assert!(!state.message.contains(CLAUSE_SEPARATOR));
    }

    #[test]
    fn three_rules_in_fixed_order() {
        let p = patient(Some(96.0), Some(35.0), 0.75, 20.0);
        let findings = triggered(&p, &AlertThresholds::default());
        let rules: Vec<_> = findings.iter().map(|f| f.rule).collect();
        assert_eq!(
            rules,
            vec![
                AlertRule::HighRespiratoryRate,
                AlertRule::HighDecompensationRisk,
                AlertRule::ExtendedStay
            ]
        );

        let state = evaluate_alerts(&p, &AlertThresholds::default());
        assert_eq!(
            state.message,
            "Patient 141168: High respiratory rate: 35.0 breaths/min | \
             High decompensation risk: 75.0% | Extended stay likely: 20.0 days"
        );
    }

    #[test]
    fn nothing_fires() {
        let p = patient(Some(96.0), Some(18.0), 0.2, 4.0);
        let state = evaluate_alerts(&p, &AlertThresholds::default());
        assert!(!state.active);
        assert!(state.message.is_empty());
        assert_eq!(state.patient_id, Some(p.id.clone()));
    }

    #[test]
    fn boundaries() {
        let t = AlertThresholds::default();
        // O2 fires at exactly the threshold, respiratory rate does not
        let at_o2 = patient(Some(50.0), None, 0.0, 0.0);
        let at_rr = patient(None, Some(30.0), 0.0, 0.0);
        assert!(AlertRule::LowO2Saturation.check(&at_o2, &t).is_some());
        assert!(AlertRule::HighRespiratoryRate.check(&at_rr, &t).is_none());

        let at_los = patient(None, None, 0.0, 14.0);
        let over_los = patient(None, None, 0.0, 14.5);
        assert!(AlertRule::ExtendedStay.check(&at_los, &t).is_none());
        assert!(AlertRule::ExtendedStay.check(&over_los, &t).is_some());
    }

    #[test]
    fn missing_latest_point_does_not_fire() {
        let mut p = patient(Some(40.0), None, 0.0, 0.0);
        p.channel_mut(ChannelKind::O2Saturation).push(Offset(120), None);
        assert!(triggered(&p, &AlertThresholds::default()).is_empty());
    }

    #[test]
    fn nan_risk_does_not_fire() {
        let p = patient(None, None, f64::NAN, f64::NAN);
        assert!(!evaluate_alerts(&p, &AlertThresholds::default()).active);
    }

    #[test]
    fn custom_thresholds() {
        let t = AlertThresholds {
            o2_critical: 90.0,
            ..Default::default()
        };
        let p = patient(Some(88.0), None, 0.0, 0.0);
        assert!(evaluate_alerts(&p, &t).active);
    }

    #[test]
    fn evaluation_is_idempotent() {
        let p = patient(Some(45.0), Some(40.0), 0.9, 30.0);
        let t = AlertThresholds::default();
        assert_eq!(evaluate_alerts(&p, &t), evaluate_alerts(&p, &t));
    }

    #[test]
    fn worst_severity_picks_critical() {
        let p = patient(Some(45.0), Some(40.0), 0.0, 0.0);
        let findings = triggered(&p, &AlertThresholds::default());
        assert_eq!(worst_severity(&findings), Some(Severity::Critical));
        assert_eq!(worst_severity(&[]), None);
    }
}
