//! Risk-level bucketing for the patient roster.

use serde::Serialize;
use vitalwatch_types::PatientRecord;

/// Mortality risk above this is high.
pub const HIGH_RISK: f64 = 0.5;
/// Mortality risk above this (and not high) is medium.
pub const MEDIUM_RISK: f64 = 0.2;

/// Coarse mortality risk bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Bucket a mortality probability.
    pub fn from_mortality(risk: f64) -> Self {
        if risk > HIGH_RISK {
            RiskLevel::High
        } else if risk > MEDIUM_RISK {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn of(patient: &PatientRecord) -> Self {
        Self::from_mortality(patient.risk.mortality)
    }

    /// Returns a short symbol for display.
    pub fn symbol(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MED",
            RiskLevel::High => "HIGH",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

/// Roster filter on risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RiskFilter {
    #[default]
    All,
    Only(RiskLevel),
}

impl RiskFilter {
    /// Cycle All → High → Medium → Low → All.
    pub fn next(self) -> Self {
        match self {
            RiskFilter::All => RiskFilter::Only(RiskLevel::High),
            RiskFilter::Only(RiskLevel::High) => RiskFilter::Only(RiskLevel::Medium),
            RiskFilter::Only(RiskLevel::Medium) => RiskFilter::Only(RiskLevel::Low),
            RiskFilter::Only(RiskLevel::Low) => RiskFilter::All,
        }
    }

    pub fn accepts(&self, patient: &PatientRecord) -> bool {
        match self {
            RiskFilter::All => true,
            RiskFilter::Only(level) => RiskLevel::of(patient) == *level,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskFilter::All => "All",
            RiskFilter::Only(level) => level.label(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalwatch_types::RiskScores;

    #[test]
    fn buckets_are_exclusive_at_the_boundary() {
        assert_eq!(RiskLevel::from_mortality(0.5), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_mortality(0.51), RiskLevel::High);
        assert_eq!(RiskLevel::from_mortality(0.2), RiskLevel::Low);
        assert_eq!(RiskLevel::from_mortality(0.32), RiskLevel::Medium);
    }

    #[test]
    fn ordering_high_last() {
        assert!(RiskLevel::High > RiskLevel::Medium);
        assert!(RiskLevel::Medium > RiskLevel::Low);
    }

    #[test]
    fn filter_cycle_returns_to_all() {
        let mut f = RiskFilter::All;
        for _ in 0..4 {
            f = f.next();
        }
        assert_eq!(f, RiskFilter::All);
    }

    #[test]
    fn filter_accepts_matching_level() {
        let mut p = PatientRecord::new("1");
        p.risk = RiskScores::new(0.7, 0.0, 0.0);
        assert!(RiskFilter::All.accepts(&p));
        assert!(RiskFilter::Only(RiskLevel::High).accepts(&p));
        assert!(!RiskFilter::Only(RiskLevel::Low).accepts(&p));
    }
}
