//! Policy for patients that reappear in a later upload.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use vitalwatch_types::PatientRecord;

/// How an incoming record combines with a stored one of the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// The incoming record supersedes the stored one.
    #[default]
    Replace,
    /// Incoming points are appended to the stored channels.
    Append,
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::Replace => f.write_str("replace"),
            MergePolicy::Append => f.write_str("append"),
        }
    }
}

impl FromStr for MergePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "replace" => Ok(MergePolicy::Replace),
            "append" => Ok(MergePolicy::Append),
            other => Err(format!("Unknown merge policy: {}", other)),
        }
    }
}

/// What happened to one patient during an ingest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Added,
    Replaced,
    Appended,
}

/// Combine a stored record (if any) with an incoming one.
///
/// Under [`MergePolicy::Append`] channels are concatenated and stably
/// re-sorted by offset, admission attributes already known are kept, and the
/// incoming risk scores win since they are the newer model output.
pub fn merge_record(
    stored: Option<PatientRecord>,
    incoming: PatientRecord,
    policy: MergePolicy,
) -> (PatientRecord, MergeOutcome) {
    let Some(mut stored) = stored else {
        return (incoming, MergeOutcome::Added);
    };

    match policy {
        MergePolicy::Replace => (incoming, MergeOutcome::Replaced),
        MergePolicy::Append => {
            for (kind, channel) in &incoming.channels {
                stored.channel_mut(*kind).extend_from(channel);
            }
            stored.sort_channels();
            stored.admission.fill_from(&incoming.admission);
            stored.risk = incoming.risk;
            (stored, MergeOutcome::Appended)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalwatch_types::{ChannelKind, Offset, RiskScores};

    fn record(id: &str, points: &[(i64, f64)], mortality: f64) -> PatientRecord {
        let mut p = PatientRecord::new(id);
        for (offset, value) in points {
            p.channel_mut(ChannelKind::HeartRate)
                .push(Offset(*offset), Some(*value));
        }
        p.risk = RiskScores::new(mortality, 0.1, 3.0);
        p
    }

    #[test]
    fn new_patient_is_added() {
        let incoming = record("1", &[(0, 80.0)], 0.1);
        let (merged, outcome) = merge_record(None, incoming, MergePolicy::Append);
        assert_eq!(outcome, MergeOutcome::Added);
        assert_eq!(merged.point_count(), 1);
    }

    #[test]
    fn replace_discards_stored_points() {
        let stored = record("1", &[(0, 80.0), (5, 82.0)], 0.1);
        let incoming = record("1", &[(10, 90.0)], 0.4);
        let (merged, outcome) =
            merge_record(Some(stored), incoming.clone(), MergePolicy::Replace);
        assert_eq!(outcome, MergeOutcome::Replaced);
        assert_eq!(merged, incoming);
    }

    #[test]
    fn append_interleaves_by_offset() {
        let stored = record("1", &[(0, 80.0), (20, 82.0)], 0.1);
        let incoming = record("1", &[(10, 90.0)], 0.4);
        let (merged, outcome) = merge_record(Some(stored), incoming, MergePolicy::Append);
        assert_eq!(outcome, MergeOutcome::Appended);

        let hr = merged.channel(ChannelKind::HeartRate).unwrap();
        let offsets: Vec<i64> = hr.iter().map(|p| p.offset.as_minutes()).collect();
        assert_eq!(offsets, vec![0, 10, 20]);
        assert_eq!(hr.latest_value(), Some(82.0));
        assert_eq!(merged.risk.mortality, 0.4);
    }

    #[test]
    fn append_keeps_known_admission_attributes() {
        let mut stored = record("1", &[], 0.1);
        stored.admission.diagnosis = Some("Sepsis".into());
        let mut incoming = record("1", &[], 0.1);
        incoming.admission.diagnosis = Some("CHF".into());
        incoming.admission.age = Some(61);

        let (merged, _) = merge_record(Some(stored), incoming, MergePolicy::Append);
        assert_eq!(merged.admission.diagnosis.as_deref(), Some("Sepsis"));
        assert_eq!(merged.admission.age, Some(61));
    }

    #[test]
    fn policy_from_str() {
        assert_eq!("Append".parse::<MergePolicy>(), Ok(MergePolicy::Append));
        assert_eq!(" replace ".parse::<MergePolicy>(), Ok(MergePolicy::Replace));
        assert!("merge".parse::<MergePolicy>().is_err());
    }
}
