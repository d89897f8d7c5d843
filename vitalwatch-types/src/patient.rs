//! Patient records: admission attributes, channels and risk outputs.

use std::collections::BTreeMap;
use std::fmt;

use crate::{Channel, ChannelKind};

/// Unit stay identifier (`patientunitstayid`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct PatientId(pub String);

impl PatientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PatientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PatientId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Risk outputs produced upstream by the scoring models.
///
/// These are final numbers as far as this crate is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RiskScores {
    /// In-hospital mortality probability, in `[0, 1]`.
    pub mortality: f64,
    /// Probability of decompensation within 48h, in `[0, 1]`.
    pub decompensation: f64,
    /// Estimated remaining length of stay, in days.
    pub los_days: f64,
}

impl RiskScores {
    pub const fn new(mortality: f64, decompensation: f64, los_days: f64) -> Self {
        Self {
            mortality,
            decompensation,
            los_days,
        }
    }
}

/// Static admission attributes.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Admission {
    pub hospital_id: Option<String>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    /// APACHE admission diagnosis.
    pub diagnosis: Option<String>,
    /// Admission time as recorded in the source data.
    pub admission_time: Option<String>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
}

impl Admission {
    /// Body mass index, when both weight and height are known and plausible.
    pub fn bmi(&self) -> Option<f64> {
        let weight = self.weight_kg?;
        let height_m = self.height_cm? / 100.0;
        if height_m > 0.0 && weight > 0.0 {
            Some(weight / (height_m * height_m))
        } else {
            None
        }
    }

    /// Fill attributes that are unset here from another record.
    pub fn fill_from(&mut self, other: &Admission) {
        fn fill<T: Clone>(slot: &mut Option<T>, other: &Option<T>) {
            if slot.is_none() {
                slot.clone_from(other);
            }
        }
        fill(&mut self.hospital_id, &other.hospital_id);
        fill(&mut self.age, &other.age);
        fill(&mut self.gender, &other.gender);
        fill(&mut self.diagnosis, &other.diagnosis);
        fill(&mut self.admission_time, &other.admission_time);
        fill(&mut self.weight_kg, &other.weight_kg);
        fill(&mut self.height_cm, &other.height_cm);
    }
}

/// Everything known about one ICU stay.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatientRecord {
    pub id: PatientId,
    pub admission: Admission,
    /// Raw channels keyed by kind. Vitals and labs share the map.
    pub channels: BTreeMap<ChannelKind, Channel>,
    pub risk: RiskScores,
}

impl PatientRecord {
    /// Create a record with no channels and zero risk.
    pub fn new(id: impl Into<PatientId>) -> Self {
        Self {
            id: id.into(),
            admission: Admission::default(),
            channels: BTreeMap::new(),
            risk: RiskScores::default(),
        }
    }

    pub fn channel(&self, kind: ChannelKind) -> Option<&Channel> {
        self.channels.get(&kind)
    }

    /// Get a channel, creating it empty if absent.
    pub fn channel_mut(&mut self, kind: ChannelKind) -> &mut Channel {
        self.channels.entry(kind).or_default()
    }

    /// Value of the most recent point of a channel.
    ///
    /// `None` when the channel is absent, empty, or its last point is missing.
    pub fn latest(&self, kind: ChannelKind) -> Option<f64> {
        self.channels.get(&kind).and_then(Channel::latest_value)
    }

    /// Total number of points across all channels.
    pub fn point_count(&self) -> usize {
        self.channels.values().map(Channel::len).sum()
    }

    /// Stable sort every channel by offset.
    pub fn sort_channels(&mut self) {
        for channel in self.channels.values_mut() {
            channel.sort_by_offset();
        }
    }

    /// Case-insensitive match on id or diagnosis.
    pub fn matches(&self, query: &str) -> bool {
        if query.is_empty() {
            return true;
        }
        let query = query.to_lowercase();
        self.id.as_str().to_lowercase().contains(&query)
            || self
                .admission
                .diagnosis
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&query))
    }
}
