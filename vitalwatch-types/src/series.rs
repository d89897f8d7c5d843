//! Time series primitives: offsets, points, channels.

use std::fmt;
use std::ops::Index;

/// Observation time in minutes relative to unit admission.
///
/// This mirrors the `itemoffset` column of the eICU tables. Offsets may be
/// negative for observations charted before the unit stay began.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Offset(pub i64);

impl Offset {
    /// Create from minutes.
    pub const fn from_minutes(minutes: i64) -> Self {
        Self(minutes)
    }

    /// Create from whole hours.
    pub const fn from_hours(hours: i64) -> Self {
        Self(hours * 60)
    }

    /// Get the value in minutes.
    pub const fn as_minutes(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for Offset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}m", self.0)
    }
}

/// A single observation in a channel.
///
/// `value` is `None` when nothing was charted at this offset. A recorded
/// zero is `Some(0.0)` and is a legitimate observation.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimeSeriesPoint {
    /// When the observation was collected.
    pub offset: Offset,
    /// The observed value, or `None` for a missing observation.
    pub value: Option<f64>,
}

impl TimeSeriesPoint {
    /// Create an observed point.
    pub const fn observed(offset: Offset, value: f64) -> Self {
        Self {
            offset,
            value: Some(value),
        }
    }

    /// Create a point with no observation.
    pub const fn missing(offset: Offset) -> Self {
        Self {
            offset,
            value: None,
        }
    }

    /// Returns true if this point carries no observation.
    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }
}

/// An ordered sequence of points for one physiological signal.
///
/// Points are kept in the order they were pushed. Use [`Channel::sort_by_offset`]
/// after appending out-of-order data; the sort is stable so points sharing an
/// offset keep their arrival order.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Channel {
    points: Vec<TimeSeriesPoint>,
}

impl Channel {
    /// Create an empty channel.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an observation.
    pub fn push(&mut self, offset: Offset, value: Option<f64>) {
        self.points.push(TimeSeriesPoint { offset, value });
    }

    /// Append all points of another channel, in its order.
    pub fn extend_from(&mut self, other: &Channel) {
        self.points.extend_from_slice(&other.points);
    }

    /// Stable sort by offset.
    pub fn sort_by_offset(&mut self) {
        self.points.sort_by_key(|p| p.offset);
    }

    /// Returns true if offsets never decrease.
    pub fn is_ordered(&self) -> bool {
        self.points.windows(2).all(|w| w[0].offset <= w[1].offset)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The points of this channel, in order.
    pub fn points(&self) -> &[TimeSeriesPoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TimeSeriesPoint> {
        self.points.iter()
    }

    /// The most recent point, whether observed or not.
    pub fn latest(&self) -> Option<&TimeSeriesPoint> {
        self.points.last()
    }

    /// The value of the most recent point.
    ///
    /// Returns `None` if the channel is empty or its last point is missing.
    /// This does not look further back for an older observation.
    pub fn latest_value(&self) -> Option<f64> {
        self.points.last().and_then(|p| p.value)
    }

    /// Number of points carrying an observation.
    pub fn observed_count(&self) -> usize {
        self.points.iter().filter(|p| !p.is_missing()).count()
    }

    /// Returns true if at least one point is missing.
    pub fn has_missing(&self) -> bool {
        self.points.iter().any(TimeSeriesPoint::is_missing)
    }

    /// The last `n` points (or all of them if shorter).
    pub fn tail(&self, n: usize) -> &[TimeSeriesPoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }
}

impl Index<usize> for Channel {
    type Output = TimeSeriesPoint;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl From<Vec<TimeSeriesPoint>> for Channel {
    fn from(points: Vec<TimeSeriesPoint>) -> Self {
        Self { points }
    }
}

impl FromIterator<TimeSeriesPoint> for Channel {
    fn from_iter<I: IntoIterator<Item = TimeSeriesPoint>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Channel {
    type Item = &'a TimeSeriesPoint;
    type IntoIter = std::slice::Iter<'a, TimeSeriesPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Inclusive normal range for a vital sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalRange {
    pub min: f64,
    pub max: f64,
}

impl NormalRange {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns true if the value lies outside the range.
    pub fn is_abnormal(&self, value: f64) -> bool {
        value < self.min || value > self.max
    }
}

/// The physiological signals carried by an upload.
///
/// Declaration order is display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ChannelKind {
    HeartRate,
    MeanArterialPressure,
    RespiratoryRate,
    O2Saturation,
    FiO2,
    Temperature,
    Glucose,
    Ph,
}

impl ChannelKind {
    /// All channel kinds in display order.
    pub const ALL: [ChannelKind; 8] = [
        ChannelKind::HeartRate,
        ChannelKind::MeanArterialPressure,
        ChannelKind::RespiratoryRate,
        ChannelKind::O2Saturation,
        ChannelKind::FiO2,
        ChannelKind::Temperature,
        ChannelKind::Glucose,
        ChannelKind::Ph,
    ];

    /// Column header in the upload CSV.
    pub fn csv_header(&self) -> &'static str {
        match self {
            ChannelKind::HeartRate => "Heart Rate",
            ChannelKind::MeanArterialPressure => "MAP (mmHg)",
            ChannelKind::RespiratoryRate => "Respiratory Rate",
            ChannelKind::O2Saturation => "O2 Saturation",
            ChannelKind::FiO2 => "FiO2",
            ChannelKind::Temperature => "Temperature (C)",
            ChannelKind::Glucose => "glucose",
            ChannelKind::Ph => "pH",
        }
    }

    /// Short display label.
    pub fn label(&self) -> &'static str {
        match self {
            ChannelKind::HeartRate => "Heart Rate",
            ChannelKind::MeanArterialPressure => "MAP",
            ChannelKind::RespiratoryRate => "Resp Rate",
            ChannelKind::O2Saturation => "O2 Sat",
            ChannelKind::FiO2 => "FiO2",
            ChannelKind::Temperature => "Temp",
            ChannelKind::Glucose => "Glucose",
            ChannelKind::Ph => "pH",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            ChannelKind::HeartRate => "bpm",
            ChannelKind::MeanArterialPressure => "mmHg",
            ChannelKind::RespiratoryRate => "breaths/min",
            ChannelKind::O2Saturation => "%",
            ChannelKind::FiO2 => "",
            ChannelKind::Temperature => "°C",
            ChannelKind::Glucose => "mg/dL",
            ChannelKind::Ph => "",
        }
    }

    /// Returns true for lab channels (as opposed to bedside vitals).
    pub fn is_lab(&self) -> bool {
        matches!(self, ChannelKind::Glucose | ChannelKind::Ph)
    }

    /// Normal range shown on the dashboard, if one is defined.
    pub fn normal_range(&self) -> Option<NormalRange> {
        match self {
            ChannelKind::HeartRate => Some(NormalRange::new(60.0, 100.0)),
            ChannelKind::MeanArterialPressure => Some(NormalRange::new(65.0, 110.0)),
            ChannelKind::RespiratoryRate => Some(NormalRange::new(12.0, 20.0)),
            ChannelKind::O2Saturation => Some(NormalRange::new(92.0, 100.0)),
            ChannelKind::FiO2 => Some(NormalRange::new(0.21, 0.6)),
            ChannelKind::Temperature => Some(NormalRange::new(36.0, 38.0)),
            ChannelKind::Glucose | ChannelKind::Ph => None,
        }
    }

    /// Returns true if the value is outside this channel's normal range.
    ///
    /// Channels without a defined range never report abnormal values.
    pub fn is_abnormal(&self, value: f64) -> bool {
        self.normal_range().is_some_and(|r| r.is_abnormal(value))
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
