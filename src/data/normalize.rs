//! Missing-value imputation and z-score normalization of a channel.
//!
//! Every uploaded signal passes through [`preprocess`] before it is shown:
//! [`impute`] fills the gaps in place, then [`normalize`] rescales the
//! complete series against its own distribution. Both steps keep the length
//! and the offsets of the input.

use std::ops::Deref;

use thiserror::Error;
use vitalwatch_types::{Channel, TimeSeriesPoint};

/// A normalization input contained a missing marker.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    #[error("missing value at index {index}; impute the channel first")]
    MissingValue { index: usize },
}

/// A channel with no missing points.
///
/// Produced by [`impute`], or checked with `TryFrom<Channel>`. This is the
/// only input [`normalize`] accepts, so a missing marker can never be scored.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImputedChannel(Channel);

impl ImputedChannel {
    /// The complete values, in order.
    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        // Every point is observed by construction
        self.0.iter().map(|p| p.value.unwrap_or_default())
    }

    pub fn into_inner(self) -> Channel {
        self.0
    }
}

impl Deref for ImputedChannel {
    type Target = Channel;

    fn deref(&self) -> &Channel {
        &self.0
    }
}

impl TryFrom<Channel> for ImputedChannel {
    type Error = NormalizeError;

    fn try_from(channel: Channel) -> Result<Self, Self::Error> {
        match channel.iter().position(TimeSeriesPoint::is_missing) {
            Some(index) => Err(NormalizeError::MissingValue { index }),
            None => Ok(Self(channel)),
        }
    }
}

/// Fill every missing point of a channel.
///
/// Rules, applied left to right so earlier fills feed later ones:
///
/// - interior gap at `i` with a later observation at `j`: blend the value
///   already resolved at `i - 1` toward the value at `j` with weight
///   `1 / (j - i + 1)`. This is deliberately not distance-proportional
///   interpolation: `[5, _, _, 20]` resolves to `[5, 10, 15, 20]`.
/// - interior gap with no later observation: carry the resolved value at `i - 1`.
/// - first point missing: the first observation found scanning forward, or 0.
/// - last point missing: the resolved value at `i - 1`.
///
/// An all-missing channel becomes all zeros. Total over any input.
pub fn impute(channel: &Channel) -> ImputedChannel {
    let points = channel.points();
    let last = points.len().saturating_sub(1);
    let mut resolved: Vec<f64> = Vec::with_capacity(points.len());

    for (i, point) in points.iter().enumerate() {
        let value = match point.value {
            Some(v) => v,
            None if i == 0 => next_observed(points, 1).map_or(0.0, |(_, v)| v),
            None => {
                let prev = resolved[i - 1];
                if i < last {
                    match next_observed(points, i + 1) {
                        Some((j, next)) => {
                            let weight = 1.0 / (j - i + 1) as f64;
                            prev + (next - prev) * weight
                        }
                        None => prev,
                    }
                } else {
                    prev
                }
            }
        };
        resolved.push(value);
    }

    ImputedChannel(
        points
            .iter()
            .zip(resolved)
            .map(|(p, v)| TimeSeriesPoint::observed(p.offset, v))
            .collect(),
    )
}

/// First observed point at or after `from`, with its index.
fn next_observed(points: &[TimeSeriesPoint], from: usize) -> Option<(usize, f64)> {
    points
        .iter()
        .enumerate()
        .skip(from)
        .find_map(|(j, p)| p.value.map(|v| (j, v)))
}

/// Rescale a complete channel to zero mean and unit variance.
///
/// Uses the population standard deviation. A constant series has a standard
/// deviation of 0, which is replaced by 1, so it normalizes to all zeros.
pub fn normalize(channel: &ImputedChannel) -> Channel {
    if channel.is_empty() {
        return Channel::new();
    }

    let (mean, std_dev) = mean_and_std_dev(channel);
    let divisor = if std_dev == 0.0 { 1.0 } else { std_dev };

    channel
        .iter()
        .zip(channel.values())
        .map(|(p, v)| TimeSeriesPoint::observed(p.offset, (v - mean) / divisor))
        .collect()
}

/// Impute then normalize.
pub fn preprocess(channel: &Channel) -> Channel {
    normalize(&impute(channel))
}

/// Mean and population standard deviation of a non-empty complete channel.
fn mean_and_std_dev(channel: &ImputedChannel) -> (f64, f64) {
    let n = channel.len() as f64;
    let mean = channel.values().sum::<f64>() / n;
    let variance = channel.values().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    (mean, variance.sqrt())
}
