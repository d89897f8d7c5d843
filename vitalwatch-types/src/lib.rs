//! # vitalwatch-types
//!
//! Core types for the vitalwatch ICU dashboard. This crate defines the
//! patient record schema shared by the ingestion, preprocessing and alerting
//! layers.
//!
//! ## Design Goals
//!
//! - **Zero required dependencies**: Core types work without any serialization framework
//! - **Explicit missingness**: an absent observation is `None`, never a NaN
//! - **Ordered channels**: points are kept in collection order, which the
//!   imputation and "latest value" logic depend on
//! - **Optional serialization**: Enable the `serde` feature as needed
//!
//! ## Features
//!
//! - `serde`: JSON/TOML/etc. serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use vitalwatch_types::{Channel, ChannelKind, Offset, PatientRecord, RiskScores};
//!
//! let mut patient = PatientRecord::new("141168");
//! patient.risk = RiskScores::new(0.12, 0.40, 5.0);
//!
//! let o2 = patient.channel_mut(ChannelKind::O2Saturation);
//! o2.push(Offset(0), Some(97.0));
//! o2.push(Offset(60), None);
//! o2.push(Offset(120), Some(48.0));
//!
//! assert_eq!(patient.latest(ChannelKind::O2Saturation), Some(48.0));
//! assert_eq!(patient.channel(ChannelKind::O2Saturation).map(Channel::len), Some(3));
//! ```

mod alert;
mod patient;
mod series;

pub use alert::*;
pub use patient::*;
pub use series::*;
