//! Signal preprocessing, alert rules and derived views of patient data.
//!
//! ## Submodules
//!
//! - [`normalize`]: Missing-value imputation and z-score normalization
//! - [`alerts`]: Threshold rules and [`evaluate_alerts`]
//! - [`risk`]: Risk-level bucketing and roster filtering
//! - [`trend`]: Sparkline quantization of a channel window
//! - [`duration`]: Parsing of interval strings and formatting of offsets
//!
//! ## Data Flow
//!
//! ```text
//! Channel (raw, with gaps)
//!        │
//!        ▼
//! impute() ──▶ ImputedChannel ──▶ normalize() ──▶ z-scored Channel ──▶ trend::sparkline()
//!
//! PatientRecord (latest raw points + risk scalars)
//!        │
//!        ▼
//! evaluate_alerts() ──▶ AlertState
//! ```

pub mod alerts;
pub mod duration;
pub mod normalize;
pub mod risk;
pub mod trend;

pub use alerts::{evaluate_alerts, AlertRule, AlertThresholds, Finding, Severity};
pub use normalize::{impute, normalize, preprocess, ImputedChannel, NormalizeError};
pub use risk::{RiskFilter, RiskLevel};
