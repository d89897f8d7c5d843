// Library crate: public API items may not be used by the binary
#![allow(unused)]

//! # vitalwatch
//!
//! A terminal dashboard and library for ICU vital-sign time series.
//!
//! Uploads are CSV files of per-patient measurements. Each upload is parsed
//! into patient records, merged into a roster, and every channel is imputed
//! and z-score normalized. A threshold-based alert engine evaluates the
//! selected patient on selection and on a fixed period afterwards, and raises
//! a notification when the alert first fires or its message changes.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Application                          │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐    ┌─────────┐ │
//! │  │  app    │───▶│ session  │───▶│   ui    │───▶│ Terminal│ │
//! │  │ (state) │    │ (roster) │    │(render) │    │         │ │
//! │  └────┬────┘    └────┬─────┘    └─────────┘    └─────────┘ │
//! │       │              │                                      │
//! │       ▼              ▼                                      │
//! │  ┌─────────┐    ┌──────────┐    ┌─────────┐                 │
//! │  │ source  │    │  ingest  │    │  data   │                 │
//! │  │ (input) │    │  (CSV)   │    │ (impute,│                 │
//! │  └─────────┘    └──────────┘    │ alerts) │                 │
//! │       ▲                         └─────────┘                 │
//! │  FileSource | ChannelSource                                 │
//! │                                                             │
//! │  monitor: periodic ticks ──▶ session.on_tick ──▶ notify     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Upload delivery ([`DataSource`] trait) from a polled file
//!   or an in-process channel
//! - **[`ingest`]**: CSV parsing into [`PatientRecord`]s and merge policies for
//!   re-uploaded patients
//! - **[`data`]**: Imputation, normalization, alert rules, risk levels and
//!   sparklines
//! - **[`session`]**: The roster, current selection and alert state
//! - **[`monitor`]**: Periodic alert re-checks for the selected patient
//! - **[`notify`]**: Notification permission and delivery
//! - **[`ui`]**: Terminal rendering using ratatui
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a CSV upload
//! vitalwatch --file patients.csv
//!
//! # Evaluate every patient and write a JSON report
//! vitalwatch --file patients.csv --export report.json
//! ```
//!
//! ### As a library with a session
//!
//! ```
//! use vitalwatch::{PatientId, Session};
//!
//! let mut session = Session::default();
//! session
//!     .ingest("patientunitstayid,itemoffset,O2 Saturation\n7,0,45\n")
//!     .unwrap();
//! session.select(&PatientId::from("7")).unwrap();
//!
//! assert!(session.alert().active);
//! assert_eq!(
//!     session.alert().message,
//!     "Patient 7: Critical: O2 saturation at 45.0%"
//! );
//! ```
//!
//! ### As a library with channel source
//!
//! ```
//! use vitalwatch::{App, ChannelSource, Session, Upload};
//!
//! let (tx, source) = ChannelSource::create("ward-feed");
//! let mut app = App::new(Box::new(source), Session::default());
//!
//! tx.send(Some(Upload::new("ward.csv", "patientunitstayid,itemoffset\n1,0\n")))
//!     .unwrap();
//! app.reload_data().unwrap();
//! assert_eq!(app.session.patient_count(), 1);
//! ```

pub mod app;
pub mod config;
pub mod data;
pub mod events;
pub mod export;
pub mod ingest;
pub mod monitor;
pub mod notify;
pub mod session;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use data::{
    evaluate_alerts, impute, normalize, preprocess, AlertRule, AlertThresholds, Finding,
    ImputedChannel, NormalizeError, RiskFilter, RiskLevel, Severity,
};
pub use ingest::{parse_upload, IngestError, IngestSummary, MergeOutcome, MergePolicy};
pub use monitor::{AlertMonitor, Tick};
pub use notify::{LogNotifier, Muted, Notifier, NotifierKind, NotifyError, Permission, TerminalBell};
pub use session::{PatientEntry, Session, SessionError};
pub use source::{ChannelSource, DataSource, FileSource, Upload};
pub use vitalwatch_types::{
    Admission, AlertState, Channel, ChannelKind, PatientId, PatientRecord, RiskScores,
};
