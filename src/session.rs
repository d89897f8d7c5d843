//! The owned session context: roster, selection and the one alert state.
//!
//! A [`Session`] is created at startup and mutated only through its
//! operations. Every evaluation pass is synchronous, so the alert state seen
//! by the UI is always the result of a complete pass for the patient that is
//! selected at that moment.
//!
//! Selection carries a generation counter. [`Tick`]s scheduled for an older
//! generation are ignored, so a tick for a previous patient can never
//! overwrite the state of the current one.

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};
use vitalwatch_types::{AlertState, Channel, ChannelKind, PatientId, PatientRecord, RiskScores};

use crate::data::alerts::{evaluate_alerts, triggered, AlertThresholds, Finding};
use crate::data::normalize::preprocess;
use crate::ingest::{merge_record, parse_upload, IngestError, IngestSummary, MergePolicy};
use crate::monitor::Tick;
use crate::notify::{Muted, Notifier, Permission};

/// Title used for alert notifications.
pub const NOTIFICATION_TITLE: &str = "Vitalwatch alert";

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Unknown patient: {0}")]
    UnknownPatient(PatientId),

    #[error(transparent)]
    Ingest(#[from] IngestError),
}

/// A roster entry: the raw record and its preprocessed channels.
#[derive(Debug, Clone)]
pub struct PatientEntry {
    pub record: PatientRecord,
    /// Imputed and z-scored copy of every raw channel.
    pub normalized: BTreeMap<ChannelKind, Channel>,
}

impl PatientEntry {
    /// Run every channel through the preprocessing pipeline.
    pub fn prepare(record: PatientRecord) -> Self {
        let normalized = record
            .channels
            .iter()
            .map(|(kind, channel)| (*kind, preprocess(channel)))
            .collect();
        Self { record, normalized }
    }

    pub fn id(&self) -> &PatientId {
        &self.record.id
    }

    pub fn normalized(&self, kind: ChannelKind) -> Option<&Channel> {
        self.normalized.get(&kind)
    }

    /// Z-score of the most recent point of a channel.
    pub fn latest_score(&self, kind: ChannelKind) -> Option<f64> {
        self.normalized(kind).and_then(Channel::latest_value)
    }
}

/// Session state shared by the presentation layer and the alert monitor.
#[derive(Debug)]
pub struct Session {
    roster: BTreeMap<PatientId, PatientEntry>,
    selected: Option<PatientId>,
    generation: u64,
    alert: AlertState,
    thresholds: AlertThresholds,
    merge_policy: MergePolicy,
    notifier: Box<dyn Notifier>,
    permission: Option<Permission>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(AlertThresholds::default(), MergePolicy::default(), Box::new(Muted))
    }
}

impl Session {
    pub fn new(
        thresholds: AlertThresholds,
        merge_policy: MergePolicy,
        notifier: Box<dyn Notifier>,
    ) -> Self {
        Self {
            roster: BTreeMap::new(),
            selected: None,
            generation: 0,
            alert: AlertState::idle(),
            thresholds,
            merge_policy,
            notifier,
            permission: None,
        }
    }

    /// Parse an upload and merge it into the roster.
    ///
    /// The upload is parsed completely first; on error the roster is left
    /// exactly as it was. If the selected patient is touched, alerts are
    /// re-evaluated before returning.
    pub fn ingest(&mut self, text: &str) -> Result<IngestSummary, SessionError> {
        let parsed = parse_upload(text).inspect_err(|e| warn!("Upload rejected: {}", e))?;

        let mut summary = IngestSummary {
            patients: parsed.patients.len(),
            rows: parsed.rows,
            skipped_rows: parsed.skipped_rows,
            ..Default::default()
        };
        let mut touches_selected = false;

        for incoming in parsed.patients {
            let id = incoming.id.clone();
            let stored = self.roster.remove(&id).map(|entry| entry.record);
            let (merged, outcome) = merge_record(stored, incoming, self.merge_policy);
            summary.record(outcome);
            touches_selected |= self.selected.as_ref() == Some(&id);
            self.roster.insert(id, PatientEntry::prepare(merged));
        }

        info!(
            patients = summary.patients,
            rows = summary.rows,
            skipped = summary.skipped_rows,
            added = summary.added,
            replaced = summary.replaced,
            appended = summary.appended,
            policy = %self.merge_policy,
            "Ingested upload"
        );

        if touches_selected {
            self.evaluate();
        }
        Ok(summary)
    }

    /// Make a patient current and evaluate their alerts from scratch.
    ///
    /// Returns the new selection generation. An unknown id leaves the
    /// session unchanged.
    pub fn select(&mut self, id: &PatientId) -> Result<u64, SessionError> {
        if !self.roster.contains_key(id) {
            return Err(SessionError::UnknownPatient(id.clone()));
        }
        self.generation += 1;
        self.selected = Some(id.clone());
        info!(patient = %id, generation = self.generation, "Selected patient");
        self.evaluate();
        Ok(self.generation)
    }

    /// Clear the selection and the alert.
    pub fn deselect(&mut self) {
        if self.selected.take().is_some() {
            self.generation += 1;
            info!(generation = self.generation, "Deselected patient");
        }
        self.alert = AlertState::idle();
    }

    /// Re-evaluate alerts for the current patient.
    pub fn refresh(&mut self) -> &AlertState {
        self.evaluate();
        &self.alert
    }

    /// Handle a periodic tick. Returns false if the tick was stale.
    pub fn on_tick(&mut self, tick: &Tick) -> bool {
        if tick.generation != self.generation || self.selected.as_ref() != Some(&tick.patient_id) {
            debug!(
                tick_generation = tick.generation,
                generation = self.generation,
                patient = %tick.patient_id,
                "Ignoring stale tick"
            );
            return false;
        }
        self.evaluate();
        true
    }

    /// Replace a patient's risk scores with fresh model output.
    pub fn update_risk(&mut self, id: &PatientId, risk: RiskScores) -> Result<(), SessionError> {
        let entry = self
            .roster
            .get_mut(id)
            .ok_or_else(|| SessionError::UnknownPatient(id.clone()))?;
        entry.record.risk = risk;
        debug!(patient = %id, ?risk, "Updated risk scores");

        if self.selected.as_ref() == Some(id) {
            self.evaluate();
        }
        Ok(())
    }

    /// All patients, ordered by id.
    pub fn patients(&self) -> impl Iterator<Item = &PatientEntry> {
        self.roster.values()
    }

    pub fn patient_count(&self) -> usize {
        self.roster.len()
    }

    pub fn patient(&self, id: &PatientId) -> Option<&PatientEntry> {
        self.roster.get(id)
    }

    /// The current patient, if any.
    pub fn selected(&self) -> Option<&PatientEntry> {
        self.selected.as_ref().and_then(|id| self.roster.get(id))
    }

    pub fn selected_id(&self) -> Option<&PatientId> {
        self.selected.as_ref()
    }

    pub fn alert(&self) -> &AlertState {
        &self.alert
    }

    /// Rules currently firing for the selected patient.
    pub fn findings(&self) -> Vec<Finding> {
        self.selected()
            .map(|entry| triggered(&entry.record, &self.thresholds))
            .unwrap_or_default()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn thresholds(&self) -> &AlertThresholds {
        &self.thresholds
    }

    pub fn merge_policy(&self) -> MergePolicy {
        self.merge_policy
    }

    /// One full evaluation pass for the selected patient.
    fn evaluate(&mut self) {
        let next = match self.selected() {
            Some(entry) => evaluate_alerts(&entry.record, &self.thresholds),
            None => AlertState::idle(),
        };

        let notify = next.active && (!self.alert.active || self.alert.message != next.message);
        if next.active != self.alert.active || next.patient_id != self.alert.patient_id {
            if next.active {
                info!(message = %next.message, "Alert raised");
            } else if self.alert.active {
                info!(patient = ?next.patient_id, "Alert cleared");
            }
        }

        self.alert = next;
        if notify {
            let body = self.alert.message.clone();
            self.notify(&body);
        }
    }

    /// Best-effort delivery. Never affects the alert state.
    fn notify(&mut self, body: &str) {
        let permission = *self
            .permission
            .get_or_insert_with(|| self.notifier.request_permission());
        if !permission.is_granted() {
            debug!("Notification permission not granted");
            return;
        }
        if let Err(e) = self.notifier.deliver(NOTIFICATION_TITLE, body) {
            warn!("Failed to deliver notification: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotifyError;
    use std::sync::{Arc, Mutex};

    /// Records every delivery and counts permission requests.
    #[derive(Debug, Clone, Default)]
    struct Recorder {
        delivered: Arc<Mutex<Vec<String>>>,
        permission_requests: Arc<Mutex<usize>>,
        deny: bool,
    }

    impl Notifier for Recorder {
        fn request_permission(&mut self) -> Permission {
            *self.permission_requests.lock().unwrap() += 1;
            if self.deny {
                Permission::Denied
            } else {
                Permission::Granted
            }
        }

        fn deliver(&mut self, _title: &str, body: &str) -> Result<(), NotifyError> {
            self.delivered.lock().unwrap().push(body.to_string());
            Ok(())
        }
    }

    const UPLOAD: &str = "\
patientunitstayid,itemoffset,O2 Saturation,Respiratory Rate,decompensationrisk,losestimate
1,0,97,18,0.4,5
1,60,48,18,0.4,5
2,0,96,35,0.75,20
3,0,98,16,0.1,2
";

    fn session_with(recorder: &Recorder) -> Session {
        let mut s = Session::new(
            AlertThresholds::default(),
            MergePolicy::Replace,
            Box::new(recorder.clone()),
        );
        s.ingest(UPLOAD).unwrap();
        s
    }

    #[test]
    fn ingest_populates_roster() {
        let s = session_with(&Recorder::default());
        assert_eq!(s.patient_count(), 3);
        let p = s.patient(&PatientId::from("1")).unwrap();
        assert_eq!(p.normalized(ChannelKind::O2Saturation).unwrap().len(), 2);
        assert!(s.alert().patient_id.is_none());
    }

    #[test]
    fn rejected_upload_leaves_roster_untouched() {
        let mut s = session_with(&Recorder::default());
        assert!(s.ingest("hospitalid\n5").is_err());
        assert_eq!(s.patient_count(), 3);
    }

    #[test]
    fn select_evaluates_alerts() {
        let mut s = session_with(&Recorder::default());
        s.select(&PatientId::from("1")).unwrap();
        assert!(s.alert().active);
        assert_eq!(s.alert().message, "Patient 1: Critical: O2 saturation at 48.0%");
    }

    #[test]
    fn select_unknown_patient_is_an_error() {
        let mut s = session_with(&Recorder::default());
        let generation = s.generation();
        assert!(matches!(
            s.select(&PatientId::from("404")),
            Err(SessionError::UnknownPatient(_))
        ));
        assert_eq!(s.generation(), generation);
        assert!(s.selected().is_none());
    }

    #[test]
    fn switching_to_quiet_patient_clears_alert() {
        let mut s = session_with(&Recorder::default());
        s.select(&PatientId::from("2")).unwrap();
        assert!(s.alert().active);

        s.select(&PatientId::from("3")).unwrap();
        assert!(!s.alert().active);
        assert!(s.alert().is_for(&PatientId::from("3")));
        assert!(s.alert().message.is_empty());
    }

    #[test]
    fn stale_tick_is_ignored() {
        let mut s = session_with(&Recorder::default());
        let old = s.select(&PatientId::from("2")).unwrap();
        s.select(&PatientId::from("3")).unwrap();

        let stale = Tick {
            generation: old,
            patient_id: PatientId::from("2"),
        };
        assert!(!s.on_tick(&stale));
        assert!(!s.alert().active);
        assert!(s.alert().is_for(&PatientId::from("3")));
    }

    #[test]
    fn current_tick_reevaluates() {
        let mut s = session_with(&Recorder::default());
        let generation = s.select(&PatientId::from("3")).unwrap();
        s.update_risk(&PatientId::from("3"), RiskScores::new(0.1, 0.9, 2.0))
            .unwrap();
        assert!(s.alert().active);

        let tick = Tick {
            generation,
            patient_id: PatientId::from("3"),
        };
        assert!(s.on_tick(&tick));
        assert!(s.alert().message.contains("High decompensation risk: 90.0%"));
    }

    #[test]
    fn deselect_goes_idle() {
        let mut s = session_with(&Recorder::default());
        let generation = s.select(&PatientId::from("1")).unwrap();
        s.deselect();
        assert_eq!(s.alert(), &AlertState::idle());
        assert!(s.generation() > generation);
        assert!(s.selected().is_none());
    }

    #[test]
    fn notifies_once_per_transition() {
        let recorder = Recorder::default();
        let mut s = session_with(&recorder);
        s.select(&PatientId::from("1")).unwrap();
        s.refresh();
        s.refresh();
        assert_eq!(recorder.delivered.lock().unwrap().len(), 1);

        // Different message is a new transition
        s.select(&PatientId::from("2")).unwrap();
        assert_eq!(recorder.delivered.lock().unwrap().len(), 2);

        // Quiet then alerting again
        s.select(&PatientId::from("3")).unwrap();
        s.select(&PatientId::from("2")).unwrap();
        assert_eq!(recorder.delivered.lock().unwrap().len(), 3);
        assert_eq!(*recorder.permission_requests.lock().unwrap(), 1);
    }

    #[test]
    fn denied_permission_does_not_affect_alert() {
        let recorder = Recorder {
            deny: true,
            ..Default::default()
        };
        let mut s = session_with(&recorder);
        s.select(&PatientId::from("1")).unwrap();
        s.select(&PatientId::from("2")).unwrap();
        assert!(s.alert().active);
        assert!(recorder.delivered.lock().unwrap().is_empty());
        assert_eq!(*recorder.permission_requests.lock().unwrap(), 1);
    }

    #[test]
    fn ingest_reevaluates_selected_patient() {
        let mut s = session_with(&Recorder::default());
        s.select(&PatientId::from("1")).unwrap();
        assert!(s.alert().active);

        s.ingest("patientunitstayid,itemoffset,O2 Saturation\n1,0,97\n")
            .unwrap();
        assert!(!s.alert().active);
        assert!(s.alert().is_for(&PatientId::from("1")));
    }

    #[test]
    fn append_policy_extends_channels() {
        let mut s = Session::new(
            AlertThresholds::default(),
            MergePolicy::Append,
            Box::new(Muted),
        );
        s.ingest(UPLOAD).unwrap();
        let summary = s
            .ingest("patientunitstayid,itemoffset,O2 Saturation\n1,120,95\n")
            .unwrap();
        assert_eq!(summary.appended, 1);

        let p = s.patient(&PatientId::from("1")).unwrap();
        assert_eq!(p.record.channel(ChannelKind::O2Saturation).unwrap().len(), 3);
        assert_eq!(p.record.latest(ChannelKind::O2Saturation), Some(95.0));
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_ticks_follow_selection() {
        use crate::monitor::AlertMonitor;
        use std::time::Duration;

        let mut s = session_with(&Recorder::default());
        let mut monitor =
            AlertMonitor::new(tokio::runtime::Handle::current(), Duration::from_secs(60));

        let generation = s.select(&PatientId::from("3")).unwrap();
        monitor.arm(generation, PatientId::from("3"));

        // Risk worsens between ticks; the next tick picks it up
        s.update_risk(&PatientId::from("3"), RiskScores::new(0.1, 0.1, 30.0))
            .unwrap();
        let tick = monitor.next().await.unwrap();
        assert!(s.on_tick(&tick));
        assert!(s.alert().message.contains("Extended stay likely: 30.0 days"));

        // Switching patients re-arms; only ticks for the new selection arrive
        let generation = s.select(&PatientId::from("2")).unwrap();
        monitor.arm(generation, PatientId::from("2"));
        let tick = monitor.next().await.unwrap();
        assert_eq!(tick.generation, generation);
        assert!(s.on_tick(&tick));
        assert!(s.alert().is_for(&PatientId::from("2")));

        s.deselect();
        monitor.disarm();
        assert!(!monitor.is_armed());
    }
}
