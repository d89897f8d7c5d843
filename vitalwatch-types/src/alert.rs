//! The single alert visible for the patient under observation.

use crate::PatientId;

/// Alert state for the current patient context.
///
/// Exactly one of these exists per observed patient. It is overwritten on
/// every evaluation, never accumulated.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AlertState {
    /// True iff at least one rule currently fires for `patient_id`.
    pub active: bool,
    /// Human-readable alert text. Empty when inactive.
    pub message: String,
    /// The patient this state was evaluated for. `None` when nothing is selected.
    pub patient_id: Option<PatientId>,
}

impl AlertState {
    /// No patient observed.
    pub fn idle() -> Self {
        Self::default()
    }

    /// A patient is observed and no rule fires.
    pub fn quiet(patient_id: PatientId) -> Self {
        Self {
            active: false,
            message: String::new(),
            patient_id: Some(patient_id),
        }
    }

    /// A patient is observed and at least one rule fires.
    pub fn alerting(patient_id: PatientId, message: impl Into<String>) -> Self {
        Self {
            active: true,
            message: message.into(),
            patient_id: Some(patient_id),
        }
    }

    /// Returns true if this state refers to the given patient.
    pub fn is_for(&self, patient_id: &PatientId) -> bool {
        self.patient_id.as_ref() == Some(patient_id)
    }
}
