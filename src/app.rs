//! Application state and navigation logic.

use std::path::PathBuf;

use anyhow::Result;
use vitalwatch_types::PatientId;

use crate::config::DEFAULT_WINDOW;
use crate::data::risk::RiskFilter;
use crate::export::{build_report, write_report, DEFAULT_EXPORT_FILE};
use crate::monitor::AlertMonitor;
use crate::session::{PatientEntry, Session};
use crate::source::DataSource;
use crate::ui::roster::{sort_patients_by, SortColumn};
use crate::ui::Theme;

/// The current view/tab in the TUI.
///
/// Admission detail is shown as an overlay (controlled by
/// `App::show_detail_overlay`) rather than as a separate view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// All loaded patients with risk and alert columns.
    Roster,
    /// Channels of the selected patient.
    Vitals,
}

impl View {
    pub fn next(self) -> Self {
        match self {
            View::Roster => View::Vitals,
            View::Vitals => View::Roster,
        }
    }

    pub fn prev(self) -> Self {
        self.next()
    }

    pub fn label(&self) -> &'static str {
        match self {
            View::Roster => "Patients",
            View::Vitals => "Vitals",
        }
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,
    pub show_detail_overlay: bool,

    // Data source
    source: Box<dyn DataSource>,
    pub load_error: Option<String>,
    pub last_upload: Option<String>,

    pub session: Session,
    monitor: Option<AlertMonitor>,

    // Roster navigation
    pub selected_index: usize,
    pub sort_column: SortColumn,
    pub sort_ascending: bool,
    pub risk_filter: RiskFilter,

    // Search/filter
    pub filter_text: String,
    pub filter_active: bool,

    // Vitals view
    pub window: usize,

    // UI
    pub theme: Theme,
    pub export_path: PathBuf,

    // Status message (temporary feedback)
    pub status_message: Option<(String, std::time::Instant)>,
}

impl App {
    /// Create a new App reading uploads from `source`.
    ///
    /// Without a monitor, alerts are still evaluated on selection and on
    /// every upload, just not periodically.
    pub fn new(source: Box<dyn DataSource>, session: Session) -> Self {
        Self {
            running: true,
            current_view: View::Roster,
            show_help: false,
            show_detail_overlay: false,
            source,
            load_error: None,
            last_upload: None,
            session,
            monitor: None,
            selected_index: 0,
            sort_column: SortColumn::default(),
            sort_ascending: true,
            risk_filter: RiskFilter::default(),
            filter_text: String::new(),
            filter_active: false,
            window: DEFAULT_WINDOW,
            theme: Theme::default(),
            export_path: PathBuf::from(DEFAULT_EXPORT_FILE),
            status_message: None,
        }
    }

    /// Attach the periodic alert monitor.
    pub fn with_monitor(mut self, monitor: AlertMonitor) -> Self {
        self.monitor = Some(monitor);
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = theme;
        self
    }

    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(2);
        self
    }

    pub fn source_description(&self) -> &str {
        self.source.description()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, std::time::Instant::now()));
    }

    /// Get the current status message if it hasn't expired (3 seconds).
    pub fn get_status_message(&self) -> Option<&str> {
        if let Some((msg, time)) = &self.status_message {
            if time.elapsed() < std::time::Duration::from_secs(3) {
                return Some(msg);
            }
        }
        None
    }

    /// Poll the data source and ingest any new upload.
    ///
    /// Returns Ok(true) if an upload was applied. A rejected upload is
    /// reported through `load_error` and leaves the roster as it was.
    pub fn reload_data(&mut self) -> Result<bool> {
        let Some(upload) = self.source.poll() else {
            if let Some(err) = self.source.error() {
                self.load_error = Some(err.to_string());
            }
            return Ok(false);
        };

        match self.session.ingest(&upload.content) {
            Ok(summary) => {
                self.load_error = None;
                self.set_status_message(format!("Loaded {}: {}", upload.origin, summary));
                self.last_upload = Some(upload.origin);
                self.clamp_selection();
                Ok(true)
            }
            Err(e) => {
                self.load_error = Some(format!("{}: {}", upload.origin, e));
                Ok(false)
            }
        }
    }

    /// Apply any alert ticks that have arrived.
    pub fn process_ticks(&mut self) {
        let Some(monitor) = self.monitor.as_mut() else {
            return;
        };
        while let Some(tick) = monitor.try_next() {
            self.session.on_tick(&tick);
        }
    }

    /// Patients passing the search and risk filter, in display order.
    pub fn visible_patients(&self) -> Vec<&PatientEntry> {
        let mut patients: Vec<&PatientEntry> = self
            .session
            .patients()
            .filter(|p| p.record.matches(&self.filter_text))
            .filter(|p| self.risk_filter.accepts(&p.record))
            .collect();
        sort_patients_by(&mut patients, self.sort_column, self.sort_ascending);
        patients
    }

    /// The roster row under the cursor.
    pub fn highlighted_patient(&self) -> Option<PatientId> {
        self.visible_patients()
            .get(self.selected_index)
            .map(|p| p.id().clone())
    }

    /// Make the highlighted patient current and show their vitals.
    pub fn select_highlighted(&mut self) {
        let Some(id) = self.highlighted_patient() else {
            return;
        };
        self.select_patient(&id);
        self.current_view = View::Vitals;
    }

    /// Make a patient current and re-arm the periodic alert check.
    pub fn select_patient(&mut self, id: &PatientId) {
        match self.session.select(id) {
            Ok(generation) => {
                if let Some(monitor) = self.monitor.as_mut() {
                    monitor.arm(generation, id.clone());
                }
            }
            Err(e) => self.set_status_message(e.to_string()),
        }
    }

    /// Drop the current patient and stop the periodic check.
    pub fn deselect_patient(&mut self) {
        if let Some(monitor) = self.monitor.as_mut() {
            monitor.disarm();
        }
        self.session.deselect();
    }

    /// Re-evaluate alerts for the current patient now.
    pub fn refresh_alerts(&mut self) {
        self.session.refresh();
    }

    pub fn next_view(&mut self) {
        self.current_view = self.current_view.next();
    }

    pub fn prev_view(&mut self) {
        self.current_view = self.current_view.prev();
    }

    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
    }

    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_next_n(&mut self, n: usize) {
        let max = self.visible_patients().len().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.visible_patients().len().saturating_sub(1);
    }

    fn clamp_selection(&mut self) {
        let max = self.visible_patients().len().saturating_sub(1);
        self.selected_index = self.selected_index.min(max);
    }

    /// Open the admission detail overlay.
    pub fn enter_detail(&mut self) {
        let has_target = match self.current_view {
            View::Roster => self.highlighted_patient().is_some(),
            View::Vitals => self.session.selected().is_some(),
        };
        if has_target {
            self.show_detail_overlay = true;
        }
    }

    /// The patient the detail overlay describes.
    pub fn detail_patient(&self) -> Option<&PatientEntry> {
        match self.current_view {
            View::Roster => {
                let id = self.highlighted_patient()?;
                self.session.patient(&id)
            }
            View::Vitals => self.session.selected(),
        }
    }

    /// Navigate back: close overlay first, then return to the roster.
    pub fn go_back(&mut self) {
        if self.show_detail_overlay {
            self.show_detail_overlay = false;
            return;
        }
        if self.current_view != View::Roster {
            self.current_view = View::Roster;
        }
    }

    pub fn close_overlay(&mut self) {
        self.show_detail_overlay = false;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn cycle_sort(&mut self) {
        self.sort_column = self.sort_column.next();
    }

    pub fn toggle_sort_direction(&mut self) {
        self.sort_ascending = !self.sort_ascending;
    }

    pub fn cycle_risk_filter(&mut self) {
        self.risk_filter = self.risk_filter.next();
        self.clamp_selection();
    }

    /// Enter filter input mode (starts capturing keystrokes for search).
    pub fn start_filter(&mut self) {
        self.filter_active = true;
    }

    /// Exit filter input mode without clearing the filter text.
    pub fn cancel_filter(&mut self) {
        self.filter_active = false;
    }

    pub fn clear_filter(&mut self) {
        self.filter_text.clear();
        self.filter_active = false;
    }

    pub fn filter_push(&mut self, c: char) {
        self.filter_text.push(c);
        self.clamp_selection();
    }

    pub fn filter_pop(&mut self) {
        self.filter_text.pop();
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    /// Export the roster to a JSON file.
    pub fn export_state(&self, path: &std::path::Path) -> Result<()> {
        if self.session.patient_count() == 0 {
            anyhow::bail!("No patients to export");
        }
        write_report(&build_report(&self.session), path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::risk::RiskLevel;
    use crate::source::{ChannelSource, Upload};

    const UPLOAD: &str = "\
patientunitstayid,itemoffset,O2 Saturation,apacheadmissiondx,mortalityrisk
10,0,96,Sepsis,0.6
11,0,48,CHF,0.1
12,0,97,Sepsis,0.3
";

    fn app() -> App {
        let (tx, source) = ChannelSource::create("test");
        tx.send(Some(Upload::new("test.csv", UPLOAD))).unwrap();
        let mut app = App::new(Box::new(source), Session::default());
        assert!(app.reload_data().unwrap());
        app
    }

    #[test]
    fn reload_ingests_upload() {
        let app = app();
        assert_eq!(app.session.patient_count(), 3);
        assert_eq!(app.last_upload.as_deref(), Some("test.csv"));
        assert!(app.load_error.is_none());
    }

    #[test]
    fn rejected_upload_sets_error() {
        let (tx, source) = ChannelSource::create("test");
        let mut app = App::new(Box::new(source), Session::default());
        tx.send(Some(Upload::new("bad.csv", "nothing,useful\n1,2"))).unwrap();
        assert!(!app.reload_data().unwrap());
        assert!(app.load_error.as_deref().unwrap().contains("bad.csv"));
        assert_eq!(app.session.patient_count(), 0);
    }

    #[test]
    fn missing_file_loads_once_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patients.csv");
        let source = crate::source::FileSource::new(&path);
        let mut app = App::new(Box::new(source), Session::default());

        assert!(!app.reload_data().unwrap());
        assert!(app.load_error.is_some());

        std::fs::write(&path, UPLOAD).unwrap();
        assert!(app.reload_data().unwrap());
        assert_eq!(app.session.patient_count(), 3);
        assert!(app.load_error.is_none());
    }

    #[test]
    fn search_and_risk_filter() {
        let mut app = app();
        app.filter_text = "sepsis".into();
        assert_eq!(app.visible_patients().len(), 2);

        app.risk_filter = RiskFilter::Only(RiskLevel::High);
        let ids: Vec<_> = app.visible_patients().iter().map(|p| p.id().clone()).collect();
        assert_eq!(ids, vec![PatientId::from("10")]);
    }

    #[test]
    fn select_highlighted_opens_vitals() {
        let mut app = app();
        app.select_next();
        app.select_highlighted();
        assert_eq!(app.current_view, View::Vitals);
        assert_eq!(app.session.selected_id(), Some(&PatientId::from("11")));
        assert!(app.session.alert().active);

        app.deselect_patient();
        assert!(!app.session.alert().active);
        assert!(app.session.selected().is_none());
    }

    #[test]
    fn navigation_is_clamped() {
        let mut app = app();
        app.select_next_n(10);
        assert_eq!(app.selected_index, 2);
        app.select_prev_n(10);
        assert_eq!(app.selected_index, 0);
    }

    #[test]
    fn go_back_closes_overlay_first() {
        let mut app = app();
        app.select_highlighted();
        app.enter_detail();
        assert!(app.show_detail_overlay);
        app.go_back();
        assert!(!app.show_detail_overlay);
        assert_eq!(app.current_view, View::Vitals);
        app.go_back();
        assert_eq!(app.current_view, View::Roster);
    }

    #[test]
    fn export_requires_patients() {
        let (_tx, source) = ChannelSource::create("test");
        let app = App::new(Box::new(source), Session::default());
        assert!(app.export_state(std::path::Path::new("unused.json")).is_err());
    }
}
