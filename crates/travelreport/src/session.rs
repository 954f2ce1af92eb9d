//! One working session of the report tool.
//!
//! A [`Session`] owns the draft, the two signature pads, the report store and
//! the current [`View`], and implements the user actions on top of them.
//! Every action either completes or fails without side effects.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::Exporter;
use crate::form::Draft;
use crate::report::Report;
use crate::signature::SignaturePads;
use crate::storage::Storage;
use crate::store::{RemoveOutcome, ReportStore};

/// Which presentation is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    /// The report form.
    #[default]
    Form,
    /// The list of saved reports.
    Dashboard,
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Form => write!(f, "form"),
            Self::Dashboard => write!(f, "dashboard"),
        }
    }
}

/// Draft, signature pads, store and current view.
#[derive(Debug)]
pub struct Session {
    /// The live draft.
    pub draft: Draft,
    /// The traveler and agent signature pads.
    pub pads: SignaturePads,
    store: ReportStore,
    exporter: Exporter,
    view: View,
}

impl Session {
    /// Assemble a session from its parts.
    #[must_use]
    pub fn new(store: ReportStore, exporter: Exporter, default_phone_code: &str) -> Self {
        Self {
            draft: Draft::new(default_phone_code),
            pads: SignaturePads::default(),
            store,
            exporter,
            view: View::Form,
        }
    }

    /// Open the configured database and load the saved reports.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or read.
    pub fn open(config: &Config) -> Result<Self> {
        let storage = Storage::open(config.database_path())?;
        let store = ReportStore::load(storage, config.storage.store_key.clone())?;
        let exporter = Exporter::new(config.output_dir(), config.page_geometry());
        Ok(Self::new(store, exporter, &config.form.default_phone_code))
    }

    /// The saved reports.
    #[must_use]
    pub fn store(&self) -> &ReportStore {
        &self.store
    }

    /// The exporter used for PDF and CSV output.
    #[must_use]
    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// The active view.
    #[must_use]
    pub fn view(&self) -> View {
        self.view
    }

    /// Switch to another view.
    pub fn show(&mut self, view: View) {
        if self.view != view {
            debug!("View {} -> {}", self.view, view);
        }
        self.view = view;
    }

    /// Save the draft as a new report.
    ///
    /// Validates the draft, snapshots both signatures, prepends the report
    /// to the store and persists it. On success the draft is reset and the
    /// pads are cleared.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a required field is empty, or a storage
    /// or signature error; the session is unchanged in every error case.
    pub fn save(&mut self) -> Result<Report> {
        self.draft.validate()?;
        let (traveler, agent) = self.pads.snapshot()?;

        let report = Report::now(
            self.draft.fields().clone(),
            traveler,
            agent,
            self.store.newest_id(),
        );
        self.store.append(report.clone())?;

        self.draft.reset();
        self.pads.clear();
        info!(
            "Report {} saved for booking {}",
            report.id, report.fields.booking_no
        );
        Ok(report)
    }

    /// Export the draft and the current signatures as PDF without saving.
    ///
    /// # Errors
    ///
    /// Returns a validation error if a required field is empty, or an
    /// export error.
    pub fn export_draft_pdf(&self) -> Result<PathBuf> {
        self.draft.validate()?;
        let (traveler, agent) = self.pads.snapshot()?;
        self.exporter
            .export_draft_pdf(self.draft.fields(), traveler.as_ref(), agent.as_ref())
    }

    /// Export a saved report as PDF.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReportNotFound`] for an unknown id, or an export error.
    pub fn export_report_pdf(&self, id: i64) -> Result<PathBuf> {
        let report = self.store.get(id).ok_or(Error::ReportNotFound { id })?;
        self.exporter.export_report_pdf(report)
    }

    /// Export every saved report as CSV.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NothingToExport`] when the store is empty.
    pub fn export_csv(&self) -> Result<PathBuf> {
        self.exporter.export_csv(self.store.reports())
    }

    /// Open a saved report in the form.
    ///
    /// Copies the report's text fields into the draft and switches to the
    /// form view. Signatures stay on the report; the pads are not touched.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ReportNotFound`] for an unknown id.
    pub fn view_report(&mut self, id: i64) -> Result<&Report> {
        let report = self.store.get(id).ok_or(Error::ReportNotFound { id })?;
        self.draft.load_report(report);
        self.view = View::Form;
        Ok(report)
    }

    /// Delete a saved report once `confirm` agrees.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be persisted.
    pub fn delete<F>(&mut self, id: i64, confirm: F) -> Result<RemoveOutcome>
    where
        F: FnOnce(&Report) -> bool,
    {
        self.store.remove(id, confirm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::PageGeometry;
    use crate::form::Field;
    use crate::report::{ProblemType, DEFAULT_PHONE_CODE};
    use crate::signature::sample_signature_png;
    use crate::store::DEFAULT_STORE_KEY;

    fn session(dir: &tempfile::TempDir) -> Session {
        let storage = Storage::open_in_memory().unwrap();
        let store = ReportStore::load(storage, DEFAULT_STORE_KEY).unwrap();
        let exporter = Exporter::new(dir.path(), PageGeometry::default());
        Session::new(store, exporter, DEFAULT_PHONE_CODE)
    }

    fn fill_scenario(session: &mut Session) {
        session.draft.set_field(Field::BookingNo, "B100");
        session.draft.set_field(Field::Name, "Jane Doe");
        session.draft.set_field(Field::ProblemType, "Payment");
        session.draft.set_field(Field::ReportText, "Room not ready");
        session.pads.traveler.load_png(&sample_signature_png()).unwrap();
        session.pads.agent.load_png(&sample_signature_png()).unwrap();
    }

    #[test]
    fn test_default_view_is_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        assert_eq!(session.view(), View::Form);

        session.show(View::Dashboard);
        assert_eq!(session.view(), View::Dashboard);
        assert_eq!(session.view().to_string(), "dashboard");
    }

    #[test]
    fn test_save_scenario() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        fill_scenario(&mut session);

        let saved = session.save().unwrap();

        assert_eq!(session.store().len(), 1);
        assert_eq!(session.store().reports()[0], saved);
        assert_eq!(saved.fields.booking_no, "B100");
        assert_eq!(saved.fields.problem_type, ProblemType::Payment);
        assert!(saved.traveler_signature.is_some());
        assert!(saved.agent_signature.is_some());
        assert!(session.draft.is_pristine());
        assert!(session.pads.traveler.is_blank());
        assert!(session.pads.agent.is_blank());
    }

    #[test]
    fn test_save_puts_newest_first_with_unique_ids() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);

        let mut ids = Vec::new();
        for n in 0..3 {
            session.draft.set_field(Field::BookingNo, format!("B{n}"));
            session.draft.set_field(Field::Name, "Jane");
            ids.push(session.save().unwrap().id);
        }

        assert!(ids.windows(2).all(|w| w[0] < w[1]));
        let stored: Vec<i64> = session.store().reports().iter().map(|r| r.id).collect();
        assert_eq!(stored, ids.iter().rev().copied().collect::<Vec<_>>());
    }

    #[test]
    fn test_save_without_required_fields_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        session.draft.set_field(Field::Name, "Jane Doe");
        session.pads.traveler.load_png(&sample_signature_png()).unwrap();

        let err = session.save().unwrap_err();
        assert!(err.is_validation_error());
        assert!(session.store().is_empty());
        assert_eq!(session.draft.get(Field::Name), "Jane Doe");
        assert!(!session.pads.traveler.is_blank());

        session.draft.set_field(Field::BookingNo, "B1");
        session.draft.set_field(Field::Name, "");
        assert!(session.save().unwrap_err().is_validation_error());
        assert!(session.store().is_empty());
    }

    #[test]
    fn test_export_draft_requires_fields_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        session.draft.set_field(Field::BookingNo, "B5");

        assert!(session.export_draft_pdf().unwrap_err().is_validation_error());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_export_draft_does_not_persist() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        fill_scenario(&mut session);

        let path = session.export_draft_pdf().unwrap();
        assert!(path.ends_with("TravelAgentReport_B100.pdf"));
        assert!(session.store().is_empty());
        assert!(!session.draft.is_pristine());
        assert!(!session.pads.traveler.is_blank());
    }

    #[test]
    fn test_view_report_repopulates_form_only() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        fill_scenario(&mut session);
        let saved = session.save().unwrap();

        session.show(View::Dashboard);
        let viewed = session.view_report(saved.id).unwrap().clone();

        assert_eq!(viewed, saved);
        assert_eq!(session.view(), View::Form);
        assert_eq!(session.draft.fields(), &saved.fields);
        assert!(session.pads.traveler.is_blank());
        assert!(session.pads.agent.is_blank());
    }

    #[test]
    fn test_resave_after_view_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        fill_scenario(&mut session);
        let first = session.save().unwrap();

        session.view_report(first.id).unwrap();
        let second = session.save().unwrap();

        assert_eq!(session.store().len(), 2);
        assert_ne!(first.id, second.id);
        assert_eq!(first.fields, second.fields);
        assert!(second.traveler_signature.is_none());
    }

    #[test]
    fn test_view_unknown_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        session.show(View::Dashboard);

        let err = session.view_report(1).unwrap_err();
        assert!(matches!(err, Error::ReportNotFound { id: 1 }));
        assert_eq!(session.view(), View::Dashboard);
    }

    #[test]
    fn test_delete_and_export_saved() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        fill_scenario(&mut session);
        let saved = session.save().unwrap();

        let path = session.export_report_pdf(saved.id).unwrap();
        assert!(path
            .to_string_lossy()
            .ends_with(&format!("TravelAgentReport_B100_{}.pdf", saved.id)));

        let csv = session.export_csv().unwrap();
        assert!(csv.ends_with("travel-agent-reports.csv"));

        assert_eq!(
            session.delete(saved.id + 1, |_| true).unwrap(),
            RemoveOutcome::NotFound
        );
        assert!(matches!(
            session.delete(saved.id, |_| true).unwrap(),
            RemoveOutcome::Removed(_)
        ));
        assert!(session.store().is_empty());
        assert!(session.export_csv().unwrap_err().is_empty_export());
        assert!(matches!(
            session.export_report_pdf(saved.id).unwrap_err(),
            Error::ReportNotFound { .. }
        ));
    }
}
