//! The saved report list.
//!
//! The whole list is kept as one JSON array under a single storage key.
//! Each mutation serializes and writes the full list before the in-memory
//! copy changes, so memory and disk never disagree after an error.

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::report::Report;
use crate::storage::Storage;

/// Default storage key for the report list.
pub const DEFAULT_STORE_KEY: &str = "travelAgentReports";

/// Marker in the keys holding unreadable payloads set aside at load time.
const CORRUPT_MARKER: &str = ".corrupt";

/// What [`ReportStore::load`] found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Nothing was persisted yet.
    Empty,
    /// A list was read.
    Loaded {
        /// Number of reports read.
        count: usize,
    },
    /// The persisted value could not be parsed; the store started empty.
    Recovered {
        /// Key the unreadable value was copied to.
        backup_key: String,
        /// Parser message.
        reason: String,
    },
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty"),
            Self::Loaded { count } => write!(f, "loaded {count} reports"),
            Self::Recovered { backup_key, .. } => {
                write!(f, "recovered from unreadable data (saved as '{backup_key}')")
            }
        }
    }
}

/// Copy an unreadable payload under a backup key and return that key.
fn set_aside(storage: &mut Storage, key: &str, raw: &str) -> Result<String> {
    let prefix = format!("{key}{CORRUPT_MARKER}");
    for existing in storage.keys()? {
        if existing.starts_with(&prefix) && storage.get(&existing)?.as_deref() == Some(raw) {
            debug!("Unreadable payload already kept under '{}'", existing);
            return Ok(existing);
        }
    }

    let stamp = Utc::now().format("%Y%m%dT%H%M%S%3fZ").to_string();
    let mut backup_key = format!("{prefix}.{stamp}");
    let mut n = 1;
    while storage.get(&backup_key)?.is_some() {
        n += 1;
        backup_key = format!("{prefix}.{stamp}-{n}");
    }
    storage.put(&backup_key, raw)?;
    Ok(backup_key)
}

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// The report was deleted.
    Removed(Report),
    /// The user declined; nothing changed.
    Declined,
    /// No report had that id; nothing changed.
    NotFound,
}

/// Ordered, persisted list of saved reports, newest first.
#[derive(Debug)]
pub struct ReportStore {
    storage: Storage,
    key: String,
    reports: Vec<Report>,
    state: LoadState,
}

impl ReportStore {
    /// Load the report list stored under `key`.
    ///
    /// A missing value gives an empty store. An unparseable value also gives
    /// an empty store, after copying the raw value to a new
    /// `<key>.corrupt.<timestamp>` entry. Earlier backups are never
    /// overwritten; a payload that is already backed up is not copied again.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be read or the backup cannot
    /// be written.
    pub fn load(mut storage: Storage, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let (reports, state) = match storage.get(&key)? {
            None => (Vec::new(), LoadState::Empty),
            Some(raw) => match serde_json::from_str::<Vec<Report>>(&raw) {
                Ok(reports) => {
                    let count = reports.len();
                    debug!("Loaded {} reports from '{}'", count, key);
                    (reports, LoadState::Loaded { count })
                }
                Err(e) => {
                    let backup_key = set_aside(&mut storage, &key, &raw)?;
                    warn!(
                        "Stored reports under '{}' are unreadable ({}); starting empty, raw data kept under '{}'",
                        key, e, backup_key
                    );
                    (
                        Vec::new(),
                        LoadState::Recovered {
                            backup_key,
                            reason: e.to_string(),
                        },
                    )
                }
            },
        };

        Ok(Self {
            storage,
            key,
            reports,
            state,
        })
    }

    /// What was found at load time.
    #[must_use]
    pub fn load_state(&self) -> &LoadState {
        &self.state
    }

    /// The storage key of the list.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// All reports, newest first.
    #[must_use]
    pub fn reports(&self) -> &[Report] {
        &self.reports
    }

    /// Number of saved reports.
    #[must_use]
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    /// Check whether the store holds no reports.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Look up a report by id.
    #[must_use]
    pub fn get(&self, id: i64) -> Option<&Report> {
        self.reports.iter().find(|r| r.id == id)
    }

    /// The largest id in the store.
    #[must_use]
    pub fn newest_id(&self) -> Option<i64> {
        self.reports.iter().map(|r| r.id).max()
    }

    /// Insert a report at the front and persist the list.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written; the store is then
    /// unchanged.
    pub fn append(&mut self, report: Report) -> Result<()> {
        let mut next = Vec::with_capacity(self.reports.len() + 1);
        next.push(report);
        next.extend(self.reports.iter().cloned());

        self.persist(&next)?;
        self.reports = next;
        info!("Saved report {} ({} total)", self.reports[0].id, self.len());
        Ok(())
    }

    /// Delete the report with `id` once `confirm` agrees.
    ///
    /// `confirm` is only asked when the report exists. An absent id or a
    /// declined confirmation leaves the store untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the list cannot be written; the store is then
    /// unchanged.
    pub fn remove<F>(&mut self, id: i64, confirm: F) -> Result<RemoveOutcome>
    where
        F: FnOnce(&Report) -> bool,
    {
        let Some(index) = self.reports.iter().position(|r| r.id == id) else {
            debug!("Delete of unknown report {} ignored", id);
            return Ok(RemoveOutcome::NotFound);
        };
        if !confirm(&self.reports[index]) {
            debug!("Delete of report {} declined", id);
            return Ok(RemoveOutcome::Declined);
        }

        let mut next = self.reports.clone();
        let removed = next.remove(index);
        self.persist(&next)?;
        self.reports = next;
        info!("Deleted report {} ({} remaining)", id, self.len());
        Ok(RemoveOutcome::Removed(removed))
    }

    fn persist(&mut self, reports: &[Report]) -> Result<()> {
        let json = serde_json::to_string(reports)?;
        self.storage.put(&self.key, &json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{ProblemType, ReportFields};
    use crate::signature::{sample_signature_png, SignatureImage};
    use pretty_assertions::assert_eq;

    fn report(id: i64, booking_no: &str) -> Report {
        Report {
            id,
            created_at: format!("1/1/2025, 10:00:{:02} AM", id % 60),
            fields: ReportFields {
                booking_no: booking_no.to_string(),
                name: format!("Traveler {id}"),
                problem_type: ProblemType::Service,
                ..ReportFields::default()
            },
            traveler_signature: None,
            agent_signature: None,
        }
    }

    fn empty_store() -> ReportStore {
        let storage = Storage::open_in_memory().expect("storage");
        ReportStore::load(storage, DEFAULT_STORE_KEY).expect("store")
    }

    fn ids(store: &ReportStore) -> Vec<i64> {
        store.reports().iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_load_without_data_is_empty() {
        let store = empty_store();
        assert!(store.is_empty());
        assert_eq!(store.load_state(), &LoadState::Empty);
        assert_eq!(store.newest_id(), None);
    }

    #[test]
    fn test_append_inserts_at_front() {
        let mut store = empty_store();
        store.append(report(1, "A")).unwrap();
        store.append(report(2, "B")).unwrap();
        store.append(report(3, "C")).unwrap();

        assert_eq!(ids(&store), vec![3, 2, 1]);
        assert_eq!(store.newest_id(), Some(3));
        assert_eq!(store.get(2).map(|r| r.fields.booking_no.as_str()), Some("B"));
    }

    #[test]
    fn test_append_persists_full_list() {
        let mut store = empty_store();
        store.append(report(1, "A")).unwrap();
        store.append(report(2, "B")).unwrap();

        let raw = store.storage().get(DEFAULT_STORE_KEY).unwrap().unwrap();
        let persisted: Vec<Report> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, store.reports().to_vec());
    }

    #[test]
    fn test_remove_absent_id_is_noop() {
        let mut store = empty_store();
        store.append(report(1, "A")).unwrap();
        let before = store.reports().to_vec();

        let mut asked = false;
        let outcome = store
            .remove(99, |_| {
                asked = true;
                true
            })
            .unwrap();

        assert_eq!(outcome, RemoveOutcome::NotFound);
        assert!(!asked);
        assert_eq!(store.reports(), before.as_slice());
    }

    #[test]
    fn test_remove_declined_keeps_report() {
        let mut store = empty_store();
        store.append(report(1, "A")).unwrap();

        let outcome = store.remove(1, |_| false).unwrap();
        assert_eq!(outcome, RemoveOutcome::Declined);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_remove_keeps_relative_order() {
        let mut store = empty_store();
        for id in 1..=4 {
            store.append(report(id, &format!("B{id}"))).unwrap();
        }

        let outcome = store.remove(3, |r| r.fields.booking_no == "B3").unwrap();
        assert_eq!(outcome, RemoveOutcome::Removed(report(3, "B3")));
        assert_eq!(ids(&store), vec![4, 2, 1]);

        let raw = store.storage().get(DEFAULT_STORE_KEY).unwrap().unwrap();
        let persisted: Vec<Report> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted.iter().map(|r| r.id).collect::<Vec<_>>(), vec![4, 2, 1]);
    }

    #[test]
    fn test_reload_round_trip() {
        let mut traveler = crate::signature::SignaturePad::new(
            crate::signature::SignatureRole::Traveler,
        );
        traveler.load_png(&sample_signature_png()).unwrap();

        let mut first = report(10, "B10");
        first.fields.report_text = "Line one\nLine \"two\", with commas".to_string();
        first.fields.stay_from = "2025-07-01".to_string();
        first.traveler_signature = traveler.to_image().unwrap();
        first.agent_signature = Some(SignatureImage::from_png_bytes(&sample_signature_png()));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.db");
        let expected = {
            let mut store =
                ReportStore::load(Storage::open(&path).unwrap(), DEFAULT_STORE_KEY).unwrap();
            store.append(first).unwrap();
            store.append(report(11, "B11")).unwrap();
            store.reports().to_vec()
        };

        let reloaded =
            ReportStore::load(Storage::open(&path).unwrap(), DEFAULT_STORE_KEY).unwrap();
        assert_eq!(reloaded.load_state(), &LoadState::Loaded { count: 2 });
        assert_eq!(reloaded.reports(), expected.as_slice());
    }

    #[test]
    fn test_corrupt_data_starts_empty_and_keeps_backup() {
        crate::logging::init_test_logging();
        let mut storage = Storage::open_in_memory().unwrap();
        storage.put(DEFAULT_STORE_KEY, "{not json").unwrap();

        let mut store = ReportStore::load(storage, DEFAULT_STORE_KEY).unwrap();
        assert!(store.is_empty());
        let LoadState::Recovered { backup_key, .. } = store.load_state().clone() else {
            panic!("expected recovered state, got {:?}", store.load_state());
        };
        assert!(backup_key.starts_with("travelAgentReports.corrupt."));
        assert_eq!(
            store.storage().get(&backup_key).unwrap().as_deref(),
            Some("{not json")
        );

        store.append(report(1, "A")).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(
            store.storage().get(&backup_key).unwrap().as_deref(),
            Some("{not json")
        );
    }

    #[test]
    fn test_second_corruption_keeps_first_backup() {
        crate::logging::init_test_logging();
        let mut storage = Storage::open_in_memory().unwrap();
        storage.put(DEFAULT_STORE_KEY, "{first").unwrap();
        let store = ReportStore::load(storage, DEFAULT_STORE_KEY).unwrap();
        let LoadState::Recovered { backup_key: first, .. } = store.load_state().clone() else {
            panic!("expected recovered state");
        };

        let mut storage = store.storage;
        storage.put(DEFAULT_STORE_KEY, "{second").unwrap();
        let store = ReportStore::load(storage, DEFAULT_STORE_KEY).unwrap();
        let LoadState::Recovered { backup_key: second, .. } = store.load_state().clone() else {
            panic!("expected recovered state");
        };

        assert_ne!(first, second);
        assert_eq!(store.storage().get(&first).unwrap().as_deref(), Some("{first"));
        assert_eq!(store.storage().get(&second).unwrap().as_deref(), Some("{second"));
    }

    #[test]
    fn test_same_corrupt_payload_is_backed_up_once() {
        let mut storage = Storage::open_in_memory().unwrap();
        storage.put(DEFAULT_STORE_KEY, "{broken").unwrap();
        let first = ReportStore::load(storage, DEFAULT_STORE_KEY).unwrap();
        let first_state = first.load_state().clone();

        let again = ReportStore::load(first.storage, DEFAULT_STORE_KEY).unwrap();
        assert_eq!(again.load_state(), &first_state);
        let backups: Vec<String> = again
            .storage()
            .keys()
            .unwrap()
            .into_iter()
            .filter(|k| k.starts_with("travelAgentReports.corrupt"))
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn test_load_state_display() {
        assert_eq!(LoadState::Empty.to_string(), "empty");
        assert_eq!(
            LoadState::Loaded { count: 3 }.to_string(),
            "loaded 3 reports"
        );
    }
}
