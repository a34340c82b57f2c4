//! Journal storage: trait plus file-system implementation.
//!
//! Journals are stored as JSON files organized by date and journal ID,
//! under a configurable root directory. Retrieval re-hashes the content
//! and rejects files whose stored hash no longer matches.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use vantage_core::types::EpisodeId;

use crate::{EpisodeJournal, JournalId};

/// Errors that can occur during journal storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Journal not found: {0}")]
    NotFound(JournalId),

    #[error("Integrity check failed for journal {0}: stored hash does not match content")]
    IntegrityViolation(JournalId),

    #[error("Journal has no content hash (not finalized)")]
    NotFinalized,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Query parameters for listing journals.
#[derive(Debug, Default)]
pub struct JournalQuery {
    /// Filter by episode.
    pub episode_id: Option<EpisodeId>,
    /// Filter by environment label.
    pub environment: Option<String>,
    /// Filter by journal ID.
    pub journal_id: Option<JournalId>,
    /// Only include journals started at or after this time.
    pub from: Option<DateTime<Utc>>,
    /// Only include journals started at or before this time.
    pub to: Option<DateTime<Utc>>,
}

/// Trait for journal persistence backends.
pub trait JournalStore {
    /// Store a finalized journal. Returns an error if the journal has no content hash.
    fn save(&self, journal: &EpisodeJournal) -> Result<(), StoreError>;

    /// Retrieve a journal by ID, verifying integrity.
    fn get(&self, id: JournalId) -> Result<EpisodeJournal, StoreError>;

    /// List journals matching the given query, ordered by started_at descending.
    fn list(&self, query: &JournalQuery) -> Result<Vec<EpisodeJournal>, StoreError>;
}

/// File-system backed journal store.
///
/// Stores journals as JSON files in a directory tree:
/// ```text
/// {root}/
///   2026/
///     08/
///       22/
///         {journal_id}.json
/// ```
pub struct FileJournalStore {
    root: PathBuf,
}

impl FileJournalStore {
    /// Create a new store rooted at the given directory.
    /// Creates the directory if it doesn't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Build the file path for a journal based on its start date and ID.
    fn journal_path(&self, journal: &EpisodeJournal) -> PathBuf {
        let date = journal.started_at.format("%Y/%m/%d");
        self.root.join(format!("{}/{}.json", date, journal.id.0))
    }

    /// Build the file path for a journal ID by scanning the directory tree.
    fn find_path(&self, id: JournalId) -> Result<PathBuf, StoreError> {
        let filename = format!("{}.json", id.0);
        find_file_recursive(&self.root, &filename).ok_or(StoreError::NotFound(id))
    }
}

impl JournalStore for FileJournalStore {
    fn save(&self, journal: &EpisodeJournal) -> Result<(), StoreError> {
        if journal.content_hash.is_none() {
            return Err(StoreError::NotFinalized);
        }

        let path = self.journal_path(journal);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(journal)?;
        fs::write(&path, json)?;

        tracing::debug!(
            journal_id = %journal.id,
            episode_id = %journal.episode_id,
            path = %path.display(),
            "Journal saved"
        );

        Ok(())
    }

    fn get(&self, id: JournalId) -> Result<EpisodeJournal, StoreError> {
        let path = self.find_path(id)?;
        let json = fs::read_to_string(&path)?;
        let journal: EpisodeJournal = serde_json::from_str(&json)?;

        if !journal.verify_integrity() {
            return Err(StoreError::IntegrityViolation(id));
        }

        Ok(journal)
    }

    fn list(&self, query: &JournalQuery) -> Result<Vec<EpisodeJournal>, StoreError> {
        let mut results = Vec::new();

        // Walk the directory tree and collect matching journals
        collect_journals_recursive(&self.root, query, &mut results)?;

        // Sort by started_at descending
        results.sort_by(|a, b| b.started_at.cmp(&a.started_at));

        Ok(results)
    }
}

/// Recursively find a file by name.
fn find_file_recursive(dir: &Path, filename: &str) -> Option<PathBuf> {
    if !dir.is_dir() {
        return None;
    }

    let entries = fs::read_dir(dir).ok()?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            if let Some(found) = find_file_recursive(&path, filename) {
                return Some(found);
            }
        } else if path.file_name().and_then(|n| n.to_str()) == Some(filename) {
            return Some(path);
        }
    }

    None
}

/// Recursively collect journals matching a query.
fn collect_journals_recursive(
    dir: &Path,
    query: &JournalQuery,
    results: &mut Vec<EpisodeJournal>,
) -> Result<(), StoreError> {
    if !dir.is_dir() {
        return Ok(());
    }

    let entries = fs::read_dir(dir)?;
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_journals_recursive(&path, query, results)?;
        } else if path.extension().and_then(|e| e.to_str()) == Some("json") {
            let json = fs::read_to_string(&path)?;
            let journal: EpisodeJournal = serde_json::from_str(&json)?;

            if matches_query(&journal, query) {
                results.push(journal);
            }
        }
    }

    Ok(())
}

/// Check whether a journal matches the given query filters.
fn matches_query(journal: &EpisodeJournal, query: &JournalQuery) -> bool {
    if let Some(eid) = &query.episode_id {
        if &journal.episode_id != eid {
            return false;
        }
    }
    if let Some(env) = &query.environment {
        if &journal.environment != env {
            return false;
        }
    }
    if let Some(jid) = &query.journal_id {
        if &journal.id != jid {
            return false;
        }
    }
    if let Some(from) = &query.from {
        if &journal.started_at < from {
            return false;
        }
    }
    if let Some(to) = &query.to {
        if &journal.started_at > to {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::JournalRecorder;

    fn record_test_episode(episode_id: &EpisodeId, environment: &str) -> EpisodeJournal {
        let mut recorder = JournalRecorder::new(episode_id, environment);
        recorder.set_context(serde_json::json!({"hosts": 3}));
        recorder.record_topology_ingested(0, 3, 4, 2, 2);
        recorder.record_delta_applied(1, 1, 0, 0, 1);
        recorder.record_entity_skipped(1, "host", "ghost-99");
        recorder.record_mask_computed(1, 12, 4);
        recorder.finalize()
    }

    #[test]
    fn save_and_retrieve() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJournalStore::new(dir.path()).unwrap();
        let episode = EpisodeId::new();
        let journal = record_test_episode(&episode, "test-env");
        let id = journal.id;

        store.save(&journal).unwrap();
        let retrieved = store.get(id).unwrap();

        assert_eq!(retrieved.id, id);
        assert_eq!(retrieved.episode_id, episode);
        assert_eq!(retrieved.steps.len(), 4);
        assert!(retrieved.verify_integrity());
    }

    #[test]
    fn integrity_violation_detected() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJournalStore::new(dir.path()).unwrap();
        let journal = record_test_episode(&EpisodeId::new(), "test-env");
        let id = journal.id;

        store.save(&journal).unwrap();

        // Tamper with the file: change the environment label
        let path = store.find_path(id).unwrap();
        let mut tampered: EpisodeJournal =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        tampered.environment = "TAMPERED".to_string();
        fs::write(&path, serde_json::to_string_pretty(&tampered).unwrap()).unwrap();

        // Retrieval should fail with integrity violation
        let result = store.get(id);
        assert!(matches!(result, Err(StoreError::IntegrityViolation(_))));
    }

    #[test]
    fn save_rejects_unfinalized() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJournalStore::new(dir.path()).unwrap();

        let journal = EpisodeJournal {
            id: JournalId::new(),
            episode_id: EpisodeId::new(),
            environment: "test-env".to_string(),
            context: serde_json::Value::Null,
            steps: vec![],
            started_at: Utc::now(),
            completed_at: None,
            content_hash: None, // not finalized
        };

        let result = store.save(&journal);
        assert!(matches!(result, Err(StoreError::NotFinalized)));
    }

    #[test]
    fn list_filters_by_environment() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJournalStore::new(dir.path()).unwrap();

        let j1 = record_test_episode(&EpisodeId::new(), "chain-6");
        let j2 = record_test_episode(&EpisodeId::new(), "mesh-12");
        let j3 = record_test_episode(&EpisodeId::new(), "chain-6");

        store.save(&j1).unwrap();
        store.save(&j2).unwrap();
        store.save(&j3).unwrap();

        let query = JournalQuery {
            environment: Some("chain-6".to_string()),
            ..Default::default()
        };
        let results = store.list(&query).unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|j| j.environment == "chain-6"));
    }

    #[test]
    fn list_filters_by_episode() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileJournalStore::new(dir.path()).unwrap();

        let e1 = EpisodeId::new();
        let e2 = EpisodeId::new();

        let j1 = record_test_episode(&e1, "chain-6");
        let j2 = record_test_episode(&e2, "chain-6");

        store.save(&j1).unwrap();
        store.save(&j2).unwrap();

        let query = JournalQuery {
            episode_id: Some(e1.clone()),
            ..Default::default()
        };
        let results = store.list(&query).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].episode_id, e1);
    }

    #[test]
    fn hash_changes_when_steps_change() {
        let journal = record_test_episode(&EpisodeId::new(), "test-env");
        let original = journal.compute_hash();

        let mut altered = journal.clone();
        altered.steps.pop();
        assert_ne!(original, altered.compute_hash());
        assert!(!altered.verify_integrity());
    }
}
