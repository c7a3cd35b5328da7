//! JSON file backed record store.
//!
//! The whole record set is held in memory and rewritten to disk after every
//! mutation. Writes go to a temporary file in the target directory which is
//! then renamed over the store file, so a crash never leaves a torn document.
//!
//! Several processes may share one store file. Every mutation takes an
//! exclusive advisory lock on a sibling `<store>.lock` file, reloads the
//! document under that lock and only then applies the change, so concurrent
//! writers never drop each other's records or slip a duplicate past the
//! composite-key check.

use super::{RecordStore, Records};
use crate::error::{StoreError, StoreResult};
use crate::models::{Assessment, Candidate};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Record store persisted as a single JSON document.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock_path: PathBuf,
    records: RwLock<Records>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut lock_path = path.clone().into_os_string();
        lock_path.push(".lock");

        let records = load(&path)?;
        if path.exists() {
            info!(
                "Loaded store {} ({} candidates, {} assessments)",
                path.display(),
                records.candidates.len(),
                records.assessments.len()
            );
        } else {
            info!("Creating new store at {}", path.display());
        }

        Ok(Self {
            path,
            lock_path: PathBuf::from(lock_path),
            records: RwLock::new(records),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Records>> {
        self.records.read().map_err(|_| StoreError::Poisoned)
    }

    /// Exclusive lock shared with every other handle on the same store file.
    /// Released when the returned file is dropped.
    fn lock(&self) -> StoreResult<File> {
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .open(&self.lock_path)?;
        file.lock_exclusive()?;
        Ok(file)
    }

    /// Apply a mutation to the latest on-disk document and persist it. The
    /// in-memory state only changes once the new document is on disk.
    fn mutate<T>(&self, op: impl FnOnce(&mut Records) -> StoreResult<T>) -> StoreResult<T> {
        let mut guard = self.records.write().map_err(|_| StoreError::Poisoned)?;
        let _lock = self.lock()?;

        let mut next = load(&self.path)?;
        let out = match op(&mut next) {
            Ok(out) => out,
            Err(e) => {
                *guard = next;
                return Err(e);
            }
        };
        self.persist(&next)?;
        *guard = next;

        Ok(out)
    }

    fn persist(&self, records: &Records) -> StoreResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let content = serde_json::to_vec_pretty(records)?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&content)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!("Persisted store to {}", self.path.display());
        Ok(())
    }
}

/// Read the document at `path`, or an empty record set if there is none yet.
fn load(path: &Path) -> StoreResult<Records> {
    if !path.exists() {
        return Ok(Records::default());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

impl RecordStore for JsonFileStore {
    fn insert_candidate(&self, candidate: Candidate) -> StoreResult<String> {
        self.mutate(|records| records.insert_candidate(candidate))
    }

    fn find_candidate(&self, id: &str) -> StoreResult<Option<Candidate>> {
        Ok(self.read()?.find_candidate(id))
    }

    fn list_active_candidates(&self) -> StoreResult<Vec<Candidate>> {
        Ok(self.read()?.list_active_candidates())
    }

    fn set_candidate_active(&self, id: &str, active: bool) -> StoreResult<()> {
        self.mutate(|records| records.set_candidate_active(id, active))
    }

    fn find_assessment(
        &self,
        candidate_id: &str,
        assessor: &str,
    ) -> StoreResult<Option<Assessment>> {
        Ok(self.read()?.find_assessment(candidate_id, assessor))
    }

    fn insert_assessment(&self, assessment: Assessment) -> StoreResult<()> {
        self.mutate(|records| records.insert_assessment(assessment))
    }

    fn list_assessments(&self, candidate_id: &str) -> StoreResult<Vec<Assessment>> {
        Ok(self.read()?.list_assessments(candidate_id))
    }

    fn list_assessments_all(&self) -> StoreResult<Vec<Assessment>> {
        Ok(self.read()?.assessments.clone())
    }
}
