//! In-memory record store.

use super::{RecordStore, Records};
use crate::error::{StoreError, StoreResult};
use crate::models::{Assessment, Candidate};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Record store kept entirely in memory. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Records>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Records>> {
        self.records.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Records>> {
        self.records.write().map_err(|_| StoreError::Poisoned)
    }
}

impl RecordStore for MemoryStore {
    fn insert_candidate(&self, candidate: Candidate) -> StoreResult<String> {
        self.write()?.insert_candidate(candidate)
    }

    fn find_candidate(&self, id: &str) -> StoreResult<Option<Candidate>> {
        Ok(self.read()?.find_candidate(id))
    }

    fn list_active_candidates(&self) -> StoreResult<Vec<Candidate>> {
        Ok(self.read()?.list_active_candidates())
    }

    fn set_candidate_active(&self, id: &str, active: bool) -> StoreResult<()> {
        self.write()?.set_candidate_active(id, active)
    }

    fn find_assessment(
        &self,
        candidate_id: &str,
        assessor: &str,
    ) -> StoreResult<Option<Assessment>> {
        Ok(self.read()?.find_assessment(candidate_id, assessor))
    }

    fn insert_assessment(&self, assessment: Assessment) -> StoreResult<()> {
        self.write()?.insert_assessment(assessment)
    }

    fn list_assessments(&self, candidate_id: &str) -> StoreResult<Vec<Assessment>> {
        Ok(self.read()?.list_assessments(candidate_id))
    }

    fn list_assessments_all(&self) -> StoreResult<Vec<Assessment>> {
        Ok(self.read()?.assessments.clone())
    }
}
