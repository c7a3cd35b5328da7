//! Record store abstraction.
//!
//! Validation and aggregation never touch storage directly; they go through
//! [`RecordStore`], so in-memory, file-backed or external backends can be
//! swapped without changing the core. The store owns the uniqueness of
//! `(candidate, assessor)`: `insert_assessment` must check and insert
//! atomically.

pub mod json_file;
pub mod memory;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

use crate::error::{StoreError, StoreResult};
use crate::models::{Assessment, Candidate};
use serde::{Deserialize, Serialize};

/// Storage operations the assessment core depends on.
pub trait RecordStore: Send + Sync {
    /// Insert a new candidate. Rejects a duplicate id or address.
    fn insert_candidate(&self, candidate: Candidate) -> StoreResult<String>;

    /// Look up a candidate by id, active or not.
    fn find_candidate(&self, id: &str) -> StoreResult<Option<Candidate>>;

    /// Active candidates in registration order.
    fn list_active_candidates(&self) -> StoreResult<Vec<Candidate>>;

    /// Toggle the active flag of a candidate.
    fn set_candidate_active(&self, id: &str, active: bool) -> StoreResult<()>;

    /// Look up the assessment of `candidate_id` by `assessor`. The assessor
    /// matches case-insensitively.
    fn find_assessment(&self, candidate_id: &str, assessor: &str)
        -> StoreResult<Option<Assessment>>;

    /// Append an assessment. Fails if `(candidate, assessor)` already exists.
    fn insert_assessment(&self, assessment: Assessment) -> StoreResult<()>;

    /// Assessments of one candidate in submission order.
    fn list_assessments(&self, candidate_id: &str) -> StoreResult<Vec<Assessment>>;

    /// Every stored assessment in submission order.
    fn list_assessments_all(&self) -> StoreResult<Vec<Assessment>>;
}

/// The full record set, shared by the bundled backends.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Records {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub assessments: Vec<Assessment>,
}

impl Records {
    pub(crate) fn insert_candidate(&mut self, candidate: Candidate) -> StoreResult<String> {
        if self.candidates.iter().any(|c| c.id == candidate.id) {
            return Err(StoreError::DuplicateCandidateId(candidate.id));
        }
        if self
            .candidates
            .iter()
            .any(|c| c.address.eq_ignore_ascii_case(&candidate.address))
        {
            return Err(StoreError::DuplicateAddress(candidate.address));
        }

        let id = candidate.id.clone();
        self.candidates.push(candidate);
        Ok(id)
    }

    pub(crate) fn find_candidate(&self, id: &str) -> Option<Candidate> {
        self.candidates.iter().find(|c| c.id == id).cloned()
    }

    pub(crate) fn list_active_candidates(&self) -> Vec<Candidate> {
        self.candidates.iter().filter(|c| c.active).cloned().collect()
    }

    pub(crate) fn set_candidate_active(&mut self, id: &str, active: bool) -> StoreResult<()> {
        let candidate = self
            .candidates
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::CandidateNotFound(id.to_string()))?;
        candidate.active = active;
        Ok(())
    }

    /// Assessor identities compare case-insensitively, like wallet addresses.
    pub(crate) fn find_assessment(&self, candidate_id: &str, assessor: &str) -> Option<Assessment> {
        self.assessments
            .iter()
            .find(|a| a.candidate == candidate_id && a.assessor.eq_ignore_ascii_case(assessor))
            .cloned()
    }

    pub(crate) fn insert_assessment(&mut self, assessment: Assessment) -> StoreResult<()> {
        if self
            .find_assessment(&assessment.candidate, &assessment.assessor)
            .is_some()
        {
            return Err(StoreError::DuplicateAssessment {
                candidate: assessment.candidate,
                assessor: assessment.assessor,
            });
        }
        self.assessments.push(assessment);
        Ok(())
    }

    pub(crate) fn list_assessments(&self, candidate_id: &str) -> Vec<Assessment> {
        self.assessments
            .iter()
            .filter(|a| a.candidate == candidate_id)
            .cloned()
            .collect()
    }
}
