//! Error types for submission validation, record stores and the service layer.

use crate::models::Trait;
use thiserror::Error;

/// Reasons a submission is rejected, in the order the checks run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Unknown trait: {0}")]
    UnknownTrait(String),

    #[error("Trait submitted more than once: {0}")]
    DuplicateTrait(String),

    #[error("Candidate not found: {0}")]
    UnknownCandidate(String),

    #[error("Cannot assess yourself")]
    SelfAssessment,

    #[error("You have already assessed this candidate")]
    DuplicateAssessment,

    #[error("Traits must sum to {expected} (current: {actual})")]
    InvalidTotal { expected: i64, actual: i128 },

    #[error("Trait {name} must be at least {minimum} points (got {value})")]
    TraitBelowMinimum {
        name: Trait,
        value: i64,
        minimum: i64,
    },

    #[error("Feedback too long ({length} characters, {max} max)")]
    FeedbackTooLong { length: usize, max: usize },
}

/// Result type for record store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by a record store backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Candidate id already exists: {0}")]
    DuplicateCandidateId(String),

    #[error("Candidate with this address already exists: {0}")]
    DuplicateAddress(String),

    #[error("Assessment already exists for candidate {candidate} by {assessor}")]
    DuplicateAssessment { candidate: String, assessor: String },

    #[error("Candidate not found: {0}")]
    CandidateNotFound(String),

    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Errors surfaced to the submission gateway.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Candidate not found: {0}")]
    CandidateNotFound(String),

    #[error("Only the nominator ({nominator}) can withdraw candidate {candidate}")]
    NotNominator { candidate: String, nominator: String },

    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            // A lost check-and-insert race reports as an ordinary duplicate.
            StoreError::DuplicateAssessment { .. } => {
                ServiceError::Validation(ValidationError::DuplicateAssessment)
            }
            other => ServiceError::Store(other),
        }
    }
}

impl ServiceError {
    /// Whether the caller sent a request that must be corrected, as opposed to
    /// a backend failure.
    pub fn is_rejection(&self) -> bool {
        match self {
            ServiceError::Store(err) => matches!(
                err,
                StoreError::DuplicateCandidateId(_)
                    | StoreError::DuplicateAddress(_)
                    | StoreError::CandidateNotFound(_)
            ),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_duplicate_maps_to_validation() {
        let err: ServiceError = StoreError::DuplicateAssessment {
            candidate: "alice".to_string(),
            assessor: "0xabc".to_string(),
        }
        .into();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::DuplicateAssessment)
        ));
        assert!(err.is_rejection());
    }

    #[test]
    fn test_backend_failures_are_not_rejections() {
        let err: ServiceError = StoreError::Poisoned.into();
        assert!(!err.is_rejection());

        let err: ServiceError = StoreError::DuplicateAddress("0x1".to_string()).into();
        assert!(err.is_rejection());
    }

    #[test]
    fn test_messages() {
        let err = ValidationError::InvalidTotal {
            expected: 100,
            actual: 90,
        };
        assert_eq!(err.to_string(), "Traits must sum to 100 (current: 90)");

        let err = ValidationError::TraitBelowMinimum {
            name: Trait::Communication,
            value: 4,
            minimum: 5,
        };
        assert_eq!(
            err.to_string(),
            "Trait communication must be at least 5 points (got 4)"
        );
    }
}
