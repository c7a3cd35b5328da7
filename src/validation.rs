//! Submission validation.
//!
//! Turns a raw submission into an [`Assessment`] or the first failing
//! [`ValidationError`]. Checks run in a fixed order so the reported reason
//! is deterministic:
//!
//! 1. required fields and trait keys
//! 2. candidate registered and active
//! 3. no self-assessment
//! 4. no earlier assessment by the same assessor
//! 5. traits sum to [`TOTAL_POINTS`]
//! 6. every trait at least [`MIN_TRAIT_POINTS`]
//! 7. feedback within the configured limit
//!
//! Nothing is persisted here; the caller inserts the returned assessment.

use crate::error::{ServiceError, ValidationError};
use crate::models::{Assessment, Candidate, Trait, TraitScores};
use crate::store::RecordStore;
use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Points every submission must distribute.
pub const TOTAL_POINTS: i64 = 100;

/// Minimum points per trait.
pub const MIN_TRAIT_POINTS: i64 = 5;

/// Feedback limit enforced by the on-chain questionnaire.
pub const ON_CHAIN_FEEDBACK_LIMIT: usize = 69;

/// Tunable parts of the rubric.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rubric {
    /// Maximum feedback length in characters; `None` means unlimited.
    pub max_feedback_len: Option<usize>,
}

impl From<&crate::config::RubricConfig> for Rubric {
    fn from(config: &crate::config::RubricConfig) -> Self {
        Self {
            max_feedback_len: config.max_feedback_len,
        }
    }
}

/// A submission as received from the gateway, before any validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionRequest {
    pub candidate: Option<String>,
    pub assessor: Option<String>,
    pub traits: Option<BTreeMap<String, i64>>,
    #[serde(default)]
    pub feedback: Option<String>,
    #[serde(default)]
    pub signature: Option<String>,
}

/// Validate a submission against the store and build the assessment.
pub fn validate_and_build<S>(
    store: &S,
    request: &SubmissionRequest,
    rubric: &Rubric,
) -> Result<Assessment, ServiceError>
where
    S: RecordStore + ?Sized,
{
    let candidate_id = required(request.candidate.as_deref(), "candidate")?;
    let assessor = required(request.assessor.as_deref(), "assessor")?;
    let raw = request
        .traits
        .as_ref()
        .ok_or_else(|| ValidationError::MissingField("traits".to_string()))?;
    let raw = parse_traits(raw)?;

    let candidate = store
        .find_candidate(candidate_id)?
        .filter(|c| c.active)
        .ok_or_else(|| ValidationError::UnknownCandidate(candidate_id.to_string()))?;

    if is_self_assessment(&candidate, assessor) {
        return Err(ValidationError::SelfAssessment.into());
    }

    if store.find_assessment(&candidate.id, assessor)?.is_some() {
        return Err(ValidationError::DuplicateAssessment.into());
    }

    let feedback = request.feedback.clone().unwrap_or_default();
    let traits = check_scores(&raw, &feedback, rubric)?;

    Ok(Assessment {
        id: new_assessment_id(),
        candidate: candidate.id,
        assessor: assessor.to_string(),
        traits,
        feedback,
        signature: request.signature.clone().filter(|s| !s.is_empty()),
        created_at: Utc::now(),
    })
}

/// Rubric checks (steps 5 to 7) on raw trait values in [`Trait::ALL`] order.
pub fn check_scores(
    raw: &[i64; 4],
    feedback: &str,
    rubric: &Rubric,
) -> Result<TraitScores, ValidationError> {
    let total: i128 = raw.iter().map(|v| i128::from(*v)).sum();
    if total != i128::from(TOTAL_POINTS) {
        return Err(ValidationError::InvalidTotal {
            expected: TOTAL_POINTS,
            actual: total,
        });
    }

    for (name, value) in Trait::ALL.iter().zip(raw) {
        if *value < MIN_TRAIT_POINTS {
            return Err(ValidationError::TraitBelowMinimum {
                name: *name,
                value: *value,
                minimum: MIN_TRAIT_POINTS,
            });
        }
    }

    if let Some(max) = rubric.max_feedback_len {
        let length = feedback.chars().count();
        if length > max {
            return Err(ValidationError::FeedbackTooLong { length, max });
        }
    }

    let points = |value: i64| {
        u32::try_from(value).map_err(|_| ValidationError::InvalidTotal {
            expected: TOTAL_POINTS,
            actual: total,
        })
    };

    Ok(TraitScores {
        technical: points(raw[0])?,
        reliability: points(raw[1])?,
        communication: points(raw[2])?,
        values: points(raw[3])?,
    })
}

/// Map the submitted keys onto the rubric, rejecting unknown, repeated and
/// missing traits.
fn parse_traits(raw: &BTreeMap<String, i64>) -> Result<[i64; 4], ValidationError> {
    let mut values: [Option<i64>; 4] = [None; 4];

    for (key, value) in raw {
        let t: Trait = key
            .parse()
            .map_err(|_| ValidationError::UnknownTrait(key.clone()))?;
        let slot = Trait::ALL.iter().position(|x| *x == t).unwrap_or_default();
        // Keys differing only in case name the same trait.
        if values[slot].replace(*value).is_some() {
            return Err(ValidationError::DuplicateTrait(t.key().to_string()));
        }
    }

    let mut out = [0i64; 4];
    for (i, t) in Trait::ALL.iter().enumerate() {
        out[i] = values[i].ok_or_else(|| ValidationError::MissingField(format!("traits.{}", t)))?;
    }
    Ok(out)
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str, ValidationError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ValidationError::MissingField(field.to_string()))
}

/// An assessor may not score themselves, by candidate id or wallet address.
fn is_self_assessment(candidate: &Candidate, assessor: &str) -> bool {
    assessor == candidate.id
        || (!candidate.address.is_empty() && assessor.eq_ignore_ascii_case(&candidate.address))
}

/// Fresh 128-bit random identifier, hex encoded.
pub fn new_assessment_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}
