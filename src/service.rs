//! Assessment service: the entry point for submission gateways.
//!
//! Wires validation, the record store and aggregation together. Every read
//! recomputes from stored assessments.

use crate::analysis;
use crate::config::SeedCandidate;
use crate::error::ServiceError;
use crate::models::{
    AggregatedScore, Assessment, Candidate, CandidateResults, FeedbackEntry, Leaderboard, Stats,
};
use crate::store::RecordStore;
use crate::validation::{self, Rubric, SubmissionRequest};
use chrono::Utc;
use tracing::{debug, info, warn};

/// A nomination as received from the gateway.
#[derive(Debug, Clone, Default)]
pub struct Nomination {
    pub name: String,
    pub address: String,
    pub statement: String,
    pub nominated_by: String,
}

impl From<&SeedCandidate> for Nomination {
    fn from(seed: &SeedCandidate) -> Self {
        Self {
            name: seed.name.clone(),
            address: seed.address.clone(),
            statement: seed.statement.clone(),
            nominated_by: seed.nominated_by.clone(),
        }
    }
}

/// Storage-agnostic assessment service.
pub struct AssessmentService<S> {
    store: S,
    rubric: Rubric,
}

impl<S: RecordStore> AssessmentService<S> {
    pub fn new(store: S, rubric: Rubric) -> Self {
        Self { store, rubric }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn rubric(&self) -> &Rubric {
        &self.rubric
    }

    /// Validate and store a submission.
    pub fn submit(&self, request: &SubmissionRequest) -> Result<Assessment, ServiceError> {
        let assessment = match validation::validate_and_build(&self.store, request, &self.rubric)
        {
            Ok(a) => a,
            Err(e) => {
                warn!("Rejected assessment: {}", e);
                return Err(e);
            }
        };

        self.store.insert_assessment(assessment.clone())?;

        info!(
            "New assessment: {}... -> {}",
            short_id(&assessment.assessor),
            assessment.candidate
        );
        Ok(assessment)
    }

    /// Register a new candidate.
    pub fn nominate(&self, nomination: Nomination) -> Result<Candidate, ServiceError> {
        let name = nomination.name.trim();
        let address = nomination.address.trim();
        if name.is_empty() {
            return Err(ServiceError::MissingField("name"));
        }
        if address.is_empty() {
            return Err(ServiceError::MissingField("address"));
        }

        let candidate = Candidate {
            id: Candidate::id_from_name(name),
            name: name.to_string(),
            address: address.to_string(),
            statement: nomination.statement.trim().to_string(),
            nominated_by: nomination.nominated_by.trim().to_string(),
            nominated_at: Utc::now(),
            active: true,
        };

        self.store.insert_candidate(candidate.clone())?;
        info!("New candidate nominated: {} ({})", candidate.name, candidate.id);
        Ok(candidate)
    }

    /// Withdraw an active nomination. When a nominator is recorded, only they
    /// may withdraw it.
    pub fn withdraw(&self, candidate_id: &str, requested_by: &str) -> Result<(), ServiceError> {
        let candidate = self.active_candidate(candidate_id)?;

        if !candidate.nominated_by.is_empty()
            && !candidate.nominated_by.eq_ignore_ascii_case(requested_by.trim())
        {
            return Err(ServiceError::NotNominator {
                candidate: candidate.id,
                nominator: candidate.nominated_by,
            });
        }

        self.store.set_candidate_active(&candidate.id, false)?;
        info!("Nomination withdrawn: {}", candidate.id);
        Ok(())
    }

    /// Insert seed candidates if the store holds no candidates at all.
    /// Returns the number inserted.
    pub fn seed_candidates(&self, seeds: &[SeedCandidate]) -> Result<usize, ServiceError> {
        if seeds.is_empty() || !self.store.list_active_candidates()?.is_empty() {
            return Ok(0);
        }

        let mut inserted = 0;
        for seed in seeds {
            match self.nominate(Nomination::from(seed)) {
                Ok(_) => inserted += 1,
                Err(e) if e.is_rejection() => warn!("Skipping seed candidate {}: {}", seed.name, e),
                Err(e) => return Err(e),
            }
        }

        info!("Default candidates inserted: {}", inserted);
        Ok(inserted)
    }

    pub fn candidates(&self) -> Result<Vec<Candidate>, ServiceError> {
        Ok(self.store.list_active_candidates()?)
    }

    pub fn candidate(&self, candidate_id: &str) -> Result<Candidate, ServiceError> {
        self.active_candidate(candidate_id)
    }

    /// Aggregated score of one active candidate.
    pub fn aggregate(&self, candidate_id: &str) -> Result<AggregatedScore, ServiceError> {
        let candidate = self.active_candidate(candidate_id)?;
        let assessments = self.store.list_assessments(&candidate.id)?;
        Ok(analysis::aggregate(&candidate.id, &assessments))
    }

    /// Score and feedback of one active candidate.
    pub fn results(&self, candidate_id: &str) -> Result<CandidateResults, ServiceError> {
        let candidate = self.active_candidate(candidate_id)?;
        let assessments = self.store.list_assessments(&candidate.id)?;
        debug!(
            "Aggregating {} assessments for {}",
            assessments.len(),
            candidate.id
        );

        Ok(CandidateResults {
            score: analysis::aggregate(&candidate.id, &assessments),
            feedback: analysis::collect_feedback(&assessments),
            candidate,
        })
    }

    /// Feedback left for one active candidate.
    pub fn feedback(&self, candidate_id: &str) -> Result<Vec<FeedbackEntry>, ServiceError> {
        let candidate = self.active_candidate(candidate_id)?;
        let assessments = self.store.list_assessments(&candidate.id)?;
        Ok(analysis::collect_feedback(&assessments))
    }

    /// All active candidates ranked by total median score.
    pub fn leaderboard(&self) -> Result<Leaderboard, ServiceError> {
        let candidates = self.store.list_active_candidates()?;

        let mut rows = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let assessments = self.store.list_assessments(&candidate.id)?;
            rows.push((candidate, assessments));
        }

        Ok(Leaderboard {
            entries: analysis::leaderboard(rows),
            total_assessments: self.store.list_assessments_all()?.len(),
        })
    }

    pub fn stats(&self) -> Result<Stats, ServiceError> {
        let active = self.store.list_active_candidates()?.len();
        let assessments = self.store.list_assessments_all()?;
        Ok(analysis::compute_stats(active, &assessments))
    }

    fn active_candidate(&self, candidate_id: &str) -> Result<Candidate, ServiceError> {
        self.store
            .find_candidate(candidate_id.trim())?
            .filter(|c| c.active)
            .ok_or_else(|| ServiceError::CandidateNotFound(candidate_id.to_string()))
    }
}

/// First eight characters of an id, for logs.
fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((idx, _)) => &id[..idx],
        None => id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, ValidationError};
    use crate::models::{MedianScore, Trait};
    use crate::store::MemoryStore;

    fn service() -> AssessmentService<MemoryStore> {
        AssessmentService::new(MemoryStore::new(), Rubric::default())
    }

    fn nominate(svc: &AssessmentService<MemoryStore>, name: &str, address: &str, by: &str) {
        svc.nominate(Nomination {
            name: name.to_string(),
            address: address.to_string(),
            statement: format!("{} for signer", name),
            nominated_by: by.to_string(),
        })
        .unwrap();
    }

    fn request(candidate: &str, assessor: &str, traits: [i64; 4], feedback: &str) -> SubmissionRequest {
        SubmissionRequest {
            candidate: Some(candidate.to_string()),
            assessor: Some(assessor.to_string()),
            traits: Some(
                Trait::ALL
                    .iter()
                    .zip(traits)
                    .map(|(t, v)| (t.key().to_string(), v))
                    .collect(),
            ),
            feedback: Some(feedback.to_string()),
            signature: None,
        }
    }

    #[test]
    fn test_nominate_derives_id() {
        let svc = service();
        let c = svc
            .nominate(Nomination {
                name: "Mary Ann".to_string(),
                address: "0x1".to_string(),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(c.id, "mary-ann");
        assert!(c.active);
        assert_eq!(svc.candidate("mary-ann").unwrap().name, "Mary Ann");
    }

    #[test]
    fn test_nominate_requires_name_and_address() {
        let svc = service();
        let err = svc
            .nominate(Nomination {
                address: "0x1".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingField("name")));

        let err = svc
            .nominate(Nomination {
                name: "Alice".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::MissingField("address")));
    }

    #[test]
    fn test_nominate_duplicate_address() {
        let svc = service();
        nominate(&svc, "Alice", "0xABC", "");
        let err = svc
            .nominate(Nomination {
                name: "Alicia".to_string(),
                address: "0xabc".to_string(),
                ..Default::default()
            })
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::DuplicateAddress(_))
        ));
        assert!(err.is_rejection());
    }

    #[test]
    fn test_resubmission_is_duplicate() {
        let svc = service();
        nominate(&svc, "Alice", "0x1", "");
        let req = request("alice", "0xv1", [40, 25, 15, 20], "");

        svc.submit(&req).unwrap();
        let err = svc.submit(&req).unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::DuplicateAssessment)
        ));
        assert_eq!(svc.store().list_assessments("alice").unwrap().len(), 1);
    }

    #[test]
    fn test_rejected_submission_not_stored() {
        let svc = service();
        nominate(&svc, "Alice", "0x1", "");
        let err = svc
            .submit(&request("alice", "0xv1", [30, 25, 15, 20], ""))
            .unwrap_err();
        assert!(err.is_rejection());
        assert!(svc.store().list_assessments_all().unwrap().is_empty());
    }

    #[test]
    fn test_results_and_feedback() {
        let svc = service();
        nominate(&svc, "Alice", "0x1", "");
        svc.submit(&request("alice", "0xv2", [25, 25, 25, 25], "Good leader"))
            .unwrap();
        svc.submit(&request("alice", "0xv3", [30, 30, 20, 20], "Strong skills"))
            .unwrap();
        svc.submit(&request("alice", "0xv4", [35, 25, 20, 20], ""))
            .unwrap();

        let results = svc.results("alice").unwrap();
        assert_eq!(results.score.assessment_count, 3);
        let scores = results.score.scores.unwrap();
        assert_eq!(scores.technical, MedianScore::from_points(30));
        assert_eq!(scores.reliability, MedianScore::from_points(25));
        assert_eq!(results.score.total_score, Some(MedianScore::from_points(95)));

        let texts: Vec<String> = svc
            .feedback("alice")
            .unwrap()
            .into_iter()
            .map(|f| f.text)
            .collect();
        assert_eq!(texts, vec!["Good leader", "Strong skills"]);
    }

    #[test]
    fn test_results_without_assessments() {
        let svc = service();
        nominate(&svc, "Alice", "0x1", "");
        let results = svc.results("alice").unwrap();
        assert_eq!(results.score.assessment_count, 0);
        assert!(results.score.scores.is_none());
        assert!(results.feedback.is_empty());
    }

    #[test]
    fn test_unknown_candidate_results() {
        let svc = service();
        assert!(matches!(
            svc.results("nobody").unwrap_err(),
            ServiceError::CandidateNotFound(_)
        ));
    }

    #[test]
    fn test_leaderboard() {
        let svc = service();
        nominate(&svc, "Candidate One", "0xc1", "0xv1");
        nominate(&svc, "Candidate Two", "0xc2", "0xv2");
        nominate(&svc, "Candidate Three", "0xc3", "0xv3");

        svc.submit(&request("candidate-one", "0xv2", [40, 25, 15, 20], ""))
            .unwrap();
        svc.submit(&request("candidate-one", "0xv3", [35, 30, 15, 20], ""))
            .unwrap();
        svc.submit(&request("candidate-two", "0xv1", [85, 5, 5, 5], ""))
            .unwrap();
        svc.submit(&request("candidate-two", "0xv3", [5, 85, 5, 5], ""))
            .unwrap();
        svc.submit(&request("candidate-two", "0xv4", [5, 5, 85, 5], ""))
            .unwrap();

        let board = svc.leaderboard().unwrap();
        assert_eq!(board.total_assessments, 5);

        let order: Vec<&str> = board
            .entries
            .iter()
            .map(|e| e.candidate.id.as_str())
            .collect();
        assert_eq!(order, vec!["candidate-one", "candidate-two", "candidate-three"]);
        assert!(board.entries[0].score.ranking_score() >= board.entries[1].score.ranking_score());
    }

    #[test]
    fn test_withdraw_by_nominator_only() {
        let svc = service();
        nominate(&svc, "Alice", "0x1", "0xNominator");

        let err = svc.withdraw("alice", "0xsomeone").unwrap_err();
        assert!(matches!(err, ServiceError::NotNominator { .. }));

        svc.withdraw("alice", "0xnominator").unwrap();
        assert!(svc.candidates().unwrap().is_empty());
        assert!(matches!(
            svc.withdraw("alice", "0xnominator").unwrap_err(),
            ServiceError::CandidateNotFound(_)
        ));
    }

    #[test]
    fn test_withdrawn_candidate_leaves_leaderboard() {
        let svc = service();
        nominate(&svc, "Alice", "0x1", "");
        nominate(&svc, "Bob", "0x2", "");
        svc.submit(&request("alice", "0xv1", [25, 25, 25, 25], ""))
            .unwrap();

        svc.withdraw("alice", "anyone").unwrap();

        let board = svc.leaderboard().unwrap();
        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.entries[0].candidate.id, "bob");

        let err = svc
            .submit(&request("alice", "0xv2", [25, 25, 25, 25], ""))
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::UnknownCandidate(_))
        ));
    }

    #[test]
    fn test_stats() {
        let svc = service();
        nominate(&svc, "Alice", "0x1", "");
        nominate(&svc, "Bob", "0x2", "");
        svc.submit(&request("alice", "0xv1", [25, 25, 25, 25], ""))
            .unwrap();
        svc.submit(&request("bob", "0xv1", [25, 25, 25, 25], ""))
            .unwrap();
        svc.submit(&request("bob", "0xv2", [25, 25, 25, 25], ""))
            .unwrap();

        let stats = svc.stats().unwrap();
        assert_eq!(stats.total_candidates, 2);
        assert_eq!(stats.total_assessments, 3);
        assert_eq!(stats.unique_assessors, 2);
        assert_eq!(stats.average_assessments_per_candidate, 1.5);
    }

    #[test]
    fn test_seed_only_into_empty_store() {
        let svc = service();
        let seeds = vec![
            SeedCandidate {
                name: "Alice".to_string(),
                address: "0x1".to_string(),
                statement: String::new(),
                nominated_by: String::new(),
            },
            SeedCandidate {
                name: "Bob".to_string(),
                address: "0x1".to_string(),
                statement: String::new(),
                nominated_by: String::new(),
            },
        ];

        // The second seed collides on address and is skipped.
        assert_eq!(svc.seed_candidates(&seeds).unwrap(), 1);
        assert_eq!(svc.seed_candidates(&seeds).unwrap(), 0);
        assert_eq!(svc.candidates().unwrap().len(), 1);
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0x1234567890"), "0x123456");
        assert_eq!(short_id("abc"), "abc");
    }
}
