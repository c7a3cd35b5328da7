//! Score aggregation and statistics.
//!
//! Everything here is a pure function of stored assessments; nothing is
//! cached between calls.

use crate::models::{
    AggregatedScore, Assessment, Candidate, FeedbackEntry, LeaderboardEntry, MedianScore,
    MedianScores, Stats, Trait,
};
use std::collections::HashSet;

/// Median of a set of whole-point scores. Sorts `values` in place.
///
/// Even-sized sets yield the mean of the two middle values, which may be a
/// half point. Returns `None` for an empty set.
pub fn median(values: &mut [u32]) -> Option<MedianScore> {
    if values.is_empty() {
        return None;
    }

    values.sort_unstable();

    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some(MedianScore::midpoint(values[mid - 1], values[mid]))
    } else {
        Some(MedianScore::from_points(values[mid]))
    }
}

/// Per-trait medians across a candidate's assessments.
pub fn aggregate(candidate_id: &str, assessments: &[Assessment]) -> AggregatedScore {
    let relevant: Vec<&Assessment> = assessments
        .iter()
        .filter(|a| a.candidate == candidate_id)
        .collect();

    let trait_median = |t: Trait| {
        let mut values: Vec<u32> = relevant.iter().map(|a| a.traits.get(t)).collect();
        median(&mut values)
    };

    let scores = match (
        trait_median(Trait::Technical),
        trait_median(Trait::Reliability),
        trait_median(Trait::Communication),
        trait_median(Trait::Values),
    ) {
        (Some(technical), Some(reliability), Some(communication), Some(values)) => {
            Some(MedianScores {
                technical,
                reliability,
                communication,
                values,
            })
        }
        _ => None,
    };

    AggregatedScore {
        candidate_id: candidate_id.to_string(),
        assessment_count: relevant.len(),
        total_score: scores.as_ref().map(MedianScores::total),
        scores,
    }
}

/// Rank candidates by total median score, highest first.
///
/// Ties keep the input order, so callers pass candidates in registration
/// order. Unassessed candidates rank with a score of zero.
pub fn leaderboard<I>(candidates: I) -> Vec<LeaderboardEntry>
where
    I: IntoIterator<Item = (Candidate, Vec<Assessment>)>,
{
    let mut entries: Vec<LeaderboardEntry> = candidates
        .into_iter()
        .map(|(candidate, assessments)| {
            let score = aggregate(&candidate.id, &assessments);
            LeaderboardEntry { candidate, score }
        })
        .collect();

    // `sort_by_key` is stable.
    entries.sort_by_key(|e| std::cmp::Reverse(e.score.ranking_score()));

    entries
}

/// Ledger-wide counts.
pub fn compute_stats(active_candidates: usize, assessments: &[Assessment]) -> Stats {
    let unique_assessors: HashSet<String> = assessments
        .iter()
        .map(|a| a.assessor.to_ascii_lowercase())
        .collect();

    let average = if active_candidates > 0 {
        assessments.len() as f64 / active_candidates as f64
    } else {
        0.0
    };

    Stats {
        total_candidates: active_candidates,
        total_assessments: assessments.len(),
        unique_assessors: unique_assessors.len(),
        average_assessments_per_candidate: average,
    }
}

/// Non-empty feedback in submission order.
pub fn collect_feedback(assessments: &[Assessment]) -> Vec<FeedbackEntry> {
    assessments
        .iter()
        .filter(|a| !a.feedback.trim().is_empty())
        .map(|a| FeedbackEntry {
            text: a.feedback.clone(),
            timestamp: a.created_at,
        })
        .collect()
}
