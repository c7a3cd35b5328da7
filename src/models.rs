//! Data models for the assessment ledger.
//!
//! This module contains the core data structures shared by the validator,
//! the aggregator, the record stores and the report renderers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::Add;
use std::str::FromStr;

/// One of the four fixed scoring dimensions of the rubric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trait {
    Technical,
    Reliability,
    Communication,
    Values,
}

impl Trait {
    /// All traits in rubric order.
    pub const ALL: [Trait; 4] = [
        Trait::Technical,
        Trait::Reliability,
        Trait::Communication,
        Trait::Values,
    ];

    /// The key used for this trait in submissions and reports.
    pub fn key(&self) -> &'static str {
        match self {
            Trait::Technical => "technical",
            Trait::Reliability => "reliability",
            Trait::Communication => "communication",
            Trait::Values => "values",
        }
    }
}

impl fmt::Display for Trait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Trait {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "technical" => Ok(Trait::Technical),
            "reliability" => Ok(Trait::Reliability),
            "communication" => Ok(Trait::Communication),
            "values" => Ok(Trait::Values),
            other => Err(format!("unknown trait '{}'", other)),
        }
    }
}

/// The four validated trait scores of one assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitScores {
    pub technical: u32,
    pub reliability: u32,
    pub communication: u32,
    pub values: u32,
}

impl TraitScores {
    pub fn get(&self, t: Trait) -> u32 {
        match t {
            Trait::Technical => self.technical,
            Trait::Reliability => self.reliability,
            Trait::Communication => self.communication,
            Trait::Values => self.values,
        }
    }

    /// Sum of all four traits.
    pub fn total(&self) -> u32 {
        Trait::ALL.iter().map(|t| self.get(*t)).sum()
    }

    /// Smallest of the four traits.
    pub fn min(&self) -> u32 {
        Trait::ALL
            .iter()
            .map(|t| self.get(*t))
            .min()
            .unwrap_or_default()
    }
}

/// A median score, kept in half-points.
///
/// The median of integer scores is always a whole or half-integer value, so
/// storing twice the value keeps aggregation exact and totally ordered.
/// Whole values serialize as JSON integers, half values as floats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MedianScore(u64);

impl MedianScore {
    pub const ZERO: MedianScore = MedianScore(0);

    /// A score of whole points.
    pub fn from_points(points: u32) -> Self {
        Self(u64::from(points) * 2)
    }

    /// The arithmetic mean of two whole-point scores.
    pub fn midpoint(a: u32, b: u32) -> Self {
        Self(u64::from(a) + u64::from(b))
    }

    pub fn half_points(&self) -> u64 {
        self.0
    }

    pub fn is_whole(&self) -> bool {
        self.0 % 2 == 0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 2.0
    }
}

impl Add for MedianScore {
    type Output = MedianScore;

    fn add(self, rhs: Self) -> Self::Output {
        MedianScore(self.0 + rhs.0)
    }
}

impl Sum for MedianScore {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(MedianScore::ZERO, Add::add)
    }
}

impl fmt::Display for MedianScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_whole() {
            write!(f, "{}", self.0 / 2)
        } else {
            write!(f, "{}.5", self.0 / 2)
        }
    }
}

impl Serialize for MedianScore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if self.is_whole() {
            serializer.serialize_u64(self.0 / 2)
        } else {
            serializer.serialize_f64(self.as_f64())
        }
    }
}

impl<'de> Deserialize<'de> for MedianScore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        let doubled = value * 2.0;
        if !doubled.is_finite() || doubled < 0.0 || doubled.fract() != 0.0 {
            return Err(serde::de::Error::custom(format!(
                "median score must be a non-negative multiple of 0.5, got {}",
                value
            )));
        }
        Ok(MedianScore(doubled as u64))
    }
}

/// A nominated candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    /// Slug derived from the display name.
    pub id: String,
    pub name: String,
    /// Wallet address; unique across candidates.
    pub address: String,
    pub statement: String,
    pub nominated_by: String,
    pub nominated_at: DateTime<Utc>,
    /// Cleared when the nomination is withdrawn.
    pub active: bool,
}

impl Candidate {
    /// Derive a candidate id from a display name: lower-cased, whitespace runs become `-`.
    pub fn id_from_name(name: &str) -> String {
        name.split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// One assessor's accepted scoring of one candidate. Never mutated once stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assessment {
    /// 128-bit random token, hex encoded.
    pub id: String,
    pub candidate: String,
    pub assessor: String,
    pub traits: TraitScores,
    #[serde(default)]
    pub feedback: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-trait medians for one candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MedianScores {
    pub technical: MedianScore,
    pub reliability: MedianScore,
    pub communication: MedianScore,
    pub values: MedianScore,
}

impl MedianScores {
    pub fn get(&self, t: Trait) -> MedianScore {
        match t {
            Trait::Technical => self.technical,
            Trait::Reliability => self.reliability,
            Trait::Communication => self.communication,
            Trait::Values => self.values,
        }
    }

    pub fn total(&self) -> MedianScore {
        Trait::ALL.iter().map(|t| self.get(*t)).sum()
    }
}

/// Derived score of one candidate, recomputed from its assessments on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedScore {
    pub candidate_id: String,
    pub assessment_count: usize,
    /// `None` when no assessment has been submitted yet.
    pub scores: Option<MedianScores>,
    pub total_score: Option<MedianScore>,
}

impl AggregatedScore {
    /// Score used for ranking; unassessed candidates rank as zero.
    pub fn ranking_score(&self) -> MedianScore {
        self.total_score.unwrap_or(MedianScore::ZERO)
    }
}

/// A candidate together with its aggregated score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub candidate: Candidate,
    #[serde(flatten)]
    pub score: AggregatedScore,
}

/// Ranked results across all active candidates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    pub total_assessments: usize,
}

/// A piece of free-text feedback left by an assessor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEntry {
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Full results for a single candidate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateResults {
    pub candidate: Candidate,
    #[serde(flatten)]
    pub score: AggregatedScore,
    pub feedback: Vec<FeedbackEntry>,
}

/// Ledger-wide statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub total_candidates: usize,
    pub total_assessments: usize,
    pub unique_assessors: usize,
    pub average_assessments_per_candidate: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trait_from_str() {
        assert_eq!("technical".parse::<Trait>(), Ok(Trait::Technical));
        assert_eq!(" Values ".parse::<Trait>(), Ok(Trait::Values));
        assert!("charisma".parse::<Trait>().is_err());
    }

    #[test]
    fn test_trait_scores_total_and_min() {
        let scores = TraitScores {
            technical: 40,
            reliability: 25,
            communication: 15,
            values: 20,
        };
        assert_eq!(scores.total(), 100);
        assert_eq!(scores.min(), 15);
        assert_eq!(scores.get(Trait::Reliability), 25);
    }

    #[test]
    fn test_median_score_display() {
        assert_eq!(MedianScore::from_points(40).to_string(), "40");
        assert_eq!(MedianScore::midpoint(10, 21).to_string(), "15.5");
        assert_eq!(MedianScore::midpoint(10, 20).to_string(), "15");
    }

    #[test]
    fn test_median_score_json_precision() {
        let whole = serde_json::to_string(&MedianScore::from_points(40)).unwrap();
        assert_eq!(whole, "40");

        let half = serde_json::to_string(&MedianScore::midpoint(20, 25)).unwrap();
        assert_eq!(half, "22.5");

        let parsed: MedianScore = serde_json::from_str("22.5").unwrap();
        assert_eq!(parsed, MedianScore::midpoint(20, 25));
        assert!(serde_json::from_str::<MedianScore>("22.25").is_err());
        assert!(serde_json::from_str::<MedianScore>("-1").is_err());
    }

    #[test]
    fn test_median_score_ordering() {
        assert!(MedianScore::midpoint(10, 11) > MedianScore::from_points(10));
        assert!(MedianScore::midpoint(10, 11) < MedianScore::from_points(11));
        let total: MedianScore = [MedianScore::from_points(1), MedianScore::midpoint(1, 2)]
            .into_iter()
            .sum();
        assert_eq!(total.as_f64(), 2.5);
    }

    #[test]
    fn test_candidate_id_from_name() {
        assert_eq!(Candidate::id_from_name("Alice"), "alice");
        assert_eq!(Candidate::id_from_name("Mary  Ann Lee"), "mary-ann-lee");
        assert_eq!(Candidate::id_from_name("  "), "");
    }

    #[test]
    fn test_ranking_score_defaults_to_zero() {
        let score = AggregatedScore {
            candidate_id: "alice".to_string(),
            assessment_count: 0,
            scores: None,
            total_score: None,
        };
        assert_eq!(score.ranking_score(), MedianScore::ZERO);
    }
}
