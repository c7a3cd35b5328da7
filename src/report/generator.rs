//! Markdown and JSON rendering of ledger views.

use crate::models::{
    AggregatedScore, Assessment, Candidate, CandidateResults, FeedbackEntry, Leaderboard,
    MedianScores, Stats, Trait,
};
use anyhow::Result;
use serde::Serialize;

/// Render the leaderboard as a Markdown table.
pub fn generate_leaderboard_markdown(board: &Leaderboard) -> String {
    let mut output = String::new();

    output.push_str("# Leaderboard\n\n");

    if board.entries.is_empty() {
        output.push_str("No active candidates.\n");
        return output;
    }

    output.push_str("| Rank | Candidate | Assessments | Technical | Reliability | Communication | Values | **Total** |\n");
    output.push_str("|:---:|:---|:---:|:---:|:---:|:---:|:---:|:---:|\n");

    for (i, entry) in board.entries.iter().enumerate() {
        output.push_str(&format!(
            "| {} | {} (`{}`) | {} | {} | **{}** |\n",
            i + 1,
            entry.candidate.name,
            entry.candidate.id,
            entry.score.assessment_count,
            score_cells(entry.score.scores.as_ref()),
            entry.score.ranking_score(),
        ));
    }

    output.push_str(&format!(
        "\n*Total assessments: {}*\n",
        board.total_assessments
    ));

    output
}

/// Render one candidate's results.
pub fn generate_results_markdown(results: &CandidateResults) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Results: {}\n\n", results.candidate.name));
    output.push_str(&generate_candidate_section(&results.candidate));
    output.push_str(&generate_score_section(&results.score));

    if !results.feedback.is_empty() {
        output.push_str(&generate_feedback_markdown(&results.feedback));
    }

    output
}

/// Render the list of active candidates.
pub fn generate_candidates_markdown(candidates: &[Candidate]) -> String {
    let mut output = String::new();

    output.push_str(&format!("# Candidates ({})\n\n", candidates.len()));
    if candidates.is_empty() {
        output.push_str("No active candidates.\n");
        return output;
    }

    output.push_str("| Id | Name | Address | Nominated By | Statement |\n");
    output.push_str("|:---|:---|:---|:---|:---|\n");
    for c in candidates {
        output.push_str(&format!(
            "| `{}` | {} | `{}` | {} | {} |\n",
            c.id,
            c.name,
            c.address,
            or_dash(&c.nominated_by),
            or_dash(&c.statement)
        ));
    }

    output
}

/// Render a single candidate.
pub fn generate_candidate_markdown(candidate: &Candidate) -> String {
    format!(
        "# {}\n\n{}",
        candidate.name,
        generate_candidate_section(candidate)
    )
}

/// Render feedback entries.
pub fn generate_feedback_markdown(feedback: &[FeedbackEntry]) -> String {
    let mut section = String::new();

    section.push_str("## Feedback\n\n");
    if feedback.is_empty() {
        section.push_str("No feedback yet.\n");
        return section;
    }

    for entry in feedback {
        section.push_str(&format!(
            "- \"{}\" *({})*\n",
            entry.text,
            entry.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    section.push('\n');

    section
}

/// Render ledger statistics.
pub fn generate_stats_markdown(stats: &Stats) -> String {
    let mut section = String::new();

    section.push_str("# Statistics\n\n");
    section.push_str(&format!("- **Candidates:** {}\n", stats.total_candidates));
    section.push_str(&format!("- **Assessments:** {}\n", stats.total_assessments));
    section.push_str(&format!("- **Unique Assessors:** {}\n", stats.unique_assessors));
    section.push_str(&format!(
        "- **Assessments per Candidate:** {:.1}\n",
        stats.average_assessments_per_candidate
    ));

    section
}

/// Render the receipt of an accepted submission.
pub fn generate_receipt_markdown(assessment: &Assessment) -> String {
    let mut section = String::new();

    section.push_str("Assessment submitted successfully\n\n");
    section.push_str(&format!("- **Assessment Id:** `{}`\n", assessment.id));
    section.push_str(&format!("- **Candidate:** `{}`\n", assessment.candidate));
    for t in Trait::ALL {
        section.push_str(&format!("- **{}:** {}\n", title_case(t.key()), assessment.traits.get(t)));
    }

    section
}

/// Serialize any ledger view as pretty JSON.
pub fn generate_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

fn generate_candidate_section(candidate: &Candidate) -> String {
    let mut section = String::new();

    section.push_str(&format!("- **Id:** `{}`\n", candidate.id));
    section.push_str(&format!("- **Address:** `{}`\n", candidate.address));
    section.push_str(&format!(
        "- **Nominated By:** {}\n",
        or_dash(&candidate.nominated_by)
    ));
    section.push_str(&format!(
        "- **Nominated At:** {}\n",
        candidate.nominated_at.format("%Y-%m-%d")
    ));
    if !candidate.statement.is_empty() {
        section.push_str(&format!("\n> {}\n", candidate.statement));
    }
    section.push('\n');

    section
}

fn generate_score_section(score: &AggregatedScore) -> String {
    let mut section = String::new();

    section.push_str("## Median Scores\n\n");

    let Some(scores) = score.scores.as_ref() else {
        section.push_str("No assessments yet.\n\n");
        return section;
    };

    section.push_str("| Technical | Reliability | Communication | Values | **Total** |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | **{}** |\n\n",
        score_cells(Some(scores)),
        scores.total()
    ));
    section.push_str(&format!(
        "*Based on {} assessment(s)*\n\n",
        score.assessment_count
    ));

    section
}

fn score_cells(scores: Option<&MedianScores>) -> String {
    Trait::ALL
        .iter()
        .map(|t| match scores {
            Some(s) => s.get(*t).to_string(),
            None => "-".to_string(),
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() {
        "-"
    } else {
        value
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
