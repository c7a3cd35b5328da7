//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Peer Assess - validated peer assessments for DAO signer elections
///
/// Assessors distribute 100 points across four traits (technical,
/// reliability, communication, values; at least 5 each). Candidates are
/// ranked by the sum of their per-trait median scores.
///
/// Examples:
///   peer-assess nominate --name Alice --address 0x1234... --nominated-by 0xabcd...
///   peer-assess assess --candidate alice --assessor 0xbeef... --traits technical=40,reliability=25,communication=15,values=20
///   peer-assess results alice --format json
///   peer-assess leaderboard
///   peer-assess init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file
    ///
    /// If not specified, looks for .peer-assess.toml in the current directory
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Path of the JSON record store
    ///
    /// Overrides `general.store_path` from the config file.
    #[arg(short, long, global = true, value_name = "FILE", env = "PEER_ASSESS_STORE")]
    pub store: Option<PathBuf>,

    /// Maximum feedback length in characters (69 matches the on-chain limit)
    #[arg(long, global = true, value_name = "CHARS")]
    pub max_feedback_len: Option<usize>,

    /// Output format (markdown, json)
    #[arg(long, global = true, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List active candidates
    Candidates,

    /// Show one candidate
    Candidate {
        /// Candidate id
        id: String,
    },

    /// Nominate a new candidate
    Nominate {
        /// Display name; the candidate id is derived from it
        #[arg(long)]
        name: Option<String>,

        /// Wallet address of the candidate
        #[arg(long)]
        address: Option<String>,

        /// Nomination statement
        #[arg(long, default_value = "")]
        statement: String,

        /// Address of the nominator
        #[arg(long, default_value = "")]
        nominated_by: String,
    },

    /// Withdraw a nomination
    Withdraw {
        /// Candidate id
        id: String,

        /// Address requesting the withdrawal (must be the nominator)
        #[arg(long, value_name = "ADDRESS", default_value = "")]
        by: String,
    },

    /// Submit an assessment
    Assess {
        /// Candidate id being assessed
        #[arg(long)]
        candidate: Option<String>,

        /// Assessor id or wallet address
        #[arg(long)]
        assessor: Option<String>,

        /// Trait scores as key=value pairs (comma-separated)
        ///
        /// Example: --traits technical=40,reliability=25,communication=15,values=20
        #[arg(long, value_name = "TRAIT=POINTS", value_delimiter = ',', value_parser = parse_trait_pair)]
        traits: Vec<(String, i64)>,

        /// Optional free-text feedback
        #[arg(long)]
        feedback: Option<String>,

        /// Optional wallet signature over the submission
        #[arg(long)]
        signature: Option<String>,
    },

    /// Show median scores and feedback for one candidate
    Results {
        /// Candidate id
        id: String,
    },

    /// Rank all active candidates by total median score
    Leaderboard,

    /// Show ledger statistics
    Stats,

    /// Show feedback left for one candidate
    Feedback {
        /// Candidate id
        id: String,
    },

    /// Generate a default .peer-assess.toml configuration file
    InitConfig,
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Parse a single `trait=points` pair.
fn parse_trait_pair(s: &str) -> Result<(String, i64), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("invalid trait score '{}': expected TRAIT=POINTS", s))?;

    let points = value
        .trim()
        .parse::<i64>()
        .map_err(|_| format!("invalid points for trait '{}': '{}'", key.trim(), value.trim()))?;

    Ok((key.trim().to_string(), points))
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref store) = self.store {
            if store.is_dir() {
                return Err(format!("Store path is a directory: {}", store.display()));
            }
        }

        if let Some(ref config) = self.config {
            if !config.exists() {
                return Err(format!("Config file does not exist: {}", config.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
