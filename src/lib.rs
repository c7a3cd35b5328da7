//! Peer Assess - validated peer assessments and median-score leaderboards.
//!
//! The core is storage-agnostic: [`validation`] checks a submission,
//! [`analysis`] aggregates per-trait medians and ranks candidates, and both
//! reach storage only through the [`store::RecordStore`] trait.
//! [`service::AssessmentService`] ties them together for a gateway such as
//! the bundled command-line tool.

pub mod analysis;
pub mod cli;
pub mod config;
pub mod error;
pub mod models;
pub mod report;
pub mod service;
pub mod store;
pub mod validation;

pub use error::{ServiceError, StoreError, ValidationError};
pub use service::{AssessmentService, Nomination};
pub use store::{JsonFileStore, MemoryStore, RecordStore};
pub use validation::{validate_and_build, Rubric, SubmissionRequest};
