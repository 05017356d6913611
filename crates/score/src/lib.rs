//! `quoteval-score`: scoring engine for speaker-attribution studies.
//!
//! Pure engine crate: receives table contents as strings, returns tallies.
//! File access belongs to the caller (see [`study::TableSource`]).

pub mod aggregate;
pub mod config;
pub mod dataset;
pub mod engine;
pub mod error;
pub mod loader;
pub mod matcher;
pub mod model;
pub mod report;
pub mod study;

pub use aggregate::score;
pub use config::{Alignment, StudyConfig};
pub use engine::{run, RunInput, RunOutcome};
pub use error::ScoreError;
pub use matcher::{infer_speaker, Metric};
pub use model::{Bucket, CharacterSet, QuotationRecord, QuoteCategory, ScoreTally};
pub use study::{run_study, StudyResult, TableSource};
