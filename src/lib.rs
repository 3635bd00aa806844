#![forbid(unsafe_code)]

//! # hof-harness
//!
//! The glue contract between a baseball statistics table, a pre-trained
//! Hall of Fame classifier and a web search provider, exposed to an
//! orchestrating agent as a small typed function catalog:
//!
//! - `GetBaseballPlayerStats`: exact-name lookup of a 19-field player record
//! - `GetPlayerProbabilityOfHallOfFame`: calibrated induction probability
//! - `GetWebSearchResults` / `GetWebSearchEvidence`: web evidence with
//!   numbered inline citations and a matching footnote table
//!
//! Storage, model runtime and search provider all sit behind traits, so each
//! can be swapped without touching the capability contract.

pub mod cache;
pub mod capabilities;
pub mod config;
pub mod evidence;
pub mod inference;
pub mod player;
pub mod search;
pub mod stats;

use std::sync::atomic::{AtomicBool, Ordering};

pub use capabilities::{CapabilityError, ErrorKind, HallOfFameCapabilities};
pub use config::HarnessConfig;
pub use evidence::{EvidenceItem, EvidenceReport};
pub use inference::{InferenceAdapter, ModelRuntime, Prediction, ScoreableModel};
pub use player::{FeatureVector, PlayerRecord};
pub use search::{SearchHit, SearchProvider};
pub use stats::StatsRepository;

pub(crate) fn is_cancelled(cancel_flag: Option<&AtomicBool>) -> bool {
    cancel_flag.is_some_and(|flag| flag.load(Ordering::Relaxed))
}
