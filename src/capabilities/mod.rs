//! The capability surface handed to an external orchestrating agent.
//!
//! Each operation is independent: it shares nothing mutable with other calls.
//! The statistics table and the decoded model sit behind populate-once caches
//! and are handed out as read-only snapshots; `invalidate` forces a reload.

pub mod catalog;
pub mod error;

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::cache::ResourceCache;
use crate::config::HarnessConfig;
use crate::evidence::{self, EvidenceReport};
use crate::inference::{GamRuntime, InferenceAdapter, InferenceError, ModelRuntime, Prediction};
use crate::player::PlayerRecord;
use crate::search::{SearchError, SearchProvider};
use crate::stats::StatsRepository;

pub use catalog::{catalog, descriptor, CapabilityDescriptor};
pub use error::{CapabilityError, ErrorKind};

pub struct HallOfFameCapabilities {
    config: HarnessConfig,
    runtime: Arc<dyn ModelRuntime>,
    search: Option<Arc<dyn SearchProvider>>,
    table: ResourceCache<StatsRepository>,
    model: ResourceCache<InferenceAdapter>,
}

impl HallOfFameCapabilities {
    /// Build with the bundled model runtime and no search provider.
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            config,
            runtime: Arc::new(GamRuntime),
            search: None,
            table: ResourceCache::new(),
            model: ResourceCache::new(),
        }
    }

    /// Build from config, wiring the Bing adapter when a key is configured.
    pub fn from_config(config: HarnessConfig) -> Result<Self, SearchError> {
        let search: Option<Arc<dyn SearchProvider>> = match config.search.api_key {
            Some(_) => Some(Arc::new(config.search.build_adapter()?)),
            None => None,
        };
        let mut caps = Self::new(config);
        caps.search = search;
        Ok(caps)
    }

    pub fn with_runtime(mut self, runtime: Arc<dyn ModelRuntime>) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn with_search_provider(mut self, provider: Arc<dyn SearchProvider>) -> Self {
        self.search = Some(provider);
        self
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Drop the cached table and model; the next call reloads both.
    pub fn invalidate(&self) {
        self.table.invalidate();
        self.model.invalidate();
        info!("invalidated cached statistics table and model");
    }

    /// The statistics table, loading it on first use.
    pub async fn stats_table(
        &self,
        cancel_flag: Option<&AtomicBool>,
    ) -> Result<Arc<StatsRepository>, CapabilityError> {
        self.table
            .get_or_try_load(|| async {
                Ok::<_, CapabilityError>(StatsRepository::load(
                    &self.config.data_path,
                    self.config.load_timeout,
                    cancel_flag,
                )
                .await?)
            })
            .await
    }

    /// The inference adapter, loading the artifact on first use.
    pub async fn inference(
        &self,
        cancel_flag: Option<&AtomicBool>,
    ) -> Result<Arc<InferenceAdapter>, CapabilityError> {
        self.model
            .get_or_try_load(|| async {
                Ok::<_, CapabilityError>(InferenceAdapter::load(
                    &self.config.model_path,
                    Arc::clone(&self.runtime),
                    self.config.load_timeout,
                    cancel_flag,
                )
                .await?)
            })
            .await
    }

    // =========================================================================
    // OPERATIONS
    // =========================================================================

    /// Full model output for one player. A record with a blank name is
    /// rejected as invalid arguments before the model is loaded.
    pub async fn predict(
        &self,
        stats: &PlayerRecord,
        cancel_flag: Option<&AtomicBool>,
    ) -> Result<Prediction, CapabilityError> {
        stats.validate().map_err(|e| {
            CapabilityError::invalid_arguments(
                catalog::GET_PLAYER_PROBABILITY_OF_HALL_OF_FAME,
                e.to_string(),
            )
        })?;
        let adapter = self.inference(cancel_flag).await?;
        Ok(adapter.predict_hall_of_fame_probability(stats)?)
    }

    pub async fn get_player_probability_of_hall_of_fame(
        &self,
        stats: &PlayerRecord,
        cancel_flag: Option<&AtomicBool>,
    ) -> Result<f64, CapabilityError> {
        Ok(self.predict(stats, cancel_flag).await?.probability)
    }

    pub async fn get_baseball_player_stats(
        &self,
        name: &str,
        cancel_flag: Option<&AtomicBool>,
    ) -> Result<PlayerRecord, CapabilityError> {
        let table = self.stats_table(cancel_flag).await?;
        Ok(table.find_player_by_full_name(name)?.clone())
    }

    /// Cited narrative only. Use [`Self::get_web_search_evidence`] to keep the
    /// footnotes and per-source items.
    pub async fn get_web_search_results(
        &self,
        name: &str,
        cancel_flag: Option<&AtomicBool>,
    ) -> Result<String, CapabilityError> {
        Ok(self.get_web_search_evidence(name, cancel_flag).await?.narrative)
    }

    pub async fn get_web_search_evidence(
        &self,
        name: &str,
        cancel_flag: Option<&AtomicBool>,
    ) -> Result<EvidenceReport, CapabilityError> {
        let provider = self
            .search
            .as_deref()
            .ok_or_else(|| SearchError::config("no search provider configured"))?;
        let timeout = self.config.search.timeout;
        Ok(evidence::gather_evidence(provider, name, timeout, cancel_flag).await?)
    }

    // =========================================================================
    // DISPATCH
    // =========================================================================

    /// Invoke a catalog entry by name with a JSON argument object.
    pub async fn invoke(
        &self,
        name: &str,
        args: &Value,
        cancel_flag: Option<&AtomicBool>,
    ) -> Result<Value, CapabilityError> {
        debug!(capability = name, "invoking capability");
        match name {
            catalog::GET_PLAYER_PROBABILITY_OF_HALL_OF_FAME => {
                let stats = stats_argument(args)?;
                let probability = self
                    .get_player_probability_of_hall_of_fame(&stats, cancel_flag)
                    .await?;
                Ok(Value::from(probability))
            }
            catalog::GET_BASEBALL_PLAYER_STATS => {
                let player_name = name_argument(catalog::GET_BASEBALL_PLAYER_STATS, args)?;
                let record = self.get_baseball_player_stats(player_name, cancel_flag).await?;
                to_json(&record)
            }
            catalog::GET_WEB_SEARCH_RESULTS => {
                let player_name = name_argument(catalog::GET_WEB_SEARCH_RESULTS, args)?;
                let narrative = self.get_web_search_results(player_name, cancel_flag).await?;
                Ok(Value::String(narrative))
            }
            catalog::GET_WEB_SEARCH_EVIDENCE => {
                let player_name = name_argument(catalog::GET_WEB_SEARCH_EVIDENCE, args)?;
                let report = self.get_web_search_evidence(player_name, cancel_flag).await?;
                to_json(&report)
            }
            other => Err(CapabilityError::UnknownCapability(other.to_string())),
        }
    }
}

/// A stats argument with missing, renamed or extra fields breaks the feature
/// contract, so it is reported as a schema mismatch.
fn stats_argument(args: &Value) -> Result<PlayerRecord, CapabilityError> {
    let raw = args.get(catalog::STATS_PARAM).ok_or_else(|| {
        CapabilityError::invalid_arguments(
            catalog::GET_PLAYER_PROBABILITY_OF_HALL_OF_FAME,
            format!("missing '{}'", catalog::STATS_PARAM),
        )
    })?;
    PlayerRecord::deserialize(raw)
        .map_err(|e| InferenceError::schema_mismatch(e.to_string()).into())
}

fn name_argument<'a>(
    capability: &'static str,
    args: &'a Value,
) -> Result<&'a str, CapabilityError> {
    args.get(catalog::NAME_PARAM)
        .and_then(Value::as_str)
        .filter(|name| !name.trim().is_empty())
        .ok_or_else(|| {
            CapabilityError::invalid_arguments(
                capability,
                format!("'{}' must be a non-empty string", catalog::NAME_PARAM),
            )
        })
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, CapabilityError> {
    serde_json::to_value(value).map_err(|e| CapabilityError::Internal(e.to_string()))
}
