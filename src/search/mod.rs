//! Web search providers.
//!
//! Anything that can answer a query string with an ordered list of
//! (title, snippet, url) hits can back the evidence aggregator.

pub mod bing;
pub mod error;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use bing::BingWebSearchAdapter;
pub use error::{ErrorContext, SearchError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub query: String,
    /// Upper bound on returned hits.
    pub count: usize,
}

impl SearchQuery {
    pub fn new(query: impl Into<String>, count: usize) -> Self {
        Self {
            query: query.into(),
            count,
        }
    }
}

/// One provider result, in provider order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

impl SearchHit {
    pub fn new(
        title: impl Into<String>,
        snippet: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            snippet: snippet.into(),
            url: url.into(),
        }
    }
}

#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, SearchError>;
}
