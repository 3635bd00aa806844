//! Citation-numbered web evidence about a player.
//!
//! Ordinals are assigned once, in provider order, and the narrative and the
//! footnote table are written from that same pass, so `[k]` in the narrative
//! always resolves to the k-th footnote.

use std::fmt::Write as _;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::search::{SearchError, SearchHit, SearchProvider, SearchQuery};

/// Fixed phrase prepended to the player name in the search query.
pub const TOPIC_PHRASE: &str = "baseball hall of fame";

/// Results requested per query.
pub const RESULT_COUNT: usize = 8;

/// Fixed opening of every narrative, present even with no results.
pub const NARRATIVE_PREAMBLE: &str = "Web search results:\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceItem {
    /// 1-based citation number.
    pub ordinal: usize,
    pub title: String,
    pub snippet: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceReport {
    pub narrative: String,
    pub footnotes: String,
    pub items: Vec<EvidenceItem>,
}

impl EvidenceReport {
    /// Number the hits 1..=N and render both outputs in one pass.
    /// Duplicate URLs are kept.
    pub fn from_hits(hits: Vec<SearchHit>) -> Self {
        let mut narrative = String::from(NARRATIVE_PREAMBLE);
        let mut footnotes = String::new();
        let mut items = Vec::with_capacity(hits.len());

        for (idx, hit) in hits.into_iter().enumerate() {
            let item = EvidenceItem {
                ordinal: idx + 1,
                title: hit.title,
                snippet: hit.snippet,
                url: hit.url,
            };
            // Writing to a String cannot fail.
            let _ = write!(
                narrative,
                "[{}]: \"{}: {}\"\nURL: {}\n\n",
                item.ordinal, item.title, item.snippet, item.url
            );
            let _ = write!(
                footnotes,
                "[{}]: {}: {}  \n",
                item.ordinal, item.title, item.url
            );
            items.push(item);
        }

        Self {
            narrative,
            footnotes,
            items,
        }
    }

    /// The item cited as `[ordinal]`.
    pub fn citation(&self, ordinal: usize) -> Option<&EvidenceItem> {
        ordinal
            .checked_sub(1)
            .and_then(|idx| self.items.get(idx))
            .filter(|item| item.ordinal == ordinal)
    }

    /// The narrative without its fixed preamble.
    pub fn citations_text(&self) -> &str {
        self.narrative
            .strip_prefix(NARRATIVE_PREAMBLE)
            .unwrap_or(&self.narrative)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The query issued for `player_name`.
pub fn evidence_query(player_name: &str) -> SearchQuery {
    SearchQuery::new(format!("{TOPIC_PHRASE} {player_name}"), RESULT_COUNT)
}

/// Query `provider` about a player and build the cited report.
///
/// An empty result set is a valid, empty report. The call is bounded by
/// `timeout`; the cancel flag is checked before the request goes out.
pub async fn gather_evidence(
    provider: &dyn SearchProvider,
    player_name: &str,
    timeout: Duration,
    cancel_flag: Option<&AtomicBool>,
) -> Result<EvidenceReport, SearchError> {
    if crate::is_cancelled(cancel_flag) {
        return Err(SearchError::Cancelled);
    }

    let query = evidence_query(player_name);
    let start = Instant::now();
    let hits = match tokio::time::timeout(timeout, provider.search(&query)).await {
        Ok(Ok(hits)) => hits,
        Ok(Err(err)) => {
            warn!(provider = provider.name(), code = err.code(), error = %err, "search failed");
            return Err(err);
        }
        Err(_) => {
            warn!(provider = provider.name(), ?timeout, "search timed out");
            return Err(SearchError::Timeout(timeout));
        }
    };

    debug!(
        provider = provider.name(),
        player = player_name,
        hits = hits.len(),
        latency_ms = start.elapsed().as_millis() as u64,
        "gathered evidence"
    );
    Ok(EvidenceReport::from_hits(hits))
}
