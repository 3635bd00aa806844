//! In-memory statistics table with exact-name lookup.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

use crate::player::{PlayerRecord, RecordError};

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("no player named '{name}'")]
    NotFound { name: String },

    #[error("statistics table {path:?} unavailable: {reason}")]
    SourceUnavailable { path: PathBuf, reason: String },

    /// `row` is the 1-based line in the source; the header is line 1.
    #[error("malformed record on row {row}: {source}")]
    MalformedRecord {
        row: u64,
        #[source]
        source: RecordError,
    },

    #[error("table load cancelled")]
    Cancelled,
}

/// Every player row of one statistics table, in table order.
#[derive(Debug, Clone, Default)]
pub struct StatsRepository {
    players: Vec<PlayerRecord>,
}

impl StatsRepository {
    pub fn new(players: Vec<PlayerRecord>) -> Self {
        Self { players }
    }

    /// Read and parse the whole table. One bad row fails the load.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, StatsError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| StatsError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let repo = Self::from_reader_at(file, path)?;
        info!(path = %path.display(), players = repo.len(), "loaded statistics table");
        Ok(repo)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, StatsError> {
        Self::from_reader_at(reader, Path::new("<reader>"))
    }

    /// Rows are parsed with [`PlayerRecord::from_csv_record`], so quoting follows
    /// the same rules as [`PlayerRecord::from_str`]. Blank lines are rows
    /// with no fields and fail the load; one trailing line break is allowed.
    fn from_reader_at<R: Read>(mut reader: R, path: &Path) -> Result<Self, StatsError> {
        let mut raw = Vec::new();
        reader
            .read_to_end(&mut raw)
            .map_err(|e| StatsError::SourceUnavailable {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(raw.as_slice());

        let mut players = Vec::new();
        // Header is line 1.
        let mut next_line = 2;
        for result in reader.records() {
            let record = result.map_err(|e| csv_error(e, path))?;
            let row = record.position().map(|p| p.line()).unwrap_or(0);
            if row > next_line {
                return Err(blank_row(next_line));
            }
            let player = PlayerRecord::from_csv_record(&record)
                .map_err(|source| StatsError::MalformedRecord { row, source })?;
            players.push(player);

            let embedded_breaks: usize = record.iter().map(|f| f.matches('\n').count()).sum();
            next_line = row + 1 + embedded_breaks as u64;
        }

        if let Some(row) = trailing_blank_row(&raw) {
            return Err(blank_row(row));
        }
        Ok(Self { players })
    }

    /// Load on the blocking pool, bounded by `timeout`.
    pub async fn load(
        path: impl AsRef<Path>,
        timeout: Duration,
        cancel_flag: Option<&AtomicBool>,
    ) -> Result<Self, StatsError> {
        if crate::is_cancelled(cancel_flag) {
            return Err(StatsError::Cancelled);
        }
        let path = path.as_ref().to_path_buf();
        let unavailable = |reason: String| StatsError::SourceUnavailable {
            path: path.clone(),
            reason,
        };

        let task_path = path.clone();
        let task = tokio::task::spawn_blocking(move || Self::from_path(task_path));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(unavailable(format!("load task failed: {join}"))),
            Err(_) => Err(unavailable(format!("read timed out after {timeout:?}"))),
        }
    }

    /// Exact, case-sensitive match on the full name. First row wins.
    pub fn find_player_by_full_name(&self, name: &str) -> Result<&PlayerRecord, StatsError> {
        let found = self.players.iter().find(|p| p.full_name == name);
        debug!(name, found = found.is_some(), "player lookup");
        found.ok_or_else(|| StatsError::NotFound {
            name: name.to_string(),
        })
    }

    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

fn blank_row(row: u64) -> StatsError {
    StatsError::MalformedRecord {
        row,
        source: RecordError::FieldCount { found: 0 },
    }
}

/// Line number of the first blank line after the last row, if the table ends
/// with more than one line break.
fn trailing_blank_row(raw: &[u8]) -> Option<u64> {
    let content_len = raw
        .iter()
        .rposition(|b| !matches!(b, b'\r' | b'\n'))
        .map_or(0, |idx| idx + 1);
    let (content, tail) = raw.split_at(content_len);
    let tail_breaks = tail.iter().filter(|&&b| b == b'\n').count();
    if tail_breaks <= 1 {
        return None;
    }
    let content_lines = content.iter().filter(|&&b| b == b'\n').count() as u64 + 1;
    Some(content_lines + 1)
}

fn csv_error(err: csv::Error, path: &Path) -> StatsError {
    let row = err.position().map(|p| p.line()).unwrap_or(0);
    match err.into_kind() {
        csv::ErrorKind::Io(io) => StatsError::SourceUnavailable {
            path: path.to_path_buf(),
            reason: io.to_string(),
        },
        other => StatsError::MalformedRecord {
            row,
            source: RecordError::Unreadable {
                reason: format!("{other:?}"),
            },
        },
    }
}
