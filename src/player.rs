//! Player record schema and the feature contract it feeds to the classifier.
//!
//! A record is one row of the statistics table: two hall-of-fame labels, the
//! player's name, fifteen career statistics and an opaque external id, in a
//! fixed positional order. The classifier consumes every non-label column, in
//! the same order, under the column names it was trained with.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of positional fields in a table row.
pub const FIELD_COUNT: usize = 19;

/// Column names in table order. These are also the feature names the model
/// artifact is trained against.
pub const COLUMN_NAMES: [&str; FIELD_COUNT] = [
    "InductedToHallOfFame",
    "OnHallOfFameBallot",
    "FullPlayerName",
    "YearsPlayed",
    "AB",
    "R",
    "H",
    "Doubles",
    "Triples",
    "HR",
    "RBI",
    "SB",
    "BattingAverage",
    "SluggingPct",
    "AllStarAppearances",
    "TB",
    "TotalPlayerAwards",
    "LastYearPlayed",
    "ID",
];

/// JSON field names in table order.
pub const WIRE_FIELD_NAMES: [&str; FIELD_COUNT] = [
    "inductedToHallOfFame",
    "onHallOfFameBallot",
    "fullName",
    "yearsPlayed",
    "atBats",
    "runs",
    "hits",
    "doubles",
    "triples",
    "homeRuns",
    "rbi",
    "stolenBases",
    "battingAverage",
    "sluggingPct",
    "allStarAppearances",
    "totalBases",
    "totalAwards",
    "lastYearPlayed",
    "id",
];

/// Leading label columns that never reach the classifier.
const LABEL_COLUMNS: usize = 2;

// =============================================================================
// RECORD
// =============================================================================

/// Career statistics and hall-of-fame labels for one player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PlayerRecord {
    pub inducted_to_hall_of_fame: bool,
    pub on_hall_of_fame_ballot: bool,
    pub full_name: String,
    pub years_played: f64,
    pub at_bats: f64,
    pub runs: f64,
    pub hits: f64,
    pub doubles: f64,
    pub triples: f64,
    pub home_runs: f64,
    pub rbi: f64,
    pub stolen_bases: f64,
    pub batting_average: f64,
    pub slugging_pct: f64,
    pub all_star_appearances: f64,
    pub total_bases: f64,
    pub total_awards: f64,
    pub last_year_played: f64,
    pub id: String,
}

/// Why a row could not be turned into a [`PlayerRecord`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("expected 19 fields, found {found}")]
    FieldCount { found: usize },

    #[error("field {column}: '{value}' is not a boolean")]
    InvalidBool { column: &'static str, value: String },

    #[error("field {column}: '{value}' is not a finite decimal number")]
    InvalidNumber { column: &'static str, value: String },

    #[error("field FullPlayerName is empty")]
    EmptyName,

    #[error("row could not be decoded: {reason}")]
    Unreadable { reason: String },
}

impl PlayerRecord {
    /// Parse one row that has already been split into fields.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, RecordError> {
        if fields.len() != FIELD_COUNT {
            return Err(RecordError::FieldCount {
                found: fields.len(),
            });
        }
        let field = |idx: usize| fields[idx].as_ref();
        let num = |idx: usize| parse_number(COLUMN_NAMES[idx], field(idx));

        let full_name = field(2).to_string();
        if full_name.trim().is_empty() {
            return Err(RecordError::EmptyName);
        }

        Ok(Self {
            inducted_to_hall_of_fame: parse_bool(COLUMN_NAMES[0], field(0))?,
            on_hall_of_fame_ballot: parse_bool(COLUMN_NAMES[1], field(1))?,
            full_name,
            years_played: num(3)?,
            at_bats: num(4)?,
            runs: num(5)?,
            hits: num(6)?,
            doubles: num(7)?,
            triples: num(8)?,
            home_runs: num(9)?,
            rbi: num(10)?,
            stolen_bases: num(11)?,
            batting_average: num(12)?,
            slugging_pct: num(13)?,
            all_star_appearances: num(14)?,
            total_bases: num(15)?,
            total_awards: num(16)?,
            last_year_played: num(17)?,
            id: field(18).to_string(),
        })
    }

    /// Parse one record read by a `csv` reader.
    pub fn from_csv_record(record: &csv::StringRecord) -> Result<Self, RecordError> {
        let fields: Vec<&str> = record.iter().collect();
        Self::from_fields(&fields)
    }

    /// Check the invariants serde cannot express on its own: a blank name is
    /// rejected here the same way the row parser rejects it.
    pub fn validate(&self) -> Result<(), RecordError> {
        if self.full_name.trim().is_empty() {
            return Err(RecordError::EmptyName);
        }
        Ok(())
    }

    /// The numeric statistics in table order, paired with their column names.
    fn numeric_columns(&self) -> [(&'static str, f64); 15] {
        [
            (COLUMN_NAMES[3], self.years_played),
            (COLUMN_NAMES[4], self.at_bats),
            (COLUMN_NAMES[5], self.runs),
            (COLUMN_NAMES[6], self.hits),
            (COLUMN_NAMES[7], self.doubles),
            (COLUMN_NAMES[8], self.triples),
            (COLUMN_NAMES[9], self.home_runs),
            (COLUMN_NAMES[10], self.rbi),
            (COLUMN_NAMES[11], self.stolen_bases),
            (COLUMN_NAMES[12], self.batting_average),
            (COLUMN_NAMES[13], self.slugging_pct),
            (COLUMN_NAMES[14], self.all_star_appearances),
            (COLUMN_NAMES[15], self.total_bases),
            (COLUMN_NAMES[16], self.total_awards),
            (COLUMN_NAMES[17], self.last_year_played),
        ]
    }

    /// Build the classifier input: every non-label column, in table order.
    pub fn features(&self) -> FeatureVector {
        let mut features = Vec::with_capacity(FIELD_COUNT - LABEL_COLUMNS);
        features.push(Feature::text(COLUMN_NAMES[2], self.full_name.clone()));
        features.extend(
            self.numeric_columns()
                .into_iter()
                .map(|(name, value)| Feature::numeric(name, value)),
        );
        features.push(Feature::text(COLUMN_NAMES[18], self.id.clone()));
        FeatureVector::new(features)
    }

    /// The input schema a compatible model artifact must declare.
    pub fn feature_schema() -> Vec<FeatureColumn> {
        COLUMN_NAMES[LABEL_COLUMNS..]
            .iter()
            .map(|name| FeatureColumn {
                name: (*name).to_string(),
                kind: match *name {
                    "FullPlayerName" | "ID" => FeatureKind::Text,
                    _ => FeatureKind::Numeric,
                },
            })
            .collect()
    }
}

impl FromStr for PlayerRecord {
    type Err = RecordError;

    /// Parse a single table row. Fields may be double-quoted, exactly as in
    /// the table itself; name and id are kept verbatim.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let line = line.strip_suffix('\r').unwrap_or(line);
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(line.as_bytes());

        let mut record = csv::StringRecord::new();
        let unreadable = |e: csv::Error| RecordError::Unreadable {
            reason: e.to_string(),
        };
        if !reader.read_record(&mut record).map_err(unreadable)? {
            return Err(RecordError::FieldCount { found: 0 });
        }
        if reader
            .read_record(&mut csv::StringRecord::new())
            .map_err(unreadable)?
        {
            return Err(RecordError::Unreadable {
                reason: "more than one row".into(),
            });
        }
        Self::from_csv_record(&record)
    }
}

impl fmt::Display for PlayerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}): {} yrs, AB {}, H {}, HR {}, RBI {}, SB {}, AVG {:.3}, SLG {:.3}, \
             All-Star {}, awards {}, last season {}",
            self.full_name,
            self.id,
            self.years_played,
            self.at_bats,
            self.hits,
            self.home_runs,
            self.rbi,
            self.stolen_bases,
            self.batting_average,
            self.slugging_pct,
            self.all_star_appearances,
            self.total_awards,
            self.last_year_played,
        )
    }
}

fn parse_bool(column: &'static str, raw: &str) -> Result<bool, RecordError> {
    let value = raw.trim();
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(RecordError::InvalidBool {
            column,
            value: raw.to_string(),
        })
    }
}

fn parse_number(column: &'static str, raw: &str) -> Result<f64, RecordError> {
    let invalid = || RecordError::InvalidNumber {
        column,
        value: raw.to_string(),
    };
    let value = raw.trim();
    // Rust's float grammar also accepts "inf" and "NaN"; statistics never do.
    let is_decimal = value
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '+' | '-' | 'e' | 'E'));
    if value.is_empty() || !is_decimal {
        return Err(invalid());
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(invalid)
}

// =============================================================================
// FEATURE CONTRACT
// =============================================================================

/// Value type of a feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureKind {
    Numeric,
    Text,
}

/// One declared input column of a model artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureColumn {
    pub name: String,
    pub kind: FeatureKind,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FeatureValue {
    Numeric(f64),
    Text(String),
}

impl FeatureValue {
    pub fn kind(&self) -> FeatureKind {
        match self {
            FeatureValue::Numeric(_) => FeatureKind::Numeric,
            FeatureValue::Text(_) => FeatureKind::Text,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub name: String,
    pub value: FeatureValue,
}

impl Feature {
    pub fn numeric(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value: FeatureValue::Numeric(value),
        }
    }

    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: FeatureValue::Text(value.into()),
        }
    }
}

/// Ordered, named feature values handed to a scoreable model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureVector {
    features: Vec<Feature>,
}

impl FeatureVector {
    pub fn new(features: Vec<Feature>) -> Self {
        Self { features }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Feature> {
        self.features.iter()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.features
            .iter()
            .find(|f| f.name == name)
            .map(|f| &f.value)
    }

    pub fn numeric(&self, name: &str) -> Option<f64> {
        match self.get(name) {
            Some(FeatureValue::Numeric(v)) => Some(*v),
            _ => None,
        }
    }

    /// Drop a column, keeping the order of the rest.
    #[cfg(test)]
    pub(crate) fn without(mut self, name: &str) -> Self {
        self.features.retain(|f| f.name != name);
        self
    }

    /// Rename a column in place.
    #[cfg(test)]
    pub(crate) fn renamed(mut self, from: &str, to: &str) -> Self {
        for feature in &mut self.features {
            if feature.name == from {
                feature.name = to.to_string();
            }
        }
        self
    }
}
