use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DataError;

/// Columns every source file must carry, in the order the sample writer
/// emits them. `fuel` and `transmission` are optional extras.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    "price",
    "model_year",
    "model",
    "condition",
    "cylinders",
    "odometer",
    "type",
    "paint_color",
    "is_4wd",
    "date_posted",
    "days_listed",
];

// ---------------------------------------------------------------------------
// Number – a cleaned numeric cell
// ---------------------------------------------------------------------------

/// A numeric cell after null-filling. A whole column is either `Int` (every
/// value had no fractional residue) or `Float`.
#[derive(Debug, Clone, Copy)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(&self) -> f64 {
        match self {
            Number::Int(i) => *i as f64,
            Number::Float(v) => *v,
        }
    }

    /// `0` is the fill value for missing entries.
    pub fn is_zero(&self) -> bool {
        self.as_f64() == 0.0
    }
}

// -- Numeric ordering across variants so mixed columns still sort sanely --

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Number::Int(a), Number::Int(b)) => a.cmp(b),
            _ => self.as_f64().total_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Float(v) => write!(f, "{v}"),
        }
    }
}

// ---------------------------------------------------------------------------
// RawListing – one row exactly as it appears in the source file
// ---------------------------------------------------------------------------

/// One row of the source table before cleaning. Nullable numeric columns
/// are read as `f64` because files with gaps store them as `2011.0`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawListing {
    pub price: i64,
    pub model_year: Option<f64>,
    pub model: Option<String>,
    pub condition: String,
    pub cylinders: Option<f64>,
    #[serde(default)]
    pub fuel: Option<String>,
    pub odometer: Option<f64>,
    #[serde(default)]
    pub transmission: Option<String>,
    #[serde(rename = "type")]
    pub vehicle_type: String,
    pub paint_color: Option<String>,
    pub is_4wd: Option<f64>,
    pub date_posted: String,
    pub days_listed: i64,
}

// ---------------------------------------------------------------------------
// Listing – one prepared row
// ---------------------------------------------------------------------------

/// A cleaned listing. Immutable once the preparer hands it out.
#[derive(Debug, Clone, PartialEq)]
pub struct Listing {
    pub price: i64,
    pub model_year: Number,
    pub make: String,
    pub model: String,
    pub condition: String,
    pub cylinders: Number,
    pub fuel: Option<String>,
    pub odometer: Number,
    pub transmission: Option<String>,
    pub vehicle_type: String,
    pub paint_color: String,
    pub is_4wd: Number,
    pub date_posted: NaiveDate,
    pub days_listed: i64,
}

impl Listing {
    pub fn has_known_year(&self) -> bool {
        !self.model_year.is_zero()
    }
}

// ---------------------------------------------------------------------------
// PreparedDataset – both views handed to the aggregation layer
// ---------------------------------------------------------------------------

/// The two read-only views every chart pulls from.
#[derive(Debug, Clone, Default)]
pub struct PreparedDataset {
    /// Every cleaned row, including those with an unknown model year.
    pub all_listings: Vec<Listing>,
    /// Rows whose `model_year` was present in the source.
    pub known_year_listings: Vec<Listing>,
}

impl PreparedDataset {
    /// Split cleaned rows into the full and known-year views.
    pub fn from_listings(all_listings: Vec<Listing>) -> Self {
        let known_year_listings = all_listings
            .iter()
            .filter(|l| l.has_known_year())
            .cloned()
            .collect();
        PreparedDataset {
            all_listings,
            known_year_listings,
        }
    }

    /// Number of listings in the full view.
    pub fn len(&self) -> usize {
        self.all_listings.len()
    }

    /// Whether the dataset has no rows at all.
    pub fn is_empty(&self) -> bool {
        self.all_listings.is_empty()
    }
}

// ---------------------------------------------------------------------------
// GroupKey – categorical columns charts can split or colour by
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Type,
    Make,
    Model,
}

impl GroupKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupKey::Type => "type",
            GroupKey::Make => "make",
            GroupKey::Model => "model",
        }
    }

    /// The listing's value for this column.
    pub fn value_of<'a>(&self, listing: &'a Listing) -> &'a str {
        match self {
            GroupKey::Type => &listing.vehicle_type,
            GroupKey::Make => &listing.make,
            GroupKey::Model => &listing.model,
        }
    }
}

impl FromStr for GroupKey {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "type" => Ok(GroupKey::Type),
            "make" => Ok(GroupKey::Make),
            "model" => Ok(GroupKey::Model),
            other => Err(DataError::UnknownGroupKey {
                key: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
