use chrono::NaiveDate;

use crate::error::{DataError, Result};

use super::model::{Listing, Number, PreparedDataset, RawListing};

/// The only accepted layout of `date_posted`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Fill value for a missing `paint_color`.
pub const UNKNOWN_PAINT_COLOR: &str = "unknown";

// ---------------------------------------------------------------------------
// Options and report
// ---------------------------------------------------------------------------

/// What to do with a row whose model field is empty or missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BlankModelPolicy {
    /// Abort preparation with [`DataError::MalformedModel`].
    #[default]
    Reject,
    /// Leave the row out of both views and count it in the report.
    Drop,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PrepareOptions {
    pub blank_model: BlankModelPolicy,
}

/// Bookkeeping from one preparation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreparationReport {
    pub rows_in: usize,
    pub rows_dropped: usize,
    /// Null-filled columns that were downcast to integers.
    pub integer_columns: Vec<&'static str>,
    /// Null-filled columns left as floats because some value had a fraction.
    pub float_columns: Vec<&'static str>,
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Clean raw rows and split them into the full and known-year views.
pub fn prepare(raw: &[RawListing], options: &PrepareOptions) -> Result<PreparedDataset> {
    prepare_with_report(raw, options).map(|(dataset, _)| dataset)
}

/// Same as [`prepare`] but also returns what the run did.
pub fn prepare_with_report(
    raw: &[RawListing],
    options: &PrepareOptions,
) -> Result<(PreparedDataset, PreparationReport)> {
    let mut report = PreparationReport {
        rows_in: raw.len(),
        ..Default::default()
    };

    // 1. Dates: one malformed value aborts the whole run.
    let dates = raw
        .iter()
        .enumerate()
        .map(|(row, r)| parse_date(row, &r.date_posted))
        .collect::<Result<Vec<NaiveDate>>>()?;

    // 2. Null-fill numeric columns, then downcast each one independently.
    let model_year = numeric_column("model_year", raw, |r| r.model_year, &mut report);
    let odometer = numeric_column("odometer", raw, |r| r.odometer, &mut report);
    let is_4wd = numeric_column("is_4wd", raw, |r| r.is_4wd, &mut report);
    let cylinders = numeric_column("cylinders", raw, |r| r.cylinders, &mut report);

    let mut listings = Vec::with_capacity(raw.len());
    for (row, r) in raw.iter().enumerate() {
        // 4. make / model split.
        let Some((make, model)) = r.model.as_deref().and_then(split_model) else {
            match options.blank_model {
                BlankModelPolicy::Reject => return Err(DataError::MalformedModel { row }),
                BlankModelPolicy::Drop => {
                    report.rows_dropped += 1;
                    continue;
                }
            }
        };

        listings.push(Listing {
            price: r.price,
            model_year: model_year[row],
            make,
            model,
            condition: r.condition.clone(),
            cylinders: cylinders[row],
            fuel: r.fuel.clone(),
            odometer: odometer[row],
            transmission: r.transmission.clone(),
            vehicle_type: r.vehicle_type.clone(),
            // 3. paint colour fill.
            paint_color: r
                .paint_color
                .clone()
                .unwrap_or_else(|| UNKNOWN_PAINT_COLOR.to_string()),
            is_4wd: is_4wd[row],
            date_posted: dates[row],
            days_listed: r.days_listed,
        });
    }

    // 5. Partition.
    let dataset = PreparedDataset::from_listings(listings);
    log::debug!(
        "Prepared {} of {} rows ({} with known year); integer columns {:?}, float columns {:?}",
        dataset.len(),
        report.rows_in,
        dataset.known_year_listings.len(),
        report.integer_columns,
        report.float_columns
    );
    Ok((dataset, report))
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

fn parse_date(row: usize, value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| DataError::MalformedDate {
        row,
        value: value.to_string(),
    })
}

/// True when every value can be stored as an `i64` without changing it.
/// An empty column passes.
pub fn is_lossless_integer_column(values: &[f64]) -> bool {
    // i64::MAX is not exactly representable; 2^63 is the first value past it.
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    values
        .iter()
        .all(|v| v.is_finite() && v.fract() == 0.0 && *v >= i64::MIN as f64 && *v < UPPER)
}

/// Fill `None` with 0 and convert the column as a whole.
fn numeric_column(
    name: &'static str,
    raw: &[RawListing],
    get: impl Fn(&RawListing) -> Option<f64>,
    report: &mut PreparationReport,
) -> Vec<Number> {
    let filled: Vec<f64> = raw.iter().map(|r| get(r).unwrap_or(0.0)).collect();
    if is_lossless_integer_column(&filled) {
        report.integer_columns.push(name);
        filled.into_iter().map(|v| Number::Int(v as i64)).collect()
    } else {
        report.float_columns.push(name);
        filled.into_iter().map(Number::Float).collect()
    }
}

/// Split a raw model string into `(make, model)` at the first space.
///
/// Returns `None` when there is no token to use as the make. A string with
/// no space becomes the make with an empty model.
pub fn split_model(raw: &str) -> Option<(String, String)> {
    let trimmed = raw.trim_start();
    if trimmed.trim_end().is_empty() {
        return None;
    }
    match trimmed.split_once(' ') {
        Some((make, model)) => Some((make.to_string(), model.to_string())),
        None => Some((trimmed.trim_end().to_string(), String::new())),
    }
}
