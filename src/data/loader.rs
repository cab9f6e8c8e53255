use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use crate::error::DataError;

use super::model::{REQUIRED_COLUMNS, RawListing};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load raw listings from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row plus one listing per line (the usual export)
/// * `.json`    – `[{ "price": 9400, "model": "bmw x5", ... }, ...]`
/// * `.parquet` – one column per field
///
/// Every format must carry [`REQUIRED_COLUMNS`]; the first one missing is
/// reported as [`DataError::MissingColumn`].
pub fn load_file(path: &Path) -> Result<Vec<RawListing>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let rows = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::info!("{}", DatasetSummary::from_rows(&rows));
    Ok(rows)
}

/// Fail with [`DataError::MissingColumn`] for the first required column
/// not present in `columns`.
pub fn check_required_columns<'a>(columns: impl IntoIterator<Item = &'a str>) -> Result<(), DataError> {
    let present: Vec<&str> = columns.into_iter().collect();
    match REQUIRED_COLUMNS.iter().find(|c| !present.contains(*c)) {
        Some(missing) => Err(DataError::MissingColumn {
            column: missing.to_string(),
        }),
        None => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with the column names, empty cells for missing
/// values.
fn load_csv(path: &Path) -> Result<Vec<RawListing>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();
    check_required_columns(headers.iter())?;

    reader
        .deserialize::<RawListing>()
        .enumerate()
        .map(|(row_no, result)| result.with_context(|| format!("CSV row {row_no}")))
        .collect()
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `to_json(orient='records')` layout.
/// `null` marks a missing value.
fn load_json(path: &Path) -> Result<Vec<RawListing>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut rows = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        check_required_columns(obj.keys().map(String::as_str))
            .with_context(|| format!("Row {i}"))?;

        let row: RawListing = serde_json::from_value(rec.clone())
            .with_context(|| format!("Row {i}: invalid listing"))?;
        rows.push(row);
    }

    Ok(rows)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per listing field.
///
/// Numeric columns may be any integer or float type, text columns any type
/// Arrow can cast to UTF-8 (so a `Date32` `date_posted` also works).
fn load_parquet(path: &Path) -> Result<Vec<RawListing>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    check_required_columns(
        builder
            .schema()
            .fields()
            .iter()
            .map(|f| f.name().as_str()),
    )?;
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        read_batch(&batch, &mut rows)?;
    }

    Ok(rows)
}

// -- Parquet / Arrow helpers --

/// Columns of one batch, cast to the two shapes the rows need.
struct BatchColumns<'a> {
    batch: &'a RecordBatch,
}

impl BatchColumns<'_> {
    fn numeric(&self, name: &str) -> Result<ArrayRef> {
        self.cast_column(name, &DataType::Float64)
    }

    fn text(&self, name: &str) -> Result<ArrayRef> {
        self.cast_column(name, &DataType::Utf8)
    }

    fn optional_text(&self, name: &str) -> Result<Option<ArrayRef>> {
        if self.batch.column_by_name(name).is_none() {
            return Ok(None);
        }
        self.text(name).map(Some)
    }

    fn cast_column(&self, name: &str, to: &DataType) -> Result<ArrayRef> {
        let col = self
            .batch
            .column_by_name(name)
            .with_context(|| format!("Parquet file missing '{name}' column"))?;
        cast(col, to).with_context(|| format!("column '{name}' cannot be read as {to:?}"))
    }
}

fn f64_at(col: &ArrayRef, row: usize) -> Option<f64> {
    if col.is_null(row) {
        return None;
    }
    Some(col.as_primitive::<Float64Type>().value(row))
}

fn str_at(col: &ArrayRef, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    Some(col.as_string::<i32>().value(row).to_string())
}

fn required_i64(col: &ArrayRef, row: usize, name: &str) -> Result<i64> {
    match f64_at(col, row) {
        Some(v) if v.fract() == 0.0 => Ok(v as i64),
        Some(v) => bail!("Row {row}: '{name}' value {v} is not a whole number"),
        None => bail!("Row {row}: '{name}' is null"),
    }
}

fn read_batch(batch: &RecordBatch, rows: &mut Vec<RawListing>) -> Result<()> {
    let cols = BatchColumns { batch };

    let price = cols.numeric("price")?;
    let model_year = cols.numeric("model_year")?;
    let model = cols.text("model")?;
    let condition = cols.text("condition")?;
    let cylinders = cols.numeric("cylinders")?;
    let fuel = cols.optional_text("fuel")?;
    let odometer = cols.numeric("odometer")?;
    let transmission = cols.optional_text("transmission")?;
    let vehicle_type = cols.text("type")?;
    let paint_color = cols.text("paint_color")?;
    let is_4wd = cols.numeric("is_4wd")?;
    let date_posted = cols.text("date_posted")?;
    let days_listed = cols.numeric("days_listed")?;

    let first_row = rows.len();
    for row in 0..batch.num_rows() {
        let abs_row = first_row + row;
        rows.push(RawListing {
            price: required_i64(&price, row, "price").with_context(|| format!("listing {abs_row}"))?,
            model_year: f64_at(&model_year, row),
            model: str_at(&model, row),
            condition: str_at(&condition, row).unwrap_or_default(),
            cylinders: f64_at(&cylinders, row),
            fuel: fuel.as_ref().and_then(|c| str_at(c, row)),
            odometer: f64_at(&odometer, row),
            transmission: transmission.as_ref().and_then(|c| str_at(c, row)),
            vehicle_type: str_at(&vehicle_type, row).unwrap_or_default(),
            paint_color: str_at(&paint_color, row),
            is_4wd: f64_at(&is_4wd, row),
            date_posted: str_at(&date_posted, row).unwrap_or_default(),
            days_listed: required_i64(&days_listed, row, "days_listed")
                .with_context(|| format!("listing {abs_row}"))?,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Summary of a freshly loaded table
// ---------------------------------------------------------------------------

/// Per-column non-null counts of the raw table, shown in the info panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DatasetSummary {
    pub rows: usize,
    /// `(column, non-null count, kind)` in source column order.
    pub columns: Vec<(&'static str, usize, &'static str)>,
}

impl DatasetSummary {
    pub fn from_rows(rows: &[RawListing]) -> Self {
        let n = rows.len();
        let count = |f: fn(&RawListing) -> bool| rows.iter().filter(|r| f(r)).count();
        DatasetSummary {
            rows: n,
            columns: vec![
                ("price", n, "int"),
                ("model_year", count(|r| r.model_year.is_some()), "float"),
                ("model", count(|r| r.model.is_some()), "text"),
                ("condition", n, "text"),
                ("cylinders", count(|r| r.cylinders.is_some()), "float"),
                ("fuel", count(|r| r.fuel.is_some()), "text"),
                ("odometer", count(|r| r.odometer.is_some()), "float"),
                ("transmission", count(|r| r.transmission.is_some()), "text"),
                ("type", n, "text"),
                ("paint_color", count(|r| r.paint_color.is_some()), "text"),
                ("is_4wd", count(|r| r.is_4wd.is_some()), "float"),
                ("date_posted", n, "text"),
                ("days_listed", n, "int"),
            ],
        }
    }
}

impl std::fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Loaded {} listings;", self.rows)?;
        for (name, non_null, _) in &self.columns {
            if *non_null < self.rows {
                write!(f, " {name}: {non_null} non-null;")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;

    use arrow::array::{Float64Array, Int64Array, StringArray};
    use parquet::arrow::ArrowWriter;
    use tempfile::TempDir;

    const HEADER: &str =
        "price,model_year,model,condition,cylinders,fuel,odometer,transmission,type,paint_color,is_4wd,date_posted,days_listed";

    fn write_file(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_blank_cells_become_none() {
        let dir = TempDir::new().unwrap();
        let contents = format!(
            "{HEADER}\n\
             9400,2011.0,bmw x5,good,6.0,gas,145000.0,automatic,SUV,,1.0,2018-06-23,19\n\
             15000,,ford f-150,good,,,,,truck,,,2019-05-01,20\n"
        );
        let path = write_file(&dir, "vehicles_us.csv", &contents);

        let rows = load_file(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].model_year, Some(2011.0));
        assert_eq!(rows[0].paint_color, None);
        assert_eq!(rows[0].vehicle_type, "SUV");
        assert_eq!(rows[1].model.as_deref(), Some("ford f-150"));
        assert_eq!(rows[1].model_year, None);
        assert_eq!(rows[1].odometer, None);
        assert_eq!(rows[1].is_4wd, None);
        assert_eq!(rows[1].days_listed, 20);
    }

    #[test]
    fn csv_without_optional_columns_loads() {
        let dir = TempDir::new().unwrap();
        let contents = "price,model_year,model,condition,cylinders,odometer,type,paint_color,is_4wd,date_posted,days_listed\n\
             5500,2013,hyundai sonata,like new,4,110000,sedan,red,,2019-02-07,79\n";
        let path = write_file(&dir, "listings.csv", contents);

        let rows = load_file(&path).unwrap();
        assert_eq!(rows[0].fuel, None);
        assert_eq!(rows[0].cylinders, Some(4.0));
    }

    #[test]
    fn csv_missing_required_column_is_reported() {
        let dir = TempDir::new().unwrap();
        let contents = "price,model_year,model,condition,cylinders,odometer,type,paint_color,is_4wd,days_listed\n\
             5500,2013,hyundai sonata,like new,4,110000,sedan,red,,79\n";
        let path = write_file(&dir, "listings.csv", contents);

        let err = load_file(&path).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DataError>(),
            Some(&DataError::MissingColumn {
                column: "date_posted".to_string()
            })
        );
    }

    #[test]
    fn json_records_load() {
        let dir = TempDir::new().unwrap();
        let contents = r#"[
            {"price": 9400, "model_year": 2011.0, "model": "bmw x5", "condition": "good",
             "cylinders": 6.0, "odometer": 145000.0, "type": "SUV", "paint_color": null,
             "is_4wd": 1.0, "date_posted": "2018-06-23", "days_listed": 19}
        ]"#;
        let path = write_file(&dir, "listings.json", contents);

        let rows = load_file(&path).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].paint_color, None);
        assert_eq!(rows[0].model.as_deref(), Some("bmw x5"));
    }

    #[test]
    fn json_missing_column_is_reported() {
        let dir = TempDir::new().unwrap();
        let contents = r#"[{"price": 9400, "model": "bmw x5"}]"#;
        let path = write_file(&dir, "listings.json", contents);

        let err = load_file(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DataError>(),
            Some(DataError::MissingColumn { .. })
        ));
    }

    /// Two listings, column by column; the second has no model year and
    /// the first no paint colour.
    fn parquet_columns(price: ArrayRef) -> Vec<(&'static str, ArrayRef)> {
        let text = |v: Vec<Option<&str>>| -> ArrayRef { Arc::new(StringArray::from(v)) };
        let float = |v: Vec<Option<f64>>| -> ArrayRef { Arc::new(Float64Array::from(v)) };
        vec![
            ("price", price),
            ("model_year", float(vec![Some(2011.0), None])),
            ("model", text(vec![Some("bmw x5"), Some("ford f-150")])),
            ("condition", text(vec![Some("good"), Some("excellent")])),
            ("cylinders", float(vec![Some(6.0), None])),
            ("odometer", float(vec![Some(145_000.0), None])),
            ("type", text(vec![Some("SUV"), Some("truck")])),
            ("paint_color", text(vec![None, Some("white")])),
            ("is_4wd", float(vec![Some(1.0), None])),
            ("date_posted", text(vec![Some("2018-06-23"), Some("2019-05-01")])),
            ("days_listed", Arc::new(Int64Array::from(vec![19, 20]))),
        ]
    }

    fn write_parquet(dir: &TempDir, name: &str, columns: Vec<(&str, ArrayRef)>) -> std::path::PathBuf {
        let batch = RecordBatch::try_from_iter(columns).unwrap();
        let path = dir.path().join(name);
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();
        path
    }

    #[test]
    fn parquet_nulls_become_none() {
        let dir = TempDir::new().unwrap();
        let price: ArrayRef = Arc::new(Int64Array::from(vec![9400, 15000]));
        let path = write_parquet(&dir, "vehicles_us.parquet", parquet_columns(price));

        let rows = load_file(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].price, 9400);
        assert_eq!(rows[0].model_year, Some(2011.0));
        assert_eq!(rows[0].paint_color, None);
        assert_eq!(rows[0].fuel, None);
        assert_eq!(rows[1].model_year, None);
        assert_eq!(rows[1].paint_color.as_deref(), Some("white"));
        assert_eq!(rows[1].vehicle_type, "truck");
        assert_eq!(rows[1].date_posted, "2019-05-01");
        assert_eq!(rows[1].days_listed, 20);
    }

    #[test]
    fn parquet_missing_required_column_is_reported() {
        let dir = TempDir::new().unwrap();
        let price: ArrayRef = Arc::new(Int64Array::from(vec![9400, 15000]));
        let columns = parquet_columns(price)
            .into_iter()
            .filter(|(name, _)| *name != "date_posted")
            .collect();
        let path = write_parquet(&dir, "listings.pq", columns);

        let err = load_file(&path).unwrap_err();
        assert_eq!(
            err.downcast_ref::<DataError>(),
            Some(&DataError::MissingColumn {
                column: "date_posted".to_string()
            })
        );
    }

    #[test]
    fn parquet_fractional_price_is_rejected() {
        let dir = TempDir::new().unwrap();
        let price: ArrayRef = Arc::new(Float64Array::from(vec![9400.5, 15000.0]));
        let path = write_parquet(&dir, "listings.parquet", parquet_columns(price));

        let err = load_file(&path).unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("not a whole number"), "{msg}");
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = load_file(Path::new("listings.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn summary_counts_non_null() {
        let rows = vec![
            crate::data::fixtures::raw("bmw x5", Some(2011.0), 9400, "SUV"),
            crate::data::fixtures::raw("ford f-150", None, 15000, "truck"),
        ];
        let summary = DatasetSummary::from_rows(&rows);
        assert_eq!(summary.rows, 2);
        assert!(summary.columns.contains(&("model_year", 1, "float")));
        assert!(summary.to_string().contains("model_year: 1 non-null"));
    }
}
