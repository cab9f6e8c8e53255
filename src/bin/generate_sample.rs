//! Writes a synthetic `vehicles_us.csv` (and the same rows as
//! `vehicles_us.parquet`) shaped like a used-car listings export, including
//! the gaps the dashboard has to clean up.

use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{Duration, NaiveDate};
use parquet::arrow::ArrowWriter;
use serde::Serialize;

const ROWS: usize = 5_000;

/// (raw model string, vehicle type, base price of a new one)
const MODELS: [(&str, &str, f64); 16] = [
    ("ford f-150", "truck", 32_000.0),
    ("ford mustang", "coupe", 24_000.0),
    ("chevrolet silverado 1500", "pickup", 31_000.0),
    ("ram 1500", "pickup", 33_000.0),
    ("gmc sierra 2500hd", "truck", 40_000.0),
    ("toyota camry", "sedan", 18_000.0),
    ("honda civic", "sedan", 16_000.0),
    ("nissan altima", "sedan", 15_000.0),
    ("hyundai sonata", "sedan", 14_000.0),
    ("jeep wrangler", "SUV", 27_000.0),
    ("bmw x5", "SUV", 38_000.0),
    ("cadillac escalade", "SUV", 52_000.0),
    ("mercedes-benz benz", "sedan", 36_000.0),
    ("subaru outback", "wagon", 20_000.0),
    ("dodge grand caravan", "van", 17_000.0),
    ("toyota tacoma", "offroad", 26_000.0),
];

const CONDITIONS: [(&str, f64); 6] = [
    ("excellent", 0.48),
    ("good", 0.39),
    ("like new", 0.09),
    ("fair", 0.03),
    ("new", 0.005),
    ("salvage", 0.005),
];

const COLORS: [&str; 8] = [
    "white", "black", "silver", "grey", "blue", "red", "green", "custom",
];

#[derive(Debug, Serialize)]
struct SampleRow {
    price: i64,
    model_year: Option<f64>,
    model: String,
    condition: String,
    cylinders: Option<f64>,
    fuel: String,
    odometer: Option<f64>,
    transmission: String,
    #[serde(rename = "type")]
    vehicle_type: String,
    paint_color: Option<String>,
    is_4wd: Option<f64>,
    date_posted: String,
    days_listed: i64,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Exponential draw with the given mean.
    fn exp(&mut self, mean: f64) -> f64 {
        -(self.next_f64().max(1e-15)).ln() * mean
    }
}

fn pick_condition(rng: &mut SimpleRng) -> &'static str {
    let mut u = rng.next_f64();
    for (name, weight) in CONDITIONS {
        if u < weight {
            return name;
        }
        u -= weight;
    }
    "good"
}

fn generate_row(rng: &mut SimpleRng, first_day: NaiveDate) -> SampleRow {
    let (model, vehicle_type, base) = MODELS[rng.below(MODELS.len())];
    let year = 1995 + rng.below(25) as i64;
    let age = (2019 - year) as f64;
    let condition = pick_condition(rng);

    let depreciation = (1.0 - 0.07 * age).max(0.08);
    let noise = 0.8 + 0.4 * rng.next_f64();
    let price = (base * depreciation * noise).round().max(500.0) as i64;

    let truck_like = matches!(vehicle_type, "truck" | "pickup" | "offroad" | "SUV");
    let cylinders = if truck_like { 8.0 } else { [4.0, 6.0][rng.below(2)] };
    let odometer = (age * 12_000.0 * (0.6 + 0.8 * rng.next_f64())).round();

    SampleRow {
        price,
        model_year: (!rng.chance(0.07)).then_some(year as f64),
        model: model.to_string(),
        condition: condition.to_string(),
        cylinders: (!rng.chance(0.10)).then_some(cylinders),
        fuel: if truck_like && rng.chance(0.2) { "diesel" } else { "gas" }.to_string(),
        odometer: (!rng.chance(0.15)).then_some(odometer),
        transmission: if rng.chance(0.9) { "automatic" } else { "manual" }.to_string(),
        vehicle_type: vehicle_type.to_string(),
        paint_color: (!rng.chance(0.18)).then(|| COLORS[rng.below(COLORS.len())].to_string()),
        // Source exports only fill this flag for 4wd vehicles.
        is_4wd: (truck_like && rng.chance(0.7)).then_some(1.0),
        date_posted: (first_day + Duration::days(rng.below(365) as i64))
            .format("%Y-%m-%d")
            .to_string(),
        days_listed: rng.exp(30.0).round() as i64,
    }
}

fn write_csv(rows: &[SampleRow], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    for row in rows {
        writer.serialize(row).context("writing CSV row")?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

fn write_parquet(rows: &[SampleRow], path: &str) -> Result<()> {
    let text = |f: fn(&SampleRow) -> Option<&str>| -> ArrayRef {
        Arc::new(StringArray::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let float = |f: fn(&SampleRow) -> Option<f64>| -> ArrayRef {
        Arc::new(Float64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };
    let int = |f: fn(&SampleRow) -> i64| -> ArrayRef {
        Arc::new(Int64Array::from(rows.iter().map(f).collect::<Vec<_>>()))
    };

    let schema = Arc::new(Schema::new(vec![
        Field::new("price", DataType::Int64, false),
        Field::new("model_year", DataType::Float64, true),
        Field::new("model", DataType::Utf8, true),
        Field::new("condition", DataType::Utf8, false),
        Field::new("cylinders", DataType::Float64, true),
        Field::new("fuel", DataType::Utf8, true),
        Field::new("odometer", DataType::Float64, true),
        Field::new("transmission", DataType::Utf8, true),
        Field::new("type", DataType::Utf8, false),
        Field::new("paint_color", DataType::Utf8, true),
        Field::new("is_4wd", DataType::Float64, true),
        Field::new("date_posted", DataType::Utf8, false),
        Field::new("days_listed", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            int(|r| r.price),
            float(|r| r.model_year),
            text(|r| Some(r.model.as_str())),
            text(|r| Some(r.condition.as_str())),
            float(|r| r.cylinders),
            text(|r| Some(r.fuel.as_str())),
            float(|r| r.odometer),
            text(|r| Some(r.transmission.as_str())),
            text(|r| Some(r.vehicle_type.as_str())),
            text(|r| r.paint_color.as_deref()),
            float(|r| r.is_4wd),
            text(|r| Some(r.date_posted.as_str())),
            int(|r| r.days_listed),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing parquet batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let first_day = NaiveDate::from_ymd_opt(2018, 5, 1).context("invalid start date")?;

    let rows: Vec<SampleRow> = (0..ROWS).map(|_| generate_row(&mut rng, first_day)).collect();

    write_csv(&rows, "vehicles_us.csv")?;
    write_parquet(&rows, "vehicles_us.parquet")?;

    let known_year = rows.iter().filter(|r| r.model_year.is_some()).count();
    println!(
        "Wrote {} listings ({known_year} with a model year) to vehicles_us.csv and vehicles_us.parquet",
        rows.len()
    );
    Ok(())
}
