/// Data layer: core types, loading, preparation, filtering and aggregation.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  check columns, decode rows → Vec<RawListing>
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ prepare   │  dates, null-fill, int downcast, make/model split
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ PreparedDataset │  all_listings + known_year_listings
///   └────────────────┘
///        │
///        ▼
///   ┌───────────────────┐
///   │ filter / aggregate │  type pickers → medians, histogram bins
///   └───────────────────┘
/// ```

pub mod aggregate;
pub mod filter;
pub mod loader;
pub mod model;
pub mod prepare;
