/// Data layer: core types, loading, filtering, and the model artifact.
///
/// Architecture:
/// ```text
///  data/*.csv (+ .parquet)        model.json
///        │                            │
///        ▼                            ▼
///   ┌──────────┐                 ┌──────────┐
///   │  loader   │  manifest ───▶ │  forest   │  deserialize + validate
///   └──────────┘                 └──────────┘
///        │
///        ▼
///   ┌──────────────┐
///   │  SalesBundle  │  Table + FeatureTable + target + SchemaCaps + model
///   └──────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  store/dept selection → filtered row indices
///   └──────────┘
/// ```

pub mod filter;
pub mod forest;
pub mod loader;
pub mod table;
