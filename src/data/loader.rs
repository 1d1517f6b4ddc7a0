use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use thiserror::Error;

use super::forest::ForestModel;
use super::table::{CellValue, DATE_COL, FeatureTable, SchemaCaps, TARGET_COL, Table};

// ---------------------------------------------------------------------------
// Configuration and manifest
// ---------------------------------------------------------------------------

/// Where the bundle lives on disk. Resolved once at startup.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub base_dir: PathBuf,
}

impl DataConfig {
    /// `SALESCOPE_DATA_DIR` environment override, `data/` by default.
    pub fn from_env() -> Self {
        let base = std::env::var("SALESCOPE_DATA_DIR").unwrap_or_else(|_| "data".to_string());
        DataConfig {
            base_dir: PathBuf::from(base),
        }
    }

    pub fn with_dir(base_dir: impl Into<PathBuf>) -> Self {
        DataConfig {
            base_dir: base_dir.into(),
        }
    }
}

/// One entry of the fixed resource manifest: logical name → file name.
#[derive(Debug, Clone, Copy)]
struct Resource {
    name: &'static str,
    file: &'static str,
}

const VALIDATION: Resource = Resource {
    name: "validation",
    file: "validation.csv",
};
const VALIDATION_FEATURES: Resource = Resource {
    name: "validation_features",
    file: "validation_features.csv",
};
const VALIDATION_TARGET: Resource = Resource {
    name: "validation_target",
    file: "validation_target.csv",
};
const TRAIN_FEATURES: Resource = Resource {
    name: "train_features",
    file: "train_features.csv",
};
const TRAIN_TARGET: Resource = Resource {
    name: "train_target",
    file: "train_target.csv",
};
const TEST_FEATURES: Resource = Resource {
    name: "test_features",
    file: "test_features.csv",
};
const MODEL: Resource = Resource {
    name: "model",
    file: "model.json",
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Anything that can go wrong while assembling the bundle. A load either
/// returns a complete [`SalesBundle`] or one of these; partial bundles are
/// never handed to the UI.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("missing resource '{name}': expected file {path}")]
    MissingResource { name: &'static str, path: PathBuf },

    #[error("resource '{name}' ({path}): {source}")]
    Parse {
        name: &'static str,
        path: PathBuf,
        source: anyhow::Error,
    },

    #[error("resource '{name}' has no '{column}' column")]
    MissingColumn {
        name: &'static str,
        column: &'static str,
    },

    #[error(
        "validation split is misaligned: validation={validation} rows, \
         features={features} rows, target={target} rows"
    )]
    RowCountMismatch {
        validation: usize,
        features: usize,
        target: usize,
    },

    #[error("feature columns of '{left}' and '{right}' differ")]
    SchemaMismatch {
        left: &'static str,
        right: &'static str,
    },

    #[error("model feature names do not match the '{resource}' columns")]
    FeatureNamesMismatch { resource: &'static str },
}

// ---------------------------------------------------------------------------
// SalesBundle – everything the pipeline consumes, loaded once
// ---------------------------------------------------------------------------

/// The loaded dataset plus the model. Built once at startup, held
/// immutably in app state for the lifetime of the process; the only
/// invalidation is an explicit reload (or a restart).
#[derive(Debug, Clone)]
pub struct SalesBundle {
    /// Context table: Store / Dept / Date / Weekly_Sales, schema permitting.
    pub validation: Table,
    /// Model inputs aligned row-by-row with `validation`.
    pub features: FeatureTable,
    /// Observed outcomes aligned row-by-row with `validation`.
    pub target: Vec<f64>,
    pub train_features: FeatureTable,
    pub train_target: Vec<f64>,
    pub test_features: FeatureTable,
    /// Capability flags of the validation table, computed here once.
    pub caps: SchemaCaps,
    pub model: ForestModel,
}

/// Load the full manifest from `cfg.base_dir`.
///
/// Row alignment between `validation`, `validation_features`, and
/// `validation_target` is positional; it is verified here so the pipeline
/// can index all three with one set of row indices. The three feature
/// splits must agree on their column set — a split with a divergent schema
/// is a data-preparation bug and fails the load.
pub fn load_bundle(cfg: &DataConfig) -> std::result::Result<SalesBundle, LoadError> {
    let validation = load_table_resource(cfg, VALIDATION)?;
    let features = load_feature_resource(cfg, VALIDATION_FEATURES)?;
    let target = load_target_resource(cfg, VALIDATION_TARGET)?;
    let train_features = load_feature_resource(cfg, TRAIN_FEATURES)?;
    let train_target = load_target_resource(cfg, TRAIN_TARGET)?;
    let test_features = load_feature_resource(cfg, TEST_FEATURES)?;
    let model = load_model_resource(cfg, MODEL)?;

    if validation.len() != features.len() || validation.len() != target.len() {
        return Err(LoadError::RowCountMismatch {
            validation: validation.len(),
            features: features.len(),
            target: target.len(),
        });
    }

    check_same_columns(&features, VALIDATION_FEATURES, &train_features, TRAIN_FEATURES)?;
    check_same_columns(&features, VALIDATION_FEATURES, &test_features, TEST_FEATURES)?;

    if model.feature_names != features.names {
        log::error!(
            "model expects features {:?}, table provides {:?}",
            model.feature_names,
            features.names
        );
        return Err(LoadError::FeatureNamesMismatch {
            resource: VALIDATION_FEATURES.name,
        });
    }

    let caps = SchemaCaps::of(&validation);
    log::info!(
        "bundle ready: {} validation rows, {} features, {} trees (store={}, dept={}, date={})",
        validation.len(),
        features.names.len(),
        model.trees.len(),
        caps.has_store,
        caps.has_dept,
        caps.has_date,
    );

    Ok(SalesBundle {
        validation,
        features,
        target,
        train_features,
        train_target,
        test_features,
        caps,
        model,
    })
}

fn check_same_columns(
    a: &FeatureTable,
    ra: Resource,
    b: &FeatureTable,
    rb: Resource,
) -> std::result::Result<(), LoadError> {
    if a.names != b.names {
        return Err(LoadError::SchemaMismatch {
            left: ra.name,
            right: rb.name,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Per-resource loading
// ---------------------------------------------------------------------------

fn require(cfg: &DataConfig, resource: Resource) -> std::result::Result<PathBuf, LoadError> {
    let path = cfg.base_dir.join(resource.file);
    if !path.is_file() {
        log::error!("missing resource '{}' at {}", resource.name, path.display());
        return Err(LoadError::MissingResource {
            name: resource.name,
            path,
        });
    }
    Ok(path)
}

fn parse_error(resource: Resource, path: PathBuf, source: anyhow::Error) -> LoadError {
    log::error!("failed to parse '{}': {source:#}", resource.name);
    LoadError::Parse {
        name: resource.name,
        path,
        source,
    }
}

fn load_table_resource(
    cfg: &DataConfig,
    resource: Resource,
) -> std::result::Result<Table, LoadError> {
    let path = require(cfg, resource)?;
    let table = load_table(&path).map_err(|e| parse_error(resource, path.clone(), e))?;
    log::info!(
        "loaded '{}': {} rows, {} columns",
        resource.name,
        table.len(),
        table.headers.len()
    );
    Ok(table)
}

fn load_feature_resource(
    cfg: &DataConfig,
    resource: Resource,
) -> std::result::Result<FeatureTable, LoadError> {
    let path = require(cfg, resource)?;
    let table = load_table(&path).map_err(|e| parse_error(resource, path.clone(), e))?;
    let features =
        to_feature_table(&table).map_err(|e| parse_error(resource, path.clone(), e))?;
    log::info!(
        "loaded '{}': {} rows, {} features",
        resource.name,
        features.len(),
        features.names.len()
    );
    Ok(features)
}

fn load_target_resource(
    cfg: &DataConfig,
    resource: Resource,
) -> std::result::Result<Vec<f64>, LoadError> {
    let path = require(cfg, resource)?;
    let table = load_table(&path).map_err(|e| parse_error(resource, path.clone(), e))?;
    let Some(col) = table.column_index(TARGET_COL) else {
        return Err(LoadError::MissingColumn {
            name: resource.name,
            column: TARGET_COL,
        });
    };
    let values = table
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            row.get(col)
                .and_then(CellValue::as_f64)
                .with_context(|| format!("row {i}: '{TARGET_COL}' is not numeric"))
        })
        .collect::<Result<Vec<f64>>>()
        .map_err(|e| parse_error(resource, path.clone(), e))?;
    log::info!("loaded '{}': {} observations", resource.name, values.len());
    Ok(values)
}

fn load_model_resource(
    cfg: &DataConfig,
    resource: Resource,
) -> std::result::Result<ForestModel, LoadError> {
    let path = require(cfg, resource)?;
    let model =
        ForestModel::from_path(&path).map_err(|e| parse_error(resource, path.clone(), e))?;
    log::info!(
        "loaded '{}': {} trees over {} features",
        resource.name,
        model.trees.len(),
        model.feature_names.len()
    );
    Ok(model)
}

// ---------------------------------------------------------------------------
// Format dispatch
// ---------------------------------------------------------------------------

/// Parse one tabular file. Dispatch by extension: CSV is the canonical
/// format; Parquet is accepted for tables exported straight from a
/// dataframe pipeline.
pub fn load_table(path: &Path) -> Result<Table> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

/// Narrow a mixed table to the all-numeric matrix the model consumes.
fn to_feature_table(table: &Table) -> Result<FeatureTable> {
    let mut rows = Vec::with_capacity(table.len());
    for (i, row) in table.rows.iter().enumerate() {
        let numeric: Vec<f64> = row
            .iter()
            .enumerate()
            .map(|(j, cell)| {
                cell.as_f64().with_context(|| {
                    format!("row {i}, column '{}': '{cell}' is not numeric", table.headers[j])
                })
            })
            .collect::<Result<_>>()?;
        rows.push(numeric);
    }
    Ok(FeatureTable {
        names: table.headers.clone(),
        rows,
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one scalar per cell.
/// Cell types are guessed per value; the `Date` column is kept as text so
/// lexical order stays chronological.
fn load_csv(path: &Path) -> Result<Table> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.len() != headers.len() {
            bail!(
                "CSV row {row_no}: {} cells for {} columns",
                record.len(),
                headers.len()
            );
        }
        let row: Vec<CellValue> = record
            .iter()
            .enumerate()
            .map(|(col, value)| parse_cell(&headers[col], value))
            .collect();
        rows.push(row);
    }

    Ok(Table::new(headers, rows))
}

fn parse_cell(column: &str, s: &str) -> CellValue {
    if s.is_empty() {
        return CellValue::Null;
    }
    if column == DATE_COL {
        return CellValue::Date(s.to_string());
    }
    if let Ok(i) = s.parse::<i64>() {
        return CellValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return CellValue::Float(f);
    }
    if s == "true" || s == "false" {
        return CellValue::Bool(s == "true");
    }
    CellValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with flat scalar columns (strings, ints, floats,
/// bools). Works with files written by both **Pandas** (`df.to_parquet()`)
/// and **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<Table> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<CellValue>> = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        if headers.is_empty() {
            headers = schema.fields().iter().map(|f| f.name().clone()).collect();
        }

        for row in 0..batch.num_rows() {
            let cells: Vec<CellValue> = (0..batch.num_columns())
                .map(|col| {
                    let name = &headers[col];
                    let value = extract_cell(batch.column(col), row);
                    // Date columns arrive as plain strings; re-tag them.
                    match (name.as_str(), value) {
                        (DATE_COL, CellValue::String(s)) => CellValue::Date(s),
                        (_, v) => v,
                    }
                })
                .collect();
            rows.push(cells);
        }
    }

    Ok(Table::new(headers, rows))
}

/// Extract a single scalar from an Arrow column at a given row.
fn extract_cell(col: &Arc<dyn Array>, row: usize) -> CellValue {
    if col.is_null(row) {
        return CellValue::Null;
    }
    match col.data_type() {
        DataType::Utf8 | DataType::LargeUtf8 => {
            if let Some(s) = col.as_any().downcast_ref::<StringArray>() {
                CellValue::String(s.value(row).to_string())
            } else {
                // LargeStringArray
                let s = col.as_string::<i64>();
                CellValue::String(s.value(row).to_string())
            }
        }
        DataType::Int32 => {
            let arr = col.as_any().downcast_ref::<Int32Array>();
            arr.map(|a| CellValue::Integer(a.value(row) as i64))
                .unwrap_or(CellValue::Null)
        }
        DataType::Int64 => {
            let arr = col.as_any().downcast_ref::<Int64Array>();
            arr.map(|a| CellValue::Integer(a.value(row)))
                .unwrap_or(CellValue::Null)
        }
        DataType::Float32 => {
            let arr = col.as_any().downcast_ref::<Float32Array>();
            arr.map(|a| CellValue::Float(a.value(row) as f64))
                .unwrap_or(CellValue::Null)
        }
        DataType::Float64 => {
            let arr = col.as_any().downcast_ref::<Float64Array>();
            arr.map(|a| CellValue::Float(a.value(row)))
                .unwrap_or(CellValue::Null)
        }
        DataType::Boolean => {
            let arr = col.as_any().downcast_ref::<BooleanArray>();
            arr.map(|a| CellValue::Bool(a.value(row)))
                .unwrap_or(CellValue::Null)
        }
        other => CellValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::forest::{Node, Tree};

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("salescope-loader-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write(dir: &Path, file: &str, content: &str) {
        std::fs::write(dir.join(file), content).unwrap();
    }

    fn write_model(dir: &Path, feature_names: &[&str]) {
        let model = ForestModel {
            feature_names: feature_names.iter().map(|s| s.to_string()).collect(),
            importances: vec![1.0 / feature_names.len() as f64; feature_names.len()],
            trees: vec![Tree {
                nodes: vec![Node::Leaf { value: 100.0 }],
            }],
        };
        std::fs::write(dir.join("model.json"), serde_json::to_string(&model).unwrap()).unwrap();
    }

    fn write_complete_bundle(dir: &Path) {
        write(
            dir,
            "validation.csv",
            "Store,Dept,Date,Weekly_Sales\n1,1,2011-01-07,100.0\n1,2,2011-01-14,110.0\n2,1,2011-01-07,90.0\n",
        );
        write(dir, "validation_features.csv", "Store,Temperature\n1,40.0\n1,38.5\n2,55.0\n");
        write(dir, "validation_target.csv", "Weekly_Sales\n100.0\n110.0\n90.0\n");
        write(dir, "train_features.csv", "Store,Temperature\n1,41.0\n2,50.0\n");
        write(dir, "train_target.csv", "Weekly_Sales\n105.0\n95.0\n");
        write(dir, "test_features.csv", "Store,Temperature\n1,39.0\n");
        write_model(dir, &["Store", "Temperature"]);
    }

    #[test]
    fn complete_bundle_loads_with_caps() {
        let dir = scratch_dir("complete");
        write_complete_bundle(&dir);

        let bundle = load_bundle(&DataConfig::with_dir(&dir)).unwrap();
        assert_eq!(bundle.validation.len(), 3);
        assert_eq!(bundle.features.len(), 3);
        assert_eq!(bundle.target, vec![100.0, 110.0, 90.0]);
        assert!(bundle.caps.has_store && bundle.caps.has_dept && bundle.caps.has_date);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_file_names_the_resource() {
        let dir = scratch_dir("missing");
        write_complete_bundle(&dir);
        std::fs::remove_file(dir.join("validation_target.csv")).unwrap();

        match load_bundle(&DataConfig::with_dir(&dir)) {
            Err(LoadError::MissingResource { name, .. }) => {
                assert_eq!(name, "validation_target");
            }
            other => panic!("expected MissingResource, got {other:?}"),
        }

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn misaligned_split_is_rejected() {
        let dir = scratch_dir("misaligned");
        write_complete_bundle(&dir);
        write(dir.as_path(), "validation_target.csv", "Weekly_Sales\n100.0\n110.0\n");

        assert!(matches!(
            load_bundle(&DataConfig::with_dir(&dir)),
            Err(LoadError::RowCountMismatch { .. })
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn divergent_split_schema_is_rejected() {
        let dir = scratch_dir("schema");
        write_complete_bundle(&dir);
        write(dir.as_path(), "train_features.csv", "Store,Fuel_Price\n1,3.5\n");

        assert!(matches!(
            load_bundle(&DataConfig::with_dir(&dir)),
            Err(LoadError::SchemaMismatch { .. })
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn target_without_sales_column_is_rejected() {
        let dir = scratch_dir("target-col");
        write_complete_bundle(&dir);
        write(dir.as_path(), "validation_target.csv", "Sales\n100.0\n110.0\n90.0\n");

        assert!(matches!(
            load_bundle(&DataConfig::with_dir(&dir)),
            Err(LoadError::MissingColumn { column: "Weekly_Sales", .. })
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn model_feature_names_must_match_table() {
        let dir = scratch_dir("model-names");
        write_complete_bundle(&dir);
        write_model(&dir, &["Temperature", "Store"]);

        assert!(matches!(
            load_bundle(&DataConfig::with_dir(&dir)),
            Err(LoadError::FeatureNamesMismatch { .. })
        ));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn csv_cells_are_typed_by_value() {
        let dir = scratch_dir("typing");
        write(
            dir.as_path(),
            "validation.csv",
            "Store,Date,IsHoliday,Note\n7,2011-02-11,true,promo\n",
        );
        let table = load_table(&dir.join("validation.csv")).unwrap();
        assert_eq!(table.value(0, "Store"), Some(&CellValue::Integer(7)));
        assert_eq!(
            table.value(0, "Date"),
            Some(&CellValue::Date("2011-02-11".into()))
        );
        assert_eq!(table.value(0, "IsHoliday"), Some(&CellValue::Bool(true)));
        assert_eq!(
            table.value(0, "Note"),
            Some(&CellValue::String("promo".into()))
        );

        let _ = std::fs::remove_dir_all(&dir);
    }
}
