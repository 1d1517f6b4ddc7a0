use std::collections::BTreeSet;
use std::fmt;

/// Column names with fixed meaning in the loaded tables.
pub const STORE_COL: &str = "Store";
pub const DEPT_COL: &str = "Dept";
pub const DATE_COL: &str = "Date";
pub const TARGET_COL: &str = "Weekly_Sales";

// ---------------------------------------------------------------------------
// CellValue – a single cell in a loaded table
// ---------------------------------------------------------------------------

/// A dynamically-typed cell value mirroring the CSV dtypes we care about.
/// Using `BTreeSet` for distinct-value lists downstream so `CellValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date kept as text; lexical order equals chronological order.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so we can put CellValue in BTreeSet --

impl Eq for CellValue {}

impl PartialOrd for CellValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CellValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use CellValue::*;
        fn discriminant(v: &CellValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for CellValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            CellValue::String(s) | CellValue::Date(s) => s.hash(state),
            CellValue::Integer(i) => i.hash(state),
            CellValue::Float(f) => f.to_bits().hash(state),
            CellValue::Bool(b) => b.hash(state),
            CellValue::Null => {}
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v:.4}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

impl CellValue {
    /// Try to interpret the value as an `f64` for numeric columns.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Table – a loaded tabular resource with header row
// ---------------------------------------------------------------------------

/// A parsed tabular resource: ordered headers plus row-major cells.
/// Every row has exactly `headers.len()` cells.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        Table { headers, rows }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column by name, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Cell at (row, column-name). `None` when either is out of range.
    pub fn value(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row)?.get(col)
    }

    /// Sorted set of distinct values in a column. Empty when the column
    /// does not exist.
    pub fn distinct(&self, column: &str) -> BTreeSet<CellValue> {
        let Some(col) = self.column_index(column) else {
            return BTreeSet::new();
        };
        self.rows
            .iter()
            .filter_map(|r| r.get(col))
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// FeatureTable – an all-numeric table fed to the model
// ---------------------------------------------------------------------------

/// Model inputs: one f64 per cell, column order fixed by `names`.
#[derive(Debug, Clone)]
pub struct FeatureTable {
    pub names: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl FeatureTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Gather the rows at the given indices, in the given order.
    /// Out-of-range indices are skipped (callers pass indices produced
    /// against a table of the same length).
    pub fn rows_at(&self, indices: &[usize]) -> Vec<Vec<f64>> {
        indices
            .iter()
            .filter_map(|&i| self.rows.get(i))
            .cloned()
            .collect()
    }
}

// ---------------------------------------------------------------------------
// SchemaCaps – what the validation table can drive
// ---------------------------------------------------------------------------

/// Capability flags computed once at load time. The selection UI and the
/// filter consume these instead of probing column names at every branch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchemaCaps {
    pub has_store: bool,
    pub has_dept: bool,
    pub has_date: bool,
}

impl SchemaCaps {
    pub fn of(table: &Table) -> Self {
        SchemaCaps {
            has_store: table.column_index(STORE_COL).is_some(),
            has_dept: table.column_index(DEPT_COL).is_some(),
            has_date: table.column_index(DATE_COL).is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn int(v: i64) -> CellValue {
        CellValue::Integer(v)
    }

    fn sample_table() -> Table {
        Table::new(
            vec!["Store".into(), "Dept".into(), "Date".into()],
            vec![
                vec![int(1), int(1), CellValue::Date("2011-01-07".into())],
                vec![int(1), int(2), CellValue::Date("2011-01-14".into())],
                vec![int(2), int(1), CellValue::Date("2011-01-07".into())],
            ],
        )
    }

    #[test]
    fn distinct_values_are_sorted_and_deduplicated() {
        let table = sample_table();
        let stores: Vec<CellValue> = table.distinct(STORE_COL).into_iter().collect();
        assert_eq!(stores, vec![int(1), int(2)]);

        let dates = table.distinct(DATE_COL);
        assert_eq!(dates.len(), 2);
    }

    #[test]
    fn distinct_on_missing_column_is_empty() {
        assert!(sample_table().distinct("Markdown1").is_empty());
    }

    #[test]
    fn caps_reflect_present_columns() {
        let caps = SchemaCaps::of(&sample_table());
        assert!(caps.has_store && caps.has_dept && caps.has_date);

        let bare = Table::new(vec!["Temperature".into()], vec![vec![CellValue::Float(20.5)]]);
        assert_eq!(SchemaCaps::of(&bare), SchemaCaps::default());
    }

    #[test]
    fn rows_at_preserves_requested_order() {
        let ft = FeatureTable {
            names: vec!["a".into()],
            rows: vec![vec![0.0], vec![1.0], vec![2.0]],
        };
        let picked = ft.rows_at(&[2, 0]);
        assert_eq!(picked, vec![vec![2.0], vec![0.0]]);
    }
}
