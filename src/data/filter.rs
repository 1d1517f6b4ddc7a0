use super::table::{CellValue, DEPT_COL, STORE_COL, SchemaCaps, Table};

// ---------------------------------------------------------------------------
// Selection – the user's active store / department constraint
// ---------------------------------------------------------------------------

/// The filter chosen in the side panel. `None` means "no constraint";
/// a dataset without identifying columns always runs with the default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub store: Option<CellValue>,
    pub dept: Option<CellValue>,
}

impl Selection {
    pub fn for_store(store: CellValue) -> Self {
        Selection {
            store: Some(store),
            dept: None,
        }
    }

    /// Human-readable label for headings and status lines.
    pub fn label(&self) -> String {
        match (&self.store, &self.dept) {
            (Some(s), Some(d)) => format!("store {s}, dept {d}"),
            (Some(s), None) => format!("store {s}"),
            _ => "full validation set".to_string(),
        }
    }

    /// File-name stem for the export artifact:
    /// `predictions_store_<id>[_dept_<id>]`, or `predictions_validation`
    /// when no constraint applies.
    pub fn export_stem(&self) -> String {
        match (&self.store, &self.dept) {
            (Some(s), Some(d)) => format!("predictions_store_{s}_dept_{d}"),
            (Some(s), None) => format!("predictions_store_{s}"),
            _ => "predictions_validation".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Choice lists for the dropdowns
// ---------------------------------------------------------------------------

/// Distinct store ids, sorted.
pub fn store_choices(table: &Table) -> Vec<CellValue> {
    table.distinct(STORE_COL).into_iter().collect()
}

/// Distinct department ids within one store, sorted.
pub fn dept_choices(table: &Table, store: &CellValue) -> Vec<CellValue> {
    let Some(store_col) = table.column_index(STORE_COL) else {
        return Vec::new();
    };
    let Some(dept_col) = table.column_index(DEPT_COL) else {
        return Vec::new();
    };
    let mut depts: Vec<CellValue> = table
        .rows
        .iter()
        .filter(|r| r.get(store_col) == Some(store))
        .filter_map(|r| r.get(dept_col))
        .cloned()
        .collect();
    depts.sort();
    depts.dedup();
    depts
}

// ---------------------------------------------------------------------------
// Row filtering
// ---------------------------------------------------------------------------

/// Indices of rows matching the selection, in table order.
///
/// The predicate is the conjunction of the active equality constraints.
/// Constraints on columns the table does not carry are ignored (the
/// capability flags keep the UI from producing them in the first place).
/// An unknown store or department simply yields an empty set.
pub fn filtered_indices(table: &Table, caps: &SchemaCaps, selection: &Selection) -> Vec<usize> {
    let store_col = caps
        .has_store
        .then(|| table.column_index(STORE_COL))
        .flatten();
    let dept_col = caps
        .has_dept
        .then(|| table.column_index(DEPT_COL))
        .flatten();

    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| {
            if let (Some(col), Some(want)) = (store_col, &selection.store) {
                if row.get(col) != Some(want) {
                    return false;
                }
            }
            if let (Some(col), Some(want)) = (dept_col, &selection.dept) {
                if row.get(col) != Some(want) {
                    return false;
                }
            }
            true
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::table::Table;

    fn int(v: i64) -> CellValue {
        CellValue::Integer(v)
    }

    /// Store 1 has three rows, store 2 has two.
    fn sample_table() -> Table {
        Table::new(
            vec!["Store".into(), "Dept".into()],
            vec![
                vec![int(1), int(1)],
                vec![int(1), int(2)],
                vec![int(2), int(1)],
                vec![int(1), int(2)],
                vec![int(2), int(3)],
            ],
        )
    }

    #[test]
    fn store_filter_keeps_matching_rows_in_order() {
        let table = sample_table();
        let caps = SchemaCaps::of(&table);
        let idx = filtered_indices(&table, &caps, &Selection::for_store(int(1)));
        assert_eq!(idx, vec![0, 1, 3]);
    }

    #[test]
    fn store_and_dept_constraints_conjoin() {
        let table = sample_table();
        let caps = SchemaCaps::of(&table);
        let sel = Selection {
            store: Some(int(1)),
            dept: Some(int(2)),
        };
        assert_eq!(filtered_indices(&table, &caps, &sel), vec![1, 3]);
    }

    #[test]
    fn unknown_store_yields_empty_subset() {
        let table = sample_table();
        let caps = SchemaCaps::of(&table);
        let idx = filtered_indices(&table, &caps, &Selection::for_store(int(99)));
        assert!(idx.is_empty());
    }

    #[test]
    fn filtering_is_idempotent() {
        let table = sample_table();
        let caps = SchemaCaps::of(&table);
        let sel = Selection::for_store(int(2));
        let once = filtered_indices(&table, &caps, &sel);
        let twice = filtered_indices(&table, &caps, &sel);
        assert_eq!(once, twice);
    }

    #[test]
    fn table_without_id_columns_passes_everything() {
        let table = Table::new(
            vec!["Temperature".into()],
            vec![vec![CellValue::Float(1.0)], vec![CellValue::Float(2.0)]],
        );
        let caps = SchemaCaps::of(&table);
        let idx = filtered_indices(&table, &caps, &Selection::default());
        assert_eq!(idx, vec![0, 1]);
    }

    #[test]
    fn dept_choices_are_scoped_to_the_store() {
        let table = sample_table();
        assert_eq!(dept_choices(&table, &int(1)), vec![int(1), int(2)]);
        assert_eq!(dept_choices(&table, &int(2)), vec![int(1), int(3)]);
    }
}
