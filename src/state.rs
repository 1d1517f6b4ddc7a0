use crate::analysis::eval::{EvalError, Evaluation, evaluate};
use crate::color::ChartPalette;
use crate::data::filter::{Selection, store_choices};
use crate::data::loader::{DataConfig, SalesBundle, load_bundle};
use crate::data::table::CellValue;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
///
/// `bundle` is populated once at startup and read-only afterwards; the UI
/// never re-reads storage on interaction. File → Reload rebuilds it from
/// disk, which is the only invalidation short of a restart.
pub struct AppState {
    pub config: DataConfig,

    /// Loaded dataset and model (None when the initial load failed).
    pub bundle: Option<SalesBundle>,

    /// The active store/department filter.
    pub selection: Selection,

    /// Pipeline output for the active selection (cached per interaction).
    /// `Err(EmptySelection)` renders as a message, not as charts.
    pub evaluation: Option<Result<Evaluation, EvalError>>,

    pub palette: ChartPalette,

    /// Status / error message shown in the top bar.
    pub status_message: Option<String>,
}

impl AppState {
    /// Load the bundle and evaluate the default selection.
    pub fn load(config: DataConfig) -> Self {
        let mut state = AppState {
            config,
            bundle: None,
            selection: Selection::default(),
            evaluation: None,
            palette: ChartPalette::default(),
            status_message: None,
        };
        state.reload();
        state
    }

    /// (Re-)read the full manifest from disk. On failure the previous
    /// bundle is dropped so the UI never shows a partial or stale view.
    pub fn reload(&mut self) {
        match load_bundle(&self.config) {
            Ok(bundle) => {
                self.selection = default_selection(&bundle);
                self.bundle = Some(bundle);
                self.status_message = None;
                self.reevaluate();
            }
            Err(e) => {
                log::error!("load failed: {e}");
                self.bundle = None;
                self.evaluation = None;
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Recompute the pipeline output for the current selection.
    pub fn reevaluate(&mut self) {
        self.evaluation = self
            .bundle
            .as_ref()
            .map(|bundle| evaluate(bundle, &self.selection));
    }

    /// Select a store; any department choice belongs to the previous
    /// store, so it resets.
    pub fn set_store(&mut self, store: CellValue) {
        if self.selection.store.as_ref() == Some(&store) {
            return;
        }
        self.selection = Selection::for_store(store);
        self.reevaluate();
    }

    /// Select a department within the current store (`None` = all).
    pub fn set_dept(&mut self, dept: Option<CellValue>) {
        if self.selection.dept == dept {
            return;
        }
        self.selection.dept = dept;
        self.reevaluate();
    }
}

/// First store in the data, matching what the store dropdown will show;
/// no constraint when the schema has no store column.
fn default_selection(bundle: &SalesBundle) -> Selection {
    if !bundle.caps.has_store {
        return Selection::default();
    }
    match store_choices(&bundle.validation).into_iter().next() {
        Some(store) => Selection::for_store(store),
        None => Selection::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::forest::{ForestModel, Node, Tree};
    use crate::data::table::{FeatureTable, SchemaCaps, Table};

    fn int(v: i64) -> CellValue {
        CellValue::Integer(v)
    }

    fn bundle_with_stores() -> SalesBundle {
        let validation = Table::new(
            vec!["Store".into()],
            vec![vec![int(2)], vec![int(1)], vec![int(2)]],
        );
        let caps = SchemaCaps::of(&validation);
        SalesBundle {
            caps,
            validation,
            features: FeatureTable {
                names: vec!["Store".into()],
                rows: vec![vec![2.0], vec![1.0], vec![2.0]],
            },
            target: vec![20.0, 10.0, 22.0],
            train_features: FeatureTable {
                names: vec!["Store".into()],
                rows: vec![],
            },
            train_target: vec![],
            test_features: FeatureTable {
                names: vec!["Store".into()],
                rows: vec![],
            },
            model: ForestModel {
                feature_names: vec!["Store".into()],
                importances: vec![1.0],
                trees: vec![Tree {
                    nodes: vec![Node::Leaf { value: 15.0 }],
                }],
            },
        }
    }

    #[test]
    fn default_selection_takes_the_first_store() {
        let sel = default_selection(&bundle_with_stores());
        assert_eq!(sel, Selection::for_store(int(1)));
    }

    #[test]
    fn changing_store_resets_the_department() {
        let mut state = AppState {
            config: DataConfig::with_dir("unused"),
            bundle: Some(bundle_with_stores()),
            selection: Selection {
                store: Some(int(1)),
                dept: Some(int(7)),
            },
            evaluation: None,
            palette: ChartPalette::default(),
            status_message: None,
        };
        state.set_store(int(2));
        assert_eq!(state.selection, Selection::for_store(int(2)));
        assert!(state.evaluation.is_some());
    }
}
