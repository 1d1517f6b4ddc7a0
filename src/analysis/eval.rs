use thiserror::Error;

use crate::data::filter::{Selection, filtered_indices};
use crate::data::loader::SalesBundle;
use crate::data::table::DATE_COL;

use super::metrics::{self, ResidualStats};

/// How many features the importance chart shows.
pub const TOP_IMPORTANCES: usize = 15;

// ---------------------------------------------------------------------------
// Errors recoverable within one interaction
// ---------------------------------------------------------------------------

/// A selection-level failure. The user changes the selection and retries;
/// the process keeps running.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EvalError {
    #[error("no data for this selection")]
    EmptySelection,
}

// ---------------------------------------------------------------------------
// Metrics and evaluation result
// ---------------------------------------------------------------------------

/// The three scalar accuracy metrics for one selection. `r_squared` is
/// `None` when the observed values are constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    pub mae: f64,
    pub rmse: f64,
    pub r_squared: Option<f64>,
}

/// Everything the charts and the export consume for one selection.
/// Recomputed on every selection change, discarded on the next.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Validation-table row indices of the selected slice.
    pub row_indices: Vec<usize>,
    pub actual: Vec<f64>,
    pub predicted: Vec<f64>,
    /// `actual − predicted`, aligned with the two vectors above.
    pub residuals: Vec<f64>,
    /// Date text per selected row, present when the table carries dates.
    pub dates: Option<Vec<String>>,
    pub metrics: Metrics,
    pub residual_stats: ResidualStats,
    /// Top feature importances, descending.
    pub importance: Vec<(String, f64)>,
}

impl Evaluation {
    pub fn len(&self) -> usize {
        self.actual.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actual.is_empty()
    }

    /// Positions 0..len sorted by date when dates exist (ISO text, so
    /// lexical order is chronological), identity otherwise. The time
    /// series chart and the export both iterate in this order.
    pub fn time_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.len()).collect();
        if let Some(dates) = &self.dates {
            order.sort_by(|&a, &b| dates[a].cmp(&dates[b]));
        }
        order
    }
}

// ---------------------------------------------------------------------------
// The pipeline
// ---------------------------------------------------------------------------

/// Filter → predict → metrics for one selection.
///
/// Row indices produced against the validation table index the feature
/// table and the target series directly; the loader verified that
/// alignment when the bundle was built.
pub fn evaluate(bundle: &SalesBundle, selection: &Selection) -> Result<Evaluation, EvalError> {
    let row_indices = filtered_indices(&bundle.validation, &bundle.caps, selection);
    if row_indices.is_empty() {
        return Err(EvalError::EmptySelection);
    }

    let feature_rows = bundle.features.rows_at(&row_indices);
    let predicted = bundle.model.predict(&feature_rows);
    let actual: Vec<f64> = row_indices
        .iter()
        .filter_map(|&i| bundle.target.get(i).copied())
        .collect();

    let residuals = metrics::residuals(&actual, &predicted);
    let metrics = Metrics {
        mae: metrics::mae(&actual, &predicted),
        rmse: metrics::rmse(&actual, &predicted),
        r_squared: metrics::r_squared(&actual, &predicted),
    };
    let residual_stats = ResidualStats::from_residuals(&residuals);

    let dates = bundle.caps.has_date.then(|| {
        row_indices
            .iter()
            .map(|&i| {
                bundle
                    .validation
                    .value(i, DATE_COL)
                    .map(|v| v.to_string())
                    .unwrap_or_default()
            })
            .collect()
    });

    let mut importance = bundle.model.ranked_importances();
    importance.truncate(TOP_IMPORTANCES);

    log::debug!(
        "evaluated {}: {} rows, mae {:.2}, rmse {:.2}",
        selection.label(),
        actual.len(),
        metrics.mae,
        metrics.rmse,
    );

    Ok(Evaluation {
        row_indices,
        actual,
        predicted,
        residuals,
        dates,
        metrics,
        residual_stats,
        importance,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::forest::{ForestModel, Node, Tree};
    use crate::data::table::{CellValue, FeatureTable, SchemaCaps, Table};

    fn int(v: i64) -> CellValue {
        CellValue::Integer(v)
    }

    fn date(s: &str) -> CellValue {
        CellValue::Date(s.to_string())
    }

    /// Store 1 → 3 rows, store 2 → 2 rows. The model is a step on the
    /// Store feature: 100 for store 1, 200 for store 2.
    fn sample_bundle() -> SalesBundle {
        let validation = Table::new(
            vec!["Store".into(), "Date".into()],
            vec![
                vec![int(1), date("2011-01-21")],
                vec![int(1), date("2011-01-07")],
                vec![int(2), date("2011-01-07")],
                vec![int(1), date("2011-01-14")],
                vec![int(2), date("2011-01-14")],
            ],
        );
        let caps = SchemaCaps::of(&validation);
        let features = FeatureTable {
            names: vec!["Store".into()],
            rows: vec![vec![1.0], vec![1.0], vec![2.0], vec![1.0], vec![2.0]],
        };
        let model = ForestModel {
            feature_names: vec!["Store".into()],
            importances: vec![1.0],
            trees: vec![Tree {
                nodes: vec![
                    Node::Split {
                        feature: 0,
                        threshold: 1.5,
                        left: 1,
                        right: 2,
                    },
                    Node::Leaf { value: 100.0 },
                    Node::Leaf { value: 200.0 },
                ],
            }],
        };
        SalesBundle {
            validation,
            features,
            target: vec![110.0, 90.0, 195.0, 100.0, 205.0],
            train_features: FeatureTable {
                names: vec!["Store".into()],
                rows: vec![],
            },
            train_target: vec![],
            test_features: FeatureTable {
                names: vec!["Store".into()],
                rows: vec![],
            },
            caps,
            model,
        }
    }

    #[test]
    fn store_selection_restricts_every_downstream_vector() {
        let bundle = sample_bundle();
        let eval = evaluate(&bundle, &Selection::for_store(int(1))).unwrap();

        assert_eq!(eval.row_indices, vec![0, 1, 3]);
        assert_eq!(eval.actual, vec![110.0, 90.0, 100.0]);
        assert_eq!(eval.predicted, vec![100.0, 100.0, 100.0]);
        assert_eq!(eval.residuals, vec![10.0, -10.0, 0.0]);
        assert_eq!(eval.dates.as_ref().unwrap().len(), 3);
    }

    #[test]
    fn unknown_store_hits_the_empty_selection_path() {
        let bundle = sample_bundle();
        assert_eq!(
            evaluate(&bundle, &Selection::for_store(int(99))),
            Err(EvalError::EmptySelection)
        );
    }

    #[test]
    fn metrics_follow_the_selected_slice() {
        let bundle = sample_bundle();
        let eval = evaluate(&bundle, &Selection::for_store(int(2))).unwrap();
        // actual [195, 205] vs predicted [200, 200]
        assert!((eval.metrics.mae - 5.0).abs() < 1e-12);
        assert!((eval.metrics.rmse - 5.0).abs() < 1e-12);
        assert!((eval.residual_stats.mean - 0.0).abs() < 1e-12);
        assert!(eval.metrics.r_squared.is_some());
    }

    #[test]
    fn constant_actual_reports_undefined_r_squared() {
        let mut bundle = sample_bundle();
        bundle.target = vec![100.0; 5];
        let eval = evaluate(&bundle, &Selection::for_store(int(1))).unwrap();
        assert_eq!(eval.metrics.r_squared, None);
    }

    #[test]
    fn time_order_sorts_by_date() {
        let bundle = sample_bundle();
        let eval = evaluate(&bundle, &Selection::for_store(int(1))).unwrap();
        // Dates: [01-21, 01-07, 01-14] → sorted positions [1, 2, 0]
        assert_eq!(eval.time_order(), vec![1, 2, 0]);
    }

    #[test]
    fn full_set_runs_without_identifying_columns() {
        let mut bundle = sample_bundle();
        bundle.validation = Table::new(
            vec!["Temperature".into()],
            vec![vec![CellValue::Float(0.0)]; 5],
        );
        bundle.caps = SchemaCaps::of(&bundle.validation);

        let eval = evaluate(&bundle, &Selection::default()).unwrap();
        assert_eq!(eval.len(), 5);
        assert!(eval.dates.is_none());
    }

    #[test]
    fn importance_is_truncated_and_descending() {
        let mut bundle = sample_bundle();
        bundle.model.feature_names = (0..20).map(|i| format!("f{i}")).collect();
        bundle.model.importances = (0..20).map(|i| i as f64 / 20.0).collect();
        bundle.features.names = bundle.model.feature_names.clone();
        bundle.features.rows = vec![vec![0.0; 20]; 5];
        // keep the single-split tree valid for 20 features
        let eval = evaluate(&bundle, &Selection::default()).unwrap();
        assert_eq!(eval.importance.len(), TOP_IMPORTANCES);
        assert!(
            eval.importance
                .windows(2)
                .all(|w| w[0].1 >= w[1].1)
        );
    }
}
