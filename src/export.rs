use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};

use crate::analysis::eval::Evaluation;
use crate::data::filter::Selection;

// ---------------------------------------------------------------------------
// Prediction export
// ---------------------------------------------------------------------------

/// Default file name for the current selection, e.g.
/// `predictions_store_3_dept_12.csv`.
pub fn default_file_name(selection: &Selection) -> String {
    format!("{}.csv", selection.export_stem())
}

/// Write the actual/predicted pairs of one evaluation as CSV.
///
/// With dates the columns are `Date,Weekly_Sales,Predicted_Weekly_Sales`
/// and rows follow the time series; without, the date column is omitted
/// and rows stay in filtered order.
pub fn write_csv<W: Write>(evaluation: &Evaluation, writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);

    match &evaluation.dates {
        Some(dates) => {
            out.write_record(["Date", "Weekly_Sales", "Predicted_Weekly_Sales"])?;
            for i in evaluation.time_order() {
                out.write_record([
                    dates[i].clone(),
                    format_value(evaluation.actual[i]),
                    format_value(evaluation.predicted[i]),
                ])?;
            }
        }
        None => {
            out.write_record(["Weekly_Sales", "Predicted_Weekly_Sales"])?;
            for i in 0..evaluation.len() {
                out.write_record([
                    format_value(evaluation.actual[i]),
                    format_value(evaluation.predicted[i]),
                ])?;
            }
        }
    }

    out.flush().context("flushing export")?;
    Ok(())
}

/// Write the export to a file on disk.
pub fn write_to_path(evaluation: &Evaluation, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating {}", path.display()))?;
    write_csv(evaluation, std::io::BufWriter::new(file))
}

/// Ask the user where to save, then write. Returns the chosen path's
/// display name, or `None` when the dialog was cancelled.
pub fn save_with_dialog(evaluation: &Evaluation, selection: &Selection) -> Result<Option<String>> {
    let Some(path) = rfd::FileDialog::new()
        .set_title("Save predictions")
        .set_file_name(default_file_name(selection))
        .add_filter("CSV", &["csv"])
        .save_file()
    else {
        return Ok(None);
    };

    write_to_path(evaluation, &path)?;
    log::info!("exported {} rows to {}", evaluation.len(), path.display());
    Ok(Some(path.display().to_string()))
}

// Plain `{}` keeps integral sales values readable while preserving full
// precision for fractional ones.
fn format_value(v: f64) -> String {
    format!("{v}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::eval::{Evaluation, Metrics};
    use crate::analysis::metrics::ResidualStats;
    use crate::data::table::CellValue;

    fn evaluation(dates: Option<Vec<String>>, actual: Vec<f64>, predicted: Vec<f64>) -> Evaluation {
        let residuals: Vec<f64> = actual
            .iter()
            .zip(&predicted)
            .map(|(a, p)| a - p)
            .collect();
        let residual_stats = ResidualStats::from_residuals(&residuals);
        Evaluation {
            row_indices: (0..actual.len()).collect(),
            metrics: Metrics {
                mae: 0.0,
                rmse: 0.0,
                r_squared: Some(1.0),
            },
            residual_stats,
            importance: vec![],
            dates,
            residuals,
            actual,
            predicted,
        }
    }

    #[test]
    fn round_trip_preserves_pairs_and_order() {
        let eval = evaluation(None, vec![10.5, 20.0, 30.25], vec![11.0, 19.5, 30.25]);

        let mut buf = Vec::new();
        write_csv(&eval, &mut buf).unwrap();

        let mut reader = csv::Reader::from_reader(buf.as_slice());
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(vec!["Weekly_Sales", "Predicted_Weekly_Sales"])
        );
        let rows: Vec<(f64, f64)> = reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].parse().unwrap(), r[1].parse().unwrap())
            })
            .collect();
        assert_eq!(rows, vec![(10.5, 11.0), (20.0, 19.5), (30.25, 30.25)]);
    }

    #[test]
    fn dated_export_is_time_ordered() {
        let eval = evaluation(
            Some(vec![
                "2011-01-21".into(),
                "2011-01-07".into(),
                "2011-01-14".into(),
            ]),
            vec![3.0, 1.0, 2.0],
            vec![3.5, 1.5, 2.5],
        );

        let mut buf = Vec::new();
        write_csv(&eval, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Date,Weekly_Sales,Predicted_Weekly_Sales");
        assert_eq!(lines[1], "2011-01-07,1,1.5");
        assert_eq!(lines[2], "2011-01-14,2,2.5");
        assert_eq!(lines[3], "2011-01-21,3,3.5");
    }

    #[test]
    fn file_round_trip() {
        let dir = std::env::temp_dir().join(format!("salescope-export-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("predictions_store_1.csv");

        let eval = evaluation(None, vec![100.0, 200.0], vec![110.0, 190.0]);
        write_to_path(&eval, &path).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<(f64, f64)> = reader
            .records()
            .map(|r| {
                let r = r.unwrap();
                (r[0].parse().unwrap(), r[1].parse().unwrap())
            })
            .collect();
        assert_eq!(rows, vec![(100.0, 110.0), (200.0, 190.0)]);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn file_name_encodes_the_selection() {
        let store = Selection::for_store(CellValue::Integer(3));
        assert_eq!(default_file_name(&store), "predictions_store_3.csv");

        let both = Selection {
            store: Some(CellValue::Integer(3)),
            dept: Some(CellValue::Integer(12)),
        };
        assert_eq!(default_file_name(&both), "predictions_store_3_dept_12.csv");

        assert_eq!(
            default_file_name(&Selection::default()),
            "predictions_validation.csv"
        );
    }
}
