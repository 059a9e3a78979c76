//! Anomaly detection orchestration: validate, load, score, extract.

use std::path::Path;

use billwatch_forest::IsolationForest;
use billwatch_io::{TransactionRecord, TransactionTable, validate_model_file, validate_table};
use tracing::{info, instrument};

use crate::error::PipelineError;

/// A transaction flagged as a bill shock.
///
/// Carries the untouched original record, its position in the input table,
/// and the anomaly score that put it over the threshold.
#[derive(Debug, Clone)]
pub struct LabeledTransaction {
    /// Zero-based row position in the input table (excluding header).
    pub row_index: usize,
    /// The original record, columns unmodified.
    pub record: TransactionRecord,
    /// Anomaly score in (0, 1].
    pub score: f64,
}

/// Result of scoring a transaction batch against a trained model.
///
/// The subset holds exactly the rows labeled `Bill Shock`, in original
/// order. An empty subset is a valid, successful outcome.
#[derive(Debug, Clone)]
pub struct AnomalyReport {
    headers: Vec<String>,
    anomalies: Vec<LabeledTransaction>,
    n_records: usize,
}

impl AnomalyReport {
    /// Return the header row of the scored table.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Return the bill-shock subset in original row order.
    #[must_use]
    pub fn anomalies(&self) -> &[LabeledTransaction] {
        &self.anomalies
    }

    /// Return the total number of input rows scored.
    #[must_use]
    pub fn n_records(&self) -> usize {
        self.n_records
    }

    /// Return the number of rows flagged as bill shocks.
    #[must_use]
    pub fn n_anomalies(&self) -> usize {
        self.anomalies.len()
    }

    /// Return the flagged fraction of the input, 0.0 for an empty input.
    #[must_use]
    pub fn anomaly_fraction(&self) -> f64 {
        if self.n_records == 0 {
            0.0
        } else {
            self.anomalies.len() as f64 / self.n_records as f64
        }
    }
}

/// Detect bill shocks in `table` using the model stored at `model_path`.
///
/// The model file and the table are validated before the model is loaded;
/// a missing model file is a [`ValidationError::ModelNotFound`] failure,
/// never an empty result.
///
/// # Errors
///
/// Returns the first failing validation, a load error, or a scoring error.
///
/// [`ValidationError::ModelNotFound`]: billwatch_io::ValidationError::ModelNotFound
#[instrument(skip(table), fields(model = %model_path.display(), n_records = table.n_records()))]
pub fn detect_anomalies(
    table: &TransactionTable,
    model_path: &Path,
    amount_column: &str,
) -> Result<AnomalyReport, PipelineError> {
    validate_model_file(model_path)?;
    validate_table(table, amount_column)?;

    info!("loading model");
    let model = IsolationForest::load(model_path)?;

    detect_with_model(table, &model, amount_column)
}

/// Detect bill shocks in `table` using an already-loaded model.
///
/// Records with a missing amount carry no evidence of shock; they are
/// labeled `Normal` and never appear in the subset.
///
/// # Errors
///
/// Returns the first failing table validation.
#[instrument(skip(table, model), fields(n_records = table.n_records()))]
pub fn detect_with_model(
    table: &TransactionTable,
    model: &IsolationForest,
    amount_column: &str,
) -> Result<AnomalyReport, PipelineError> {
    validate_table(table, amount_column)?;
    let column = table
        .column_index(amount_column)
        .expect("column presence checked by validate_table");

    info!(n_records = table.n_records(), "detecting anomalies");

    // Score only the rows with a usable amount, in parallel, then map the
    // scores back onto their original row positions.
    let scored: Vec<(usize, f64)> = table
        .amounts(column)
        .into_iter()
        .enumerate()
        .filter_map(|(row_index, amount)| amount.map(|a| (row_index, a)))
        .collect();
    let values: Vec<f64> = scored.iter().map(|&(_, a)| a).collect();
    let scores = model.score_batch(&values);

    let mut anomalies = Vec::new();
    for (&(row_index, _), &score) in scored.iter().zip(&scores) {
        if model.classify_score(score).is_shock() {
            anomalies.push(LabeledTransaction {
                row_index,
                record: table.records()[row_index].clone(),
                score,
            });
        }
    }

    let report = AnomalyReport {
        headers: table.headers().to_vec(),
        anomalies,
        n_records: table.n_records(),
    };

    info!(
        n_anomalies = report.n_anomalies(),
        fraction = format!("{:.1}%", report.anomaly_fraction() * 100.0),
        "detection complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use billwatch_forest::IsolationForestConfig;
    use billwatch_io::{TransactionRecord, TransactionTable, ValidationError};

    use super::detect_with_model;
    use crate::error::PipelineError;

    fn amount_table(amounts: &[&str]) -> TransactionTable {
        TransactionTable::new(
            vec!["Amount".to_string()],
            amounts
                .iter()
                .map(|a| TransactionRecord::new(vec![a.to_string()]))
                .collect(),
        )
    }

    fn trained_model(amounts: &[f64], contamination: f64) -> billwatch_forest::IsolationForest {
        IsolationForestConfig::new()
            .with_contamination(contamination)
            .with_seed(42)
            .fit(amounts)
            .unwrap()
    }

    #[test]
    fn subset_preserves_order_and_indices() {
        let model = trained_model(&[100.0, 150.0, 200.0, 250.0, 300.0], 0.2);
        let table = amount_table(&["9000", "120", "8500"]);
        let report = detect_with_model(&table, &model, "Amount").unwrap();

        let indices: Vec<usize> = report.anomalies().iter().map(|a| a.row_index).collect();
        assert_eq!(indices, [0, 2]);
        assert_eq!(report.anomalies()[0].record.get(0), Some("9000"));
        assert_eq!(report.anomalies()[1].record.get(0), Some("8500"));
    }

    #[test]
    fn empty_subset_is_success() {
        let model = trained_model(&[100.0, 150.0, 200.0, 250.0, 300.0], 0.2);
        // Interior values only; nothing should clear the threshold.
        let table = amount_table(&["170", "190", "210"]);
        let report = detect_with_model(&table, &model, "Amount").unwrap();
        assert_eq!(report.n_anomalies(), 0);
        assert_eq!(report.n_records(), 3);
        assert_eq!(report.anomaly_fraction(), 0.0);
    }

    #[test]
    fn missing_amounts_never_flagged() {
        let model = trained_model(&[100.0, 150.0, 200.0, 250.0, 300.0], 0.2);
        let table = amount_table(&["", "9000", "NaN"]);
        let report = detect_with_model(&table, &model, "Amount").unwrap();
        assert_eq!(report.n_anomalies(), 1);
        assert_eq!(report.anomalies()[0].row_index, 1);
    }

    #[test]
    fn deterministic_for_fixed_inputs() {
        let model = trained_model(&[100.0, 150.0, 200.0, 250.0, 300.0], 0.2);
        let table = amount_table(&["120", "180", "9000"]);
        let first = detect_with_model(&table, &model, "Amount").unwrap();
        let second = detect_with_model(&table, &model, "Amount").unwrap();
        assert_eq!(first.n_anomalies(), second.n_anomalies());
        for (a, b) in first.anomalies().iter().zip(second.anomalies()) {
            assert_eq!(a.row_index, b.row_index);
            assert_eq!(a.score, b.score);
        }
    }

    #[test]
    fn empty_table_is_validation_error() {
        let model = trained_model(&[100.0, 200.0, 300.0], 0.1);
        let table = amount_table(&[]);
        let err = detect_with_model(&table, &model, "Amount").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::EmptyData)
        ));
    }

    #[test]
    fn missing_column_is_validation_error() {
        let model = trained_model(&[100.0, 200.0, 300.0], 0.1);
        let table = TransactionTable::new(
            vec!["Price".to_string()],
            vec![TransactionRecord::new(vec!["100".to_string()])],
        );
        let err = detect_with_model(&table, &model, "Amount").unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Validation(ValidationError::MissingColumn { .. })
        ));
    }
}
