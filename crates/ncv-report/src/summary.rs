//! Human-readable run summaries.

use ncv_types::{round_to, RunReport};

/// Body of the end-of-run notification.
pub fn compose_message(report: &RunReport) -> String {
    let record = &report.record;
    format!(
        "Rust script finished in {} seconds. The chosen algorithm was {} with parameters, {}. \
         Avg score over cv's test folds was {}. Outer fold avg score was {}. \
         Training Error: {}, Test Error: {}",
        round_to(report.duration_seconds, 2),
        record.algorithm,
        record.params,
        record.kfold_error,
        record.outer_fold_error,
        record.train_error,
        record.test_error,
    )
}

/// One line per algorithm: mean and sd of the outer-fold errors.
pub fn outer_results_table(report: &RunReport) -> String {
    let mut lines = vec![format!("{:<15} {:>10} {:>10}", "algorithm", "mean_mae", "sd_mae")];
    for summary in &report.outer_results {
        lines.push(format!(
            "{:<15} {:>10.5} {:>10.5}",
            summary.algorithm.name(),
            summary.mean_error,
            summary.sd_error
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ncv_types::{AlgorithmKind, FinalModelRecord, OuterFoldSummary, ParamSet, ParameterValue};
    use std::collections::BTreeMap;

    fn sample_report() -> RunReport {
        RunReport {
            experiment: "ncv_duration".to_string(),
            duration_seconds: 12.5,
            tags: BTreeMap::from([
                ("implementation".to_string(), "rust".to_string()),
                ("method".to_string(), "raschka".to_string()),
            ]),
            record: FinalModelRecord {
                algorithm: AlgorithmKind::RandomForest,
                params: ParamSet::new()
                    .with("max_features", ParameterValue::Int(3))
                    .with("n_estimators", ParameterValue::Int(500)),
                kfold_error: 1.5,
                outer_fold_error: 1.62,
                train_error: 0.71,
                test_error: 1.58,
            },
            outer_results: vec![OuterFoldSummary::from_folds(AlgorithmKind::ElasticNet, Vec::new())],
            finished_at: Utc::now(),
        }
    }

    #[test]
    fn message_embeds_every_figure() {
        let message = compose_message(&sample_report());
        assert_eq!(
            message,
            "Rust script finished in 12.5 seconds. The chosen algorithm was Random Forest with \
             parameters, {'max_features': 3, 'n_estimators': 500}. Avg score over cv's test folds \
             was 1.5. Outer fold avg score was 1.62. Training Error: 0.71, Test Error: 1.58"
        );
    }

    #[test]
    fn table_has_a_row_per_algorithm() {
        let table = outer_results_table(&sample_report());
        assert_eq!(table.lines().count(), 2);
        assert!(table.lines().nth(1).unwrap().starts_with("Elastic Net"));
    }
}
