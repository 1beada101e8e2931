use ncv_data::{simulate, write_csv, ExperimentData, Table};
use ncv_engine::{execute, run_experiment, select_best};
use ncv_report::{FileTracker, MemoryNotifier, StandardReporter};
use ncv_types::{AlgorithmKind, ExperimentConfig, OuterFoldScore, OuterFoldSummary, ParamSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;

fn write_inputs(dir: &Path) -> ExperimentConfig {
    let data_path = dir.join("data").join("linear.csv");
    let en_path = dir.join("grids").join("elast.csv");
    let rf_path = dir.join("grids").join("rf.csv");

    let dataset = simulate::linear(150, &[2.0, -1.0, 0.5], 3.0, 7).unwrap();
    write_csv(&simulate::dataset_to_table(&dataset), &data_path).unwrap();
    write_csv(
        &Table::new(
            vec!["penalty".into(), "mixture".into()],
            vec![vec![0.5, 1e-8, 0.05], vec![0.5, 0.5, 0.2]],
        ),
        &en_path,
    )
    .unwrap();
    write_csv(
        &Table::new(vec!["mtry".into(), "trees".into()], vec![vec![1.0, 2.0], vec![5.0, 8.0]]),
        &rf_path,
    )
    .unwrap();

    ExperimentConfig {
        data_path,
        elastic_net_grid_path: en_path,
        random_forest_grid_path: rf_path,
        ..ExperimentConfig::default()
    }
}

#[tokio::test]
async fn noiseless_linear_data_selects_elastic_net() {
    let dir = TempDir::new().unwrap();
    let mut config = write_inputs(dir.path());
    config.report.tracking_dir = dir.path().join("mlruns");

    let notifier = Arc::new(MemoryNotifier::new());
    let reporter = StandardReporter::new(
        Arc::new(FileTracker::new(&config.report.tracking_dir)),
        notifier.clone(),
    );

    let report = run_experiment(&config, &reporter).await.unwrap();

    assert_eq!(report.record.algorithm, AlgorithmKind::ElasticNet);
    assert!(report.record.test_error < 0.01);
    assert!(report.record.train_error <= report.record.test_error + 1e-4);
    assert_eq!(report.record.params.require_f64("alpha").unwrap(), 1e-8);
    assert_eq!(report.outer_results.len(), 2);
    assert!(report.outer_results.iter().all(|r| r.folds.len() == 5));

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].title, "Nested CV script finished");
    assert!(sent[0].body.contains("The chosen algorithm was Elastic Net"));

    let experiment_dir = config.report.tracking_dir.join("ncv_duration");
    let runs: Vec<_> = std::fs::read_dir(&experiment_dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .collect();
    assert_eq!(runs.len(), 1);
    let run_dir = runs[0].path();
    assert!(run_dir.join("metrics").join("duration").exists());
    assert_eq!(
        std::fs::read_to_string(run_dir.join("tags").join("method")).unwrap(),
        "raschka"
    );
    assert!(run_dir.join("artifacts").join("final_model.json").exists());
}

#[test]
fn fixed_seeds_reproduce_the_run() {
    let dir = TempDir::new().unwrap();
    let config = write_inputs(dir.path());

    let first = execute(&config, &ExperimentData::load(&config).unwrap(), Instant::now()).unwrap();
    let second = execute(&config, &ExperimentData::load(&config).unwrap(), Instant::now()).unwrap();

    assert_eq!(first.record, second.record);
    assert_eq!(first.outer_results, second.outer_results);
}

#[test]
fn selection_prefers_the_lower_outer_error() {
    let summary = |algorithm, error| {
        OuterFoldSummary::from_folds(
            algorithm,
            vec![OuterFoldScore {
                fold_idx: 0,
                error,
                inner_error: error,
                best_params: ParamSet::new(),
            }],
        )
    };
    let results = vec![
        summary(AlgorithmKind::ElasticNet, 1.2),
        summary(AlgorithmKind::RandomForest, 0.9),
    ];
    assert_eq!(select_best(&results).unwrap().algorithm, AlgorithmKind::RandomForest);
}
