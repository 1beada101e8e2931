//! One complete benchmark run: load, nested CV, select, refit, report.

use chrono::Utc;
use ncv_data::ExperimentData;
use ncv_report::{
    ExperimentTracker, FileTracker, LogNotifier, Notifier, PushbulletNotifier, ReportSink, StandardReporter,
};
use ncv_types::{internal_error, round_to, ExperimentConfig, NcvResult, NotifyMode, ReportSettings, RunReport};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::final_model::FinalTrainer;
use crate::nested::OuterLoopEvaluator;
use crate::registry::AlgorithmRegistry;
use crate::selector::select_best;

/// Run the whole benchmark from the files named in `config`, then report.
///
/// The duration covers loading through the final refit; final scoring and
/// reporting are not timed.
pub async fn run_experiment(config: &ExperimentConfig, sink: &dyn ReportSink) -> NcvResult<RunReport> {
    config.validate()?;
    let config = config.clone();

    let report = tokio::task::spawn_blocking(move || -> NcvResult<RunReport> {
        let started = Instant::now();
        let data = ExperimentData::load(&config)?;
        execute(&config, &data, started)
    })
    .await
    .map_err(|e| internal_error!("Experiment task failed: {}", e))??;

    sink.report(&report).await?;
    Ok(report)
}

/// [`run_experiment`] on data that is already in memory.
pub async fn run_on_data(config: &ExperimentConfig, data: ExperimentData, sink: &dyn ReportSink) -> NcvResult<RunReport> {
    config.validate()?;
    let config = config.clone();

    let report = tokio::task::spawn_blocking(move || execute(&config, &data, Instant::now()))
        .await
        .map_err(|e| internal_error!("Experiment task failed: {}", e))??;

    sink.report(&report).await?;
    Ok(report)
}

/// The synchronous pipeline; `started` marks the beginning of the timed section.
pub fn execute(config: &ExperimentConfig, data: &ExperimentData, started: Instant) -> NcvResult<RunReport> {
    let registry = AlgorithmRegistry::from_grids(&data.grids, &config.models, config.cv.clone());
    let train = &data.split.train;
    info!(
        "Nested CV over {} algorithms: {} outer x {} inner folds on {} training rows",
        registry.len(),
        config.cv.outer_folds,
        config.cv.inner_folds,
        train.n_rows()
    );

    let outer_results = OuterLoopEvaluator::new(&registry).evaluate_all(train)?;
    let chosen = select_best(&outer_results)?;

    let trainer = FinalTrainer::new(&registry);
    let tuned = trainer.fit(chosen.algorithm, train)?;
    let duration_seconds = round_to(started.elapsed().as_secs_f64(), 2);

    let record = trainer
        .score(&tuned, &data.split, chosen.mean_error)?
        .rounded(config.report.decimals);
    info!("Run finished in {} seconds, chose {}", duration_seconds, record.algorithm);

    Ok(RunReport {
        experiment: config.experiment_name.clone(),
        duration_seconds,
        tags: config.report.tags.clone(),
        record,
        outer_results,
        finished_at: Utc::now(),
    })
}

/// Reporter for the configured tracking dir and notification mode.
pub fn build_reporter(settings: &ReportSettings) -> NcvResult<StandardReporter> {
    let tracker: Arc<dyn ExperimentTracker> = Arc::new(FileTracker::new(&settings.tracking_dir));
    let notifier: Arc<dyn Notifier> = match (settings.notify, settings.pushbullet_token.as_deref()) {
        (NotifyMode::Log, _) | (NotifyMode::Auto, None) => Arc::new(LogNotifier),
        (NotifyMode::Auto, Some(token)) => Arc::new(PushbulletNotifier::new(token)?),
        (NotifyMode::Pushbullet, token) => Arc::new(PushbulletNotifier::new(token.unwrap_or_default())?),
    };
    info!("Tracking to {}, notifying via {}", settings.tracking_dir.display(), notifier.name());
    Ok(StandardReporter::new(tracker, notifier).with_title(settings.notification_title.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ncv_report::{MemoryNotifier, MemoryTracker};
    use ncv_types::{AlgorithmKind, Dataset, ParameterGrid, ParameterValue};
    use std::collections::BTreeMap;

    fn data(config: &ExperimentConfig) -> ExperimentData {
        let n = 60;
        let x1: Vec<f64> = (0..n).map(|i| ((i * 7) % 19) as f64 / 19.0).collect();
        let x2: Vec<f64> = (0..n).map(|i| ((i * 11) % 13) as f64 / 13.0).collect();
        let y: Vec<f64> = x1.iter().zip(&x2).map(|(a, b)| 1.5 * a - 0.5 * b + 2.0).collect();
        let dataset = Dataset::from_columns(vec!["x1".into(), "x2".into(), "y".into()], vec![x1, x2, y]).unwrap();
        let grids = BTreeMap::from([
            (
                AlgorithmKind::ElasticNet,
                ParameterGrid::zipped()
                    .add_axis("alpha", vec![ParameterValue::Float(1e-6), ParameterValue::Float(0.1)])
                    .add_axis("l1_ratio", vec![ParameterValue::Float(0.5), ParameterValue::Float(0.9)]),
            ),
            (
                AlgorithmKind::RandomForest,
                ParameterGrid::zipped()
                    .add_axis("max_features", vec![ParameterValue::Int(1)])
                    .add_axis("n_estimators", vec![ParameterValue::Int(3)]),
            ),
        ]);
        ExperimentData::from_parts(&dataset, grids, config).unwrap()
    }

    #[tokio::test]
    async fn report_reaches_the_sink() {
        let config = ExperimentConfig::default();
        let tracker = Arc::new(MemoryTracker::new());
        let notifier = Arc::new(MemoryNotifier::new());
        let sink = StandardReporter::new(tracker.clone(), notifier.clone());

        let report = run_on_data(&config, data(&config), &sink).await.unwrap();

        assert_eq!(report.experiment, "ncv_duration");
        assert_eq!(report.outer_results.len(), 2);
        assert_eq!(report.record.algorithm, AlgorithmKind::ElasticNet);
        assert!(report.duration_seconds >= 0.0);
        assert_eq!(tracker.runs().len(), 1);
        assert_eq!(notifier.sent().len(), 1);
    }

    #[test]
    fn record_is_rounded() {
        let config = ExperimentConfig::default();
        let report = execute(&config, &data(&config), Instant::now()).unwrap();
        let scaled = report.record.test_error * 1e5;
        assert!((scaled - scaled.round()).abs() < 1e-6);
    }

    #[test]
    fn auto_mode_without_token_logs() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = ReportSettings {
            tracking_dir: dir.path().to_path_buf(),
            ..ReportSettings::default()
        };
        assert!(build_reporter(&settings).is_ok());

        let pushbullet = ReportSettings {
            notify: NotifyMode::Pushbullet,
            ..settings
        };
        assert!(build_reporter(&pushbullet).is_err());
    }
}
