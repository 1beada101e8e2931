//! Report sinks: where a finished run's figures end up.

use async_trait::async_trait;
use ncv_types::{internal_error, round_to, NcvResult, RunReport};
use std::sync::Arc;

use crate::notify::{Notification, Notifier};
use crate::summary::{compose_message, outer_results_table};
use crate::tracking::{ExperimentTracker, RunHandle, RunStatus};

pub const DURATION_METRIC: &str = "duration";
pub const FINAL_MODEL_ARTIFACT: &str = "final_model";
pub const OUTER_RESULTS_ARTIFACT: &str = "outer_results";
pub const DEFAULT_NOTIFICATION_TITLE: &str = "Nested CV script finished";

#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn report(&self, report: &RunReport) -> NcvResult<()>;
}

/// Tracks the run, then sends the summary notification.
pub struct StandardReporter {
    tracker: Arc<dyn ExperimentTracker>,
    notifier: Arc<dyn Notifier>,
    title: String,
}

impl StandardReporter {
    pub fn new(tracker: Arc<dyn ExperimentTracker>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            tracker,
            notifier,
            title: DEFAULT_NOTIFICATION_TITLE.to_string(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Write one run; a run that was started is always closed, as failed if any write failed.
fn track(tracker: &dyn ExperimentTracker, report: &RunReport) -> NcvResult<()> {
    let mut run = tracker.start_run(&report.experiment)?;

    let logged = log_run(tracker, &run, report);
    let status = if logged.is_ok() { RunStatus::Finished } else { RunStatus::Failed };
    let ended = tracker.terminate_run(&mut run, status);

    if let Err(e) = &logged {
        tracing::warn!("Run {} marked failed: {}", run.run_id, e);
    }
    logged?;
    ended?;

    tracing::info!("Logged run {} to experiment '{}'", run.run_id, report.experiment);
    Ok(())
}

fn log_run(tracker: &dyn ExperimentTracker, run: &RunHandle, report: &RunReport) -> NcvResult<()> {
    tracker.log_metric(run, DURATION_METRIC, round_to(report.duration_seconds, 2))?;
    tracker.set_tags(run, &report.tags)?;
    tracker.log_artifact(run, FINAL_MODEL_ARTIFACT, &serde_json::to_value(&report.record)?)?;
    tracker.log_artifact(run, OUTER_RESULTS_ARTIFACT, &serde_json::to_value(&report.outer_results)?)?;
    Ok(())
}

#[async_trait]
impl ReportSink for StandardReporter {
    async fn report(&self, report: &RunReport) -> NcvResult<()> {
        tracing::info!("Outer fold results:\n{}", outer_results_table(report));

        let tracker = Arc::clone(&self.tracker);
        let owned = report.clone();
        tokio::task::spawn_blocking(move || track(tracker.as_ref(), &owned))
            .await
            .map_err(|e| internal_error!("Tracking task failed: {}", e))??;

        let notification = Notification::new(self.title.clone(), compose_message(report));
        tracing::debug!("Notifying via {}", self.notifier.name());
        self.notifier.notify(&notification).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::MemoryNotifier;
    use crate::tracking::MemoryTracker;
    use chrono::Utc;
    use ncv_types::{AlgorithmKind, FinalModelRecord, ParamSet, ParameterValue};
    use std::collections::BTreeMap;

    fn report() -> RunReport {
        RunReport {
            experiment: "ncv_duration".to_string(),
            duration_seconds: 3.14159,
            tags: BTreeMap::from([
                ("implementation".to_string(), "rust".to_string()),
                ("method".to_string(), "raschka".to_string()),
            ]),
            record: FinalModelRecord {
                algorithm: AlgorithmKind::ElasticNet,
                params: ParamSet::new()
                    .with("alpha", ParameterValue::Float(0.001))
                    .with("l1_ratio", ParameterValue::Float(0.25)),
                kfold_error: 0.1,
                outer_fold_error: 0.2,
                train_error: 0.09,
                test_error: 0.11,
            },
            outer_results: Vec::new(),
            finished_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn reporter_tracks_then_notifies() {
        let tracker = Arc::new(MemoryTracker::new());
        let notifier = Arc::new(MemoryNotifier::new());
        let reporter = StandardReporter::new(tracker.clone(), notifier.clone());

        reporter.report(&report()).await.unwrap();

        let runs = tracker.runs();
        assert_eq!(runs.len(), 1);
        let run = &runs[0];
        assert_eq!(run.handle.experiment, "ncv_duration");
        assert_eq!(run.handle.status, RunStatus::Finished);
        assert_eq!(run.metrics[DURATION_METRIC].len(), 1);
        assert!((run.metrics[DURATION_METRIC][0] - 3.14).abs() < 1e-9);
        assert_eq!(run.tags["implementation"], "rust");
        assert_eq!(run.tags["method"], "raschka");
        assert_eq!(run.artifacts[FINAL_MODEL_ARTIFACT]["algorithm"], "ElasticNet");

        let sent = notifier.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].title, DEFAULT_NOTIFICATION_TITLE);
        assert!(sent[0].body.contains("The chosen algorithm was Elastic Net"));
        assert!(sent[0].body.contains("Test Error: 0.11"));
    }

    /// Delegates to a memory store but refuses every tag.
    struct TagRejectingTracker(MemoryTracker);

    impl ExperimentTracker for TagRejectingTracker {
        fn start_run(&self, experiment: &str) -> NcvResult<RunHandle> {
            self.0.start_run(experiment)
        }

        fn log_metric(&self, run: &RunHandle, key: &str, value: f64) -> NcvResult<()> {
            self.0.log_metric(run, key, value)
        }

        fn set_tag(&self, _run: &RunHandle, key: &str, _value: &str) -> NcvResult<()> {
            Err(ncv_types::ReportError::Tracking {
                message: format!("tag store unavailable for '{key}'"),
            }
            .into())
        }

        fn log_artifact(&self, run: &RunHandle, name: &str, contents: &serde_json::Value) -> NcvResult<()> {
            self.0.log_artifact(run, name, contents)
        }

        fn terminate_run(&self, run: &mut RunHandle, status: RunStatus) -> NcvResult<()> {
            self.0.terminate_run(run, status)
        }
    }

    #[tokio::test]
    async fn failed_write_still_closes_the_run() {
        let tracker = Arc::new(TagRejectingTracker(MemoryTracker::new()));
        let notifier = Arc::new(MemoryNotifier::new());
        let reporter = StandardReporter::new(tracker.clone(), notifier.clone());

        let err = reporter.report(&report()).await.unwrap_err();
        assert!(matches!(
            err,
            ncv_types::NcvError::Report(ncv_types::ReportError::Tracking { .. })
        ));

        let runs = tracker.0.runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].handle.status, RunStatus::Failed);
        assert!(runs[0].handle.end_time.is_some());
        assert_eq!(runs[0].metrics[DURATION_METRIC].len(), 1);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn custom_title_is_used() {
        let notifier = Arc::new(MemoryNotifier::new());
        StandardReporter::new(Arc::new(MemoryTracker::new()), notifier.clone())
            .with_title("done")
            .report(&report())
            .await
            .unwrap();
        assert_eq!(notifier.sent()[0].title, "done");
    }
}
