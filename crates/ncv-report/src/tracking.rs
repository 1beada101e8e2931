//! Experiment tracking: named experiments, runs, metrics, tags and artifacts.

use chrono::{DateTime, Utc};
use ncv_types::{validation_error, NcvResult, ReportError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    Running,
    Finished,
    Failed,
}

/// An open (or ended) tracking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHandle {
    pub run_id: Uuid,
    pub experiment: String,
    pub status: RunStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl RunHandle {
    fn new(experiment: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            experiment: experiment.to_string(),
            status: RunStatus::Running,
            start_time: Utc::now(),
            end_time: None,
        }
    }

    fn ensure_running(&self) -> NcvResult<()> {
        match self.status {
            RunStatus::Running => Ok(()),
            RunStatus::Finished | RunStatus::Failed => Err(ReportError::RunEnded {
                run_id: self.run_id.to_string(),
            }
            .into()),
        }
    }

    /// Move a running handle into the terminal `status`.
    fn close(&mut self, status: RunStatus) -> NcvResult<()> {
        self.ensure_running()?;
        if status == RunStatus::Running {
            return Err(validation_error!("run {} cannot be ended as running", self.run_id));
        }
        self.status = status;
        self.end_time = Some(Utc::now());
        Ok(())
    }
}

/// Records run results under a named experiment.
pub trait ExperimentTracker: Send + Sync {
    fn start_run(&self, experiment: &str) -> NcvResult<RunHandle>;

    fn log_metric(&self, run: &RunHandle, key: &str, value: f64) -> NcvResult<()>;

    fn set_tag(&self, run: &RunHandle, key: &str, value: &str) -> NcvResult<()>;

    /// Store a JSON document alongside the run.
    fn log_artifact(&self, run: &RunHandle, name: &str, contents: &serde_json::Value) -> NcvResult<()>;

    /// Close the run with a terminal status.
    fn terminate_run(&self, run: &mut RunHandle, status: RunStatus) -> NcvResult<()>;

    fn end_run(&self, run: &mut RunHandle) -> NcvResult<()> {
        self.terminate_run(run, RunStatus::Finished)
    }

    fn set_tags(&self, run: &RunHandle, tags: &BTreeMap<String, String>) -> NcvResult<()> {
        for (key, value) in tags {
            self.set_tag(run, key, value)?;
        }
        Ok(())
    }
}

// ---- File store ----

/// Local store laid out like an `mlruns` directory:
///
/// ```text
/// <root>/<experiment>/meta.json
/// <root>/<experiment>/<run_id>/meta.json
/// <root>/<experiment>/<run_id>/metrics/<key>     "<timestamp_ms> <value> <step>" per line
/// <root>/<experiment>/<run_id>/tags/<key>
/// <root>/<experiment>/<run_id>/artifacts/<name>.json
/// ```
#[derive(Debug, Clone)]
pub struct FileTracker {
    root: PathBuf,
}

#[derive(Debug, Serialize, Deserialize)]
struct ExperimentMeta {
    name: String,
    created_at: DateTime<Utc>,
}

impl FileTracker {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run_dir(&self, run: &RunHandle) -> PathBuf {
        self.root.join(&run.experiment).join(run.run_id.to_string())
    }

    fn write_meta(&self, run: &RunHandle) -> NcvResult<()> {
        let path = self.run_dir(run).join("meta.json");
        fs::write(path, serde_json::to_string_pretty(run)?)?;
        Ok(())
    }

    fn check_key(key: &str) -> NcvResult<()> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | ' '))
            && key != "."
            && key != "..";
        if valid {
            Ok(())
        } else {
            Err(ReportError::Tracking {
                message: format!("invalid key '{key}'"),
            }
            .into())
        }
    }
}

impl ExperimentTracker for FileTracker {
    fn start_run(&self, experiment: &str) -> NcvResult<RunHandle> {
        Self::check_key(experiment)?;
        let experiment_dir = self.root.join(experiment);
        fs::create_dir_all(&experiment_dir)?;

        let meta_path = experiment_dir.join("meta.json");
        if !meta_path.exists() {
            let meta = ExperimentMeta {
                name: experiment.to_string(),
                created_at: Utc::now(),
            };
            fs::write(&meta_path, serde_json::to_string_pretty(&meta)?)?;
            tracing::info!("Created experiment '{}' at {}", experiment, experiment_dir.display());
        }

        let run = RunHandle::new(experiment);
        let run_dir = self.run_dir(&run);
        for sub in ["metrics", "tags", "artifacts"] {
            fs::create_dir_all(run_dir.join(sub))?;
        }
        self.write_meta(&run)?;
        tracing::debug!("Started run {} in experiment '{}'", run.run_id, experiment);
        Ok(run)
    }

    fn log_metric(&self, run: &RunHandle, key: &str, value: f64) -> NcvResult<()> {
        run.ensure_running()?;
        Self::check_key(key)?;
        let path = self.run_dir(run).join("metrics").join(key);
        let step = if path.exists() {
            fs::read_to_string(&path)?.lines().count()
        } else {
            0
        };
        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        writeln!(file, "{} {} {}", Utc::now().timestamp_millis(), value, step)?;
        Ok(())
    }

    fn set_tag(&self, run: &RunHandle, key: &str, value: &str) -> NcvResult<()> {
        run.ensure_running()?;
        Self::check_key(key)?;
        fs::write(self.run_dir(run).join("tags").join(key), value)?;
        Ok(())
    }

    fn log_artifact(&self, run: &RunHandle, name: &str, contents: &serde_json::Value) -> NcvResult<()> {
        run.ensure_running()?;
        Self::check_key(name)?;
        let path = self.run_dir(run).join("artifacts").join(format!("{name}.json"));
        fs::write(path, serde_json::to_string_pretty(contents)?)?;
        Ok(())
    }

    fn terminate_run(&self, run: &mut RunHandle, status: RunStatus) -> NcvResult<()> {
        run.close(status)?;
        self.write_meta(run)?;
        tracing::info!("Ended run {} as {:?} ({})", run.run_id, status, self.run_dir(run).display());
        Ok(())
    }
}

// ---- In-memory store ----

/// Everything logged to one run of a [`MemoryTracker`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRun {
    pub handle: RunHandle,
    pub metrics: BTreeMap<String, Vec<f64>>,
    pub tags: BTreeMap<String, String>,
    pub artifacts: BTreeMap<String, serde_json::Value>,
}

/// Tracker that keeps runs in memory; no file system involved.
#[derive(Debug, Default)]
pub struct MemoryTracker {
    runs: Mutex<Vec<RecordedRun>>,
}

impl MemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> Vec<RecordedRun> {
        self.runs.lock().clone()
    }

    fn with_run<F>(&self, run: &RunHandle, f: F) -> NcvResult<()>
    where
        F: FnOnce(&mut RecordedRun),
    {
        run.ensure_running()?;
        self.update(run.run_id, f)
    }

    fn update<F>(&self, run_id: Uuid, f: F) -> NcvResult<()>
    where
        F: FnOnce(&mut RecordedRun),
    {
        let mut runs = self.runs.lock();
        let recorded = runs
            .iter_mut()
            .find(|r| r.handle.run_id == run_id)
            .ok_or_else(|| ReportError::Tracking {
                message: format!("unknown run {run_id}"),
            })?;
        f(recorded);
        Ok(())
    }
}

impl ExperimentTracker for MemoryTracker {
    fn start_run(&self, experiment: &str) -> NcvResult<RunHandle> {
        let run = RunHandle::new(experiment);
        self.runs.lock().push(RecordedRun {
            handle: run.clone(),
            metrics: BTreeMap::new(),
            tags: BTreeMap::new(),
            artifacts: BTreeMap::new(),
        });
        Ok(run)
    }

    fn log_metric(&self, run: &RunHandle, key: &str, value: f64) -> NcvResult<()> {
        self.with_run(run, |r| r.metrics.entry(key.to_string()).or_default().push(value))
    }

    fn set_tag(&self, run: &RunHandle, key: &str, value: &str) -> NcvResult<()> {
        self.with_run(run, |r| {
            r.tags.insert(key.to_string(), value.to_string());
        })
    }

    fn log_artifact(&self, run: &RunHandle, name: &str, contents: &serde_json::Value) -> NcvResult<()> {
        self.with_run(run, |r| {
            r.artifacts.insert(name.to_string(), contents.clone());
        })
    }

    fn terminate_run(&self, run: &mut RunHandle, status: RunStatus) -> NcvResult<()> {
        run.close(status)?;
        let ended = run.clone();
        self.update(run.run_id, move |r| r.handle = ended)
    }
}
