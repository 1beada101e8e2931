//! Run configuration: defaults, JSON file, environment overrides.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::NcvResult;
use crate::hyperparams::GridLayout;
use crate::{config_error, validation_error};

pub const ENV_CONFIG_PATH: &str = "NCV_CONFIG";
pub const ENV_DATA_PATH: &str = "NCV_DATA_PATH";
pub const ENV_ELASTIC_NET_GRID: &str = "NCV_ELASTIC_NET_GRID";
pub const ENV_RANDOM_FOREST_GRID: &str = "NCV_RANDOM_FOREST_GRID";
pub const ENV_TRACKING_DIR: &str = "NCV_TRACKING_DIR";
pub const ENV_EXPERIMENT: &str = "NCV_EXPERIMENT";
pub const ENV_PUSHBULLET_TOKEN: &str = "PUSHBULLET_TOKEN";

const DEFAULT_CONFIG_FILE: &str = "ncv.json";
const DEFAULT_ENV_FILE: &str = ".env";

/// Impurity measure used to grow regression trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitCriterion {
    SquaredError,
    AbsoluteError,
}

/// Where the summary notification goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifyMode {
    /// Pushbullet when a token is configured, the log otherwise.
    Auto,
    Pushbullet,
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitSettings {
    /// Fraction of rows held out as the test set.
    pub test_size: f64,
    pub seed: u64,
}

impl Default for SplitSettings {
    fn default() -> Self {
        Self {
            test_size: 0.2,
            seed: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CvSettings {
    pub outer_folds: usize,
    pub inner_folds: usize,
    /// Shuffle seed shared by every fold splitter, so all algorithms see the same splits.
    pub seed: u64,
    /// Seed for the order in which the randomized search visits candidates.
    pub search_seed: u64,
    /// Fit inner candidates on the rayon pool.
    pub parallel: bool,
    pub grid_layout: GridLayout,
}

impl Default for CvSettings {
    fn default() -> Self {
        Self {
            outer_folds: 5,
            inner_folds: 2,
            seed: 1,
            search_seed: 2019,
            parallel: true,
            grid_layout: GridLayout::Zipped,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub elastic_net_normalize: bool,
    pub elastic_net_max_iter: usize,
    pub elastic_net_tol: f64,
    pub forest_criterion: SplitCriterion,
    pub forest_seed: u64,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            elastic_net_normalize: true,
            elastic_net_max_iter: 1000,
            elastic_net_tol: 1e-4,
            forest_criterion: SplitCriterion::AbsoluteError,
            forest_seed: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportSettings {
    pub tracking_dir: PathBuf,
    /// Decimal places of the reported error figures.
    pub decimals: u32,
    pub tags: BTreeMap<String, String>,
    pub notification_title: String,
    pub notify: NotifyMode,
    #[serde(skip_serializing)]
    pub pushbullet_token: Option<String>,
}

impl Default for ReportSettings {
    fn default() -> Self {
        let mut tags = BTreeMap::new();
        tags.insert("implementation".to_string(), "rust".to_string());
        tags.insert("method".to_string(), "raschka".to_string());
        Self {
            tracking_dir: PathBuf::from("./mlruns"),
            decimals: 5,
            tags,
            notification_title: "Nested CV script finished".to_string(),
            notify: NotifyMode::Auto,
            pushbullet_token: None,
        }
    }
}

/// Top-level configuration passed explicitly into every stage of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub experiment_name: String,
    pub data_path: PathBuf,
    pub elastic_net_grid_path: PathBuf,
    pub random_forest_grid_path: PathBuf,
    pub split: SplitSettings,
    pub cv: CvSettings,
    pub models: ModelSettings,
    pub report: ReportSettings,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            experiment_name: "ncv_duration".to_string(),
            data_path: PathBuf::from("./data/fivek-simdat.csv"),
            elastic_net_grid_path: PathBuf::from("./grids/elast-latin-params.csv"),
            random_forest_grid_path: PathBuf::from("./grids/rf-latin-params.csv"),
            split: SplitSettings::default(),
            cv: CvSettings::default(),
            models: ModelSettings::default(),
            report: ReportSettings::default(),
        }
    }
}

impl ExperimentConfig {
    /// Read a JSON config file; absent fields keep their defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> NcvResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| config_error!("Failed to read {}: {}", path.display(), e))?;
        let config = serde_json::from_str(&text)?;
        tracing::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Defaults, then the JSON file named by `NCV_CONFIG` (or `./ncv.json` if
    /// present), then environment overrides. Variables missing from the
    /// process environment are looked up in `./.env`.
    pub fn from_env() -> NcvResult<Self> {
        let dotenv = read_dotenv(DEFAULT_ENV_FILE)?;
        Self::resolve(|key| std::env::var(key).ok().or_else(|| dotenv.get(key).cloned()))
    }

    /// [`ExperimentConfig::from_env`] with an injectable variable lookup.
    pub fn resolve<F>(lookup: F) -> NcvResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base = match lookup(ENV_CONFIG_PATH) {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::from_file(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };
        let config = base.with_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_DATA_PATH) {
            self.data_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_ELASTIC_NET_GRID) {
            self.elastic_net_grid_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_RANDOM_FOREST_GRID) {
            self.random_forest_grid_path = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_TRACKING_DIR) {
            self.report.tracking_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_EXPERIMENT) {
            self.experiment_name = v;
        }
        if let Some(v) = lookup(ENV_PUSHBULLET_TOKEN).filter(|t| !t.trim().is_empty()) {
            self.report.pushbullet_token = Some(v);
        }
        self
    }

    pub fn validate(&self) -> NcvResult<()> {
        if self.experiment_name.trim().is_empty() {
            return Err(validation_error!("experiment_name must not be empty"));
        }
        if !(self.split.test_size > 0.0 && self.split.test_size < 1.0) {
            return Err(validation_error!(
                "split.test_size must be in (0, 1), got {}",
                self.split.test_size
            ));
        }
        if self.cv.outer_folds < 2 || self.cv.inner_folds < 2 {
            return Err(validation_error!(
                "fold counts must be at least 2 (outer {}, inner {})",
                self.cv.outer_folds,
                self.cv.inner_folds
            ));
        }
        if self.report.decimals > 28 {
            return Err(validation_error!(
                "report.decimals must be at most 28, got {}",
                self.report.decimals
            ));
        }
        if self.report.notify == NotifyMode::Pushbullet && self.report.pushbullet_token.is_none() {
            return Err(config_error!(
                "notify mode is pushbullet but {} is not set",
                ENV_PUSHBULLET_TOKEN
            ));
        }
        Ok(())
    }
}

/// Parse `KEY=value` lines. Blank lines and `#` comments are skipped, an
/// `export ` prefix is allowed and matching outer quotes are stripped.
pub fn parse_dotenv(text: &str) -> BTreeMap<String, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// A missing file yields no variables.
fn read_dotenv<P: AsRef<Path>>(path: P) -> NcvResult<BTreeMap<String, String>> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(text) => {
            let vars = parse_dotenv(&text);
            tracing::debug!("Loaded {} variables from {}", vars.len(), path.display());
            Ok(vars)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(config_error!("Failed to read {}: {}", path.display(), e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_reference_run() {
        let config = ExperimentConfig::default();
        assert_eq!(config.experiment_name, "ncv_duration");
        assert_eq!(config.split.test_size, 0.2);
        assert_eq!(config.split.seed, 1);
        assert_eq!(config.cv.outer_folds, 5);
        assert_eq!(config.cv.inner_folds, 2);
        assert_eq!(config.models.forest_criterion, SplitCriterion::AbsoluteError);
        assert_eq!(config.report.tags.get("method").map(String::as_str), Some("raschka"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_apply() {
        let config = ExperimentConfig::default().with_overrides(lookup_from(&[
            (ENV_DATA_PATH, "/tmp/data.parquet"),
            (ENV_EXPERIMENT, "other"),
            (ENV_PUSHBULLET_TOKEN, "secret"),
        ]));
        assert_eq!(config.data_path, PathBuf::from("/tmp/data.parquet"));
        assert_eq!(config.experiment_name, "other");
        assert_eq!(config.report.pushbullet_token.as_deref(), Some("secret"));
    }

    #[test]
    fn dotenv_lines_are_parsed() {
        let vars = parse_dotenv(
            "# pushbullet\n\nPUSHBULLET_TOKEN=\"o.abc=123\"\nexport NCV_EXPERIMENT = nightly\n=orphan\nnoise\nNCV_DATA_PATH='data/x.csv'\n",
        );
        assert_eq!(vars.len(), 3);
        assert_eq!(vars[ENV_PUSHBULLET_TOKEN], "o.abc=123");
        assert_eq!(vars[ENV_EXPERIMENT], "nightly");
        assert_eq!(vars[ENV_DATA_PATH], "data/x.csv");
    }

    #[test]
    fn dotenv_token_reaches_config() {
        let dir = tempfile::TempDir::new().unwrap();
        let env_path = dir.path().join(".env");
        std::fs::write(&env_path, "PUSHBULLET_TOKEN=from-file\nNCV_EXPERIMENT=dotenv\n").unwrap();
        let dotenv = read_dotenv(&env_path).unwrap();
        let process = lookup_from(&[(ENV_EXPERIMENT, "process")]);

        let config = ExperimentConfig::default()
            .with_overrides(|key| process(key).or_else(|| dotenv.get(key).cloned()));
        assert_eq!(config.report.pushbullet_token.as_deref(), Some("from-file"));
        assert_eq!(config.experiment_name, "process");
    }

    #[test]
    fn missing_dotenv_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(read_dotenv(dir.path().join(".env")).unwrap().is_empty());
    }

    #[test]
    fn blank_token_is_ignored() {
        let config = ExperimentConfig::default()
            .with_overrides(lookup_from(&[(ENV_PUSHBULLET_TOKEN, "  ")]));
        assert!(config.report.pushbullet_token.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"cv": {{"outer_folds": 3}}, "report": {{"decimals": 3}}}}"#).unwrap();
        file.flush().unwrap();

        let path = file.path().to_string_lossy().to_string();
        let config = ExperimentConfig::resolve(lookup_from(&[(ENV_CONFIG_PATH, path.as_str())])).unwrap();
        assert_eq!(config.cv.outer_folds, 3);
        assert_eq!(config.cv.inner_folds, 2);
        assert_eq!(config.report.decimals, 3);
        assert_eq!(config.experiment_name, "ncv_duration");
    }

    #[test]
    fn invalid_settings_are_rejected() {
        let mut config = ExperimentConfig::default();
        config.split.test_size = 1.5;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.cv.inner_folds = 1;
        assert!(config.validate().is_err());

        let mut config = ExperimentConfig::default();
        config.report.notify = NotifyMode::Pushbullet;
        assert!(matches!(config.validate(), Err(crate::NcvError::Config(_))));
    }

    #[test]
    fn token_is_not_serialized() {
        let mut config = ExperimentConfig::default();
        config.report.pushbullet_token = Some("secret".into());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
