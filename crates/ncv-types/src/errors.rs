use thiserror::Error;

/// Main error type for the nested-CV benchmark
#[derive(Error, Debug)]
pub enum NcvError {
    #[error("Data error: {0}")]
    Data(#[from] DataError),

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Tuning error: {0}")]
    Tuning(#[from] TuningError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Arrow error: {0}")]
    Arrow(String),

    #[error("Parquet error: {0}")]
    Parquet(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Input table errors
#[derive(Error, Debug)]
pub enum DataError {
    #[error("Data source not found: {0}")]
    SourceNotFound(String),

    #[error("Unsupported file format: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Invalid data format: {message}")]
    InvalidFormat { message: String },

    #[error("Missing value in column {column} at row {row}")]
    MissingValue { column: String, row: usize },

    #[error("Insufficient data: {message}")]
    InsufficientData { message: String },

    #[error("Data loading failed: {message}")]
    LoadingFailed { message: String },

    #[error("Data parsing error: {message}")]
    ParseError { message: String },
}

/// Hyperparameter grid errors
#[derive(Error, Debug)]
pub enum GridError {
    #[error("Grid for {algorithm} has no candidates")]
    Empty { algorithm: String },

    #[error("Parameter table for {algorithm} is missing column '{column}'")]
    MissingColumn { algorithm: String, column: String },

    #[error("Grid axes have different lengths: {message}")]
    LengthMismatch { message: String },

    #[error("Invalid value for {parameter}: {message}")]
    InvalidValue { parameter: String, message: String },
}

/// Estimator errors
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model is not fitted")]
    NotFitted,

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeMismatch { expected: String, actual: String },

    #[error("Missing hyperparameter: {parameter}")]
    MissingParameter { parameter: String },

    #[error("Invalid hyperparameter {parameter}: {message}")]
    InvalidParameter { parameter: String, message: String },

    #[error("Fit failed: {message}")]
    FitFailed { message: String },
}

/// Cross-validation and search errors
#[derive(Error, Debug)]
pub enum TuningError {
    #[error("n_splits must be at least 2, got {n_splits}")]
    TooFewSplits { n_splits: usize },

    #[error("Cannot split {n_samples} samples into {n_splits} folds")]
    TooFewSamples { n_samples: usize, n_splits: usize },

    #[error("Search produced no candidates for {algorithm}")]
    NoCandidates { algorithm: String },

    #[error("No candidate produced a finite score for {algorithm}")]
    NoFiniteScore { algorithm: String },

    #[error("No algorithms to select from")]
    NothingToSelect,
}

/// Tracking and notification errors
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Tracking store error: {message}")]
    Tracking { message: String },

    #[error("Run {run_id} is already ended")]
    RunEnded { run_id: String },

    #[error("Notification failed: {message}")]
    Notification { message: String },

    #[error("Missing credential: {variable}")]
    MissingCredential { variable: String },
}

/// Result type alias for benchmark operations
pub type NcvResult<T> = Result<T, NcvError>;

/// Macro for creating validation errors
#[macro_export]
macro_rules! validation_error {
    ($($arg:tt)*) => {
        $crate::NcvError::Validation(format!($($arg)*))
    };
}

/// Macro for creating internal errors
#[macro_export]
macro_rules! internal_error {
    ($($arg:tt)*) => {
        $crate::NcvError::Internal(format!($($arg)*))
    };
}

/// Macro for creating configuration errors
#[macro_export]
macro_rules! config_error {
    ($($arg:tt)*) => {
        $crate::NcvError::Config(format!($($arg)*))
    };
}
