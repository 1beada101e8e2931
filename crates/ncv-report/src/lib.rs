//! # ncv-report
//!
//! Experiment tracking and end-of-run notifications.

pub mod notify;
pub mod sink;
pub mod summary;
pub mod tracking;

pub use notify::{LogNotifier, MemoryNotifier, Notification, Notifier, PushbulletNotifier};
pub use sink::{ReportSink, StandardReporter, DEFAULT_NOTIFICATION_TITLE};
pub use summary::compose_message;
pub use tracking::{ExperimentTracker, FileTracker, MemoryTracker, RunHandle, RunStatus};
