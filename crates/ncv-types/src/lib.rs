pub mod errors;
pub mod hyperparams;
pub mod dataset;
pub mod records;
pub mod config;

pub use errors::*;
pub use hyperparams::*;
pub use dataset::*;
pub use records::*;
pub use config::*;
