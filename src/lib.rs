pub mod api;
pub mod batch;
pub mod config;
pub mod errors;
pub mod extractor;
pub mod flex_value;
pub mod model;
pub mod orchestrator;
pub mod probe;
pub mod report;
pub mod search;
pub mod series;

pub use batch::{probe_credentials, run_batch};
pub use extractor::extract;
