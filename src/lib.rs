pub mod alert;
pub mod config;
pub mod errors;
pub mod logging;
pub mod metrics;
pub mod output;
pub mod scheduler;
pub mod sources;
