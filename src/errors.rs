use thiserror::Error;

/// A derived number that cannot be represented or is outside its domain.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CalculationError {
    #[error("{what} overflowed")]
    Overflow { what: &'static str },

    #[error("{field} is negative: {value}")]
    Negative { field: &'static str, value: String },

    #[error("fixed-point scale {0} exceeds the supported maximum of 28")]
    ScaleTooLarge(u32),
}

/// An adapter could not produce a reading for one entity.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("rpc call {call} failed: {reason}")]
    Rpc { call: &'static str, reason: String },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("graphql errors: {0}")]
    GraphQl(String),

    #[error("no data returned for {0}")]
    Missing(String),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },

    #[error("no adapter registered for source {0}")]
    NoAdapter(String),

    #[error("adapter call timed out after {0}s")]
    Timeout(u64),

    #[error(transparent)]
    Calculation(#[from] CalculationError),
}

/// The transport failed to deliver a message.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("{sink} rejected message with status {status}: {body}")]
    Rejected {
        sink: &'static str,
        status: u16,
        body: String,
    },

    #[error("telegram api error: {0}")]
    Telegram(String),
}

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed reading config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed parsing TOML config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
