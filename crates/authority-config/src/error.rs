use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to merge configuration: {0}")]
    Merge(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
