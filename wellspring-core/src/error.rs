use thiserror::Error;

#[derive(Error, Debug)]
pub enum WellspringError {
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Upstream error: {0}")]
    Upstream(#[from] crate::completion::UpstreamError),

    #[error("Other error: {0}")]
    Other(String),
}
