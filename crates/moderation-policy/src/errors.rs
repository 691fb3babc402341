use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(String),
    #[error("failed to parse configuration: {0}")]
    Parse(String),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("invalid url for {field}: {value:?}")]
    InvalidUrl { field: String, value: String },
    #[error("unsupported configuration path: {0}")]
    UnsupportedPath(String),
    #[error("invalid value for {path}: {detail}")]
    InvalidValue { path: String, detail: String },
}
