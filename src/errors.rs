use thiserror::Error;

/// Errors that can occur during a migration run.
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error("scan error: {message} (path: {path})")]
    Scan { message: String, path: String },

    #[error("parse error: {message} (unit: {unit})")]
    Parse { message: String, unit: String },

    #[error("write error: {message} (path: {path})")]
    Write { message: String, path: String },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results using `MigrateError`.
pub type Result<T> = std::result::Result<T, MigrateError>;
