use thiserror::Error;

/// Errors surfaced by the command layer and by configuration loading.
///
/// Store operations themselves never fail. The `Display` text of the
/// command variants is exactly what the interpreter prints back.
#[derive(Error, Debug)]
pub enum TkvsError {
    #[error("need 2 arguments (key, value)")]
    NeedKeyValue,

    #[error("need 1 argument (key)")]
    NeedKey,

    #[error("unknown command")]
    UnknownCommand,

    #[error("empty command")]
    EmptyCommand,

    #[error("Config error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TkvsError>;
