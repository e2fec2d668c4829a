use rfcap_types::RfcapError;
use thiserror::Error;

pub type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// Ошибка формата rfcap
    #[error("rfcap error: {0}")]
    Rfcap(#[from] RfcapError),

    /// Ошибка ввода/вывода
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Некорректный аргумент или конфигурация
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Ошибка сериализации вывода
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ошибка пайплайна (inter-thread)
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}
