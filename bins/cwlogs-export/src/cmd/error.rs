use log_export::{ConfigError, ExportError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("{0}")]
    ConfigFile(String),

    #[error("{0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Export(#[from] ExportError),
}
