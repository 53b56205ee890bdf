use std::path::PathBuf;

use thiserror::Error;

/// Errores al construir la factoría del pipeline. Todos son fatales: se
/// devuelven inmediatamente y no llega a existir pipeline.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no config backend specified in options")]
    NoBackend,
    #[error("unrecognized config backend '{0}'")]
    UnrecognizedBackend(String),
    #[error("config backend '{0}' configured but no backend instance was provided")]
    BackendInstanceMissing(String),
    #[error("config file {path}: {source}")]
    OverlayIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config file {path} could not be parsed: {message}")]
    OverlayParse { path: PathBuf, message: String },
    #[error("config file {0} has an unsupported extension (expected json, yaml, yml or toml)")]
    UnsupportedOverlayFormat(PathBuf),
    #[error("config file {0} must contain a top-level mapping")]
    OverlayNotAMapping(PathBuf),
}
