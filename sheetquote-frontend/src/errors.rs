use sheetquote_config::ConfigError;
use sheetquote_engine::EngineError;
use sheetquote_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("failed to load configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("DXF parsing failed: {0}")]
    Parse(#[from] IoError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("failed to serialize quote report: {0}")]
    Report(#[from] serde_json::Error),
    #[error("failed to write quote output: {0}")]
    Output(#[from] std::io::Error),
}
