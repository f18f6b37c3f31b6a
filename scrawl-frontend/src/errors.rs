use thiserror::Error;

use scrawl_engine::EngineError;
use scrawl_io::IoError;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("格子像素尺寸必须大于 0")]
    InvalidTileSize,
}
