pub mod assemble;
pub mod door;
pub mod extract;
pub mod layers;
pub mod normalize;
pub mod pipeline;
pub mod portal;

pub mod errors {
    use thiserror::Error;

    #[derive(Debug, Error)]
    pub enum EngineError {
        #[error("geometry {0} is referenced by a layer but missing from the geometry table")]
        MissingGeometry(String),
        #[error("invalid document structure at data.geometry.{id}: {reason}")]
        MalformedGeometry { id: String, reason: String },
        #[error("source units per cell must be a positive finite number, got {0}")]
        InvalidScale(f64),
    }
}

pub use errors::EngineError;
pub use pipeline::{Conversion, ConversionOptions, ConversionReport, ConversionRun, convert};
