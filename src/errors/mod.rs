//! Errores del crate, separados por momento en que pueden ocurrir:
//! - `SetupError`: construcción de la factoría (fatales, inmediatos).
//! - `PipelineError`: ejecución de un pipeline (cortocircuitan etapas).

pub mod pipeline_error;
pub mod setup_error;

pub use pipeline_error::PipelineError;
pub use setup_error::SetupError;
