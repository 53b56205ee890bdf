//! El pipeline de bootstrap propiamente dicho.
//!
//! Composición secuencial de etapas falibles `State -> Result<State, _>`
//! plegadas de izquierda a derecha con salida temprana en el primer error:
//! - `runner`: la factoría (`Pipeline`) y la ejecución de una invocación.
//! - `resolver`: la etapa de resolución remota (batch-get + política de
//!   claves faltantes).
//! - `step`: interfaz de los pasos aportados por el caller.
//! - `report`: snapshot por ejecución (id, timestamps, estado por etapa).

pub mod report;
pub mod resolver;
pub mod runner;
pub mod step;

pub use report::{RunReport, StageReport, StageStatus};
pub use runner::{Pipeline, PipelineBuilder, RunFailure, RunOutcome};
pub use step::{FnStep, PipelineStep};
