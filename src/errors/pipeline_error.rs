use thiserror::Error;

use crate::backend::BackendError;

/// Errores en tiempo de ejecución del pipeline. El primero que ocurre
/// cortocircuita las etapas restantes; ninguno se reintenta.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Se pidió resolución remota pero ni el estado ni las opciones aportan
    /// un stage. Se detecta antes de emitir la petición al backend.
    #[error("no stage set: remote config resolution requires a stage in state or a default_stage")]
    MissingStage,

    /// Error de transporte o consulta del backend, propagado tal cual.
    #[error("config backend request failed: {0}")]
    Backend(#[from] BackendError),

    /// El backend devolvió claves sin procesar (límite de tamaño o de
    /// cantidad por batch). Sin paginación ni reintento.
    #[error("batched config lookup exceeded the backend limit (100 keys or response size); {unprocessed} keys were left unprocessed")]
    TooManyKeys { unprocessed: usize },

    /// Modo estricto: claves pedidas sin registro remoto para el stage
    /// efectivo. Conserva el orden de la petición.
    #[error("missing remote config keys: {}", .keys.join(", "))]
    MissingKeys { keys: Vec<String> },

    /// Fallo de un paso aportado por el caller.
    #[error("step '{step}' failed: {message}")]
    Step { step: String, message: String },
}
