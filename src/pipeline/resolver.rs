//! Etapa de resolución remota de configuración.
//!
//! Si el estado trae una lista `config` no vacía, se emite exactamente un
//! batch-get contra el backend con una clave compuesta (clave, stage) por
//! entrada, se aplanan los registros devueltos al par clave -> valor con el
//! triple de campos configurado y se mergean en el estado. Una vez consumida
//! (o descartada por vacía), la lista `config` se elimina del estado.
//!
//! Política de error (sin reintentos, sin paginación):
//! - sin stage efectivo: error antes de tocar la red, estado intacto;
//! - error de transporte/consulta: sube tal cual;
//! - claves sin procesar en la respuesta: error descriptivo de límite;
//! - modo estricto con claves no resueltas: error que las nombra todas, en
//!   el orden pedido, devolviendo igualmente el estado parcialmente mergeado
//!   (ya sin `config`).

use indexmap::IndexSet;

use crate::backend::{CompositeKey, KeyValueBackend, RemoteRecord};
use crate::config::ResolvedRemoteConfig;
use crate::errors::PipelineError;
use crate::state::State;

/// La etapa, prestada desde la factoría para una invocación concreta.
pub(crate) struct RemoteResolver<'a> {
    pub config: &'a ResolvedRemoteConfig,
    pub backend: &'a dyn KeyValueBackend,
    pub default_stage: Option<&'a str>,
    pub err_on_missing: bool,
}

impl RemoteResolver<'_> {
    /// Resuelve la lista `config` del estado, si la hay.
    ///
    /// En caso de error devuelve también el estado tal como quedó, para que
    /// el caller pueda inspeccionarlo (en particular el merge parcial del
    /// modo estricto).
    pub async fn resolve(&self, mut state: State) -> Result<State, (PipelineError, State)> {
        let keys = state.config_keys().unwrap_or_default();
        if keys.is_empty() {
            state.remove_config();
            return Ok(state);
        }

        // el stage se valida antes de consumir `config` y antes de tocar la
        // red: en este fallo el estado vuelve tal como entró
        let stage = state.stage().or(self.default_stage).map(str::to_string);
        let Some(stage) = stage else {
            return Err((PipelineError::MissingStage, state));
        };

        let composite: Vec<CompositeKey> = keys.iter()
                                               .map(|k| CompositeKey::new(k.clone(), stage.clone()))
                                               .collect();

        let response = match self.backend.batch_get(&self.config.table, &composite).await {
            Ok(resp) => resp,
            Err(e) => return Err((PipelineError::Backend(e), state)),
        };

        if !response.unprocessed_keys.is_empty() {
            let unprocessed = response.unprocessed_keys.len();
            return Err((PipelineError::TooManyKeys { unprocessed }, state));
        }

        let mut resolved = IndexSet::new();
        for record in &response.records {
            if let Some((key, value)) = self.flatten(record) {
                resolved.insert(key.clone());
                state.insert(key, value);
            }
        }
        state.remove_config();

        if self.err_on_missing {
            let missing: Vec<String> = keys.iter()
                                           .filter(|k| !resolved.contains(*k))
                                           .cloned()
                                           .collect();
            if !missing.is_empty() {
                return Err((PipelineError::MissingKeys { keys: missing }, state));
            }
        }

        Ok(state)
    }

    /// Aplana un registro remoto al par (clave de config, valor) usando el
    /// triple de campos fijado en construcción. Registros sin campo clave
    /// string se descartan.
    fn flatten(&self, record: &RemoteRecord) -> Option<(String, serde_json::Value)> {
        let key = record.field_str(&self.config.fields.key)?.to_string();
        let value = record.fields.get(&self.config.fields.value).cloned()?;
        Some((key, value))
    }
}
