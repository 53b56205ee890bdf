//! Contrato con el backend remoto clave-valor.
//!
//! El almacén de configuración es un colaborador externo: este módulo sólo
//! fija la forma de la única operación que el pipeline usa, un batch-get por
//! tabla y lista de claves compuestas (clave de config, stage). La respuesta
//! trae los registros encontrados más las claves que el backend no llegó a
//! procesar en el batch (límite de tamaño/cantidad).

pub mod implementations;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use implementations::memory::MemoryBackend;

/// Clave compuesta de un registro remoto: (clave de config, stage).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompositeKey {
    pub key: String,
    pub stage: String,
}

impl CompositeKey {
    pub fn new(key: impl Into<String>, stage: impl Into<String>) -> Self {
        Self { key: key.into(),
               stage: stage.into() }
    }
}

/// Un registro devuelto por el backend: mapeo nombre-de-campo -> valor, con
/// los tres campos configurados (clave, stage, valor) entre sus entradas.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub fields: IndexMap<String, Value>,
}

impl RemoteRecord {
    pub fn new(fields: IndexMap<String, Value>) -> Self {
        Self { fields }
    }

    pub fn field_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

/// Respuesta de un batch-get: registros encontrados y claves sin procesar.
/// `unprocessed_keys` no vacío señala que el batch superó el límite del
/// backend; el pipeline lo trata como fallo duro.
#[derive(Debug, Clone, Default)]
pub struct BatchGetResponse {
    pub records: Vec<RemoteRecord>,
    pub unprocessed_keys: Vec<CompositeKey>,
}

/// Errores del backend, propagados tal cual al pipeline.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("query: {0}")]
    Query(String),
}

/// Trait que implementa un almacén remoto de configuración.
///
/// Implementaciones deben ser `Send + Sync`: una misma factoría puede tener
/// varias invocaciones del pipeline en vuelo, cada una con su propio
/// batch-get independiente.
#[async_trait]
pub trait KeyValueBackend: Send + Sync {
    fn get_name(&self) -> &str;

    fn get_description(&self) -> &str;

    /// Una petición batched contra `table` con las claves compuestas dadas.
    /// Sin reintentos: errores de transporte/consulta suben sin tocar.
    async fn batch_get(&self, table: &str, keys: &[CompositeKey]) -> Result<BatchGetResponse, BackendError>;
}
