//! Backend clave-valor en memoria.
//!
//! Útil para desarrollo local y tests: respeta el contrato completo del
//! batch-get, incluido el límite de claves por batch (las que exceden el
//! límite vuelven como `unprocessed_keys`, igual que haría el backend real).

use std::collections::HashMap;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::backend::{BackendError, BatchGetResponse, CompositeKey, KeyValueBackend, RemoteRecord};
use crate::config::FieldTriple;
use crate::constants::MAX_BATCH_KEYS;

pub struct MemoryBackend {
    fields: FieldTriple,
    records: HashMap<(String, String), String>,
}

impl MemoryBackend {
    pub fn new(fields: FieldTriple) -> Self {
        Self { fields,
               records: HashMap::new() }
    }

    /// Inserta un valor para (clave, stage). Sobreescribe si ya existía.
    pub fn put(&mut self, key: impl Into<String>, stage: impl Into<String>, value: impl Into<String>) {
        self.records.insert((key.into(), stage.into()), value.into());
    }

    pub fn with_record(mut self,
                       key: impl Into<String>,
                       stage: impl Into<String>,
                       value: impl Into<String>)
                       -> Self {
        self.put(key, stage, value);
        self
    }

    fn record_for(&self, key: &CompositeKey, value: &str) -> RemoteRecord {
        let mut fields = IndexMap::new();
        fields.insert(self.fields.key.clone(), Value::String(key.key.clone()));
        fields.insert(self.fields.stage.clone(), Value::String(key.stage.clone()));
        fields.insert(self.fields.value.clone(), Value::String(value.to_string()));
        RemoteRecord::new(fields)
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new(FieldTriple::default())
    }
}

#[async_trait]
impl KeyValueBackend for MemoryBackend {
    fn get_name(&self) -> &str {
        "memory"
    }

    fn get_description(&self) -> &str {
        "In-memory key-value config backend for local use and tests"
    }

    async fn batch_get(&self, _table: &str, keys: &[CompositeKey]) -> Result<BatchGetResponse, BackendError> {
        let (processed, overflow) = if keys.len() > MAX_BATCH_KEYS {
            keys.split_at(MAX_BATCH_KEYS)
        } else {
            (keys, &[][..])
        };

        let records = processed.iter()
                               .filter_map(|k| {
                                   self.records
                                       .get(&(k.key.clone(), k.stage.clone()))
                                       .map(|v| self.record_for(k, v))
                               })
                               .collect();

        Ok(BatchGetResponse { records,
                              unprocessed_keys: overflow.to_vec() })
    }
}
