//! Estado mutable que fluye por el pipeline.
//!
//! `State` es un mapeo abierto `String -> serde_json::Value` con orden de
//! inserción estable (IndexMap), de modo que los merges y los mensajes de
//! error derivados de él sean deterministas. Dos claves están reservadas:
//! - `config`: antes de la resolución remota, lista de claves a resolver;
//!   la resolución la consume y la elimina.
//! - `stage`: identificador de despliegue/entorno (string).

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{CONFIG_KEY, STAGE_KEY};

/// Mapeo abierto de estado. Cada etapa del pipeline lo consume por valor y
/// devuelve uno nuevo; nunca queda retenido en la factoría.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct State {
    values: IndexMap<String, Value>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    /// Construye un estado desde un `Value` JSON; falla si no es un objeto.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(map) => Some(Self { values: map.into_iter().collect() }),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Stage efectivo declarado en el propio estado, si existe y es string.
    pub fn stage(&self) -> Option<&str> {
        self.values.get(STAGE_KEY).and_then(Value::as_str)
    }

    pub fn set_stage(&mut self, stage: impl Into<String>) {
        self.values.insert(STAGE_KEY.to_string(), Value::String(stage.into()));
    }

    /// Lista de claves `config` a resolver, sin consumirla.
    ///
    /// Devuelve `None` si la clave no existe; entradas no-string dentro de la
    /// lista se ignoran en lugar de abortar, el backend sólo entiende strings.
    pub fn config_keys(&self) -> Option<Vec<String>> {
        let raw = self.values.get(CONFIG_KEY)?;
        match raw {
            Value::Array(items) => Some(items.iter()
                                             .filter_map(Value::as_str)
                                             .map(str::to_string)
                                             .collect()),
            _ => Some(Vec::new()),
        }
    }

    /// Elimina la lista `config` del estado, una vez consumida (o descartada).
    pub fn remove_config(&mut self) -> Option<Value> {
        self.values.shift_remove(CONFIG_KEY)
    }

    /// Merge de `other` sobre `self`: las claves de `other` sobreescriben las
    /// existentes con el mismo nombre.
    pub fn merge(&mut self, other: impl IntoIterator<Item = (String, Value)>) {
        for (k, v) in other {
            self.values.insert(k, v);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.values
    }
}

impl FromIterator<(String, Value)> for State {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self { values: iter.into_iter().collect() }
    }
}
