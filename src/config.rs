//! Opciones de la factoría del pipeline.
//!
//! Registro inmutable, fijado una sola vez al construir la factoría y
//! compartido en sólo-lectura por todas las invocaciones. La selección de
//! backend y sus defaults (tabla, triple de campos) se resuelven aquí, en
//! construcción, nunca en tiempo de ejecución.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_FIELDS, DEFAULT_TABLE};
use crate::errors::SetupError;

/// Opciones reconocidas por la factoría. Deserializable para poder cargarlas
/// desde JSON/YAML/TOML con serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Options {
    /// Sección de configuración remota; `None` desactiva la resolución.
    #[serde(default)]
    pub config: Option<RemoteOptions>,
    /// Stage usado cuando el estado no declara uno.
    #[serde(default)]
    pub default_stage: Option<String>,
    /// Ruta a un archivo de overlay local, parseado en construcción según
    /// su extensión (json / yaml / yml / toml).
    #[serde(default)]
    pub config_file: Option<PathBuf>,
    /// Modo estricto: fallar si alguna clave pedida no tiene registro remoto.
    #[serde(default = "default_err_on_missing")]
    pub err_on_missing: bool,
}

fn default_err_on_missing() -> bool {
    true
}

impl Default for Options {
    fn default() -> Self {
        Self { config: None,
               default_stage: None,
               config_file: None,
               err_on_missing: true }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_keyvalue_backend(mut self) -> Self {
        self.config = Some(RemoteOptions { backend: Some(BackendKind::KEYVALUE_TAG.to_string()),
                                           keyvalue: None });
        self
    }

    pub fn with_default_stage(mut self, stage: impl Into<String>) -> Self {
        self.default_stage = Some(stage.into());
        self
    }

    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    pub fn with_err_on_missing(mut self, strict: bool) -> Self {
        self.err_on_missing = strict;
        self
    }

    /// Valida la sección remota y aplica los defaults del backend elegido.
    ///
    /// `Ok(None)` significa "sin resolución remota". Una sección presente sin
    /// backend reconocido es un error fatal de construcción.
    pub fn resolve_remote(&self) -> Result<Option<ResolvedRemoteConfig>, SetupError> {
        let Some(remote) = &self.config else {
            return Ok(None);
        };
        let tag = remote.backend.as_deref().ok_or(SetupError::NoBackend)?;
        let kind = BackendKind::from_tag(tag).ok_or_else(|| SetupError::UnrecognizedBackend(tag.to_string()))?;

        // Despacho por variante: cada backend aporta sus propios defaults.
        let resolved = match kind {
            BackendKind::KeyValue => {
                let settings = remote.keyvalue.clone().unwrap_or_default();
                ResolvedRemoteConfig { kind,
                                       table: settings.table.unwrap_or_else(|| DEFAULT_TABLE.to_string()),
                                       fields: settings.fields
                                                       .map(FieldTriple::from_array)
                                                       .unwrap_or_default() }
            }
        };
        Ok(Some(resolved))
    }
}

/// Sección `config` cruda, tal como llega del caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteOptions {
    pub backend: Option<String>,
    #[serde(default)]
    pub keyvalue: Option<KeyValueOptions>,
}

/// Ajustes específicos del backend clave-valor, todos opcionales.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyValueOptions {
    pub table: Option<String>,
    /// Triple ordenado: campo-clave, campo-stage, campo-valor.
    pub fields: Option<[String; 3]>,
}

/// Backends reconocidos. Hoy sólo el almacén clave-valor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    KeyValue,
}

impl BackendKind {
    pub const KEYVALUE_TAG: &'static str = "keyvalue";

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            Self::KEYVALUE_TAG => Some(Self::KeyValue),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Self::KeyValue => Self::KEYVALUE_TAG,
        }
    }
}

/// Triple de nombres de campo con los que el backend almacena cada registro.
/// Fijo por factoría: nunca cambia entre invocaciones.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTriple {
    pub key: String,
    pub stage: String,
    pub value: String,
}

impl FieldTriple {
    pub fn from_array(fields: [String; 3]) -> Self {
        let [key, stage, value] = fields;
        Self { key, stage, value }
    }
}

impl Default for FieldTriple {
    fn default() -> Self {
        let [key, stage, value] = DEFAULT_FIELDS;
        Self { key: key.to_string(),
               stage: stage.to_string(),
               value: value.to_string() }
    }
}

/// Configuración remota ya validada y con defaults aplicados.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRemoteConfig {
    pub kind: BackendKind,
    pub table: String,
    pub fields: FieldTriple,
}
