//! Overlay local de configuración.
//!
//! Un archivo de ajustes (json / yaml / yml / toml) se parsea una única vez
//! al construir la factoría y se aplica después de la resolución remota, con
//! precedencia sobre los valores ya presentes en el estado. El orden
//! resolución → overlay es parte del contrato observable: invertirlo
//! cambiaría qué valores ganan.

use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::Value;

use crate::errors::SetupError;
use crate::state::State;

/// Mapeo de overlay ya parseado, listo para mergear sobre el estado.
pub type Overlay = IndexMap<String, Value>;

/// Carga y parsea el archivo de overlay según su extensión.
pub fn load_overlay(path: &Path) -> Result<Overlay, SetupError> {
    let raw = fs::read_to_string(path).map_err(|source| SetupError::OverlayIo { path: path.to_path_buf(),
                                                                               source })?;

    let ext = path.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase);
    let value = match ext.as_deref() {
        Some("json") => serde_json::from_str::<Value>(&raw).map_err(|e| parse_error(path, e))?,
        Some("yaml") | Some("yml") => serde_yaml::from_str::<Value>(&raw).map_err(|e| parse_error(path, e))?,
        Some("toml") => {
            let table: toml::Table = raw.parse().map_err(|e| parse_error(path, e))?;
            serde_json::to_value(table).map_err(|e| parse_error(path, e))?
        }
        _ => return Err(SetupError::UnsupportedOverlayFormat(path.to_path_buf())),
    };

    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        _ => Err(SetupError::OverlayNotAMapping(path.to_path_buf())),
    }
}

fn parse_error(path: &Path, err: impl std::fmt::Display) -> SetupError {
    SetupError::OverlayParse { path: path.to_path_buf(),
                               message: err.to_string() }
}

/// Aplica el overlay sobre el estado: sus valores sobreescriben los campos
/// homónimos ya presentes. Sin modos de fallo.
pub fn apply_overlay(state: &mut State, overlay: &Overlay) {
    state.merge(overlay.iter().map(|(k, v)| (k.clone(), v.clone())));
}
