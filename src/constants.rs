//! Constantes del pipeline de bootstrap.
//!
//! Valores fijos del contrato con el backend remoto y de las claves
//! reservadas del estado. Cambiarlos altera el contrato observable.

/// Clave reservada del estado: lista de claves de configuración a resolver.
pub const CONFIG_KEY: &str = "config";

/// Clave reservada del estado: stage de despliegue ("staging", "production"...).
pub const STAGE_KEY: &str = "stage";

/// Variable de entorno consultada para derivar el stage por defecto cuando el
/// estado inicial no trae uno.
pub const STAGE_ENV_VAR: &str = "STAGE";

/// Máximo de claves compuestas que el backend acepta en un batch. Superarlo
/// produce claves sin procesar y el pipeline lo trata como fallo duro, sin
/// paginación.
pub const MAX_BATCH_KEYS: usize = 100;

/// Tabla por defecto del backend clave-valor.
pub const DEFAULT_TABLE: &str = "Config";

/// Triple de campos por defecto del backend clave-valor: campo-clave,
/// campo-stage, campo-valor.
pub const DEFAULT_FIELDS: [&str; 3] = ["key", "stage", "value"];
