//! configflow
//!
//! Helper de bootstrap de configuración: a partir de un estado inicial,
//! opcionalmente lo aumenta con valores resueltos desde un backend remoto
//! clave-valor (por clave de config y stage de despliegue), aplica un
//! overlay local y lo hace pasar por una secuencia ordenada de pasos
//! falibles aportados por el caller, devolviendo el estado acumulado o el
//! primer error.
//!
//! La factoría se construye una vez y es de sólo lectura; cada invocación
//! del pipeline es independiente. Una petición batched al backend por
//! invocación, sin caché, sin reintentos, sin paginación.
//!
//! ```no_run
//! use std::sync::Arc;
//! use configflow::{FnStep, MemoryBackend, Options, Pipeline, State};
//! use serde_json::json;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = MemoryBackend::default().with_record("db_url", "staging", "postgres://staging");
//! let pipeline = Pipeline::builder(Options::new().with_keyvalue_backend())
//!     .backend(Arc::new(backend))
//!     .build()?;
//!
//! let initial = State::from_value(json!({"config": ["db_url"], "stage": "staging"})).unwrap();
//! let steps = vec![FnStep::boxed("touch", |mut s: configflow::State| {
//!     s.insert("ready", json!(true));
//!     Ok(s)
//! })];
//! let outcome = pipeline.run(initial, &steps).await?;
//! assert_eq!(outcome.state.get("db_url"), Some(&json!("postgres://staging")));
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod config;
pub mod constants;
pub mod errors;
pub mod overlay;
pub mod pipeline;
pub mod state;

pub use backend::{BackendError, BatchGetResponse, CompositeKey, KeyValueBackend, MemoryBackend, RemoteRecord};
pub use config::{BackendKind, FieldTriple, KeyValueOptions, Options, RemoteOptions};
pub use errors::{PipelineError, SetupError};
pub use overlay::Overlay;
pub use pipeline::{FnStep, Pipeline, PipelineBuilder, PipelineStep, RunFailure, RunOutcome, RunReport, StageReport,
                   StageStatus};
pub use state::State;
