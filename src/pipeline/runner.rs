//! Factoría y ejecución del pipeline de bootstrap.
//!
//! La factoría (`Pipeline`) se construye una sola vez: valida la sección de
//! backend, aplica defaults y pre-carga el overlay local. Cada invocación de
//! `run` crea su estado fresco y recorre las etapas en orden fijo:
//! seed → resolución remota → overlay → pasos del caller. Invocaciones
//! concurrentes desde la misma factoría son independientes; no hay estado
//! mutable compartido.

use std::env;
use std::sync::Arc;

use chrono::Utc;
use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::backend::KeyValueBackend;
use crate::config::{Options, ResolvedRemoteConfig};
use crate::constants::STAGE_ENV_VAR;
use crate::errors::{PipelineError, SetupError};
use crate::overlay::{apply_overlay, load_overlay, Overlay};
use crate::pipeline::report::{ReportBuilder, RunReport};
use crate::pipeline::resolver::RemoteResolver;
use crate::pipeline::step::PipelineStep;
use crate::state::State;

// Carga perezosa del archivo .env una sola vez; si no existe se ignora.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv();
});

fn stage_from_env() -> Option<String> {
    Lazy::force(&DOTENV_LOADED);
    env::var(STAGE_ENV_VAR).ok().filter(|s| !s.is_empty())
}

/// Resultado de una invocación exitosa.
#[derive(Debug)]
pub struct RunOutcome {
    pub state: State,
    pub report: RunReport,
}

/// Resultado de una invocación fallida: el primer error junto con el estado
/// tal como quedó al fallar (merge parcial incluido), para inspección.
#[derive(Debug)]
pub struct RunFailure {
    pub error: PipelineError,
    pub state: State,
    pub report: RunReport,
}

impl std::fmt::Display for RunFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for RunFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Factoría inmutable del pipeline. `Send + Sync`: puede compartirse entre
/// tareas y cada `run` es independiente.
pub struct Pipeline {
    remote: Option<ResolvedRemoteConfig>,
    backend: Option<Arc<dyn KeyValueBackend>>,
    overlay: Option<Overlay>,
    default_stage: Option<String>,
    err_on_missing: bool,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
         .field("remote", &self.remote)
         .field("backend", &self.backend.as_ref().map(|_| "<dyn KeyValueBackend>"))
         .field("overlay", &self.overlay)
         .field("default_stage", &self.default_stage)
         .field("err_on_missing", &self.err_on_missing)
         .finish()
    }
}

impl Pipeline {
    pub fn builder(options: Options) -> PipelineBuilder {
        PipelineBuilder { options,
                          backend: None }
    }

    /// Ejecuta una invocación completa del pipeline.
    ///
    /// Las etapas corren estrictamente en secuencia y el primer error
    /// cortocircuita las restantes; el `RunFailure` conserva el estado al
    /// momento del fallo y el reporte de lo ejecutado hasta entonces.
    pub async fn run(&self, initial: State, steps: &[Box<dyn PipelineStep>]) -> Result<RunOutcome, RunFailure> {
        let mut report = ReportBuilder::begin();
        let mut state = initial;

        // seed: stage por defecto desde el entorno si el estado no trae uno
        let started = Utc::now();
        if state.stage().is_none() {
            if let Some(stage) = stage_from_env() {
                state.set_stage(stage);
            }
        }
        report.completed("seed", started);

        // resolución remota
        let started = Utc::now();
        match (&self.remote, &self.backend) {
            (Some(remote), Some(backend)) => {
                let resolver = RemoteResolver { config: remote,
                                                backend: backend.as_ref(),
                                                default_stage: self.default_stage.as_deref(),
                                                err_on_missing: self.err_on_missing };
                match resolver.resolve(state).await {
                    Ok(next) => {
                        state = next;
                        report.completed("resolve", started);
                    }
                    Err((error, failed_state)) => {
                        report.failed("resolve", error.to_string(), started);
                        return Err(RunFailure { error,
                                                state: failed_state,
                                                report: report.finish() });
                    }
                }
            }
            _ => {
                // sin backend configurado la lista `config` igualmente se
                // descarta: nadie más la va a consumir
                state.remove_config();
                report.skipped("resolve");
            }
        }

        // overlay local
        match &self.overlay {
            Some(overlay) => {
                let started = Utc::now();
                apply_overlay(&mut state, overlay);
                report.completed("overlay", started);
            }
            None => report.skipped("overlay"),
        }

        // pasos del caller, en orden, con salida temprana
        for step in steps {
            let started = Utc::now();
            // los pasos consumen el estado por valor; se retiene la entrada
            // para poder devolverla como "estado al momento del fallo"
            let snapshot = state.clone();
            match step.run(state).await {
                Ok(next) => {
                    state = next;
                    report.completed(step.name(), started);
                }
                Err(error) => {
                    report.failed(step.name(), error.to_string(), started);
                    return Err(RunFailure { error,
                                            state: snapshot,
                                            report: report.finish() });
                }
            }
        }

        Ok(RunOutcome { state,
                        report: report.finish() })
    }
}

/// Builder de la factoría, al estilo del resto del crate: opciones primero,
/// colaboradores después, validación en `build`.
pub struct PipelineBuilder {
    options: Options,
    backend: Option<Arc<dyn KeyValueBackend>>,
}

impl PipelineBuilder {
    pub fn backend(mut self, backend: Arc<dyn KeyValueBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn build(self) -> Result<Pipeline, SetupError> {
        let remote = self.options.resolve_remote()?;
        if let Some(resolved) = &remote {
            if self.backend.is_none() {
                return Err(SetupError::BackendInstanceMissing(resolved.kind.tag().to_string()));
            }
        }

        let overlay = match &self.options.config_file {
            Some(path) => Some(load_overlay(path)?),
            None => None,
        };

        Ok(Pipeline { remote,
                      backend: self.backend,
                      overlay,
                      default_stage: self.options.default_stage,
                      err_on_missing: self.options.err_on_missing })
    }
}
