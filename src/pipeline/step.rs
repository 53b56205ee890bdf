//! Pasos aportados por el caller.
//!
//! Un paso consume el estado por valor y devuelve el estado transformado o
//! el primer error, que cortocircuita el resto del pipeline. La ejecución es
//! estrictamente secuencial: el paso n+1 sólo comienza cuando el n terminó.

use async_trait::async_trait;

use crate::errors::PipelineError;
use crate::state::State;

#[async_trait]
pub trait PipelineStep: Send + Sync {
    /// Identificador estable del paso, usado en reportes y errores.
    fn name(&self) -> &str;

    async fn run(&self, state: State) -> Result<State, PipelineError>;
}

/// Adaptador para pasos síncronos expresados como closure.
pub struct FnStep<F> {
    name: String,
    func: F,
}

impl<F> FnStep<F>
    where F: Fn(State) -> Result<State, PipelineError> + Send + Sync
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self { name: name.into(),
               func }
    }

    /// Conveniencia: caja lista para pasarse a `Pipeline::run`.
    pub fn boxed(name: impl Into<String>, func: F) -> Box<dyn PipelineStep>
        where F: 'static
    {
        Box::new(Self::new(name, func))
    }
}

#[async_trait]
impl<F> PipelineStep for FnStep<F>
    where F: Fn(State) -> Result<State, PipelineError> + Send + Sync
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, state: State) -> Result<State, PipelineError> {
        (self.func)(state)
    }
}
