//! Snapshot por ejecución del pipeline.
//!
//! Cada invocación produce un `RunReport` con su id, timestamps y el estado
//! final de cada etapa en orden de ejecución, para trazabilidad. El reporte
//! acompaña tanto al resultado exitoso como al fallo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Estado final de una etapa dentro de una ejecución.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StageStatus {
    /// La etapa corrió y terminó bien.
    Completed,
    /// La etapa no aplicaba en esta configuración (p.ej. sin overlay).
    Skipped,
    /// La etapa falló con este mensaje; ninguna etapa posterior corrió.
    Failed(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageReport {
    pub name: String,
    pub status: StageStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub stages: Vec<StageReport>,
}

impl RunReport {
    pub fn stage(&self, name: &str) -> Option<&StageReport> {
        self.stages.iter().find(|s| s.name == name)
    }

    pub fn succeeded(&self) -> bool {
        !self.stages.iter().any(|s| matches!(s.status, StageStatus::Failed(_)))
    }
}

/// Acumulador interno del reporte mientras la ejecución avanza.
#[derive(Debug)]
pub(crate) struct ReportBuilder {
    run_id: Uuid,
    started_at: DateTime<Utc>,
    stages: Vec<StageReport>,
}

impl ReportBuilder {
    pub fn begin() -> Self {
        Self { run_id: Uuid::new_v4(),
               started_at: Utc::now(),
               stages: Vec::new() }
    }

    pub fn completed(&mut self, name: &str, started_at: DateTime<Utc>) {
        self.push(name, StageStatus::Completed, started_at);
    }

    pub fn skipped(&mut self, name: &str) {
        let now = Utc::now();
        self.stages.push(StageReport { name: name.to_string(),
                                       status: StageStatus::Skipped,
                                       started_at: now,
                                       finished_at: now });
    }

    pub fn failed(&mut self, name: &str, message: String, started_at: DateTime<Utc>) {
        self.push(name, StageStatus::Failed(message), started_at);
    }

    fn push(&mut self, name: &str, status: StageStatus, started_at: DateTime<Utc>) {
        self.stages.push(StageReport { name: name.to_string(),
                                       status,
                                       started_at,
                                       finished_at: Utc::now() });
    }

    pub fn finish(self) -> RunReport {
        RunReport { run_id: self.run_id,
                    started_at: self.started_at,
                    finished_at: Utc::now(),
                    stages: self.stages }
    }
}
