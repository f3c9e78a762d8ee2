use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::MinisterId;

/// Opções de geração
#[derive(Debug, Clone, Copy)]
pub struct AssignOptions {
    /// Teto mensal de escalações não diárias por ministro.
    pub monthly_cap: u32,
    /// Quantidade de reservas sugeridas por horário.
    pub backup_count: usize,
}

impl Default for AssignOptions {
    fn default() -> Self {
        Self {
            monthly_cap: 4,
            backup_count: 2,
        }
    }
}

/// Modo de geração: preview tolera questionário aberto ou ausente.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationMode {
    Preview,
    Final,
}

impl GenerationMode {
    pub fn is_preview(self) -> bool {
        matches!(self, GenerationMode::Preview)
    }
}

#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("no active ministers found")]
    EmptyRoster,
    #[error("no active mass time configuration")]
    EmptyMassConfig,
    #[error("no mass slots generated for {month}/{year}")]
    EmptyCalendar { year: i32, month: u32 },
    #[error("no questionnaire found for {month}/{year}")]
    QuestionnaireMissing { year: i32, month: u32 },
    #[error("questionnaire for {month}/{year} is not closed (status: {status})")]
    QuestionnaireNotClosed {
        year: i32,
        month: u32,
        status: String,
    },
    #[error("questionnaire {0} has no responses")]
    NoResponses(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Diagnóstico agregado de uma geração.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub total_slots: usize,
    pub incomplete_slots: usize,
    pub average_confidence: f64,
    /// Escalações por ministro (diárias incluídas).
    pub assignments_per_minister: BTreeMap<MinisterId, u32>,
    /// Histograma: quantidade de escalações → quantos ministros.
    pub distribution: BTreeMap<u32, u32>,
    /// Percentual de ministros sem nenhuma escalação no mês.
    pub zero_assignment_pct: f64,
}
