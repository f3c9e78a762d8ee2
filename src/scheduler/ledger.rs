//! Livro-razão de escalações de uma geração.
//!
//! Estado mutável com escopo de execução única: contadores correntes e
//! última data escalada por ministro. Substitui a mutação de objetos
//! compartilhados; cada geração constrói o seu e nunca o reaproveita.

use chrono::NaiveDate;
use std::collections::HashMap;

use crate::model::{MassType, MinisterId};

#[derive(Debug, Default)]
pub struct AssignmentLedger {
    total: HashMap<MinisterId, u32>,
    non_daily: HashMap<MinisterId, u32>,
    last_assigned: HashMap<MinisterId, NaiveDate>,
}

impl AssignmentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, minister: &MinisterId, date: NaiveDate, mass_type: MassType) {
        *self.total.entry(minister.clone()).or_insert(0) += 1;
        if mass_type.counts_toward_cap() {
            *self.non_daily.entry(minister.clone()).or_insert(0) += 1;
        }
        self.last_assigned.insert(minister.clone(), date);
    }

    /// Contador usado na ordenação de justiça (diárias incluídas).
    pub fn total_count(&self, minister: &MinisterId) -> u32 {
        self.total.get(minister).copied().unwrap_or(0)
    }

    /// Contador confrontado com o teto mensal (diárias fora).
    pub fn non_daily_count(&self, minister: &MinisterId) -> u32 {
        self.non_daily.get(minister).copied().unwrap_or(0)
    }

    /// Já escalado em algum horário desta data? Os horários são
    /// processados em ordem cronológica, então a última data basta.
    pub fn assigned_on(&self, minister: &MinisterId, date: NaiveDate) -> bool {
        self.last_assigned.get(minister) == Some(&date)
    }

    pub fn counts(&self) -> &HashMap<MinisterId, u32> {
        &self.total
    }
}
