//! Filtro de elegibilidade por horário.
//!
//! Aplica, nesta ordem: disponibilidade utilizável (com o modo degradado
//! de preview), regra específica do tipo de missa e os limites duros
//! (teto mensal de não diárias e proibição de dois horários no mesmo dia).

use crate::availability::{AvailabilityMap, AvailabilityRecord};
use crate::model::{MassSlot, MassType, Minister};

use super::ledger::AssignmentLedger;
use super::types::{AssignOptions, GenerationMode};

pub(super) struct SlotContext<'a> {
    pub slot: &'a MassSlot,
    pub availability: &'a AvailabilityMap,
    pub mode: GenerationMode,
    pub opts: AssignOptions,
}

impl<'a> SlotContext<'a> {
    /// Preview sem nenhuma resposta no conjunto inteiro trata todos como
    /// disponíveis (condição literal observada: vale o tamanho do
    /// conjunto, não a ausência individual).
    pub fn degraded(&self) -> bool {
        self.mode.is_preview() && self.availability.is_empty()
    }
}

pub(super) fn eligible_ministers<'a>(
    roster: &'a [Minister],
    ledger: &AssignmentLedger,
    ctx: &SlotContext<'_>,
) -> Vec<&'a Minister> {
    let degraded = ctx.degraded();
    roster
        .iter()
        .filter(|minister| {
            if !degraded {
                let Some(record) = ctx.availability.get(&minister.id) else {
                    return false;
                };
                if !available_for_type(record, ctx.slot) {
                    return false;
                }
            }
            if ctx.slot.mass_type.counts_toward_cap()
                && ledger.non_daily_count(&minister.id) >= ctx.opts.monthly_cap
            {
                return false;
            }
            // nunca dois horários na mesma data, qualquer que seja o tipo
            !ledger.assigned_on(&minister.id, ctx.slot.date)
        })
        .collect()
}

fn available_for_type(record: &AvailabilityRecord, slot: &MassSlot) -> bool {
    match slot.mass_type {
        MassType::Dominical => record.is_available_sunday(slot.date, slot.time),
        MassType::Diaria => record.is_available_weekday(slot.date, slot.time),
        MassType::CuraLibertacao => record.special_events.healing_liberation,
        MassType::SagradoCoracao => record.special_events.first_friday,
        MassType::ImaculadoCoracao => record.special_events.first_saturday,
        MassType::NovenaSaoJudas => record.is_available_novena(slot.date, slot.time),
        MassType::FestaSaoJudas => record.is_available_feast(slot.date, slot.time),
        MassType::SaoJudasSemana | MassType::SaoJudasSabado => {
            record.special_events.monthly_sao_judas || record.has_exact_slot(slot.date, slot.time)
        }
        MassType::SaoJudasDomingo => {
            record.is_available_sunday(slot.date, slot.time)
                || record.special_events.monthly_sao_judas
                || record.has_exact_slot(slot.date, slot.time)
        }
    }
}
