//! Seleção de ministros para um horário: fase 1 agrupa famílias que
//! preferem servir juntas, fase 2 completa individualmente até o mínimo,
//! depois escolhe as reservas por aptidão.

use std::collections::HashSet;
use tracing::debug;

use crate::availability::AvailabilityMap;
use crate::family::FamilyDirectory;
use crate::model::{
    AssignedMinister, BackupMinister, FamilyId, GeneratedSchedule, MassSlot, Minister, MinisterId,
};
use crate::saints::SaintBonusTable;

use super::ledger::AssignmentLedger;
use super::scoring;
use super::types::AssignOptions;

#[allow(clippy::too_many_arguments)]
pub(super) fn assign_slot(
    slot: &MassSlot,
    eligible: Vec<&Minister>,
    families: &FamilyDirectory,
    availability: &AvailabilityMap,
    ledger: &mut AssignmentLedger,
    bonuses: &SaintBonusTable,
    opts: AssignOptions,
    avg_services: f64,
) -> GeneratedSchedule {
    let mut sorted = eligible;
    sorted.sort_by_key(|m| scoring::fairness_key(m, ledger));

    let required = slot.min_ministers as usize;
    let capacity = slot.max_ministers as usize;

    let mut selected: Vec<&Minister> = Vec::new();
    let mut used: HashSet<MinisterId> = HashSet::new();
    let mut processed_families: HashSet<FamilyId> = HashSet::new();

    // fase 1: famílias que preferem servir juntas entram inteiras,
    // limitadas à capacidade restante
    for minister in &sorted {
        if selected.len() >= required {
            break;
        }
        let Some(family_id) = &minister.family_id else {
            continue;
        };
        if processed_families.contains(family_id) || !families.prefers_together(family_id) {
            continue;
        }
        processed_families.insert(family_id.clone());

        let member_ids: HashSet<&MinisterId> = families.members_of(family_id).iter().collect();
        for member in sorted.iter().filter(|c| member_ids.contains(&c.id)) {
            if selected.len() >= capacity {
                break;
            }
            if used.insert(member.id.clone()) {
                selected.push(*member);
            }
        }
        debug!(
            family = family_id.as_str(),
            slot = slot.id.as_str(),
            "família escalada em bloco"
        );
    }

    // fase 2: preenchimento individual até o mínimo; membros de família
    // "juntos" ainda não processada ficam de fora para não quebrá-la
    for minister in &sorted {
        if selected.len() >= required {
            break;
        }
        if used.contains(&minister.id) {
            continue;
        }
        if let Some(family_id) = &minister.family_id {
            if families.prefers_together(family_id) && !processed_families.contains(family_id) {
                continue;
            }
        }
        used.insert(minister.id.clone());
        selected.push(*minister);
    }

    for minister in &selected {
        ledger.record(&minister.id, slot.date, slot.mass_type);
    }

    // reservas: elegíveis não selecionados, por aptidão decrescente
    let mut backup_candidates: Vec<(&Minister, f64)> = sorted
        .iter()
        .filter(|m| !used.contains(&m.id))
        .map(|m| {
            let record = availability.get(&m.id);
            let score = scoring::fitness_score(m, record, slot, ledger, avg_services, bonuses);
            (*m, score)
        })
        .collect();
    backup_candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    backup_candidates.truncate(opts.backup_count);

    let backup_preferences: Vec<f64> = backup_candidates
        .iter()
        .map(|(m, _)| scoring::preference_score(m))
        .collect();
    let confidence = scoring::confidence(&selected, slot, &backup_preferences);

    let incomplete = selected.len() < required;
    let actual = selected.len() as u32;
    let ministers = selected
        .iter()
        .enumerate()
        .map(|(index, m)| AssignedMinister {
            minister_id: m.id.clone(),
            name: m.name.clone(),
            position: index as u32 + 1,
            schedule_incomplete: incomplete,
            required_count: slot.min_ministers,
            actual_count: actual,
        })
        .collect();

    let backup_ministers = backup_candidates
        .into_iter()
        .map(|(m, score)| BackupMinister {
            minister_id: m.id.clone(),
            name: m.name.clone(),
            score,
        })
        .collect();

    GeneratedSchedule {
        slot: slot.clone(),
        ministers,
        backup_ministers,
        confidence,
    }
}
