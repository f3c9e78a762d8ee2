//! Pontuação: chave de ordenação de justiça, score geral de aptidão
//! (usado para reservas) e o score de confiança por horário.

use chrono::NaiveDate;

use crate::availability::AvailabilityRecord;
use crate::model::{MassSlot, Minister};
use crate::saints::SaintBonusTable;

use super::ledger::AssignmentLedger;

/// Chave de ordenação ascendente: menos escalado primeiro, depois serviço
/// mais antigo (quem nunca serviu fica na frente via época zero), depois
/// menor total histórico.
pub(super) fn fairness_key(minister: &Minister, ledger: &AssignmentLedger) -> (u32, i64, u32) {
    (
        ledger.total_count(&minister.id),
        minister.last_service.map(|t| t.timestamp()).unwrap_or(0),
        minister.total_services,
    )
}

/// Score de preferência derivado, usado só no ranking e na confiança das
/// reservas.
pub(super) fn preference_score(minister: &Minister) -> f64 {
    minister.preferred_times.len() as f64 + if minister.can_serve_as_couple { 2.0 } else { 0.0 }
}

/// Aptidão geral de um candidato a reserva: equilíbrio de serviço,
/// recência, preferência de horário, disposição a substituir, penalidade
/// por já estar escalado no dia e bônus de santo do dia.
pub(super) fn fitness_score(
    minister: &Minister,
    record: Option<&AvailabilityRecord>,
    slot: &MassSlot,
    ledger: &AssignmentLedger,
    avg_services: f64,
    bonuses: &SaintBonusTable,
) -> f64 {
    let mut score = 0.0;

    // equilíbrio de frequência de serviço (peso 0.4)
    let balance = (avg_services - minister.total_services as f64).max(0.0);
    score += (balance / avg_services.max(1.0)).min(1.0) * 0.4;

    // tempo desde o último serviço, relativo à data da missa (peso 0.3)
    score += recency_term(minister, slot.date) * 0.3;

    // preferência pelo horário (peso 0.2)
    let slot_time = slot.time.format("%H:%M").to_string();
    if minister.preferred_times.iter().any(|t| *t == slot_time) {
        score += 0.2;
    }

    // disposto a substituir (peso 0.1)
    if record.map(|r| r.can_substitute).unwrap_or(false) {
        score += 0.1;
    }

    if ledger.assigned_on(&minister.id, slot.date) {
        score -= 0.3;
    }

    score + bonuses.bonus(&minister.id, slot.date)
}

fn recency_term(minister: &Minister, reference: NaiveDate) -> f64 {
    match minister.last_service {
        Some(last) => {
            let days = (reference - last.date_naive()).num_days().max(0) as f64;
            (days / 30.0).min(2.0)
        }
        // bônus para quem nunca serviu
        None => 1.0,
    }
}

/// Confiança [0, 1] de um horário gerado.
///
/// Base 0.6 quando o mínimo foi atingido (mais até 0.05 de bônus por
/// sobra), senão taxa de preenchimento × 0.3; até 0.25 pela preferência
/// média das reservas; até 0.15 menos a penalidade proporcional ao
/// desvio-padrão dos serviços acumulados; horário incompleto nunca passa
/// de 0.5.
pub(super) fn confidence(
    selected: &[&Minister],
    slot: &MassSlot,
    backup_preferences: &[f64],
) -> f64 {
    if selected.is_empty() {
        return 0.0;
    }

    let required = slot.min_ministers as usize;
    let mut confidence = if selected.len() >= required {
        let overfill = (selected.len() - required) as f64;
        0.6 + (overfill * 0.025).min(0.05)
    } else {
        (selected.len() as f64 / required.max(1) as f64) * 0.3
    };

    if !backup_preferences.is_empty() {
        let avg = backup_preferences.iter().sum::<f64>() / backup_preferences.len() as f64;
        confidence += (avg / 10.0).min(0.25);
    }

    let deviation = service_deviation(selected);
    confidence += (0.15 - deviation / 100.0).clamp(0.0, 0.15);

    if selected.len() < required {
        confidence = confidence.min(0.5);
    }
    confidence.clamp(0.0, 1.0)
}

fn service_deviation(selected: &[&Minister]) -> f64 {
    let services: Vec<f64> = selected.iter().map(|m| m.total_services as f64).collect();
    let avg = services.iter().sum::<f64>() / services.len() as f64;
    let variance = services.iter().map(|s| (s - avg).powi(2)).sum::<f64>() / services.len() as f64;
    variance.sqrt()
}
