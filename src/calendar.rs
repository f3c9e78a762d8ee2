//! Calendário de missas do mês.
//!
//! Gera a lista definitiva de horários ([`MassSlot`]) para um (ano, mês):
//! regras recorrentes (domingos, missa diária de 06:30, devoções de
//! primeira quinta/sexta/sábado), a novena e a festa de São Judas em
//! outubro, e um passo final de resolução de colisões por precedência de
//! tipo.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{MassSlot, MassType};

/// Configuração recorrente de horário vinda do colaborador de dados.
/// `day_of_week` segue a convenção da origem: 0 = domingo .. 6 = sábado.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassTimeConfig {
    pub day_of_week: u32,
    pub time: NaiveTime,
    pub min_ministers: u32,
    pub max_ministers: u32,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

const DAILY_TIME: (u32, u32) = (6, 30);
const DAILY_MINISTERS: u32 = 5;
const SUNDAY_MASSES: [((u32, u32), u32); 3] = [((8, 0), 15), ((10, 0), 20), ((19, 0), 20)];
const DEVOTION_MINISTERS: u32 = 6;
const NOVENA_MINISTERS: u32 = 26;
const HEALING_MINISTERS: u32 = 26;
const FEAST_MASSES: [((u32, u32), u32); 6] = [
    ((7, 0), 10),
    ((10, 0), 15),
    ((12, 0), 10),
    ((15, 0), 10),
    ((17, 0), 10),
    ((19, 30), 20),
];

/// Feriados nacionais de data fixa (MM-DD); deslocam a missa de cura e
/// libertação da primeira quinta para 19:00.
const FIXED_HOLIDAYS: [(u32, u32); 8] = [
    (1, 1),
    (4, 21),
    (5, 1),
    (9, 7),
    (10, 12),
    (11, 2),
    (11, 15),
    (12, 25),
];

pub fn is_fixed_holiday(date: NaiveDate) -> bool {
    FIXED_HOLIDAYS.contains(&(date.month(), date.day()))
}

fn time(hm: (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hm.0, hm.1, 0).unwrap_or_default()
}

/// Janela da novena de São Judas (19 a 27 de outubro).
fn in_novena_window(date: NaiveDate) -> bool {
    date.month() == 10 && (19..=27).contains(&date.day())
}

/// Gera os horários do mês, já ordenados por (data, hora) e livres de
/// colisões. Entradas ativas da configuração sobrescrevem min/max dos
/// horários recorrentes (dominical e diária); missas especiais mantêm os
/// tamanhos do calendário. Mês inválido devolve lista vazia, que o
/// orquestrador trata como erro de configuração.
pub fn build_month_slots(year: i32, month: u32, config: &[MassTimeConfig]) -> Vec<MassSlot> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };

    let overrides: HashMap<(u32, NaiveTime), (u32, u32)> = config
        .iter()
        .filter(|c| c.is_active)
        .map(|c| ((c.day_of_week, c.time), (c.min_ministers, c.max_ministers)))
        .collect();

    let mut slots = Vec::new();
    let mut current = first;
    while current.month() == month {
        build_day_slots(current, &overrides, &mut slots);
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    resolve_conflicts(slots)
}

fn build_day_slots(
    date: NaiveDate,
    overrides: &HashMap<(u32, NaiveTime), (u32, u32)>,
    slots: &mut Vec<MassSlot>,
) {
    let weekday = date.weekday();
    let day = date.day();
    let first_week = day <= 7;

    // a festa de São Judas substitui qualquer grade do dia 28 de outubro
    if day == 28 && date.month() == 10 {
        for (hm, count) in FEAST_MASSES {
            slots.push(MassSlot::new(
                date,
                time(hm),
                MassType::FestaSaoJudas,
                count,
                count,
            ));
        }
        return;
    }

    if weekday == Weekday::Sun {
        for (hm, count) in SUNDAY_MASSES {
            let t = time(hm);
            let (min, max) = recurring_counts(overrides, 0, t, count);
            slots.push(MassSlot::new(date, t, MassType::Dominical, min, max));
        }
        // a novena dominical é absorvida pela missa das 19:00; dia 28 em
        // domingo troca o tipo na resolução de colisões
        if day == 28 && date.month() != 10 {
            for (hm, count) in [((8, 0), 15), ((10, 0), 20), ((19, 0), 20)] {
                slots.push(MassSlot::new(
                    date,
                    time(hm),
                    MassType::SaoJudasDomingo,
                    count,
                    count,
                ));
            }
        }
        return;
    }

    // dia 28 fora de outubro: devoção mensal substitui a diária
    if day == 28 {
        if weekday == Weekday::Sat {
            for (hm, count) in [((7, 0), 8), ((19, 0), 15)] {
                slots.push(MassSlot::new(
                    date,
                    time(hm),
                    MassType::SaoJudasSabado,
                    count,
                    count,
                ));
            }
        } else {
            for (hm, count) in [((7, 0), 8), ((12, 0), 10), ((19, 30), 15)] {
                slots.push(MassSlot::new(
                    date,
                    time(hm),
                    MassType::SaoJudasSemana,
                    count,
                    count,
                ));
            }
        }
        return;
    }

    if in_novena_window(date) {
        // sem missa da manhã durante a novena; horário conforme o dia
        let t = if weekday == Weekday::Sat {
            time((19, 0))
        } else {
            time((19, 30))
        };
        slots.push(MassSlot::new(
            date,
            t,
            MassType::NovenaSaoJudas,
            NOVENA_MINISTERS,
            NOVENA_MINISTERS,
        ));
        return;
    }

    if weekday == Weekday::Sat {
        // só o primeiro sábado tem missa às 06:30, e é a do Imaculado Coração
        if first_week {
            slots.push(MassSlot::new(
                date,
                time(DAILY_TIME),
                MassType::ImaculadoCoracao,
                DEVOTION_MINISTERS,
                DEVOTION_MINISTERS,
            ));
        }
        return;
    }

    // segunda a sexta: missa diária
    let t = time(DAILY_TIME);
    let dow = date.weekday().num_days_from_sunday();
    let (min, max) = recurring_counts(overrides, dow, t, DAILY_MINISTERS);
    slots.push(MassSlot::new(date, t, MassType::Diaria, min, max));

    if first_week {
        match weekday {
            Weekday::Thu => {
                let t = if is_fixed_holiday(date) {
                    time((19, 0))
                } else {
                    time((19, 30))
                };
                slots.push(MassSlot::new(
                    date,
                    t,
                    MassType::CuraLibertacao,
                    HEALING_MINISTERS,
                    HEALING_MINISTERS,
                ));
            }
            Weekday::Fri => {
                slots.push(MassSlot::new(
                    date,
                    time(DAILY_TIME),
                    MassType::SagradoCoracao,
                    DEVOTION_MINISTERS,
                    DEVOTION_MINISTERS,
                ));
            }
            _ => {}
        }
    }
}

fn recurring_counts(
    overrides: &HashMap<(u32, NaiveTime), (u32, u32)>,
    day_of_week: u32,
    t: NaiveTime,
    default: u32,
) -> (u32, u32) {
    overrides
        .get(&(day_of_week, t))
        .copied()
        .unwrap_or((default, default))
}

/// Passo final: remove diárias do dia 28, sábados comuns de outubro e
/// missas matinais na janela da novena; colisões restantes de (data, hora)
/// ficam com o tipo de menor rank de precedência.
fn resolve_conflicts(mut slots: Vec<MassSlot>) -> Vec<MassSlot> {
    let noon = time((12, 0));

    slots.retain(|s| !(s.date.day() == 28 && s.mass_type == MassType::Diaria));
    slots.retain(|s| {
        !(s.date.month() == 10
            && s.day_of_week() == Weekday::Sat
            && s.date.day() > 7
            && s.mass_type == MassType::Diaria)
    });
    slots.retain(|s| {
        !(in_novena_window(s.date)
            && s.day_of_week() != Weekday::Sun
            && s.time < noon
            && !s.mass_type.is_sao_judas())
    });

    slots.sort_by(|a, b| {
        (a.date, a.time, a.mass_type.precedence()).cmp(&(b.date, b.time, b.mass_type.precedence()))
    });
    slots.dedup_by(|b, a| a.date == b.date && a.time == b.time);
    slots
}

/// Severidade de uma violação do calendário de outubro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Error,
    Warning,
}

/// Violação encontrada na checagem do calendário de outubro.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarViolation {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub mass_type: MassType,
    pub severity: Severity,
    pub message: String,
}

/// Checa as regras do santuário para os horários de outubro. Lista vazia
/// significa calendário válido.
pub fn validate_october_slots(slots: &[MassSlot]) -> Vec<CalendarViolation> {
    let mut violations = Vec::new();
    let morning = time(DAILY_TIME);

    for slot in slots.iter().filter(|s| s.date.month() == 10) {
        let day = slot.date.day();

        if slot.day_of_week() == Weekday::Sat
            && day > 7
            && slot.time == morning
            && slot.mass_type == MassType::Diaria
        {
            violations.push(violation(
                slot,
                Severity::Error,
                format!("sábado comum {day} não tem missa da manhã"),
            ));
        }

        if (20..=27).contains(&day) && slot.time == morning {
            violations.push(violation(
                slot,
                Severity::Error,
                format!("dia {day} está na novena e não tem missa das 06:30"),
            ));
        }

        if slot.mass_type == MassType::NovenaSaoJudas {
            let expected = if slot.day_of_week() == Weekday::Sat {
                time((19, 0))
            } else {
                time((19, 30))
            };
            if slot.time != expected {
                violations.push(violation(
                    slot,
                    Severity::Warning,
                    format!("novena do dia {day} fora do horário esperado"),
                ));
            }
        }

        if day == 28 && slot.mass_type == MassType::Diaria {
            violations.push(violation(
                slot,
                Severity::Error,
                "dia 28 (festa de São Judas) não tem missa diária".to_owned(),
            ));
        }

        if slot.day_of_week() == Weekday::Sat
            && day <= 7
            && slot.time == morning
            && slot.mass_type != MassType::ImaculadoCoracao
        {
            violations.push(violation(
                slot,
                Severity::Warning,
                "primeiro sábado às 06:30 é a missa do Imaculado Coração".to_owned(),
            ));
        }
    }

    violations
}

fn violation(slot: &MassSlot, severity: Severity, message: String) -> CalendarViolation {
    CalendarViolation {
        date: slot.date,
        time: slot.time,
        mass_type: slot.mass_type,
        severity,
        message,
    }
}
