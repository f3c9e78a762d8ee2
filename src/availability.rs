//! Normalização de respostas de questionário.
//!
//! Converte cargas em formatos históricos distintos (v2.0 estruturado,
//! array legado de pergunta/resposta, JSON em string) em um
//! [`AvailabilityRecord`] canônico por ministro. Nunca falha: formas
//! irreconhecíveis degradam para um registro vazio com aviso no log.

use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, warn};

use crate::model::MinisterId;

/// Disponibilidade normalizada de todos os ministros de uma geração.
pub type AvailabilityMap = std::collections::HashMap<MinisterId, AvailabilityRecord>;

/// Competência (mês/ano) do questionário, usada na interpretação de datas
/// relativas ("Domingo 05/10").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn date(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, day)
    }
}

/// Disponibilidade para eventos especiais do calendário.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialEvents {
    #[serde(default)]
    pub healing_liberation: bool,
    #[serde(default)]
    pub first_friday: bool,
    #[serde(default)]
    pub first_saturday: bool,
    /// Devoção mensal de São Judas (dia 28 fora de outubro).
    #[serde(default)]
    pub monthly_sao_judas: bool,
    /// Chaves "YYYY-MM-DD_HH:MM" aceitas para a novena; entradas legadas
    /// não conversíveis ficam no texto original.
    #[serde(default)]
    pub novena_dates: BTreeSet<String>,
    /// Horários da festa, chave "YYYY-MM-DD_HH:MM".
    #[serde(default)]
    pub feast_times: BTreeMap<String, bool>,
    #[serde(default)]
    pub extra: BTreeMap<String, bool>,
}

/// Registro canônico de disponibilidade de um ministro para a competência.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityRecord {
    pub minister_id: MinisterId,
    /// Chaves de domingo: "YYYY-MM-DD_HH:MM", "YYYY-MM-DD" ou rótulo
    /// numérico legado de enésimo domingo ("1".."5").
    #[serde(default)]
    pub sundays: BTreeSet<String>,
    /// Horários preferidos, ordenados por frequência decrescente.
    #[serde(default)]
    pub preferred_times: Vec<String>,
    #[serde(default)]
    pub alternative_times: Vec<String>,
    /// Dias de semana para a missa diária ("monday".."friday").
    #[serde(default)]
    pub weekdays: BTreeSet<String>,
    /// Declarou explicitamente que não serve em missas diárias.
    #[serde(default)]
    pub daily_mass_declined: bool,
    #[serde(default)]
    pub special_events: SpecialEvents,
    #[serde(default)]
    pub can_substitute: bool,
    /// Datas (ou data_hora) com disponibilidade pontual que curto-circuita
    /// a checagem por dia de semana.
    #[serde(default)]
    pub exact_slots: BTreeSet<String>,
}

/// Formato detectado de uma carga de resposta.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PayloadFormat {
    V2,
    LegacyArray,
    Unknown,
}

/// Normaliza uma carga bruta de resposta para o registro canônico.
pub fn normalize_response(
    minister_id: &MinisterId,
    raw: &Value,
    period: Period,
) -> AvailabilityRecord {
    let payload = unwrap_payload(raw);
    let record = match (detect_format(&payload), &payload) {
        (PayloadFormat::V2, Value::Object(obj)) => parse_v2(minister_id, obj),
        (PayloadFormat::LegacyArray, Value::Array(items)) => {
            parse_legacy_array(minister_id, items, period)
        }
        _ => {
            warn!(
                minister = minister_id.as_str(),
                "formato de resposta desconhecido, disponibilidade vazia"
            );
            AvailabilityRecord {
                minister_id: minister_id.clone(),
                ..AvailabilityRecord::default()
            }
        }
    };
    debug!(
        minister = minister_id.as_str(),
        sundays = record.sundays.len(),
        weekdays = record.weekdays.len(),
        "resposta normalizada"
    );
    record
}

/// Desembrulha string JSON e o envelope `{ "responses": ... }` usado pela
/// camada de persistência.
fn unwrap_payload(raw: &Value) -> Value {
    let mut value = raw.clone();
    if let Value::String(s) = &value {
        match serde_json::from_str::<Value>(s) {
            Ok(inner) => value = inner,
            Err(_) => return Value::Null,
        }
    }
    if let Some(inner) = value.get("responses") {
        let mut inner = inner.clone();
        if let Value::String(s) = &inner {
            if let Ok(parsed) = serde_json::from_str::<Value>(s) {
                inner = parsed;
            }
        }
        // o envelope só vale quando o objeto não é ele mesmo uma resposta v2
        if value.get("format_version").is_none() {
            return inner;
        }
    }
    value
}

fn detect_format(payload: &Value) -> PayloadFormat {
    if payload
        .get("format_version")
        .and_then(Value::as_str)
        .map(|v| v == "2.0")
        .unwrap_or(false)
    {
        return PayloadFormat::V2;
    }
    if payload.is_array() {
        return PayloadFormat::LegacyArray;
    }
    PayloadFormat::Unknown
}

// ===== v2.0 =====

fn parse_v2(minister_id: &MinisterId, obj: &Map<String, Value>) -> AvailabilityRecord {
    let mut record = AvailabilityRecord {
        minister_id: minister_id.clone(),
        ..AvailabilityRecord::default()
    };

    if let Some(masses) = obj.get("masses").and_then(Value::as_object) {
        for (date, times) in masses {
            if let Some(times) = times.as_object() {
                for (time, available) in times {
                    if answer_is_yes(available) {
                        record.sundays.insert(format!("{date}_{time}"));
                    }
                }
            }
        }
    }

    if let Some(weekdays) = obj.get("weekdays").and_then(Value::as_object) {
        for (day, available) in weekdays {
            if answer_is_yes(available) {
                record.weekdays.insert(day.clone());
            }
        }
    }

    if let Some(events) = obj.get("special_events").and_then(Value::as_object) {
        for (key, value) in events {
            match key.as_str() {
                "healing_liberation" => record.special_events.healing_liberation = answer_is_yes(value),
                "first_friday" => record.special_events.first_friday = answer_is_yes(value),
                "first_saturday" => record.special_events.first_saturday = answer_is_yes(value),
                "missa_sao_judas" => record.special_events.monthly_sao_judas = answer_is_yes(value),
                "saint_judas_novena" => {
                    if let Some(entries) = value.as_array() {
                        for entry in entries {
                            if let Some(s) = entry.as_str() {
                                record.special_events.novena_dates.insert(s.to_owned());
                            }
                        }
                    }
                }
                "saint_judas_feast" => parse_feast_map(value, &mut record.special_events.feast_times),
                other => {
                    record
                        .special_events
                        .extra
                        .insert(other.to_owned(), answer_is_yes(value));
                }
            }
        }
    }

    if let Some(slots) = obj.get("exact_slots").and_then(Value::as_array) {
        for slot in slots {
            if let Some(s) = slot.as_str() {
                record.exact_slots.insert(s.to_owned());
            }
        }
    }

    record.can_substitute = obj.get("can_substitute").map(answer_is_yes).unwrap_or(false);
    record.preferred_times = ranked_times(&record.sundays);
    record
}

/// Aceita o mapa da festa plano ("data_hora" → bool) ou aninhado
/// (data → hora → bool), normalizando para chaves planas.
fn parse_feast_map(value: &Value, out: &mut BTreeMap<String, bool>) {
    let Some(map) = value.as_object() else { return };
    for (key, entry) in map {
        match entry {
            Value::Object(times) => {
                for (time, available) in times {
                    out.insert(format!("{key}_{time}"), answer_is_yes(available));
                }
            }
            other => {
                out.insert(key.clone(), answer_is_yes(other));
            }
        }
    }
}

// ===== array legado =====

fn parse_legacy_array(
    minister_id: &MinisterId,
    items: &[Value],
    period: Period,
) -> AvailabilityRecord {
    let mut record = AvailabilityRecord {
        minister_id: minister_id.clone(),
        ..AvailabilityRecord::default()
    };

    // primeira passada: disponibilidade geral no mês suprime domingos e
    // missas diárias, mas preserva eventos específicos (novena, festa)
    let has_monthly = items
        .iter()
        .find(|item| question_id(item) == Some("monthly_availability"))
        .map(|item| answer_is_yes(item.get("answer").unwrap_or(&Value::Null)))
        .unwrap_or(true);

    // segunda passada: horário principal rege as chaves de domingo
    let main_time = items
        .iter()
        .find(|item| question_id(item) == Some("main_service_time"))
        .and_then(|item| item.get("answer"))
        .and_then(Value::as_str)
        .and_then(normalize_time);
    if let Some(t) = &main_time {
        record.preferred_times.push(t.clone());
    }

    for item in items {
        let Some(question) = question_id(item) else { continue };
        let answer = item.get("answer").unwrap_or(&Value::Null);

        // formato exclusivo de outubro/2025: uma pergunta por horário da festa
        if let Some(time) = feast_question_time(question) {
            if let Some(date) = period.date(28) {
                let key = format!("{}_{}", date.format("%Y-%m-%d"), time);
                record
                    .special_events
                    .feast_times
                    .insert(key, answer_is_yes(answer));
            }
            continue;
        }

        match question {
            "available_sundays" if has_monthly => {
                parse_legacy_sundays(answer, period, &mut record.sundays);
            }
            "daily_mass_availability" if has_monthly => {
                parse_legacy_weekdays(answer, &mut record);
            }
            "saint_judas_novena" => {
                parse_legacy_novena(answer, period, &mut record.special_events.novena_dates);
            }
            "healing_liberation_mass" => {
                record.special_events.healing_liberation = answer_is_yes(answer);
            }
            "sacred_heart_mass" => record.special_events.first_friday = answer_is_yes(answer),
            "immaculate_heart_mass" => record.special_events.first_saturday = answer_is_yes(answer),
            "missa_sao_judas" => record.special_events.monthly_sao_judas = answer_is_yes(answer),
            "can_substitute" => record.can_substitute = answer_is_yes(answer),
            "alternative_service_time" | "secondary_service_time" => {
                if let Some(t) = answer.as_str().and_then(normalize_time) {
                    record.alternative_times.push(t);
                }
            }
            _ => {}
        }
    }

    record
}

fn question_id(item: &Value) -> Option<&str> {
    item.get("questionId")
        .or_else(|| item.get("question_id"))
        .and_then(Value::as_str)
}

fn feast_question_time(question: &str) -> Option<&'static str> {
    match question {
        "saint_judas_feast_7h" => Some("07:00"),
        "saint_judas_feast_10h" => Some("10:00"),
        "saint_judas_feast_12h" => Some("12:00"),
        "saint_judas_feast_15h" => Some("15:00"),
        "saint_judas_feast_17h" => Some("17:00"),
        "saint_judas_feast_evening" => Some("19:30"),
        _ => None,
    }
}

fn parse_legacy_sundays(answer: &Value, period: Period, out: &mut BTreeSet<String>) {
    let Some(entries) = answer.as_array() else { return };
    if entries
        .iter()
        .any(|e| e.as_str().map(|s| s.contains("Nenhum domingo")).unwrap_or(false))
    {
        return;
    }
    for entry in entries {
        let Some(text) = entry.as_str() else { continue };
        if let Some((day, month)) = parse_day_month(text) {
            if month == period.month {
                if let Some(date) = period.date(day) {
                    // chave só de data: disponível em qualquer horário dominical
                    out.insert(date.format("%Y-%m-%d").to_string());
                    continue;
                }
            }
            warn!(entry = text, "domingo legado fora da competência, ignorado");
        } else if text.chars().all(|c| c.is_ascii_digit()) && !text.is_empty() {
            // rótulo numérico de enésimo domingo
            out.insert(text.to_owned());
        }
    }
}

fn parse_legacy_weekdays(answer: &Value, record: &mut AvailabilityRecord) {
    match answer {
        Value::Array(days) => {
            for day in days.iter().filter_map(Value::as_str) {
                if let Some(name) = portuguese_weekday(day) {
                    record.weekdays.insert(name.to_owned());
                }
            }
        }
        other if answer_is_yes(other) => {
            for name in ["monday", "tuesday", "wednesday", "thursday", "friday"] {
                record.weekdays.insert(name.to_owned());
            }
        }
        Value::String(s) if s.eq_ignore_ascii_case("não") || s.eq_ignore_ascii_case("nao") => {
            record.daily_mass_declined = true;
        }
        _ => {}
    }
}

fn parse_legacy_novena(answer: &Value, period: Period, out: &mut BTreeSet<String>) {
    let Some(entries) = answer.as_array() else { return };
    for entry in entries.iter().filter_map(Value::as_str) {
        if entry == "Nenhum dia" {
            continue;
        }
        // "Terça 20/10 às 19h30" → "2025-10-20_19:30"
        let converted = parse_day_month(entry).and_then(|(day, month)| {
            let date = NaiveDate::from_ymd_opt(period.year, month, day)?;
            let time = parse_legacy_time(entry).unwrap_or_else(|| "19:30".to_owned());
            Some(format!("{}_{}", date.format("%Y-%m-%d"), time))
        });
        match converted {
            Some(key) => {
                out.insert(key);
            }
            None => {
                warn!(entry, "novena legada não conversível, mantendo texto original");
                out.insert(entry.to_owned());
            }
        }
    }
}

fn portuguese_weekday(day: &str) -> Option<&'static str> {
    let lower = day.to_lowercase();
    if lower.contains("segunda") {
        Some("monday")
    } else if lower.contains("terça") || lower.contains("terca") {
        Some("tuesday")
    } else if lower.contains("quarta") {
        Some("wednesday")
    } else if lower.contains("quinta") {
        Some("thursday")
    } else if lower.contains("sexta") {
        Some("friday")
    } else {
        None
    }
}

// ===== helpers de normalização =====

/// `true`, `"Sim"`, `"sim"`, `"true"` e `1` valem sim; o resto, não.
pub fn answer_is_yes(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_i64() == Some(1),
        Value::String(s) => {
            let s = s.trim();
            s.eq_ignore_ascii_case("sim") || s.eq_ignore_ascii_case("true")
        }
        _ => false,
    }
}

/// Normaliza "8h", "08h00", "8:00" para "08:00".
pub fn normalize_time(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let (hour_part, minute_part) = if let Some((h, m)) = raw.split_once(['h', 'H']) {
        (h, m)
    } else if let Some((h, m)) = raw.split_once(':') {
        (h, m)
    } else {
        (raw, "")
    };
    let hour: u32 = hour_part.trim().parse().ok()?;
    let minute: u32 = {
        // descarta segundos ("08:00:00")
        let m = minute_part.split(':').next().unwrap_or("").trim();
        if m.is_empty() {
            0
        } else {
            m.parse().ok()?
        }
    };
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(format!("{hour:02}:{minute:02}"))
}

/// Extrai "dd/mm" de um texto legado.
fn parse_day_month(text: &str) -> Option<(u32, u32)> {
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if chars[i].is_ascii_digit() {
            let (day, after_day) = read_number(&chars, i);
            if after_day < chars.len() && chars[after_day] == '/' {
                let (month, after_month) = read_number(&chars, after_day + 1);
                if after_month > after_day + 1
                    && (1..=31).contains(&day)
                    && (1..=12).contains(&month)
                {
                    return Some((day, month));
                }
            }
            i = after_day;
        } else {
            i += 1;
        }
    }
    None
}

/// Lê um número de até dois dígitos a partir de `start`; devolve o valor e
/// o índice após o último dígito consumido.
fn read_number(chars: &[char], start: usize) -> (u32, usize) {
    let mut value = 0u32;
    let mut i = start;
    while i < chars.len() && chars[i].is_ascii_digit() && i - start < 2 {
        value = value * 10 + (chars[i] as u32 - '0' as u32);
        i += 1;
    }
    (value, i)
}

/// Extrai "19h30"/"19h" de um texto legado como "HH:MM".
fn parse_legacy_time(text: &str) -> Option<String> {
    let chars: Vec<char> = text.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if *c == 'h' && i > 0 && chars[i - 1].is_ascii_digit() {
            let mut start = i;
            while start > 0 && chars[start - 1].is_ascii_digit() {
                start -= 1;
            }
            let hour: String = chars[start..i].iter().collect();
            let mut end = i + 1;
            while end < chars.len() && chars[end].is_ascii_digit() {
                end += 1;
            }
            let minute: String = chars[i + 1..end].iter().collect();
            let candidate = if minute.is_empty() {
                format!("{hour}h")
            } else {
                format!("{hour}h{minute}")
            };
            if let Some(t) = normalize_time(&candidate) {
                return Some(t);
            }
        }
    }
    None
}

/// Horários observados nas chaves "data_hora", ordenados por frequência
/// decrescente (desempate pelo horário).
fn ranked_times(keys: &BTreeSet<String>) -> Vec<String> {
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for key in keys {
        if let Some((_, time)) = key.split_once('_') {
            *counts.entry(time.to_owned()).or_insert(0) += 1;
        }
    }
    let mut times: Vec<(String, u32)> = counts.into_iter().collect();
    times.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    times.into_iter().map(|(t, _)| t).collect()
}

// ===== consultas usadas pela elegibilidade =====

impl AvailabilityRecord {
    pub fn has_any_data(&self) -> bool {
        !self.sundays.is_empty()
            || !self.weekdays.is_empty()
            || !self.special_events.novena_dates.is_empty()
            || !self.special_events.feast_times.is_empty()
            || self.special_events.healing_liberation
            || self.special_events.first_friday
            || self.special_events.first_saturday
            || self.special_events.monthly_sao_judas
    }

    /// Disponibilidade dominical, nas tolerâncias históricas: chave exata
    /// "data_hora", só a data, substring "dd/mm" e o rótulo legado de
    /// enésimo domingo (`ceil(dia / 7)`, preservado como observado).
    pub fn is_available_sunday(&self, date: NaiveDate, time: NaiveTime) -> bool {
        let date_str = date.format("%Y-%m-%d").to_string();
        let key = format!("{}_{}", date_str, time.format("%H:%M"));
        if self.sundays.contains(&key) || self.sundays.contains(&date_str) {
            return true;
        }
        let dd_mm = date.format("%d/%m").to_string();
        if self.sundays.iter().any(|k| k.contains(&dd_mm)) {
            return true;
        }
        let nth = (date.day() + 6) / 7;
        if self.sundays.contains(&nth.to_string()) {
            return true;
        }
        // fallback menor: nenhum domingo marcado, mas o horário preferido
        // coincide com o da missa
        if self.sundays.is_empty() {
            let t = time.format("%H:%M").to_string();
            return self.preferred_times.iter().any(|p| *p == t);
        }
        false
    }

    /// Disponibilidade para a missa diária de um dia específico.
    pub fn is_available_weekday(&self, date: NaiveDate, time: NaiveTime) -> bool {
        if self.has_exact_slot(date, time) {
            return true;
        }
        if self.daily_mass_declined || self.weekdays.is_empty() {
            return false;
        }
        match weekday_name(date.weekday()) {
            Some(name) => self.weekdays.contains(name),
            None => false,
        }
    }

    pub fn has_exact_slot(&self, date: NaiveDate, time: NaiveTime) -> bool {
        let date_str = date.format("%Y-%m-%d").to_string();
        let key = format!("{}_{}", date_str, time.format("%H:%M"));
        self.exact_slots.contains(&key) || self.exact_slots.contains(&date_str)
    }

    /// Novena: chave v2 exata, só a data, ou número do dia em um texto
    /// legado não convertido.
    pub fn is_available_novena(&self, date: NaiveDate, time: NaiveTime) -> bool {
        let date_str = date.format("%Y-%m-%d").to_string();
        let key = format!("{}_{}", date_str, time.format("%H:%M"));
        let novena = &self.special_events.novena_dates;
        if novena.contains(&key) || novena.contains(&date_str) {
            return true;
        }
        let dd_mm = date.format("%d/%m").to_string();
        novena.iter().any(|entry| entry.contains(&dd_mm))
    }

    pub fn is_available_feast(&self, date: NaiveDate, time: NaiveTime) -> bool {
        let key = format!("{}_{}", date.format("%Y-%m-%d"), time.format("%H:%M"));
        self.special_events.feast_times.get(&key).copied().unwrap_or(false)
    }

    /// Projeção do registro no formato v2.0. Normalizar a projeção devolve
    /// um registro idêntico (idempotência).
    pub fn to_v2_value(&self) -> Value {
        let mut masses: BTreeMap<String, BTreeMap<String, bool>> = BTreeMap::new();
        for key in &self.sundays {
            if let Some((date, time)) = key.split_once('_') {
                masses
                    .entry(date.to_owned())
                    .or_default()
                    .insert(time.to_owned(), true);
            }
        }
        let mut weekdays = Map::new();
        for name in ["monday", "tuesday", "wednesday", "thursday", "friday"] {
            weekdays.insert(name.to_owned(), json!(self.weekdays.contains(name)));
        }
        let mut special = Map::new();
        special.insert(
            "healing_liberation".to_owned(),
            json!(self.special_events.healing_liberation),
        );
        special.insert("first_friday".to_owned(), json!(self.special_events.first_friday));
        special.insert(
            "first_saturday".to_owned(),
            json!(self.special_events.first_saturday),
        );
        special.insert(
            "missa_sao_judas".to_owned(),
            json!(self.special_events.monthly_sao_judas),
        );
        special.insert(
            "saint_judas_novena".to_owned(),
            json!(self.special_events.novena_dates),
        );
        special.insert(
            "saint_judas_feast".to_owned(),
            json!(self.special_events.feast_times),
        );
        for (key, value) in &self.special_events.extra {
            special.insert(key.clone(), json!(value));
        }
        json!({
            "format_version": "2.0",
            "masses": masses,
            "weekdays": Value::Object(weekdays),
            "special_events": Value::Object(special),
            "can_substitute": self.can_substitute,
            "exact_slots": self.exact_slots,
        })
    }
}

pub(crate) fn weekday_name(weekday: Weekday) -> Option<&'static str> {
    match weekday {
        Weekday::Mon => Some("monday"),
        Weekday::Tue => Some("tuesday"),
        Weekday::Wed => Some("wednesday"),
        Weekday::Thu => Some("thursday"),
        Weekday::Fri => Some("friday"),
        Weekday::Sat | Weekday::Sun => None,
    }
}
