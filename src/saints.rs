//! Bônus de afinidade entre nome de ministro e santo do dia.
//!
//! A tabela de santos é indexada por "MM-DD" (calendário civil) e injetada
//! pelo colaborador de dados; a ausência dela degrada para bônus zero na
//! geração inteira, nunca para erro.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::model::{Minister, MinisterId};

/// Grau litúrgico da celebração; amplifica o bônus de nome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SaintRank {
    Solemnity,
    Feast,
    Memorial,
    OptionalMemorial,
}

impl SaintRank {
    fn multiplier(self) -> f64 {
        match self {
            SaintRank::Solemnity => 1.5,
            SaintRank::Feast => 1.3,
            SaintRank::Memorial => 1.2,
            SaintRank::OptionalMemorial => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Saint {
    pub name: String,
    #[serde(default)]
    pub rank: Option<SaintRank>,
}

/// Tabela de santos indexada por dia de festa ("MM-DD").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SaintsIndex(BTreeMap<String, Vec<Saint>>);

impl SaintsIndex {
    pub fn new(map: BTreeMap<String, Vec<Saint>>) -> Self {
        Self(map)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn for_date(&self, date: NaiveDate) -> &[Saint] {
        let key = format!("{:02}-{:02}", date.month(), date.day());
        self.0.get(&key).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Melhor score de afinidade [0, 1] entre o nome do ministro e os santos
/// celebrados na data.
pub fn name_match_bonus(minister_name: &str, saints: &[Saint]) -> f64 {
    let minister_tokens = tokens(minister_name);
    if minister_tokens.is_empty() {
        return 0.0;
    }

    let mut best: f64 = 0.0;
    for saint in saints {
        let saint_tokens = tokens(&saint.name);
        if saint_tokens.is_empty() {
            continue;
        }

        let mut score = 0.0;
        for mt in &minister_tokens {
            for st in &saint_tokens {
                if mt == st {
                    score += 1.0;
                } else if mt.contains(st.as_str()) || st.contains(mt.as_str()) {
                    score += 0.5;
                } else if similarity(mt, st) > 0.7 {
                    score += 0.3;
                }
            }
        }

        let normalized = score / minister_tokens.len().max(saint_tokens.len()) as f64;
        let multiplier = saint.rank.map(SaintRank::multiplier).unwrap_or(1.0);
        best = best.max((normalized * multiplier).min(1.0));
    }
    best
}

/// Tokens minúsculos com pelo menos 3 caracteres.
fn tokens(name: &str) -> Vec<String> {
    name.to_lowercase()
        .split_whitespace()
        .filter(|t| t.chars().count() >= 3)
        .map(str::to_owned)
        .collect()
}

/// Similaridade normalizada em [0, 1] a partir da distância de edição.
fn similarity(a: &str, b: &str) -> f64 {
    let (longer, shorter) = if a.chars().count() >= b.chars().count() {
        (a, b)
    } else {
        (b, a)
    };
    let len = longer.chars().count();
    if len == 0 {
        return 1.0;
    }
    let distance = levenshtein(longer, shorter);
    (len - distance) as f64 / len as f64
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=a.len()).collect();
    let mut current = vec![0usize; a.len() + 1];

    for (i, bc) in b.iter().enumerate() {
        current[0] = i + 1;
        for (j, ac) in a.iter().enumerate() {
            let substitution = prev[j] + usize::from(ac != bc);
            current[j + 1] = substitution.min(prev[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut prev, &mut current);
    }
    prev[a.len()]
}

/// Tabela de bônus pré-computada para (ministro × data distinta do mês),
/// evitando recomputar o casamento de nomes a cada horário.
#[derive(Debug, Clone, Default)]
pub struct SaintBonusTable {
    bonuses: HashMap<(MinisterId, NaiveDate), f64>,
}

impl SaintBonusTable {
    /// Tabela vazia: geração sem bônus (tabela de santos indisponível).
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn precompute<'a, D>(ministers: &[Minister], dates: D, index: &SaintsIndex) -> Self
    where
        D: IntoIterator<Item = &'a NaiveDate>,
    {
        let distinct: BTreeSet<NaiveDate> = dates.into_iter().copied().collect();
        let mut bonuses = HashMap::new();
        for date in distinct {
            let saints = index.for_date(date);
            if saints.is_empty() {
                continue;
            }
            for minister in ministers {
                let bonus = name_match_bonus(&minister.name, saints);
                if bonus > 0.0 {
                    bonuses.insert((minister.id.clone(), date), bonus);
                }
            }
        }
        Self { bonuses }
    }

    pub fn bonus(&self, minister: &MinisterId, date: NaiveDate) -> f64 {
        self.bonuses
            .get(&(minister.clone(), date))
            .copied()
            .unwrap_or(0.0)
    }
}
