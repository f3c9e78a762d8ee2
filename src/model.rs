use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identificador forte para Minister
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MinisterId(String);

impl Default for MinisterId {
    fn default() -> Self {
        Self(String::new())
    }
}

impl MinisterId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn random() -> Self {
        Self(Uuid::new_v4().to_string())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identificador forte para família
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FamilyId(String);

impl FamilyId {
    pub fn new<S: AsRef<str>>(s: S) -> Self {
        Self(s.as_ref().to_owned())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Papel do usuário. Só `Ministro` entra na escala.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Ministro,
    Coordenador,
    Gestor,
}

impl Role {
    /// Coordenadores e gestores ficam fora da geração.
    pub fn is_schedulable(self) -> bool {
        matches!(self, Role::Ministro)
    }
}

/// Ministro (voluntário escalável)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Minister {
    pub id: MinisterId,
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub total_services: u32,
    #[serde(default)]
    pub last_service: Option<DateTime<Utc>>,
    #[serde(default)]
    pub preferred_times: Vec<String>,
    #[serde(default)]
    pub can_serve_as_couple: bool,
    #[serde(default)]
    pub spouse_minister_id: Option<MinisterId>,
    #[serde(default)]
    pub family_id: Option<FamilyId>,
}

impl Minister {
    pub fn new<N: Into<String>>(name: N) -> Self {
        Self {
            id: MinisterId::random(),
            name: name.into(),
            role: Role::Ministro,
            total_services: 0,
            last_service: None,
            preferred_times: Vec::new(),
            can_serve_as_couple: false,
            spouse_minister_id: None,
            family_id: None,
        }
    }
}

/// Tipo de missa. A ordem de precedência resolve colisões de (data, hora):
/// festa > novena > cura e libertação > sagrado coração > imaculado coração
/// > dominical > diária.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MassType {
    #[serde(rename = "missa_diaria")]
    Diaria,
    #[serde(rename = "missa_dominical")]
    Dominical,
    #[serde(rename = "missa_cura_libertacao")]
    CuraLibertacao,
    #[serde(rename = "missa_sagrado_coracao")]
    SagradoCoracao,
    #[serde(rename = "missa_imaculado_coracao")]
    ImaculadoCoracao,
    #[serde(rename = "novena_sao_judas")]
    NovenaSaoJudas,
    #[serde(rename = "festa_sao_judas")]
    FestaSaoJudas,
    #[serde(rename = "sao_judas_semana")]
    SaoJudasSemana,
    #[serde(rename = "sao_judas_sabado")]
    SaoJudasSabado,
    #[serde(rename = "sao_judas_domingo")]
    SaoJudasDomingo,
}

impl MassType {
    /// Rank de precedência: menor vence a colisão.
    pub fn precedence(self) -> u8 {
        match self {
            MassType::FestaSaoJudas => 0,
            MassType::NovenaSaoJudas => 1,
            MassType::SaoJudasSemana | MassType::SaoJudasSabado | MassType::SaoJudasDomingo => 2,
            MassType::CuraLibertacao => 3,
            MassType::SagradoCoracao => 4,
            MassType::ImaculadoCoracao => 5,
            MassType::Dominical => 6,
            MassType::Diaria => 7,
        }
    }

    pub fn is_daily(self) -> bool {
        matches!(self, MassType::Diaria)
    }

    /// Missas diárias não contam para o teto mensal.
    pub fn counts_toward_cap(self) -> bool {
        !self.is_daily()
    }

    pub fn is_sao_judas(self) -> bool {
        matches!(
            self,
            MassType::NovenaSaoJudas
                | MassType::FestaSaoJudas
                | MassType::SaoJudasSemana
                | MassType::SaoJudasSabado
                | MassType::SaoJudasDomingo
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MassType::Diaria => "missa_diaria",
            MassType::Dominical => "missa_dominical",
            MassType::CuraLibertacao => "missa_cura_libertacao",
            MassType::SagradoCoracao => "missa_sagrado_coracao",
            MassType::ImaculadoCoracao => "missa_imaculado_coracao",
            MassType::NovenaSaoJudas => "novena_sao_judas",
            MassType::FestaSaoJudas => "festa_sao_judas",
            MassType::SaoJudasSemana => "sao_judas_semana",
            MassType::SaoJudasSabado => "sao_judas_sabado",
            MassType::SaoJudasDomingo => "sao_judas_domingo",
        }
    }
}

/// Um horário de missa a preencher no mês.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MassSlot {
    pub id: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub mass_type: MassType,
    pub min_ministers: u32,
    pub max_ministers: u32,
}

impl MassSlot {
    pub fn new(
        date: NaiveDate,
        time: NaiveTime,
        mass_type: MassType,
        min_ministers: u32,
        max_ministers: u32,
    ) -> Self {
        Self {
            id: format!("{}_{}", date.format("%Y-%m-%d"), time.format("%H:%M")),
            date,
            time,
            mass_type,
            min_ministers,
            max_ministers,
        }
    }

    pub fn day_of_week(&self) -> Weekday {
        self.date.weekday()
    }

    /// Chave "YYYY-MM-DD_HH:MM" usada pelos questionários v2.0.
    pub fn date_time_key(&self) -> String {
        self.id.clone()
    }
}

/// Grupo familiar: membros + preferência de servir juntos (padrão: sim).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyGroup {
    pub id: FamilyId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_true")]
    pub prefer_serve_together: bool,
}

fn default_true() -> bool {
    true
}

/// Ministro escalado em um horário, com posição 1-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignedMinister {
    pub minister_id: MinisterId,
    pub name: String,
    pub position: u32,
    #[serde(default)]
    pub schedule_incomplete: bool,
    #[serde(default)]
    pub required_count: u32,
    #[serde(default)]
    pub actual_count: u32,
}

/// Reserva sugerida para um horário, com o score que a ordenou.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupMinister {
    pub minister_id: MinisterId,
    pub name: String,
    pub score: f64,
}

/// Resultado da geração para um horário de missa.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedSchedule {
    pub slot: MassSlot,
    pub ministers: Vec<AssignedMinister>,
    pub backup_ministers: Vec<BackupMinister>,
    /// Score de confiança em [0, 1].
    pub confidence: f64,
}

impl GeneratedSchedule {
    pub fn is_complete(&self) -> bool {
        self.ministers.len() as u32 >= self.slot.min_ministers
    }

    /// Linhas persistíveis (uma por ministro; horário vazio gera uma linha vaga).
    pub fn rows(&self) -> Vec<ScheduleRow> {
        if self.ministers.is_empty() {
            return vec![ScheduleRow {
                date: self.slot.date,
                time: self.slot.time,
                mass_type: self.slot.mass_type,
                minister_id: None,
                position: 0,
                status: ScheduleStatus::Vacant,
            }];
        }
        self.ministers
            .iter()
            .map(|m| ScheduleRow {
                date: self.slot.date,
                time: self.slot.time,
                mass_type: self.slot.mass_type,
                minister_id: Some(m.minister_id.clone()),
                position: m.position,
                status: ScheduleStatus::Scheduled,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleStatus {
    Scheduled,
    Vacant,
}

/// Unidade de escrita aceita pelo colaborador de persistência.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub mass_type: MassType,
    pub minister_id: Option<MinisterId>,
    pub position: u32,
    pub status: ScheduleStatus,
}
