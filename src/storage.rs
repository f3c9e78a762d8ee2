//! Fronteira com o colaborador de dados.
//!
//! O núcleo só depende do trait [`DataSource`] (operações lógicas de
//! leitura); [`JsonDataSource`] é a implementação local em arquivo único,
//! sem banco de dados.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::calendar::MassTimeConfig;
use crate::model::{FamilyGroup, FamilyId, Minister, MinisterId};
use crate::saints::SaintsIndex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionnaireStatus {
    Draft,
    Open,
    Sent,
    Active,
    Closed,
}

impl QuestionnaireStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionnaireStatus::Draft => "draft",
            QuestionnaireStatus::Open => "open",
            QuestionnaireStatus::Sent => "sent",
            QuestionnaireStatus::Active => "active",
            QuestionnaireStatus::Closed => "closed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Questionnaire {
    pub id: String,
    pub year: i32,
    pub month: u32,
    pub status: QuestionnaireStatus,
}

/// Resposta bruta de um ministro, no formato em que foi persistida.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResponse {
    pub minister_id: MinisterId,
    pub questionnaire_id: String,
    #[serde(alias = "responses")]
    pub payload: Value,
}

/// Operações de leitura que o gerador consome.
pub trait DataSource {
    /// Ministros ativos e escaláveis (coordenadores e gestores fora).
    fn active_ministers(&self) -> anyhow::Result<Vec<Minister>>;
    fn families(&self, ids: &[FamilyId]) -> anyhow::Result<Vec<FamilyGroup>>;
    fn mass_time_config(&self) -> anyhow::Result<Vec<MassTimeConfig>>;
    fn questionnaire_for_period(
        &self,
        year: i32,
        month: u32,
    ) -> anyhow::Result<Option<Questionnaire>>;
    fn questionnaire_responses(&self, questionnaire_id: &str)
        -> anyhow::Result<Vec<RawResponse>>;
    /// Tabela de santos por "MM-DD"; falha aqui é degradável pelo chamador.
    fn saints_by_feast_day(&self) -> anyhow::Result<SaintsIndex>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct BundleMinister {
    #[serde(flatten)]
    minister: Minister,
    #[serde(default = "default_status")]
    status: String,
}

fn default_status() -> String {
    "active".to_owned()
}

/// Pacote de dados da paróquia em um único JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Bundle {
    #[serde(default)]
    ministers: Vec<BundleMinister>,
    #[serde(default)]
    families: Vec<FamilyGroup>,
    #[serde(default)]
    mass_times: Vec<MassTimeConfig>,
    #[serde(default)]
    questionnaires: Vec<Questionnaire>,
    #[serde(default)]
    responses: Vec<RawResponse>,
    #[serde(default)]
    saints: Option<SaintsIndex>,
}

pub struct JsonDataSource {
    path: PathBuf,
    bundle: Bundle,
}

impl JsonDataSource {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let data =
            fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let bundle: Bundle = serde_json::from_slice(&data)
            .with_context(|| format!("parsing data bundle {}", path.display()))?;
        Ok(Self { path, bundle })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for JsonDataSource {
    fn active_ministers(&self) -> anyhow::Result<Vec<Minister>> {
        Ok(self
            .bundle
            .ministers
            .iter()
            .filter(|m| m.status == "active" && m.minister.role.is_schedulable())
            .map(|m| m.minister.clone())
            .collect())
    }

    fn families(&self, ids: &[FamilyId]) -> anyhow::Result<Vec<FamilyGroup>> {
        let wanted: HashSet<&FamilyId> = ids.iter().collect();
        Ok(self
            .bundle
            .families
            .iter()
            .filter(|f| wanted.contains(&f.id))
            .cloned()
            .collect())
    }

    fn mass_time_config(&self) -> anyhow::Result<Vec<MassTimeConfig>> {
        Ok(self
            .bundle
            .mass_times
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect())
    }

    fn questionnaire_for_period(
        &self,
        year: i32,
        month: u32,
    ) -> anyhow::Result<Option<Questionnaire>> {
        Ok(self
            .bundle
            .questionnaires
            .iter()
            .find(|q| q.year == year && q.month == month)
            .cloned())
    }

    fn questionnaire_responses(
        &self,
        questionnaire_id: &str,
    ) -> anyhow::Result<Vec<RawResponse>> {
        Ok(self
            .bundle
            .responses
            .iter()
            .filter(|r| r.questionnaire_id == questionnaire_id)
            .cloned()
            .collect())
    }

    fn saints_by_feast_day(&self) -> anyhow::Result<SaintsIndex> {
        self.bundle
            .saints
            .clone()
            .context("data bundle has no saints table")
    }
}
