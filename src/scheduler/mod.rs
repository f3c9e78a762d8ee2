//! Motor de geração de escalas.
//!
//! O [`ScheduleGenerator`] orquestra uma geração completa para (ano, mês):
//! carrega roster e famílias, normaliza a disponibilidade do questionário
//! da competência, monta o calendário de horários, pré-computa os bônus de
//! santo do dia e processa os horários em ordem cronológica — a ordem é
//! requisito de correção, porque a seleção de cada horário depende dos
//! contadores acumulados dos anteriores.

mod eligibility;
mod ledger;
mod scoring;
mod selection;
mod types;

pub use ledger::AssignmentLedger;
pub use types::{AssignOptions, GenerationError, GenerationMode, GenerationSummary};

use tracing::{debug, info, warn};

use crate::availability::{normalize_response, AvailabilityMap, Period};
use crate::calendar::{build_month_slots, validate_october_slots, Severity};
use crate::family::FamilyDirectory;
use crate::model::{FamilyId, GeneratedSchedule, Minister};
use crate::saints::SaintBonusTable;
use crate::storage::{DataSource, QuestionnaireStatus};

use eligibility::SlotContext;

/// Resultado completo de uma geração mensal.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MonthSchedule {
    pub year: i32,
    pub month: u32,
    pub mode: GenerationMode,
    pub schedules: Vec<GeneratedSchedule>,
    pub summary: GenerationSummary,
}

/// Gerador: encapsula o colaborador de dados e as opções de uma geração.
pub struct ScheduleGenerator<D: DataSource> {
    source: D,
    options: AssignOptions,
}

impl<D: DataSource> ScheduleGenerator<D> {
    pub fn new(source: D) -> Self {
        Self {
            source,
            options: AssignOptions::default(),
        }
    }

    pub fn with_options(source: D, options: AssignOptions) -> Self {
        Self { source, options }
    }

    /// Executa uma geração completa. Condições fatais são detectadas logo
    /// após cada carga, antes de qualquer atribuição: nenhuma geração
    /// falhada produz resultado parcial.
    pub fn generate(
        &self,
        year: i32,
        month: u32,
        mode: GenerationMode,
    ) -> Result<MonthSchedule, GenerationError> {
        info!(year, month, ?mode, "iniciando geração de escala");

        let ministers = self.source.active_ministers()?;
        if ministers.is_empty() {
            return Err(GenerationError::EmptyRoster);
        }
        debug!(count = ministers.len(), "ministros carregados");

        let family_ids: Vec<FamilyId> = ministers
            .iter()
            .filter_map(|m| m.family_id.clone())
            .collect();
        let families = self.source.families(&family_ids)?;
        let directory = FamilyDirectory::from_roster(&ministers, &families);

        let availability = self.load_availability(year, month, mode)?;
        debug!(count = availability.len(), "disponibilidades normalizadas");

        let config = self.source.mass_time_config()?;
        if config.is_empty() {
            return Err(GenerationError::EmptyMassConfig);
        }

        let slots = build_month_slots(year, month, &config);
        if slots.is_empty() {
            return Err(GenerationError::EmptyCalendar { year, month });
        }
        debug!(count = slots.len(), "horários do mês gerados");

        if month == 10 {
            for violation in validate_october_slots(&slots) {
                match violation.severity {
                    Severity::Error => warn!(
                        date = %violation.date,
                        time = %violation.time,
                        "calendário de outubro: {}",
                        violation.message
                    ),
                    Severity::Warning => debug!(
                        date = %violation.date,
                        time = %violation.time,
                        "calendário de outubro: {}",
                        violation.message
                    ),
                }
            }
        }

        // bônus de santo: indisponibilidade da tabela degrada para zero
        let bonuses = match self.source.saints_by_feast_day() {
            Ok(index) => {
                SaintBonusTable::precompute(&ministers, slots.iter().map(|s| &s.date), &index)
            }
            Err(error) => {
                warn!(%error, "tabela de santos indisponível, geração sem bônus");
                SaintBonusTable::empty()
            }
        };

        let avg_services = ministers
            .iter()
            .map(|m| m.total_services as f64)
            .sum::<f64>()
            / ministers.len() as f64;

        let mut ledger = AssignmentLedger::new();
        let mut schedules = Vec::with_capacity(slots.len());
        for slot in &slots {
            let ctx = SlotContext {
                slot,
                availability: &availability,
                mode,
                opts: self.options,
            };
            let eligible = eligibility::eligible_ministers(&ministers, &ledger, &ctx);
            let schedule = selection::assign_slot(
                slot,
                eligible,
                &directory,
                &availability,
                &mut ledger,
                &bonuses,
                self.options,
                avg_services,
            );
            debug!(
                slot = slot.id.as_str(),
                selected = schedule.ministers.len(),
                required = slot.min_ministers,
                confidence = schedule.confidence,
                "horário processado"
            );
            schedules.push(schedule);
        }

        let summary = summarize(&ministers, &schedules, &ledger);
        info!(
            total = summary.total_slots,
            incomplete = summary.incomplete_slots,
            avg_confidence = summary.average_confidence,
            zero_pct = summary.zero_assignment_pct,
            "geração concluída"
        );

        Ok(MonthSchedule {
            year,
            month,
            mode,
            schedules,
            summary,
        })
    }

    fn load_availability(
        &self,
        year: i32,
        month: u32,
        mode: GenerationMode,
    ) -> Result<AvailabilityMap, GenerationError> {
        let Some(questionnaire) = self.source.questionnaire_for_period(year, month)? else {
            if mode.is_preview() {
                warn!(year, month, "sem questionário para a competência, preview degradado");
                return Ok(AvailabilityMap::new());
            }
            return Err(GenerationError::QuestionnaireMissing { year, month });
        };

        if !mode.is_preview() && questionnaire.status != QuestionnaireStatus::Closed {
            return Err(GenerationError::QuestionnaireNotClosed {
                year,
                month,
                status: questionnaire.status.as_str().to_owned(),
            });
        }

        let responses = self.source.questionnaire_responses(&questionnaire.id)?;
        if responses.is_empty() {
            if mode.is_preview() {
                warn!(year, month, "questionário sem respostas, preview degradado");
                return Ok(AvailabilityMap::new());
            }
            return Err(GenerationError::NoResponses(questionnaire.id));
        }

        let period = Period::new(year, month);
        let mut map = AvailabilityMap::new();
        for response in &responses {
            let record = normalize_response(&response.minister_id, &response.payload, period);
            map.insert(response.minister_id.clone(), record);
        }
        Ok(map)
    }
}

/// Diagnóstico de justiça da geração: histograma de escalações, percentual
/// de ministros sem escalação e contagem de horários incompletos.
fn summarize(
    ministers: &[Minister],
    schedules: &[GeneratedSchedule],
    ledger: &AssignmentLedger,
) -> GenerationSummary {
    let mut summary = GenerationSummary {
        total_slots: schedules.len(),
        ..GenerationSummary::default()
    };

    for minister in ministers {
        let count = ledger.total_count(&minister.id);
        summary
            .assignments_per_minister
            .insert(minister.id.clone(), count);
        *summary.distribution.entry(count).or_insert(0) += 1;
    }

    let zero = summary.distribution.get(&0).copied().unwrap_or(0);
    summary.zero_assignment_pct = zero as f64 / ministers.len().max(1) as f64 * 100.0;

    summary.incomplete_slots = schedules.iter().filter(|s| !s.is_complete()).count();
    summary.average_confidence = if schedules.is_empty() {
        0.0
    } else {
        schedules.iter().map(|s| s.confidence).sum::<f64>() / schedules.len() as f64
    };

    summary
}
