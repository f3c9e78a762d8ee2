#![forbid(unsafe_code)]
//! Escala — biblioteca de geração automática de escalas de ministros (sem BD).
//!
//! - Dados em arquivos (JSON/CSV).
//! - Normalização tolerante dos formatos históricos de questionário.
//! - Calendário litúrgico do mês com resolução de colisões por precedência.
//! - Seleção justa (menos escalado primeiro), famílias em bloco, reservas.
//! - Datas civis em `NaiveDate`; horários "HH:MM"; nada de fuso na lib.

pub mod availability;
pub mod calendar;
pub mod family;
pub mod io;
pub mod model;
pub mod saints;
pub mod scheduler;
pub mod storage;

pub use availability::{normalize_response, AvailabilityMap, AvailabilityRecord, Period};
pub use calendar::{build_month_slots, validate_october_slots, CalendarViolation, MassTimeConfig};
pub use family::FamilyDirectory;
pub use model::{
    AssignedMinister, BackupMinister, FamilyGroup, FamilyId, GeneratedSchedule, MassSlot, MassType,
    Minister, MinisterId, Role, ScheduleRow, ScheduleStatus,
};
pub use saints::{name_match_bonus, Saint, SaintBonusTable, SaintRank, SaintsIndex};
pub use scheduler::{
    AssignOptions, GenerationError, GenerationMode, GenerationSummary, MonthSchedule,
    ScheduleGenerator,
};
pub use storage::{DataSource, JsonDataSource, Questionnaire, QuestionnaireStatus, RawResponse};
