//! Import/export em arquivos locais (CSV/JSON).

use anyhow::{bail, Context};
use chrono::DateTime;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::model::{GeneratedSchedule, Minister, MinisterId, Role, ScheduleStatus};
use crate::scheduler::MonthSchedule;

/// Import de ministros desde CSV: header
/// `id,name[,role][,total_services][,last_service][,family_id]`
pub fn import_ministers_csv<P: AsRef<Path>>(path: P) -> anyhow::Result<Vec<Minister>> {
    let mut rdr = ReaderBuilder::new().has_headers(true).from_path(path)?;
    let mut out = Vec::new();
    for rec in rdr.records() {
        let rec = rec?;
        let id = rec.get(0).context("missing id")?.trim();
        let name = rec.get(1).context("missing name")?.trim();
        if id.is_empty() || name.is_empty() {
            bail!("invalid minister row (empty id or name)");
        }
        let mut minister = Minister::new(name.to_string());
        minister.id = MinisterId::new(id);
        if let Some(role) = rec.get(2) {
            let role = role.trim();
            if !role.is_empty() {
                minister.role = parse_role(role)
                    .with_context(|| format!("invalid role for minister {id}"))?;
            }
        }
        if let Some(total) = rec.get(3) {
            let total = total.trim();
            if !total.is_empty() {
                minister.total_services = total
                    .parse()
                    .with_context(|| format!("invalid total_services for minister {id}"))?;
            }
        }
        if let Some(last) = rec.get(4) {
            let last = last.trim();
            if !last.is_empty() {
                let parsed: DateTime<chrono::Utc> = last
                    .parse()
                    .with_context(|| format!("invalid last_service for minister {id}"))?;
                minister.last_service = Some(parsed);
            }
        }
        if let Some(family) = rec.get(5) {
            let family = family.trim();
            if !family.is_empty() {
                minister.family_id = Some(crate::model::FamilyId::new(family));
            }
        }
        out.push(minister);
    }
    Ok(out)
}

fn parse_role(s: &str) -> anyhow::Result<Role> {
    match s.to_ascii_lowercase().as_str() {
        "ministro" => Ok(Role::Ministro),
        "coordenador" => Ok(Role::Coordenador),
        "gestor" => Ok(Role::Gestor),
        _ => bail!("expected ministro, coordenador or gestor"),
    }
}

/// Export JSON da geração completa (escrita atômica).
pub fn export_schedule_json<P: AsRef<Path>>(
    path: P,
    schedule: &MonthSchedule,
) -> anyhow::Result<()> {
    let json = serde_json::to_vec_pretty(schedule)?;
    write_atomic(path.as_ref(), &json)
}

/// Export CSV das linhas de atribuição:
/// header `date,time,type,minister_id,position,status`
pub fn export_rows_csv<P: AsRef<Path>>(
    path: P,
    schedules: &[GeneratedSchedule],
) -> anyhow::Result<()> {
    let mut w = WriterBuilder::new().has_headers(true).from_path(path)?;
    w.write_record(["date", "time", "type", "minister_id", "position", "status"])?;
    for schedule in schedules {
        for row in schedule.rows() {
            let date = row.date.format("%Y-%m-%d").to_string();
            let time = row.time.format("%H:%M").to_string();
            let minister = row
                .minister_id
                .as_ref()
                .map(|id| id.as_str())
                .unwrap_or("");
            let position = row.position.to_string();
            let status = match row.status {
                ScheduleStatus::Scheduled => "scheduled",
                ScheduleStatus::Vacant => "vacant",
            };
            w.write_record([
                date.as_str(),
                time.as_str(),
                row.mass_type.as_str(),
                minister,
                position.as_str(),
                status,
            ])?;
        }
    }
    w.flush()?;
    Ok(())
}

fn write_atomic(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    let mut tmp = NamedTempFile::new_in(path.parent().unwrap_or_else(|| Path::new(".")))
        .with_context(|| "creating temp file")?;
    tmp.write_all(data)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).with_context(|| "atomic rename")?;
    Ok(())
}

/// Leitura de uma geração exportada (para inspeção e testes).
pub fn load_schedule_json<P: AsRef<Path>>(path: P) -> anyhow::Result<MonthSchedule> {
    let data = fs::read(path.as_ref())
        .with_context(|| format!("reading {}", path.as_ref().display()))?;
    let schedule = serde_json::from_slice(&data).with_context(|| "parsing schedule json")?;
    Ok(schedule)
}
