#![forbid(unsafe_code)]
use anyhow::bail;
use chrono::{Datelike, NaiveTime};
use escala::{
    DataSource, FamilyGroup, FamilyId, GenerationError, GenerationMode, MassTimeConfig, MassType,
    Minister, MinisterId, Questionnaire, QuestionnaireStatus, RawResponse, SaintsIndex,
    ScheduleGenerator,
};
use serde_json::{json, Value};
use std::collections::HashMap;

// ===== fonte de dados de teste =====

#[derive(Default)]
struct TestSource {
    ministers: Vec<Minister>,
    families: Vec<FamilyGroup>,
    config: Vec<MassTimeConfig>,
    questionnaire: Option<Questionnaire>,
    responses: Vec<RawResponse>,
}

impl DataSource for TestSource {
    fn active_ministers(&self) -> anyhow::Result<Vec<Minister>> {
        Ok(self.ministers.clone())
    }

    fn families(&self, _ids: &[FamilyId]) -> anyhow::Result<Vec<FamilyGroup>> {
        Ok(self.families.clone())
    }

    fn mass_time_config(&self) -> anyhow::Result<Vec<MassTimeConfig>> {
        Ok(self.config.clone())
    }

    fn questionnaire_for_period(
        &self,
        year: i32,
        month: u32,
    ) -> anyhow::Result<Option<Questionnaire>> {
        Ok(self
            .questionnaire
            .clone()
            .filter(|q| q.year == year && q.month == month))
    }

    fn questionnaire_responses(&self, questionnaire_id: &str) -> anyhow::Result<Vec<RawResponse>> {
        Ok(self
            .responses
            .iter()
            .filter(|r| r.questionnaire_id == questionnaire_id)
            .cloned()
            .collect())
    }

    fn saints_by_feast_day(&self) -> anyhow::Result<SaintsIndex> {
        bail!("saints table unavailable in tests")
    }
}

fn minister(id: &str, total_services: u32) -> Minister {
    let mut m = Minister::new(id);
    m.id = MinisterId::new(id);
    m.total_services = total_services;
    m
}

fn family_member(id: &str, total_services: u32, family: &str) -> Minister {
    let mut m = minister(id, total_services);
    m.family_id = Some(FamilyId::new(family));
    m
}

fn closed_questionnaire(year: i32, month: u32) -> Questionnaire {
    Questionnaire {
        id: "q1".to_owned(),
        year,
        month,
        status: QuestionnaireStatus::Closed,
    }
}

fn response(minister_id: &str, payload: Value) -> RawResponse {
    RawResponse {
        minister_id: MinisterId::new(minister_id),
        questionnaire_id: "q1".to_owned(),
        payload,
    }
}

fn default_config() -> Vec<MassTimeConfig> {
    vec![MassTimeConfig {
        day_of_week: 0,
        time: NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
        min_ministers: 20,
        max_ministers: 20,
        is_active: true,
    }]
}

fn sunday_size_config(time: (u32, u32), min: u32, max: u32) -> MassTimeConfig {
    MassTimeConfig {
        day_of_week: 0,
        time: NaiveTime::from_hms_opt(time.0, time.1, 0).unwrap(),
        min_ministers: min,
        max_ministers: max,
        is_active: true,
    }
}

fn all_sundays_and_weekdays() -> Value {
    json!([
        { "questionId": "available_sundays", "answer": ["1", "2", "3", "4", "5"] },
        { "questionId": "daily_mass_availability", "answer": "Sim" }
    ])
}

// ===== limites duros =====

#[test]
fn monthly_cap_blocks_non_daily_but_not_daily() {
    let source = TestSource {
        ministers: vec![minister("solo", 3)],
        config: default_config(),
        questionnaire: Some(closed_questionnaire(2025, 11)),
        responses: vec![response("solo", all_sundays_and_weekdays())],
        ..TestSource::default()
    };

    let schedule = ScheduleGenerator::new(source)
        .generate(2025, 11, GenerationMode::Final)
        .unwrap();

    let non_daily_with_solo = schedule
        .schedules
        .iter()
        .filter(|s| s.slot.mass_type.counts_toward_cap())
        .filter(|s| s.ministers.iter().any(|m| m.minister_id.as_str() == "solo"))
        .count();
    assert_eq!(non_daily_with_solo, 4, "teto mensal de não diárias é 4");

    // novembro/2025 tem 18 missas diárias (seg-sex, fora o dia 28 e a
    // primeira sexta, que vira Sagrado Coração); o teto não alcança nenhuma
    let daily_with_solo = schedule
        .schedules
        .iter()
        .filter(|s| s.slot.mass_type == MassType::Diaria)
        .filter(|s| s.ministers.iter().any(|m| m.minister_id.as_str() == "solo"))
        .count();
    assert_eq!(daily_with_solo, 18);

    // diárias seguem depois de o teto fechar (último domingo é 30/11)
    assert!(schedule
        .schedules
        .iter()
        .filter(|s| s.slot.mass_type == MassType::Diaria && s.slot.date.day() >= 24)
        .all(|s| s.ministers.iter().any(|m| m.minister_id.as_str() == "solo")));
}

#[test]
fn no_minister_serves_twice_on_the_same_date() {
    let everything = json!([
        { "questionId": "available_sundays", "answer": ["1", "2", "3", "4", "5"] },
        { "questionId": "daily_mass_availability", "answer": "Sim" },
        { "questionId": "healing_liberation_mass", "answer": "Sim" },
        { "questionId": "sacred_heart_mass", "answer": "Sim" },
        { "questionId": "immaculate_heart_mass", "answer": "Sim" },
        { "questionId": "can_substitute", "answer": "Sim" }
    ]);
    let source = TestSource {
        ministers: vec![minister("a", 0), minister("b", 1), minister("c", 2)],
        config: default_config(),
        questionnaire: Some(closed_questionnaire(2025, 10)),
        responses: vec![
            response("a", everything.clone()),
            response("b", everything.clone()),
            response("c", everything),
        ],
        ..TestSource::default()
    };

    let schedule = ScheduleGenerator::new(source)
        .generate(2025, 10, GenerationMode::Final)
        .unwrap();

    let mut per_date: HashMap<(String, String), u32> = HashMap::new();
    for generated in &schedule.schedules {
        for assigned in &generated.ministers {
            let key = (
                assigned.minister_id.as_str().to_owned(),
                generated.slot.date.to_string(),
            );
            *per_date.entry(key).or_insert(0) += 1;
        }
    }
    assert!(
        per_date.values().all(|count| *count == 1),
        "ninguém serve duas vezes no mesmo dia"
    );
}

#[test]
fn confidence_is_always_within_bounds() {
    let source = TestSource {
        ministers: vec![minister("a", 0), minister("b", 10)],
        config: default_config(),
        questionnaire: Some(closed_questionnaire(2025, 11)),
        responses: vec![
            response("a", all_sundays_and_weekdays()),
            response("b", all_sundays_and_weekdays()),
        ],
        ..TestSource::default()
    };

    let schedule = ScheduleGenerator::new(source)
        .generate(2025, 11, GenerationMode::Final)
        .unwrap();

    for generated in &schedule.schedules {
        assert!((0.0..=1.0).contains(&generated.confidence));
        if (generated.ministers.len() as u32) < generated.slot.min_ministers {
            assert!(generated.confidence <= 0.5);
        }
    }
}

// ===== famílias =====

#[test]
fn together_family_enters_whole_before_individuals() {
    let source = TestSource {
        ministers: vec![
            family_member("ana", 5, "f1"),
            family_member("beto", 6, "f1"),
            minister("carla", 0),
        ],
        families: vec![FamilyGroup {
            id: FamilyId::new("f1"),
            name: None,
            prefer_serve_together: true,
        }],
        config: vec![
            sunday_size_config((8, 0), 0, 0),
            sunday_size_config((10, 0), 2, 2),
            sunday_size_config((19, 0), 0, 0),
        ],
        questionnaire: Some(closed_questionnaire(2025, 11)),
        responses: vec![
            response("ana", json!([{ "questionId": "available_sundays", "answer": ["1"] }])),
            response("beto", json!([{ "questionId": "available_sundays", "answer": ["1"] }])),
            response("carla", json!([{ "questionId": "available_sundays", "answer": ["1"] }])),
        ],
        ..TestSource::default()
    };

    let schedule = ScheduleGenerator::new(source)
        .generate(2025, 11, GenerationMode::Final)
        .unwrap();

    let ten = schedule
        .schedules
        .iter()
        .find(|s| {
            s.slot.date.to_string() == "2025-11-02"
                && s.slot.time.format("%H:%M").to_string() == "10:00"
        })
        .unwrap();

    let names: Vec<&str> = ten.ministers.iter().map(|m| m.minister_id.as_str()).collect();
    assert_eq!(names, vec!["ana", "beto"], "família em bloco antes da individual");
    assert_eq!(ten.ministers[0].position, 1);
    assert_eq!(ten.ministers[1].position, 2);
}

#[test]
fn separate_family_members_are_picked_individually() {
    let source = TestSource {
        ministers: vec![family_member("dave", 0, "f2"), family_member("eva", 1, "f2")],
        families: vec![FamilyGroup {
            id: FamilyId::new("f2"),
            name: None,
            prefer_serve_together: false,
        }],
        config: vec![
            sunday_size_config((8, 0), 0, 0),
            sunday_size_config((10, 0), 1, 1),
            sunday_size_config((19, 0), 0, 0),
        ],
        questionnaire: Some(closed_questionnaire(2025, 11)),
        responses: vec![
            response("dave", json!([{ "questionId": "available_sundays", "answer": ["1"] }])),
            response("eva", json!([{ "questionId": "available_sundays", "answer": ["1"] }])),
        ],
        ..TestSource::default()
    };

    let schedule = ScheduleGenerator::new(source)
        .generate(2025, 11, GenerationMode::Final)
        .unwrap();

    let ten = schedule
        .schedules
        .iter()
        .find(|s| {
            s.slot.date.to_string() == "2025-11-02"
                && s.slot.time.format("%H:%M").to_string() == "10:00"
        })
        .unwrap();
    let names: Vec<&str> = ten.ministers.iter().map(|m| m.minister_id.as_str()).collect();
    assert_eq!(names, vec!["dave"], "família separada não entra em bloco");
}

#[test]
fn family_addition_is_bounded_by_capacity() {
    let source = TestSource {
        ministers: vec![
            family_member("a", 0, "f1"),
            family_member("b", 1, "f1"),
            family_member("c", 2, "f1"),
        ],
        families: vec![FamilyGroup {
            id: FamilyId::new("f1"),
            name: None,
            prefer_serve_together: true,
        }],
        config: vec![
            sunday_size_config((8, 0), 0, 0),
            sunday_size_config((10, 0), 2, 2),
            sunday_size_config((19, 0), 0, 0),
        ],
        questionnaire: Some(closed_questionnaire(2025, 11)),
        responses: vec![
            response("a", json!([{ "questionId": "available_sundays", "answer": ["1"] }])),
            response("b", json!([{ "questionId": "available_sundays", "answer": ["1"] }])),
            response("c", json!([{ "questionId": "available_sundays", "answer": ["1"] }])),
        ],
        ..TestSource::default()
    };

    let schedule = ScheduleGenerator::new(source)
        .generate(2025, 11, GenerationMode::Final)
        .unwrap();

    let ten = schedule
        .schedules
        .iter()
        .find(|s| {
            s.slot.date.to_string() == "2025-11-02"
                && s.slot.time.format("%H:%M").to_string() == "10:00"
        })
        .unwrap();
    assert_eq!(ten.ministers.len(), 2, "capacidade limita o bloco familiar");
    assert!(ten
        .ministers
        .iter()
        .all(|m| ["a", "b"].contains(&m.minister_id.as_str())));
}

// ===== incompletude e reservas =====

#[test]
fn underfilled_slot_is_flagged_and_capped_at_half_confidence() {
    let weekdays_only = json!([{ "questionId": "daily_mass_availability", "answer": "Sim" }]);
    let source = TestSource {
        ministers: vec![minister("a", 0), minister("b", 0), minister("c", 0)],
        config: default_config(),
        questionnaire: Some(closed_questionnaire(2025, 11)),
        responses: vec![
            response("a", weekdays_only.clone()),
            response("b", weekdays_only.clone()),
            response("c", weekdays_only),
        ],
        ..TestSource::default()
    };

    let schedule = ScheduleGenerator::new(source)
        .generate(2025, 11, GenerationMode::Final)
        .unwrap();

    let daily = schedule
        .schedules
        .iter()
        .find(|s| s.slot.mass_type == MassType::Diaria)
        .unwrap();

    assert_eq!(daily.slot.min_ministers, 5);
    assert_eq!(daily.ministers.len(), 3);
    assert!(daily.confidence <= 0.5);
    for assigned in &daily.ministers {
        assert!(assigned.schedule_incomplete);
        assert_eq!(assigned.required_count, 5);
        assert_eq!(assigned.actual_count, 3);
    }
    assert!(schedule.summary.incomplete_slots > 0);
}

#[test]
fn backups_come_from_unselected_eligible_ministers() {
    let sunday_one = json!([{ "questionId": "available_sundays", "answer": ["1"] }]);
    let source = TestSource {
        ministers: vec![
            minister("a", 0),
            minister("b", 1),
            minister("c", 2),
            minister("d", 3),
        ],
        config: vec![
            sunday_size_config((8, 0), 0, 0),
            sunday_size_config((10, 0), 1, 1),
            sunday_size_config((19, 0), 0, 0),
        ],
        questionnaire: Some(closed_questionnaire(2025, 11)),
        responses: vec![
            response("a", sunday_one.clone()),
            response("b", sunday_one.clone()),
            response("c", sunday_one.clone()),
            response("d", sunday_one),
        ],
        ..TestSource::default()
    };

    let schedule = ScheduleGenerator::new(source)
        .generate(2025, 11, GenerationMode::Final)
        .unwrap();

    let ten = schedule
        .schedules
        .iter()
        .find(|s| {
            s.slot.date.to_string() == "2025-11-02"
                && s.slot.time.format("%H:%M").to_string() == "10:00"
        })
        .unwrap();

    assert_eq!(ten.ministers.len(), 1);
    assert_eq!(ten.backup_ministers.len(), 2);
    let selected: Vec<&str> = ten.ministers.iter().map(|m| m.minister_id.as_str()).collect();
    for backup in &ten.backup_ministers {
        assert!(!selected.contains(&backup.minister_id.as_str()));
    }
    assert!(ten.confidence >= 0.6, "horário completo parte de 0.6");
}

// ===== modos e falhas =====

#[test]
fn final_mode_requires_closed_questionnaire_with_responses() {
    let base = || TestSource {
        ministers: vec![minister("a", 0)],
        config: default_config(),
        ..TestSource::default()
    };

    // sem questionário
    let err = ScheduleGenerator::new(base())
        .generate(2025, 11, GenerationMode::Final)
        .unwrap_err();
    assert!(matches!(err, GenerationError::QuestionnaireMissing { .. }));

    // questionário aberto
    let mut source = base();
    source.questionnaire = Some(Questionnaire {
        status: QuestionnaireStatus::Open,
        ..closed_questionnaire(2025, 11)
    });
    let err = ScheduleGenerator::new(source)
        .generate(2025, 11, GenerationMode::Final)
        .unwrap_err();
    assert!(matches!(err, GenerationError::QuestionnaireNotClosed { .. }));

    // fechado, sem respostas
    let mut source = base();
    source.questionnaire = Some(closed_questionnaire(2025, 11));
    let err = ScheduleGenerator::new(source)
        .generate(2025, 11, GenerationMode::Final)
        .unwrap_err();
    assert!(matches!(err, GenerationError::NoResponses(_)));
}

#[test]
fn preview_mode_degrades_to_available_by_default() {
    let source = TestSource {
        ministers: vec![minister("a", 0), minister("b", 1)],
        config: default_config(),
        ..TestSource::default()
    };

    let schedule = ScheduleGenerator::new(source)
        .generate(2025, 11, GenerationMode::Preview)
        .unwrap();

    let first_sunday = schedule
        .schedules
        .iter()
        .find(|s| s.slot.mass_type == MassType::Dominical)
        .unwrap();
    assert_eq!(
        first_sunday.ministers.len(),
        2,
        "preview sem respostas trata todos como disponíveis"
    );
}

#[test]
fn preview_with_data_excludes_ministers_without_record() {
    let source = TestSource {
        ministers: vec![minister("responded", 0), minister("silent", 0)],
        config: default_config(),
        questionnaire: Some(closed_questionnaire(2025, 11)),
        responses: vec![response(
            "responded",
            json!([{ "questionId": "available_sundays", "answer": ["1", "2", "3", "4", "5"] }]),
        )],
        ..TestSource::default()
    };

    let schedule = ScheduleGenerator::new(source)
        .generate(2025, 11, GenerationMode::Preview)
        .unwrap();

    let first_sunday = schedule
        .schedules
        .iter()
        .find(|s| s.slot.mass_type == MassType::Dominical)
        .unwrap();
    let names: Vec<&str> = first_sunday
        .ministers
        .iter()
        .map(|m| m.minister_id.as_str())
        .collect();
    assert_eq!(names, vec!["responded"]);
}

#[test]
fn empty_roster_and_empty_config_are_fatal_in_any_mode() {
    for mode in [GenerationMode::Preview, GenerationMode::Final] {
        let source = TestSource {
            config: default_config(),
            ..TestSource::default()
        };
        let err = ScheduleGenerator::new(source).generate(2025, 11, mode).unwrap_err();
        assert!(matches!(err, GenerationError::EmptyRoster));

        let source = TestSource {
            ministers: vec![minister("a", 0)],
            questionnaire: Some(closed_questionnaire(2025, 11)),
            responses: vec![response("a", all_sundays_and_weekdays())],
            ..TestSource::default()
        };
        let err = ScheduleGenerator::new(source).generate(2025, 11, mode).unwrap_err();
        assert!(matches!(err, GenerationError::EmptyMassConfig));
    }
}

#[test]
fn fairness_prefers_least_assigned_first() {
    // dois domingos: quem ficou de fora no primeiro entra no segundo
    let sunday_all = json!([{ "questionId": "available_sundays", "answer": ["1", "2", "3", "4", "5"] }]);
    let source = TestSource {
        ministers: vec![minister("x", 0), minister("y", 0)],
        config: vec![
            sunday_size_config((8, 0), 0, 0),
            sunday_size_config((10, 0), 1, 1),
            sunday_size_config((19, 0), 0, 0),
        ],
        questionnaire: Some(closed_questionnaire(2025, 11)),
        responses: vec![
            response("x", sunday_all.clone()),
            response("y", sunday_all),
        ],
        ..TestSource::default()
    };

    let schedule = ScheduleGenerator::new(source)
        .generate(2025, 11, GenerationMode::Final)
        .unwrap();

    let sundays: Vec<&str> = schedule
        .schedules
        .iter()
        .filter(|s| s.slot.mass_type == MassType::Dominical && !s.ministers.is_empty())
        .map(|s| s.ministers[0].minister_id.as_str())
        .collect();

    // cinco domingos: alternância x, y, x, y, x
    assert_eq!(sundays, vec!["x", "y", "x", "y", "x"]);
}
