#![forbid(unsafe_code)]
use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use escala::{
    build_month_slots, io, validate_october_slots, DataSource, GenerationMode, JsonDataSource,
    ScheduleGenerator,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de geração de escalas (sem banco de dados)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Ativa os logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Pacote JSON de dados da paróquia
    #[arg(long, global = true, default_value = "paroquia.json")]
    data: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Imprimir o calendário de horários do mês
    Slots {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
    },

    /// Geração tolerante (questionário aberto ou ausente)
    Preview {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Geração definitiva (exige questionário fechado com respostas)
    Generate {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        #[arg(long)]
        out_json: Option<String>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Importar ministros de um CSV e imprimir o bloco JSON correspondente
    ImportMinisters {
        #[arg(long)]
        csv: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }
    #[cfg(not(feature = "logging"))]
    let _ = cli.log;

    let code = match cli.cmd {
        Commands::Slots { year, month } => {
            let source = JsonDataSource::open(&cli.data)?;
            let config = source.mass_time_config()?;
            let slots = build_month_slots(year, month, &config);
            if slots.is_empty() {
                bail!("nenhum horário gerado para {month}/{year}");
            }
            for slot in &slots {
                println!(
                    "{} {} | {} | {}-{} ministros",
                    slot.date.format("%Y-%m-%d"),
                    slot.time.format("%H:%M"),
                    slot.mass_type.as_str(),
                    slot.min_ministers,
                    slot.max_ministers
                );
            }
            let violations = validate_october_slots(&slots);
            for violation in &violations {
                eprintln!(
                    "aviso: {} {} — {}",
                    violation.date, violation.time, violation.message
                );
            }
            0
        }
        Commands::Preview {
            year,
            month,
            out_json,
            out_csv,
        } => run_generation(&cli.data, year, month, GenerationMode::Preview, out_json, out_csv)?,
        Commands::Generate {
            year,
            month,
            out_json,
            out_csv,
        } => run_generation(&cli.data, year, month, GenerationMode::Final, out_json, out_csv)?,
        Commands::ImportMinisters { csv } => {
            let ministers = io::import_ministers_csv(csv)?;
            println!("{}", serde_json::to_string_pretty(&ministers)?);
            0
        }
    };

    std::process::exit(code);
}

fn run_generation(
    data: &str,
    year: i32,
    month: u32,
    mode: GenerationMode,
    out_json: Option<String>,
    out_csv: Option<String>,
) -> Result<i32> {
    let source = JsonDataSource::open(data)?;
    let generator = ScheduleGenerator::new(source);
    let schedule = generator.generate(year, month, mode)?;

    for generated in &schedule.schedules {
        println!(
            "{} {} | {} | {}/{} | confiança {:.2}",
            generated.slot.date.format("%Y-%m-%d"),
            generated.slot.time.format("%H:%M"),
            generated.slot.mass_type.as_str(),
            generated.ministers.len(),
            generated.slot.min_ministers,
            generated.confidence
        );
    }
    println!(
        "total {} | incompletos {} | confiança média {:.2} | sem escalação {:.0}%",
        schedule.summary.total_slots,
        schedule.summary.incomplete_slots,
        schedule.summary.average_confidence,
        schedule.summary.zero_assignment_pct
    );

    if let Some(path) = out_json {
        io::export_schedule_json(path, &schedule)?;
    }
    if let Some(path) = out_csv {
        io::export_rows_csv(path, &schedule.schedules)?;
    }

    // código 2 = escala gerada com horários incompletos
    Ok(if schedule.summary.incomplete_slots > 0 {
        2
    } else {
        0
    })
}
