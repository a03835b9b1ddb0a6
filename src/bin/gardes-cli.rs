#![forbid(unsafe_code)]
use anyhow::{bail, Context, Result};
use chrono::{Duration, Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use gardes::{
    build_schedule, demo_request, detect_conflicts, io,
    model::ScheduleRequest,
    report::{self, DeviationRow, GroupBy},
    storage::{JsonStorage, ScheduleRun, Storage},
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de construction de tableaux de garde équitables (sans base de données)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Fichier JSON de l'exécution (demande + graine + planning)
    #[arg(long, global = true, default_value = "run.json")]
    run: String,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Écrire une demande de démonstration (JSON)
    Demo {
        #[arg(long)]
        out: String,
        /// YYYY-MM-DD (défaut : aujourd'hui)
        #[arg(long)]
        start: Option<String>,
        /// YYYY-MM-DD (défaut : start + 27 jours)
        #[arg(long)]
        end: Option<String>,
    },

    /// Construire un planning et l'enregistrer dans `--run`
    Build {
        /// Demande JSON complète
        #[arg(long)]
        request: Option<String>,
        /// CSV `name,tier[,bias][,extra_oncalls][,night_float]`
        #[arg(long)]
        people: Option<String>,
        /// CSV `label,tier[,night_float][,weekend_extra_day][,points]`
        #[arg(long)]
        shifts: Option<String>,
        /// CSV `name,kind,from,to`
        #[arg(long)]
        windows: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long)]
        min_gap: Option<u32>,
        #[arg(long)]
        block_length: Option<u32>,
        /// Autorise deux gardes le même jour (seul l'écart minimal s'applique)
        #[arg(long)]
        allow_same_day: bool,
        /// Export CSV de la grille
        #[arg(long)]
        out_csv: Option<String>,
        /// Export CSV du récapitulatif
        #[arg(long)]
        summary_csv: Option<String>,
    },

    /// Vérifier les contraintes du planning enregistré
    Check {
        /// Export CSV des conflits (optionnel)
        #[arg(long)]
        report: Option<String>,
    },

    /// Rapports d'équité du planning enregistré
    Report {
        #[arg(long, default_value_t = 0.0)]
        tolerance: f64,
        #[arg(long, value_enum, default_value_t = Grouping::Participant)]
        group_by: Grouping,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Grouping {
    Participant,
    Tier,
    Shift,
}

impl From<Grouping> for GroupBy {
    fn from(g: Grouping) -> Self {
        match g {
            Grouping::Participant => GroupBy::Participant,
            Grouping::Tier => GroupBy::Tier,
            Grouping::Shift => GroupBy::Shift,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let storage = JsonStorage::open(&cli.run)?;

    let code = match cli.cmd {
        Commands::Demo { out, start, end } => {
            let start = match start {
                Some(raw) => parse_date(&raw)?,
                None => Local::now().date_naive(),
            };
            let end = match end {
                Some(raw) => parse_date(&raw)?,
                None => start + Duration::days(27),
            };
            let request = demo_request(start, end);
            std::fs::write(&out, serde_json::to_string_pretty(&request)?)
                .with_context(|| format!("writing {out}"))?;
            println!(
                "Demo request written to {out} ({} participants, {} shifts)",
                request.participants.len(),
                request.shifts.len()
            );
            0
        }
        Commands::Build {
            request,
            people,
            shifts,
            windows,
            start,
            end,
            seed,
            min_gap,
            block_length,
            allow_same_day,
            out_csv,
            summary_csv,
        } => {
            let mut request = match request {
                Some(path) => io::load_request_json(path)?,
                None => ScheduleRequest::new(
                    parse_date(start.as_deref().context("--start is required without --request")?)?,
                    parse_date(end.as_deref().context("--end is required without --request")?)?,
                ),
            };
            if let Some(path) = people {
                request.participants.extend(io::import_participants_csv(path)?);
            }
            if let Some(path) = shifts {
                for template in io::import_shifts_csv(path)? {
                    request.add_shift(template);
                }
            }
            if let Some(path) = windows {
                request.windows.extend(io::import_windows_csv(path)?);
            }
            if let Some(gap) = min_gap {
                request.options.min_gap_days = gap;
            }
            if let Some(len) = block_length {
                request.options.night_float_block_length = len;
            }
            if allow_same_day {
                request.options.same_day_exclusive = false;
            }
            io::validate_request(&request)?;
            if request.shifts.is_empty() {
                bail!("no shift template given");
            }

            let result = build_schedule(&request, seed)?;
            if let Some(path) = out_csv {
                io::export_grid_csv(path, &result)?;
            }
            if let Some(path) = summary_csv {
                io::export_summary_csv(path, &report::summary_table(&result))?;
            }
            println!(
                "Built {} day(s) × {} shift(s), {} unfilled slot(s)",
                result.rows.len(),
                result.labels.len(),
                result.unfilled.len()
            );
            for slot in &result.unfilled {
                println!("  unfilled: {} {}", slot.date, slot.label);
            }
            storage.save(&ScheduleRun { request, seed, result })?;
            0
        }
        Commands::Check { report } => {
            let run = storage.load()?;
            let conflicts = detect_conflicts(&run.request, &run.result);
            if conflicts.is_empty() {
                println!("OK: no conflicts");
                0
            } else {
                eprintln!("Found {} conflict(s)", conflicts.len());
                for c in &conflicts {
                    eprintln!("  {} {} {} ({})", c.kind.as_str(), c.participant, c.date, c.label);
                }
                if let Some(path) = report {
                    // CSV simple
                    let mut w = csv::Writer::from_path(path)?;
                    w.write_record(["participant", "date", "label", "other_date", "other_label", "kind"])?;
                    for c in &conflicts {
                        let date = c.date.to_string();
                        let (other_date, other_label) = match &c.other {
                            Some((d, l)) => (d.to_string(), l.clone()),
                            None => (String::new(), String::new()),
                        };
                        w.write_record([
                            c.participant.as_str(),
                            date.as_str(),
                            c.label.as_str(),
                            other_date.as_str(),
                            other_label.as_str(),
                            c.kind.as_str(),
                        ])?;
                    }
                    w.flush()?;
                }
                // Code 2 = WARNING/INCOMPLETE
                2
            }
        }
        Commands::Report { tolerance, group_by } => {
            let run = storage.load()?;
            let table = report::summary_table(&run.result);

            println!("== Summary ==");
            for row in report::compact_summary(&run.result, group_by.into()) {
                println!(
                    "{} | total {} | weekend {} | points {:.1} / {:.1}",
                    row.key, row.total, row.weekend, row.assigned_points, row.expected_points
                );
            }
            println!("== Deviation from median (tolerance {tolerance}) ==");
            print_deviations(&report::median_report(&table, tolerance));
            println!("== Deviation from expected (tolerance {tolerance}) ==");
            print_deviations(&report::expectation_report(&table, tolerance));
            println!("== Fairness ==");
            println!("{}", report::fairness_log(&run.request, &run.result));
            0
        }
    };

    std::process::exit(code);
}

fn print_deviations(rows: &[DeviationRow]) {
    if rows.is_empty() {
        println!("(none)");
    }
    for row in rows {
        match row {
            DeviationRow::Label {
                participant,
                label,
                total_delta,
                weekend_delta,
            } => println!("{participant} | {label} | total {total_delta:+.1} | weekend {weekend_delta:+.1}"),
            DeviationRow::Points {
                participant,
                points_delta,
            } => println!("{participant} | points {points_delta:+.1}"),
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").with_context(|| format!("invalid date: {raw}"))
}
