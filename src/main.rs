use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;

use chiller_loss_toolbox::app::{self, AppError, Quantity};
use chiller_loss_toolbox::report::DateRange;
use chiller_loss_toolbox::{config, logging};

#[derive(Parser)]
#[command(name = "chiller_loss_toolbox")]
#[command(about = "Chiller performance-loss calculation from operator log readings")]
struct Cli {
    /// Config file; defaults to $CHILLER_LOSS_CONFIG or ./config.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich a JSON array of readings with derived loss fields
    Enrich {
        /// Chiller configuration (JSON)
        chiller: PathBuf,
        /// Reading payloads (JSON array)
        readings: PathBuf,
        /// Write output here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Strip fields that do not apply to a chiller from one payload
    Sanitize {
        chiller: PathBuf,
        payload: PathBuf,
    },

    /// Summarize enriched readings per chiller and company-wide
    Report {
        /// Enriched readings (JSON array)
        enriched: PathBuf,
        /// Inclusive start (RFC 3339)
        #[arg(long)]
        from: Option<DateTime<Utc>>,
        /// Exclusive end (RFC 3339)
        #[arg(long)]
        to: Option<DateTime<Utc>>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Convert a value between log-sheet units (TempF, TempC, PSIG, KPA, ...)
    Convert {
        #[arg(value_enum)]
        quantity: Quantity,
        from: String,
        to: String,
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
}

fn main() {
    if let Err(err) = try_run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn emit<T: Serialize>(value: &T, output: Option<&PathBuf>) -> Result<(), AppError> {
    let text = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => fs::write(path, text)?,
        None => println!("{text}"),
    }
    Ok(())
}

fn try_run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let path = cli.config.unwrap_or_else(config::config_path);
    let cfg = config::load_or_default(&path)?;
    logging::init(&cfg.logging.level);

    match cli.command {
        Commands::Enrich {
            chiller,
            readings,
            output,
        } => {
            let chiller = app::load_chiller(&chiller)?;
            let tables = app::load_tables(&cfg.reference)?;
            let enriched = app::enrich_file(&chiller, &readings, &tables)?;
            emit(&enriched, output.as_ref())?;
        }

        Commands::Sanitize { chiller, payload } => {
            let chiller = app::load_chiller(&chiller)?;
            emit(&app::sanitize_file(&chiller, &payload)?, None)?;
        }

        Commands::Report {
            enriched,
            from,
            to,
            json,
        } => {
            let range = DateRange::new(from, to);
            let (chillers, company) = app::report_file(&enriched, &cfg.report.company, &range)?;
            if json {
                emit(&serde_json::json!({ "chillers": chillers, "company": company }), None)?;
            } else {
                for c in &chillers {
                    println!("{c}\n");
                }
                println!("{company}");
            }
        }

        Commands::Convert {
            quantity,
            from,
            to,
            value,
        } => {
            let out = app::convert(quantity, &from, &to, value)?;
            println!("{value} {from} = {out:.4} {to}");
        }
    }
    Ok(())
}
