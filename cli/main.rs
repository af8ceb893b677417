// ========================================================================================
//
//                      Command-line front end: dialysis-hazard
//
// ========================================================================================
//
// Collects patient inputs, hands them to the scorer and renders the result. The scorer
// itself is pure; everything with side effects (model files, exports, stdout, logging)
// happens here.

#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]

use clap::{Args, CommandFactory, Parser, Subcommand};
use itertools::Itertools;
use std::borrow::Cow;
use std::error::Error;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process;

use dialysis_hazard::report::csv::CsvVariant;
use dialysis_hazard::report::text::render_text;
use dialysis_hazard::report::{self, ScoredPatient};
use dialysis_hazard::{ModelSpec, PatientInput, RiskScorer, RiskTier, batch};

// ========================================================================================
//                              Command-line interface definition
// ========================================================================================

#[derive(Parser)]
#[command(
    name = "dialysis-hazard",
    version,
    about = "Hazard risk ratio calculator for dialysis patients (Cox model)."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
pub struct ScoreArgs {
    /// Patient gender (Male or Female)
    #[arg(long)]
    pub gender: String,

    /// Age at start of dialysis, in years (0-120)
    #[arg(long, allow_negative_numbers = true)]
    pub age: i64,

    /// Primary comorbidity, as listed by the `catalog` subcommand
    #[arg(long)]
    pub comorbidity: String,

    /// Model file (.toml) replacing the builtin tables
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Write the CSV result (defaults to hazard_ratio.csv when no path is given)
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = report::CSV_FILE_NAME)]
    pub csv: Option<PathBuf>,

    /// Use the minimal CSV header without the risk_level column
    #[arg(long, requires = "csv")]
    pub minimal_csv: bool,

    /// Write the PDF report (defaults to hazard_ratio.pdf when no path is given)
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = report::PDF_FILE_NAME)]
    pub pdf: Option<PathBuf>,

    /// Print the result as JSON instead of the text report
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    /// CSV file with a gender,age,comorbidity header
    #[arg(value_name = "INPUT_CSV")]
    pub input: PathBuf,

    /// Output CSV path; results go to stdout when omitted
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Model file (.toml) replacing the builtin tables
    #[arg(long, value_name = "PATH")]
    pub model: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a single patient
    #[command(about = "Score one patient (prints the report; optional CSV/PDF export)")]
    Score(ScoreArgs),

    /// Score every row of a CSV file
    #[command(about = "Score a CSV of patients (outputs: gender,age,comorb_idx,hr,risk_level)")]
    Batch(BatchArgs),

    /// List the comorbidity catalog, tiers and coefficients
    #[command(about = "List comorbidities, risk tiers and coefficients")]
    Catalog {
        /// Model file (.toml) replacing the builtin tables
        #[arg(long, value_name = "PATH")]
        model: Option<PathBuf>,
    },

    /// Write the builtin tables as an editable model file
    #[command(about = "Write the builtin tables to a TOML model file (outputs: model.toml)")]
    ExportModel {
        #[arg(long, value_name = "PATH", default_value = "model.toml")]
        output: PathBuf,
    },

    /// Display version and build information
    #[command(about = "Display version and build information")]
    Version,
}

// ========================================================================================
//                              The main orchestration logic
// ========================================================================================

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let Cli { command } = cli;

    let result = match command {
        Some(Commands::Score(args)) => run_score(args),
        Some(Commands::Batch(args)) => run_batch(args),
        Some(Commands::Catalog { model }) => run_catalog(model.as_deref()),
        Some(Commands::ExportModel { output }) => run_export_model(&output),
        Some(Commands::Version) => {
            print_version_info();
            Ok(())
        }
        None => print_help(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn print_help() -> Result<(), Box<dyn Error>> {
    Cli::command().print_help()?;
    println!();
    Ok(())
}

/// The builtin scorer, or one built from a model file when a path is given.
fn load_scorer(model: Option<&Path>) -> Result<Cow<'static, RiskScorer>, Box<dyn Error>> {
    match model {
        Some(path) => {
            let spec = ModelSpec::load(path)?;
            Ok(Cow::Owned(RiskScorer::from_spec(spec)?))
        }
        None => Ok(Cow::Borrowed(RiskScorer::builtin())),
    }
}

fn run_score(args: ScoreArgs) -> Result<(), Box<dyn Error>> {
    let scorer = load_scorer(args.model.as_deref())?;
    let patient = PatientInput::new(&args.gender, args.age, &args.comorbidity, scorer.catalog())?;
    let result = scorer.score_patient(&patient)?;
    let scored = ScoredPatient { patient, result };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&scored)?);
    } else {
        print!("{}", render_text(&scored));
    }

    if let Some(path) = &args.csv {
        let variant = if args.minimal_csv {
            CsvVariant::Minimal
        } else {
            CsvVariant::Full
        };
        report::write_csv_file(path, variant, std::slice::from_ref(&scored))?;
        eprintln!("CSV result written to {}", path.display());
    }

    if let Some(path) = &args.pdf {
        report::write_pdf_file(path, &scored)?;
        eprintln!("PDF report written to {}", path.display());
    }

    Ok(())
}

fn run_batch(args: BatchArgs) -> Result<(), Box<dyn Error>> {
    let scorer = load_scorer(args.model.as_deref())?;
    let input = BufReader::new(File::open(&args.input)?);

    let summary = match &args.output {
        Some(path) => {
            let output = BufWriter::new(File::create(path)?);
            let summary = batch::score_csv(&scorer, input, output)?;
            eprintln!(
                "Scored {} patients; results written to {}",
                summary.scored,
                path.display()
            );
            summary
        }
        None => {
            let stdout = io::stdout();
            let mut lock = stdout.lock();
            let summary = batch::score_csv(&scorer, input, &mut lock)?;
            lock.flush()?;
            summary
        }
    };
    log::info!("Batch finished: {} patients", summary.scored);
    Ok(())
}

fn run_catalog(model: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let scorer = load_scorer(model)?;

    println!("Comorbidity catalog (index = covariate value):");
    println!(
        "{}",
        scorer
            .catalog()
            .names()
            .iter()
            .enumerate()
            .map(|(index, name)| format!("  {index}  {name}"))
            .join("\n")
    );

    println!();
    println!("Risk tiers (exclusive upper bound on the hazard ratio):");
    let bounds = scorer.bounds();
    for tier in RiskTier::ALL {
        let bound = bounds.upper_bound(tier);
        let limit = if bound.is_finite() {
            format!("< {bound}")
        } else {
            "unbounded".to_string()
        };
        println!("  {:<16}{:<12}{}", tier.label(), limit, tier.color());
    }

    let coefficients = scorer.coefficients();
    println!();
    println!(
        "Coefficients: gender {}, age {}, comorbidity {}",
        coefficients.gender, coefficients.age, coefficients.comorbidity
    );
    Ok(())
}

fn run_export_model(output: &Path) -> Result<(), Box<dyn Error>> {
    ModelSpec::builtin().save(output)?;
    println!("Model written to: {}", output.display());
    Ok(())
}

/// Format seconds into a human-readable duration like "2.4 hours ago"
fn format_duration_ago(seconds: u64) -> String {
    const MINUTE: u64 = 60;
    const HOUR: u64 = 60 * MINUTE;
    const DAY: u64 = 24 * HOUR;

    if seconds < MINUTE {
        format!("{seconds} seconds ago")
    } else if seconds < HOUR {
        format!("{:.1} minutes ago", seconds as f64 / MINUTE as f64)
    } else if seconds < DAY {
        format!("{:.1} hours ago", seconds as f64 / HOUR as f64)
    } else {
        format!("{:.1} days ago", seconds as f64 / DAY as f64)
    }
}

fn print_version_info() {
    let version = env!("CARGO_PKG_VERSION");
    let release_tag = option_env!("DIALYSIS_HAZARD_RELEASE_TAG");
    let build_timestamp: u64 = env!("DIALYSIS_HAZARD_BUILD_TIMESTAMP").parse().unwrap_or(0);

    println!("dialysis-hazard {version}");

    match release_tag {
        Some(tag) => println!("Release: {tag}"),
        None => println!("Release: development build"),
    }

    if build_timestamp > 0 {
        let now = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);

        if now > build_timestamp {
            println!("Built: {}", format_duration_ago(now - build_timestamp));
        } else {
            println!("Built: just now");
        }
    }
}
