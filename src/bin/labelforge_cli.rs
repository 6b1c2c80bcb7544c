//! LabelForge CLI
//!
//! Commands: date-code, hu, payload, export
//! Outputs JSON (or the bare code) to stdout, logs to stderr
//! Returns 2 when an export fails

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use labelforge_core::{
    current_date_code, current_hu_number, date_code, qr_payload, ExportPipeline, ExportSettings,
    LabelConfig, LabelRecord, LabelSession, LabelSize,
};

#[derive(Parser)]
#[command(name = "labelforge-cli")]
#[command(about = "LabelForge CLI - label encoding and print layout")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to a JSON session config
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the YYWW date code
    DateCode {
        /// Calendar date (YYYY-MM-DD), today if omitted
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Print a fresh handling-unit number
    Hu {
        /// YYWW code to embed, current week if omitted
        #[arg(short, long)]
        date_code: Option<String>,
    },

    /// Print the QR payload of a record file
    Payload {
        /// JSON record (camelCase field names)
        #[arg(short, long)]
        record: PathBuf,
    },

    /// Render and export a label as PDF
    Export {
        /// Label size
        #[arg(short, long, default_value = "outer")]
        size: LabelSize,

        /// JSON record overlaid onto the session defaults
        #[arg(short, long)]
        record: Option<PathBuf>,

        /// Field assignment (name=value), checked against the field policy
        #[arg(long = "set", value_parser = parse_assignment)]
        assignments: Vec<(String, String)>,

        /// Output directory, overrides the config
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.trim().to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{s}'"))
}

fn load_record(path: &Path) -> Result<LabelRecord, String> {
    let content = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read record {}: {}", path.display(), e))?;
    serde_json::from_str(&content).map_err(|e| format!("Invalid record: {e}"))
}

fn fail(error: impl std::fmt::Display) -> ExitCode {
    println!("{}", serde_json::json!({ "success": false, "error": error.to_string() }));
    ExitCode::FAILURE
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "labelforge_core=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => match LabelConfig::load(path) {
            Ok(c) => c,
            Err(e) => return fail(e),
        },
        None => LabelConfig::default(),
    };

    match cli.command {
        Commands::DateCode { date } => {
            let code = date.map(date_code).unwrap_or_else(current_date_code);
            println!("{code}");
            ExitCode::SUCCESS
        }

        Commands::Hu { date_code } => {
            let code = date_code.unwrap_or_else(current_date_code);
            println!("{}", current_hu_number(&code));
            ExitCode::SUCCESS
        }

        Commands::Payload { record } => match load_record(&record) {
            Ok(record) => {
                println!("{}", qr_payload(&record));
                ExitCode::SUCCESS
            }
            Err(e) => fail(e),
        },

        Commands::Export {
            size,
            record,
            assignments,
            out_dir,
        } => {
            let mut session = LabelSession::start(&config, Local::now());
            if let Some(path) = record {
                match load_record(&path) {
                    Ok(r) => session.merge_record(&r),
                    Err(e) => return fail(e),
                }
            }
            for (name, value) in assignments {
                if let Err(e) = session.set_field(&name, value) {
                    return fail(e);
                }
            }
            session.select_size(size);
            session.mount();

            let mut settings = ExportSettings::from_config(&config);
            if let Some(dir) = out_dir {
                settings.output_dir = dir;
            }
            let pipeline = ExportPipeline::new(settings);

            match session.export(&pipeline).await {
                Ok(doc) => {
                    let output = serde_json::json!({
                        "success": true,
                        "document": doc,
                    });
                    match serde_json::to_string_pretty(&output) {
                        Ok(s) => println!("{s}"),
                        Err(e) => return fail(e),
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    let output = serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                        "notice": e.user_notice(),
                    });
                    println!("{output}");
                    ExitCode::from(2)
                }
            }
        }
    }
}
