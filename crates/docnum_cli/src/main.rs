//! Operator CLI for document numbering.
//!
//! # Responsibility
//! - Let operators validate, store and inspect numbering templates.
//! - Preview or allocate numbers against a counter database for support
//!   and migration tasks.
//!
//! # Invariants
//! - `allocate` consumes a real number; everything else is read-only apart
//!   from `set-template`.
//! - Results go to stdout, diagnostics to stderr and the log file.

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Args, Parser, Subcommand};
use docnum_core::db::{open_db_with_options, DbOptions, DEFAULT_BUSY_TIMEOUT};
use docnum_core::{
    compile_template, default_log_level, init_logging, DocumentType, NumberingEngine,
    NumberingRequest, SqliteCounterStore, SqliteTemplateRepository,
};
use rusqlite::Connection;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "docnum", version, about = "Document numbering tools")]
struct Cli {
    /// SQLite database holding counters and templates.
    #[arg(long, env = "DOCNUM_DB", global = true, default_value = "docnum.sqlite3")]
    db: PathBuf,

    /// Maximum time to wait for a locked database, in milliseconds.
    #[arg(long, env = "DOCNUM_BUSY_TIMEOUT_MS", global = true)]
    busy_timeout_ms: Option<u64>,

    /// Absolute directory for rolling log files; logging is off when unset.
    #[arg(long, env = "DOCNUM_LOG_DIR", global = true)]
    log_dir: Option<PathBuf>,

    /// Log level: trace|debug|info|warn|error.
    #[arg(long, env = "DOCNUM_LOG_LEVEL", global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validates template text without touching the database.
    CheckTemplate {
        template: String,
    },
    /// Stores the active template for a tenant and document type.
    SetTemplate {
        #[arg(long)]
        tenant: String,
        #[arg(long, value_parser = parse_document_type)]
        document_type: DocumentType,
        template: String,
    },
    /// Lists the templates configured for a tenant.
    ShowTemplates {
        #[arg(long)]
        tenant: String,
    },
    /// Prints the next number without consuming it.
    Preview(NumberArgs),
    /// Consumes and prints the next number.
    Allocate(NumberArgs),
}

#[derive(Debug, Args)]
struct NumberArgs {
    #[arg(long)]
    tenant: String,
    #[arg(long, value_parser = parse_document_type)]
    document_type: DocumentType,
    /// Short code printed by `{{TENANT}}`.
    #[arg(long)]
    tenant_code: Option<String>,
    /// Business date (YYYY-MM-DD); defaults to today.
    #[arg(long, value_parser = parse_date)]
    date: Option<NaiveDate>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        init_logging(level, log_dir).context("failed to initialize logging")?;
        log::info!(
            "event=cli_start module=cli status=ok version={}",
            docnum_core::core_version()
        );
    }

    match &cli.command {
        Command::CheckTemplate { template } => {
            let compiled = compile_template(template)?;
            println!(
                "ok: sequence width {}, resets {:?}",
                compiled.sequence_width(),
                compiled.granularity()
            );
        }
        Command::SetTemplate {
            tenant,
            document_type,
            template,
        } => {
            let conn = open(&cli)?;
            SqliteTemplateRepository::try_new(&conn)?.set_template(
                tenant,
                *document_type,
                template,
            )?;
            println!("{tenant} {document_type} {template}");
        }
        Command::ShowTemplates { tenant } => {
            let conn = open(&cli)?;
            for record in SqliteTemplateRepository::try_new(&conn)?.list_templates(tenant)? {
                println!("{} {}", record.document_type, record.template);
            }
        }
        Command::Preview(args) => {
            let conn = open(&cli)?;
            let engine = NumberingEngine::new(
                SqliteTemplateRepository::try_new(&conn)?,
                SqliteCounterStore::try_new(&conn)?,
            );
            println!("{}", engine.preview_with(&request(args)?)?.number);
        }
        Command::Allocate(args) => {
            let conn = open(&cli)?;
            let engine = NumberingEngine::new(
                SqliteTemplateRepository::try_new(&conn)?,
                SqliteCounterStore::try_new(&conn)?,
            );
            println!("{}", engine.allocate_with(&request(args)?)?.number);
        }
    }
    Ok(())
}

fn open(cli: &Cli) -> Result<Connection> {
    let options = DbOptions {
        busy_timeout: cli
            .busy_timeout_ms
            .map_or(DEFAULT_BUSY_TIMEOUT, Duration::from_millis),
        ..DbOptions::default()
    };
    open_db_with_options(&cli.db, &options)
        .with_context(|| format!("failed to open `{}`", cli.db.display()))
}

fn request(args: &NumberArgs) -> Result<NumberingRequest<'_>> {
    let mut request = NumberingRequest::new(&args.tenant, args.document_type);
    if let Some(code) = &args.tenant_code {
        request = request.with_tenant_code(code);
    }
    if let Some(date) = args.date {
        let Some(noon) = date.and_hms_opt(12, 0, 0) else {
            bail!("invalid date {date}");
        };
        request = request.at(Utc.from_utc_datetime(&noon));
    }
    Ok(request)
}

fn parse_document_type(value: &str) -> Result<DocumentType, String> {
    value.parse::<DocumentType>().map_err(|err| {
        let codes: Vec<&str> = DocumentType::all().iter().map(|kind| kind.as_str()).collect();
        format!("{err}; expected one of {}", codes.join(", "))
    })
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|err| err.to_string())
}
