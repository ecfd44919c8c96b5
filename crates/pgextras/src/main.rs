//! pgextras - diagnostic reports for a PostgreSQL server.
//!
//! Usage:
//!   pgextras list                       # show every report
//!   pgextras cache-hit                  # run one report (DSN from environment)
//!   pgextras --dsn "dbname=bench" bloat
//!   pgextras --truncate outliers        # shorten query text
//!   pgextras --format json ps           # rows as a JSON array

mod render;

use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use tracing::{Level, debug};
use tracing_subscriber::EnvFilter;

use pgextras_core::{Config, PgExtras, Report, ReportOptions};

/// Diagnostic reports for a PostgreSQL server.
#[derive(Parser)]
#[command(name = "pgextras", about = "Diagnostic reports for a PostgreSQL server", version)]
struct Args {
    /// Report to run (see `pgextras list`).
    #[arg(value_name = "REPORT")]
    report: String,

    /// Connection string. Defaults to PGEXTRAS_DSN, then DATABASE_URL, then
    /// the PGHOST/PGPORT/PGUSER/PGPASSWORD/PGDATABASE variables.
    #[arg(long, value_name = "DSN")]
    dsn: Option<String>,

    /// Shorten query text to 40 characters (calls, outliers).
    #[arg(long)]
    truncate: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Increase logging verbosity (-v for info, -vv for debug, -vvv for trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Quiet mode - only show errors.
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

/// Initializes the tracing subscriber on stderr.
/// Default level is WARN so report output stays clean.
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        Level::ERROR
    } else {
        match verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    };

    let mut filter = EnvFilter::from_default_env();
    for target in ["pgextras", "pgextras_core"] {
        if let Ok(directive) = format!("{target}={level}").parse() {
            filter = filter.add_directive(directive);
        }
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(args: &Args) -> anyhow::Result<()> {
    if args.report == "list" {
        print!("{}", render::catalog());
        return Ok(());
    }

    let report: Report = args.report.parse()?;
    let config = match &args.dsn {
        Some(dsn) => Config::with_dsn(dsn.clone()),
        None => Config::from_env().context("no connection string given")?,
    };
    let options = ReportOptions {
        truncate: args.truncate,
    };

    let mut pg = PgExtras::from_config(&config);
    debug!(%report, "running report");
    let rows = pg
        .run(report, &options)
        .with_context(|| format!("{report} failed"))?;
    pg.close()?;

    match args.format {
        Format::Table => println!("{}", render::table(&rows)),
        Format::Json => println!("{}", render::json(&rows)?),
    }
    Ok(())
}

/// The one line printed for a failed run: the error and its context chain.
fn failure_line(e: &anyhow::Error) -> String {
    format!("Error: {e:#}")
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", failure_line(&e));
            ExitCode::FAILURE
        }
    }
}
