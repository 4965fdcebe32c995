// avstam - bank/ledger reconciliation from the command line.

mod exit_codes;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use avstamning_io::{Error, IngestStats, ReconciliationRun};
use exit_codes::{EXIT_ERROR, EXIT_INGEST, EXIT_OUTPUT, EXIT_SUCCESS};

#[derive(Parser)]
#[command(name = "avstam")]
#[command(about = "Stäm av kontoutdrag mot bokföringslista (headless)")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reconciliation and write the combined workbook
    #[command(after_help = "\
Examples:
  avstam run kontoutdrag.xlsx huvudbok.xlsx
  avstam run kontoutdrag.csv huvudbok.csv -o juli.xlsx
  avstam run kontoutdrag.xlsx huvudbok.xlsx --json > summary.json")]
    Run {
        /// Bank statement (xlsx/xls/ods or delimited text)
        bank: PathBuf,

        /// Ledger posting list (xlsx/xls/ods or delimited text)
        bokf: PathBuf,

        /// Output workbook path
        #[arg(long, short = 'o', default_value = "output_avstamning.xlsx")]
        output: PathBuf,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate both inputs without writing anything
    #[command(after_help = "\
Examples:
  avstam check kontoutdrag.xlsx huvudbok.xlsx
  avstam check kontoutdrag.csv huvudbok.csv --json")]
    Check {
        /// Bank statement (xlsx/xls/ods or delimited text)
        bank: PathBuf,

        /// Ledger posting list (xlsx/xls/ods or delimited text)
        bokf: PathBuf,

        /// Print the ingest report as JSON on stdout
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { bank, bokf, output, json } => cmd_run(bank, bokf, output, json),
        Commands::Check { bank, bokf, json } => cmd_check(bank, bokf, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message }) => {
            if !message.is_empty() {
                eprintln!("error: {message}");
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
struct CliError {
    code: u8,
    message: String,
}

impl From<Error> for CliError {
    fn from(err: Error) -> Self {
        let code = match err {
            Error::Ingest(_) => EXIT_INGEST,
            Error::Output(_) => EXIT_OUTPUT,
        };
        Self { code, message: err.to_string() }
    }
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

fn cmd_run(bank: PathBuf, bokf: PathBuf, output: PathBuf, json: bool) -> Result<(), CliError> {
    let run: ReconciliationRun = avstamning_io::run_reconciliation(&bank, &bokf)?;

    std::fs::write(&output, &run.bytes).map_err(|e| CliError {
        code: EXIT_OUTPUT,
        message: format!("cannot write {}: {e}", output.display()),
    })?;

    warn_on_parse_issues("bank", &run.bank_stats);
    warn_on_parse_issues("bokföring", &run.bokf_stats);

    let s = &run.summary;
    let groups_total: usize = s.groups_per_category.values().sum();
    eprintln!(
        "{} bank rows, {} postings — {} groups, {} unmatched ({} bank / {} bokf)",
        s.bank_rows,
        s.bokf_rows,
        groups_total,
        s.unmatched_bank + s.unmatched_bokf,
        s.unmatched_bank,
        s.unmatched_bokf,
    );
    for (category, count) in &s.groups_per_category {
        eprintln!("  {category}: {count}");
    }
    eprintln!("wrote {}", output.display());

    if json {
        let report = RunReport {
            summary: &run.summary,
            bank: StatsReport::from(&run.bank_stats),
            bokf: StatsReport::from(&run.bokf_stats),
            output: output.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&report).map_err(internal)?);
    }

    Ok(())
}

#[derive(Serialize)]
struct RunReport<'a> {
    summary: &'a avstamning_engine::RunSummary,
    bank: StatsReport,
    bokf: StatsReport,
    output: String,
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn cmd_check(bank: PathBuf, bokf: PathBuf, json: bool) -> Result<(), CliError> {
    let (bank_table, bank_stats) =
        avstamning_io::ingest::load_bank(&bank).map_err(Error::Ingest)?;
    let (bokf_table, bokf_stats) =
        avstamning_io::ingest::load_bokf(&bokf).map_err(Error::Ingest)?;

    warn_on_parse_issues("bank", &bank_stats);
    warn_on_parse_issues("bokföring", &bokf_stats);

    eprintln!(
        "valid: {} bank rows, {} postings ({} opening-balance rows dropped)",
        bank_table.rows.len(),
        bokf_table.rows.len(),
        bokf_stats.dropped_opening_balance,
    );

    if json {
        let report = CheckReport {
            bank: StatsReport::from(&bank_stats),
            bokf: StatsReport::from(&bokf_stats),
        };
        println!("{}", serde_json::to_string_pretty(&report).map_err(internal)?);
    }

    Ok(())
}

#[derive(Serialize)]
struct CheckReport {
    bank: StatsReport,
    bokf: StatsReport,
}

#[derive(Serialize)]
struct StatsReport {
    rows_read: usize,
    rows_kept: usize,
    dropped_opening_balance: usize,
    date_warnings: usize,
    amount_warnings: usize,
}

impl From<&IngestStats> for StatsReport {
    fn from(stats: &IngestStats) -> Self {
        Self {
            rows_read: stats.rows_read,
            rows_kept: stats.rows_kept,
            dropped_opening_balance: stats.dropped_opening_balance,
            date_warnings: stats.date_warnings,
            amount_warnings: stats.amount_warnings,
        }
    }
}

fn warn_on_parse_issues(side: &str, stats: &IngestStats) {
    if stats.date_warnings > 0 {
        eprintln!("warning: {side}: {} unparseable date(s), rows kept without date", stats.date_warnings);
    }
    if stats.amount_warnings > 0 {
        eprintln!("warning: {side}: {} unparseable amount(s), read as 0", stats.amount_warnings);
    }
}

fn internal(err: serde_json::Error) -> CliError {
    CliError { code: EXIT_ERROR, message: format!("JSON serialization error: {err}") }
}
