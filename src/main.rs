use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use stock_consolidator::config::{DEFAULT_DATABASE_PATH, StockConfig};
use stock_consolidator::consolidation::ConsolidationOptions;
use stock_consolidator::ingestion::{IngestionFormat, IngestionOptions, TracingObserver};
use stock_consolidator::manager::{ReportKind, StockManager};
use stock_consolidator::report::ExportFormat;
use stock_consolidator::report::export::write_text;
use stock_consolidator::store::{Criterion, QueryCriteria, SqliteStore, StoreColumn};
use stock_consolidator::{StockError, StockResult};

#[derive(Parser)]
#[command(name = "stock-consolidator", version)]
#[command(about = "Consolidate CSV inventory files, store them in SQLite and report on them")]
struct Cli {
    /// SQLite database file
    #[arg(long, global = true, default_value = DEFAULT_DATABASE_PATH)]
    db: PathBuf,

    /// Log filter (e.g. `debug`, `stock_consolidator=trace`); overrides RUST_LOG
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Read source files in parallel
    #[arg(long, global = true)]
    parallel: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Consolidate every CSV file in a directory and store the result
    Consolidate { dir: PathBuf },

    /// Merge INCOMING_CSV into DATABASE_CSV, rewriting DATABASE_CSV
    Import {
        database_csv: PathBuf,
        incoming_csv: PathBuf,
    },

    /// Query stored records
    Search {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<String>,
        /// Extra criterion: `column=value`, `column>=value` or `column<=value`
        #[arg(long = "where", value_name = "KEY=VALUE", value_parser = parse_where)]
        filters: Vec<(String, String)>,
    },

    /// Consolidate a directory and write a report over it
    Report {
        #[arg(value_enum)]
        kind: ReportArg,
        #[arg(long)]
        output: PathBuf,
        #[arg(long, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,
        /// Critical quantity threshold (defaults to 10)
        #[arg(long)]
        threshold: Option<i64>,
        #[arg(long)]
        source: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportArg {
    Summary,
    Critical,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    if let Err(e) = check_inputs(&cli.command) {
        error!(error = %e, "invalid input");
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    let config = StockConfig {
        database_path: cli.db,
        consolidation: ConsolidationOptions {
            ingestion: IngestionOptions {
                observer: Some(Arc::new(TracingObserver)),
                ..Default::default()
            },
            parallel: cli.parallel,
        },
        ..Default::default()
    };

    let mut manager = match StockManager::open(config) {
        Ok(manager) => manager,
        Err(e) => {
            error!(error = %e, "cannot open database");
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let outcome = manager
        .initialize()
        .and_then(|()| run(&mut manager, cli.command));
    let closed = manager.close();

    match (outcome, closed) {
        (Ok(()), Ok(())) => ExitCode::SUCCESS,
        (Err(e), closed) => {
            if let Err(close_error) = closed {
                error!(error = %close_error, "failed to close database");
            }
            error!(error = %e, "command failed");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
        (Ok(()), Err(e)) => {
            error!(error = %e, "failed to close database");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(manager: &mut StockManager<SqliteStore>, command: Command) -> StockResult<()> {
    match command {
        Command::Consolidate { dir } => {
            let consolidation = manager.consolidate_directory(&dir)?;
            println!(
                "consolidated {} records from {} files ({} skipped)",
                consolidation.dataset.row_count(),
                consolidation.loaded_files.len(),
                consolidation.skipped_files.len()
            );
            for skipped in &consolidation.skipped_files {
                println!("  skipped {skipped}");
            }
        }
        Command::Import {
            database_csv,
            incoming_csv,
        } => {
            let merged = manager.import_file(&database_csv, &incoming_csv)?;
            println!(
                "{} now holds {} records",
                database_csv.display(),
                merged.row_count()
            );
        }
        Command::Search {
            name,
            category,
            filters,
        } => {
            let mut criteria = QueryCriteria::parse(filters)?;
            if let Some(name) = name {
                criteria.push(Criterion::equals(StoreColumn::Name, name)?);
            }
            if let Some(category) = category {
                criteria.push(Criterion::equals(StoreColumn::Category, category)?);
            }
            let found = manager.search(&criteria)?;
            if found.is_empty() {
                println!("no matching records");
            } else {
                write_text(&found, io::stdout().lock())?;
            }
        }
        Command::Report {
            kind,
            output,
            format,
            threshold,
            source,
        } => {
            let kind = match kind {
                ReportArg::Summary => ReportKind::Summary,
                ReportArg::Critical => ReportKind::Critical {
                    threshold: threshold.unwrap_or(manager.config().critical_threshold),
                },
            };
            manager.load_report_source(&source)?;
            let report = manager.generate_report(kind, &output, format)?;
            info!(rows = report.row_count(), "report written");
            println!("wrote {kind} report to {}", output.display());
        }
    }
    Ok(())
}

/// Reject missing inputs and non-CSV files before touching the database.
fn check_inputs(command: &Command) -> StockResult<()> {
    match command {
        Command::Consolidate { dir } => check_dir(dir),
        Command::Import {
            database_csv,
            incoming_csv,
        } => {
            check_csv_file(database_csv)?;
            check_csv_file(incoming_csv)
        }
        Command::Search { .. } => Ok(()),
        Command::Report { source, .. } => check_dir(source),
    }
}

fn check_dir(path: &Path) -> StockResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(invalid_input(path, "is not a directory"))
    }
}

fn check_csv_file(path: &Path) -> StockResult<()> {
    if !path.is_file() {
        return Err(invalid_input(path, "does not exist"));
    }
    if IngestionFormat::from_path(path) != Some(IngestionFormat::Csv) {
        return Err(invalid_input(path, "is not a .csv file"));
    }
    Ok(())
}

fn invalid_input(path: &Path, reason: &str) -> StockError {
    StockError::Io(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} {reason}", path.display()),
    ))
}

/// Split `--where` at its first `=`. A `>` or `<` right before it makes the key a range key
/// (`quantity>=`), and the `KEY=VALUE` spelling `quantity>==5` is accepted too.
fn parse_where(raw: &str) -> Result<(String, String), String> {
    let pos = raw
        .find('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    let (key, value) = (&raw[..pos], &raw[pos + 1..]);
    match key.strip_suffix('>').or_else(|| key.strip_suffix('<')) {
        Some(column) => {
            let op = &key[column.len()..];
            let value = value.strip_prefix('=').unwrap_or(value);
            Ok((format!("{}{op}=", column.trim()), value.to_string()))
        }
        None => Ok((key.trim().to_string(), value.to_string())),
    }
}
