use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use grant_payments::application::finder::{find_by_sbi, find_by_sbi_and_fund_code, find_due_payments};
use grant_payments::application::ingest::{IngestHandler, InboundMessage};
use grant_payments::application::processor::DailyPaymentProcessor;
use grant_payments::application::transform::TransformerRegistry;
use grant_payments::config::Settings;
use grant_payments::domain::payment::PaymentStatus;
use grant_payments::domain::ports::PaymentStoreHandle;
use grant_payments::infrastructure::in_memory::InMemoryPaymentStore;
use grant_payments::infrastructure::payment_hub::PaymentHubClient;
#[cfg(feature = "storage-rocksdb")]
use grant_payments::infrastructure::rocksdb::RocksDBStore;
use grant_payments::infrastructure::token_cache::TokenCache;
use grant_payments::interfaces::csv::report_writer::ReportWriter;
use grant_payments::interfaces::jsonl::message_reader::MessageReader;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Settle every pending payment due on a date and print a CSV report
    Process {
        /// Due date to process (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,

        /// JSON-lines file of create_payment messages to ingest first
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Ingest create_payment messages from a JSON-lines file
    Ingest {
        input: PathBuf,
    },
    /// Print records with pending payments due on a date
    Due {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Print records owned by an SBI
    BySbi {
        sbi: String,

        /// Only records with an invoice line for this fund code
        #[arg(long)]
        fund_code: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let store = open_store(cli.db_path.as_deref())?;

    match cli.command {
        Command::Process { date, input } => {
            if let Some(input) = input {
                ingest_file(&store, &input, false).await?;
            }

            let hub = cli.settings.payment_hub();
            let tokens = Arc::new(TokenCache::new(hub.ttl));
            let gateway = PaymentHubClient::new(hub, tokens).into_diagnostic()?;
            let processor = DailyPaymentProcessor::new(
                Arc::clone(&store),
                Arc::new(gateway),
                Arc::new(TransformerRegistry::with_defaults()),
            )
            .with_concurrency(cli.settings.concurrency);

            let report = processor.process(date).await.into_diagnostic()?;
            info!(
                date = %report.date,
                items = report.items.len(),
                settled = report.items.iter().filter(|i| i.result.is_some()).count(),
                "Daily payment run finished"
            );

            let stdout = io::stdout();
            ReportWriter::new(stdout.lock())
                .write_report(&report)
                .into_diagnostic()?;
        }
        Command::Ingest { input } => {
            ingest_file(&store, &input, true).await?;
        }
        Command::Due { date } => {
            let date = date.unwrap_or_else(|| chrono::Local::now().date_naive());
            let records = find_due_payments(store.as_ref(), date, PaymentStatus::Pending)
                .await
                .into_diagnostic()?;
            print_json(&records)?;
        }
        Command::BySbi { sbi, fund_code } => {
            let records = match fund_code {
                Some(code) => find_by_sbi_and_fund_code(store.as_ref(), &sbi, &code).await,
                None => find_by_sbi(store.as_ref(), &sbi).await,
            }
            .into_diagnostic()?;
            print_json(&records)?;
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_ansi(io::stderr().is_terminal()),
        )
        .init();
}

fn open_store(db_path: Option<&Path>) -> Result<PaymentStoreHandle> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => {
            let store = RocksDBStore::open(path).into_diagnostic()?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(path) => {
            warn!(
                path = %path.display(),
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Arc::new(InMemoryPaymentStore::new()))
        }
        None => Ok(Arc::new(InMemoryPaymentStore::new())),
    }
}

async fn ingest_file(store: &PaymentStoreHandle, path: &Path, print: bool) -> Result<()> {
    let file = File::open(path).into_diagnostic()?;
    let messages: Vec<InboundMessage> = MessageReader::new(file)
        .messages()
        .collect::<std::result::Result<_, _>>()
        .into_diagnostic()?;

    let reports = IngestHandler::new(Arc::clone(store))
        .ingest_batch(messages)
        .await;
    let rejected = reports.iter().filter(|r| !r.passed).count();
    if rejected > 0 {
        warn!(rejected, total = reports.len(), "Some messages were not ingested");
    }

    if print {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        for report in &reports {
            serde_json::to_writer(&mut out, report).into_diagnostic()?;
            writeln!(out).into_diagnostic()?;
        }
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).into_diagnostic()?;
    writeln!(out).into_diagnostic()?;
    Ok(())
}
