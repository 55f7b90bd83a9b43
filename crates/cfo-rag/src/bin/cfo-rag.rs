//! CFO console RAG command line
//!
//! Run with: cargo run -p cfo-rag -- query "Which AR invoices are overdue?"

use anyhow::{bail, Context};
use cfo_rag::{
    generation::DEFAULT_TEMPLATE,
    invoices::{DueInvoice, InvoiceTable},
    processing::DailyRefresh,
    IngestPipeline, QueryPipeline, RagConfig, RagServices,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "cfo-rag")]
#[command(about = "Question answering over invoices, PO terms and regulations", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true, default_value = "cfo-rag.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Ingest a PDF or CSV document
    Ingest {
        /// Document path
        path: PathBuf,

        /// Metadata stored with every chunk (repeatable)
        #[arg(short, long = "meta", value_name = "KEY=VALUE")]
        meta: Vec<String>,
    },

    /// Ask a question
    Query {
        /// The question
        question: String,

        /// Prompt template name
        #[arg(short, long, default_value = DEFAULT_TEMPLATE)]
        template: String,

        /// Nearest neighbours fetched before reranking
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Skip the once-a-day corpus refresh
        #[arg(long)]
        no_refresh: bool,
    },

    /// Clear and re-ingest the standing corpus if not done today
    Refresh {
        /// Refresh even if the marker says today is done
        #[arg(short, long)]
        force: bool,
    },

    /// Delete all vectors and chunk metadata
    Clear,

    /// List unpaid invoices falling due soon
    Due {
        /// Only this ledger (default: both)
        #[arg(short, long, value_enum)]
        ledger: Option<Ledger>,

        /// Look-ahead window in days
        #[arg(short, long, default_value_t = 15)]
        days: i64,

        /// Maximum rows per ledger
        #[arg(short = 'n', long, default_value_t = 8)]
        limit: usize,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Ledger {
    /// Accounts receivable
    Ar,
    /// Accounts payable
    Ap,
}

fn render_due(title: &str, due: &[DueInvoice]) -> String {
    let mut out = format!("{} ({} due)\n", title, due.len());
    for invoice in due {
        let record = &invoice.record;
        let due_date = record
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_default();
        out.push_str(&format!(
            "  {:<12} {:<28} {:>12.2}  due {} (in {} days)\n",
            record.invoice_number, record.counterparty, record.amount, due_date, invoice.days_remaining
        ));
    }
    out
}

fn print_due(
    config: &RagConfig,
    ledger: Option<Ledger>,
    days: i64,
    limit: usize,
    today: NaiveDate,
) -> anyhow::Result<()> {
    let ledgers = [
        (Ledger::Ar, "Accounts receivable", &config.data.ar_invoices),
        (Ledger::Ap, "Accounts payable", &config.data.ap_invoices),
    ];
    for (kind, title, path) in ledgers {
        if ledger.is_some_and(|l| l != kind) {
            continue;
        }
        let table = InvoiceTable::from_path(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let due = table.label(today).due_within(today, days, limit);
        print!("{}", render_due(title, &due));
    }
    Ok(())
}

fn parse_meta(pairs: &[String]) -> anyhow::Result<HashMap<String, String>> {
    let mut metadata = HashMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("metadata '{}' is not KEY=VALUE", pair);
        };
        metadata.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(metadata)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cfo_rag=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = RagConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?
        .apply_env();
    config.validate()?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Embedding model: {}", config.llm.embed_model);
    tracing::info!("  - Embedding dimensions: {}", config.embeddings.dimensions);
    tracing::info!("  - Chunk size: {} (overlap {})", config.chunking.chunk_size, config.chunking.chunk_overlap);

    let today = chrono::Local::now().date_naive();

    // reads the local CSVs only, no backends needed
    if let Commands::Due { ledger, days, limit } = cli.command {
        return print_due(&config, ledger, days, limit, today);
    }

    let services = RagServices::from_config(&config).await?;
    let ingest = IngestPipeline::from_config(services.clone(), &config)?;

    match cli.command {
        Commands::Ingest { path, meta } => {
            let report = ingest.ingest_document(&path, parse_meta(&meta)?).await?;
            println!(
                "Ingested {} chunks from {} ({})",
                report.chunk_count(),
                report.path.display(),
                report.kind.display_name()
            );
        }
        Commands::Query {
            question,
            template,
            top_k,
            no_refresh,
        } => {
            if !no_refresh {
                DailyRefresh::from_config(ingest, &config.data)
                    .refresh_if_stale(today)
                    .await?;
            }
            let pipeline = QueryPipeline::new(services, &config);
            let answer = pipeline
                .query_rag_at(&question, &template, top_k.unwrap_or(config.query.top_k), today)
                .await?;
            println!("{}", answer);
        }
        Commands::Refresh { force } => {
            let refresh = DailyRefresh::from_config(ingest, &config.data);
            if force {
                refresh.refresh(today).await?;
                println!("Corpus refreshed for {}", today);
            } else if refresh.refresh_if_stale(today).await? {
                println!("Corpus refreshed for {}", today);
            } else {
                println!("Corpus already up to date for {}", today);
            }
        }
        Commands::Clear => {
            ingest.clear_all().await?;
            println!("Vector index and metadata store cleared");
        }
        Commands::Due { .. } => {}
    }

    Ok(())
}
