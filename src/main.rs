// paperlens CLI: process, retrieve and inspect scientific-paper PDFs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::warn;
use paperlens::pdf_extraction::CancellationFlag;
use paperlens::storage::ResourceStore;
use paperlens::types::RegionKind;
use paperlens::{Config, Pipeline};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Config file (TOML); defaults to <config_dir>/paperlens/config.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Resources root, overrides the config file
    #[arg(short, long, global = true)]
    resources: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract, summarize and persist a paper
    Process { pdf: PathBuf },
    /// Print the persisted summary of a processed paper
    Retrieve { document_id: String },
    /// Resolve a "<document_id>*<file>" image reference to its path
    Image { reference: String },
    /// List processed papers
    List,
    /// Show detected regions in reading order, page by page
    Layout { pdf: PathBuf },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(root) = args.resources {
        config.resources_root = root;
    }

    match args.command {
        Command::Process { pdf } => {
            let cancel = CancellationFlag::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("interrupt received, stopping at the next page boundary");
                    on_interrupt.cancel();
                }
            });

            let pipeline = Pipeline::from_config(&config)?.with_cancellation(cancel);
            let processed = pipeline
                .process(&pdf)
                .await
                .with_context(|| format!("processing {}", pdf.display()))?;
            if processed.diagnostics.ocr_failures > 0 || !processed.failed_facets.is_empty() {
                warn!(
                    "completed with {} OCR failures, failed facets: {:?}",
                    processed.diagnostics.ocr_failures, processed.failed_facets
                );
            }
            println!("{}", serde_json::to_string_pretty(&processed.record)?);
        }
        Command::Retrieve { document_id } => {
            let store = ResourceStore::new(&config.resources_root);
            let record = store.retrieve(&document_id)?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Command::Image { reference } => {
            let store = ResourceStore::new(&config.resources_root);
            println!("{}", store.resolve_image(&reference)?.display());
        }
        Command::List => {
            let store = ResourceStore::new(&config.resources_root);
            for id in store.list_documents()? {
                println!("{}", id);
            }
        }
        Command::Layout { pdf } => {
            let pipeline = Pipeline::from_config(&config)?;
            let analyzed = pipeline.router().analyze_layout(&pdf).await?;
            for (index, page) in &analyzed.layout {
                println!("── page {} ({}x{}) ──", index, page.width, page.height);
                for kind in RegionKind::ALL {
                    for region in page.of_kind(kind) {
                        println!(
                            "  {:<6} #{:<2} [{:>7.1}, {:>7.1}, {:>7.1}, {:>7.1}]  {:.2}",
                            kind.as_str(),
                            region.order.unwrap_or_default(),
                            region.bbox.x0,
                            region.bbox.y0,
                            region.bbox.x1,
                            region.bbox.y1,
                            region.score
                        );
                    }
                }
            }
        }
    }

    Ok(())
}
