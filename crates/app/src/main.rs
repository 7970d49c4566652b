use chrono::Utc;
use clap::{Parser, Subcommand};
use pdf_chat_core::{
    describe_active_provider, resolve_embeddings, resolve_generator, ChatPipeline,
    IngestResult, IngestionPipeline, ProviderSettings, StatusReport, VectorStore,
    DEFAULT_TEMPERATURE, DEFAULT_TOP_K,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "pdf-chat", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding the persisted vector collection.
    #[arg(long, default_value = "db/collection")]
    data_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Extract, chunk, embed, and store one PDF document.
    Ingest {
        /// Path to the PDF file.
        file: PathBuf,
    },
    /// Ask a question against the indexed documents.
    Chat {
        /// The question to answer.
        question: String,
        /// Number of chunks to retrieve as context.
        #[arg(long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,
        /// Sampling temperature for the generation backend.
        #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
        temperature: f32,
    },
    /// Report whether the collection exists and how many chunks it holds.
    Status,
    /// Delete the persisted collection.
    Clear,
    /// Describe the provider selected by LLM_PROVIDER.
    Provider,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();

    let cli = Cli::parse();
    let settings = ProviderSettings::from_env()?;
    let store = Arc::new(VectorStore::new(&cli.data_dir));

    info!(
        version = env!("CARGO_PKG_VERSION"),
        provider = settings.raw_provider.as_str(),
        data_dir = %cli.data_dir.display(),
        started_at = %Utc::now().to_rfc3339(),
        "pdf-chat boot"
    );

    match cli.command {
        Command::Ingest { file } => {
            let is_pdf = file
                .extension()
                .map(|extension| extension.eq_ignore_ascii_case("pdf"))
                .unwrap_or(false);
            if !is_pdf {
                let total_documents = store.record_count().await.unwrap_or(0);
                let result = IngestResult::failure("Only PDF files are allowed", total_documents);
                println!("{}", serde_json::to_string_pretty(&result)?);
                std::process::exit(1);
            }

            let filename = file
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("invalid file name: {}", file.display()))?;
            let bytes = tokio::fs::read(&file).await?;

            let embeddings = resolve_embeddings(&settings)?;
            let pipeline = IngestionPipeline::new(embeddings, store);
            let result = pipeline.ingest(&filename, &bytes).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                std::process::exit(1);
            }
        }
        Command::Chat {
            question,
            top_k,
            temperature,
        } => {
            let embeddings = resolve_embeddings(&settings)?;
            let generator = resolve_generator(&settings, temperature)?;
            let pipeline = ChatPipeline::new(embeddings, generator, store);
            let result = pipeline.answer(&question, top_k).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Status => {
            let report = if cli.data_dir.exists() {
                let total_documents = store.record_count().await?;
                StatusReport {
                    initialized: true,
                    total_documents,
                    message: format!("Vector store contains {total_documents} document chunks"),
                }
            } else {
                StatusReport {
                    initialized: false,
                    total_documents: 0,
                    message: "Vector store not initialized".to_string(),
                }
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Clear => {
            let outcome = store.clear().await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Provider => {
            let info = describe_active_provider(&settings);
            println!("{}", serde_json::to_string_pretty(&info)?);
        }
    }

    Ok(())
}
