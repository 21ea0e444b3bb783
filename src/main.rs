//! Command-line entry point for asking questions about the research paper.
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use research_rag::{
    assistant::ResearchAssistant,
    config::{self, API_KEY_VARIABLE, Config},
    console, logging,
};
use std::path::PathBuf;

/// Questions the example run walks through.
const EXAMPLE_QUERIES: [&str; 4] = [
    "What is the main research question or hypothesis of this paper?",
    "What methodology was used in this research?",
    "What are the key findings or results?",
    "What are the main conclusions of this paper?",
];

const RULE: &str = "==================================================";
const WIDE_RULE: &str =
    "======================================================================";

#[derive(Parser)]
#[command(
    name = "research-rag",
    about = "Ask questions about a research paper with a crew of LLM agents"
)]
struct Cli {
    /// PDF to index (overrides PAPER_PDF_PATH).
    #[arg(long, global = true)]
    pdf: Option<PathBuf>,
    /// Directory holding the persisted index (overrides INDEX_DIR).
    #[arg(long, global = true)]
    index_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive question loop (default).
    Chat,
    /// Answer a single question and exit.
    Ask {
        /// Question about the paper.
        question: String,
    },
    /// Run the built-in example questions.
    Examples,
    /// Build or load the index and print its manifest.
    Index,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_tracing();
    let cli = Cli::parse();
    let config = config::init_config(|config| {
        if let Some(pdf) = cli.pdf.clone() {
            config.pdf_path = pdf;
        }
        if let Some(dir) = cli.index_dir.clone() {
            config.index_dir = dir;
        }
    })
    .context("failed to load configuration")?;

    let mut assistant = ResearchAssistant::new(config.clone());
    let result = run(cli.command.unwrap_or(Command::Chat), config, &mut assistant).await;

    let metrics = assistant.metrics();
    tracing::info!(
        pages_loaded = metrics.pages_loaded,
        chunks_indexed = metrics.chunks_indexed,
        queries_answered = metrics.queries_answered,
        queries_failed = metrics.queries_failed,
        tool_calls = metrics.tool_calls,
        "Session finished"
    );
    result
}

async fn run(command: Command, config: &Config, assistant: &mut ResearchAssistant) -> Result<()> {
    println!("Initializing Agentic RAG System...");
    println!("{RULE}");
    if !assistant.initialize_system().await {
        if !config.has_credentials() {
            println!("Warning: {API_KEY_VARIABLE} not found in environment variables.");
            println!("Please set it using: export {API_KEY_VARIABLE}='your-key-here'");
            return Ok(());
        }
        bail!("failed to initialize the paper index; see the log for details");
    }
    println!("System initialized successfully!");
    println!("{RULE}");

    match command {
        Command::Chat => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            console::run_console(assistant, stdin, tokio::io::stdout())
                .await
                .context("console I/O failed")?;
        }
        Command::Ask { question } => {
            let answer = assistant
                .query_research_paper(&question)
                .await
                .with_context(|| format!("failed to answer {question:?}"))?;
            println!("{answer}");
        }
        Command::Examples => run_examples(assistant).await,
        Command::Index => {
            if let Some(index) = assistant.index() {
                let manifest = index.manifest();
                println!("Source:          {}", manifest.source);
                println!("Chunks:          {}", manifest.chunk_count);
                println!("Embedding model: {}", manifest.embedding_model);
                println!("Dimension:       {}", manifest.dimension);
                println!(
                    "Chunking:        size {} / overlap {}",
                    manifest.chunk_size, manifest.chunk_overlap
                );
                println!("Built at:        {}", manifest.created_at);
            }
        }
    }
    Ok(())
}

async fn run_examples(assistant: &mut ResearchAssistant) {
    println!("\n{WIDE_RULE}");
    println!("Example Queries - Agentic RAG System");
    println!("{WIDE_RULE}");

    for (number, query) in EXAMPLE_QUERIES.iter().enumerate() {
        println!("\n\nExample {}:", number + 1);
        println!("Query: {query}");
        println!("{}", "-".repeat(WIDE_RULE.len()));
        match assistant.query_research_paper(query).await {
            Ok(answer) => println!("\nAnswer:\n{answer}"),
            Err(error) => println!("Error: {error}"),
        }
        println!("\n{WIDE_RULE}");
    }
}
