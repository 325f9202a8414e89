use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::info;

use casewriter::assemble::templates::TemplateSet;
use casewriter::config::Config;
use casewriter::export::{self, ExportFormat};
use casewriter::knowledge::base::KnowledgeBase;
use casewriter::knowledge::theory::Theory;
use casewriter::output::terminal;
use casewriter::pipeline::{default_output_path, request_from_files, InputFiles, Pipeline};

/// casewriter: strategic case analysis.
///
/// Extracts facts from a business case, maps them onto strategy concepts
/// (TCE, RBV, platform strategy, ...) and writes a templated answer to
/// Markdown, Word or plain text.
#[derive(Parser)]
#[command(name = "casewriter", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a case and write the answer
    Analyze {
        /// Case text (.txt, .md or .docx)
        case: PathBuf,

        /// Question(s) to answer (.txt, .md or .docx)
        question: PathBuf,

        /// Assignment instructions
        #[arg(long)]
        instructions: Option<PathBuf>,

        /// Extra notes to include in the answer
        #[arg(long)]
        user_inputs: Option<PathBuf>,

        /// Style instructions (e.g. "make it student-like")
        #[arg(long)]
        style: Option<PathBuf>,

        /// Only use concepts found in the question
        #[arg(long)]
        only_question: bool,

        /// Keep at most this many concept matches
        #[arg(long)]
        top_n: Option<usize>,

        /// Word limit for the answer (max 550)
        #[arg(long)]
        word_limit: Option<usize>,

        /// Output file (default: <case>_answer.<format> next to the case)
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Output format: md, docx or txt (default: from --output, else md)
        #[arg(long)]
        format: Option<ExportFormat>,

        /// Replace the output file if it exists
        #[arg(long)]
        overwrite: bool,

        /// Print the answer without writing a file
        #[arg(long)]
        dry_run: bool,
    },

    /// Show how terms map onto the knowledge base
    Map {
        /// Terms to map
        #[arg(required = true)]
        terms: Vec<String>,
    },

    /// List the knowledge base
    Concepts {
        /// Only concepts of this theory (e.g. TCE, RBV, PlatformStrategy)
        #[arg(long)]
        theory: Option<Theory>,
    },

    /// Write the built-in theory templates to the templates directory
    InitTemplates {
        /// Replace existing template files
        #[arg(long)]
        force: bool,
    },

    /// Download the sentence embedding model (~90 MB)
    DownloadModel,

    /// Show configuration, knowledge base, templates and model status
    Status,

    /// Serve the web UI
    #[cfg(feature = "web")]
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "3000")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if missing)
    let _ = dotenvy::dotenv();

    // Set up structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("casewriter=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            case,
            question,
            instructions,
            user_inputs,
            style,
            only_question,
            top_n,
            word_limit,
            output,
            format,
            overwrite,
            dry_run,
        } => {
            let config = Config::load()?;
            let export_options = config.export_options(overwrite);
            let pipeline = Pipeline::new(config)?;

            let files = InputFiles {
                case,
                question,
                instructions,
                user_inputs,
                style,
            };
            let mut request = request_from_files(&files)?;
            request.only_question = only_question;
            request.top_n = top_n;
            request.word_limit = word_limit;

            info!(case = %files.case.display(), "Analyzing case");
            let analysis = pipeline.analyze(&request)?;
            terminal::display_analysis(&analysis);

            if dry_run {
                return Ok(());
            }

            let format = match (format, &output) {
                (Some(f), _) => f,
                (None, Some(path)) => ExportFormat::from_path(path)?,
                (None, None) => ExportFormat::Markdown,
            };
            let path = output.unwrap_or_else(|| default_output_path(&files.case, format.extension()));

            export::export(&analysis.answer.text, &path, Some(format), &export_options)?;
            println!("{} {}", "Answer written to".bold(), path.display());
        }

        Commands::Map { terms } => {
            let config = Config::load()?;
            let pipeline = Pipeline::new(config)?;
            let mapped = pipeline.mapper().map_terms(terms.as_slice())?;
            terminal::display_mapping(&mapped);
        }

        Commands::Concepts { theory } => {
            let config = Config::load()?;
            let kb = match &config.knowledge_base {
                Some(path) => KnowledgeBase::load(path)?,
                None => KnowledgeBase::builtin()?,
            };
            terminal::display_concepts(&kb, theory);
        }

        Commands::InitTemplates { force } => {
            let config = Config::load()?;
            let dir = &config.templates_dir;
            let written = TemplateSet::write_defaults(dir, force)?;
            println!("Templates directory: {}", dir.display());
            if written == 0 {
                println!("All template files already exist. Use --force to overwrite them.");
            } else {
                println!("Wrote {written} template files.");
                println!(
                    "{}",
                    "Edit them to change the answer wording; missing files fall back to the built-in text."
                        .dimmed()
                );
            }
        }

        Commands::DownloadModel => {
            let config = Config::load()?;
            let model_dir = &config.model_dir;

            println!("Downloading ONNX embedding model...");
            println!("  Destination: {}", model_dir.display());

            casewriter::model::download_model(model_dir).await?;

            println!("\n{}", "Model downloaded successfully.".bold());
            println!("Set CASEWRITER_MATCHER=embedding to use it for semantic matching.");
        }

        Commands::Status => {
            let config = Config::load()?;
            casewriter::status::show(&config)?;
        }

        #[cfg(feature = "web")]
        Commands::Serve { port, bind } => {
            let config = Config::load()?;
            let pipeline = Pipeline::new(config)?;
            casewriter::web::run_server(pipeline, port, &bind).await?;
        }
    }

    Ok(())
}
