use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use senate_corpus::{
    CURRENT_LEGISLATORS_URL, Chamber, DateRange, HISTORICAL_LEGISLATORS_URL, NormalizerConfig,
    PageSource, PdftotextSource, PipelineConfig, PipelineContext, ResolverConfig,
    SegmenterConfig, WriterConfig, load_registry, normalize, segment,
};

#[derive(Parser)]
#[command(name = "senate-corpus")]
#[command(author, version, about = "Congressional Record to speaker-attributed corpus pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert Congressional Record PDFs into speaker-attributed corpus files
    Process {
        /// Input PDF files (pre-extracted .txt files are also accepted)
        #[arg(short = 'p', long = "pdf", required = true, num_args = 1..)]
        pdfs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// First date to include (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        start: Option<NaiveDate>,

        /// Last date to include (YYYY-MM-DD)
        #[arg(long, value_parser = parse_date)]
        end: Option<NaiveDate>,

        /// Current legislators JSON (path or URL)
        #[arg(long, default_value = CURRENT_LEGISLATORS_URL)]
        current: String,

        /// Historical legislators JSON (path or URL)
        #[arg(long, default_value = HISTORICAL_LEGISLATORS_URL)]
        historical: String,

        /// Only resolve speakers against this chamber
        #[arg(long, value_enum)]
        chamber: Option<ChamberArg>,

        /// Also write a JSON file per document
        #[arg(long)]
        json: bool,

        /// Also write one lower-cased corpus file per party
        #[arg(long)]
        party_corpus: bool,

        /// Maximum documents processed at once (defaults to available cores)
        #[arg(long)]
        jobs: Option<usize>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Show segmentation statistics for one document without writing anything
    Analyze {
        /// Input PDF file
        #[arg(short = 'p', long = "pdf")]
        pdf: PathBuf,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ChamberArg {
    Senate,
    House,
}

impl From<ChamberArg> for Chamber {
    fn from(arg: ChamberArg) -> Self {
        match arg {
            ChamberArg::Senate => Chamber::Senate,
            ChamberArg::House => Chamber::House,
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Process {
            pdfs,
            output,
            start,
            end,
            current,
            historical,
            chamber,
            json,
            party_corpus,
            jobs,
            verbose,
        } => {
            setup_logging(verbose);
            let date_range = DateRange::new(start, end)?;

            let mut config = PipelineConfig::new(output);
            config.date_range = date_range;
            config.resolver = ResolverConfig {
                chamber: chamber.map(Chamber::from),
            };
            config.writer = WriterConfig {
                write_json: json,
                ..Default::default()
            };
            config.party_corpus = party_corpus;
            if let Some(jobs) = jobs {
                config.max_workers = jobs.max(1);
            }

            process_documents(pdfs, config, &[current, historical]).await
        }
        Commands::Analyze { pdf, verbose } => {
            setup_logging(verbose);
            analyze_document(pdf)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

async fn process_documents(
    pdfs: Vec<PathBuf>,
    config: PipelineConfig,
    registry_sources: &[String],
) -> Result<ExitCode> {
    info!("Loading legislator registry...");
    let registry = load_registry(registry_sources)
        .await
        .context("Failed to load legislator registry")?;

    let ctx = Arc::new(PipelineContext {
        config,
        registry: Arc::new(registry),
        source: Arc::new(PdftotextSource::new()),
    });

    let report = senate_corpus::run(pdfs, ctx).await?;

    println!();
    print!("{}", report.summary());

    if report.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn analyze_document(input: PathBuf) -> Result<()> {
    info!("Analyzing {:?}", input);
    let pages = PdftotextSource::new()
        .extract_pages(&input)
        .context("Failed to extract document text")?;

    let normalized = normalize(&pages, &NormalizerConfig::default());
    let empty_pages = normalized.empty_pages.len();
    let boilerplate = normalized.boilerplate_removed;
    let recurring = normalized.recurring_lines;
    let lines = normalized.into_lines();
    let turns = segment(&lines, &SegmenterConfig::default());

    println!("Document Analysis");
    println!("=================");
    println!("Pages: {}", pages.len());
    println!("Empty pages: {}", empty_pages);
    println!("Normalized lines: {}", lines.len());
    println!("Boilerplate lines removed: {}", boilerplate);
    println!("Recurring header/footer lines: {}", recurring);
    println!("Turns: {}", turns.len());
    println!();

    println!("Speaker Statistics");
    println!("------------------");
    let mut by_speaker: BTreeMap<String, (usize, usize)> = BTreeMap::new();
    for turn in &turns {
        let entry = by_speaker.entry(turn.speaker.to_string()).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += turn.word_count();
    }
    for (speaker, (turn_count, word_count)) in &by_speaker {
        println!("{}: {} turns, {} words", speaker, turn_count, word_count);
    }

    Ok(())
}
