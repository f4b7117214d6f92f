use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

use crate::error::DocumentError;
use crate::io::{PageSource, PartyFragments, write_party_corpora};
use crate::models::DateRange;
use crate::stages::{
    AssemblyOutcome, LegislatorRegistry, NormalizerConfig, ResolverConfig, SegmenterConfig,
    WriterConfig, WrittenDocument, assemble, document_date, normalize, resolve_turns, segment,
    write_document,
};

/// Configuration for a whole run
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub normalizer: NormalizerConfig,
    pub segmenter: SegmenterConfig,
    pub resolver: ResolverConfig,
    pub writer: WriterConfig,
    pub date_range: DateRange,
    pub out_dir: PathBuf,
    /// Also write `<Party>_party_corpus.txt` files after all documents
    pub party_corpus: bool,
    /// Upper bound on documents processed at once
    pub max_workers: usize,
}

impl PipelineConfig {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            normalizer: NormalizerConfig::default(),
            segmenter: SegmenterConfig::default(),
            resolver: ResolverConfig::default(),
            writer: WriterConfig::default(),
            date_range: DateRange::default(),
            out_dir: out_dir.into(),
            party_corpus: false,
            max_workers: default_workers(),
        }
    }
}

/// Everything a document worker reads; shared immutably across workers
pub struct PipelineContext {
    pub config: PipelineConfig,
    pub registry: Arc<LegislatorRegistry>,
    pub source: Arc<dyn PageSource>,
}

/// Per-document counters for the run summary
#[derive(Debug, Clone, Default)]
pub struct DocumentStats {
    pub pages: usize,
    pub lines: usize,
    pub boilerplate_removed: usize,
    pub turns: usize,
    pub resolved: usize,
    pub not_found: usize,
    pub ambiguous: usize,
}

/// What happened to one input document
#[derive(Debug)]
pub enum DocumentOutcome {
    Written {
        date: NaiveDate,
        output: WrittenDocument,
        stats: DocumentStats,
        party_fragments: Option<PartyFragments>,
    },
    FilteredOut {
        date: NaiveDate,
    },
    Skipped(DocumentError),
}

#[derive(Debug)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub outcome: DocumentOutcome,
}

/// Outcome of a run, in input order
#[derive(Debug, Default)]
pub struct RunReport {
    pub documents: Vec<DocumentReport>,
    pub party_corpora: Vec<PathBuf>,
}

impl RunReport {
    pub fn written_count(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Written { .. }))
    }

    pub fn filtered_count(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::FilteredOut { .. }))
    }

    pub fn skipped_count(&self) -> usize {
        self.count(|o| matches!(o, DocumentOutcome::Skipped(_)))
    }

    /// A run fails only when nothing was written and something was skipped
    pub fn is_success(&self) -> bool {
        self.written_count() > 0 || self.skipped_count() == 0
    }

    fn count(&self, pred: impl Fn(&DocumentOutcome) -> bool) -> usize {
        self.documents.iter().filter(|d| pred(&d.outcome)).count()
    }

    /// Human-readable summary: written vs. filtered vs. skipped with reasons
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Run Summary");
        let _ = writeln!(out, "===========");
        let _ = writeln!(
            out,
            "Written: {}  Filtered: {}  Skipped: {}",
            self.written_count(),
            self.filtered_count(),
            self.skipped_count()
        );

        for doc in &self.documents {
            let name = doc.path.display();
            match &doc.outcome {
                DocumentOutcome::Written { output, stats, .. } => {
                    let _ = writeln!(
                        out,
                        "  written   {} -> {} ({} lines, {} turns, {} resolved, {} ambiguous)",
                        name,
                        output.text_path.display(),
                        stats.lines,
                        output.turns,
                        stats.resolved,
                        stats.ambiguous
                    );
                }
                DocumentOutcome::FilteredOut { date } => {
                    let _ = writeln!(out, "  filtered  {} (dated {}, outside range)", name, date);
                }
                DocumentOutcome::Skipped(err) => {
                    let _ = writeln!(out, "  skipped   {} [{}] {}", name, err.kind(), err);
                }
            }
        }

        for path in &self.party_corpora {
            let _ = writeln!(out, "  party     {}", path.display());
        }

        out
    }
}

/// Create the output directory and prove it is writable. Failure is fatal.
pub fn ensure_output_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {:?}", dir))?;

    let probe = dir.join(".senate-corpus-write-probe");
    std::fs::write(&probe, b"")
        .with_context(|| format!("Output directory is not writable: {:?}", dir))?;
    std::fs::remove_file(&probe)
        .with_context(|| format!("Failed to remove probe file: {:?}", probe))?;
    Ok(())
}

/// Process every input, one blocking worker per document
///
/// Documents never affect each other: a failure is recorded in the report
/// and the remaining documents continue.
pub async fn run(paths: Vec<PathBuf>, ctx: Arc<PipelineContext>) -> Result<RunReport> {
    ensure_output_dir(&ctx.config.out_dir)?;

    let workers = ctx.config.max_workers.max(1);
    info!("Processing {} document(s) with up to {} worker(s)", paths.len(), workers);

    let semaphore = Arc::new(Semaphore::new(workers));
    let mut set = JoinSet::new();

    for (index, path) in paths.iter().cloned().enumerate() {
        let semaphore = semaphore.clone();
        let ctx = ctx.clone();
        set.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            let worker_path = path.clone();
            let joined =
                tokio::task::spawn_blocking(move || process_document(&worker_path, &ctx)).await;
            let outcome = joined.unwrap_or_else(|e| {
                warn!("Worker for {:?} failed: {}", path, e);
                DocumentOutcome::Skipped(DocumentError::Worker {
                    path: path.clone(),
                    message: e.to_string(),
                })
            });
            (index, outcome)
        });
    }

    let mut slots: Vec<Option<DocumentOutcome>> = paths.iter().map(|_| None).collect();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, outcome)) => slots[index] = Some(outcome),
            Err(e) => warn!("Document task failed: {}", e),
        }
    }

    let mut report = RunReport::default();
    for (path, slot) in paths.into_iter().zip(slots) {
        let outcome = slot.unwrap_or_else(|| {
            DocumentOutcome::Skipped(DocumentError::Worker {
                path: path.clone(),
                message: "task did not complete".to_string(),
            })
        });
        report.documents.push(DocumentReport { path, outcome });
    }

    if ctx.config.party_corpus {
        let fragments: Vec<PartyFragments> = report
            .documents
            .iter_mut()
            .filter_map(|d| match &mut d.outcome {
                DocumentOutcome::Written {
                    party_fragments, ..
                } => party_fragments.take(),
                _ => None,
            })
            .collect();
        report.party_corpora = write_party_corpora(fragments, &ctx.config.out_dir)?;
    }

    info!(
        "Run complete: {} written, {} filtered, {} skipped",
        report.written_count(),
        report.filtered_count(),
        report.skipped_count()
    );

    Ok(report)
}

/// Run stages 0-4 for one document, turning errors into a skip
pub fn process_document(path: &Path, ctx: &PipelineContext) -> DocumentOutcome {
    match run_document(path, ctx) {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!("Skipping {:?}: {}", path, e);
            DocumentOutcome::Skipped(e)
        }
    }
}

fn run_document(path: &Path, ctx: &PipelineContext) -> Result<DocumentOutcome, DocumentError> {
    let config = &ctx.config;
    info!("Processing {:?}", path);

    let pages = ctx
        .source
        .extract_pages(path)
        .map_err(|e| DocumentError::Extraction {
            path: path.to_path_buf(),
            message: format!("{:#}", e),
        })?;

    let date = document_date(path, &pages)?;

    // Stage 0: Normalize
    let normalized = normalize(&pages, &config.normalizer);
    let mut stats = DocumentStats {
        pages: pages.len(),
        lines: normalized.line_count(),
        boilerplate_removed: normalized.boilerplate_removed,
        ..Default::default()
    };

    // Stage 1: Segment
    let turns = segment(&normalized.into_lines(), &config.segmenter);
    stats.turns = turns.len();

    // Stage 2: Resolve
    let resolution = resolve_turns(turns, date, &ctx.registry, &config.resolver);
    stats.resolved = resolution.resolved;
    stats.not_found = resolution.not_found;
    stats.ambiguous = resolution.ambiguous;
    info!(
        "{:?}: {} pages, {} turns, {} resolved, {} unmatched, {} ambiguous",
        path, stats.pages, stats.turns, stats.resolved, stats.not_found, stats.ambiguous
    );

    // Stage 3: Assemble
    let record = match assemble(resolution.turns, path, date, &config.date_range) {
        AssemblyOutcome::Assembled(record) => record,
        AssemblyOutcome::FilteredOut { date } => return Ok(DocumentOutcome::FilteredOut { date }),
    };

    // Stage 4: Render
    let party_fragments = config
        .party_corpus
        .then(|| PartyFragments::from_record(&record));
    let output = write_document(&record, &config.out_dir, &config.writer)?;

    Ok(DocumentOutcome::Written {
        date,
        output,
        stats,
        party_fragments,
    })
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
