pub mod error;
pub mod io;
pub mod models;
pub mod pipeline;
pub mod stages;

pub use error::DocumentError;
pub use io::{
    CURRENT_LEGISLATORS_URL, CorpusJson, CorpusText, HISTORICAL_LEGISLATORS_URL, PageSource,
    PdftotextSource, load_registry,
};
pub use models::{Chamber, DateRange, DocumentRecord, Party, Speaker, SpeakerIdentity, Turn};
pub use pipeline::{DocumentOutcome, PipelineConfig, PipelineContext, RunReport, run};
pub use stages::{
    LegislatorRegistry, NormalizerConfig, ResolverConfig, SegmenterConfig, WriterConfig,
    normalize, resolve_turns, segment,
};
