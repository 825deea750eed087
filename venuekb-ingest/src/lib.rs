//! Knowledge extraction for venue chatbots
//!
//! Turns sales-call transcripts and onboarding answers into curated
//! question/answer entries: chunk, extract per pass, dedup, gate, store.

pub mod chunker;
pub mod dedup;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod grounding;
pub mod onboarding;
pub mod passes;
pub mod pipeline;
pub mod progress;
pub mod review;

pub use error::IngestError;
pub use passes::{PassName, PassRegistry, PassSpec};
pub use pipeline::{
    ChunkFailure, ExtractionPipeline, ExtractionReport, PassReport, TranscriptReport, VenueLocks,
};
pub use progress::{progress_report, readiness_score, ProgressReport};
pub use review::{ReviewInbox, ReviewOutcome};
