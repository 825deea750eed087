pub mod config;
pub mod db;
pub mod error;
pub mod ipc;
pub mod llm;
pub mod models;
pub mod store;

pub use config::{PipelineConfig, VenueKbConfig};
pub use error::{StoreError, VenueKbError};
pub use llm::{GeminiClient, GeminiConfig, LanguageModel, LlmError};
pub use models::{
    Category, KnowledgeEntry, KnowledgeSource, NewKnowledgeEntry, OnboardingAnswer,
    ReviewDecision, Section, SectionState,
};
pub use store::{KnowledgeStore, MemoryKnowledgeStore, PgKnowledgeStore};
