use std::sync::Arc;

use sqlx::PgPool;
use venuekb_core::{KnowledgeStore, LanguageModel, VenueKbConfig};
use venuekb_ingest::{ExtractionPipeline, ReviewInbox};

/// Shared by the IPC loop and every HTTP handler
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: VenueKbConfig,
    pub pipeline: ExtractionPipeline,
}

impl AppState {
    pub fn new(
        pool: PgPool,
        config: VenueKbConfig,
        llm: Arc<dyn LanguageModel>,
        store: Arc<dyn KnowledgeStore>,
    ) -> Self {
        let inbox = ReviewInbox::new(config.review.inbox.as_deref());
        let pipeline =
            ExtractionPipeline::new(llm, store, config.pipeline.clone()).with_inbox(inbox);
        Self {
            pool,
            config,
            pipeline,
        }
    }

    pub fn store(&self) -> &dyn KnowledgeStore {
        self.pipeline.store()
    }
}
