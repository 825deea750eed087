//! Knowledge Store: durable collection of knowledge entries
//!
//! The extraction pipeline only ever creates entries and reads them back per
//! (venue, category) for duplicate comparison. Review transitions and
//! regeneration deletes go through the same trait so the in-memory store can
//! stand in for Postgres in tests.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{Category, KnowledgeEntry, KnowledgeSource, NewKnowledgeEntry};

pub mod memory;
pub mod postgres;

pub use memory::MemoryKnowledgeStore;
pub use postgres::PgKnowledgeStore;

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Insert a new entry and return it with its assigned id.
    async fn create(&self, entry: NewKnowledgeEntry) -> Result<KnowledgeEntry, StoreError>;

    /// All entries for the venue in one category, regardless of review state.
    async fn list_by_venue_and_category(
        &self,
        venue_id: Uuid,
        category: Category,
    ) -> Result<Vec<KnowledgeEntry>, StoreError>;

    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeEntry>, StoreError>;

    /// Entries held pending human approval, oldest first.
    async fn list_pending(&self, venue_id: Uuid) -> Result<Vec<KnowledgeEntry>, StoreError>;

    /// Entries eligible for chatbot retrieval.
    async fn list_active(&self, venue_id: Uuid) -> Result<Vec<KnowledgeEntry>, StoreError>;

    /// Overwrite the review/activation flags. Errors with `NotFound` for a missing id.
    async fn set_review_state(
        &self,
        id: Uuid,
        needs_review: bool,
        is_active: bool,
    ) -> Result<KnowledgeEntry, StoreError>;

    /// Returns false when nothing was deleted.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn delete_by_source(
        &self,
        venue_id: Uuid,
        source: KnowledgeSource,
    ) -> Result<u64, StoreError>;
}
