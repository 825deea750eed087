use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::KnowledgeStore;
use crate::error::StoreError;
use crate::models::{Category, KnowledgeEntry, KnowledgeSource, NewKnowledgeEntry};

/// In-process store backed by a vector; insertion order is creation order.
#[derive(Debug, Default)]
pub struct MemoryKnowledgeStore {
    entries: RwLock<Vec<KnowledgeEntry>>,
}

impl MemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with existing entries (e.g. manual knowledge typed in the admin UI).
    pub fn with_entries(entries: Vec<KnowledgeEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    pub async fn snapshot(&self) -> Vec<KnowledgeEntry> {
        self.entries.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl KnowledgeStore for MemoryKnowledgeStore {
    async fn create(&self, entry: NewKnowledgeEntry) -> Result<KnowledgeEntry, StoreError> {
        let now = Utc::now();
        let stored = KnowledgeEntry {
            id: Uuid::new_v4(),
            venue_id: entry.venue_id,
            question: entry.question,
            answer: entry.answer,
            category: entry.category,
            priority: entry.priority,
            tags: entry.tags,
            source: entry.source,
            confidence: entry.confidence,
            needs_review: entry.needs_review,
            is_active: entry.is_active,
            created_at: now,
            updated_at: now,
        };
        self.entries.write().await.push(stored.clone());
        Ok(stored)
    }

    async fn list_by_venue_and_category(
        &self,
        venue_id: Uuid,
        category: Category,
    ) -> Result<Vec<KnowledgeEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.venue_id == venue_id && e.category == category)
            .cloned()
            .collect())
    }

    async fn get(&self, id: Uuid) -> Result<Option<KnowledgeEntry>, StoreError> {
        Ok(self.entries.read().await.iter().find(|e| e.id == id).cloned())
    }

    async fn list_pending(&self, venue_id: Uuid) -> Result<Vec<KnowledgeEntry>, StoreError> {
        Ok(self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.venue_id == venue_id && e.needs_review)
            .cloned()
            .collect())
    }

    async fn list_active(&self, venue_id: Uuid) -> Result<Vec<KnowledgeEntry>, StoreError> {
        let mut active: Vec<KnowledgeEntry> = self
            .entries
            .read()
            .await
            .iter()
            .filter(|e| e.venue_id == venue_id && e.is_retrievable())
            .cloned()
            .collect();
        active.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(active)
    }

    async fn set_review_state(
        &self,
        id: Uuid,
        needs_review: bool,
        is_active: bool,
    ) -> Result<KnowledgeEntry, StoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(StoreError::NotFound(id))?;
        entry.needs_review = needs_review;
        entry.is_active = is_active;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        Ok(entries.len() < before)
    }

    async fn delete_by_source(
        &self,
        venue_id: Uuid,
        source: KnowledgeSource,
    ) -> Result<u64, StoreError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|e| !(e.venue_id == venue_id && e.source == source));
        Ok((before - entries.len()) as u64)
    }
}
