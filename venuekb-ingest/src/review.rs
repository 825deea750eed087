//! Review/approval state machine for held entries
//!
//! held (needs_review, inactive) --approve--> live (active)
//! held                          --reject---> deleted
//!
//! Entries that are not held accept no transition.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use shellexpand::tilde;
use uuid::Uuid;
use venuekb_core::{KnowledgeEntry, KnowledgeStore, ReviewDecision, StoreError};

use crate::error::IngestError;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReviewOutcome {
    Approved { entry: KnowledgeEntry },
    Rejected { id: Uuid },
}

pub async fn list_pending(
    store: &dyn KnowledgeStore,
    venue_id: Uuid,
) -> Result<Vec<KnowledgeEntry>, IngestError> {
    Ok(store.list_pending(venue_id).await?)
}

pub async fn apply(
    store: &dyn KnowledgeStore,
    id: Uuid,
    decision: ReviewDecision,
) -> Result<ReviewOutcome, IngestError> {
    let entry = store
        .get(id)
        .await?
        .ok_or(IngestError::Store(StoreError::NotFound(id)))?;

    if !entry.needs_review {
        return Err(IngestError::NotPending(id));
    }

    match decision {
        ReviewDecision::Approve => {
            let entry = store.set_review_state(id, false, true).await?;
            tracing::info!(id = %id, venue_id = %entry.venue_id, "Held entry approved");
            Ok(ReviewOutcome::Approved { entry })
        }
        ReviewDecision::Reject => {
            if !store.delete(id).await? {
                return Err(IngestError::Store(StoreError::NotFound(id)));
            }
            tracing::info!(id = %id, venue_id = %entry.venue_id, "Held entry rejected");
            Ok(ReviewOutcome::Rejected { id })
        }
    }
}

/// Markdown file reviewers watch for newly held entries
#[derive(Debug, Clone, Default)]
pub struct ReviewInbox {
    path: Option<PathBuf>,
}

impl ReviewInbox {
    pub fn new(path: Option<&str>) -> Self {
        Self {
            path: path.map(|p| PathBuf::from(tilde(p).to_string())),
        }
    }

    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Append one held entry. No-op when no inbox is configured.
    pub fn notify_held(&self, entry: &KnowledgeEntry, pass: &str) -> Result<(), IngestError> {
        let path = match &self.path {
            Some(p) => p,
            None => return Ok(()),
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let note = format!(
            r#"
### [{}] Held for review
**Venue:** {} / **Category:** {} / **Pass:** {}
**Entry ID:** {}
**Q:** {}
**A:** {}
**Confidence:** {}
Actions: `approve` | `reject`

"#,
            Utc::now().to_rfc3339(),
            entry.venue_id,
            entry.category,
            pass,
            entry.id,
            entry.question,
            entry.answer,
            entry
                .confidence
                .map(|c| format!("{:.2}", c))
                .unwrap_or_else(|| "n/a".to_string()),
        );

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(note.as_bytes())?;
        Ok(())
    }
}
