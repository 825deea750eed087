//! Extraction pipeline: transcript/onboarding text → curated knowledge entries
//!
//! Per invocation:
//! 1. Validate the request (pass name, venue, non-empty input); fail fast, no writes
//! 2. Chunk the transcript on line boundaries
//! 3. For each chunk, call the Structured Extractor; a failed call is recorded
//!    against (pass, chunk) and the run continues
//! 4. For each returned entry: grounding check (onboarding only), duplicate
//!    check against the venue's entries in the same category, confidence gate,
//!    then commit before the next entry is considered
//!
//! All work for one venue runs under that venue's lock, so the
//! read-then-write duplicate check always sees every earlier commit.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;
use venuekb_core::{
    KnowledgeSource, KnowledgeStore, LanguageModel, NewKnowledgeEntry, OnboardingAnswer,
    PipelineConfig,
};

use crate::chunker::chunk_transcript;
use crate::dedup::find_duplicate;
use crate::error::IngestError;
use crate::extractor::{ExtractedEntry, StructuredExtractor};
use crate::gate::gate;
use crate::grounding::ungrounded_claims;
use crate::onboarding;
use crate::passes::{PassName, PassRegistry, PassSpec};
use crate::review::ReviewInbox;

// ============================================================================
// Reports
// ============================================================================

/// A model call that failed for one (pass, chunk)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkFailure {
    pub pass: String,
    pub chunk_index: usize,
    pub error: String,
}

/// Counters for one invocation.
///
/// `extracted == saved + skipped_duplicates + rejected_malformed
///  + rejected_ungrounded + store_failures` always holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionReport {
    pub extracted: usize,
    pub saved: usize,
    /// Subset of `saved` stored inactive pending review
    pub held_for_review: usize,
    pub skipped_duplicates: usize,
    pub rejected_malformed: usize,
    pub rejected_ungrounded: usize,
    pub store_failures: usize,
    pub chunks: usize,
    pub chunk_failures: Vec<ChunkFailure>,
}

impl ExtractionReport {
    pub fn is_balanced(&self) -> bool {
        self.extracted
            == self.saved
                + self.skipped_duplicates
                + self.rejected_malformed
                + self.rejected_ungrounded
                + self.store_failures
    }

    pub fn has_failures(&self) -> bool {
        !self.chunk_failures.is_empty() || self.store_failures > 0
    }

    pub fn merge(&mut self, other: &ExtractionReport) {
        self.extracted += other.extracted;
        self.saved += other.saved;
        self.held_for_review += other.held_for_review;
        self.skipped_duplicates += other.skipped_duplicates;
        self.rejected_malformed += other.rejected_malformed;
        self.rejected_ungrounded += other.rejected_ungrounded;
        self.store_failures += other.store_failures;
        self.chunks += other.chunks;
        self.chunk_failures.extend(other.chunk_failures.iter().cloned());
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub pass: PassName,
    #[serde(flatten)]
    pub report: ExtractionReport,
}

/// All six passes over one transcript
#[derive(Debug, Clone, Default, Serialize)]
pub struct TranscriptReport {
    pub passes: Vec<PassReport>,
    pub totals: ExtractionReport,
}

enum Admission {
    Saved { held: bool },
    Duplicate,
    StoreFailed,
}

// ============================================================================
// Venue locks
// ============================================================================

/// One async mutex per venue, created on first use.
///
/// Locks that nobody holds or waits on are pruned on the next acquisition,
/// so the map stays bounded by the venues currently in flight.
#[derive(Debug, Clone, Default)]
pub struct VenueLocks {
    inner: Arc<Mutex<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl VenueLocks {
    pub async fn lock(&self, venue_id: Uuid) -> OwnedMutexGuard<()> {
        let venue_lock = {
            let mut map = self.inner.lock().await;
            // Holders and waiters keep a clone; a count of 1 is the map alone
            map.retain(|id, lock| *id == venue_id || Arc::strong_count(lock) > 1);
            map.entry(venue_id).or_default().clone()
        };
        venue_lock.lock_owned().await
    }

    /// Number of venues with a tracked lock.
    pub async fn tracked(&self) -> usize {
        self.inner.lock().await.len()
    }
}

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Clone)]
pub struct ExtractionPipeline {
    llm: Arc<dyn LanguageModel>,
    store: Arc<dyn KnowledgeStore>,
    registry: Arc<PassRegistry>,
    config: PipelineConfig,
    inbox: ReviewInbox,
    locks: VenueLocks,
}

impl ExtractionPipeline {
    pub fn new(
        llm: Arc<dyn LanguageModel>,
        store: Arc<dyn KnowledgeStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            llm,
            store,
            registry: Arc::new(PassRegistry::builtin()),
            config,
            inbox: ReviewInbox::disabled(),
            locks: VenueLocks::default(),
        }
    }

    pub fn with_inbox(mut self, inbox: ReviewInbox) -> Self {
        self.inbox = inbox;
        self
    }

    pub fn store(&self) -> &dyn KnowledgeStore {
        self.store.as_ref()
    }

    pub fn model_name(&self) -> &str {
        self.llm.name()
    }

    pub fn registry(&self) -> &PassRegistry {
        &self.registry
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// One pass over one transcript.
    pub async fn run_pass(
        &self,
        venue_id: Uuid,
        transcript: &str,
        pass: &str,
    ) -> Result<ExtractionReport, IngestError> {
        let spec = self.registry.get(pass)?;
        validate_transcript(venue_id, transcript)?;

        let _guard = self.locks.lock(venue_id).await;
        Ok(self.run_pass_locked(venue_id, transcript, spec).await)
    }

    /// Every pass, in registry order, over one transcript.
    pub async fn run_transcript(
        &self,
        venue_id: Uuid,
        transcript: &str,
    ) -> Result<TranscriptReport, IngestError> {
        validate_transcript(venue_id, transcript)?;

        let _guard = self.locks.lock(venue_id).await;
        let mut result = TranscriptReport::default();
        for spec in self.registry.iter() {
            let report = self.run_pass_locked(venue_id, transcript, spec).await;
            result.totals.merge(&report);
            result.passes.push(PassReport {
                pass: spec.name,
                report,
            });
        }

        tracing::info!(
            venue_id = %venue_id,
            extracted = result.totals.extracted,
            saved = result.totals.saved,
            skipped_duplicates = result.totals.skipped_duplicates,
            chunk_failures = result.totals.chunk_failures.len(),
            "Transcript run complete"
        );
        Ok(result)
    }

    /// Generate entries from structured onboarding answers.
    ///
    /// Entries whose numbers are not literally present in the answers are
    /// rejected. Survivors are stored active, without a confidence score.
    pub async fn run_onboarding(
        &self,
        venue_id: Uuid,
        answers: &[OnboardingAnswer],
        replace_existing: bool,
    ) -> Result<ExtractionReport, IngestError> {
        if venue_id.is_nil() {
            return Err(IngestError::Validation("venue_id is required".to_string()));
        }
        let answers = onboarding::usable_answers(answers);
        if answers.is_empty() {
            return Err(IngestError::Validation(
                "at least one non-empty onboarding answer is required".to_string(),
            ));
        }

        let _guard = self.locks.lock(venue_id).await;

        let source_text = onboarding::source_text(&answers);
        let prompt = onboarding::build_prompt(&answers);
        let extractor = StructuredExtractor::new(self.llm.as_ref());
        let mut report = ExtractionReport {
            chunks: 1,
            ..Default::default()
        };

        let batch = match extractor.extract(&prompt).await {
            Ok(batch) => batch,
            Err(e) => {
                tracing::warn!(venue_id = %venue_id, error = %e, "Onboarding extraction failed");
                report.chunk_failures.push(ChunkFailure {
                    pass: onboarding::PASS_LABEL.to_string(),
                    chunk_index: 0,
                    error: e.to_string(),
                });
                return Ok(report);
            }
        };

        // Previous entries go only once a replacement batch exists
        if replace_existing {
            let removed = self
                .store
                .delete_by_source(venue_id, KnowledgeSource::Onboarding)
                .await?;
            tracing::info!(venue_id = %venue_id, removed, "Cleared previous onboarding entries");
        }

        report.extracted += batch.returned();
        report.rejected_malformed += batch.malformed;
        if batch.malformed > 0 {
            tracing::warn!(venue_id = %venue_id, count = batch.malformed, reason = "malformed", "Dropped malformed onboarding items");
        }

        for entry in batch.entries {
            let missing = ungrounded_claims(&entry.answer, &source_text);
            if !missing.is_empty() {
                let claims: Vec<String> = missing.iter().map(|c| c.to_string()).collect();
                tracing::warn!(
                    venue_id = %venue_id,
                    category = %entry.category,
                    reason = "ungrounded",
                    claims = ?claims,
                    "Rejected generated entry with numbers absent from source answers"
                );
                report.rejected_ungrounded += 1;
                continue;
            }
            self.admit(
                venue_id,
                entry,
                KnowledgeSource::Onboarding,
                onboarding::PASS_LABEL,
                &mut report,
            )
            .await;
        }

        tracing::info!(
            venue_id = %venue_id,
            extracted = report.extracted,
            saved = report.saved,
            rejected_ungrounded = report.rejected_ungrounded,
            "Onboarding extraction complete"
        );
        Ok(report)
    }

    async fn run_pass_locked(
        &self,
        venue_id: Uuid,
        transcript: &str,
        spec: &PassSpec,
    ) -> ExtractionReport {
        let extractor = StructuredExtractor::new(self.llm.as_ref());
        let pass = spec.name.as_str();
        let mut report = ExtractionReport::default();

        for (index, chunk) in chunk_transcript(transcript, self.config.chunk_size).enumerate() {
            report.chunks += 1;
            let prompt = spec.build_prompt(chunk);

            let batch = match extractor.extract(&prompt).await {
                Ok(batch) => batch,
                Err(e) => {
                    tracing::warn!(venue_id = %venue_id, pass, chunk = index, error = %e, "Chunk extraction failed");
                    report.chunk_failures.push(ChunkFailure {
                        pass: pass.to_string(),
                        chunk_index: index,
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            tracing::debug!(
                venue_id = %venue_id,
                pass,
                chunk = index,
                returned = batch.returned(),
                "Chunk extracted"
            );
            report.extracted += batch.returned();
            report.rejected_malformed += batch.malformed;
            if batch.malformed > 0 {
                tracing::warn!(venue_id = %venue_id, pass, chunk = index, count = batch.malformed, reason = "malformed", "Dropped malformed model items");
            }

            for entry in batch.entries {
                self.admit(venue_id, entry, KnowledgeSource::Transcript, pass, &mut report)
                    .await;
            }
        }

        tracing::info!(
            venue_id = %venue_id,
            pass,
            chunks = report.chunks,
            extracted = report.extracted,
            saved = report.saved,
            held = report.held_for_review,
            skipped_duplicates = report.skipped_duplicates,
            "Pass complete"
        );
        report
    }

    /// Duplicate check, confidence gate and commit for one entry.
    async fn admit(
        &self,
        venue_id: Uuid,
        entry: ExtractedEntry,
        source: KnowledgeSource,
        pass: &str,
        report: &mut ExtractionReport,
    ) {
        match self.try_admit(venue_id, entry, source, pass).await {
            Admission::Saved { held } => {
                report.saved += 1;
                if held {
                    report.held_for_review += 1;
                }
            }
            Admission::Duplicate => report.skipped_duplicates += 1,
            Admission::StoreFailed => report.store_failures += 1,
        }
    }

    async fn try_admit(
        &self,
        venue_id: Uuid,
        entry: ExtractedEntry,
        source: KnowledgeSource,
        pass: &str,
    ) -> Admission {
        let existing = match self
            .store
            .list_by_venue_and_category(venue_id, entry.category)
            .await
        {
            Ok(existing) => existing,
            Err(e) => {
                tracing::error!(venue_id = %venue_id, pass, category = %entry.category, reason = "store_error", error = %e, "Failed to load entries for duplicate check");
                return Admission::StoreFailed;
            }
        };

        if let Some(dup) = find_duplicate(
            &entry.question,
            entry.category,
            &existing,
            self.config.similarity_threshold,
        ) {
            tracing::debug!(
                venue_id = %venue_id,
                pass,
                category = %entry.category,
                reason = "duplicate",
                existing_id = %dup.id,
                question = %entry.question,
                "Skipped duplicate entry"
            );
            return Admission::Duplicate;
        }

        let confidence = if source.carries_confidence() {
            if entry.confidence.is_none() {
                tracing::warn!(
                    venue_id = %venue_id,
                    pass,
                    category = %entry.category,
                    reason = "missing_confidence",
                    "Model omitted confidence; entry bypasses the review gate"
                );
            }
            entry.confidence
        } else {
            None
        };
        let activation = gate(confidence, self.config.confidence_threshold);

        let new_entry = NewKnowledgeEntry {
            venue_id,
            question: entry.question,
            answer: entry.answer,
            category: entry.category,
            priority: entry.priority,
            tags: entry.tags,
            source,
            confidence,
            needs_review: activation.needs_review,
            is_active: activation.is_active,
        };

        match self.store.create(new_entry).await {
            Ok(stored) => {
                if stored.needs_review {
                    tracing::info!(venue_id = %venue_id, pass, id = %stored.id, confidence = ?stored.confidence, "Entry held for review");
                    if let Err(e) = self.inbox.notify_held(&stored, pass) {
                        tracing::warn!(id = %stored.id, error = %e, "Failed to write review inbox");
                    }
                }
                Admission::Saved {
                    held: stored.needs_review,
                }
            }
            Err(e) => {
                tracing::error!(venue_id = %venue_id, pass, reason = "store_error", error = %e, "Failed to store knowledge entry");
                Admission::StoreFailed
            }
        }
    }
}

fn validate_transcript(venue_id: Uuid, transcript: &str) -> Result<(), IngestError> {
    if venue_id.is_nil() {
        return Err(IngestError::Validation("venue_id is required".to_string()));
    }
    if transcript.trim().is_empty() {
        return Err(IngestError::Validation("transcript is empty".to_string()));
    }
    Ok(())
}
