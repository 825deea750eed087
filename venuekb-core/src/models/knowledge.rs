use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Fixed knowledge taxonomy. Stored as its snake_case name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Faq,
    Pricing,
    PricingNuance,
    Capacity,
    ObjectionHandling,
    Policy,
    SalesWorkflow,
    Amenities,
    CeremonySpaces,
    Lodging,
    LocationDirections,
    BrandVoice,
    HumanHandoff,
    Other,
}

impl Category {
    pub const ALL: [Category; 14] = [
        Category::Faq,
        Category::Pricing,
        Category::PricingNuance,
        Category::Capacity,
        Category::ObjectionHandling,
        Category::Policy,
        Category::SalesWorkflow,
        Category::Amenities,
        Category::CeremonySpaces,
        Category::Lodging,
        Category::LocationDirections,
        Category::BrandVoice,
        Category::HumanHandoff,
        Category::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Faq => "faq",
            Category::Pricing => "pricing",
            Category::PricingNuance => "pricing_nuance",
            Category::Capacity => "capacity",
            Category::ObjectionHandling => "objection_handling",
            Category::Policy => "policy",
            Category::SalesWorkflow => "sales_workflow",
            Category::Amenities => "amenities",
            Category::CeremonySpaces => "ceremony_spaces",
            Category::Lodging => "lodging",
            Category::LocationDirections => "location_directions",
            Category::BrandVoice => "brand_voice",
            Category::HumanHandoff => "human_handoff",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Category::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| format!("unknown category '{}'", s))
    }
}

/// Provenance of a knowledge entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeSource {
    Manual,
    Transcript,
    Onboarding,
}

impl KnowledgeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KnowledgeSource::Manual => "manual",
            KnowledgeSource::Transcript => "transcript",
            KnowledgeSource::Onboarding => "onboarding",
        }
    }

    /// Only transcript extractions carry a model confidence score.
    pub fn carries_confidence(&self) -> bool {
        matches!(self, KnowledgeSource::Transcript)
    }
}

impl fmt::Display for KnowledgeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KnowledgeSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(KnowledgeSource::Manual),
            "transcript" => Ok(KnowledgeSource::Transcript),
            "onboarding" => Ok(KnowledgeSource::Onboarding),
            other => Err(format!("unknown knowledge source '{}'", other)),
        }
    }
}

/// Human decision on a held entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

/// A stored chatbot-usable fact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub question: String,
    pub answer: String,
    pub category: Category,
    pub priority: i32,
    pub tags: Vec<String>,
    pub source: KnowledgeSource,
    pub confidence: Option<f64>,
    pub needs_review: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl KnowledgeEntry {
    /// Visible to the chat-answering collaborator
    pub fn is_retrievable(&self) -> bool {
        self.is_active && !self.needs_review
    }
}

/// Insert payload; id and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewKnowledgeEntry {
    pub venue_id: Uuid,
    pub question: String,
    pub answer: String,
    pub category: Category,
    pub priority: i32,
    pub tags: Vec<String>,
    pub source: KnowledgeSource,
    pub confidence: Option<f64>,
    pub needs_review: bool,
    pub is_active: bool,
}

/// Raw row shape; enums are stored as text.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct KnowledgeRow {
    pub id: Uuid,
    pub venue_id: Uuid,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub priority: i32,
    pub tags: Vec<String>,
    pub source: String,
    pub confidence: Option<f64>,
    pub needs_review: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<KnowledgeRow> for KnowledgeEntry {
    type Error = crate::error::StoreError;

    fn try_from(row: KnowledgeRow) -> Result<Self, Self::Error> {
        let category = row.category.parse::<Category>().map_err(|_| {
            crate::error::StoreError::InvalidValue {
                field: "category",
                value: row.category.clone(),
            }
        })?;
        let source = row.source.parse::<KnowledgeSource>().map_err(|_| {
            crate::error::StoreError::InvalidValue {
                field: "source",
                value: row.source.clone(),
            }
        })?;
        Ok(KnowledgeEntry {
            id: row.id,
            venue_id: row.venue_id,
            question: row.question,
            answer: row.answer,
            category,
            priority: row.priority,
            tags: row.tags,
            source,
            confidence: row.confidence,
            needs_review: row.needs_review,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_str() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>(), Ok(category));
        }
    }

    #[test]
    fn test_category_parse_is_lenient_on_case_and_space() {
        assert_eq!(" Pricing_Nuance ".parse::<Category>(), Ok(Category::PricingNuance));
        assert!("venue_tour".parse::<Category>().is_err());
    }

    #[test]
    fn test_category_serde_name_matches_as_str() {
        let json = serde_json::to_value(Category::HumanHandoff).unwrap();
        assert_eq!(json, "human_handoff");
    }

    #[test]
    fn test_only_transcript_carries_confidence() {
        assert!(KnowledgeSource::Transcript.carries_confidence());
        assert!(!KnowledgeSource::Manual.carries_confidence());
        assert!(!KnowledgeSource::Onboarding.carries_confidence());
    }

    #[test]
    fn test_row_with_unknown_category_is_rejected() {
        let now = Utc::now();
        let row = KnowledgeRow {
            id: Uuid::new_v4(),
            venue_id: Uuid::new_v4(),
            question: "q".to_string(),
            answer: "a".to_string(),
            category: "weather".to_string(),
            priority: 5,
            tags: vec![],
            source: "manual".to_string(),
            confidence: None,
            needs_review: false,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let err = KnowledgeEntry::try_from(row).unwrap_err();
        assert!(err.to_string().contains("category"));
    }
}
