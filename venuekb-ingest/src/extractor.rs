//! Structured Extractor: one model call per (pass, chunk)
//!
//! The model is an external oracle. This module owns the fixed output schema
//! and the boundary validation: items missing `question`, `answer` or
//! `category` are counted as malformed and dropped, never passed on half-filled.

use serde::Deserialize;
use venuekb_core::{Category, LanguageModel, LlmError};

pub const DEFAULT_PRIORITY: i32 = 5;
pub const MIN_PRIORITY: i32 = 1;
pub const MAX_PRIORITY: i32 = 10;

/// A validated model-produced entry, not yet gated or stored
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedEntry {
    pub question: String,
    pub answer: String,
    pub category: Category,
    pub priority: i32,
    pub tags: Vec<String>,
    pub confidence: Option<f64>,
}

/// Output of one model call after validation
#[derive(Debug, Clone, Default)]
pub struct ExtractionBatch {
    pub entries: Vec<ExtractedEntry>,
    /// Items the model returned that failed validation
    pub malformed: usize,
}

impl ExtractionBatch {
    /// Every item the model returned, valid or not
    pub fn returned(&self) -> usize {
        self.entries.len() + self.malformed
    }
}

/// Loose shape accepted from the model before validation
#[derive(Debug, Deserialize)]
struct RawEntry {
    question: Option<String>,
    answer: Option<String>,
    category: Option<String>,
    priority: Option<serde_json::Value>,
    #[serde(default)]
    tags: Option<Vec<serde_json::Value>>,
    confidence: Option<serde_json::Value>,
}

/// Response schema sent with every extraction request (Gemini OpenAPI subset).
pub fn entry_schema() -> serde_json::Value {
    let categories: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    serde_json::json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "question": { "type": "STRING" },
                "answer": { "type": "STRING" },
                "category": { "type": "STRING", "enum": categories },
                "priority": { "type": "INTEGER" },
                "tags": { "type": "ARRAY", "items": { "type": "STRING" } },
                "confidence": { "type": "NUMBER" }
            },
            "required": ["question", "answer", "category"]
        }
    })
}

pub struct StructuredExtractor<'a> {
    llm: &'a dyn LanguageModel,
    schema: serde_json::Value,
}

impl<'a> StructuredExtractor<'a> {
    pub fn new(llm: &'a dyn LanguageModel) -> Self {
        Self {
            llm,
            schema: entry_schema(),
        }
    }

    /// Call the model and validate its output. Model failures propagate.
    pub async fn extract(&self, prompt: &str) -> Result<ExtractionBatch, LlmError> {
        let items = self.llm.extract(prompt, &self.schema).await?;
        Ok(validate_items(items))
    }
}

pub fn validate_items(items: Vec<serde_json::Value>) -> ExtractionBatch {
    let mut batch = ExtractionBatch::default();
    for item in items {
        match validate_item(item) {
            Some(entry) => batch.entries.push(entry),
            None => batch.malformed += 1,
        }
    }
    batch
}

fn validate_item(item: serde_json::Value) -> Option<ExtractedEntry> {
    let raw: RawEntry = match serde_json::from_value(item) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::debug!(error = %e, "Model item is not an object with string fields");
            return None;
        }
    };

    let question = non_blank(raw.question)?;
    let answer = non_blank(raw.answer)?;
    let category_name = non_blank(raw.category)?;

    let category = match category_name.parse::<Category>() {
        Ok(c) => c,
        Err(_) => {
            tracing::warn!(category = %category_name, "Unknown category from model, filing under other");
            Category::Other
        }
    };

    Some(ExtractedEntry {
        question,
        answer,
        category,
        priority: coerce_priority(raw.priority.as_ref()),
        tags: coerce_tags(raw.tags),
        confidence: coerce_confidence(raw.confidence.as_ref()),
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn coerce_priority(value: Option<&serde_json::Value>) -> i32 {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(p) if p.is_finite() => (p.round() as i32).clamp(MIN_PRIORITY, MAX_PRIORITY),
        _ => DEFAULT_PRIORITY,
    }
}

fn coerce_confidence(value: Option<&serde_json::Value>) -> Option<f64> {
    let parsed = match value {
        Some(serde_json::Value::Number(n)) => n.as_f64(),
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then(|| parsed.clamp(0.0, 1.0))
}

fn coerce_tags(value: Option<Vec<serde_json::Value>>) -> Vec<String> {
    let mut tags: Vec<String> = value
        .unwrap_or_default()
        .into_iter()
        .filter_map(|t| match t {
            serde_json::Value::String(s) => Some(s.trim().to_lowercase()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_requires_core_fields() {
        let schema = entry_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert_eq!(
            schema["items"]["required"],
            json!(["question", "answer", "category"])
        );
        let allowed = schema["items"]["properties"]["category"]["enum"]
            .as_array()
            .unwrap();
        assert_eq!(allowed.len(), Category::ALL.len());
    }

    #[test]
    fn test_valid_item_passes_through() {
        let batch = validate_items(vec![json!({
            "question": "What's the base package price?",
            "answer": "Our base package is $8,500 for up to 100 guests.",
            "category": "pricing",
            "priority": 9,
            "tags": ["Package", "package", " base "],
            "confidence": 0.9
        })]);
        assert_eq!(batch.malformed, 0);
        let entry = &batch.entries[0];
        assert_eq!(entry.category, Category::Pricing);
        assert_eq!(entry.priority, 9);
        assert_eq!(entry.tags, vec!["base", "package"]);
        assert_eq!(entry.confidence, Some(0.9));
    }

    #[test]
    fn test_missing_required_fields_are_malformed() {
        let batch = validate_items(vec![
            json!({ "answer": "a", "category": "faq" }),
            json!({ "question": "q", "answer": "a" }),
            json!({ "question": "   ", "answer": "a", "category": "faq" }),
            json!("just a string"),
            json!({ "question": 42, "answer": "a", "category": "faq" }),
            json!({ "question": "q", "answer": "a", "category": "faq" }),
        ]);
        assert_eq!(batch.malformed, 5);
        assert_eq!(batch.entries.len(), 1);
        assert_eq!(batch.returned(), 6);
    }

    #[test]
    fn test_optional_fields_are_coerced() {
        let batch = validate_items(vec![json!({
            "question": "q",
            "answer": "a",
            "category": "venue_tours",
            "priority": "42",
            "tags": [1, "Outdoor"],
            "confidence": 1.7
        })]);
        let entry = &batch.entries[0];
        assert_eq!(entry.category, Category::Other);
        assert_eq!(entry.priority, MAX_PRIORITY);
        assert_eq!(entry.tags, vec!["outdoor"]);
        assert_eq!(entry.confidence, Some(1.0));
    }

    #[test]
    fn test_absent_optional_fields_get_defaults() {
        let batch = validate_items(vec![json!({
            "question": "q",
            "answer": "a",
            "category": "policy",
            "priority": null,
            "confidence": "n/a"
        })]);
        let entry = &batch.entries[0];
        assert_eq!(entry.priority, DEFAULT_PRIORITY);
        assert!(entry.tags.is_empty());
        assert_eq!(entry.confidence, None);
    }
}
