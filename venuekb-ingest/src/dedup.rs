//! Similarity Deduplicator
//!
//! Bag-of-words Jaccard overlap between question texts, compared only within
//! the candidate's category. Near-duplicates phrased very differently are not
//! caught; that limitation is accepted.

use std::collections::HashSet;

use venuekb_core::{Category, KnowledgeEntry};

/// Lowercased whitespace-separated words as a set.
pub fn tokenize(text: &str) -> HashSet<String> {
    text.split_whitespace().map(|w| w.to_lowercase()).collect()
}

/// |A ∩ B| / |A ∪ B|; two empty sets score 0.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f64 / union as f64
}

pub fn question_similarity(a: &str, b: &str) -> f64 {
    jaccard(&tokenize(a), &tokenize(b))
}

/// First stored entry in `category` whose question overlap strictly exceeds `threshold`.
pub fn find_duplicate<'a>(
    question: &str,
    category: Category,
    existing: &'a [KnowledgeEntry],
    threshold: f64,
) -> Option<&'a KnowledgeEntry> {
    let candidate = tokenize(question);
    existing
        .iter()
        .filter(|e| e.category == category)
        .find(|e| jaccard(&candidate, &tokenize(&e.question)) > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use venuekb_core::KnowledgeSource;

    fn stored(question: &str, category: Category) -> KnowledgeEntry {
        KnowledgeEntry {
            id: Uuid::new_v4(),
            venue_id: Uuid::new_v4(),
            question: question.to_string(),
            answer: "answer".to_string(),
            category,
            priority: 5,
            tags: vec![],
            source: KnowledgeSource::Manual,
            confidence: None,
            needs_review: false,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    /// `shared` common words plus `extra` words only in the first question.
    fn overlap_pair(shared: usize, extra: usize) -> (String, String) {
        let common: Vec<String> = (0..shared).map(|i| format!("w{}", i)).collect();
        let mut first = common.clone();
        first.extend((0..extra).map(|i| format!("x{}", i)));
        (first.join(" "), common.join(" "))
    }

    #[test]
    fn test_empty_vs_empty_is_zero() {
        assert_eq!(question_similarity("", "   "), 0.0);
    }

    #[test]
    fn test_identical_questions_ignore_case_and_spacing() {
        assert_eq!(
            question_similarity("What is the COST of the base package?", "what is  the cost of the base package?"),
            1.0
        );
    }

    #[test]
    fn test_repeated_words_collapse() {
        // {the, barn} vs {the, barn}
        assert_eq!(question_similarity("the the barn", "barn the"), 1.0);
    }

    #[test]
    fn test_threshold_is_strict() {
        let (a, b) = overlap_pair(17, 3);
        assert_eq!(question_similarity(&a, &b), 0.85);
        let existing = vec![stored(&b, Category::Pricing)];
        assert!(find_duplicate(&a, Category::Pricing, &existing, 0.85).is_none());

        let (a, b) = overlap_pair(43, 7);
        assert_eq!(question_similarity(&a, &b), 0.86);
        let existing = vec![stored(&b, Category::Pricing)];
        assert!(find_duplicate(&a, Category::Pricing, &existing, 0.85).is_some());
    }

    #[test]
    fn test_other_categories_are_ignored() {
        let existing = vec![stored("What is the cost of the base package?", Category::Faq)];
        assert!(find_duplicate(
            "What is the cost of the base package?",
            Category::Pricing,
            &existing,
            0.85
        )
        .is_none());
    }

    #[test]
    fn test_short_circuits_on_first_match() {
        let existing = vec![
            stored("Is there parking on site?", Category::Capacity),
            stored("How many guests can the barn hold?", Category::Capacity),
            stored("how many guests can the barn hold?", Category::Capacity),
        ];
        let found = find_duplicate("How many guests can the barn hold?", Category::Capacity, &existing, 0.85)
            .unwrap();
        assert_eq!(found.id, existing[1].id);
    }

    #[test]
    fn test_paraphrase_is_not_caught() {
        // Accepted false negative of bag-of-words overlap
        let sim = question_similarity("What's the base package price?", "What is the cost of the base package?");
        assert!(sim < 0.85, "similarity was {}", sim);
    }
}
