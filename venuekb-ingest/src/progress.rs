//! Venue readiness score
//!
//! A pure function over per-section states. Weights are a table so they can
//! be audited; they sum to 100.

use std::collections::HashMap;

use serde::Serialize;
use venuekb_core::{KnowledgeEntry, Section, SectionState};

/// Section weights; sum is 100.
pub const SECTION_WEIGHTS: [(Section, u32); 8] = [
    (Section::VenueBasics, 15),
    (Section::Pricing, 20),
    (Section::Capacity, 10),
    (Section::Policies, 15),
    (Section::Amenities, 10),
    (Section::CeremonySpaces, 10),
    (Section::BrandVoice, 10),
    (Section::HumanHandoff, 10),
];

/// Share of a section's weight awarded while in progress
pub const IN_PROGRESS_SHARE: f64 = 0.3;

/// Active entries in a section's categories that mark it auto-complete
pub const AUTO_COMPLETE_MIN_ENTRIES: usize = 3;

pub const MAX_SCORE: f64 = 100.0;

pub fn weight(section: Section) -> u32 {
    SECTION_WEIGHTS
        .iter()
        .find(|(s, _)| *s == section)
        .map(|(_, w)| *w)
        .unwrap_or(0)
}

pub fn contribution(section: Section, state: SectionState) -> f64 {
    let w = weight(section) as f64;
    match state {
        SectionState::Complete | SectionState::AutoComplete => w,
        SectionState::InProgress => w * IN_PROGRESS_SHARE,
        SectionState::NotStarted => 0.0,
    }
}

/// Sections missing from `states` count as not started.
pub fn readiness_score(states: &HashMap<Section, SectionState>) -> f64 {
    let total: f64 = SECTION_WEIGHTS
        .iter()
        .map(|(section, _)| contribution(*section, states.get(section).copied().unwrap_or_default()))
        .sum();
    total.clamp(0.0, MAX_SCORE)
}

/// Combine explicit flags with what the knowledge base already covers.
///
/// A section not explicitly `complete` becomes `auto_complete` once the venue
/// has enough active entries in its categories.
pub fn derive_section_states(
    active: &[KnowledgeEntry],
    flags: &HashMap<Section, SectionState>,
) -> HashMap<Section, SectionState> {
    Section::ALL
        .iter()
        .map(|section| {
            let flag = flags.get(section).copied().unwrap_or_default();
            let covered = active
                .iter()
                .filter(|e| e.is_retrievable() && section.categories().contains(&e.category))
                .count();
            let state = match flag {
                SectionState::Complete => SectionState::Complete,
                _ if covered >= AUTO_COMPLETE_MIN_ENTRIES => SectionState::AutoComplete,
                other => other,
            };
            (*section, state)
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub score: f64,
    pub sections: HashMap<Section, SectionState>,
}

pub fn progress_report(
    active: &[KnowledgeEntry],
    flags: &HashMap<Section, SectionState>,
) -> ProgressReport {
    let sections = derive_section_states(active, flags);
    ProgressReport {
        score: readiness_score(&sections),
        sections,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;
    use venuekb_core::{Category, KnowledgeSource};

    fn active_entry(category: Category) -> KnowledgeEntry {
        KnowledgeEntry {
            id: Uuid::new_v4(),
            venue_id: Uuid::new_v4(),
            question: "q".to_string(),
            answer: "a".to_string(),
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

    #[test]
    fn test_weights_sum_to_100() {
        let total: u32 = SECTION_WEIGHTS.iter().map(|(_, w)| w).sum();
        assert_eq!(total, 100);
        for section in Section::ALL {
            assert!(weight(section) > 0, "{:?} has no weight", section);
        }
    }

    #[test]
    fn test_all_complete_is_100() {
        let states: HashMap<_, _> = Section::ALL
            .iter()
            .map(|s| (*s, SectionState::Complete))
            .collect();
        assert_eq!(readiness_score(&states), 100.0);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(readiness_score(&HashMap::new()), 0.0);
    }

    #[test]
    fn test_in_progress_awards_thirty_percent() {
        let states = HashMap::from([(Section::Pricing, SectionState::InProgress)]);
        assert!((readiness_score(&states) - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_auto_complete_equals_complete() {
        let a = HashMap::from([(Section::Policies, SectionState::AutoComplete)]);
        let b = HashMap::from([(Section::Policies, SectionState::Complete)]);
        assert_eq!(readiness_score(&a), readiness_score(&b));
    }

    #[test]
    fn test_enough_active_entries_auto_complete_a_section() {
        let active = vec![
            active_entry(Category::Pricing),
            active_entry(Category::PricingNuance),
            active_entry(Category::Pricing),
            active_entry(Category::Capacity),
        ];
        let flags = HashMap::from([(Section::Capacity, SectionState::InProgress)]);
        let states = derive_section_states(&active, &flags);
        assert_eq!(states[&Section::Pricing], SectionState::AutoComplete);
        assert_eq!(states[&Section::Capacity], SectionState::InProgress);
        assert_eq!(states[&Section::Amenities], SectionState::NotStarted);
    }

    #[test]
    fn test_explicit_complete_is_kept() {
        let active: Vec<KnowledgeEntry> = (0..5).map(|_| active_entry(Category::Policy)).collect();
        let flags = HashMap::from([(Section::Policies, SectionState::Complete)]);
        let states = derive_section_states(&active, &flags);
        assert_eq!(states[&Section::Policies], SectionState::Complete);
    }

    #[test]
    fn test_held_entries_do_not_count() {
        let mut held: Vec<KnowledgeEntry> = (0..3).map(|_| active_entry(Category::Amenities)).collect();
        for e in &mut held {
            e.needs_review = true;
            e.is_active = false;
        }
        let report = progress_report(&held, &HashMap::new());
        assert_eq!(report.sections[&Section::Amenities], SectionState::NotStarted);
        assert_eq!(report.score, 0.0);
    }
}
