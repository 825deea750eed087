//! Pass Prompt Registry
//!
//! Six fixed extraction passes, each a static prompt definition: analyst
//! persona, extraction rules, target categories and priority guidance. The
//! registry is built once and never mutated; lookups by name reject anything
//! outside the fixed set.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use venuekb_core::Category;

use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PassName {
    Pricing,
    Capacity,
    Policies,
    Amenities,
    BrandVoice,
    Handoff,
}

impl PassName {
    /// Execution order for a full transcript run
    pub const ALL: [PassName; 6] = [
        PassName::Pricing,
        PassName::Capacity,
        PassName::Policies,
        PassName::Amenities,
        PassName::BrandVoice,
        PassName::Handoff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PassName::Pricing => "pricing",
            PassName::Capacity => "capacity",
            PassName::Policies => "policies",
            PassName::Amenities => "amenities",
            PassName::BrandVoice => "brand_voice",
            PassName::Handoff => "handoff",
        }
    }
}

impl fmt::Display for PassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PassName {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PassName::ALL
            .iter()
            .copied()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| IngestError::UnknownPass(s.to_string()))
    }
}

/// Static prompt definition for one pass
#[derive(Debug, Clone)]
pub struct PassSpec {
    pub name: PassName,
    pub persona: &'static str,
    pub rules: &'static [&'static str],
    pub categories: &'static [Category],
    /// (kind of fact, suggested priority 1-10)
    pub priority_guidance: &'static [(&'static str, u8)],
}

impl PassSpec {
    /// Concatenate the prompt definition with one transcript chunk.
    pub fn build_prompt(&self, chunk: &str) -> String {
        let mut prompt = String::with_capacity(chunk.len() + 2048);
        prompt.push_str(self.persona);
        prompt.push_str("\n\nYou are reading part of a sales conversation between a wedding venue and a prospective couple. ");
        prompt.push_str("Extract question/answer pairs a future couple might ask the venue's chatbot.\n\nRules:\n");
        for rule in self.rules.iter().chain(COMMON_RULES) {
            prompt.push_str("- ");
            prompt.push_str(rule);
            prompt.push('\n');
        }

        prompt.push_str("\nAllowed categories: ");
        let names: Vec<&str> = self.categories.iter().map(|c| c.as_str()).collect();
        prompt.push_str(&names.join(", "));

        prompt.push_str("\n\nPriority guidance (1 = trivia, 10 = critical):\n");
        for (kind, priority) in self.priority_guidance {
            prompt.push_str(&format!("- {}: {}\n", kind, priority));
        }

        prompt.push_str("\nConfidence: 0.9+ when the venue states the fact outright, 0.6-0.8 when it is implied or partially stated, below 0.6 when you are inferring.\n");
        prompt.push_str("\nTranscript:\n---\n");
        prompt.push_str(chunk);
        prompt.push_str("\n---\n");
        prompt
    }
}

const COMMON_RULES: &[&str] = &[
    "Only use facts stated by the venue side of the conversation; never invent numbers, dates or names.",
    "Write the question the way a couple would ask it, and the answer in the venue's voice.",
    "Skip small talk and anything specific to this one couple's private details.",
    "Return an empty array when the transcript has nothing relevant to this pass.",
];

/// Immutable pass name -> prompt definition map
#[derive(Debug, Clone)]
pub struct PassRegistry {
    passes: BTreeMap<PassName, PassSpec>,
}

impl Default for PassRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PassRegistry {
    pub fn builtin() -> Self {
        let passes = builtin_specs()
            .into_iter()
            .map(|spec| (spec.name, spec))
            .collect();
        Self { passes }
    }

    /// Validate `name` and return its prompt definition.
    pub fn get(&self, name: &str) -> Result<&PassSpec, IngestError> {
        let pass = name.parse::<PassName>()?;
        self.spec(pass)
            .ok_or_else(|| IngestError::UnknownPass(name.to_string()))
    }

    pub fn spec(&self, pass: PassName) -> Option<&PassSpec> {
        self.passes.get(&pass)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PassSpec> {
        PassName::ALL.iter().filter_map(move |p| self.passes.get(p))
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }
}

fn builtin_specs() -> Vec<PassSpec> {
    vec![
        PassSpec {
            name: PassName::Pricing,
            persona: "You are a venue pricing analyst who turns sales calls into precise, auditable pricing FAQs.",
            rules: &[
                "Capture base package prices, per-person costs, minimums, deposits, payment schedules, fees and taxes exactly as quoted.",
                "Capture what is included in each package and what costs extra.",
                "Use pricing_nuance for seasonal, day-of-week, or guest-count dependent pricing and for discounts.",
                "Keep dollar amounts and percentages verbatim.",
            ],
            categories: &[Category::Pricing, Category::PricingNuance, Category::Faq],
            priority_guidance: &[
                ("base package price or site fee", 10),
                ("deposit and payment schedule", 9),
                ("seasonal or weekday pricing", 8),
                ("add-on and service fees", 7),
                ("discounts and promotions", 6),
            ],
        },
        PassSpec {
            name: PassName::Capacity,
            persona: "You are an event operations analyst who documents spaces, layouts and guest limits.",
            rules: &[
                "Capture seated and standing guest limits for every space mentioned.",
                "Capture ceremony site capacities, rain plans and indoor/outdoor options.",
                "Capture parking counts and shuttle arrangements.",
                "Capture on-site lodging (rooms, suites, guest count) under lodging.",
            ],
            categories: &[
                Category::Capacity,
                Category::CeremonySpaces,
                Category::Lodging,
                Category::LocationDirections,
            ],
            priority_guidance: &[
                ("maximum guest count", 10),
                ("ceremony space capacity and rain plan", 8),
                ("lodging capacity", 7),
                ("parking and directions", 5),
            ],
        },
        PassSpec {
            name: PassName::Policies,
            persona: "You are a contracts analyst who extracts venue rules and obligations couples must know before booking.",
            rules: &[
                "Capture cancellation, rescheduling and refund terms.",
                "Capture vendor rules: outside catering, preferred vendor lists, insurance requirements.",
                "Capture alcohol, noise curfew, decoration, candle, confetti and pet policies.",
                "Capture setup and teardown timing and access hours.",
            ],
            categories: &[Category::Policy, Category::Faq],
            priority_guidance: &[
                ("cancellation and refund terms", 10),
                ("vendor and catering restrictions", 9),
                ("alcohol and curfew rules", 8),
                ("decoration restrictions", 6),
                ("access and setup times", 5),
            ],
        },
        PassSpec {
            name: PassName::Amenities,
            persona: "You are a venue tour guide who knows every room, rental item and included service.",
            rules: &[
                "Capture included rentals (tables, chairs, linens), bridal suites, getting-ready rooms and restrooms.",
                "Capture audio/visual equipment, lighting, dance floor and climate control.",
                "Capture accessibility features.",
                "Describe ceremony locations under ceremony_spaces.",
            ],
            categories: &[
                Category::Amenities,
                Category::CeremonySpaces,
                Category::Lodging,
                Category::Faq,
            ],
            priority_guidance: &[
                ("included rentals and furniture", 8),
                ("getting-ready suites", 7),
                ("ceremony locations", 7),
                ("accessibility", 6),
                ("equipment and decor items", 5),
            ],
        },
        PassSpec {
            name: PassName::BrandVoice,
            persona: "You are a brand strategist capturing how this venue's salespeople talk and persuade.",
            rules: &[
                "Capture signature phrases, the tone (formal, playful, rustic) and what the venue emphasises as unique.",
                "Capture how the venue responds to objections about price, date availability or distance under objection_handling.",
                "Phrase the question as the situation (e.g. 'How should we describe the venue?') and the answer as guidance in the venue's voice.",
            ],
            categories: &[Category::BrandVoice, Category::ObjectionHandling],
            priority_guidance: &[
                ("price objection responses", 9),
                ("unique selling points", 8),
                ("tone and signature phrases", 6),
            ],
        },
        PassSpec {
            name: PassName::Handoff,
            persona: "You are a sales operations analyst who maps when a chatbot must hand a couple to a human.",
            rules: &[
                "Capture the booking process: tours, holds, contracts, coordinator introductions.",
                "Capture topics the venue insists on discussing personally (custom quotes, date holds, contract changes) under human_handoff.",
                "Capture how and when to reach the sales team (phone, email, tour scheduling).",
            ],
            categories: &[Category::HumanHandoff, Category::SalesWorkflow],
            priority_guidance: &[
                ("situations requiring a human", 10),
                ("booking and hold process", 8),
                ("contact methods and hours", 7),
            ],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_has_all_six_passes() {
        let registry = PassRegistry::builtin();
        assert_eq!(registry.len(), 6);
        let names: Vec<&str> = registry.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["pricing", "capacity", "policies", "amenities", "brand_voice", "handoff"]
        );
    }

    #[test]
    fn test_unknown_pass_is_validation_error() {
        let registry = PassRegistry::builtin();
        let err = registry.get("weather").unwrap_err();
        assert!(err.is_validation());
        assert!(matches!(err, IngestError::UnknownPass(ref n) if n == "weather"));
    }

    #[test]
    fn test_lookup_is_exact() {
        let registry = PassRegistry::builtin();
        assert!(registry.get("Pricing").is_err());
        assert!(registry.get("brand-voice").is_err());
        assert_eq!(registry.get("brand_voice").unwrap().name, PassName::BrandVoice);
    }

    #[test]
    fn test_prompt_contains_rules_categories_and_chunk() {
        let registry = PassRegistry::builtin();
        let spec = registry.get("pricing").unwrap();
        let prompt = spec.build_prompt("Venue: Our base package is $8,500.");

        assert!(prompt.starts_with(spec.persona));
        assert!(prompt.contains("pricing_nuance"));
        assert!(prompt.contains("deposit and payment schedule: 9"));
        assert!(prompt.contains("never invent numbers"));
        assert!(prompt.ends_with("Venue: Our base package is $8,500.\n---\n"));
    }

    #[test]
    fn test_every_pass_targets_at_least_one_category() {
        for spec in PassRegistry::builtin().iter() {
            assert!(!spec.categories.is_empty(), "{} has no categories", spec.name);
            assert!(!spec.rules.is_empty(), "{} has no rules", spec.name);
            for (_, priority) in spec.priority_guidance {
                assert!((1..=10).contains(priority));
            }
        }
    }
}
