use serde::{Deserialize, Serialize};

use super::knowledge::Category;

/// Onboarding sections tracked for venue readiness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    VenueBasics,
    Pricing,
    Capacity,
    Policies,
    Amenities,
    CeremonySpaces,
    BrandVoice,
    HumanHandoff,
}

impl Section {
    pub const ALL: [Section; 8] = [
        Section::VenueBasics,
        Section::Pricing,
        Section::Capacity,
        Section::Policies,
        Section::Amenities,
        Section::CeremonySpaces,
        Section::BrandVoice,
        Section::HumanHandoff,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::VenueBasics => "venue_basics",
            Section::Pricing => "pricing",
            Section::Capacity => "capacity",
            Section::Policies => "policies",
            Section::Amenities => "amenities",
            Section::CeremonySpaces => "ceremony_spaces",
            Section::BrandVoice => "brand_voice",
            Section::HumanHandoff => "human_handoff",
        }
    }

    /// Knowledge categories whose active entries count toward this section
    pub fn categories(&self) -> &'static [Category] {
        match self {
            Section::VenueBasics => &[Category::Faq, Category::LocationDirections, Category::Lodging],
            Section::Pricing => &[Category::Pricing, Category::PricingNuance],
            Section::Capacity => &[Category::Capacity],
            Section::Policies => &[Category::Policy],
            Section::Amenities => &[Category::Amenities],
            Section::CeremonySpaces => &[Category::CeremonySpaces],
            Section::BrandVoice => &[Category::BrandVoice, Category::ObjectionHandling],
            Section::HumanHandoff => &[Category::HumanHandoff, Category::SalesWorkflow],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionState {
    #[default]
    NotStarted,
    InProgress,
    Complete,
    AutoComplete,
}
