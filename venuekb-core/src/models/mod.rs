pub mod knowledge;
pub mod onboarding;
pub mod progress;

pub use knowledge::{
    Category, KnowledgeEntry, KnowledgeRow, KnowledgeSource, NewKnowledgeEntry, ReviewDecision,
};
pub use onboarding::OnboardingAnswer;
pub use progress::{Section, SectionState};
