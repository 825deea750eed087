use serde::{Deserialize, Serialize};

use super::progress::Section;

/// One structured onboarding answer typed by venue staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingAnswer {
    #[serde(default)]
    pub section: Option<Section>,
    pub question: String,
    pub answer: String,
}
