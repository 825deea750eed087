//! Confidence Gate: decides whether a new entry is live or held for review

use serde::Serialize;

/// Activation flags assigned at creation time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Activation {
    pub needs_review: bool,
    pub is_active: bool,
}

impl Activation {
    pub const ACTIVE: Activation = Activation {
        needs_review: false,
        is_active: true,
    };

    pub const HELD: Activation = Activation {
        needs_review: true,
        is_active: false,
    };
}

/// Entries without a confidence score (manual, onboarding) always pass.
pub fn gate(confidence: Option<f64>, threshold: f64) -> Activation {
    match confidence {
        Some(c) if c < threshold => Activation::HELD,
        _ => Activation::ACTIVE,
    }
}
