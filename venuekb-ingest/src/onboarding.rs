//! Onboarding answers → generation prompt and grounding source

use venuekb_core::{Category, OnboardingAnswer};

/// Label used for onboarding runs in logs, reports and the review inbox
pub const PASS_LABEL: &str = "onboarding";

const RULES: &[&str] = &[
    "Use only the facts in the venue's answers below. Do not add prices, percentages, guest counts or policies that are not written there.",
    "Copy every number exactly as the venue wrote it, including the dollar sign and thousands separators.",
    "Write several natural questions a couple might ask for each answer when the answer covers more than one fact.",
    "Write answers in a warm, first-person plural voice (\"we\", \"our\").",
    "Return an empty array when the answers contain nothing a couple would ask about.",
];

/// Answers with non-blank text, in input order
pub fn usable_answers(answers: &[OnboardingAnswer]) -> Vec<&OnboardingAnswer> {
    answers
        .iter()
        .filter(|a| !a.answer.trim().is_empty())
        .collect()
}

/// Text generated answers are grounded against: every answer, one per line.
pub fn source_text(answers: &[&OnboardingAnswer]) -> String {
    answers
        .iter()
        .map(|a| a.answer.trim())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn build_prompt(answers: &[&OnboardingAnswer]) -> String {
    let mut prompt = String::from(
        "You are helping a wedding venue build the knowledge base for its website chatbot. \
         The venue's staff filled in an onboarding questionnaire. Turn their answers into \
         question/answer pairs.\n\nRules:\n",
    );
    for rule in RULES {
        prompt.push_str("- ");
        prompt.push_str(rule);
        prompt.push('\n');
    }

    let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
    prompt.push_str("\nAllowed categories: ");
    prompt.push_str(&names.join(", "));
    prompt.push_str("\n\nPriority: 8-10 for pricing, capacity and hard policies; 5-7 for amenities and logistics; 1-4 for nice-to-know details.\n");

    prompt.push_str("\nOnboarding answers:\n---\n");
    for answer in answers {
        if let Some(section) = answer.section {
            prompt.push_str(&format!("[{}] ", section.as_str()));
        }
        prompt.push_str(&format!("Q: {}\nA: {}\n\n", answer.question.trim(), answer.answer.trim()));
    }
    prompt.push_str("---\n");
    prompt
}
