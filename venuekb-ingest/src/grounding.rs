//! Anti-hallucination grounding check
//!
//! Every dollar amount, percentage and guest/people/car count in a generated
//! answer must appear verbatim in the source answers it was derived from. One
//! missing number rejects the whole entry. Matching is literal substring
//! containment: "$2,500" and "2500 dollars" are different claims.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimKind {
    Dollar,
    Percent,
    Count,
}

/// A numeric token found in generated text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NumericClaim {
    pub kind: ClaimKind,
    /// Text that must be present in the source
    pub literal: String,
}

impl fmt::Display for NumericClaim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

struct NumericPatterns {
    dollar: Regex,
    percent: Regex,
    // English-only phrasing
    count: Regex,
}

fn patterns() -> &'static NumericPatterns {
    static PATTERNS: OnceLock<NumericPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| NumericPatterns {
        dollar: Regex::new(r"\$[\d,]+").expect("dollar pattern is valid"),
        percent: Regex::new(r"\d+%").expect("percent pattern is valid"),
        count: Regex::new(r"(?i)(\d+)\s*(guests?|people|cars?)").expect("count pattern is valid"),
    })
}

/// All numeric claims in `text`, in order of kind then position.
pub fn numeric_claims(text: &str) -> Vec<NumericClaim> {
    let p = patterns();
    let mut claims = Vec::new();

    for m in p.dollar.find_iter(text) {
        // "$8,500," at the end of a clause: the comma is punctuation
        let literal = m.as_str().trim_end_matches(',');
        if literal.len() > 1 {
            claims.push(NumericClaim {
                kind: ClaimKind::Dollar,
                literal: literal.to_string(),
            });
        }
    }

    for m in p.percent.find_iter(text) {
        claims.push(NumericClaim {
            kind: ClaimKind::Percent,
            literal: m.as_str().to_string(),
        });
    }

    for caps in p.count.captures_iter(text) {
        if let Some(number) = caps.get(1) {
            claims.push(NumericClaim {
                kind: ClaimKind::Count,
                literal: number.as_str().to_string(),
            });
        }
    }

    claims
}

/// Claims in `answer` that do not literally appear in `source`.
pub fn ungrounded_claims(answer: &str, source: &str) -> Vec<NumericClaim> {
    numeric_claims(answer)
        .into_iter()
        .filter(|claim| !source.contains(&claim.literal))
        .collect()
}

pub fn is_grounded(answer: &str, source: &str) -> bool {
    ungrounded_claims(answer, source).is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_fabricated_dollar_amount() {
        let source = "deposit is $2,500";
        assert!(!is_grounded("A $3,000 deposit holds your date.", source));
        assert!(is_grounded("A $2,500 deposit holds your date.", source));
    }

    #[test]
    fn test_paraphrase_without_numbers_is_grounded() {
        let source = "We allow outside caterers as long as they are licensed and insured.";
        assert!(is_grounded(
            "Licensed, insured caterers from outside are welcome.",
            source
        ));
    }

    #[test]
    fn test_percentages_must_match() {
        let source = "A 20% service charge applies.";
        assert!(is_grounded("There is a 20% service charge.", source));
        let missing = ungrounded_claims("There is a 22% service charge.", source);
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].kind, ClaimKind::Percent);
        assert_eq!(missing[0].literal, "22%");
    }

    #[test]
    fn test_count_only_needs_the_number() {
        let source = "The barn holds 180 for dinner.";
        assert!(is_grounded("The barn seats 180 guests.", source));
        assert!(!is_grounded("The barn seats 200 people.", source));
        assert!(!is_grounded("Parking for 40 cars.", source));
    }

    #[test]
    fn test_count_word_is_case_insensitive() {
        let claims = numeric_claims("Up to 150 GUESTS and 1 Car");
        assert_eq!(
            claims,
            vec![
                NumericClaim { kind: ClaimKind::Count, literal: "150".to_string() },
                NumericClaim { kind: ClaimKind::Count, literal: "1".to_string() },
            ]
        );
    }

    #[test]
    fn test_semantic_equivalents_are_not_matched() {
        assert!(!is_grounded("The fee is $2500.", "The fee is $2,500."));
    }

    #[test]
    fn test_trailing_comma_is_not_part_of_amount() {
        let source = "Base package is $8,500 for 100 guests";
        assert!(is_grounded("It's $8,500, which covers 100 guests.", source));
    }

    #[test]
    fn test_bare_numbers_are_not_claims() {
        assert!(numeric_claims("We open at 10 and close at 11.").is_empty());
    }
}
