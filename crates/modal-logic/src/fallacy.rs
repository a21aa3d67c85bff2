use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// Informal fallacies flagged by surface patterns. These are heuristics over
/// the joined token string, not argument analysis: "small" trips the hasty
/// generalization pattern because it contains "all".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Fallacy {
    #[serde(rename = "begging the question")]
    BeggingTheQuestion,
    #[serde(rename = "ad hominem")]
    AdHominem,
    #[serde(rename = "false dilemma")]
    FalseDilemma,
    #[serde(rename = "hasty generalization")]
    HastyGeneralization,
}

static PATTERNS: LazyLock<Vec<(Fallacy, Regex)>> = LazyLock::new(|| {
    vec![
        (
            Fallacy::BeggingTheQuestion,
            Regex::new(r"(?i)assume|assumption|obviously|clearly|of course")
                .expect("Invalid regex: begging the question"),
        ),
        (
            Fallacy::AdHominem,
            Regex::new(r"(?i)you are|you're|your|you don't|you can't")
                .expect("Invalid regex: ad hominem"),
        ),
        (
            Fallacy::FalseDilemma,
            Regex::new(r"(?i)either.*or|only.*or|must be|has to be")
                .expect("Invalid regex: false dilemma"),
        ),
        (
            Fallacy::HastyGeneralization,
            Regex::new(r"(?i)all|every|always|never|none|no one")
                .expect("Invalid regex: hasty generalization"),
        ),
    ]
});

impl Fallacy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::BeggingTheQuestion => "begging the question",
            Self::AdHominem => "ad hominem",
            Self::FalseDilemma => "false dilemma",
            Self::HastyGeneralization => "hasty generalization",
        }
    }

    pub fn correction(&self) -> &'static str {
        match self {
            Self::BeggingTheQuestion => {
                "Provide evidence or reasoning instead of assuming the conclusion"
            }
            Self::AdHominem => "Focus on the argument rather than the person making it",
            Self::FalseDilemma => "Consider additional options beyond the presented choices",
            Self::HastyGeneralization => "Provide more evidence or qualify the statement",
        }
    }
}

/// Every fallacy whose pattern matches `sentence`, in declaration order.
pub fn detect(sentence: &str) -> Vec<Fallacy> {
    PATTERNS
        .iter()
        .filter(|(_, pattern)| pattern.is_match(sentence))
        .map(|(fallacy, _)| *fallacy)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patterns_fire_in_declaration_order() {
        let found = detect("obviously you are always wrong");
        assert_eq!(
            found,
            vec![
                Fallacy::BeggingTheQuestion,
                Fallacy::AdHominem,
                Fallacy::HastyGeneralization
            ]
        );
    }

    #[test]
    fn substring_matches_count() {
        assert_eq!(detect("a small cat"), vec![Fallacy::HastyGeneralization]);
        assert!(detect("the cat sat").is_empty());
    }

    #[test]
    fn false_dilemma_spans_words() {
        assert!(detect("either we go or we stay").contains(&Fallacy::FalseDilemma));
    }
}
