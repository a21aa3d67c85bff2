//! Alethic status: the second, independent modality heuristic.
//!
//! Unlike [`crate::analysis::Modality`], which ranks keyword hits, this looks
//! for substrings in the joined sentence. The two can disagree ("i wonder if
//! i must go" has necessity modality but possible status).

use serde::Serialize;

use crate::lexicon::{self, MODAL_NECESSITY, MODAL_POSSIBILITY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(into = "AlethicReading")]
pub enum AlethicStatus {
    Necessary,
    Possible,
    Contingent,
    Conditional,
    Factual,
}

/// Wire form of an [`AlethicStatus`].
#[derive(Debug, Clone, Serialize)]
pub struct AlethicReading {
    pub status: &'static str,
    pub symbol: &'static str,
    pub explanation: &'static str,
}

impl From<AlethicStatus> for AlethicReading {
    fn from(status: AlethicStatus) -> Self {
        Self {
            status: status.as_str(),
            symbol: status.symbol(),
            explanation: status.explanation(),
        }
    }
}

impl AlethicStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Necessary => "necessary",
            Self::Possible => "possible",
            Self::Contingent => "contingent",
            Self::Conditional => "conditional",
            Self::Factual => "factual",
        }
    }

    /// Empty for factual statements.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Necessary => "□",
            Self::Possible | Self::Contingent => "◇",
            Self::Conditional => "→",
            Self::Factual => "",
        }
    }

    pub fn explanation(&self) -> &'static str {
        match self {
            Self::Necessary => "Logically necessary statement",
            Self::Possible => "Contingent or possible statement",
            Self::Contingent => "Future contingent statement",
            Self::Conditional => "Conditional statement",
            Self::Factual => "Factual statement about actual world",
        }
    }

    /// Parenthetical appended to the rewritten sentence.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            Self::Necessary => Some(" (necessarily)"),
            Self::Possible => Some(" (possibly)"),
            Self::Contingent => Some(" (contingently)"),
            Self::Conditional => Some(" (conditionally)"),
            Self::Factual => None,
        }
    }
}

pub fn determine(tokens: &[String]) -> AlethicStatus {
    let message = tokens.join(" ").to_lowercase();
    let has = |needles: &[&str]| needles.iter().any(|n| message.contains(n));

    let has_possibility = tokens.iter().any(|t| lexicon::contains(MODAL_POSSIBILITY, t));
    let has_necessity = tokens.iter().any(|t| lexicon::contains(MODAL_NECESSITY, t));
    let has_uncertainty = has(&["not sure", "unsure", "uncertain"]);
    let has_doubt = has(&["doubt", "question", "wonder"]);

    let has_personal_choice = has(&["i will", "i am going to", "i plan to"]);
    let has_future_action = has(&["tomorrow", "will", "going to"]);
    let has_conditional = has(&["if", "when", "provided"]);
    let has_personal_preference = has(&["like", "prefer", "want"]);

    if has_necessity && !has_uncertainty && !has_doubt {
        AlethicStatus::Necessary
    } else if has_possibility
        || has_uncertainty
        || has_doubt
        || has_personal_choice
        || has_personal_preference
    {
        AlethicStatus::Possible
    } else if has_future_action && !has_necessity {
        AlethicStatus::Contingent
    } else if has_conditional {
        AlethicStatus::Conditional
    } else {
        AlethicStatus::Factual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(sentence: &str) -> AlethicStatus {
        let tokens: Vec<String> = sentence.split_whitespace().map(String::from).collect();
        determine(&tokens)
    }

    #[test]
    fn necessity_wins_unless_doubted() {
        assert_eq!(status("it must rain"), AlethicStatus::Necessary);
        assert_eq!(status("i doubt it must rain"), AlethicStatus::Possible);
    }

    #[test]
    fn personal_choice_is_possible_not_contingent() {
        assert_eq!(status("i will go"), AlethicStatus::Possible);
        assert_eq!(status("she will go"), AlethicStatus::Contingent);
    }

    #[test]
    fn conditional_and_factual() {
        assert_eq!(status("if it rains the grass gets wet"), AlethicStatus::Conditional);
        assert_eq!(status("the sky is blue"), AlethicStatus::Factual);
    }

    #[test]
    fn substring_tests_are_not_word_tests() {
        // "different" contains "if"
        assert_eq!(status("they are different"), AlethicStatus::Conditional);
    }

    #[test]
    fn can_disagree_with_keyword_modality() {
        let tokens: Vec<String> = "i wonder if i must go"
            .split_whitespace()
            .map(String::from)
            .collect();
        let modality = crate::analysis::detect_modality(&tokens).unwrap();
        assert_eq!(modality.kind, crate::analysis::ModalKind::Necessity);
        assert_eq!(determine(&tokens), AlethicStatus::Possible);
    }

    #[test]
    fn factual_has_no_symbol_or_marker() {
        assert_eq!(AlethicStatus::Factual.symbol(), "");
        assert!(AlethicStatus::Factual.marker().is_none());
        assert_eq!(AlethicStatus::Contingent.symbol(), "◇");
    }
}
