use std::sync::LazyLock;

use regex::{NoExpand, Regex};

use crate::analysis::{Analysis, Complexity};
use crate::error::FilterError;
use crate::suggest::Suggestion;

static NON_TEXT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^A-Za-z0-9_\s.,!?;:()]").expect("Invalid regex: non-text characters")
});
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace run"));
static ANALYSIS_PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,!?;:]").expect("Invalid regex: punctuation"));
static SPACED_CONNECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(and|or|but|if|when|because)\b").expect("Invalid regex: connectives")
});

/// Drop everything but word characters, whitespace and basic punctuation,
/// then collapse whitespace.
pub fn normalize(message: &str) -> String {
    let stripped = NON_TEXT.replace_all(message, "");
    WHITESPACE.replace_all(&stripped, " ").trim().to_string()
}

pub fn tokenize(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    ANALYSIS_PUNCTUATION
        .replace_all(&lower, "")
        .split_whitespace()
        .map(String::from)
        .collect()
}

/// Re-render the analysed tokens: vague words replaced, sentence shape
/// fixed, then time and modal parentheticals appended.
pub fn restructure(analysis: &Analysis) -> Result<String, FilterError> {
    let mut restructured = analysis.tokens.join(" ");

    for suggestion in &analysis.suggestions {
        if let Suggestion::VagueTerm {
            original,
            suggestions,
        } = suggestion
        {
            let Some(replacement) = suggestions.first() else {
                continue;
            };
            let word = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(original)))?;
            restructured = word
                .replace_all(&restructured, NoExpand(replacement))
                .into_owned();
        }
    }

    let mut restructured = ensure_logical_structure(&restructured);

    if let Some(marker) = analysis.time_index.marker() {
        restructured.push_str(marker);
    }
    if let Some(marker) = analysis.alethic_status.marker() {
        restructured.push_str(marker);
    }

    Ok(restructured)
}

/// Terminal punctuation, leading capital, spaced connectives.
///
/// Connectives are re-inserted in lowercase after capitalisation, so a
/// sentence opening with "if" keeps a lowercase first letter.
pub fn ensure_logical_structure(message: &str) -> String {
    let mut structured = message.to_string();

    if !(structured.ends_with('.') || structured.ends_with('!') || structured.ends_with('?')) {
        structured.push('.');
    }

    let mut chars = structured.chars();
    if let Some(first) = chars.next() {
        structured = first.to_uppercase().chain(chars).collect();
    }

    let spaced = SPACED_CONNECTIVE.replace_all(&structured, |caps: &regex::Captures| {
        format!(" {} ", caps[0].to_lowercase())
    });

    WHITESPACE.replace_all(&spaced, " ").trim().to_string()
}

/// Whether the notation block is appended.
pub fn needs_notation(analysis: &Analysis) -> bool {
    analysis.logical_complexity == Complexity::HighlyComplex || analysis.connectives.len() > 1
}

/// `∀∃ ◇ (t_+1)`: quantifier symbols, the alethic symbol (or the modality's
/// when the status has none), then the time index.
pub fn logical_notation(analysis: &Analysis) -> String {
    let mut parts: Vec<String> = Vec::new();

    if !analysis.quantifiers.is_empty() {
        parts.push(analysis.quantifiers.iter().map(|q| q.symbol).collect());
    }

    let alethic = analysis.alethic_status.symbol();
    if !alethic.is_empty() {
        parts.push(alethic.to_string());
    } else if let Some(modality) = &analysis.modality {
        parts.push(modality.symbol.to_string());
    }

    parts.push(format!("({})", analysis.time_index.as_str()));
    parts.join(" ")
}

pub fn add_logical_notation(message: String, analysis: &Analysis) -> String {
    if needs_notation(analysis) {
        format!("{}\n\n[Logical notation: {}]", message, logical_notation(analysis))
    } else {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_symbols_and_spaces() {
        assert_eq!(normalize("  Hello,   world! #@$ (ok)  "), "Hello, world! (ok)");
        assert_eq!(normalize("naïve"), "nave");
    }

    #[test]
    fn tokenize_drops_punctuation_but_keeps_parentheses() {
        assert_eq!(
            tokenize("Yes, it IS (probably) true!"),
            vec!["yes", "it", "is", "(probably)", "true"]
        );
    }

    #[test]
    fn structure_capitalises_and_terminates() {
        assert_eq!(ensure_logical_structure("the cat sat"), "The cat sat.");
        assert_eq!(ensure_logical_structure("really?"), "Really?");
    }

    #[test]
    fn leading_connective_is_lowercased_again() {
        assert_eq!(ensure_logical_structure("if it rains"), "if it rains.");
        assert_eq!(ensure_logical_structure("cats and dogs"), "Cats and dogs.");
    }

    #[test]
    fn notation_prefers_alethic_symbol() {
        let analysis = Analysis::of(tokenize("all men must die and some are not brave"));
        assert_eq!(analysis.logical_complexity, Complexity::HighlyComplex);
        assert_eq!(logical_notation(&analysis), "∀∃ □ (t_0)");
    }

    #[test]
    fn notation_falls_back_to_modality_symbol() {
        let analysis = Analysis::of(tokenize("you should go or stay and rest"));
        assert_eq!(analysis.alethic_status.symbol(), "");
        assert_eq!(logical_notation(&analysis), "O (t_0)");
        assert!(needs_notation(&analysis));
    }
}
