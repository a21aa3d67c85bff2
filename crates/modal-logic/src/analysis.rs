use serde::Serialize;

use crate::alethic::{self, AlethicStatus};
use crate::fallacy::{self, Fallacy};
use crate::lexicon::{self, *};
use crate::suggest::Suggestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeIndex {
    #[serde(rename = "t_-1")]
    Past,
    #[serde(rename = "t_0")]
    Present,
    #[serde(rename = "t_+1")]
    Future,
}

impl TimeIndex {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Past => "t_-1",
            Self::Present => "t_0",
            Self::Future => "t_+1",
        }
    }

    /// Parenthetical appended to rewritten sentences; present time gets none.
    pub fn marker(&self) -> Option<&'static str> {
        match self {
            Self::Past => Some(" (in the past)"),
            Self::Present => None,
            Self::Future => Some(" (in the future)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalCategory {
    Alethic,
    Epistemic,
    Deontic,
    Temporal,
}

impl ModalCategory {
    fn priority(&self) -> u8 {
        match self {
            Self::Alethic => 3,
            Self::Epistemic => 2,
            Self::Deontic | Self::Temporal => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalKind {
    Possibility,
    Necessity,
    Epistemic,
    Deontic,
    Temporal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Modality {
    #[serde(rename = "type")]
    pub kind: ModalKind,
    pub symbol: &'static str,
    pub strength: &'static str,
    pub category: ModalCategory,
}

impl Modality {
    fn of(kind: ModalKind) -> Self {
        let (symbol, strength, category) = match kind {
            ModalKind::Possibility => ("◇", "possible", ModalCategory::Alethic),
            ModalKind::Necessity => ("□", "necessary", ModalCategory::Alethic),
            ModalKind::Epistemic => ("K", "known", ModalCategory::Epistemic),
            ModalKind::Deontic => ("O", "obligatory", ModalCategory::Deontic),
            ModalKind::Temporal => ("F", "future", ModalCategory::Temporal),
        };
        Self {
            kind,
            symbol,
            strength,
            category,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantifierKind {
    Universal,
    Existential,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantifier {
    #[serde(rename = "type")]
    pub kind: QuantifierKind,
    pub symbol: &'static str,
    pub word: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectiveKind {
    Conjunction,
    Disjunction,
    Conditional,
    Biconditional,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Connective {
    #[serde(rename = "type")]
    pub kind: ConnectiveKind,
    pub symbol: &'static str,
    pub word: String,
}

/// A token picked out by position, used for negations and vague terms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MarkedToken {
    pub index: usize,
    pub word: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Complexity {
    #[serde(rename = "simple")]
    Simple,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "highly complex")]
    HighlyComplex,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubjectVerbObject {
    pub subject: Option<String>,
    pub verb: Option<String>,
    pub object: Option<String>,
}

/// Everything the filter learned about one sentence.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub tokens: Vec<String>,
    pub time_index: TimeIndex,
    pub modality: Option<Modality>,
    pub quantifiers: Vec<Quantifier>,
    pub connectives: Vec<Connective>,
    pub negations: Vec<MarkedToken>,
    pub vague_terms: Vec<MarkedToken>,
    pub logical_complexity: Complexity,
    pub fallacies: Vec<Fallacy>,
    pub subject_verb_object: SubjectVerbObject,
    pub propositions: Vec<String>,
    pub alethic_status: AlethicStatus,
    pub suggestions: Vec<Suggestion>,
}

impl Analysis {
    pub fn of(tokens: Vec<String>) -> Self {
        let modality = detect_modality(&tokens);
        let quantifiers = detect_quantifiers(&tokens);
        let connectives = detect_connectives(&tokens);
        let negations = mark(&tokens, NEGATIONS);
        let logical_complexity = assess_complexity(
            modality.is_some(),
            !quantifiers.is_empty(),
            !connectives.is_empty(),
            !negations.is_empty(),
        );

        Self {
            time_index: detect_time_index(&tokens),
            modality,
            quantifiers,
            connectives,
            negations,
            vague_terms: mark(&tokens, VAGUE_TERMS),
            logical_complexity,
            fallacies: fallacy::detect(&tokens.join(" ")),
            subject_verb_object: extract_subject_verb_object(&tokens),
            propositions: identify_propositions(&tokens),
            alethic_status: alethic::determine(&tokens),
            suggestions: Vec::new(),
            tokens,
        }
    }
}

/// Class of the first token that names a time; later tokens are ignored.
pub fn detect_time_index(tokens: &[String]) -> TimeIndex {
    for token in tokens {
        if lexicon::contains(TEMPORAL_PAST, token) || token.ends_with("ed") {
            return TimeIndex::Past;
        }
        if lexicon::contains(TEMPORAL_FUTURE, token) || token == "will" || token == "shall" {
            return TimeIndex::Future;
        }
        if lexicon::contains(TEMPORAL_PRESENT, token) {
            return TimeIndex::Present;
        }
    }
    TimeIndex::Present
}

/// Highest-priority modal hit; among equal priorities the earliest token wins.
pub fn detect_modality(tokens: &[String]) -> Option<Modality> {
    let classes = [
        (MODAL_POSSIBILITY, ModalKind::Possibility),
        (MODAL_NECESSITY, ModalKind::Necessity),
        (MODAL_EPISTEMIC, ModalKind::Epistemic),
        (MODAL_DEONTIC, ModalKind::Deontic),
        (MODAL_TEMPORAL, ModalKind::Temporal),
    ];

    let mut found: Vec<Modality> = tokens
        .iter()
        .flat_map(|token| {
            classes
                .iter()
                .filter(move |(set, _)| lexicon::contains(set, token))
                .map(|(_, kind)| Modality::of(*kind))
        })
        .collect();

    // stable: keeps token order inside a priority band
    found.sort_by(|a, b| b.category.priority().cmp(&a.category.priority()));
    found.into_iter().next()
}

pub fn detect_quantifiers(tokens: &[String]) -> Vec<Quantifier> {
    let mut quantifiers = Vec::new();
    for token in tokens {
        if lexicon::contains(QUANTIFIERS_ALL, token) {
            quantifiers.push(Quantifier {
                kind: QuantifierKind::Universal,
                symbol: "∀",
                word: token.clone(),
            });
        }
        if lexicon::contains(QUANTIFIERS_EXIST, token) {
            quantifiers.push(Quantifier {
                kind: QuantifierKind::Existential,
                symbol: "∃",
                word: token.clone(),
            });
        }
    }
    quantifiers
}

pub fn detect_connectives(tokens: &[String]) -> Vec<Connective> {
    let classes = [
        (CONJUNCTIONS, ConnectiveKind::Conjunction, "∧"),
        (DISJUNCTIONS, ConnectiveKind::Disjunction, "∨"),
        (CONDITIONALS, ConnectiveKind::Conditional, "→"),
        (BICONDITIONALS, ConnectiveKind::Biconditional, "↔"),
    ];

    let mut connectives = Vec::new();
    for token in tokens {
        for (set, kind, symbol) in &classes {
            if lexicon::contains(set, token) {
                connectives.push(Connective {
                    kind: *kind,
                    symbol: *symbol,
                    word: token.clone(),
                });
            }
        }
    }
    connectives
}

fn mark(tokens: &[String], set: &[&str]) -> Vec<MarkedToken> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, t)| lexicon::contains(set, t))
        .map(|(index, t)| MarkedToken {
            index,
            word: t.clone(),
        })
        .collect()
}

pub fn assess_complexity(
    has_modality: bool,
    has_quantifiers: bool,
    has_connectives: bool,
    has_negations: bool,
) -> Complexity {
    let score = if has_modality { 2 } else { 0 }
        + u8::from(has_quantifiers)
        + u8::from(has_connectives)
        + u8::from(has_negations);

    match score {
        4.. => Complexity::HighlyComplex,
        2..=3 => Complexity::Moderate,
        _ => Complexity::Simple,
    }
}

/// Crude pattern pass; later matches overwrite earlier ones.
pub fn extract_subject_verb_object(tokens: &[String]) -> SubjectVerbObject {
    let mut svo = SubjectVerbObject::default();

    for (i, token) in tokens.iter().enumerate() {
        if lexicon::contains(SUBJECT_PRONOUNS, token) {
            svo.subject = Some(token.clone());
        }

        let verb = match token.as_str() {
            "is" | "are" | "was" | "were" | "be" | "been" | "being" => Some("be".to_string()),
            "have" | "has" | "had" | "having" => Some("have".to_string()),
            "do" | "does" | "did" | "doing" => Some("do".to_string()),
            t if t.ends_with("ing") || t.ends_with("ed") => Some(t.to_string()),
            _ => None,
        };
        if verb.is_some() {
            svo.verb = verb;
        }

        if i > 0 && lexicon::contains(DETERMINERS, &tokens[i - 1]) {
            svo.object = Some(token.clone());
        }
    }

    svo
}

pub fn identify_propositions(tokens: &[String]) -> Vec<String> {
    let mut propositions = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for token in tokens {
        if lexicon::contains(PROPOSITION_BREAKS, token) {
            if !current.is_empty() {
                propositions.push(current.join(" "));
                current.clear();
            }
        } else {
            current.push(token);
        }
    }

    if !current.is_empty() {
        propositions.push(current.join(" "));
    }
    propositions
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(s: &str) -> Vec<String> {
        s.split_whitespace().map(String::from).collect()
    }

    #[test]
    fn time_index_uses_first_match() {
        assert_eq!(detect_time_index(&tokens("i might go tomorrow")), TimeIndex::Future);
        assert_eq!(detect_time_index(&tokens("today i will go")), TimeIndex::Present);
        assert_eq!(detect_time_index(&tokens("i go")), TimeIndex::Present);
    }

    #[test]
    fn ed_suffix_means_past() {
        assert_eq!(detect_time_index(&tokens("i walked home tomorrow")), TimeIndex::Past);
        // "need" ends in "ed" too
        assert_eq!(detect_time_index(&tokens("we need rain")), TimeIndex::Past);
    }

    #[test]
    fn alethic_outranks_epistemic_and_deontic() {
        let m = detect_modality(&tokens("you should probably maybe go")).unwrap();
        assert_eq!(m.kind, ModalKind::Possibility);
        assert_eq!(m.symbol, "◇");
    }

    #[test]
    fn deontic_and_temporal_tie_on_token_order() {
        let m = detect_modality(&tokens("it will and should")).unwrap();
        assert_eq!(m.kind, ModalKind::Temporal);
        let m = detect_modality(&tokens("it should and will")).unwrap();
        assert_eq!(m.kind, ModalKind::Deontic);
        assert!(detect_modality(&tokens("plain words")).is_none());
    }

    #[test]
    fn quantifiers_and_connectives_keep_words() {
        let q = detect_quantifiers(&tokens("all dogs have a tail"));
        assert_eq!(q.len(), 2);
        assert_eq!(q[0].symbol, "∀");
        assert_eq!(q[1].word, "a");

        let c = detect_connectives(&tokens("rain or shine and if"));
        let kinds: Vec<_> = c.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ConnectiveKind::Disjunction,
                ConnectiveKind::Conjunction,
                ConnectiveKind::Conditional
            ]
        );
    }

    #[test]
    fn complexity_thresholds() {
        assert_eq!(assess_complexity(false, false, false, false), Complexity::Simple);
        assert_eq!(assess_complexity(false, true, false, false), Complexity::Simple);
        assert_eq!(assess_complexity(true, false, false, false), Complexity::Moderate);
        assert_eq!(assess_complexity(false, true, true, true), Complexity::Moderate);
        assert_eq!(assess_complexity(true, true, true, false), Complexity::HighlyComplex);
    }

    #[test]
    fn svo_and_propositions() {
        let t = tokens("she was reading the book because it rained");
        let svo = extract_subject_verb_object(&t);
        assert_eq!(svo.subject.as_deref(), Some("it"));
        assert_eq!(svo.verb.as_deref(), Some("rained"));
        assert_eq!(svo.object.as_deref(), Some("book"));

        assert_eq!(
            identify_propositions(&t),
            vec!["she was reading the book", "it rained"]
        );
    }

    #[test]
    fn negations_and_vague_terms_carry_positions() {
        let a = Analysis::of(tokens("nothing is not something"));
        assert_eq!(
            a.negations,
            vec![
                MarkedToken { index: 0, word: "nothing".into() },
                MarkedToken { index: 2, word: "not".into() },
            ]
        );
        assert_eq!(a.vague_terms, vec![MarkedToken { index: 3, word: "something".into() }]);
    }
}
