//! Fixed word classes the filter scans tokens against.
//!
//! Multi-word entries ("going to", "at least one") never equal a single
//! token; they only matter to the substring heuristics in
//! [`crate::alethic`]. They are kept so the tables read as the vocabulary
//! they describe.

pub const MODAL_POSSIBILITY: &[&str] = &[
    "might",
    "may",
    "could",
    "possible",
    "possibly",
    "perhaps",
    "maybe",
    "conceivably",
    "potentially",
];
pub const MODAL_NECESSITY: &[&str] = &[
    "must",
    "necessarily",
    "definitely",
    "certainly",
    "inevitably",
    "unavoidably",
];
pub const MODAL_EPISTEMIC: &[&str] = &["probably", "likely", "unlikely", "doubtful", "sure", "certain"];
pub const MODAL_DEONTIC: &[&str] = &["should", "ought", "permitted", "forbidden", "allowed", "required"];
pub const MODAL_TEMPORAL: &[&str] = &["will", "shall", "going to", "about to", "eventually", "finally"];

pub const QUANTIFIERS_ALL: &[&str] = &["all", "every", "each", "any", "whatever"];
pub const QUANTIFIERS_EXIST: &[&str] = &["some", "a", "an", "there", "exists", "exist", "at least one"];

pub const TEMPORAL_PAST: &[&str] = &["yesterday", "ago", "last", "did", "was", "were", "had", "before"];
pub const TEMPORAL_FUTURE: &[&str] = &["tomorrow", "next", "soon", "will", "shall", "going to", "about to"];
pub const TEMPORAL_PRESENT: &[&str] = &["now", "currently", "at present", "today", "is", "are", "am"];

pub const CONJUNCTIONS: &[&str] = &["and", "but", "however", "moreover", "furthermore", "additionally"];
pub const DISJUNCTIONS: &[&str] = &["or", "either", "alternatively", "otherwise"];
pub const CONDITIONALS: &[&str] = &["if", "when", "provided that", "assuming", "given that"];
pub const BICONDITIONALS: &[&str] = &["if and only if", "iff", "exactly when", "precisely when"];

pub const NEGATIONS: &[&str] = &[
    "not", "no", "never", "none", "nothing", "nobody", "nowhere", "neither", "nor",
];

pub const VAGUE_TERMS: &[&str] = &[
    "thing",
    "stuff",
    "something",
    "anything",
    "everything",
    "somewhere",
    "anywhere",
    "somehow",
];

pub const SUBJECT_PRONOUNS: &[&str] = &["i", "you", "he", "she", "it", "we", "they"];
pub const DETERMINERS: &[&str] = &["the", "a", "an"];

/// Words that split a sentence into propositions.
pub const PROPOSITION_BREAKS: &[&str] = &["and", "but", "or", "if", "when", "because"];

/// Words padded with spaces when the sentence is rewritten.
pub const SPACED_CONNECTIVES: &[&str] = &["and", "or", "but", "if", "when", "because"];

pub fn contains(set: &[&str], token: &str) -> bool {
    set.iter().any(|w| *w == token)
}
