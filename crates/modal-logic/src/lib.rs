//! Classical logic filter.
//!
//! A rule-based pass over a sentence: fixed word classes and a handful of
//! regexes tag modal operators, quantifiers, connectives, negations, vague
//! terms and surface-level fallacies, then the sentence is re-rendered with
//! parenthetical annotations and, for complex input, a logical notation
//! block. There is no grammar and no parser; every detector is a linear scan.

pub mod alethic;
pub mod analysis;
pub mod error;
pub mod fallacy;
pub mod filter;
pub mod lexicon;
pub mod rewrite;
pub mod suggest;

pub use alethic::AlethicStatus;
pub use analysis::{Analysis, TimeIndex};
pub use error::FilterError;
pub use filter::{FilteredMessage, MAX_MESSAGE_CHARS, process_message};
