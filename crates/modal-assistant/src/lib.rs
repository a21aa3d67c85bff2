//! Rule-based study assistant for the calculator suite.

pub mod arithmetic;
pub mod assistant;
pub mod knowledge;

pub use assistant::{
    Assistant, AssistantResponse, HistoryEntry, QueryKind, answer, classify,
    contextual_suggestions, explain_world,
};
