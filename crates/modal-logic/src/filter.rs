use serde::Serialize;
use tracing::{debug, warn};

use crate::analysis::Analysis;
use crate::error::FilterError;
use crate::rewrite;
use crate::suggest;

/// Longest input the filter accepts.
pub const MAX_MESSAGE_CHARS: usize = 4000;

const RESTRUCTURED_NOTE: &str = "Message restructured for classical logic compliance";
const FAILURE_NOTE: &str = "Failed to process message for classical logic compliance";

/// Outcome of running a message through the filter. On failure `processed`
/// is the untouched input and `error` is set.
#[derive(Debug, Clone, Serialize)]
pub struct FilteredMessage {
    pub original: String,
    pub processed: String,
    pub analysis: Option<Analysis>,
    pub changes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FilteredMessage {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Run the full pipeline. Never fails: any error degrades to passing the
/// original text through.
pub fn process_message(original: &str) -> FilteredMessage {
    match try_process(original) {
        Ok((processed, analysis)) => {
            debug!(processed = %processed, "message filtered");
            let changes = if processed != original {
                vec![RESTRUCTURED_NOTE.to_string()]
            } else {
                Vec::new()
            };
            FilteredMessage {
                original: original.to_string(),
                processed,
                analysis: Some(analysis),
                changes,
                error: None,
            }
        }
        Err(e) => {
            warn!("Error processing message: {}", e);
            FilteredMessage {
                original: original.to_string(),
                processed: original.to_string(),
                analysis: None,
                changes: Vec::new(),
                error: Some(FAILURE_NOTE.to_string()),
            }
        }
    }
}

/// The pipeline proper: normalize, tokenize, analyse, suggest, rewrite,
/// annotate.
pub fn try_process(original: &str) -> Result<(String, Analysis), FilterError> {
    let len = original.chars().count();
    if len > MAX_MESSAGE_CHARS {
        return Err(FilterError::TooLong {
            len,
            max: MAX_MESSAGE_CHARS,
        });
    }

    let cleaned = rewrite::normalize(original);
    let tokens = rewrite::tokenize(&cleaned);
    // Nothing left to analyse (whitespace, or only stripped symbols). The
    // caller gets the input back untouched rather than a bare ".".
    if tokens.is_empty() {
        return Err(FilterError::Empty);
    }

    let mut analysis = Analysis::of(tokens);
    analysis.suggestions = suggest::generate(&analysis);

    let restructured = rewrite::restructure(&analysis)?;
    let processed = rewrite::add_logical_notation(restructured, &analysis);

    Ok((processed, analysis))
}
