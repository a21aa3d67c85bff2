use thiserror::Error;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("message is empty after normalization")]
    Empty,

    #[error("message is {len} characters, limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("invalid replacement pattern: {0}")]
    Pattern(#[from] regex::Error),
}
