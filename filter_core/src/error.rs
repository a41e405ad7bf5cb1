use thiserror::Error;

/// What exactly is wrong with a pattern handed to [`crate::pattern::unpack`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MalformedPatternKind {
    #[error("pattern must be wrapped in '%' delimiters")]
    MissingDelimiter,
    #[error("reserved character {0:?} is not escaped")]
    UnescapedReserved(char),
    #[error("backslash escapes non-reserved character {0:?}")]
    InvalidEscape(char),
    #[error("pattern ends with a lone backslash")]
    DanglingEscape,
}

/// A `LIKE` pattern that was not produced by [`crate::pattern::pack`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed pattern {pattern:?} at position {position}: {kind}")]
pub struct MalformedPatternError {
    pub pattern: String,
    /// Character offset into `pattern`, delimiters included.
    pub position: usize,
    pub kind: MalformedPatternKind,
}
