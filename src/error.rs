//! Router error types.

/// Errors returned by the forwarding and routing engines.
///
/// Every variant is a caller error: the operation that returned it left
/// the router state untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    #[error("invalid prefix length: {0} (expected 0..=32)")]
    InvalidPrefixLength(u8),

    #[error("interface {index} out of range: router has {num_nics} interfaces")]
    InterfaceOutOfRange { index: usize, num_nics: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("router service is not running")]
    ServiceStopped,
}

impl RouterError {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        RouterError::Parse {
            line,
            reason: reason.into(),
        }
    }

    /// Attaches an input line number to a parse error.
    pub(crate) fn at_line(self, line: usize) -> Self {
        match self {
            RouterError::Parse { reason, .. } => RouterError::Parse { line, reason },
            other => other,
        }
    }

    /// Parse errors are recoverable by skipping the offending input line.
    pub fn is_parse_error(&self) -> bool {
        matches!(self, RouterError::Parse { .. })
    }
}
