//! Argument tokens handed to the entry point.

/// Whitespace-separated tokens passed to the entry point as a string array.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvocationArgs {
    tokens: Vec<String>,
}

impl InvocationArgs {
    /// No arguments.
    #[must_use]
    pub const fn empty() -> Self {
        Self { tokens: Vec::new() }
    }

    /// Splits `text` on whitespace, dropping empty tokens.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        Self::from_tokens(text.split_whitespace())
    }

    /// Uses the given tokens unchanged.
    #[must_use]
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Tokens in order.
    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    /// Whether there are no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
