//! Textual deny-list applied before an expression is parsed.
//!
//! The check is a substring match on the lowercased text. It only catches
//! direct references; the restricted grammar underneath is what actually
//! keeps expressions away from the host.

use crate::error::{ExprError, Result};

/// Tokens that denote filesystem, process, import or reflection access.
pub const DENIED_TOKENS: &[&str] = &[
    "import", "os.", "sys.", "open(", "__", "eval(", "exec(", "compile(", "subprocess",
    "globals", "locals(", "getattr", "setattr", "lambda",
];

/// Static checks on the raw expression text.
#[derive(Debug, Clone)]
pub struct DenyList {
    tokens: Vec<String>,
    max_len: usize,
}

impl DenyList {
    pub fn new(extra: &[String], max_len: usize) -> Self {
        let mut tokens: Vec<String> = DENIED_TOKENS.iter().map(|t| (*t).to_string()).collect();
        tokens.extend(
            extra
                .iter()
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty()),
        );
        Self { tokens, max_len }
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Fails on the first forbidden token found, or when the text is too long.
    pub fn check(&self, expression: &str) -> Result<()> {
        if expression.len() > self.max_len {
            return Err(ExprError::TooLong {
                len: expression.len(),
                max: self.max_len,
            });
        }
        let lowered = expression.to_lowercase();
        match self.tokens.iter().find(|t| lowered.contains(t.as_str())) {
            Some(token) => Err(ExprError::Denied {
                token: token.clone(),
            }),
            None => Ok(()),
        }
    }
}
