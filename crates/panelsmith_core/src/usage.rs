//! Token accounting.

use serde::{Deserialize, Serialize};

/// Tokens consumed by one or more model calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    /// Prompt tokens
    pub prompt: u64,
    /// Completion tokens
    pub completion: u64,
    /// Total tokens
    pub total: u64,
}

impl TokenUsage {
    /// Usage with an explicit total.
    pub fn new(prompt: u64, completion: u64, total: u64) -> Self {
        Self {
            prompt,
            completion,
            total,
        }
    }

    /// Sum two optional usages.
    ///
    /// `None` only when neither side reported usage.
    ///
    /// # Examples
    ///
    /// ```
    /// use panelsmith_core::TokenUsage;
    ///
    /// let a = Some(TokenUsage::new(10, 5, 15));
    /// let b = Some(TokenUsage::new(7, 5, 12));
    /// assert_eq!(TokenUsage::merge(a, b), Some(TokenUsage::new(17, 10, 27)));
    /// assert_eq!(TokenUsage::merge(a, None), a);
    /// assert_eq!(TokenUsage::merge(None, None), None);
    /// ```
    pub fn merge(a: Option<TokenUsage>, b: Option<TokenUsage>) -> Option<TokenUsage> {
        match (a, b) {
            (None, None) => None,
            (a, b) => {
                let a = a.unwrap_or_default();
                let b = b.unwrap_or_default();
                Some(TokenUsage {
                    prompt: a.prompt + b.prompt,
                    completion: a.completion + b.completion,
                    total: a.total + b.total,
                })
            }
        }
    }
}
