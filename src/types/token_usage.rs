use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Token counts reported by the backend for one completed exchange.
///
/// The backend embeds one of these per streamed response, inside the
/// `[TOKEN_USAGE]...[/TOKEN_USAGE]` marker. The same type doubles as the
/// running accumulator for a whole session.
#[derive(Debug, Copy, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenUsage {
    /// The number of input tokens consumed by the prompt.
    pub input_tokens: u64,

    /// The number of output tokens generated.
    pub output_tokens: u64,

    /// The provider-reported total for the exchange.
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Create a new `TokenUsage` with the given counts.
    pub fn new(input_tokens: u64, output_tokens: u64, total_tokens: u64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }

    /// Returns true if every count is zero.
    pub fn is_zero(&self) -> bool {
        self.input_tokens == 0 && self.output_tokens == 0 && self.total_tokens == 0
    }
}

impl Add for TokenUsage {
    type Output = TokenUsage;

    fn add(self, rhs: TokenUsage) -> TokenUsage {
        TokenUsage {
            input_tokens: self.input_tokens + rhs.input_tokens,
            output_tokens: self.output_tokens + rhs.output_tokens,
            total_tokens: self.total_tokens + rhs.total_tokens,
        }
    }
}

impl AddAssign for TokenUsage {
    fn add_assign(&mut self, rhs: TokenUsage) {
        *self = *self + rhs;
    }
}
