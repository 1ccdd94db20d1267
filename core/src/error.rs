//! Error types for reactor pipelines.
//!
//! None of these errors ever reach a state or effect observer. The runtime
//! contains each one at the stage that raised it and logs it:
//!
//! - [`ReactorError::Mutation`] ends the mutation stream of the action that
//!   produced it. Other in-flight actions are unaffected.
//! - [`ReactorError::Reduction`] turns the offending mutation into a no-op.
//! - [`ReactorError::Disposal`] is logged during teardown and the remaining
//!   subscriptions are still disposed.

use thiserror::Error;

/// Errors raised by reactor hooks and subscription disposal.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReactorError {
    /// Deriving mutations for an action failed.
    #[error("Mutation derivation failed: {0}")]
    Mutation(String),

    /// Folding a mutation into state failed.
    #[error("Reduction failed: {0}")]
    Reduction(String),

    /// Releasing a subscription failed.
    #[error("Subscription disposal failed: {0}")]
    Disposal(String),
}

impl ReactorError {
    /// Create a [`ReactorError::Mutation`] from any displayable message.
    #[must_use]
    pub fn mutation(message: impl Into<String>) -> Self {
        Self::Mutation(message.into())
    }

    /// Create a [`ReactorError::Reduction`] from any displayable message.
    #[must_use]
    pub fn reduction(message: impl Into<String>) -> Self {
        Self::Reduction(message.into())
    }

    /// Create a [`ReactorError::Disposal`] from any displayable message.
    #[must_use]
    pub fn disposal(message: impl Into<String>) -> Self {
        Self::Disposal(message.into())
    }

    /// Stable label for the error kind, used as a metrics/log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Mutation(_) => "mutation",
            Self::Reduction(_) => "reduction",
            Self::Disposal(_) => "disposal",
        }
    }
}
