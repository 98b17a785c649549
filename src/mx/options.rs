use std::time::Duration;

#[cfg(feature = "with-serde")]
use serde::{Deserialize, Serialize};

/// DNS timeouts used by [`MxResolver`](crate::mx::MxResolver).
#[cfg_attr(feature = "with-serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverOptions {
    /// Deadline for a single query attempt.
    pub timeout: Duration,
    /// Overall budget for one lookup, spread over retries. Enforced as a
    /// retry count (see [`ResolverOptions::attempts`]), not as a hard deadline:
    /// a lookup runs for at most about `attempts() * timeout`.
    pub lifetime: Duration,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            lifetime: Duration::from_secs(10),
        }
    }
}

impl ResolverOptions {
    /// Number of attempts that fit in `lifetime`, at least one.
    pub fn attempts(&self) -> usize {
        if self.timeout.is_zero() {
            return 1;
        }
        let fits = self.lifetime.as_nanos() / self.timeout.as_nanos();
        usize::try_from(fits).unwrap_or(usize::MAX).max(1)
    }
}
