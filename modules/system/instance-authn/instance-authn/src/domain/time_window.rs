//! Signing time acceptance window.

use std::time::Duration;

use time::OffsetDateTime;

/// Accepts signing times in `[now - max_age, now + max_skew]`, bounds
/// inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SigningWindow {
    max_age: Duration,
    max_skew: Duration,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WindowViolation {
    #[error(
        "request is too old; signed at {signed_at} but received request at {received_at}; allowable seconds old is {allowed_secs}"
    )]
    TooOld {
        signed_at: OffsetDateTime,
        received_at: OffsetDateTime,
        allowed_secs: u64,
    },

    #[error(
        "request is too far in the future; signed at {signed_at} but received request at {received_at}; allowable seconds in the future is {allowed_secs}"
    )]
    TooFarInFuture {
        signed_at: OffsetDateTime,
        received_at: OffsetDateTime,
        allowed_secs: u64,
    },
}

impl SigningWindow {
    #[must_use]
    pub fn new(max_age: Duration, max_skew: Duration) -> Self {
        Self { max_age, max_skew }
    }

    #[must_use]
    pub fn max_age(&self) -> Duration {
        self.max_age
    }

    #[must_use]
    pub fn max_skew(&self) -> Duration {
        self.max_skew
    }

    /// Checks `signed_at` against the window around `now`.
    ///
    /// # Errors
    /// Returns the violated bound.
    pub fn check(
        &self,
        signed_at: OffsetDateTime,
        now: OffsetDateTime,
    ) -> Result<(), WindowViolation> {
        // A bound beyond the representable range constrains nothing.
        let earliest = time::Duration::try_from(self.max_age)
            .ok()
            .and_then(|d| now.checked_sub(d));
        if earliest.is_some_and(|earliest| signed_at < earliest) {
            return Err(WindowViolation::TooOld {
                signed_at,
                received_at: now,
                allowed_secs: self.max_age.as_secs(),
            });
        }

        let latest = time::Duration::try_from(self.max_skew)
            .ok()
            .and_then(|d| now.checked_add(d));
        if latest.is_some_and(|latest| signed_at > latest) {
            return Err(WindowViolation::TooFarInFuture {
                signed_at,
                received_at: now,
                allowed_secs: self.max_skew.as_secs(),
            });
        }

        Ok(())
    }
}
