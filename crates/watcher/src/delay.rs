//! Cancellable pause used to pace poll attempts.
//!
//! A [`Delay`] is a validated, non-negative duration. Awaiting [`Delay::wait`]
//! resolves after at least that duration; dropping the returned future before
//! it resolves abandons the pause without side effects.

use std::time::Duration;

use thiserror::Error;
use tokio::time::Sleep;

/// Rejected delay input.
///
/// These are programming-error guards: no timer is scheduled when one is
/// returned.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum DelayError {
    #[error("duration is not a number")]
    NotANumber,

    #[error("duration is infinite")]
    Infinite,

    #[error("duration is negative: {0}")]
    Negative(f64),

    #[error("duration is out of range: {0}")]
    OutOfRange(f64),
}

/// A validated pause length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Delay(Duration);

impl Delay {
    /// Wraps an already-typed duration; cannot fail.
    pub fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    /// Validates a duration expressed in seconds.
    ///
    /// # Errors
    ///
    /// Returns a [`DelayError`] if `secs` is NaN, infinite, negative, or too
    /// large for a [`Duration`].
    pub fn from_secs_f64(secs: f64) -> Result<Self, DelayError> {
        if secs.is_nan() {
            return Err(DelayError::NotANumber);
        }
        if secs.is_infinite() {
            return Err(DelayError::Infinite);
        }
        if secs < 0.0 {
            return Err(DelayError::Negative(secs));
        }
        Duration::try_from_secs_f64(secs)
            .map(Self)
            .map_err(|_| DelayError::OutOfRange(secs))
    }

    /// Returns the pause length.
    pub fn duration(self) -> Duration {
        self.0
    }

    /// Starts the pause.
    ///
    /// The returned future is lazy with respect to the caller's control flow:
    /// drop it (e.g. from a losing `tokio::select!` branch) to abandon the
    /// pause.
    pub fn wait(self) -> Sleep {
        tokio::time::sleep(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::Instant;

    #[test]
    fn rejects_non_numeric_durations() {
        assert_eq!(Delay::from_secs_f64(f64::NAN), Err(DelayError::NotANumber));
        assert_eq!(Delay::from_secs_f64(f64::INFINITY), Err(DelayError::Infinite));
        assert_eq!(Delay::from_secs_f64(-0.5), Err(DelayError::Negative(-0.5)));
        assert_eq!(
            Delay::from_secs_f64(1.5).unwrap().duration(),
            Duration::from_millis(1500)
        );
    }

    #[test]
    fn rejects_durations_too_large_to_represent() {
        assert_eq!(Delay::from_secs_f64(1e20), Err(DelayError::OutOfRange(1e20)));
        assert_eq!(
            DelayError::OutOfRange(1e20).to_string(),
            "duration is out of range: 100000000000000000000"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn wait_resolves_after_at_least_the_duration() {
        let start = Instant::now();
        Delay::from_duration(Duration::from_secs(10)).wait().await;
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn abandoned_wait_does_not_resolve() {
        let long = Delay::from_duration(Duration::from_secs(3600));
        let short = Delay::from_duration(Duration::from_secs(1));
        let start = Instant::now();

        let long_won = tokio::select! {
            () = long.wait() => true,
            () = short.wait() => false,
        };

        assert!(!long_won);
        assert!(start.elapsed() < Duration::from_secs(3600));
    }
}
