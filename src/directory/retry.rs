use super::error::{DirectoryError, Result};
use std::thread;
use std::time::Duration;

/// Fixed-backoff retry budget for directory requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub attempts: u32,
    /// Sleep between consecutive attempts
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, backoff: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            backoff,
        }
    }

    /// Run `op` until it succeeds, fails permanently, or the budget is spent.
    ///
    /// Exhausting the budget on transient errors yields
    /// [`DirectoryError::Unavailable`] wrapping the last failure.
    pub fn run<T>(&self, what: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let attempts = self.attempts.max(1);
        let mut attempt = 1;

        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => return Err(e),
                Err(e) if attempt >= attempts => {
                    return Err(DirectoryError::Unavailable {
                        attempts,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    log::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:?}",
                        what,
                        attempt,
                        attempts,
                        e,
                        self.backoff
                    );
                    thread::sleep(self.backoff);
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn instant() -> RetryPolicy {
        RetryPolicy::new(3, Duration::ZERO)
    }

    #[test]
    fn test_succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result = instant().run("test", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(DirectoryError::RateLimited)
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_third_failure_propagates_as_unavailable() {
        let calls = Cell::new(0);
        let result: Result<()> = instant().run("test", || {
            calls.set(calls.get() + 1);
            Err(DirectoryError::ServerError {
                status: 502,
                message: "bad gateway".to_string(),
            })
        });
        assert_eq!(calls.get(), 3);
        assert!(matches!(
            result,
            Err(DirectoryError::Unavailable { attempts: 3, .. })
        ));
    }

    #[test]
    fn test_permanent_failure_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<()> = instant().run("test", || {
            calls.set(calls.get() + 1);
            Err(DirectoryError::Unauthorized)
        });
        assert_eq!(calls.get(), 1);
        assert!(matches!(result, Err(DirectoryError::Unauthorized)));
    }

    #[test]
    fn test_zero_attempts_still_tries_once() {
        let calls = Cell::new(0);
        let _ = RetryPolicy::new(0, Duration::ZERO).run("test", || {
            calls.set(calls.get() + 1);
            Ok(())
        });
        assert_eq!(calls.get(), 1);
    }
}
