//! Timeout utilities.

use std::time::Duration;

use tokio::time::Instant;

/// A deadline tracker for operations made of several bounded waits.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    deadline: Instant,
}

impl Deadline {
    /// Create a new deadline from now.
    #[must_use]
    pub fn from_now(duration: Duration) -> Self {
        Self {
            deadline: Instant::now() + duration,
        }
    }

    /// Check if the deadline has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.deadline
    }

    /// Get the remaining time until the deadline, zero once it has passed.
    #[must_use]
    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn deadline_remaining() {
        let deadline = Deadline::from_now(Duration::from_secs(10));
        assert!(!deadline.is_expired());
        assert!(deadline.remaining() > Duration::from_secs(9));
    }

    #[tokio::test]
    async fn deadline_expires() {
        let deadline = Deadline::from_now(Duration::from_millis(100));
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(deadline.is_expired());
        assert_eq!(deadline.remaining(), Duration::ZERO);
    }
}
