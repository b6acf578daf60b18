//! Bounded retry with exponential backoff for read paths that may degrade.

use std::future::Future;

use crate::prelude::*;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
  /// Total attempts, the first one included.
  pub max_attempts: u32,
  pub base_delay: Duration,
  /// Backoff is capped here.
  pub max_delay: Duration,
  /// Upper bound for a single attempt.
  pub timeout: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      base_delay: Duration::from_millis(100),
      max_delay: Duration::from_secs(2),
      timeout: Duration::from_secs(2),
    }
  }
}

impl RetryPolicy {
  pub fn delay(&self, attempt: u32) -> Duration {
    let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
    self.base_delay.saturating_mul(factor).min(self.max_delay)
  }

  /// Runs `op` until it succeeds or the attempts run out, returning the last
  /// error. Attempts exceeding `timeout` count as failures.
  pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
  where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
  {
    let attempts = self.max_attempts.max(1);
    let mut last = Error::Internal(format!("{what}: no attempts made"));

    for attempt in 1..=attempts {
      match tokio::time::timeout(self.timeout, op()).await {
        Ok(Ok(value)) => return Ok(value),
        Ok(Err(err)) => last = err,
        Err(_) => {
          last = Error::Internal(format!("{what}: timed out after {:?}", self.timeout))
        }
      }

      if attempt < attempts {
        let delay = self.delay(attempt);
        warn!("{what} failed (attempt {attempt}/{attempts}): {last}, retrying in {delay:?}");
        tokio::time::sleep(delay).await;
      }
    }

    Err(last)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};

  use super::*;

  fn fast() -> RetryPolicy {
    RetryPolicy {
      max_attempts: 3,
      base_delay: Duration::from_millis(1),
      max_delay: Duration::from_millis(4),
      timeout: Duration::from_millis(50),
    }
  }

  #[test]
  fn test_backoff_is_capped() {
    let policy = RetryPolicy {
      base_delay: Duration::from_millis(100),
      max_delay: Duration::from_millis(300),
      ..Default::default()
    };
    assert_eq!(policy.delay(1), Duration::from_millis(100));
    assert_eq!(policy.delay(2), Duration::from_millis(200));
    assert_eq!(policy.delay(3), Duration::from_millis(300));
    assert_eq!(policy.delay(30), Duration::from_millis(300));
  }

  #[tokio::test]
  async fn test_succeeds_after_transient_failures() {
    let calls = &AtomicU32::new(0);
    let value = fast()
      .run("flaky", move || async move {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
          Err(Error::Internal("boom".into()))
        } else {
          Ok(7)
        }
      })
      .await
      .unwrap();

    assert_eq!(value, 7);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_gives_up_after_max_attempts() {
    let calls = &AtomicU32::new(0);
    let result: Result<()> = fast()
      .run("broken", move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Internal("down".into()))
      })
      .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_slow_attempt_times_out() {
    let result = fast()
      .run("slow", || async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(())
      })
      .await;

    assert!(matches!(result, Err(Error::Internal(msg)) if msg.contains("timed out")));
  }
}
