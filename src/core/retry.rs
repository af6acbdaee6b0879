use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::utils::error::{AppError, DriverError, Result};

/// Closed range a randomized delay is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackoffRange {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl BackoffRange {
    pub const fn new(min_secs: f64, max_secs: f64) -> Self {
        Self { min_secs, max_secs }
    }

    pub fn is_valid(&self) -> bool {
        self.min_secs.is_finite()
            && self.max_secs.is_finite()
            && self.min_secs >= 0.0
            && self.min_secs <= self.max_secs
    }

    pub fn min(&self) -> Duration {
        Duration::from_secs_f64(self.min_secs.max(0.0))
    }

    pub fn max(&self) -> Duration {
        Duration::from_secs_f64(self.max_secs.max(self.min_secs).max(0.0))
    }

    /// Uniform draw from `[min, max]`.
    pub fn sample(&self) -> Duration {
        let (min, max) = (self.min(), self.max());
        if min == max {
            return min;
        }
        rand::rng().random_range(min..=max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: BackoffRange,
    /// Pause taken once after a successful attempt.
    #[serde(default)]
    pub settle: Option<BackoffRange>,
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, backoff: BackoffRange) -> Self {
        Self {
            max_attempts,
            backoff,
            settle: None,
        }
    }

    pub fn with_settle(mut self, settle: BackoffRange) -> Self {
        self.settle = Some(settle);
        self
    }

    /// Loading the entry page.
    pub fn navigation() -> Self {
        Self::new(3, BackoffRange::new(2.0, 6.0)).with_settle(BackoffRange::new(2.0, 6.0))
    }

    /// Filling and submitting the search form.
    pub fn interaction() -> Self {
        Self::new(3, BackoffRange::new(1.0, 4.0)).with_settle(BackoffRange::new(1.0, 4.0))
    }

    /// Opening a search result.
    pub fn selection() -> Self {
        Self::new(3, BackoffRange::new(2.0, 5.0)).with_settle(BackoffRange::new(2.0, 5.0))
    }
}

/// Source of real or simulated wall-clock delay.
#[async_trait]
pub trait Pause: Send + Sync {
    async fn pause(&self, duration: Duration);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioPause;

#[async_trait]
impl Pause for TokioPause {
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Bounded-retry wrapper around everything that touches the remote page.
pub struct RetryExecutor<P = TokioPause> {
    pause: P,
}

impl Default for RetryExecutor<TokioPause> {
    fn default() -> Self {
        Self::new(TokioPause)
    }
}

impl<P: Pause> RetryExecutor<P> {
    pub fn new(pause: P) -> Self {
        Self { pause }
    }

    /// Pause for a random duration inside `range`.
    pub async fn settle(&self, range: &BackoffRange) {
        self.pause.pause(range.sample()).await;
    }

    /// Run `operation` until it succeeds or `policy.max_attempts` is spent.
    ///
    /// The attempt number (starting at 1) is passed to the operation. The
    /// last failure is returned inside [`AppError::ExhaustedRetries`].
    pub async fn run<T, F, Fut>(
        &self,
        target: &str,
        policy: &RetryPolicy,
        mut operation: F,
    ) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = std::result::Result<T, DriverError>>,
    {
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation(attempt).await {
                Ok(value) => {
                    tracing::debug!("{} succeeded on attempt {}", target, attempt);
                    if let Some(settle) = &policy.settle {
                        self.settle(settle).await;
                    }
                    return Ok(value);
                }
                Err(e) if attempt >= max_attempts => {
                    tracing::error!("{} failed on final attempt {}: {}", target, attempt, e);
                    return Err(AppError::ExhaustedRetries {
                        target: target.to_string(),
                        attempts: attempt,
                        source: e,
                    });
                }
                Err(e) => {
                    let delay = policy.backoff.sample();
                    tracing::warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {:.1}s",
                        target,
                        attempt,
                        max_attempts,
                        e,
                        delay.as_secs_f64()
                    );
                    self.pause.pause(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
