use std::future::Future;
use std::time::Duration;

use tokio::time::{timeout_at, Instant};

/// Caller-supplied bound on every store call and lock wait of one operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline(Instant);

/// The deadline passed before the bounded future completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("deadline exceeded during {0}")]
pub struct Expired(pub &'static str);

impl Deadline {
    /// A deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self(Instant::now() + budget)
    }

    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    pub fn instant(&self) -> Instant {
        self.0
    }

    /// Time left, zero once expired.
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    pub fn has_expired(&self) -> bool {
        Instant::now() >= self.0
    }

    /// Run `fut` until it completes or the deadline passes.
    pub async fn bound<F, T>(&self, what: &'static str, fut: F) -> Result<T, Expired>
    where
        F: Future<Output = T>,
    {
        timeout_at(self.0, fut).await.map_err(|_| Expired(what))
    }
}
