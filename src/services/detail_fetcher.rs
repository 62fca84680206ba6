// Detail fetch with a deadline and a client-driven retry cap
//
// Every request is exactly one attempt wrapped in `tokio::time::timeout`. Retrying is up to the
// client, which sends its attempt number; attempts past the cap are refused.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::ContentStore;
use crate::models::{ContentItem, ContentKind, Counter};

/// Response header telling the client how many manual retries it has left.
pub const RETRIES_LEFT_HEADER: &str = "x-retries-left";

#[derive(Debug, Clone)]
pub struct DetailPolicy {
    /// Deadline for a single attempt
    pub timeout: Duration,
    /// Total attempts a client may make, including the first
    pub max_attempts: u32,
}

impl Default for DetailPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            max_attempts: 3,
        }
    }
}

/// Run `fut` under a deadline, mapping an elapsed deadline to `TimeoutError`.
pub async fn with_timeout<Fut, T>(timeout: Duration, what: &str, fut: Fut) -> AppResult<T>
where
    Fut: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::TimeoutError(format!(
            "{} did not finish within {:?}",
            what, timeout
        ))),
    }
}

#[derive(Clone)]
pub struct DetailFetcher {
    store: Arc<dyn ContentStore>,
    policy: DetailPolicy,
}

impl DetailFetcher {
    pub fn new(store: Arc<dyn ContentStore>, policy: DetailPolicy) -> Self {
        Self { store, policy }
    }

    /// How many more attempts the client may make after `attempt` failed with `error`.
    pub fn retries_left(&self, attempt: u32, error: &AppError) -> u32 {
        if error.is_transient() {
            self.policy.max_attempts.saturating_sub(attempt.max(1))
        } else {
            0
        }
    }

    /// One attempt under the deadline. `attempt` counts from 1; 0 is read as 1.
    #[instrument(skip(self))]
    pub async fn fetch(&self, kind: ContentKind, id: &str, attempt: u32) -> AppResult<ContentItem> {
        let attempt = attempt.max(1);
        if attempt > self.policy.max_attempts {
            return Err(AppError::Validation(format!(
                "Retry limit reached ({} attempts)",
                self.policy.max_attempts
            )));
        }

        let what = format!("Loading {} {}", kind, id);
        let loaded = with_timeout(self.policy.timeout, &what, async {
            self.store
                .get_content(kind, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("{} {} not found", kind, id)))
        })
        .await;

        let mut item = match loaded {
            Ok(item) => item,
            Err(e) => {
                warn!(
                    %kind,
                    id,
                    attempt,
                    max_attempts = self.policy.max_attempts,
                    retries_left = self.retries_left(attempt, &e),
                    error = %e,
                    "Detail load failed"
                );
                return Err(e);
            }
        };

        match self.store.increment_counter(kind, id, Counter::Views, 1).await {
            Ok(views) => item.views = views,
            Err(e) => warn!(%kind, id, error = %e, "Failed to record view"),
        }
        debug!(%kind, id, views = item.views, "Detail loaded");
        Ok(item)
    }
}
