//! Bounded Retry - Backoff schedule for best-effort campaign cleanup
//!
//! Deleting a transient campaign is the one remote call worth retrying:
//! a leftover campaign is an orphaned artifact on the remote account, but
//! cleanup must never crash or block the pipeline once the notification
//! itself has gone out. The helper here is a generic bounded retry driven
//! by an explicit delay schedule so tests can run it in milliseconds.

use std::future::Future;
use std::time::Duration;
use tracing::{error, warn};

use crate::campaign::CampaignClient;

/// Cleanup schedule: a settle delay before the first attempt, then two
/// escalating retries. After the last failure the campaign is abandoned
/// and only logged; removing orphans is left to account tooling.
pub const DELETE_BACKOFF: [Duration; 3] = [
    Duration::from_secs(5),
    Duration::from_secs(15),
    Duration::from_secs(30),
];

/// Run `op` once per entry in `delays`, sleeping the entry first
///
/// Returns the first success, or the last error once the schedule is
/// exhausted. `delays` must be non-empty.
pub async fn retry_with_backoff<T, E, F, Fut>(delays: &[Duration], mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut last_err = None;

    for (attempt, delay) in delays.iter().enumerate() {
        tokio::time::sleep(*delay).await;

        match op().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt + 1 < delays.len() {
                    warn!("Attempt {} of {} failed: {}", attempt + 1, delays.len(), err);
                }
                last_err = Some(err);
            }
        }
    }

    Err(last_err.expect("retry schedule must be non-empty"))
}

/// Best-effort campaign deletion; never propagates failure
pub async fn delete_with_retry(client: &CampaignClient, campaign_id: &str, delays: &[Duration]) {
    if let Err(err) = retry_with_backoff(delays, || client.delete_campaign(campaign_id)).await {
        error!("Giving up on cleanup of campaign {}: {}", campaign_id, err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Instant;

    const FAST: [Duration; 3] = [
        Duration::from_millis(5),
        Duration::from_millis(15),
        Duration::from_millis(30),
    ];

    #[tokio::test(start_paused = true)]
    async fn test_first_attempt_success_stops_retrying() {
        let attempts = AtomicUsize::new(0);

        let result: Result<u32, &str> = retry_with_backoff(&FAST, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Ok(42) }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_failures() {
        let attempts = AtomicUsize::new(0);

        let result: Result<u32, &str> = retry_with_backoff(&FAST, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err("transient")
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result, Ok(7));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_schedule_returns_last_error() {
        let attempts = AtomicUsize::new(0);

        let result: Result<u32, String> = retry_with_backoff(&FAST, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move { Err(format!("failure {}", n + 1)) }
        })
        .await;

        assert_eq!(result, Err("failure 3".to_string()));
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delays_strictly_increase() {
        let start = Instant::now();
        let mut offsets = Vec::new();

        let _: Result<(), &str> = retry_with_backoff(&FAST, || {
            offsets.push(start.elapsed());
            async { Err("always") }
        })
        .await;

        assert_eq!(offsets.len(), 3);
        assert_eq!(offsets[0], Duration::from_millis(5));
        assert_eq!(offsets[1], Duration::from_millis(5 + 15));
        assert_eq!(offsets[2], Duration::from_millis(5 + 15 + 30));
    }

    #[test]
    fn test_default_schedule_escalates() {
        assert!(DELETE_BACKOFF.windows(2).all(|w| w[0] < w[1]));
    }
}
