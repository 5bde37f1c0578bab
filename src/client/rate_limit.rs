//! Adaptive rate-limit governor.
//!
//! The governor wraps every outgoing request with a pair of request/response
//! interceptors. It bounds in-flight concurrency with a semaphore, enforces a
//! minimum interval between requests, and throttles proactively when the
//! server's `x-ratelimit-*` headers show that the remaining quota has fallen
//! below a near-limit threshold.
//!
//! # Environment Variables
//!
//! - `PORT_RATE_LIMIT_DISABLED`: set to any value to disable the governor.
//! - `PORT_DEBUG_RATE_LIMIT`: set to any value for verbose governor events.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rand::Rng;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tracing::debug;

/// Environment variable disabling the governor.
pub const ENV_RATE_LIMIT_DISABLED: &str = "PORT_RATE_LIMIT_DISABLED";
/// Environment variable enabling verbose governor logging.
pub const ENV_DEBUG_RATE_LIMIT: &str = "PORT_DEBUG_RATE_LIMIT";

/// Fraction of remaining quota below which the governor starts throttling.
pub const DEFAULT_NEAR_LIMIT_THRESHOLD: f64 = 0.02;
/// Maximum number of in-flight requests.
pub const MAX_CONCURRENT_REQUESTS: usize = 50;
/// Minimum interval between consecutive outgoing requests.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_millis(50);
/// Hard ceiling on waiting for a concurrency permit; on timeout the request
/// proceeds anyway, favouring liveness over strictness.
pub const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);
/// Cap on the delay derived from the server's reset header.
pub const MAX_RESET_DELAY: Duration = Duration::from_secs(120);
/// Cap on a single proactive throttle delay.
pub const MAX_THROTTLE_DELAY: Duration = Duration::from_secs(30);

/// Parsed `x-ratelimit-*` headers from the most recent response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitState {
    /// Total requests allowed in the window (`x-ratelimit-limit`).
    pub limit: u64,
    /// Window length in seconds (`x-ratelimit-period`).
    pub period: u64,
    /// Requests left in the window (`x-ratelimit-remaining`).
    pub remaining: i64,
    /// Seconds until the window resets (`x-ratelimit-reset`).
    pub reset: u64,
}

impl RateLimitState {
    /// Parse the four rate-limit headers. Returns `None` unless all four are
    /// present and numeric.
    pub fn from_headers(headers: &reqwest::header::HeaderMap) -> Option<Self> {
        fn parse<T: std::str::FromStr>(
            headers: &reqwest::header::HeaderMap,
            name: &str,
        ) -> Option<T> {
            headers.get(name)?.to_str().ok()?.trim().parse().ok()
        }

        Some(Self {
            limit: parse(headers, "x-ratelimit-limit")?,
            period: parse(headers, "x-ratelimit-period")?,
            remaining: parse(headers, "x-ratelimit-remaining")?,
            reset: parse(headers, "x-ratelimit-reset")?,
        })
    }

    /// The fraction of the window still available, or 1.0 when the limit is
    /// unknown or zero.
    pub fn remaining_fraction(&self) -> f64 {
        if self.limit == 0 {
            return 1.0;
        }
        (self.remaining.max(0) as f64) / (self.limit as f64)
    }
}

#[derive(Debug, Default)]
struct GovernorInner {
    state: Option<RateLimitState>,
    threshold: f64,
    active_requests: u64,
    last_request: Option<Instant>,
}

/// Request/response interceptor that throttles outgoing calls.
///
/// All shared state lives behind one mutex; the semaphore is the only
/// queueing primitive. Safe for arbitrarily many concurrent callers.
#[derive(Debug)]
pub struct RateLimitGovernor {
    enabled: bool,
    debug: bool,
    semaphore: Arc<Semaphore>,
    inner: Mutex<GovernorInner>,
}

impl RateLimitGovernor {
    /// Create a governor with explicit flags.
    pub fn new(enabled: bool, debug: bool) -> Self {
        Self {
            enabled,
            debug,
            semaphore: Arc::new(Semaphore::new(MAX_CONCURRENT_REQUESTS)),
            inner: Mutex::new(GovernorInner {
                threshold: DEFAULT_NEAR_LIMIT_THRESHOLD,
                ..Default::default()
            }),
        }
    }

    /// Create a governor configured from the environment.
    pub fn from_env() -> Self {
        Self::new(
            std::env::var(ENV_RATE_LIMIT_DISABLED).is_err(),
            std::env::var(ENV_DEBUG_RATE_LIMIT).is_ok(),
        )
    }

    /// Whether the governor is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Set the near-limit threshold. Values outside [0, 1] are ignored and
    /// the last valid value is retained.
    pub fn set_threshold(&self, threshold: f64) {
        if !(0.0..=1.0).contains(&threshold) {
            return;
        }
        self.inner.lock().expect("governor lock poisoned").threshold = threshold;
    }

    /// The current near-limit threshold.
    pub fn threshold(&self) -> f64 {
        self.inner.lock().expect("governor lock poisoned").threshold
    }

    /// The most recently observed rate-limit state, if any.
    pub fn state(&self) -> Option<RateLimitState> {
        self.inner.lock().expect("governor lock poisoned").state
    }

    /// The number of requests currently in flight.
    pub fn active_requests(&self) -> u64 {
        self.inner
            .lock()
            .expect("governor lock poisoned")
            .active_requests
    }

    /// Request-path interceptor. Acquires a concurrency permit (bounded
    /// wait), enforces the minimum request interval, and throttles when the
    /// remaining quota is below the threshold. Returns the permit, which the
    /// caller hands back to [`RateLimitGovernor::after_response`].
    pub async fn before_request(&self) -> Option<OwnedSemaphorePermit> {
        if !self.enabled {
            return None;
        }

        let permit = match tokio::time::timeout(
            ACQUIRE_TIMEOUT,
            Arc::clone(&self.semaphore).acquire_owned(),
        )
        .await
        {
            Ok(Ok(permit)) => Some(permit),
            Ok(Err(_)) => None,
            Err(_) => {
                debug!(
                    target: "port_provider::client::rate_limit",
                    "semaphore acquire timed out after {:?}; proceeding without a permit",
                    ACQUIRE_TIMEOUT
                );
                None
            },
        };

        let wait = {
            let mut inner = self.inner.lock().expect("governor lock poisoned");
            let now = Instant::now();

            let interval_deficit = inner
                .last_request
                .map(|last| (last + MIN_REQUEST_INTERVAL).saturating_duration_since(now))
                .unwrap_or(Duration::ZERO);

            let throttle = match inner.state {
                Some(state) if state.remaining_fraction() < inner.threshold => {
                    calculate_delay(&state, inner.active_requests)
                },
                _ => Duration::ZERO,
            };

            let wait = interval_deficit + throttle;
            inner.active_requests += 1;
            inner.last_request = Some(now + wait);

            if self.debug && !wait.is_zero() {
                debug!(
                    target: "port_provider::client::rate_limit",
                    interval_deficit_ms = interval_deficit.as_millis() as u64,
                    throttle_ms = throttle.as_millis() as u64,
                    active = inner.active_requests,
                    "throttling outgoing request"
                );
            }
            wait
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
        permit
    }

    /// Response-path interceptor. Releases the concurrency permit, decrements
    /// the active-request counter, and replaces the rate-limit state when the
    /// response carried all four headers.
    pub fn after_response(
        &self,
        headers: &reqwest::header::HeaderMap,
        permit: Option<OwnedSemaphorePermit>,
    ) {
        drop(permit);
        if !self.enabled {
            return;
        }

        let parsed = RateLimitState::from_headers(headers);
        let mut inner = self.inner.lock().expect("governor lock poisoned");
        inner.active_requests = inner.active_requests.saturating_sub(1);
        if let Some(state) = parsed {
            if self.debug {
                debug!(
                    target: "port_provider::client::rate_limit",
                    limit = state.limit,
                    remaining = state.remaining,
                    reset = state.reset,
                    "rate-limit headers observed"
                );
            }
            inner.state = Some(state);
        }
    }
}

/// Compute the proactive throttle delay for the given state.
///
/// - Quota exhausted: wait out the reset (capped at 120 s).
/// - Quota low: spread the remaining requests over 80% of the reset window,
///   accounting for requests already in flight.
///
/// Either way a +10% jitter is added so that parallel workers do not
/// synchronise their wake-ups.
pub fn calculate_delay(state: &RateLimitState, active_requests: u64) -> Duration {
    let base = if state.remaining <= 0 && state.reset > 0 {
        Duration::from_secs(state.reset).min(MAX_RESET_DELAY)
    } else if state.remaining > 0 && state.reset > 0 {
        let effective_remaining = (state.remaining - active_requests as i64).max(1) as f64;
        let spread = Duration::from_secs(state.reset).as_secs_f64() * 0.8 / effective_remaining;
        Duration::from_secs_f64(spread.clamp(
            MIN_REQUEST_INTERVAL.as_secs_f64(),
            MAX_THROTTLE_DELAY.as_secs_f64(),
        ))
    } else {
        return Duration::ZERO;
    };

    with_jitter(base)
}

fn with_jitter(base: Duration) -> Duration {
    let jitter = rand::thread_rng().gen_range(0.0..0.1);
    base + base.mul_f64(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(limit: &str, period: &str, remaining: &str, reset: &str) -> reqwest::header::HeaderMap {
        let mut h = reqwest::header::HeaderMap::new();
        h.insert("x-ratelimit-limit", limit.parse().unwrap());
        h.insert("x-ratelimit-period", period.parse().unwrap());
        h.insert("x-ratelimit-remaining", remaining.parse().unwrap());
        h.insert("x-ratelimit-reset", reset.parse().unwrap());
        h
    }

    #[test]
    fn test_parse_headers() {
        let state = RateLimitState::from_headers(&headers("100", "300", "5", "2")).unwrap();
        assert_eq!(state.limit, 100);
        assert_eq!(state.period, 300);
        assert_eq!(state.remaining, 5);
        assert_eq!(state.reset, 2);
    }

    #[test]
    fn test_parse_headers_requires_all_four() {
        let mut h = headers("100", "300", "5", "2");
        h.remove("x-ratelimit-reset");
        assert!(RateLimitState::from_headers(&h).is_none());
        assert!(RateLimitState::from_headers(&reqwest::header::HeaderMap::new()).is_none());
    }

    #[test]
    fn test_remaining_fraction() {
        let state = RateLimitState {
            limit: 100,
            period: 300,
            remaining: 5,
            reset: 2,
        };
        assert!((state.remaining_fraction() - 0.05).abs() < 1e-9);

        let zero_limit = RateLimitState {
            limit: 0,
            period: 0,
            remaining: 0,
            reset: 0,
        };
        assert_eq!(zero_limit.remaining_fraction(), 1.0);
    }

    #[test]
    fn test_calculate_delay_low_quota() {
        // limit=100, remaining=5, reset=2: 2 * 0.8 / 5 = 320 ms, plus jitter
        let state = RateLimitState {
            limit: 100,
            period: 300,
            remaining: 5,
            reset: 2,
        };
        let delay = calculate_delay(&state, 0);
        assert!(delay >= Duration::from_millis(320), "got {:?}", delay);
        assert!(delay <= Duration::from_millis(352 + 1), "got {:?}", delay);
    }

    #[test]
    fn test_calculate_delay_accounts_for_active_requests() {
        let state = RateLimitState {
            limit: 100,
            period: 300,
            remaining: 5,
            reset: 2,
        };
        // 4 in flight leaves one effective slot: 1.6 s base
        let delay = calculate_delay(&state, 4);
        assert!(delay >= Duration::from_millis(1600), "got {:?}", delay);

        // More in flight than remaining clamps the divisor at 1
        let delay = calculate_delay(&state, 50);
        assert!(delay >= Duration::from_millis(1600), "got {:?}", delay);
    }

    #[test]
    fn test_calculate_delay_exhausted_quota() {
        let state = RateLimitState {
            limit: 100,
            period: 300,
            remaining: 0,
            reset: 10,
        };
        let delay = calculate_delay(&state, 0);
        assert!(delay >= Duration::from_secs(10));
        assert!(delay <= Duration::from_secs(11));

        // Reset is capped at 120 s before jitter
        let state = RateLimitState {
            limit: 100,
            period: 300,
            remaining: 0,
            reset: 3600,
        };
        let delay = calculate_delay(&state, 0);
        assert!(delay <= Duration::from_secs(132));
    }

    #[test]
    fn test_calculate_delay_no_reset_means_no_delay() {
        let state = RateLimitState {
            limit: 100,
            period: 300,
            remaining: 0,
            reset: 0,
        };
        assert_eq!(calculate_delay(&state, 0), Duration::ZERO);
    }

    #[test]
    fn test_calculate_delay_clamped_to_bounds() {
        // Huge remaining quota: spread would be microscopic, clamp to min interval
        let state = RateLimitState {
            limit: 1_000_000,
            period: 300,
            remaining: 999_999,
            reset: 1,
        };
        let delay = calculate_delay(&state, 0);
        assert!(delay >= MIN_REQUEST_INTERVAL);

        // One remaining over a long reset: clamp to the 30 s ceiling
        let state = RateLimitState {
            limit: 100,
            period: 300,
            remaining: 1,
            reset: 300,
        };
        let delay = calculate_delay(&state, 0);
        assert!(delay <= MAX_THROTTLE_DELAY + MAX_THROTTLE_DELAY.mul_f64(0.1));
    }

    #[test]
    fn test_threshold_setter_ignores_out_of_range() {
        let governor = RateLimitGovernor::new(true, false);
        assert!((governor.threshold() - DEFAULT_NEAR_LIMIT_THRESHOLD).abs() < 1e-9);

        governor.set_threshold(0.5);
        assert!((governor.threshold() - 0.5).abs() < 1e-9);

        governor.set_threshold(1.5);
        assert!((governor.threshold() - 0.5).abs() < 1e-9);

        governor.set_threshold(-0.1);
        assert!((governor.threshold() - 0.5).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_disabled_governor_passes_through() {
        let governor = RateLimitGovernor::new(false, false);
        let start = Instant::now();
        let permit = governor.before_request().await;
        assert!(permit.is_none());
        assert!(start.elapsed() < Duration::from_millis(10));
        governor.after_response(&reqwest::header::HeaderMap::new(), permit);
        assert_eq!(governor.active_requests(), 0);
    }

    #[tokio::test]
    async fn test_min_interval_between_requests() {
        let governor = RateLimitGovernor::new(true, false);

        let permit = governor.before_request().await;
        governor.after_response(&reqwest::header::HeaderMap::new(), permit);

        let start = Instant::now();
        let permit = governor.before_request().await;
        governor.after_response(&reqwest::header::HeaderMap::new(), permit);
        // The second request waits out the remaining interval deficit
        assert!(
            start.elapsed() >= Duration::from_millis(30),
            "elapsed {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn test_throttles_when_below_threshold() {
        let governor = RateLimitGovernor::new(true, false);
        governor.set_threshold(0.1);

        let permit = governor.before_request().await;
        governor.after_response(&headers("100", "300", "5", "2"), permit);
        assert!(governor.state().is_some());

        let start = Instant::now();
        let permit = governor.before_request().await;
        // 2 * 0.8 / 5 = 320 ms minimum
        assert!(
            start.elapsed() >= Duration::from_millis(320),
            "elapsed {:?}",
            start.elapsed()
        );
        governor.after_response(&reqwest::header::HeaderMap::new(), permit);
    }

    #[tokio::test]
    async fn test_state_replaced_on_response() {
        let governor = RateLimitGovernor::new(true, false);
        let permit = governor.before_request().await;
        governor.after_response(&headers("100", "300", "99", "300"), permit);
        assert_eq!(governor.state().unwrap().remaining, 99);

        let permit = governor.before_request().await;
        governor.after_response(&headers("100", "300", "98", "299"), permit);
        assert_eq!(governor.state().unwrap().remaining, 98);

        // A response without headers keeps the previous state
        let permit = governor.before_request().await;
        governor.after_response(&reqwest::header::HeaderMap::new(), permit);
        assert_eq!(governor.state().unwrap().remaining, 98);
    }

    #[tokio::test]
    async fn test_active_counter_clamped_at_zero() {
        let governor = RateLimitGovernor::new(true, false);
        governor.after_response(&reqwest::header::HeaderMap::new(), None);
        governor.after_response(&reqwest::header::HeaderMap::new(), None);
        assert_eq!(governor.active_requests(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_callers() {
        let governor = Arc::new(RateLimitGovernor::new(true, false));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let g = Arc::clone(&governor);
            handles.push(tokio::spawn(async move {
                let permit = g.before_request().await;
                g.after_response(&reqwest::header::HeaderMap::new(), permit);
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(governor.active_requests(), 0);
    }
}
