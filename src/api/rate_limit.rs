//! Fixed-window, per-client rate limiting for the REST API.
//!
//! Clients are keyed by the peer address from `ConnectInfo`. The first
//! `X-Forwarded-For` address is only honoured when the gateway is configured
//! to trust its reverse proxy, since any client can forge the header.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::app_state::AppState;
use crate::error::GatewayError;

/// Entries are swept once the table grows past this size.
const SWEEP_THRESHOLD: usize = 10_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Counts requests per client in fixed windows.
#[derive(Debug)]
pub struct RateLimiter {
    window: Duration,
    max_requests: u32,
    trust_proxy: bool,
    clients: Mutex<HashMap<IpAddr, Window>>,
}

impl RateLimiter {
    /// Allows `max_requests` per client per `window`, keying clients by
    /// peer address.
    #[must_use]
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            window: window.max(Duration::from_secs(1)),
            max_requests: max_requests.max(1),
            trust_proxy: false,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Records one request from `client` at `now`.
    ///
    /// # Errors
    ///
    /// Returns the milliseconds until the client's window resets when the
    /// budget is exhausted.
    pub fn check(&self, client: IpAddr, now: Instant) -> Result<(), u64> {
        let mut clients = self.clients.lock().unwrap_or_else(PoisonError::into_inner);

        if clients.len() > SWEEP_THRESHOLD {
            let window = self.window;
            clients.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = clients.entry(client).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= self.window {
            *entry = Window {
                started: now,
                count: 0,
            };
        }
        if entry.count >= self.max_requests {
            let remaining = self.window.saturating_sub(now.duration_since(entry.started));
            return Err(u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX));
        }
        entry.count += 1;
        Ok(())
    }

    /// Keys clients by the `X-Forwarded-For` header set by a trusted
    /// reverse proxy.
    #[must_use]
    pub fn trusting_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Client address a request is counted against.
    #[must_use]
    pub fn client_ip(&self, request: &Request) -> IpAddr {
        let forwarded = self
            .trust_proxy
            .then(|| forwarded_for(request))
            .flatten();
        forwarded
            .or_else(|| {
                request
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ConnectInfo(addr)| addr.ip())
            })
            .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED))
    }
}

/// Axum middleware enforcing [`AppState::rate_limiter`].
///
/// # Errors
///
/// Returns [`GatewayError::RateLimited`] when the client is over budget.
pub async fn enforce(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let client = state.rate_limiter.client_ip(&request);
    if let Err(retry_after_ms) = state.rate_limiter.check(client, Instant::now()) {
        tracing::warn!(%client, retry_after_ms, "rate limit exceeded");
        return Err(GatewayError::RateLimited { retry_after_ms });
    }
    Ok(next.run(request).await)
}

fn forwarded_for(request: &Request) -> Option<IpAddr> {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok())
}
