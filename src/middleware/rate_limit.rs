use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use governor::{
    clock::QuantaClock, middleware::NoOpMiddleware, state::keyed::DashMapStateStore, Quota,
    RateLimiter,
};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::Arc,
    time::Duration,
};

use crate::{config::Settings, error::ApiError};

type KeyedLimiter =
    RateLimiter<IpAddr, DashMapStateStore<IpAddr>, QuantaClock, NoOpMiddleware>;

/// Per client IP limiter guarding the login routes.
///
/// Disabled limiters admit every request. Clients are keyed by the peer
/// address unless proxy headers are trusted.
pub struct IpRateLimiter {
    limiter: Option<KeyedLimiter>,
    trust_proxy_headers: bool,
}

impl IpRateLimiter {
    pub fn new(settings: &Settings) -> Self {
        let trust_proxy_headers = settings.trust_proxy_headers;
        if !settings.rate_limit_enabled {
            return Self {
                limiter: None,
                trust_proxy_headers,
            };
        }

        let requests_per_window =
            NonZeroU32::new(settings.rate_limit_requests).unwrap_or(NonZeroU32::MIN);
        let window_duration = Duration::from_secs(settings.rate_limit_window_seconds as u64);

        // The window is the time to fully replenish the burst
        let replenish = window_duration / requests_per_window.get();
        let quota = Quota::with_period(replenish)
            .unwrap_or_else(|| Quota::per_second(requests_per_window))
            .allow_burst(requests_per_window);

        Self {
            limiter: Some(RateLimiter::keyed(quota)),
            trust_proxy_headers,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.limiter.is_some()
    }

    pub fn check_ip(&self, ip: IpAddr) -> bool {
        match &self.limiter {
            Some(limiter) => limiter.check_key(&ip).is_ok(),
            None => true,
        }
    }

    /// Address a request is accounted to
    pub fn client_ip(&self, request: &Request) -> IpAddr {
        let forwarded = if self.trust_proxy_headers {
            extract_client_ip(request.headers())
        } else {
            None
        };

        forwarded
            .or_else(|| {
                request
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|info| info.0.ip())
            })
            .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
    }
}

/// Extract client IP from proxy headers. The values are client controlled
/// unless a proxy rewrites them.
pub fn extract_client_ip(headers: &HeaderMap) -> Option<IpAddr> {
    // Check X-Forwarded-For header first (for proxies)
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            // Take the first IP in the chain
            if let Some(first_ip) = forwarded_str.split(',').next() {
                if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                    return Some(ip);
                }
            }
        }
    }

    // Check X-Real-IP header
    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(ip_str) = real_ip.to_str() {
            if let Ok(ip) = ip_str.trim().parse::<IpAddr>() {
                return Some(ip);
            }
        }
    }

    None
}

/// IP-based rate limiting middleware
pub async fn ip_rate_limit_middleware(
    State(ip_limiter): State<Arc<IpRateLimiter>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let client_ip = ip_limiter.client_ip(&request);

    if ip_limiter.check_ip(client_ip) {
        Ok(next.run(request).await)
    } else {
        tracing::warn!(client_ip = %client_ip, "Rate limit exceeded");
        Err(ApiError::RateLimit(
            "Too many requests, try again later".to_string(),
        ))
    }
}
