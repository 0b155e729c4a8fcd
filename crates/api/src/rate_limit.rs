//! Rate Limiting Middleware using GCRA Algorithm
//!
//! Limits scoring requests per client IP with tower_governor.

use anyhow::{Context, Result};
use governor::middleware::StateInformationMiddleware;
use serde::Deserialize;
use std::sync::Arc;
use tower_governor::governor::GovernorConfigBuilder;
use tower_governor::key_extractor::PeerIpKeyExtractor;

/// Governor config keyed by peer IP, with X-RateLimit-* headers
pub type DefaultGovernorConfig =
    tower_governor::governor::GovernorConfig<PeerIpKeyExtractor, StateInformationMiddleware>;

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Seconds to replenish one request
    pub per_second: u64,
    /// Burst size (max requests that can be made immediately)
    pub burst_size: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: 1,
            burst_size: 20,
        }
    }
}

/// Build the governor config for `GovernorLayer`.
///
/// Peer IPs come from `ConnectInfo`, so the server must be started with
/// `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn create_governor_config(config: &RateLimitConfig) -> Result<Arc<DefaultGovernorConfig>> {
    let governor = GovernorConfigBuilder::default()
        .per_second(config.per_second)
        .burst_size(config.burst_size)
        .use_headers()
        .finish()
        .context("Rate limit per_second and burst_size must be non-zero")?;
    Ok(Arc::new(governor))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RateLimitConfig::default();
        assert_eq!(config.per_second, 1);
        assert_eq!(config.burst_size, 20);
    }

    #[test]
    fn test_create_governor_config() {
        let governor = create_governor_config(&RateLimitConfig::default()).unwrap();
        assert_eq!(Arc::strong_count(&governor), 1);
    }

    #[test]
    fn test_zero_burst_rejected() {
        let config = RateLimitConfig {
            per_second: 1,
            burst_size: 0,
        };
        assert!(create_governor_config(&config).is_err());
    }
}
