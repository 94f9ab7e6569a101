//! Service configuration.
//!
//! Builder-style configuration for the token codec, check-in pipeline,
//! roster cache and broadcast hub. Defaults match the reference
//! behavior; applications override them instead of patching constants.

use chrono::Duration;

/// Token codec configuration.
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// HMAC secret used to sign QR tokens.
    pub secret: String,

    /// Token validity window.
    ///
    /// Default: 24 hours
    pub ttl: Duration,
}

impl TokenConfig {
    /// Create a new token configuration with the given signing secret.
    #[must_use]
    pub const fn new(secret: String) -> Self {
        Self {
            secret,
            ttl: Duration::hours(24),
        }
    }

    /// Set the token validity window.
    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

/// Check-in pipeline configuration.
#[derive(Debug, Clone)]
pub struct CheckinConfig {
    /// How long after its scheduled date an event still accepts
    /// check-ins.
    ///
    /// Default: 1 day
    pub grace_window: Duration,
}

impl CheckinConfig {
    /// Set the post-date grace window during which check-ins are still
    /// accepted.
    #[must_use]
    pub const fn with_grace_window(mut self, grace_window: Duration) -> Self {
        self.grace_window = grace_window;
        self
    }
}

impl Default for CheckinConfig {
    fn default() -> Self {
        Self {
            grace_window: Duration::days(1),
        }
    }
}

/// Roster cache configuration.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Time-to-live of a cached roster snapshot, in seconds.
    ///
    /// Default: 60 seconds
    pub ttl_seconds: u64,
}

impl CacheConfig {
    /// Set the snapshot time-to-live.
    #[must_use]
    pub const fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_seconds: 60 }
    }
}

/// Broadcast hub configuration.
#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Interval between keep-alive frames pushed to every open
    /// subscriber.
    ///
    /// Default: 30 seconds
    pub heartbeat_interval: std::time::Duration,

    /// Per-subscriber channel capacity. A subscriber whose channel is
    /// full when a push arrives is treated as dead and removed.
    ///
    /// Default: 64
    pub channel_capacity: usize,
}

impl HubConfig {
    /// Set the heartbeat interval.
    #[must_use]
    pub const fn with_heartbeat_interval(mut self, interval: std::time::Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Set the per-subscriber channel capacity. Clamped to at least 1,
    /// since a subscriber channel must be able to hold a frame.
    #[must_use]
    pub const fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = if capacity == 0 { 1 } else { capacity };
        self
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: std::time::Duration::from_secs(30),
            channel_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_config_builder() {
        let config = TokenConfig::new("secret".to_string()).with_ttl(Duration::hours(1));
        assert_eq!(config.secret, "secret");
        assert_eq!(config.ttl, Duration::hours(1));
    }

    #[test]
    fn token_config_defaults_to_24h() {
        let config = TokenConfig::new("secret".to_string());
        assert_eq!(config.ttl, Duration::hours(24));
    }

    #[test]
    fn checkin_config_defaults_to_one_day_grace() {
        assert_eq!(CheckinConfig::default().grace_window, Duration::days(1));
    }

    #[test]
    fn cache_config_defaults_to_60s() {
        assert_eq!(CacheConfig::default().ttl_seconds, 60);
    }

    #[test]
    fn hub_config_builder() {
        let config = HubConfig::default()
            .with_heartbeat_interval(std::time::Duration::from_secs(5))
            .with_channel_capacity(8);
        assert_eq!(config.heartbeat_interval, std::time::Duration::from_secs(5));
        assert_eq!(config.channel_capacity, 8);
    }

    #[test]
    fn hub_config_clamps_zero_channel_capacity() {
        assert_eq!(HubConfig::default().with_channel_capacity(0).channel_capacity, 1);
    }
}
