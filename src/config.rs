use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use crate::db::config::{env_bool, env_u32};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub engine: EngineConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            host,
            port,
            log_level,
            engine: EngineConfig::from_env(),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

/// Tunables for the mastery and scheduling engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub plan_max_items: usize,
    /// A point at or above this ratio (with enough attempts) is left out of study plans.
    pub plan_mastered_ratio: f64,
    pub plan_mastered_min_attempts: i64,
    pub diagnostic_size: usize,
    pub weak_point_limit: usize,
    pub notify_dedup: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            plan_max_items: 5,
            plan_mastered_ratio: 0.85,
            plan_mastered_min_attempts: 5,
            diagnostic_size: 10,
            weak_point_limit: 5,
            notify_dedup: true,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let plan_mastered_ratio = std::env::var("PLAN_MASTERED_RATIO")
            .ok()
            .and_then(|value| value.parse::<f64>().ok())
            .filter(|value| (0.0..=1.0).contains(value))
            .unwrap_or(defaults.plan_mastered_ratio);

        Self {
            plan_max_items: env_u32("PLAN_MAX_ITEMS", defaults.plan_max_items as u32).max(1) as usize,
            plan_mastered_ratio,
            plan_mastered_min_attempts: env_u32(
                "PLAN_MASTERED_MIN_ATTEMPTS",
                defaults.plan_mastered_min_attempts as u32,
            ) as i64,
            diagnostic_size: env_u32("DIAGNOSTIC_SIZE", defaults.diagnostic_size as u32).max(1) as usize,
            weak_point_limit: env_u32("WEAK_POINT_LIMIT", defaults.weak_point_limit as u32).max(1) as usize,
            notify_dedup: env_bool("NOTIFY_DEDUP", defaults.notify_dedup),
        }
    }
}
