//! Command-line and environment configuration.

use std::net::SocketAddr;

use anyhow::{Result, ensure};
use clap::Parser;
use engine_net::fragment::{DEFAULT_MAX_BUFFERED_BYTES, DEFAULT_MAX_FRAGMENTS, DEFAULT_MAX_PENDING};

use crate::tick::{MAX_TICK_RATE, MIN_TICK_RATE, TickConfig};

/// Runtime configuration. Every flag falls back to an `ENGINE_*` variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "engine_app", about = "ECS simulation fed by a UDP event stream")]
pub struct AppConfig {
    /// Address the UDP transport binds to
    #[arg(long, env = "ENGINE_BIND_ADDR", default_value = "0.0.0.0:7777")]
    pub bind_addr: SocketAddr,

    /// Target ticks per second
    #[arg(long, env = "ENGINE_TICK_RATE", default_value_t = 60.0)]
    pub tick_rate: f64,

    /// Stop after this many ticks (0 = run until interrupted)
    #[arg(long, env = "ENGINE_MAX_TICKS", default_value_t = 0)]
    pub max_ticks: u64,

    /// Cap on partially received multi-packet messages
    #[arg(long, env = "ENGINE_MAX_PENDING_FRAGMENTS", default_value_t = DEFAULT_MAX_PENDING)]
    pub max_pending_fragments: usize,

    /// Largest packet count accepted for one multi-packet message
    #[arg(long, env = "ENGINE_MAX_FRAGMENTS", default_value_t = DEFAULT_MAX_FRAGMENTS)]
    pub max_fragments: u16,

    /// Payload bytes buffered across all incomplete messages
    #[arg(long, env = "ENGINE_MAX_REASSEMBLY_BYTES", default_value_t = DEFAULT_MAX_BUFFERED_BYTES)]
    pub max_reassembly_bytes: usize,
}

impl AppConfig {
    /// Reject values the tick loop or transport cannot work with.
    ///
    /// # Errors
    ///
    /// Returns an error naming the offending setting.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            (MIN_TICK_RATE..=MAX_TICK_RATE).contains(&self.tick_rate),
            "tick rate must be between {MIN_TICK_RATE} and {MAX_TICK_RATE}, got {}",
            self.tick_rate
        );
        ensure!(
            self.max_pending_fragments > 0,
            "max pending fragments must be at least 1"
        );
        ensure!(self.max_fragments >= 2, "max fragments must be at least 2");
        ensure!(
            self.max_reassembly_bytes > 0,
            "max reassembly bytes must be at least 1"
        );
        Ok(())
    }

    /// The tick loop's share of the configuration.
    #[must_use]
    pub fn tick_config(&self) -> TickConfig {
        TickConfig {
            tick_rate: self.tick_rate,
            max_ticks: self.max_ticks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::try_parse_from(["engine_app"]).unwrap();
        assert_eq!(config.bind_addr, "0.0.0.0:7777".parse::<SocketAddr>().unwrap());
        assert_eq!(config.max_pending_fragments, DEFAULT_MAX_PENDING);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_flags_override() {
        let config = AppConfig::try_parse_from([
            "engine_app",
            "--bind-addr",
            "127.0.0.1:9000",
            "--tick-rate",
            "30",
            "--max-ticks",
            "10",
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.tick_config().tick_rate, 30.0);
        assert_eq!(config.tick_config().max_ticks, 10);
    }

    #[test]
    fn test_invalid_tick_rate_rejected() {
        let config = AppConfig::try_parse_from(["engine_app", "--tick-rate", "0"]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tick rate"));
    }

    #[test]
    fn test_out_of_range_tick_rates_rejected() {
        for rate in ["1e-320", "NaN", "inf", "-5", "0", "1e9"] {
            let flag = format!("--tick-rate={rate}");
            let config = AppConfig::try_parse_from(["engine_app", flag.as_str()]).unwrap();
            assert!(config.validate().is_err(), "accepted tick rate {rate}");
        }
    }

    #[test]
    fn test_fragment_limits_validated() {
        let config = AppConfig::try_parse_from(["engine_app", "--max-fragments", "1"]).unwrap();
        assert!(config.validate().is_err());
        let config =
            AppConfig::try_parse_from(["engine_app", "--max-reassembly-bytes", "0"]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unparseable_address_rejected() {
        assert!(AppConfig::try_parse_from(["engine_app", "--bind-addr", "nowhere"]).is_err());
    }
}
