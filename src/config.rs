//! Configuration for Herald
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Herald - topic-addressed alert notification gateway
#[derive(Parser, Debug, Clone)]
#[command(name = "herald")]
#[command(about = "Topic-addressed alert notification gateway")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "herald")]
    pub mongodb_db: String,

    /// Public URL of this instance, used to derive cached topic API
    /// endpoints (e.g. "https://alerts.example.com")
    #[arg(long, env = "PUBLIC_URL", default_value = "http://localhost:8080")]
    pub public_url: String,

    /// Enable development mode (in-memory store fallback, local feed session)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Buffer size of the notification feed broadcast channel
    #[arg(long, env = "FEED_CAPACITY", default_value = "100")]
    pub feed_capacity: usize,
}

impl Args {
    /// Public URL without a trailing slash
    pub fn base_url(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }

    /// Validate configuration
    pub fn validate(&self) -> std::result::Result<(), String> {
        if !self.public_url.starts_with("http://") && !self.public_url.starts_with("https://") {
            return Err("PUBLIC_URL must be an http(s) URL".to_string());
        }

        if self.feed_capacity == 0 {
            return Err("FEED_CAPACITY must be greater than zero".to_string());
        }

        Ok(())
    }

    /// Fixed configuration for unit tests
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            node_id: Uuid::nil(),
            listen: "127.0.0.1:0".parse().unwrap(),
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            mongodb_db: "herald-test".to_string(),
            public_url: "http://localhost:8080".to_string(),
            dev_mode: true,
            log_level: "debug".to_string(),
            feed_capacity: 16,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let mut args = Args::for_tests();
        args.public_url = "http://localhost:8080/".to_string();
        assert_eq!(args.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_validate_rejects_non_http_public_url() {
        let mut args = Args::for_tests();
        args.public_url = "localhost:8080".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_feed_capacity() {
        let mut args = Args::for_tests();
        args.feed_capacity = 0;
        assert!(args.validate().is_err());
    }
}
