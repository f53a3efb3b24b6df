//! Server configuration
//!
//! All settings can be overridden through environment variables (a `.env`
//! file is honored):
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | VENUE_TZ | America/El_Salvador | Business timezone for closures |
//! | ORDER_NUMBER_START | 1 | Floor for order numbering |
//! | TICKET_NUMBER_START | 1 | Floor for ticket numbering |
//! | ALLOCATOR_MAX_RETRIES | 5 | Counter allocator retry budget |
//! | LOG_LEVEL | info | Tracing level |
//! | LOG_DIR | (unset) | Daily-rotated log directory |

use chrono_tz::Tz;

#[derive(Debug, Clone)]
pub struct Config {
    /// Business timezone; closure dates are calendar days in this zone
    pub venue_tz: Tz,
    /// Configured starting order number (floor, not reset)
    pub order_number_start: i64,
    /// Configured starting ticket number
    pub ticket_number_start: i64,
    /// Retry budget of the counter-based sequence allocator
    pub allocator_max_retries: u32,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self {
            venue_tz: std::env::var("VENUE_TZ")
                .ok()
                .and_then(|tz| tz.parse().ok())
                .unwrap_or(chrono_tz::America::El_Salvador),
            order_number_start: std::env::var("ORDER_NUMBER_START")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            ticket_number_start: std::env::var("TICKET_NUMBER_START")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1),
            allocator_max_retries: std::env::var("ALLOCATOR_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            venue_tz: chrono_tz::America::El_Salvador,
            order_number_start: 1,
            ticket_number_start: 1,
            allocator_max_retries: 5,
            log_level: "info".into(),
            log_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.venue_tz, chrono_tz::America::El_Salvador);
        assert_eq!(config.order_number_start, 1);
        assert_eq!(config.ticket_number_start, 1);
        assert_eq!(config.allocator_max_retries, 5);
    }
}
