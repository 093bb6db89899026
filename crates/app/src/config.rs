//! Application configuration loaded from environment variables.

use cart::Money;

/// Storefront configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `FALLBACK_SHIPPING_PAISE` — flat charge applied when the shipping
///   rate service is unavailable (default: `10000`, i.e. ₹100)
/// - `RUST_LOG` — tracing filter directive (default: `"info"`)
#[derive(Debug, Clone)]
pub struct Config {
    pub fallback_shipping_paise: i64,
    pub log_level: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            fallback_shipping_paise: std::env::var("FALLBACK_SHIPPING_PAISE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10000),
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        }
    }

    /// The fallback shipping charge as money.
    pub fn fallback_shipping(&self) -> Money {
        Money::from_paise(self.fallback_shipping_paise)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fallback_shipping_paise: 10000,
            log_level: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.fallback_shipping_paise, 10000);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_fallback_shipping_money() {
        let config = Config {
            fallback_shipping_paise: 15000,
            log_level: "debug".to_string(),
        };
        assert_eq!(config.fallback_shipping(), Money::from_rupees(150));
    }
}
