//! Configuration management

use std::path::PathBuf;
use std::time::Duration;

/// Span of inactivity after which an open menu is removed.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(60);

/// Module entries shown per main-menu page.
pub const DEFAULT_PAGE_SIZE: usize = 9;

/// Help menu configuration
#[derive(Debug, Clone)]
pub struct HelpConfig {
    /// SQLite database path for menu state
    pub db_path: PathBuf,

    /// Idle span before an open menu is deleted
    pub idle_timeout: Duration,

    /// Module entries per main-menu page
    pub page_size: usize,
}

impl Default for HelpConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("help_menus.db"),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl HelpConfig {
    /// Load configuration from environment variables, falling back to the
    /// reference defaults.
    pub fn from_env() -> Self {
        let db_path = std::env::var("HELP_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("help_menus.db"));

        let idle_timeout = std::env::var("HELP_IDLE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_IDLE_TIMEOUT);

        let page_size = std::env::var("HELP_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_PAGE_SIZE);

        Self {
            db_path,
            idle_timeout,
            page_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_behavior() {
        let config = HelpConfig::default();
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert_eq!(config.page_size, 9);
    }
}
