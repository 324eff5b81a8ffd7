use chrono::FixedOffset;

use sportsync_client::ClientConfig;
use sportsync_core::filter::SessionFilter;
use sportsync_core::quota::LimitMode;

/// Board configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct BoardConfig {
    pub client: ClientConfig,
    /// Which tab to render (default: `open`).
    pub filter: SessionFilter,
    /// Offset used for schedule fields that carry no timezone (default: UTC).
    pub utc_offset: FixedOffset,
    /// Treatment of unrecognized quota limits (default: `lenient`).
    pub limit_mode: LimitMode,
}

impl BoardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default   |
    /// |--------------------------------|-----------|
    /// | `SPORTSYNC_FILTER`             | `open`    |
    /// | `SPORTSYNC_UTC_OFFSET_MINUTES` | `0`       |
    /// | `SPORTSYNC_LIMIT_MODE`         | `lenient` |
    ///
    /// Client settings are read by [`ClientConfig::from_env`].
    pub fn from_env() -> Self {
        let client = ClientConfig::from_env();

        let filter: SessionFilter = std::env::var("SPORTSYNC_FILTER")
            .unwrap_or_else(|_| "open".into())
            .parse()
            .expect("SPORTSYNC_FILTER must be one of: all, open, finished, full");

        let offset_minutes: i32 = std::env::var("SPORTSYNC_UTC_OFFSET_MINUTES")
            .unwrap_or_else(|_| "0".into())
            .parse()
            .expect("SPORTSYNC_UTC_OFFSET_MINUTES must be a valid i32");
        let utc_offset = FixedOffset::east_opt(offset_minutes * 60)
            .expect("SPORTSYNC_UTC_OFFSET_MINUTES must be within +/- 24 hours");

        let limit_mode: LimitMode = std::env::var("SPORTSYNC_LIMIT_MODE")
            .unwrap_or_else(|_| "lenient".into())
            .parse()
            .expect("SPORTSYNC_LIMIT_MODE must be lenient or strict");

        Self {
            client,
            filter,
            utc_offset,
            limit_mode,
        }
    }
}
