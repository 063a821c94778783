pub mod analysis;
pub mod domain;
pub mod market_data;
pub mod report;
pub mod service;
pub mod time;

pub mod config {
    use anyhow::Context;
    use std::str::FromStr;

    const DEFAULT_POLYGON_BASE_URL: &str = "https://api.polygon.io";
    const DEFAULT_ALPHA_VANTAGE_BASE_URL: &str = "https://www.alphavantage.co";
    const DEFAULT_TIMEOUT_SECS: u64 = 30;
    const DEFAULT_RETRIES: u32 = 3;
    const DEFAULT_LOOKBACK_DAYS: i64 = 14;
    const MAX_LOOKBACK_DAYS: i64 = 3650;
    const DEFAULT_MAX_PEERS: usize = 10;
    const DEFAULT_REQ_DELAY_MS: u64 = 150;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum ProviderKind {
        Polygon,
        AlphaVantage,
    }

    impl FromStr for ProviderKind {
        type Err = anyhow::Error;

        fn from_str(s: &str) -> Result<Self, Self::Err> {
            match s.trim().to_ascii_lowercase().as_str() {
                "polygon" => Ok(ProviderKind::Polygon),
                "alpha" | "alpha_vantage" | "alphavantage" => Ok(ProviderKind::AlphaVantage),
                other => anyhow::bail!("unknown market data provider: {other}"),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub provider: ProviderKind,
        pub polygon_api_key: Option<String>,
        pub polygon_base_url: String,
        pub alpha_vantage_api_key: Option<String>,
        pub alpha_vantage_base_url: String,
        pub timeout_secs: u64,
        pub retries: u32,
        pub lookback_days: i64,
        pub max_peers: usize,
        pub req_delay_ms: u64,
        pub sentry_dsn: Option<String>,
    }

    impl Default for Settings {
        fn default() -> Self {
            Self {
                provider: ProviderKind::Polygon,
                polygon_api_key: None,
                polygon_base_url: DEFAULT_POLYGON_BASE_URL.to_string(),
                alpha_vantage_api_key: None,
                alpha_vantage_base_url: DEFAULT_ALPHA_VANTAGE_BASE_URL.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
                retries: DEFAULT_RETRIES,
                lookback_days: DEFAULT_LOOKBACK_DAYS,
                max_peers: DEFAULT_MAX_PEERS,
                req_delay_ms: DEFAULT_REQ_DELAY_MS,
                sentry_dsn: None,
            }
        }
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_env_with_provider(None)
        }

        /// Like [`Settings::from_env`], but an explicit `provider` wins over
        /// `MARKET_DATA_PROVIDER`, which is then not parsed at all.
        pub fn from_env_with_provider(provider: Option<ProviderKind>) -> anyhow::Result<Self> {
            let defaults = Self::default();
            let provider =
                resolve_provider(provider, non_empty_var("MARKET_DATA_PROVIDER"), defaults.provider)?;

            Ok(Self {
                provider,
                polygon_api_key: non_empty_var("POLYGON_API_KEY"),
                polygon_base_url: non_empty_var("POLYGON_BASE_URL")
                    .unwrap_or(defaults.polygon_base_url),
                alpha_vantage_api_key: non_empty_var("ALPHA_VANTAGE_API_KEY"),
                alpha_vantage_base_url: non_empty_var("ALPHA_VANTAGE_BASE_URL")
                    .unwrap_or(defaults.alpha_vantage_base_url),
                timeout_secs: parsed_var("MARKET_DATA_TIMEOUT_SECS").unwrap_or(defaults.timeout_secs),
                retries: parsed_var("MARKET_DATA_RETRIES").unwrap_or(defaults.retries),
                lookback_days: parsed_var("MARKET_DATA_LOOKBACK_DAYS")
                    .filter(|d| (0..=MAX_LOOKBACK_DAYS).contains(d))
                    .unwrap_or(defaults.lookback_days),
                max_peers: parsed_var("MARKET_DATA_MAX_PEERS").unwrap_or(defaults.max_peers),
                req_delay_ms: parsed_var("MARKET_DATA_REQ_DELAY_MS")
                    .unwrap_or(defaults.req_delay_ms),
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_polygon_api_key(&self) -> anyhow::Result<&str> {
            self.polygon_api_key
                .as_deref()
                .context("POLYGON_API_KEY is required")
        }

        pub fn require_alpha_vantage_api_key(&self) -> anyhow::Result<&str> {
            self.alpha_vantage_api_key
                .as_deref()
                .context("ALPHA_VANTAGE_API_KEY is required")
        }
    }

    fn resolve_provider(
        explicit: Option<ProviderKind>,
        from_env: Option<String>,
        default: ProviderKind,
    ) -> anyhow::Result<ProviderKind> {
        match (explicit, from_env) {
            (Some(kind), _) => Ok(kind),
            (None, Some(v)) => v.parse().context("invalid MARKET_DATA_PROVIDER"),
            (None, None) => Ok(default),
        }
    }

    fn non_empty_var(key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|s| !s.trim().is_empty())
    }

    fn parsed_var<T: FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse::<T>().ok())
    }

}
