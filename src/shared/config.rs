//! Application configuration. Registry endpoint, API key, paths, pacing.

use serde::Deserialize;

/// Default delay between dependent registry calls, in milliseconds.
pub const DEFAULT_PACE_DELAY_MS: u64 = 200;

/// Default page size for profile-store scans.
pub const DEFAULT_SCAN_PAGE_SIZE: u32 = 100;

const DEFAULT_API_BASE_URL: &str = "https://api.company-information.service.gov.uk";

#[derive(Debug, Deserialize, Default)]
pub struct AppConfig {
    /// Registry API base URL. Read from CH_SYNC_API_BASE_URL.
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Registry API key, sent as basic-auth username. Read from CH_SYNC_API_KEY.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base directory for the SQLite stores and archived documents. Read from CH_SYNC_DATA_DIR.
    #[serde(default)]
    pub data_dir: Option<String>,

    /// Delay in ms before each dependent registry call (rate limiting). Read from CH_SYNC_PACE_DELAY_MS.
    #[serde(default)]
    pub pace_delay_ms: Option<u64>,

    /// Page size for profile-store scans. Read from CH_SYNC_SCAN_PAGE_SIZE.
    #[serde(default)]
    pub scan_page_size: Option<u32>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        let mut c = config::Config::builder();
        c = c.add_source(config::Environment::with_prefix("CH_SYNC"));
        if let Ok(path) = std::env::var("CH_SYNC_CONFIG") {
            c = c.add_source(config::File::with_name(&path));
        }
        let cfg: Self = c.build()?.try_deserialize()?;
        Ok(cfg)
    }

    /// Returns the registry base URL. Defaults to the public Companies House API.
    pub fn api_base_url_or_default(&self) -> String {
        self.api_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
    }

    /// Returns the API key if configured. Reads from config or CH_SYNC_API_KEY env.
    pub fn api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("CH_SYNC_API_KEY").ok())
    }

    /// Returns the pacing delay in milliseconds. Defaults to 200 if unset.
    pub fn pace_delay_ms_or_default(&self) -> u64 {
        self.pace_delay_ms.unwrap_or(DEFAULT_PACE_DELAY_MS)
    }

    /// Returns the scan page size. Defaults to 100 if unset.
    pub fn scan_page_size_or_default(&self) -> u32 {
        self.scan_page_size.unwrap_or(DEFAULT_SCAN_PAGE_SIZE)
    }

    /// Returns the data directory. Defaults to ./data.
    pub fn data_dir_or_default(&self) -> String {
        self.data_dir.clone().unwrap_or_else(|| "./data".to_string())
    }
}
