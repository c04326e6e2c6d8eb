use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How GPS cells outside WGS84 bounds are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GpsPolicy {
    /// Plot as given, with a warning.
    #[default]
    Trust,
    /// Ignore the GPS pair and fall back to the postcode.
    Validate,
}

impl std::fmt::Display for GpsPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GpsPolicy::Trust => write!(f, "trust"),
            GpsPolicy::Validate => write!(f, "validate"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub log_level: String,
    pub firms_csv_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub map_output_path: PathBuf,
    pub geocoder_base_url: String,
    pub geocoder_timeout_secs: u64,
    pub geocoder_cache: bool,
    pub user_agent: String,
    pub gps_policy: GpsPolicy,
    pub register_base_url: String,
    pub register_auth_email: Option<String>,
    pub register_auth_key: Option<String>,
    pub harvest_max_concurrent: usize,
    pub harvest_min_ar_count: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("firms_csv_path", &self.firms_csv_path)
            .field("bind_addr", &self.bind_addr)
            .field("map_output_path", &self.map_output_path)
            .field("geocoder_base_url", &self.geocoder_base_url)
            .field("geocoder_timeout_secs", &self.geocoder_timeout_secs)
            .field("geocoder_cache", &self.geocoder_cache)
            .field("user_agent", &self.user_agent)
            .field("gps_policy", &self.gps_policy)
            .field("register_base_url", &self.register_base_url)
            .field("register_auth_email", &self.register_auth_email)
            .field(
                "register_auth_key",
                &self.register_auth_key.as_ref().map(|_| "[redacted]"),
            )
            .field("harvest_max_concurrent", &self.harvest_max_concurrent)
            .field("harvest_min_ar_count", &self.harvest_min_ar_count)
            .finish()
    }
}
