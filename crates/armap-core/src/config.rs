use crate::app_config::{AppConfig, Environment, GpsPolicy};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        or_default(var, default)
            .parse::<SocketAddr>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        let raw = or_default(var, default);
        match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(invalid(var, format!("expected a boolean, got '{raw}'"))),
        }
    };

    let env = parse_environment(&or_default("ARMAP_ENV", "development"));
    let log_level = or_default("ARMAP_LOG_LEVEL", "info");
    let firms_csv_path = PathBuf::from(or_default(
        "ARMAP_FIRMS_CSV",
        "./data/company_leads_with_ars.csv",
    ));
    let bind_addr = parse_addr("ARMAP_BIND_ADDR", "0.0.0.0:3000")?;
    let map_output_path = PathBuf::from(or_default(
        "ARMAP_MAP_OUTPUT",
        "./company_locations_map.html",
    ));

    let geocoder_base_url = or_default("ARMAP_GEOCODER_BASE_URL", "https://api.postcodes.io");
    let geocoder_timeout_secs = parse_u64("ARMAP_GEOCODER_TIMEOUT_SECS", "10")?;
    let geocoder_cache = parse_bool("ARMAP_GEOCODER_CACHE", "true")?;
    let user_agent = or_default("ARMAP_USER_AGENT", "armap/0.1 (ar-visualiser)");
    let gps_raw = or_default("ARMAP_GPS_POLICY", "trust");
    let gps_policy = parse_gps_policy(&gps_raw).ok_or_else(|| {
        invalid(
            "ARMAP_GPS_POLICY",
            format!("expected 'trust' or 'validate', got '{gps_raw}'"),
        )
    })?;

    let register_base_url = or_default(
        "ARMAP_REGISTER_BASE_URL",
        "https://register.fca.org.uk/services/V0.1",
    );
    let register_auth_email = optional("ARMAP_REGISTER_AUTH_EMAIL");
    let register_auth_key = optional("ARMAP_REGISTER_AUTH_KEY");
    let harvest_max_concurrent = parse_usize("ARMAP_HARVEST_MAX_CONCURRENT", "4")?;
    let harvest_min_ar_count = parse_u32("ARMAP_HARVEST_MIN_AR_COUNT", "10")?;

    Ok(AppConfig {
        env,
        log_level,
        firms_csv_path,
        bind_addr,
        map_output_path,
        geocoder_base_url,
        geocoder_timeout_secs,
        geocoder_cache,
        user_agent,
        gps_policy,
        register_base_url,
        register_auth_email,
        register_auth_key,
        harvest_max_concurrent,
        harvest_min_ar_count,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_gps_policy(s: &str) -> Option<GpsPolicy> {
    match s.trim().to_ascii_lowercase().as_str() {
        "trust" => Some(GpsPolicy::Trust),
        "validate" => Some(GpsPolicy::Validate),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
