use crate::constants::{
    DEFAULT_APP_VERSION, DEFAULT_BASE_URL, DEFAULT_BUILD_NUMBER, DEFAULT_DEVICE_ID,
    DEFAULT_DEVICE_MANUFACTURER, DEFAULT_DEVICE_MODEL, DEFAULT_INSTALL_ID, DEFAULT_MEDIA_URL,
    DEFAULT_OS_VERSION, DEFAULT_OS_VERSION_CODE, DEFAULT_USER_AGENT,
};
use serde::Deserialize;
use std::env;
use std::fmt;
use std::fmt::Debug;
use std::str::FromStr;
use tracing::error;

/// Caller identity used for login. The phone number receives the one-time
/// passcode; device and install ids must stay stable across sessions or the
/// provider treats the login as a new device.
#[derive(Debug, Deserialize, Clone)]
pub struct Identity {
    pub phone_number: String,
    pub device_id: String,
    pub install_id: String,
}

/// Device fingerprint sent with every request.
#[derive(Debug, Deserialize, Clone)]
pub struct DeviceProfile {
    pub app_version: String,
    pub os_version: String,
    pub os_version_code: String,
    pub device_model: String,
    pub device_manufacturer: String,
    pub build_number: String,
    pub user_agent: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RestApiConfig {
    pub base_url: String,
    pub timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MediaApiConfig {
    pub base_url: String,
    pub timeout: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScrapeConfig {
    pub max_iterations: usize,
    pub min_sleep_secs: f64,
    pub max_sleep_secs: f64,
    /// Consecutive batches at or below `novelty_threshold` before the feed
    /// counts as exhausted. The provider stops serving fresh profiles after a
    /// few hundred without rating activity, so this stays small.
    pub stale_batch_limit: usize,
    pub novelty_threshold: usize,
    pub retry_attempts: u32,
    pub retry_base_ms: u64,
    pub active_today: bool,
    pub new_here: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DownloadConfig {
    pub max_concurrency: usize,
    pub max_attempts: u32,
    pub retry_base_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub profiles_path: String,
    pub csv_path: String,
    pub media_dir: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub identity: Identity,
    pub device: DeviceProfile,
    pub rest_api: RestApiConfig,
    pub media_api: MediaApiConfig,
    pub scrape: ScrapeConfig,
    pub download: DownloadConfig,
    pub output: OutputConfig,
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"phone_number\":\"[REDACTED]\",\"device_id\":\"{}\",\"install_id\":\"{}\"}}",
            self.device_id, self.install_id
        )
    }
}

impl fmt::Display for DeviceProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"app_version\":\"{}\",\"os_version\":\"{}\",\"os_version_code\":\"{}\",\"device_model\":\"{}\",\"device_manufacturer\":\"{}\",\"build_number\":\"{}\",\"user_agent\":\"{}\"}}",
            self.app_version,
            self.os_version,
            self.os_version_code,
            self.device_model,
            self.device_manufacturer,
            self.build_number,
            self.user_agent
        )
    }
}

impl fmt::Display for RestApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"base_url\":\"{}\",\"timeout\":{}}}",
            self.base_url, self.timeout
        )
    }
}

impl fmt::Display for MediaApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"base_url\":\"{}\",\"timeout\":{}}}",
            self.base_url, self.timeout
        )
    }
}

impl fmt::Display for ScrapeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"max_iterations\":{},\"min_sleep_secs\":{},\"max_sleep_secs\":{},\"stale_batch_limit\":{},\"novelty_threshold\":{},\"retry_attempts\":{},\"retry_base_ms\":{},\"active_today\":{},\"new_here\":{}}}",
            self.max_iterations,
            self.min_sleep_secs,
            self.max_sleep_secs,
            self.stale_batch_limit,
            self.novelty_threshold,
            self.retry_attempts,
            self.retry_base_ms,
            self.active_today,
            self.new_here
        )
    }
}

impl fmt::Display for DownloadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"max_concurrency\":{},\"max_attempts\":{},\"retry_base_ms\":{}}}",
            self.max_concurrency, self.max_attempts, self.retry_base_ms
        )
    }
}

impl fmt::Display for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"profiles_path\":\"{}\",\"csv_path\":\"{}\",\"media_dir\":\"{}\"}}",
            self.profiles_path, self.csv_path, self.media_dir
        )
    }
}

impl fmt::Display for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{\"identity\":{},\"device\":{},\"rest_api\":{},\"media_api\":{},\"scrape\":{},\"download\":{},\"output\":{}}}",
            self.identity,
            self.device,
            self.rest_api,
            self.media_api,
            self.scrape,
            self.download,
            self.output
        )
    }
}

pub fn get_env_or_default<T: FromStr>(env_var: &str, default: T) -> T
where
    <T as FromStr>::Err: Debug,
{
    match env::var(env_var) {
        Ok(val) => val.parse::<T>().unwrap_or_else(|_| {
            error!("Failed to parse {}: {}, using default", env_var, val);
            default
        }),
        Err(_) => default,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Config {
            identity: Identity {
                phone_number: get_env_or_default("HINGE_PHONE_NUMBER", String::new()),
                device_id: get_env_or_default("HINGE_DEVICE_ID", String::from(DEFAULT_DEVICE_ID)),
                install_id: get_env_or_default(
                    "HINGE_INSTALL_ID",
                    String::from(DEFAULT_INSTALL_ID),
                ),
            },
            device: DeviceProfile {
                app_version: get_env_or_default(
                    "HINGE_APP_VERSION",
                    String::from(DEFAULT_APP_VERSION),
                ),
                os_version: get_env_or_default(
                    "HINGE_OS_VERSION",
                    String::from(DEFAULT_OS_VERSION),
                ),
                os_version_code: get_env_or_default(
                    "HINGE_OS_VERSION_CODE",
                    String::from(DEFAULT_OS_VERSION_CODE),
                ),
                device_model: get_env_or_default(
                    "HINGE_DEVICE_MODEL",
                    String::from(DEFAULT_DEVICE_MODEL),
                ),
                device_manufacturer: get_env_or_default(
                    "HINGE_DEVICE_MANUFACTURER",
                    String::from(DEFAULT_DEVICE_MANUFACTURER),
                ),
                build_number: get_env_or_default(
                    "HINGE_BUILD_NUMBER",
                    String::from(DEFAULT_BUILD_NUMBER),
                ),
                user_agent: get_env_or_default(
                    "HINGE_USER_AGENT",
                    String::from(DEFAULT_USER_AGENT),
                ),
            },
            rest_api: RestApiConfig {
                base_url: get_env_or_default(
                    "HINGE_REST_BASE_URL",
                    String::from(DEFAULT_BASE_URL),
                ),
                timeout: get_env_or_default("HINGE_REST_TIMEOUT", 30),
            },
            media_api: MediaApiConfig {
                base_url: get_env_or_default(
                    "HINGE_MEDIA_BASE_URL",
                    String::from(DEFAULT_MEDIA_URL),
                ),
                timeout: get_env_or_default("HINGE_MEDIA_TIMEOUT", 30),
            },
            scrape: ScrapeConfig {
                max_iterations: get_env_or_default("HINGE_SCRAPE_MAX_ITERATIONS", 50),
                min_sleep_secs: get_env_or_default("HINGE_SCRAPE_MIN_SLEEP_SECS", 2.0),
                max_sleep_secs: get_env_or_default("HINGE_SCRAPE_MAX_SLEEP_SECS", 8.0),
                stale_batch_limit: get_env_or_default("HINGE_SCRAPE_STALE_BATCH_LIMIT", 3),
                novelty_threshold: get_env_or_default("HINGE_SCRAPE_NOVELTY_THRESHOLD", 0),
                retry_attempts: get_env_or_default("HINGE_SCRAPE_RETRY_ATTEMPTS", 3),
                retry_base_ms: get_env_or_default("HINGE_SCRAPE_RETRY_BASE_MS", 500),
                active_today: get_env_or_default("HINGE_SCRAPE_ACTIVE_TODAY", false),
                new_here: get_env_or_default("HINGE_SCRAPE_NEW_HERE", false),
            },
            download: DownloadConfig {
                max_concurrency: get_env_or_default("HINGE_DOWNLOAD_MAX_CONCURRENCY", 4),
                max_attempts: get_env_or_default("HINGE_DOWNLOAD_MAX_ATTEMPTS", 3),
                retry_base_ms: get_env_or_default("HINGE_DOWNLOAD_RETRY_BASE_MS", 500),
            },
            output: OutputConfig {
                profiles_path: get_env_or_default(
                    "HINGE_OUTPUT_PROFILES_PATH",
                    String::from("hinge_profiles.json"),
                ),
                csv_path: get_env_or_default(
                    "HINGE_OUTPUT_CSV_PATH",
                    String::from("hinge_profiles.csv"),
                ),
                media_dir: get_env_or_default("HINGE_OUTPUT_MEDIA_DIR", String::from("output")),
            },
        }
    }
}
