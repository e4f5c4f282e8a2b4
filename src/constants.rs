use crate::utils::sha1;
use std::path::PathBuf;

/// Version of this SDK.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Version name reported when a flag has no selected version.
pub const DEFAULT_VERSION: &str = "default";

/// Cache key of the current, expiring catalogue.
pub const FEATURE_FLAGS_KEY: &str = "featureFlags";
/// Cache key of the never-expiring catalogue copy used when fetching fails.
pub const BACKUP_KEY: &str = "backup";
/// Cache key of the pending analytics bucket.
pub const ANALYTICS_KEY: &str = "analytics";

pub const USER_AGENT: &str = "FeaturIT";
pub const SDK_UA_HEADER: &str = "X-FeaturIT-SDK";
pub const FEATURE_FLAGS_PATH: &str = "feature-flags";
pub const ANALYTICS_PATH: &str = "analytics";
pub const CACHE_FILE_PREFIX: &str = "featurit";
/// Directory under the system temp dir holding the default backup caches, one per tenant.
pub const DEFAULT_CACHE_DIR: &str = "featurit";

pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 5 * 60;
pub const DEFAULT_ANALYTICS_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

pub fn default_base_url(tenant: &str, api_key: &str) -> String {
    format!("https://{tenant}.featurit.com/api/v1/{api_key}")
}

pub fn default_backup_dir(tenant: &str) -> PathBuf {
    std::env::temp_dir()
        .join(DEFAULT_CACHE_DIR)
        .join(sha1(tenant))
}
