use crate::cache::disk::DiskCache;
use crate::cache::memory::InMemoryCache;
use crate::cache::FlagCache;
use crate::constants::{
    default_backup_dir, default_base_url, DEFAULT_ANALYTICS_INTERVAL_SECS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_REFRESH_INTERVAL_SECS,
};
use crate::errors::{ClientError, ErrorKind};
use crate::modes::PollingMode;
use crate::options::Options;
use crate::user::{UserContext, UserContextProvider};
use crate::Client;
use std::sync::Arc;
use std::time::Duration;

/// Builder to create a FeaturIT [`Client`].
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use featurit::{ClientBuilder, PollingMode, UserContext};
///
/// #[tokio::main]
/// async fn main() {
///     let client = ClientBuilder::new("my-tenant", "api-key")
///         .polling_mode(PollingMode::AutoPoll(Duration::from_secs(60)))
///         .user_context(UserContext::new().user_id("1234"))
///         .build()
///         .unwrap();
/// }
/// ```
pub struct ClientBuilder {
    tenant: String,
    api_key: String,
    base_url: Option<String>,
    http_timeout: Option<Duration>,
    polling_mode: Option<PollingMode>,
    cache_ttl: Option<Duration>,
    cache: Option<Arc<dyn FlagCache>>,
    backup_cache: Option<Arc<dyn FlagCache>>,
    user_context: Option<UserContext>,
    user_context_provider: Option<Arc<dyn UserContextProvider>>,
    analytics: bool,
    analytics_interval: Option<Duration>,
    offline: bool,
}

impl ClientBuilder {
    /// Starts a builder for the given tenant identifier and backend API key.
    pub fn new(tenant: &str, api_key: &str) -> Self {
        Self {
            tenant: tenant.to_owned(),
            api_key: api_key.to_owned(),
            base_url: None,
            http_timeout: None,
            polling_mode: None,
            cache_ttl: None,
            cache: None,
            backup_cache: None,
            user_context: None,
            user_context_provider: None,
            analytics: false,
            analytics_interval: None,
            offline: false,
        }
    }

    /// Indicates whether the client should start in offline mode, working only from its caches.
    /// Default value is `false`.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    /// Sets the HTTP request timeout.
    /// Default value is `30` seconds.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use featurit::ClientBuilder;
    ///
    /// let builder = ClientBuilder::new("tenant", "api-key")
    ///     .http_timeout(Duration::from_secs(5));
    /// ```
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    /// Overrides the API base URL, `https://{tenant}.featurit.com/api/v1/{api_key}` by default.
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_owned());
        self
    }

    /// Sets the [`PollingMode`].
    /// Default value is [`PollingMode::AutoPoll`] with a `5` minute interval.
    pub fn polling_mode(mut self, polling_mode: PollingMode) -> Self {
        self.polling_mode = Some(polling_mode);
        self
    }

    /// Sets how long a fetched catalogue stays fresh in the main cache.
    /// Defaults to the auto poll interval, or `5` minutes in [`PollingMode::Manual`].
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Sets the main [`FlagCache`]. Default is an [`InMemoryCache`].
    ///
    /// # Examples
    ///
    /// ```rust
    /// use std::time::Duration;
    /// use std::sync::Arc;
    /// use featurit::{ClientBuilder, FlagCache};
    ///
    /// struct CustomCache {}
    ///
    /// impl FlagCache for CustomCache {
    ///     fn get(&self, key: &str) -> Option<String> {
    ///         // read from storage
    ///         None
    ///     }
    ///
    ///     fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
    ///         // write to storage
    ///     }
    ///
    ///     fn remove(&self, key: &str) {
    ///         // remove from storage
    ///     }
    /// }
    ///
    /// let builder = ClientBuilder::new("tenant", "api-key")
    ///     .cache(Arc::new(CustomCache {}));
    /// ```
    pub fn cache(mut self, cache: Arc<dyn FlagCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the [`FlagCache`] holding the last fetched catalogue, used when fetching fails.
    /// Defaults to a [`DiskCache`] in a per-tenant directory under the system temp dir,
    /// so the copy survives restarts.
    pub fn backup_cache(mut self, cache: Arc<dyn FlagCache>) -> Self {
        self.backup_cache = Some(cache);
        self
    }

    /// Sets the [`UserContext`] flags are resolved for. Takes precedence over
    /// [`ClientBuilder::user_context_provider`].
    pub fn user_context(mut self, ctx: UserContext) -> Self {
        self.user_context = Some(ctx);
        self
    }

    /// Sets a [`UserContextProvider`] asked for the current [`UserContext`] on every resolution.
    pub fn user_context_provider(mut self, provider: Arc<dyn UserContextProvider>) -> Self {
        self.user_context_provider = Some(provider);
        self
    }

    /// Enables collecting and sending usage analytics.
    /// Default value is `false`.
    pub fn analytics(mut self, enabled: bool) -> Self {
        self.analytics = enabled;
        self
    }

    /// Sets how often collected analytics are sent.
    /// Default value is `1` minute.
    pub fn analytics_interval(mut self, interval: Duration) -> Self {
        self.analytics_interval = Some(interval);
        self
    }

    /// Creates a [`Client`] from the configuration made on the builder.
    ///
    /// Background tasks are spawned onto the current tokio runtime, so this must be
    /// called from within one unless polling is [`PollingMode::Manual`] and analytics are off.
    ///
    /// # Errors
    ///
    /// This method fails if the tenant identifier or the API key is empty, or when the
    /// underlying HTTP client can't be initialized.
    pub fn build(self) -> Result<Client, ClientError> {
        if self.tenant.trim().is_empty() {
            return Err(ClientError::new(
                ErrorKind::InvalidTenant,
                "Tenant identifier cannot be empty".to_owned(),
            ));
        }
        if self.api_key.trim().is_empty() {
            return Err(ClientError::new(
                ErrorKind::InvalidApiKey,
                "API key cannot be empty".to_owned(),
            ));
        }
        Client::with_options(self.build_options())
    }

    pub(crate) fn build_options(self) -> Options {
        let polling_mode = match self.polling_mode.unwrap_or_default() {
            PollingMode::AutoPoll(interval) if interval.is_zero() => PollingMode::default(),
            mode => mode,
        };
        let cache_ttl = self.cache_ttl.unwrap_or(match polling_mode {
            PollingMode::AutoPoll(interval) => interval,
            PollingMode::Manual => Duration::from_secs(DEFAULT_REFRESH_INTERVAL_SECS),
        });
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(InMemoryCache::new()));
        Options {
            base_url: self
                .base_url
                .unwrap_or_else(|| default_base_url(&self.tenant, &self.api_key)),
            http_timeout: self
                .http_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS)),
            polling_mode,
            cache_ttl,
            backup_cache: self
                .backup_cache
                .unwrap_or_else(|| Arc::new(DiskCache::new(default_backup_dir(&self.tenant)))),
            cache,
            user_context: self.user_context,
            user_context_provider: self.user_context_provider,
            analytics: self.analytics,
            analytics_interval: self
                .analytics_interval
                .filter(|interval| !interval.is_zero())
                .unwrap_or(Duration::from_secs(DEFAULT_ANALYTICS_INTERVAL_SECS)),
            offline: self.offline,
        }
    }
}

#[cfg(test)]
mod builder_tests {
    use crate::{ClientBuilder, ErrorKind, FlagCache, PollingMode, UserContext, UserContextProvider};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn defaults() {
        let opts = ClientBuilder::new("acme", "secret").build_options();

        assert_eq!(opts.base_url, "https://acme.featurit.com/api/v1/secret");
        assert_eq!(opts.http_timeout, Duration::from_secs(30));
        assert_eq!(opts.polling_mode, PollingMode::AutoPoll(Duration::from_secs(300)));
        assert_eq!(opts.cache_ttl, Duration::from_secs(300));
        assert_eq!(opts.analytics_interval, Duration::from_secs(60));
        assert!(!opts.analytics);
        assert!(!opts.offline);
        assert!(!Arc::ptr_eq(&opts.cache, &opts.backup_cache));
    }

    #[test]
    fn default_backup_is_on_disk_per_tenant() {
        let acme = ClientBuilder::new("acme", "secret").build_options();
        let other = ClientBuilder::new("other", "secret").build_options();

        acme.backup_cache().set("k", "acme", None);
        assert_eq!(acme.backup_cache().get("k").as_deref(), Some("acme"));
        assert_eq!(other.backup_cache().get("k"), None);
        assert_eq!(acme.cache().get("k"), None);

        // a fresh client for the same tenant finds the copy
        let again = ClientBuilder::new("acme", "secret").build_options();
        assert_eq!(again.backup_cache().get("k").as_deref(), Some("acme"));

        acme.backup_cache().remove("k");
    }

    #[test]
    fn cache_ttl_follows_poll_interval() {
        let opts = ClientBuilder::new("acme", "secret")
            .polling_mode(PollingMode::AutoPoll(Duration::from_secs(42)))
            .build_options();
        assert_eq!(opts.cache_ttl, Duration::from_secs(42));

        let opts = ClientBuilder::new("acme", "secret")
            .polling_mode(PollingMode::Manual)
            .build_options();
        assert_eq!(opts.cache_ttl, Duration::from_secs(300));

        let opts = ClientBuilder::new("acme", "secret")
            .cache_ttl(Duration::from_secs(7))
            .build_options();
        assert_eq!(opts.cache_ttl, Duration::from_secs(7));
    }

    #[test]
    fn zero_intervals_fall_back_to_defaults() {
        let opts = ClientBuilder::new("acme", "secret")
            .polling_mode(PollingMode::AutoPoll(Duration::ZERO))
            .analytics_interval(Duration::ZERO)
            .build_options();
        assert_eq!(opts.polling_mode, PollingMode::AutoPoll(Duration::from_secs(300)));
        assert_eq!(opts.analytics_interval, Duration::from_secs(60));
    }

    #[test]
    fn context_wins_over_provider() {
        struct Fixed;
        impl UserContextProvider for Fixed {
            fn user_context(&self) -> UserContext {
                UserContext::new().user_id("from-provider")
            }
        }

        let opts = ClientBuilder::new("acme", "secret")
            .user_context_provider(Arc::new(Fixed))
            .build_options();
        assert_eq!(
            opts.initial_context_provider().user_context().get_user_id(),
            Some("from-provider")
        );

        let opts = ClientBuilder::new("acme", "secret")
            .user_context_provider(Arc::new(Fixed))
            .user_context(UserContext::new().user_id("explicit"))
            .build_options();
        assert_eq!(
            opts.initial_context_provider().user_context().get_user_id(),
            Some("explicit")
        );
    }

    #[test]
    fn empty_credentials() {
        let err = ClientBuilder::new("", "secret").build().err().unwrap();
        assert_eq!(err.kind, ErrorKind::InvalidTenant);
        assert_eq!(err.to_string(), "Tenant identifier cannot be empty");

        let err = ClientBuilder::new("acme", " ").build().err().unwrap();
        assert_eq!(err.kind, ErrorKind::InvalidApiKey);
        assert_eq!(err.to_string(), "API key cannot be empty");
    }
}
