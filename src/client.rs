use crate::analytics::AnalyticsService;
use crate::builder::ClientBuilder;
use crate::constants::DEFAULT_VERSION;
use crate::errors::{ClientError, ErrorKind};
use crate::fetch::fetcher::Fetcher;
use crate::fetch::service::FlagService;
use crate::model::flag::{Flag, FlagCatalogue};
use crate::options::Options;
use crate::user::UserContext;
use log::warn;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

/// The main component for querying feature flags.
///
/// Flags are resolved for the client's [`UserContext`] whenever a catalogue is
/// obtained, so queries are cheap lookups in the resolved snapshot.
///
/// # Examples
///
/// ```no_run
/// use std::time::Duration;
/// use featurit::{Client, UserContext};
///
/// #[tokio::main]
/// async fn main() {
///     let client = Client::builder("my-tenant", "api-key")
///         .user_context(UserContext::new().user_id("1234"))
///         .build()
///         .unwrap();
///
///     client.wait_for_ready(Duration::from_secs(5)).await.unwrap();
///
///     if client.is_active("New Checkout") {
///         println!("version: {}", client.version("New Checkout"));
///     }
/// }
/// ```
pub struct Client {
    service: FlagService,
    analytics: Option<AnalyticsService>,
}

impl Client {
    pub(crate) fn with_options(options: Options) -> Result<Self, ClientError> {
        let opts = Arc::new(options);
        let fetcher = Arc::new(Fetcher::new(&opts.base_url, opts.http_timeout)?);
        let analytics = if opts.analytics {
            let service = AnalyticsService::new(Arc::clone(&opts.cache), Arc::clone(&fetcher));
            service.start(opts.analytics_interval);
            Some(service)
        } else {
            None
        };
        Ok(Self {
            service: FlagService::new(&opts, fetcher),
            analytics,
        })
    }

    /// Creates a new [`ClientBuilder`] used to build a [`Client`].
    pub fn builder(tenant: &str, api_key: &str) -> ClientBuilder {
        ClientBuilder::new(tenant, api_key)
    }

    /// Creates a new [`Client`] with default options.
    ///
    /// # Errors
    ///
    /// This method fails if the tenant identifier or the API key is empty.
    pub fn new(tenant: &str, api_key: &str) -> Result<Self, ClientError> {
        ClientBuilder::new(tenant, api_key).build()
    }

    /// Refreshes the feature flags: from the main cache while it's fresh, from the API
    /// otherwise.
    ///
    /// # Errors
    ///
    /// This method fails when the client is offline and the main cache holds no fresh
    /// catalogue, or when the HTTP request fails. In both cases the backup catalogue, when
    /// there is one, is resolved and put in use before the error is returned.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use featurit::Client;
    ///
    /// #[tokio::main]
    /// async fn main() {
    ///     let client = Client::new("my-tenant", "api-key").unwrap();
    ///
    ///     client.refresh().await.unwrap();
    /// }
    /// ```
    pub async fn refresh(&self) -> Result<(), ClientError> {
        self.service.refresh().await
    }

    /// Returns whether the flag named `name` is active for the current user context.
    ///
    /// Unknown flags are inactive. Queries are counted when analytics are enabled.
    pub fn is_active(&self, name: &str) -> bool {
        let snapshot = self.service.snapshot();
        match snapshot.resolved.get(name) {
            Some(flag) => {
                if let Some(analytics) = &self.analytics {
                    analytics.register(name, flag);
                }
                flag.active
            }
            None => false,
        }
    }

    /// Returns the name of the version selected for the flag named `name`, or
    /// [`DEFAULT_VERSION`] when the flag is unknown or no version was selected.
    pub fn version(&self, name: &str) -> String {
        self.service
            .snapshot()
            .resolved
            .get(name)
            .and_then(|flag| flag.selected_version.as_ref())
            .map(|version| version.name.clone())
            .unwrap_or_else(|| DEFAULT_VERSION.to_owned())
    }

    /// Returns the resolved flag named `name`.
    pub fn flag(&self, name: &str) -> Option<Flag> {
        self.service.snapshot().resolved.get(name).cloned()
    }

    /// Returns every resolved flag.
    pub fn all_flags(&self) -> FlagCatalogue {
        self.service.snapshot().resolved.clone()
    }

    /// Returns the [`UserContext`] flags are resolved for.
    pub fn user_context(&self) -> UserContext {
        self.service.user_context()
    }

    /// Replaces the [`UserContext`] (and any configured provider) and re-resolves the
    /// catalogue in use, without touching the network.
    pub fn set_user_context(&self, ctx: UserContext) {
        self.service.set_user_context(ctx);
    }

    /// Puts the [`Client`] into offline mode, where it works only from its caches.
    pub fn offline(&self) {
        self.service.set_offline(true);
    }

    /// Puts the [`Client`] into online mode.
    pub fn online(&self) {
        self.service.set_offline(false);
    }

    /// Returns `true` when the client is not allowed to initiate HTTP requests.
    pub fn is_offline(&self) -> bool {
        self.service.is_offline()
    }

    /// Sends the pending analytics right away. Does nothing when analytics are disabled.
    pub async fn flush_analytics(&self) {
        if let Some(analytics) = &self.analytics {
            analytics.flush().await;
        }
    }

    /// Asynchronously waits for the first refresh of the [`Client`] for a maximum duration
    /// specified in `wait_timeout`.
    ///
    /// # Errors
    ///
    /// This method fails if the first refresh takes longer than `wait_timeout`.
    pub async fn wait_for_ready(&self, wait_timeout: Duration) -> Result<(), ClientError> {
        match timeout(wait_timeout, self.service.wait_for_init()).await {
            Ok(()) => Ok(()),
            Err(_) => {
                let err = ClientError::new(
                    ErrorKind::ClientInitTimedOut,
                    format!(
                        "Client initialization timed out after {}ms.",
                        wait_timeout.as_millis()
                    ),
                );
                warn!(event_id = err.kind.as_u16(); "{}", err);
                Err(err)
            }
        }
    }

    /// Stops background polling and analytics. Dropping the client does the same.
    pub fn close(&self) {
        self.service.close();
        if let Some(analytics) = &self.analytics {
            analytics.close();
        }
    }
}
