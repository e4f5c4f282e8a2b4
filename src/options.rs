use crate::cache::FlagCache;
use crate::modes::PollingMode;
use crate::user::{UserContext, UserContextProvider};
use std::sync::Arc;
use std::time::Duration;

/// Immutable settings the [`crate::Client`] was built with.
pub(crate) struct Options {
    pub(crate) base_url: String,
    pub(crate) http_timeout: Duration,
    pub(crate) polling_mode: PollingMode,
    pub(crate) cache_ttl: Duration,
    pub(crate) cache: Arc<dyn FlagCache>,
    pub(crate) backup_cache: Arc<dyn FlagCache>,
    pub(crate) user_context: Option<UserContext>,
    pub(crate) user_context_provider: Option<Arc<dyn UserContextProvider>>,
    pub(crate) analytics: bool,
    pub(crate) analytics_interval: Duration,
    pub(crate) offline: bool,
}

impl Options {
    pub(crate) fn cache(&self) -> &dyn FlagCache {
        self.cache.as_ref()
    }

    pub(crate) fn backup_cache(&self) -> &dyn FlagCache {
        self.backup_cache.as_ref()
    }

    /// The context source resolution starts with; an explicit context wins over a provider.
    pub(crate) fn initial_context_provider(&self) -> Arc<dyn UserContextProvider> {
        match (&self.user_context, &self.user_context_provider) {
            (Some(ctx), _) => Arc::new(ctx.clone()),
            (None, Some(provider)) => Arc::clone(provider),
            (None, None) => Arc::new(UserContext::default()),
        }
    }
}
