use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Once, RwLock};
use std::time::Duration;

use arc_swap::ArcSwap;
use log::{debug, warn};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::cache::FlagCache;
use crate::constants::{BACKUP_KEY, FEATURE_FLAGS_KEY};
use crate::errors::ErrorKind::{CacheFailure, OfflineClient};
use crate::errors::{ClientError, ErrorKind};
use crate::eval::segmentation::SegmentationService;
use crate::fetch::fetcher::{FetchResponse, Fetcher};
use crate::model::flag::{catalogue_from_json, catalogue_to_json, FlagCatalogue};
use crate::modes::PollingMode;
use crate::options::Options;
use crate::user::{UserContext, UserContextProvider};

/// The catalogue in use: as obtained, and resolved for the current user context.
#[derive(Default)]
pub struct Snapshot {
    pub raw: Arc<FlagCatalogue>,
    pub resolved: FlagCatalogue,
}

struct ServiceState {
    fetcher: Arc<Fetcher>,
    options: Arc<Options>,
    segmentation: SegmentationService,
    snapshot: ArcSwap<Snapshot>,
    // held across context read, resolution and store
    resolution: Mutex<()>,
    context: RwLock<Arc<dyn UserContextProvider>>,
    offline: AtomicBool,
    initialized: AtomicBool,
    init_notify: Notify,
}

impl ServiceState {
    fn initialized(&self) {
        if !self.initialized.swap(true, Ordering::SeqCst) {
            self.init_notify.notify_waiters();
        }
    }

    fn current_context(&self) -> UserContext {
        match self.context.read() {
            Ok(provider) => provider.user_context(),
            Err(poisoned) => poisoned.into_inner().user_context(),
        }
    }

    fn resolution_guard(&self) -> MutexGuard<'_, ()> {
        self.resolution
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn apply(&self, raw: Arc<FlagCatalogue>) {
        let _guard = self.resolution_guard();
        self.resolve_and_store(raw);
    }

    fn resolve_and_store(&self, raw: Arc<FlagCatalogue>) {
        let resolved = self.segmentation.execute(&raw, &self.current_context());
        self.snapshot.store(Arc::new(Snapshot { raw, resolved }));
    }

    fn set_context_provider(&self, provider: Arc<dyn UserContextProvider>) {
        let _guard = self.resolution_guard();
        match self.context.write() {
            Ok(mut current) => *current = provider,
            Err(poisoned) => *poisoned.into_inner() = provider,
        }
        let raw = Arc::clone(&self.snapshot.load().raw);
        self.resolve_and_store(raw);
    }
}

pub struct FlagService {
    state: Arc<ServiceState>,
    cancellation_token: CancellationToken,
    close: Once,
}

impl FlagService {
    pub fn new(opts: &Arc<Options>, fetcher: Arc<Fetcher>) -> Self {
        let service = Self {
            state: Arc::new(ServiceState {
                fetcher,
                options: Arc::clone(opts),
                segmentation: SegmentationService::default(),
                snapshot: ArcSwap::from_pointee(Snapshot::default()),
                resolution: Mutex::new(()),
                context: RwLock::new(opts.initial_context_provider()),
                offline: AtomicBool::new(opts.offline),
                initialized: AtomicBool::new(false),
                init_notify: Notify::new(),
            }),
            cancellation_token: CancellationToken::new(),
            close: Once::new(),
        };

        let primed = read_catalogue(opts.cache(), FEATURE_FLAGS_KEY)
            .or_else(|| read_catalogue(opts.backup_cache(), BACKUP_KEY));
        if let Some(catalogue) = primed {
            debug!("Primed {} flags from the cache", catalogue.len());
            service.state.apply(Arc::new(catalogue));
        }

        match opts.polling_mode {
            PollingMode::AutoPoll(interval) => {
                if opts.offline {
                    service.state.initialized();
                }
                service.start_poll(interval);
            }
            PollingMode::Manual => service.state.initialized(),
        }

        service
    }

    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.state.snapshot.load_full()
    }

    pub async fn refresh(&self) -> Result<(), ClientError> {
        let result = refresh(&self.state).await;
        self.state.initialized();
        result
    }

    pub async fn wait_for_init(&self) {
        loop {
            let notified = self.state.init_notify.notified();
            if self.state.initialized.load(Ordering::SeqCst) {
                return;
            }
            notified.await;
        }
    }

    pub fn user_context(&self) -> UserContext {
        self.state.current_context()
    }

    /// Replaces the context source and re-resolves the catalogue in use.
    pub fn set_user_context(&self, ctx: UserContext) {
        self.state.set_context_provider(Arc::new(ctx));
    }

    pub fn set_offline(&self, offline: bool) {
        let previous = self.state.offline.swap(offline, Ordering::SeqCst);
        if previous != offline {
            debug!("Switched to {} mode", if offline { "offline" } else { "online" });
        }
    }

    pub fn is_offline(&self) -> bool {
        self.state.offline.load(Ordering::SeqCst)
    }

    pub fn close(&self) {
        self.close.call_once(|| self.cancellation_token.cancel());
    }

    fn start_poll(&self, interval: Duration) {
        let state = Arc::clone(&self.state);
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if !state.offline.load(Ordering::SeqCst) && fetch_and_apply(&state).await.is_err() {
                            debug!("Scheduled refresh failed, keeping the flags in use");
                        }
                        state.initialized();
                    },
                    _ = token.cancelled() => break
                }
            }
        });
    }
}

impl Drop for FlagService {
    fn drop(&mut self) {
        self.close();
    }
}

async fn refresh(state: &ServiceState) -> Result<(), ClientError> {
    let opts = &state.options;

    if let Some(catalogue) = read_catalogue(opts.cache(), FEATURE_FLAGS_KEY) {
        debug!("Using {} cached flags", catalogue.len());
        state.apply(Arc::new(catalogue));
        return Ok(());
    }

    if state.offline.load(Ordering::SeqCst) {
        fall_back_to_backup(state, OfflineClient);
        let err = ClientError::new(
            OfflineClient,
            "Client is in offline mode, it cannot initiate HTTP calls.".to_owned(),
        );
        warn!(event_id = err.kind.as_u16(); "{}", err);
        return Err(err);
    }

    fetch_and_apply(state).await
}

/// Fetches the catalogue regardless of the main cache, then caches and applies it.
async fn fetch_and_apply(state: &ServiceState) -> Result<(), ClientError> {
    let opts = &state.options;
    match state.fetcher.fetch().await {
        FetchResponse::Fetched(catalogue) => {
            match catalogue_to_json(&catalogue) {
                Ok(json) => {
                    opts.cache()
                        .set(FEATURE_FLAGS_KEY, json.as_str(), Some(opts.cache_ttl));
                    opts.backup_cache().set(BACKUP_KEY, json.as_str(), None);
                }
                Err(err) => {
                    warn!(event_id = CacheFailure.as_u16(); "Fetched flags could not be cached. {err}")
                }
            }
            state.apply(Arc::new(catalogue));
            Ok(())
        }
        FetchResponse::Failed(err) => {
            fall_back_to_backup(state, err.kind);
            Err(err)
        }
    }
}

fn fall_back_to_backup(state: &ServiceState, cause: ErrorKind) {
    match read_catalogue(state.options.backup_cache(), BACKUP_KEY) {
        Some(backup) => {
            warn!(event_id = cause.as_u16(); "Fresh flags are unavailable, resolving {} flags from the backup", backup.len());
            state.apply(Arc::new(backup));
        }
        None => debug!("No backup flags to fall back to"),
    }
}

fn read_catalogue(cache: &dyn FlagCache, key: &str) -> Option<FlagCatalogue> {
    let json = cache.get(key)?;
    match catalogue_from_json(json.as_str()) {
        Ok(catalogue) => Some(catalogue),
        Err(err) => {
            warn!(event_id = CacheFailure.as_u16(); "Cached flags under '{key}' are unreadable. {err}");
            None
        }
    }
}
