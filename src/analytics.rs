//! Usage analytics: counts flag queries per hour, flag, version and outcome, and
//! periodically sends the collected bucket to the API.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

use chrono::{DateTime, DurationRound, SecondsFormat, TimeDelta, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::cache::FlagCache;
use crate::constants::{ANALYTICS_KEY, DEFAULT_VERSION};
use crate::errors::ErrorKind::{AnalyticsFlushFailure, CacheFailure};
use crate::fetch::fetcher::Fetcher;
use crate::model::flag::Flag;

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
struct Counts {
    #[serde(skip_serializing_if = "Option::is_none")]
    t: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    f: Option<u64>,
}

type Requests = BTreeMap<String, BTreeMap<String, BTreeMap<String, Counts>>>;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
struct AnalyticsBucket {
    start: DateTime<Utc>,
    end: Option<DateTime<Utc>>,
    reqs: Requests,
}

impl AnalyticsBucket {
    fn new(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: None,
            reqs: Requests::new(),
        }
    }
}

struct AnalyticsState {
    cache: Arc<dyn FlagCache>,
    fetcher: Arc<Fetcher>,
    lock: Mutex<()>,
}

impl AnalyticsState {
    fn read_bucket(&self) -> Option<AnalyticsBucket> {
        let json = self.cache.get(ANALYTICS_KEY)?;
        match serde_json::from_str(json.as_str()) {
            Ok(bucket) => Some(bucket),
            Err(err) => {
                warn!(event_id = CacheFailure.as_u16(); "Discarding unreadable analytics bucket. {err}");
                None
            }
        }
    }

    fn register(&self, flag_name: &str, flag: &Flag, now: DateTime<Utc>) {
        let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut bucket = self
            .read_bucket()
            .unwrap_or_else(|| AnalyticsBucket::new(now));
        if bucket.end.is_some() {
            return;
        }

        let version = flag
            .selected_version
            .as_ref()
            .map(|v| v.name.as_str())
            .unwrap_or(DEFAULT_VERSION);
        let counts = bucket
            .reqs
            .entry(hour_key(now))
            .or_default()
            .entry(flag_name.to_owned())
            .or_default()
            .entry(version.to_owned())
            .or_default();
        let counter = if flag.active {
            &mut counts.t
        } else {
            &mut counts.f
        };
        *counter = Some(counter.unwrap_or(0) + 1);

        match serde_json::to_string(&bucket) {
            Ok(json) => self.cache.set(ANALYTICS_KEY, json.as_str(), None),
            Err(err) => {
                warn!(event_id = CacheFailure.as_u16(); "Analytics bucket could not be stored. {err}")
            }
        }
    }

    /// Closes the pending bucket, removes it from the cache and sends it.
    async fn flush(&self, now: DateTime<Utc>) {
        let bucket = {
            let _guard = self.lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            let Some(mut bucket) = self.read_bucket() else {
                return;
            };
            self.cache.remove(ANALYTICS_KEY);
            bucket.end = Some(now);
            bucket
        };

        let body = match serde_json::to_string(&bucket) {
            Ok(body) => body,
            Err(err) => {
                warn!(event_id = AnalyticsFlushFailure.as_u16(); "Analytics bucket could not be serialized. {err}");
                return;
            }
        };
        match self.fetcher.send_analytics(body).await {
            Ok(()) => debug!("Analytics sent for {} hour(s)", bucket.reqs.len()),
            Err(err) => warn!(event_id = err.kind.as_u16(); "{}", err),
        }
    }
}

fn hour_key(time: DateTime<Utc>) -> String {
    time.duration_trunc(TimeDelta::hours(1))
        .unwrap_or(time)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub struct AnalyticsService {
    state: Arc<AnalyticsState>,
    cancellation_token: CancellationToken,
    close: Once,
}

impl AnalyticsService {
    pub fn new(cache: Arc<dyn FlagCache>, fetcher: Arc<Fetcher>) -> Self {
        Self {
            state: Arc::new(AnalyticsState {
                cache,
                fetcher,
                lock: Mutex::new(()),
            }),
            cancellation_token: CancellationToken::new(),
            close: Once::new(),
        }
    }

    /// Records one query of `flag_name` that resolved to `flag`.
    pub fn register(&self, flag_name: &str, flag: &Flag) {
        self.state.register(flag_name, flag, Utc::now());
    }

    pub async fn flush(&self) {
        self.state.flush(Utc::now()).await;
    }

    /// Flushes on every `interval`; the first flush happens one interval from now.
    pub fn start(&self, interval: Duration) {
        let state = Arc::clone(&self.state);
        let token = self.cancellation_token.clone();

        tokio::spawn(async move {
            let start = tokio::time::Instant::now() + interval;
            let mut ticker = tokio::time::interval_at(start, interval);
            loop {
                tokio::select! {
                    _ = ticker.tick() => state.flush(Utc::now()).await,
                    _ = token.cancelled() => break
                }
            }
        });
    }

    pub fn close(&self) {
        self.close.call_once(|| self.cancellation_token.cancel());
    }
}

impl Drop for AnalyticsService {
    fn drop(&mut self) {
        self.close();
    }
}
