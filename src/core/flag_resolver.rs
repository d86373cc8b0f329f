//! Remote feature-flag resolution with offline-safe caching.
//!
//! The resolver owns two independent slots, the flag snapshot and the
//! subscription offer. Each slot is loaded from the settings store at
//! construction, refreshed asynchronously through the fetch client, and
//! persisted only after a successful decode. A failed refresh leaves both
//! the in-memory and the persisted value untouched.

use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::adapters::{HttpMethod, KeyValueStore};
use crate::domain::{FlagPayload, FlagSnapshot, SubscriptionEnvelope, SubscriptionOffer, VersionGates};

use super::fetch_client::{ApiErrorEnvelope, FetchClient};

/// Settings key of the cached flag snapshot
pub const FLAGS_CACHE_KEY: &str = "remote_flags";

/// Settings key of the cached subscription offer
pub const SUBSCRIPTION_CACHE_KEY: &str = "subscription_offer";

/// Where the resolver fetches from and which versions it gates
#[derive(Debug, Clone, PartialEq)]
pub struct FlagResolverConfig {
    pub flags_url: String,
    pub subscription_url: String,
    pub gates: VersionGates,
    /// Version of the running app, used by `is_download_visible_for_running`
    pub app_version: String,
}

/// Result of one refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// The remote value was decoded and applied
    Applied,
    /// The fetch failed; the previous value was kept
    Retained,
}

/// Handles of the refresh tasks spawned by [`FlagResolver::start`]
pub struct RefreshHandles {
    pub flags: JoinHandle<RefreshOutcome>,
    pub subscription: JoinHandle<RefreshOutcome>,
}

impl RefreshHandles {
    /// Wait for both refreshes; a panicked task counts as `Retained`
    pub async fn join(self) -> (RefreshOutcome, RefreshOutcome) {
        let (flags, subscription) = tokio::join!(self.flags, self.subscription);
        (
            flags.unwrap_or(RefreshOutcome::Retained),
            subscription.unwrap_or(RefreshOutcome::Retained),
        )
    }
}

/// Feature-flag and subscription-offer resolver
pub struct FlagResolver {
    client: FetchClient,
    store: Arc<dyn KeyValueStore>,
    config: FlagResolverConfig,

    flags: RwLock<FlagSnapshot>,
    subscription: RwLock<SubscriptionOffer>,

    // Serialize merge + persist per slot so the stored record always
    // matches the last applied in-memory value. Held across the blocking
    // store write, hence async.
    flags_commit: Mutex<()>,
    subscription_commit: Mutex<()>,
}

impl FlagResolver {
    /// Build a resolver from cached state only. Never fails: a missing or
    /// unreadable cache yields defaults.
    pub fn load(client: FetchClient, store: Arc<dyn KeyValueStore>, config: FlagResolverConfig) -> Self {
        let flags: FlagSnapshot = load_slot(store.as_ref(), FLAGS_CACHE_KEY);
        let subscription: SubscriptionOffer = load_slot(store.as_ref(), SUBSCRIPTION_CACHE_KEY);

        debug!(
            primary = flags.primary,
            config_version = ?flags.config_version,
            offering_id = %subscription.offering_id,
            "Loaded cached remote config"
        );

        Self {
            client,
            store,
            config,
            flags: RwLock::new(flags),
            subscription: RwLock::new(subscription),
            flags_commit: Mutex::new(()),
            subscription_commit: Mutex::new(()),
        }
    }

    /// Load from cache and immediately schedule both refreshes.
    ///
    /// Must be called from within a tokio runtime.
    pub fn initialize(
        client: FetchClient,
        store: Arc<dyn KeyValueStore>,
        config: FlagResolverConfig,
    ) -> (Arc<Self>, RefreshHandles) {
        let resolver = Arc::new(Self::load(client, store, config));
        let handles = resolver.start();
        (resolver, handles)
    }

    /// Spawn the two independent refresh tasks
    pub fn start(self: &Arc<Self>) -> RefreshHandles {
        let flags = {
            let resolver = Arc::clone(self);
            tokio::spawn(async move { resolver.refresh_flags().await })
        };
        let subscription = {
            let resolver = Arc::clone(self);
            tokio::spawn(async move { resolver.refresh_subscription().await })
        };

        RefreshHandles {
            flags,
            subscription,
        }
    }

    /// Re-run both refreshes concurrently
    pub async fn reload(&self) -> (RefreshOutcome, RefreshOutcome) {
        tokio::join!(self.refresh_flags(), self.refresh_subscription())
    }

    /// Fetch the flag document and merge it into the snapshot
    #[instrument(skip(self), fields(url = %self.config.flags_url))]
    pub async fn refresh_flags(&self) -> RefreshOutcome {
        let result = self
            .client
            .submit_with_retry::<FlagPayload, ApiErrorEnvelope>(
                &self.config.flags_url,
                HttpMethod::Get,
                None,
            )
            .await;

        match result {
            Ok(payload) => {
                self.apply_flags(&payload).await;
                RefreshOutcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "Flag refresh failed, keeping cached flags");
                RefreshOutcome::Retained
            }
        }
    }

    /// Fetch the subscription document and replace the offer
    #[instrument(skip(self), fields(url = %self.config.subscription_url))]
    pub async fn refresh_subscription(&self) -> RefreshOutcome {
        let result = self
            .client
            .submit_with_retry::<SubscriptionEnvelope, ApiErrorEnvelope>(
                &self.config.subscription_url,
                HttpMethod::Get,
                None,
            )
            .await;

        match result {
            Ok(envelope) => {
                self.apply_subscription(envelope.settings.into()).await;
                RefreshOutcome::Applied
            }
            Err(e) => {
                warn!(error = %e, "Subscription refresh failed, keeping cached offer");
                RefreshOutcome::Retained
            }
        }
    }

    async fn apply_flags(&self, payload: &FlagPayload) {
        let _commit = self.flags_commit.lock().await;

        let merged = {
            let mut flags = self.flags.write().unwrap_or_else(|e| e.into_inner());
            flags.merge(payload, Utc::now());
            flags.clone()
        };

        info!(
            primary = merged.primary,
            legacy_override = merged.legacy_override,
            override_v1 = merged.override_v1,
            override_v2 = merged.override_v2,
            config_version = ?merged.config_version,
            last_updated = ?payload.last_updated,
            "Applied remote flags"
        );

        persist_slot(Arc::clone(&self.store), FLAGS_CACHE_KEY, &merged).await;
    }

    async fn apply_subscription(&self, offer: SubscriptionOffer) {
        let _commit = self.subscription_commit.lock().await;

        *self.subscription.write().unwrap_or_else(|e| e.into_inner()) = offer.clone();

        info!(
            offering_id = %offer.offering_id,
            preferred_package = %offer.preferred_package,
            "Applied subscription offer"
        );

        persist_slot(Arc::clone(&self.store), SUBSCRIPTION_CACHE_KEY, &offer).await;
    }

    /// Current flag snapshot
    pub fn flags(&self) -> FlagSnapshot {
        self.flags.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Current subscription offer
    pub fn subscription(&self) -> SubscriptionOffer {
        self.subscription
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Whether the download surface is shown for `running_version`
    pub fn is_download_visible(&self, running_version: &str) -> bool {
        self.flags
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .download_visible(running_version, &self.config.gates)
    }

    /// Whether the download surface is shown for the configured app version
    pub fn is_download_visible_for_running(&self) -> bool {
        self.is_download_visible(&self.config.app_version)
    }

    /// Resolver configuration
    pub fn config(&self) -> &FlagResolverConfig {
        &self.config
    }
}

fn load_slot<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    match store.get(key) {
        Ok(Some(bytes)) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
            warn!(key, error = %e, "Cached record is corrupt, using defaults");
            T::default()
        }),
        Ok(None) => T::default(),
        Err(e) => {
            warn!(key, error = %e, "Failed to read cached record, using defaults");
            T::default()
        }
    }
}

/// Write `value` under `key` on the blocking pool; the file store locks,
/// fsyncs and renames
async fn persist_slot<T: Serialize>(store: Arc<dyn KeyValueStore>, key: &'static str, value: &T) {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(key, error = %e, "Failed to serialize record");
            return;
        }
    };

    match tokio::task::spawn_blocking(move || store.set(key, &bytes)).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warn!(key, error = %e, "Failed to persist record"),
        Err(e) => warn!(key, error = %e, "Persist task failed"),
    }
}
