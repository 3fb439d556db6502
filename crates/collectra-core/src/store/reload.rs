// ── Reload plumbing ──
//
// Providers fetch fresh collection definitions asynchronously; callbacks
// observe completed reloads. Each reload scope has its own async mutex so
// overlapping reloads of the same scope run one after the other.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use arc_swap::ArcSwap;
use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use tokio::sync::Mutex;

use crate::error::CoreError;
use crate::model::{CollectionOptions, DataSourceOptions};

/// Future returned by a reload provider.
pub type ProviderFuture<T> = BoxFuture<'static, Result<T, CoreError>>;

/// Fetches the collections of the default data source.
pub type MainProvider = Arc<dyn Fn() -> ProviderFuture<Vec<CollectionOptions>> + Send + Sync>;

/// Fetches every non-default data source with its collections.
pub type ThirdPartyProvider = Arc<dyn Fn() -> ProviderFuture<Vec<DataSourceOptions>> + Send + Sync>;

/// Called after a reload with the keys of the data sources it refreshed.
pub type ReloadCallback = Arc<dyn Fn(&[String]) + Send + Sync>;

#[derive(Default, Clone)]
struct Providers {
    main: Option<MainProvider>,
    third_party: Option<ThirdPartyProvider>,
}

#[derive(Clone)]
struct ScopedCallback {
    scope: Option<String>,
    callback: ReloadCallback,
}

pub(crate) struct ReloadState {
    providers: ArcSwap<Providers>,
    callbacks: ArcSwap<Vec<ScopedCallback>>,
    pub(crate) main_lock: Mutex<()>,
    pub(crate) third_party_lock: Mutex<()>,
}

impl ReloadState {
    pub(crate) fn new() -> Self {
        Self {
            providers: ArcSwap::from_pointee(Providers::default()),
            callbacks: ArcSwap::from_pointee(Vec::new()),
            main_lock: Mutex::new(()),
            third_party_lock: Mutex::new(()),
        }
    }

    pub(crate) fn set_main<F, Fut>(&self, provider: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<CollectionOptions>, CoreError>> + Send + 'static,
    {
        let provider: MainProvider = Arc::new(move || provider().boxed());
        self.providers.rcu(|current| Providers {
            main: Some(Arc::clone(&provider)),
            ..(**current).clone()
        });
    }

    pub(crate) fn set_third_party<F, Fut>(&self, provider: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<DataSourceOptions>, CoreError>> + Send + 'static,
    {
        let provider: ThirdPartyProvider = Arc::new(move || provider().boxed());
        self.providers.rcu(|current| Providers {
            third_party: Some(Arc::clone(&provider)),
            ..(**current).clone()
        });
    }

    pub(crate) fn main(&self) -> Option<MainProvider> {
        self.providers.load().main.clone()
    }

    pub(crate) fn third_party(&self) -> Option<ThirdPartyProvider> {
        self.providers.load().third_party.clone()
    }

    pub(crate) fn add_callback(&self, callback: ReloadCallback, scope: Option<String>) {
        self.callbacks.rcu(|current| {
            let mut next = (**current).clone();
            next.push(ScopedCallback {
                scope: scope.clone(),
                callback: Arc::clone(&callback),
            });
            next
        });
    }

    /// Global callbacks fire once with every reloaded key; scoped ones
    /// fire when their data source is among them.
    pub(crate) fn notify(&self, reloaded: &[String]) {
        if reloaded.is_empty() {
            return;
        }
        let callbacks = self.callbacks.load_full();
        for entry in callbacks.iter() {
            match &entry.scope {
                None => (entry.callback)(reloaded),
                Some(scope) => {
                    if reloaded.iter().any(|key| key == scope) {
                        (entry.callback)(std::slice::from_ref(scope));
                    }
                }
            }
        }
    }
}

impl fmt::Debug for ReloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers = self.providers.load();
        f.debug_struct("ReloadState")
            .field("main_provider", &providers.main.is_some())
            .field("third_party_provider", &providers.third_party.is_some())
            .field("callbacks", &self.callbacks.load().len())
            .finish()
    }
}
