// ── Data source ──
//
// One named backing store and the collection manager describing it.
// Display metadata can change on reload; the manager (and with it every
// subscriber) stays the same.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::{Map, Value};

use super::collection_manager::CollectionManager;
use crate::model::DataSourceOptions;
use crate::registry::Registries;

#[derive(Debug, Clone, Default)]
struct DataSourceMeta {
    display_name: Option<String>,
    status: Option<String>,
    extra: Map<String, Value>,
}

impl From<&DataSourceOptions> for DataSourceMeta {
    fn from(options: &DataSourceOptions) -> Self {
        Self {
            display_name: options.display_name.clone(),
            status: options.status.clone(),
            extra: options.extra.clone(),
        }
    }
}

pub struct DataSource {
    key: String,
    meta: ArcSwap<DataSourceMeta>,
    collection_manager: CollectionManager,
}

impl DataSource {
    /// Create a data source and load its declared collections.
    pub(crate) fn new(options: DataSourceOptions, registries: Arc<Registries>) -> Self {
        let meta = DataSourceMeta::from(&options);
        let collection_manager = CollectionManager::new(options.key.clone(), registries);
        collection_manager.add_collections(options.collections);

        Self {
            key: options.key,
            meta: ArcSwap::from_pointee(meta),
            collection_manager,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Display name, falling back to the key.
    pub fn display_name(&self) -> String {
        self.meta
            .load()
            .display_name
            .clone()
            .unwrap_or_else(|| self.key.clone())
    }

    pub fn status(&self) -> Option<String> {
        self.meta.load().status.clone()
    }

    pub fn option(&self, key: &str) -> Option<Value> {
        self.meta.load().extra.get(key).cloned()
    }

    pub fn collection_manager(&self) -> &CollectionManager {
        &self.collection_manager
    }

    /// Current declaration, with the registered raw collections.
    pub fn options(&self) -> DataSourceOptions {
        let meta = self.meta.load();
        let snapshot = self.collection_manager.snapshot();
        DataSourceOptions {
            key: self.key.clone(),
            display_name: meta.display_name.clone(),
            status: meta.status.clone(),
            collections: snapshot
                .names()
                .filter_map(|name| snapshot.raw(name).cloned())
                .collect(),
            extra: meta.extra.clone(),
        }
    }

    /// Take new metadata and replace the collection set.
    pub(crate) fn replace(&self, options: DataSourceOptions) {
        self.meta.store(Arc::new(DataSourceMeta::from(&options)));
        self.collection_manager.set_collections(options.collections);
    }
}

impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("key", &self.key)
            .field("display_name", &self.display_name())
            .field("collections", &self.collection_manager.len())
            .finish()
    }
}
