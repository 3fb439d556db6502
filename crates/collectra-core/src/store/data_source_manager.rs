// ── Data source manager ──
//
// Top-level entry point: owns the shared registries, every data source
// (always including the default one) and the reload machinery. Cheaply
// cloneable; clones share the same state.

use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::data_source::DataSource;
use super::lookup::{CollectionLookup, CollectionResolver, FieldLookup, lookup_collection, lookup_field};
use super::reload::{ReloadCallback, ReloadState};
use crate::error::CoreError;
use crate::model::{Collection, CollectionField, CollectionOptions, DataSourceOptions};
use crate::registry::{
    CollectionMixin, CollectionTemplate, CollectionTemplateRegistry, FieldInterface, FieldInterfaceGroup,
    FieldInterfaceRegistry, MixinRegistry, Registries,
};

/// Key of the data source every lookup without an explicit key targets.
pub const DEFAULT_DATA_SOURCE_KEY: &str = "main";

/// Collections of one data source, as returned by
/// [`DataSourceManager::get_all_collections`].
#[derive(Debug, Clone)]
pub struct DataSourceCollections {
    pub key: String,
    pub display_name: String,
    pub collections: Vec<Arc<Collection>>,
}

#[derive(Clone)]
pub struct DataSourceManager {
    inner: Arc<DataSourceManagerInner>,
}

struct DataSourceManagerInner {
    registries: Arc<Registries>,
    main: Arc<DataSource>,
    data_sources: ArcSwap<IndexMap<String, Arc<DataSource>>>,
    reload: ReloadState,
}

impl DataSourceManager {
    /// A manager with empty registries and an empty default data source.
    pub fn new() -> Self {
        Self::with_registries(Arc::new(Registries::new()))
    }

    pub fn with_registries(registries: Arc<Registries>) -> Self {
        let main = Arc::new(DataSource::new(
            DataSourceOptions::new(DEFAULT_DATA_SOURCE_KEY),
            Arc::clone(&registries),
        ));
        let mut data_sources = IndexMap::new();
        data_sources.insert(DEFAULT_DATA_SOURCE_KEY.to_owned(), Arc::clone(&main));

        Self {
            inner: Arc::new(DataSourceManagerInner {
                registries,
                main,
                data_sources: ArcSwap::from_pointee(data_sources),
                reload: ReloadState::new(),
            }),
        }
    }

    pub fn builder() -> DataSourceManagerBuilder {
        DataSourceManagerBuilder::default()
    }

    // ── Registries ───────────────────────────────────────────────────

    pub fn registries(&self) -> &Arc<Registries> {
        &self.inner.registries
    }

    pub fn field_interfaces(&self) -> &FieldInterfaceRegistry {
        self.inner.registries.field_interfaces()
    }

    pub fn collection_templates(&self) -> &CollectionTemplateRegistry {
        self.inner.registries.templates()
    }

    pub fn collection_mixins(&self) -> &MixinRegistry {
        self.inner.registries.mixins()
    }

    /// Register mixins and rebuild every collection of every data source.
    pub fn add_collection_mixins(&self, mixins: impl IntoIterator<Item = CollectionMixin>) {
        if self.inner.registries.mixins.add_many(mixins) == 0 {
            return;
        }
        for source in self.data_sources_snapshot().values() {
            source.collection_manager().reinstantiate();
        }
    }

    /// Register templates and rebuild the collections created from them.
    pub fn add_collection_templates(&self, templates: impl IntoIterator<Item = CollectionTemplate>) {
        let names = self.inner.registries.templates.add_many(templates);
        if names.is_empty() {
            return;
        }
        for source in self.data_sources_snapshot().values() {
            source.collection_manager().reinstantiate_where(|raw| {
                raw.template
                    .as_deref()
                    .is_some_and(|template| names.iter().any(|name| name == template))
            });
        }
    }

    /// Register field interfaces so their defaults apply, including to
    /// collections registered before them.
    pub fn add_field_interfaces(&self, interfaces: impl IntoIterator<Item = FieldInterface>) {
        let interfaces: Vec<FieldInterface> = interfaces.into_iter().collect();
        if interfaces.is_empty() {
            return;
        }
        self.inner.registries.interfaces.add_many(interfaces);
        for source in self.data_sources_snapshot().values() {
            source.collection_manager().reinstantiate();
        }
    }

    pub fn add_field_interface_groups<I, S>(&self, groups: I)
    where
        I: IntoIterator<Item = (S, FieldInterfaceGroup)>,
        S: Into<String>,
    {
        self.inner.registries.interfaces.add_groups(groups);
    }

    // ── Data sources ─────────────────────────────────────────────────

    /// The default data source. Always present.
    pub fn main(&self) -> &Arc<DataSource> {
        &self.inner.main
    }

    /// Register a data source, or update an existing one in place.
    pub fn add_data_source(&self, options: DataSourceOptions) -> Arc<DataSource> {
        if let Some(existing) = self.data_sources_snapshot().get(&options.key) {
            existing.replace(options);
            return Arc::clone(existing);
        }

        let key = options.key.clone();
        let source = Arc::new(DataSource::new(options, Arc::clone(&self.inner.registries)));
        self.inner.data_sources.rcu(|current| {
            let mut next = (**current).clone();
            next.entry(key.clone()).or_insert_with(|| Arc::clone(&source));
            next
        });
        debug!(data_source = %key, "data source added");
        // A concurrent add of the same key may have won the race.
        self.data_sources_snapshot()
            .get(&key)
            .cloned()
            .unwrap_or(source)
    }

    /// Look up a data source; `None` selects the default.
    pub fn get_data_source(&self, key: Option<&str>) -> Option<Arc<DataSource>> {
        match key {
            None => Some(Arc::clone(&self.inner.main)),
            Some(key) => self.data_sources_snapshot().get(key).cloned(),
        }
    }

    /// Data sources in registration order, default first.
    pub fn get_data_sources(&self) -> Vec<Arc<DataSource>> {
        self.data_sources_snapshot().values().cloned().collect()
    }

    /// Like [`get_data_source`](Self::get_data_source), but an unknown key
    /// is a configuration error. Used when routing requests.
    pub fn resolve_data_source(&self, key: Option<&str>) -> Result<Arc<DataSource>, CoreError> {
        self.get_data_source(key).ok_or_else(|| CoreError::UnknownDataSource {
            key: key.unwrap_or(DEFAULT_DATA_SOURCE_KEY).to_owned(),
        })
    }

    pub fn remove_data_source(&self, key: &str) -> Result<Option<Arc<DataSource>>, CoreError> {
        if key == DEFAULT_DATA_SOURCE_KEY {
            return Err(CoreError::DefaultDataSource { key: key.to_owned() });
        }
        let removed = self.data_sources_snapshot().get(key).cloned();
        if removed.is_some() {
            self.inner.data_sources.rcu(|current| {
                let mut next = (**current).clone();
                next.shift_remove(key);
                next
            });
            debug!(data_source = %key, "data source removed");
        }
        Ok(removed)
    }

    // ── Collections ──────────────────────────────────────────────────

    /// Merge collections into a data source (default when `None`).
    pub fn add_collections(&self, collections: impl IntoIterator<Item = CollectionOptions>, data_source: Option<&str>) {
        match self.get_data_source(data_source) {
            Some(source) => source.collection_manager().add_collections(collections),
            None => warn!(data_source = ?data_source, "collections added to unknown data source ignored"),
        }
    }

    /// Replace the collections of a data source (default when `None`).
    pub fn set_collections(&self, collections: impl IntoIterator<Item = CollectionOptions>, data_source: Option<&str>) {
        match self.get_data_source(data_source) {
            Some(source) => source.collection_manager().set_collections(collections),
            None => warn!(data_source = ?data_source, "collections set on unknown data source ignored"),
        }
    }

    /// Resolve a collection in a data source. Association hops follow the
    /// field's `targetDataSource` when it names another data source.
    pub fn get_collection<'a>(
        &self,
        target: impl Into<CollectionLookup<'a>>,
        data_source: Option<&str>,
    ) -> Option<Arc<Collection>> {
        lookup_collection(
            self.inner.as_ref(),
            data_source.unwrap_or(DEFAULT_DATA_SOURCE_KEY),
            target.into(),
        )
    }

    pub fn get_collection_name<'a>(
        &self,
        target: impl Into<CollectionLookup<'a>>,
        data_source: Option<&str>,
    ) -> Option<String> {
        self.get_collection(target, data_source).map(|c| c.name().to_owned())
    }

    pub fn get_collection_field<'a>(
        &self,
        target: impl Into<FieldLookup<'a>>,
        data_source: Option<&str>,
    ) -> Option<Arc<CollectionField>> {
        lookup_field(
            self.inner.as_ref(),
            data_source.unwrap_or(DEFAULT_DATA_SOURCE_KEY),
            target.into(),
        )
    }

    pub fn get_collection_fields<'a>(
        &self,
        target: impl Into<CollectionLookup<'a>>,
        data_source: Option<&str>,
    ) -> Vec<Arc<CollectionField>> {
        self.get_collection(target, data_source)
            .map(|c| c.get_fields())
            .unwrap_or_default()
    }

    /// Collections of one data source; empty for an unknown key.
    pub fn get_collections(&self, data_source: Option<&str>) -> Vec<Arc<Collection>> {
        self.get_data_source(data_source)
            .map(|source| source.collection_manager().get_collections())
            .unwrap_or_default()
    }

    pub fn get_collections_where<F>(&self, data_source: Option<&str>, predicate: F) -> Vec<Arc<Collection>>
    where
        F: Fn(&Collection) -> bool,
    {
        self.get_data_source(data_source)
            .map(|source| source.collection_manager().get_collections_where(predicate))
            .unwrap_or_default()
    }

    /// Every data source with its collections, default first.
    pub fn get_all_collections(&self) -> Vec<DataSourceCollections> {
        self.get_all_collections_where(|_| true)
    }

    pub fn get_all_collections_where<F>(&self, predicate: F) -> Vec<DataSourceCollections>
    where
        F: Fn(&Collection) -> bool,
    {
        self.data_sources_snapshot()
            .values()
            .map(|source| DataSourceCollections {
                key: source.key().to_owned(),
                display_name: source.display_name(),
                collections: source.collection_manager().get_collections_where(&predicate),
            })
            .collect()
    }

    // ── Reload ───────────────────────────────────────────────────────

    pub fn set_main_provider<F, Fut>(&self, provider: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<CollectionOptions>, CoreError>> + Send + 'static,
    {
        self.inner.reload.set_main(provider);
    }

    pub fn set_third_party_provider<F, Fut>(&self, provider: F)
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Vec<DataSourceOptions>, CoreError>> + Send + 'static,
    {
        self.inner.reload.set_third_party(provider);
    }

    /// Register a reload callback. Without a scope it fires once per
    /// reload that ran a provider; with one, when that data source reloads.
    pub fn add_reload_callback<F>(&self, callback: F, scope: Option<&str>)
    where
        F: Fn(&[String]) + Send + Sync + 'static,
    {
        let callback: ReloadCallback = Arc::new(callback);
        self.inner.reload.add_callback(callback, scope.map(str::to_owned));
    }

    /// Re-fetch the default data source. Returns the reloaded keys; empty
    /// when no main provider is set.
    pub async fn reload_main(&self) -> Result<Vec<String>, CoreError> {
        let reloaded = self.run_main_reload().await?;
        self.inner.reload.notify(&reloaded);
        Ok(reloaded)
    }

    /// Re-fetch every non-default data source, dropping the ones the
    /// provider no longer returns.
    pub async fn reload_third_data_sources(&self) -> Result<Vec<String>, CoreError> {
        let reloaded = self.run_third_party_reload().await?;
        self.inner.reload.notify(&reloaded);
        Ok(reloaded)
    }

    /// Both reloads. The providers are polled concurrently and nothing is
    /// applied unless both succeed. Callbacks fire once for the combined
    /// result.
    pub async fn reload_all(&self) -> Result<Vec<String>, CoreError> {
        let main = self.inner.reload.main();
        let third_party = self.inner.reload.third_party();
        if main.is_none() && third_party.is_none() {
            debug!("no reload providers, reload skipped");
            return Ok(Vec::new());
        }
        let _main_guard = self.inner.reload.main_lock.lock().await;
        let _third_party_guard = self.inner.reload.third_party_lock.lock().await;

        let fetch_main = async {
            match &main {
                Some(provider) => provider().await.map(Some),
                None => Ok(None),
            }
        };
        let fetch_third_party = async {
            match &third_party {
                Some(provider) => provider().await.map(Some),
                None => Ok(None),
            }
        };
        let (collections, declared) = futures_util::future::try_join(fetch_main, fetch_third_party).await?;

        let mut reloaded = collections.map(|collections| self.apply_main(collections)).unwrap_or_default();
        if let Some(declared) = declared {
            reloaded.extend(self.apply_third_party(declared)?);
        }
        self.inner.reload.notify(&reloaded);
        Ok(reloaded)
    }

    /// Run `reload_all` every `interval` until `cancel` fires. `None` for a
    /// zero interval.
    pub fn spawn_reload_task(&self, interval: Duration, cancel: CancellationToken) -> Option<JoinHandle<()>> {
        if interval.is_zero() {
            return None;
        }
        Some(tokio::spawn(reload_task(self.clone(), interval, cancel)))
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn data_sources_snapshot(&self) -> Arc<IndexMap<String, Arc<DataSource>>> {
        self.inner.data_sources.load_full()
    }

    async fn run_main_reload(&self) -> Result<Vec<String>, CoreError> {
        let Some(provider) = self.inner.reload.main() else {
            debug!("no main provider, reload skipped");
            return Ok(Vec::new());
        };
        let _guard = self.inner.reload.main_lock.lock().await;

        let collections = provider().await?;
        Ok(self.apply_main(collections))
    }

    fn apply_main(&self, collections: Vec<CollectionOptions>) -> Vec<String> {
        let count = collections.len();
        let manager = self.inner.main.collection_manager();
        manager.set_collections(collections);
        manager.mark_reloaded();

        info!(data_source = DEFAULT_DATA_SOURCE_KEY, collections = count, "main data source reloaded");
        vec![DEFAULT_DATA_SOURCE_KEY.to_owned()]
    }

    async fn run_third_party_reload(&self) -> Result<Vec<String>, CoreError> {
        let Some(provider) = self.inner.reload.third_party() else {
            debug!("no third-party provider, reload skipped");
            return Ok(Vec::new());
        };
        let _guard = self.inner.reload.third_party_lock.lock().await;

        let declared = provider().await?;
        self.apply_third_party(declared)
    }

    fn apply_third_party(&self, declared: Vec<DataSourceOptions>) -> Result<Vec<String>, CoreError> {
        let mut reloaded = Vec::with_capacity(declared.len());
        for options in declared {
            if options.key.is_empty() || options.key == DEFAULT_DATA_SOURCE_KEY {
                warn!(data_source = %options.key, "third-party provider returned a reserved key, skipped");
                continue;
            }
            if reloaded.contains(&options.key) {
                warn!(data_source = %options.key, "duplicate data source in reload, later entry wins");
            } else {
                reloaded.push(options.key.clone());
            }
            self.add_data_source(options).collection_manager().mark_reloaded();
        }

        let keep: HashSet<&str> = reloaded.iter().map(String::as_str).collect();
        let stale: Vec<String> = self
            .data_sources_snapshot()
            .keys()
            .filter(|key| key.as_str() != DEFAULT_DATA_SOURCE_KEY && !keep.contains(key.as_str()))
            .cloned()
            .collect();
        for key in &stale {
            self.remove_data_source(key)?;
        }

        info!(
            reloaded = reloaded.len(),
            removed = stale.len(),
            "third-party data sources reloaded"
        );
        Ok(reloaded)
    }
}

impl Default for DataSourceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DataSourceManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSourceManager")
            .field("data_sources", &self.data_sources_snapshot().keys().collect::<Vec<_>>())
            .field("registries", &self.inner.registries)
            .field("reload", &self.inner.reload)
            .finish()
    }
}

impl CollectionResolver for DataSourceManagerInner {
    fn resolve(&self, data_source_key: &str, name: &str) -> Option<Arc<Collection>> {
        let sources = self.data_sources.load();
        let source = sources.get(data_source_key)?;
        source.collection_manager().snapshot().get(name).cloned()
    }
}

// ── Background task ──────────────────────────────────────────────────

async fn reload_task(manager: DataSourceManager, interval: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(interval);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = manager.reload_all().await {
                    warn!(error = %e, "periodic reload failed");
                }
            }
        }
    }
}

// ── Builder ──────────────────────────────────────────────────────────

/// Assembles a [`DataSourceManager`] with everything registered before
/// the first instantiation.
#[derive(Default)]
pub struct DataSourceManagerBuilder {
    builtin_interfaces: bool,
    interfaces: Vec<FieldInterface>,
    groups: Vec<(String, FieldInterfaceGroup)>,
    templates: Vec<CollectionTemplate>,
    mixins: Vec<CollectionMixin>,
    collections: Vec<CollectionOptions>,
    data_sources: Vec<DataSourceOptions>,
}

impl DataSourceManagerBuilder {
    /// Preload the built-in field interfaces and groups.
    pub fn builtin_interfaces(mut self) -> Self {
        self.builtin_interfaces = true;
        self
    }

    pub fn field_interface(mut self, interface: FieldInterface) -> Self {
        self.interfaces.push(interface);
        self
    }

    pub fn field_interface_group(mut self, name: impl Into<String>, group: FieldInterfaceGroup) -> Self {
        self.groups.push((name.into(), group));
        self
    }

    pub fn collection_template(mut self, template: CollectionTemplate) -> Self {
        self.templates.push(template);
        self
    }

    pub fn collection_mixin(mut self, mixin: CollectionMixin) -> Self {
        self.mixins.push(mixin);
        self
    }

    /// Collections of the default data source.
    pub fn collections(mut self, collections: impl IntoIterator<Item = CollectionOptions>) -> Self {
        self.collections.extend(collections);
        self
    }

    pub fn data_source(mut self, options: DataSourceOptions) -> Self {
        self.data_sources.push(options);
        self
    }

    pub fn build(self) -> DataSourceManager {
        let registries = if self.builtin_interfaces {
            Registries::with_builtins()
        } else {
            Registries::new()
        };
        registries.interfaces.add_many(self.interfaces);
        registries.interfaces.add_groups(self.groups);
        registries.templates.add_many(self.templates);
        registries.mixins.add_many(self.mixins);

        let manager = DataSourceManager::with_registries(Arc::new(registries));
        manager.add_collections(self.collections, None);
        for options in self.data_sources {
            manager.add_data_source(options);
        }
        manager
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_data_source_always_exists() {
        let manager = DataSourceManager::new();
        assert_eq!(manager.get_data_sources().len(), 1);
        assert_eq!(manager.main().key(), DEFAULT_DATA_SOURCE_KEY);
        assert!(matches!(
            manager.remove_data_source(DEFAULT_DATA_SOURCE_KEY),
            Err(CoreError::DefaultDataSource { .. })
        ));
    }

    #[test]
    fn resolve_unknown_data_source_is_an_error() {
        let manager = DataSourceManager::new();
        let err = manager.resolve_data_source(Some("crm")).unwrap_err();
        assert_eq!(err.to_string(), "data source crm does not exist");
        assert!(manager.resolve_data_source(None).is_ok());
    }

    #[test]
    fn add_data_source_twice_updates_in_place() {
        let manager = DataSourceManager::new();
        let first = manager.add_data_source(DataSourceOptions::new("crm").with_display_name("CRM"));
        let second = manager.add_data_source(
            DataSourceOptions::new("crm")
                .with_display_name("Sales")
                .with_collections(vec![CollectionOptions::new("leads")]),
        );

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.display_name(), "Sales");
        assert_eq!(manager.get_collections(Some("crm")).len(), 1);
    }

    #[test]
    fn unknown_data_source_lookups_are_empty() {
        let manager = DataSourceManager::new();
        assert!(manager.get_collections(Some("nope")).is_empty());
        assert!(manager.get_collection("users", Some("nope")).is_none());
    }

    #[test]
    fn zero_interval_spawns_nothing() {
        let manager = DataSourceManager::new();
        assert!(manager.spawn_reload_task(Duration::ZERO, CancellationToken::new()).is_none());
    }
}
