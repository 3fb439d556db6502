// ── Collection manager ──
//
// Owns the collections of one data source. Raw options are kept next to
// the instances so any registry change can rebuild every instance from
// scratch. Each mutation publishes a complete new snapshot.

use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tokio::sync::watch;
use tracing::{debug, warn};

use super::lookup::{CollectionLookup, CollectionResolver, FieldLookup, lookup_collection, lookup_field};
use crate::model::{Collection, CollectionField, CollectionOptions};
use crate::registry::{Registries, compose};
use crate::stream::CollectionStream;

/// Immutable view of a manager's collections at one point in time.
#[derive(Debug, Clone, Default)]
pub struct CollectionSnapshot {
    raw: IndexMap<String, CollectionOptions>,
    instances: IndexMap<String, Arc<Collection>>,
}

impl CollectionSnapshot {
    pub fn get(&self, name: &str) -> Option<&Arc<Collection>> {
        self.instances.get(name)
    }

    /// Collections in insertion order.
    pub fn collections(&self) -> impl Iterator<Item = &Arc<Collection>> {
        self.instances.values()
    }

    pub fn to_vec(&self) -> Vec<Arc<Collection>> {
        self.instances.values().cloned().collect()
    }

    /// The options a collection was registered with, before any template
    /// transform or interface defaults.
    pub fn raw(&self, name: &str) -> Option<&CollectionOptions> {
        self.raw.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.instances.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Collections of a single data source.
pub struct CollectionManager {
    data_source_key: String,
    registries: Arc<Registries>,
    snapshot: watch::Sender<Arc<CollectionSnapshot>>,
    last_reload: watch::Sender<Option<DateTime<Utc>>>,
}

impl CollectionManager {
    pub fn new(data_source_key: impl Into<String>, registries: Arc<Registries>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(CollectionSnapshot::default()));
        let (last_reload, _) = watch::channel(None);
        Self {
            data_source_key: data_source_key.into(),
            registries,
            snapshot,
            last_reload,
        }
    }

    pub fn data_source_key(&self) -> &str {
        &self.data_source_key
    }

    pub fn registries(&self) -> &Arc<Registries> {
        &self.registries
    }

    // ── Mutation ─────────────────────────────────────────────────────

    /// Merge `collections` into the current set. Within one call the last
    /// definition of a name wins; existing names are replaced in place.
    pub fn add_collections(&self, collections: impl IntoIterator<Item = CollectionOptions>) {
        let incoming = dedupe(collections);
        if incoming.is_empty() {
            return;
        }
        let count = incoming.len();
        self.publish(|current| {
            let mut next = CollectionSnapshot::clone(current);
            for (name, raw) in incoming {
                let instance = self.instantiate(&raw);
                next.instances.insert(name.clone(), instance);
                next.raw.insert(name, raw);
            }
            next
        });
        debug!(data_source = %self.data_source_key, count, "collections added");
    }

    /// Replace the whole set with `collections`.
    pub fn set_collections(&self, collections: impl IntoIterator<Item = CollectionOptions>) {
        let incoming = dedupe(collections);
        let count = incoming.len();
        self.publish(|_| {
            let mut next = CollectionSnapshot::default();
            for (name, raw) in incoming {
                let instance = self.instantiate(&raw);
                next.instances.insert(name.clone(), instance);
                next.raw.insert(name, raw);
            }
            next
        });
        debug!(data_source = %self.data_source_key, count, "collections replaced");
    }

    /// Rebuild every instance from its raw options.
    pub fn reinstantiate(&self) {
        self.reinstantiate_where(|_| true);
    }

    /// Rebuild the instances whose raw options match `predicate`.
    /// Returns how many were rebuilt.
    pub fn reinstantiate_where<F>(&self, predicate: F) -> usize
    where
        F: Fn(&CollectionOptions) -> bool,
    {
        let mut rebuilt = 0;
        self.publish(|current| {
            let mut next = CollectionSnapshot::clone(current);
            for (name, raw) in &current.raw {
                if predicate(raw) {
                    next.instances.insert(name.clone(), self.instantiate(raw));
                    rebuilt += 1;
                }
            }
            next
        });
        debug!(data_source = %self.data_source_key, rebuilt, "collections re-instantiated");
        rebuilt
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// Resolve a collection by name, one-hop association path, or inline options.
    pub fn get_collection<'a>(&self, target: impl Into<CollectionLookup<'a>>) -> Option<Arc<Collection>> {
        lookup_collection(self, &self.data_source_key, target.into())
    }

    pub fn get_collection_name<'a>(&self, target: impl Into<CollectionLookup<'a>>) -> Option<String> {
        self.get_collection(target).map(|c| c.name().to_owned())
    }

    /// Resolve a field by dotted path of any depth, or pass inline options through.
    pub fn get_collection_field<'a>(&self, target: impl Into<FieldLookup<'a>>) -> Option<Arc<CollectionField>> {
        lookup_field(self, &self.data_source_key, target.into())
    }

    /// Fields of the resolved collection; empty when it doesn't resolve.
    pub fn get_collection_fields<'a>(&self, target: impl Into<CollectionLookup<'a>>) -> Vec<Arc<CollectionField>> {
        self.get_collection(target)
            .map(|c| c.get_fields())
            .unwrap_or_default()
    }

    pub fn get_collections(&self) -> Vec<Arc<Collection>> {
        self.snapshot().to_vec()
    }

    pub fn get_collections_where<F>(&self, predicate: F) -> Vec<Arc<Collection>>
    where
        F: Fn(&Collection) -> bool,
    {
        self.snapshot()
            .collections()
            .filter(|c| predicate(c))
            .cloned()
            .collect()
    }

    /// Ancestors of `name`, breadth-first, nearest first. Each appears once.
    pub fn get_inherit_chain(&self, name: &str) -> Vec<Arc<Collection>> {
        let snapshot = self.snapshot();
        let Some(start) = snapshot.get(name) else {
            return Vec::new();
        };

        let mut seen: HashSet<&str> = HashSet::from([name]);
        let mut queue: VecDeque<&str> = start.inherits().iter().map(String::as_str).collect();
        let mut chain = Vec::new();

        while let Some(parent) = queue.pop_front() {
            if !seen.insert(parent) {
                continue;
            }
            let Some(collection) = snapshot.get(parent) else {
                warn!(collection = %name, parent, "inherited collection not found");
                continue;
            };
            queue.extend(collection.inherits().iter().map(String::as_str));
            chain.push(Arc::clone(collection));
        }
        chain
    }

    /// Own fields followed by inherited ones. A name defined closer to
    /// `name` hides the same name further up the chain.
    pub fn get_all_fields(&self, name: &str) -> Vec<Arc<CollectionField>> {
        let Some(own) = self.get_collection(name) else {
            return Vec::new();
        };

        let mut fields: IndexMap<String, Arc<CollectionField>> = IndexMap::new();
        for collection in std::iter::once(own).chain(self.get_inherit_chain(name)) {
            for field in collection.get_fields() {
                fields.entry(field.name().to_owned()).or_insert(field);
            }
        }
        fields.into_values().collect()
    }

    // ── Snapshots ────────────────────────────────────────────────────

    /// Current snapshot (cheap `Arc` clone).
    pub fn snapshot(&self) -> Arc<CollectionSnapshot> {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> CollectionStream {
        CollectionStream::new(self.snapshot.subscribe())
    }

    pub fn len(&self) -> usize {
        self.snapshot.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot.borrow().is_empty()
    }

    /// When a reload provider last replaced this manager's collections.
    pub fn last_reload(&self) -> Option<DateTime<Utc>> {
        *self.last_reload.borrow()
    }

    pub(crate) fn mark_reloaded(&self) {
        self.last_reload.send_replace(Some(Utc::now()));
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// Build the next snapshot from the current one and broadcast it.
    fn publish<F>(&self, build: F)
    where
        F: FnOnce(&CollectionSnapshot) -> CollectionSnapshot,
    {
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| {
            let next = build(&**snap);
            *snap = Arc::new(next);
        });
    }

    fn instantiate(&self, raw: &CollectionOptions) -> Arc<Collection> {
        let template = raw
            .template
            .as_deref()
            .and_then(|name| self.registries.templates.get(name));

        let options = match &template {
            Some(template) => template.transform(raw.clone()),
            None => raw.clone(),
        };
        let base = template.as_ref().and_then(|t| t.collection());
        let methods = compose(base, &self.registries.mixins.get_all());

        Arc::new(Collection::build(
            options,
            &self.data_source_key,
            Some(Arc::clone(&self.registries.interfaces)),
            methods,
        ))
    }
}

impl CollectionResolver for CollectionManager {
    fn resolve(&self, data_source_key: &str, name: &str) -> Option<Arc<Collection>> {
        if data_source_key != self.data_source_key {
            return None;
        }
        self.snapshot.borrow().get(name).cloned()
    }
}

impl fmt::Debug for CollectionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionManager")
            .field("data_source_key", &self.data_source_key)
            .field("collections", &self.len())
            .finish_non_exhaustive()
    }
}

/// Key by name, last definition wins; nameless entries are dropped.
fn dedupe(collections: impl IntoIterator<Item = CollectionOptions>) -> IndexMap<String, CollectionOptions> {
    let mut out = IndexMap::new();
    for raw in collections {
        if raw.name.is_empty() {
            warn!("collection without a name ignored");
            continue;
        }
        out.insert(raw.name.clone(), raw);
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::FieldOptions;

    fn manager() -> CollectionManager {
        CollectionManager::new("main", Arc::new(Registries::new()))
    }

    #[test]
    fn add_dedupes_within_a_call() {
        let manager = manager();
        manager.add_collections([
            CollectionOptions::new("a").with_title("first"),
            CollectionOptions::new("b"),
            CollectionOptions::new("a").with_title("second"),
        ]);

        let names: Vec<String> = manager.get_collections().iter().map(|c| c.name().to_owned()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(manager.get_collection("a").unwrap().title(), Some("second"));
    }

    #[test]
    fn add_merges_and_set_replaces() {
        let manager = manager();
        manager.add_collections([CollectionOptions::new("a")]);
        manager.add_collections([CollectionOptions::new("b")]);
        assert_eq!(manager.len(), 2);

        manager.set_collections([CollectionOptions::new("c")]);
        assert_eq!(manager.len(), 1);
        assert!(manager.get_collection("a").is_none());
    }

    #[test]
    fn nameless_collections_are_skipped() {
        let manager = manager();
        manager.add_collections([CollectionOptions::default(), CollectionOptions::new("a")]);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn inherit_chain_is_breadth_first_and_cycle_safe() {
        let manager = manager();
        manager.add_collections([
            CollectionOptions::new("base").with_inherits(["admins"]),
            CollectionOptions::new("users").with_inherits(["base"]),
            CollectionOptions::new("admins").with_inherits(["users", "base"]),
        ]);

        let chain: Vec<String> = manager
            .get_inherit_chain("admins")
            .iter()
            .map(|c| c.name().to_owned())
            .collect();
        assert_eq!(chain, vec!["users", "base"]);
    }

    #[test]
    fn all_fields_prefer_the_nearest_definition() {
        let manager = manager();
        manager.add_collections([
            CollectionOptions::new("base")
                .field(FieldOptions::new("id").with_type("bigInt"))
                .field(FieldOptions::new("title").with_type("string")),
            CollectionOptions::new("posts")
                .with_inherits(["base"])
                .field(FieldOptions::new("title").with_type("text")),
        ]);

        let fields = manager.get_all_fields("posts");
        let summary: Vec<(String, Option<String>)> = fields
            .iter()
            .map(|f| (f.name().to_owned(), f.field_type().map(str::to_owned)))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("title".to_owned(), Some("text".to_owned())),
                ("id".to_owned(), Some("bigInt".to_owned())),
            ]
        );
    }

    #[test]
    fn raw_options_survive_in_snapshot() {
        let manager = manager();
        manager.add_collections([CollectionOptions::new("a").with_template("tree")]);
        let snapshot = manager.snapshot();
        assert_eq!(snapshot.raw("a").and_then(|r| r.template.as_deref()), Some("tree"));
    }
}
