// ── Collection behaviors and mixins ──
//
// A behavior is a named table of methods callable on a collection. Mixins
// are behaviors applied to every collection; templates may carry one as the
// collection's base. Composition flattens them into a single method table
// per instance, rebuilt on every instantiation.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::Collection;

/// A method callable through [`Collection::call`].
pub type CollectionMethod = Arc<dyn Fn(&Collection, &[Value]) -> Value + Send + Sync>;

/// Names served by `Collection`'s own accessors. Behaviors can't take them.
pub(crate) const RESERVED_METHODS: &[&str] = &[
    "name",
    "title",
    "options",
    "getField",
    "get_field",
    "getFields",
    "get_fields",
    "setField",
    "set_field",
    "removeField",
    "remove_field",
    "hasMethod",
    "has_method",
    "call",
];

/// Named method table.
#[derive(Clone)]
pub struct CollectionBehavior {
    name: String,
    methods: IndexMap<String, CollectionMethod>,
}

/// Mixins are plain behaviors applied to every collection.
pub type CollectionMixin = CollectionBehavior;

impl CollectionBehavior {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: IndexMap::new(),
        }
    }

    /// Add a method. A second method of the same name replaces the first.
    pub fn method<F>(mut self, name: impl Into<String>, method: F) -> Self
    where
        F: Fn(&Collection, &[Value]) -> Value + Send + Sync + 'static,
    {
        self.methods.insert(name.into(), Arc::new(method));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }
}

impl fmt::Debug for CollectionBehavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionBehavior")
            .field("name", &self.name)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ── Method table ─────────────────────────────────────────────────────

/// Flattened methods of one collection instance.
#[derive(Clone, Default)]
pub(crate) struct MethodTable {
    methods: IndexMap<String, CollectionMethod>,
}

impl MethodTable {
    pub(crate) fn get(&self, name: &str) -> Option<&CollectionMethod> {
        self.methods.get(name)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.methods.keys().map(String::as_str)
    }

    fn merge(&mut self, behavior: &CollectionBehavior) {
        for (name, method) in &behavior.methods {
            if RESERVED_METHODS.contains(&name.as_str()) {
                warn!(behavior = %behavior.name, method = %name, "method name is reserved, dropped");
                continue;
            }
            self.methods.insert(name.clone(), Arc::clone(method));
        }
    }
}

impl fmt::Debug for MethodTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.methods.keys()).finish()
    }
}

/// Flatten mixins (registration order, later wins) and then the base
/// behavior, whose methods are never shadowed by a mixin.
pub(crate) fn compose(base: Option<&CollectionBehavior>, mixins: &[Arc<CollectionMixin>]) -> MethodTable {
    let mut table = MethodTable::default();
    for mixin in mixins {
        table.merge(mixin);
    }
    if let Some(base) = base {
        table.merge(base);
    }
    table
}

// ── Registry ─────────────────────────────────────────────────────────

/// Registered mixins in registration order. Re-registering a name moves
/// the mixin to the end, so it wins collisions like any newer mixin.
pub struct MixinRegistry {
    mixins: ArcSwap<IndexMap<String, Arc<CollectionMixin>>>,
}

impl MixinRegistry {
    pub fn new() -> Self {
        Self {
            mixins: ArcSwap::from_pointee(IndexMap::new()),
        }
    }

    pub fn add_many(&self, mixins: impl IntoIterator<Item = CollectionMixin>) -> usize {
        let incoming: Vec<Arc<CollectionMixin>> = mixins.into_iter().map(Arc::new).collect();
        if incoming.is_empty() {
            return 0;
        }
        self.mixins.rcu(|current| {
            let mut next = (**current).clone();
            for mixin in &incoming {
                next.shift_remove(&mixin.name);
                next.insert(mixin.name.clone(), Arc::clone(mixin));
            }
            next
        });
        debug!(count = incoming.len(), "collection mixins registered");
        incoming.len()
    }

    pub fn get_all(&self) -> Vec<Arc<CollectionMixin>> {
        self.mixins.load().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.mixins.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.mixins.load().is_empty()
    }
}

impl Default for MixinRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MixinRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MixinRegistry").field("mixins", &self.len()).finish()
    }
}
