// ── Collection templates ──
//
// A template pre-shapes raw collection options and may supply the base
// behavior ("collection constructor") for collections created from it.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use tracing::debug;

use super::mixin::CollectionBehavior;
use crate::model::CollectionOptions;

/// Rewrites raw options before instantiation.
pub type TransformFn = Arc<dyn Fn(CollectionOptions) -> CollectionOptions + Send + Sync>;

#[derive(Clone)]
pub struct CollectionTemplate {
    name: String,
    title: Option<String>,
    order: i32,
    collection: Option<Arc<CollectionBehavior>>,
    transform: Option<TransformFn>,
}

impl CollectionTemplate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            order: 0,
            collection: None,
            transform: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    /// Base behavior for collections of this template.
    pub fn with_collection(mut self, behavior: CollectionBehavior) -> Self {
        self.collection = Some(Arc::new(behavior));
        self
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(CollectionOptions) -> CollectionOptions + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn order(&self) -> i32 {
        self.order
    }

    pub fn collection(&self) -> Option<&CollectionBehavior> {
        self.collection.as_deref()
    }

    /// Apply the transform, or return the options unchanged.
    pub fn transform(&self, options: CollectionOptions) -> CollectionOptions {
        match &self.transform {
            Some(transform) => transform(options),
            None => options,
        }
    }
}

impl fmt::Debug for CollectionTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionTemplate")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("collection", &self.collection.as_ref().map(|c| c.name().to_owned()))
            .field("transform", &self.transform.is_some())
            .finish()
    }
}

/// Templates keyed by name, in registration order.
pub struct CollectionTemplateRegistry {
    templates: ArcSwap<IndexMap<String, Arc<CollectionTemplate>>>,
}

impl CollectionTemplateRegistry {
    pub fn new() -> Self {
        Self {
            templates: ArcSwap::from_pointee(IndexMap::new()),
        }
    }

    pub fn add(&self, template: CollectionTemplate) {
        self.add_many(std::iter::once(template));
    }

    /// Register templates and return their names.
    pub fn add_many(&self, templates: impl IntoIterator<Item = CollectionTemplate>) -> Vec<String> {
        let incoming: Vec<Arc<CollectionTemplate>> = templates.into_iter().map(Arc::new).collect();
        if incoming.is_empty() {
            return Vec::new();
        }
        self.templates.rcu(|current| {
            let mut next = (**current).clone();
            for template in &incoming {
                next.insert(template.name.clone(), Arc::clone(template));
            }
            next
        });
        debug!(count = incoming.len(), "collection templates registered");
        incoming.iter().map(|t| t.name.clone()).collect()
    }

    pub fn get(&self, name: &str) -> Option<Arc<CollectionTemplate>> {
        self.templates.load().get(name).cloned()
    }

    pub fn get_all(&self) -> Vec<Arc<CollectionTemplate>> {
        self.templates.load().values().cloned().collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.templates.load().contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.templates.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.load().is_empty()
    }
}

impl Default for CollectionTemplateRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CollectionTemplateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionTemplateRegistry")
            .field("templates", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_defaults_to_identity() {
        let template = CollectionTemplate::new("general");
        let options = CollectionOptions::new("users");
        assert_eq!(template.transform(options.clone()), options);
    }

    #[test]
    fn transform_rewrites_options() {
        let template = CollectionTemplate::new("tree").with_transform(|opts| opts.with_title("Tree"));
        let out = template.transform(CollectionOptions::new("categories"));
        assert_eq!(out.title.as_deref(), Some("Tree"));
    }

    #[test]
    fn registry_overwrites_by_name() {
        let registry = CollectionTemplateRegistry::new();
        registry.add(CollectionTemplate::new("tree").with_title("v1"));
        registry.add(CollectionTemplate::new("tree").with_title("v2"));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("tree").and_then(|t| t.title().map(str::to_owned)).as_deref(), Some("v2"));
        assert!(registry.get("missing").is_none());
    }
}
