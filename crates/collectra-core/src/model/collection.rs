// ── Collection ──
//
// One instantiated collection: its resolved options, an ordered field map
// and the method table composed from mixins and its template behavior.
// Instances are replaced wholesale on re-instantiation; only the field map
// is mutable in place.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use serde_json::Value;

use super::field::{CollectionField, resolve_field};
use super::options::{CollectionOptions, FieldOptions};
use crate::registry::{FieldInterfaceRegistry, MethodTable};
use crate::store::DEFAULT_DATA_SOURCE_KEY;

const DEFAULT_FILTER_TARGET_KEY: &str = "id";

type FieldMap = IndexMap<String, Arc<CollectionField>>;

pub struct Collection {
    data_source_key: String,
    /// Resolved options with `fields` emptied; fields live in `fields`.
    options: CollectionOptions,
    fields: ArcSwap<FieldMap>,
    methods: MethodTable,
    interfaces: Option<Arc<FieldInterfaceRegistry>>,
}

impl Collection {
    pub(crate) fn build(
        mut options: CollectionOptions,
        data_source_key: &str,
        interfaces: Option<Arc<FieldInterfaceRegistry>>,
        methods: MethodTable,
    ) -> Self {
        let raw_fields = std::mem::take(&mut options.fields);
        let mut fields = FieldMap::with_capacity(raw_fields.len());
        for field in raw_fields {
            let field = resolve_field(&options.name, field, interfaces.as_deref());
            fields.insert(field.name().to_owned(), Arc::new(field));
        }

        Self {
            data_source_key: data_source_key.to_owned(),
            options,
            fields: ArcSwap::from_pointee(fields),
            methods,
            interfaces,
        }
    }

    /// A standalone instance that belongs to no manager: no interface
    /// defaults, no mixins, default data source.
    pub fn detached(options: CollectionOptions) -> Self {
        Self::build(options, DEFAULT_DATA_SOURCE_KEY, None, MethodTable::default())
    }

    // ── Core accessors ───────────────────────────────────────────────

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn title(&self) -> Option<&str> {
        self.options.title.as_deref()
    }

    pub fn data_source_key(&self) -> &str {
        &self.data_source_key
    }

    pub fn template(&self) -> Option<&str> {
        self.options.template.as_deref()
    }

    /// Parent collection names, nearest first.
    pub fn inherits(&self) -> &[String] {
        &self.options.inherits
    }

    pub fn hidden(&self) -> bool {
        self.options.hidden
    }

    pub fn filter_target_key(&self) -> &str {
        self.options
            .filter_target_key
            .as_deref()
            .unwrap_or(DEFAULT_FILTER_TARGET_KEY)
    }

    /// Look up an option that has no typed accessor.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.extra.get(key)
    }

    /// The options as a plain object, including current fields.
    pub fn options(&self) -> CollectionOptions {
        let mut options = self.options.clone();
        options.fields = self
            .fields
            .load()
            .values()
            .map(|field| field.options().clone())
            .collect();
        options
    }

    // ── Fields ───────────────────────────────────────────────────────

    pub fn get_field(&self, name: &str) -> Option<Arc<CollectionField>> {
        self.fields.load().get(name).cloned()
    }

    /// All fields in declaration order.
    pub fn get_fields(&self) -> Vec<Arc<CollectionField>> {
        self.fields.load().values().cloned().collect()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.load().contains_key(name)
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields.load().keys().cloned().collect()
    }

    /// Add or replace the field `name`. An existing field keeps its position.
    pub fn set_field(&self, name: &str, mut options: FieldOptions) -> Arc<CollectionField> {
        name.clone_into(&mut options.name);
        let field = Arc::new(resolve_field(self.name(), options, self.interfaces.as_deref()));
        self.fields.rcu(|current| {
            let mut next = (**current).clone();
            next.insert(name.to_owned(), Arc::clone(&field));
            next
        });
        field
    }

    /// Like [`set_field`](Self::set_field), but layers `options` over the
    /// existing field's options instead of replacing them.
    pub fn merge_field(&self, name: &str, options: FieldOptions) -> Arc<CollectionField> {
        let merged = match self.get_field(name) {
            Some(existing) => merge_field_options(existing.options(), options),
            None => options,
        };
        self.set_field(name, merged)
    }

    pub fn remove_field(&self, name: &str) -> Option<Arc<CollectionField>> {
        let removed = self.get_field(name)?;
        self.fields.rcu(|current| {
            let mut next = (**current).clone();
            next.shift_remove(name);
            next
        });
        Some(removed)
    }

    // ── Behavior methods ─────────────────────────────────────────────

    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains(name)
    }

    /// Invoke a mixin or template method. `None` when no such method exists.
    pub fn call(&self, method: &str, args: &[Value]) -> Option<Value> {
        let method = self.methods.get(method)?;
        Some(method(self, args))
    }

    pub fn method_names(&self) -> Vec<&str> {
        self.methods.names().collect()
    }
}

fn merge_field_options(existing: &FieldOptions, update: FieldOptions) -> FieldOptions {
    let (Ok(mut base), Ok(overlay)) = (serde_json::to_value(existing), serde_json::to_value(&update)) else {
        return update;
    };
    super::merge::merge_values(&mut base, overlay);
    serde_json::from_value(base).unwrap_or(update)
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name())
            .field("data_source_key", &self.data_source_key)
            .field("fields", &self.field_names())
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn users() -> Collection {
        Collection::detached(
            CollectionOptions::new("users")
                .field(FieldOptions::new("nickname").with_type("string"))
                .field(FieldOptions::new("email").with_type("string")),
        )
    }

    #[test]
    fn fields_keep_declaration_order_and_owner() {
        let users = users();
        assert_eq!(users.field_names(), vec!["nickname", "email"]);
        assert_eq!(users.get_field("email").unwrap().collection_name(), Some("users"));
        assert_eq!(users.filter_target_key(), "id");
    }

    #[test]
    fn set_field_replaces_in_place() {
        let users = users();
        users.set_field("nickname", FieldOptions::new("ignored").with_type("text"));

        assert_eq!(users.field_names(), vec!["nickname", "email"]);
        let nickname = users.get_field("nickname").unwrap();
        assert_eq!(nickname.field_type(), Some("text"));
        assert_eq!(nickname.name(), "nickname");
    }

    #[test]
    fn merge_field_keeps_previous_options() {
        let users = users();
        users.merge_field(
            "nickname",
            FieldOptions::new("nickname").with_ui_schema(json!({ "title": "Nickname" })),
        );

        let nickname = users.get_field("nickname").unwrap();
        assert_eq!(nickname.field_type(), Some("string"));
        assert_eq!(nickname.ui_schema(), Some(&json!({ "title": "Nickname" })));
    }

    #[test]
    fn remove_field_drops_it() {
        let users = users();
        assert!(users.remove_field("email").is_some());
        assert!(users.remove_field("email").is_none());
        assert_eq!(users.options().fields.len(), 1);
    }

    #[test]
    fn call_without_method_is_none() {
        let users = users();
        assert!(!users.has_method("anything"));
        assert!(users.call("anything", &[]).is_none());
    }
}
