// ── Field interfaces ──
//
// A field interface binds a storage type to UI defaults, filter operators
// and schema validation. Interfaces and their display groups live in two
// independent namespaces of the same registry.

use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Hook producing the validation schema fragment for a field schema.
pub type ValidateSchemaFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// A filter operator offered for fields of an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterOperator {
    pub label: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub no_value: bool,
}

impl FilterOperator {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
            no_value: false,
        }
    }

    /// Operator that takes no operand (`$empty`, `$isTruly`, ...).
    pub fn unary(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            no_value: true,
            ..Self::new(label, value)
        }
    }
}

/// Filter capability of an interface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filterable {
    #[serde(default)]
    pub operators: Vec<FilterOperator>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FilterableChild>,
}

/// A nested filter target, e.g. `createdBy.nickname`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterableChild {
    pub name: String,
    pub title: String,
    #[serde(default)]
    pub operators: Vec<FilterOperator>,
    #[serde(default)]
    pub schema: Value,
}

/// Display group for interfaces in field pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldInterfaceGroup {
    pub label: String,
    #[serde(default)]
    pub order: i32,
}

impl FieldInterfaceGroup {
    pub fn new(label: impl Into<String>, order: i32) -> Self {
        Self {
            label: label.into(),
            order,
        }
    }
}

/// A field interface definition.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldInterface {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default)]
    pub is_association: bool,
    #[serde(default)]
    pub sortable: bool,
    #[serde(default)]
    pub title_usable: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub available_types: Vec<String>,
    /// Field defaults merged under explicit field options.
    #[serde(default, rename = "default")]
    pub default_options: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filterable: Option<Filterable>,
    #[serde(skip)]
    validate_schema: Option<ValidateSchemaFn>,
}

impl FieldInterface {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn with_association(mut self, is_association: bool) -> Self {
        self.is_association = is_association;
        self
    }

    pub fn with_sortable(mut self, sortable: bool) -> Self {
        self.sortable = sortable;
        self
    }

    pub fn with_title_usable(mut self, title_usable: bool) -> Self {
        self.title_usable = title_usable;
        self
    }

    pub fn with_available_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.available_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Set the field defaults. Non-object values are ignored.
    pub fn with_default_options(mut self, defaults: Value) -> Self {
        if let Value::Object(map) = defaults {
            self.default_options = map;
        }
        self
    }

    pub fn with_filterable(mut self, filterable: Filterable) -> Self {
        self.filterable = Some(filterable);
        self
    }

    pub fn with_validate_schema<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.validate_schema = Some(Arc::new(hook));
        self
    }

    /// Storage type from the interface defaults.
    pub fn storage_type(&self) -> Option<&str> {
        self.default_options.get("type").and_then(Value::as_str)
    }

    /// Validation fragment for `field_schema`; an empty object without a hook.
    pub fn validate_schema(&self, field_schema: &Value) -> Value {
        match &self.validate_schema {
            Some(hook) => hook(field_schema),
            None => Value::Object(Map::new()),
        }
    }

    pub fn has_validate_schema(&self) -> bool {
        self.validate_schema.is_some()
    }
}

impl fmt::Debug for FieldInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInterface")
            .field("name", &self.name)
            .field("group", &self.group)
            .field("order", &self.order)
            .field("storage_type", &self.storage_type())
            .field("is_association", &self.is_association)
            .field("validate_schema", &self.validate_schema.is_some())
            .finish_non_exhaustive()
    }
}

// ── Registry ─────────────────────────────────────────────────────────

/// Interfaces and interface groups, keyed by name.
///
/// Registration order is preserved; re-registering a name replaces the
/// entry in place. Readers get `Arc` handles and never block writers.
pub struct FieldInterfaceRegistry {
    interfaces: ArcSwap<IndexMap<String, Arc<FieldInterface>>>,
    groups: ArcSwap<IndexMap<String, FieldInterfaceGroup>>,
}

impl FieldInterfaceRegistry {
    pub fn new() -> Self {
        Self {
            interfaces: ArcSwap::from_pointee(IndexMap::new()),
            groups: ArcSwap::from_pointee(IndexMap::new()),
        }
    }

    /// Register an interface, overwriting any previous one of the same name.
    pub fn add(&self, interface: FieldInterface) {
        self.add_many(std::iter::once(interface));
    }

    pub fn add_many(&self, interfaces: impl IntoIterator<Item = FieldInterface>) {
        let incoming: Vec<Arc<FieldInterface>> = interfaces.into_iter().map(Arc::new).collect();
        if incoming.is_empty() {
            return;
        }
        self.interfaces.rcu(|current| {
            let mut next = (**current).clone();
            for interface in &incoming {
                next.insert(interface.name.clone(), Arc::clone(interface));
            }
            next
        });
        debug!(count = incoming.len(), "field interfaces registered");
    }

    pub fn get(&self, name: &str) -> Option<Arc<FieldInterface>> {
        self.interfaces.load().get(name).cloned()
    }

    pub fn get_all(&self) -> Vec<Arc<FieldInterface>> {
        self.interfaces.load().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.interfaces.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.load().is_empty()
    }

    pub fn add_group(&self, name: impl Into<String>, group: FieldInterfaceGroup) {
        self.add_groups([(name.into(), group)]);
    }

    pub fn add_groups<I, S>(&self, groups: I)
    where
        I: IntoIterator<Item = (S, FieldInterfaceGroup)>,
        S: Into<String>,
    {
        let incoming: Vec<(String, FieldInterfaceGroup)> =
            groups.into_iter().map(|(name, group)| (name.into(), group)).collect();
        if incoming.is_empty() {
            return;
        }
        self.groups.rcu(|current| {
            let mut next = (**current).clone();
            for (name, group) in &incoming {
                next.insert(name.clone(), group.clone());
            }
            next
        });
    }

    pub fn get_group(&self, name: &str) -> Option<FieldInterfaceGroup> {
        self.groups.load().get(name).cloned()
    }

    pub fn get_groups(&self) -> IndexMap<String, FieldInterfaceGroup> {
        (**self.groups.load()).clone()
    }
}

impl Default for FieldInterfaceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FieldInterfaceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldInterfaceRegistry")
            .field("interfaces", &self.len())
            .field("groups", &self.groups.load().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn later_registration_overwrites_in_place() {
        let registry = FieldInterfaceRegistry::new();
        registry.add(FieldInterface::new("a").with_title("first"));
        registry.add(FieldInterface::new("b"));
        registry.add(FieldInterface::new("a").with_title("second"));

        let names: Vec<String> = registry.get_all().iter().map(|i| i.name.clone()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(
            registry.get("a").and_then(|i| i.title.clone()).as_deref(),
            Some("second")
        );
    }

    #[test]
    fn groups_are_a_separate_namespace() {
        let registry = FieldInterfaceRegistry::new();
        registry.add(FieldInterface::new("test"));
        registry.add_group("test", FieldInterfaceGroup::new("Test", 1));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get_group("test"), Some(FieldInterfaceGroup::new("Test", 1)));
        assert!(registry.get_group("missing").is_none());
    }

    #[test]
    fn validate_schema_defaults_to_empty_object() {
        let plain = FieldInterface::new("input");
        assert_eq!(plain.validate_schema(&json!({})), json!({}));

        let hooked = FieldInterface::new("integer")
            .with_validate_schema(|_| json!({ "minimum": { "type": "number" } }));
        assert_eq!(
            hooked.validate_schema(&json!({})),
            json!({ "minimum": { "type": "number" } })
        );
    }

    #[test]
    fn storage_type_comes_from_defaults() {
        let iface = FieldInterface::new("integer").with_default_options(json!({ "type": "bigInt" }));
        assert_eq!(iface.storage_type(), Some("bigInt"));
    }
}
