// ── Collection field ──
//
// A resolved field attached to a collection: its raw options with the
// bound interface's defaults merged underneath and `collectionName` set to
// the owner.

use serde::Serialize;
use serde_json::Value;
use strum::{AsRefStr, Display, EnumString};
use tracing::warn;

use super::merge::merge_values;
use super::options::FieldOptions;
use crate::registry::{FieldInterface, FieldInterfaceRegistry};

/// Storage types that describe an association between two collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub enum AssociationKind {
    BelongsTo,
    HasOne,
    HasMany,
    BelongsToMany,
}

/// A field of a [`Collection`](crate::Collection).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CollectionField {
    options: FieldOptions,
}

impl CollectionField {
    /// Wrap field options as-is, without interface defaults.
    pub fn new(options: FieldOptions) -> Self {
        Self { options }
    }

    pub fn name(&self) -> &str {
        &self.options.name
    }

    pub fn field_type(&self) -> Option<&str> {
        self.options.field_type.as_deref()
    }

    pub fn interface(&self) -> Option<&str> {
        self.options.interface.as_deref()
    }

    pub fn target(&self) -> Option<&str> {
        self.options.target.as_deref()
    }

    pub fn target_data_source(&self) -> Option<&str> {
        self.options.target_data_source.as_deref()
    }

    pub fn source_key(&self) -> Option<&str> {
        self.options.source_key.as_deref()
    }

    pub fn foreign_key(&self) -> Option<&str> {
        self.options.foreign_key.as_deref()
    }

    pub fn target_key(&self) -> Option<&str> {
        self.options.target_key.as_deref()
    }

    pub fn ui_schema(&self) -> Option<&Value> {
        self.options.ui_schema.as_ref()
    }

    pub fn collection_name(&self) -> Option<&str> {
        self.options.collection_name.as_deref()
    }

    /// Look up an option that has no typed accessor.
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.options.extra.get(key)
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// Association kind derived from the storage type, if it is one.
    pub fn association_kind(&self) -> Option<AssociationKind> {
        self.field_type().and_then(|t| t.parse().ok())
    }

    /// A field is an association when it points at a target collection.
    pub fn is_association(&self) -> bool {
        self.target().is_some()
    }
}

/// Build the field a collection stores for `options`: interface defaults
/// merged under the explicit options, owner name stamped on.
pub(crate) fn resolve_field(
    collection_name: &str,
    options: FieldOptions,
    interfaces: Option<&FieldInterfaceRegistry>,
) -> CollectionField {
    let interface = options
        .interface
        .as_deref()
        .and_then(|name| interfaces.and_then(|registry| registry.get(name)));

    let mut options = match interface {
        Some(interface) => apply_interface_defaults(&interface, options),
        None => options,
    };
    options.collection_name = Some(collection_name.to_owned());
    CollectionField::new(options)
}

fn apply_interface_defaults(interface: &FieldInterface, options: FieldOptions) -> FieldOptions {
    if interface.default_options.is_empty() {
        return options;
    }

    let explicit = match serde_json::to_value(&options) {
        Ok(value) => value,
        Err(e) => {
            warn!(field = %options.name, error = %e, "field options not serializable, interface defaults skipped");
            return options;
        }
    };

    let mut merged = Value::Object(interface.default_options.clone());
    merge_values(&mut merged, explicit);

    match serde_json::from_value(merged) {
        Ok(resolved) => resolved,
        Err(e) => {
            warn!(
                field = %options.name,
                interface = %interface.name,
                error = %e,
                "interface defaults do not fit field options, using explicit options only"
            );
            options
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry_with_integer() -> FieldInterfaceRegistry {
        let registry = FieldInterfaceRegistry::new();
        registry.add(
            FieldInterface::new("integer").with_default_options(json!({
                "type": "bigInt",
                "uiSchema": { "type": "number", "x-component": "InputNumber" }
            })),
        );
        registry
    }

    #[test]
    fn interface_defaults_merge_under_explicit_options() {
        let registry = registry_with_integer();
        let field = resolve_field(
            "users",
            FieldOptions::new("age")
                .with_interface("integer")
                .with_ui_schema(json!({ "title": "Age" })),
            Some(&registry),
        );

        assert_eq!(field.field_type(), Some("bigInt"));
        assert_eq!(
            field.ui_schema(),
            Some(&json!({ "type": "number", "x-component": "InputNumber", "title": "Age" }))
        );
        assert_eq!(field.collection_name(), Some("users"));
    }

    #[test]
    fn explicit_type_beats_interface_default() {
        let registry = registry_with_integer();
        let field = resolve_field(
            "users",
            FieldOptions::new("age").with_interface("integer").with_type("integer"),
            Some(&registry),
        );
        assert_eq!(field.field_type(), Some("integer"));
    }

    #[test]
    fn unknown_interface_leaves_options_alone() {
        let registry = registry_with_integer();
        let field = resolve_field(
            "users",
            FieldOptions::new("nickname").with_interface("nope").with_type("string"),
            Some(&registry),
        );
        assert_eq!(field.field_type(), Some("string"));
        assert!(field.ui_schema().is_none());
    }

    #[test]
    fn association_kind_parses_storage_type() {
        let field = CollectionField::new(
            FieldOptions::new("roles")
                .with_type("belongsToMany")
                .with_target("roles"),
        );
        assert_eq!(field.association_kind(), Some(AssociationKind::BelongsToMany));
        assert!(field.is_association());

        let plain = CollectionField::new(FieldOptions::new("nickname").with_type("string"));
        assert_eq!(plain.association_kind(), None);
        assert!(!plain.is_association());
    }
}
