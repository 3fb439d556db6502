// ── Extension registries ──
//
// Field interfaces, collection templates and mixins. One `Registries`
// value is shared by every collection manager of a data source manager.

mod builtin;
mod interface;
mod mixin;
mod template;

use std::sync::Arc;

pub use builtin::{builtin_groups, builtin_interfaces};
pub use interface::{
    FieldInterface, FieldInterfaceGroup, FieldInterfaceRegistry, FilterOperator, Filterable,
    FilterableChild, ValidateSchemaFn,
};
pub(crate) use mixin::{MethodTable, compose};
pub use mixin::{CollectionBehavior, CollectionMethod, CollectionMixin, MixinRegistry};
pub use template::{CollectionTemplate, CollectionTemplateRegistry, TransformFn};

/// The registries one data source manager resolves collections against.
#[derive(Debug, Default)]
pub struct Registries {
    pub(crate) interfaces: Arc<FieldInterfaceRegistry>,
    pub(crate) templates: CollectionTemplateRegistry,
    pub(crate) mixins: MixinRegistry,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registries preloaded with the built-in interfaces and groups.
    pub fn with_builtins() -> Self {
        let registries = Self::new();
        registries.interfaces.add_many(builtin_interfaces());
        registries.interfaces.add_groups(builtin_groups());
        registries
    }

    pub fn field_interfaces(&self) -> &FieldInterfaceRegistry {
        &self.interfaces
    }

    pub fn templates(&self) -> &CollectionTemplateRegistry {
        &self.templates
    }

    pub fn mixins(&self) -> &MixinRegistry {
        &self.mixins
    }
}
