//! Runtime metadata registry for collections (tables) and the data sources
//! that hold them.
//!
//! - **[`DataSourceManager`]**: Entry point. Owns the registries, every
//!   [`DataSource`] (always including the default `"main"`) and the async
//!   reload machinery: pluggable providers, per-scope serialization,
//!   callbacks and a periodic [`spawn_reload_task`](DataSourceManager::spawn_reload_task).
//!
//! - **[`CollectionManager`]**: The collections of one data source. Keeps
//!   raw options next to instances and rebuilds instances whenever a
//!   registry changes. Publishes immutable [`CollectionSnapshot`]s through
//!   a `watch` channel; [`CollectionStream`] subscribes to them.
//!
//! - **Registries** ([`registry`]): [`FieldInterface`]s with their groups,
//!   [`CollectionTemplate`]s and collection mixins
//!   ([`CollectionBehavior`]), composed into one method table per
//!   [`Collection`].
//!
//! - **Lookups**: dotted paths (`"users.roles"`, `"users.roles.name"`)
//!   resolved across association fields. A miss is always `None`.
//!
//! - **[`CollectionRepository`]**: filter/paginate collections as plain rows.

pub mod error;
pub mod model;
pub mod registry;
pub mod repository;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use error::CoreError;
pub use model::{AssociationKind, Collection, CollectionField, CollectionOptions, DataSourceOptions, FieldOptions};
pub use registry::{
    CollectionBehavior, CollectionMethod, CollectionMixin, CollectionTemplate, FieldInterface, FieldInterfaceGroup,
    Filterable, FilterOperator, Registries,
};
pub use repository::{CollectionRepository, CollectionRow, Filter, Page, Repository};
pub use store::{
    CollectionLookup, CollectionManager, CollectionSnapshot, DEFAULT_DATA_SOURCE_KEY, DataSource,
    DataSourceCollections, DataSourceManager, FieldLookup,
};
pub use stream::{CollectionStream, CollectionWatchStream};
