// ── Domain model ──
//
// Raw option objects and the instantiated collections and fields built
// from them.

mod collection;
mod field;
mod merge;
mod options;

pub use collection::Collection;
pub use field::{AssociationKind, CollectionField};
pub use options::{CollectionOptions, DataSourceOptions, FieldOptions};
