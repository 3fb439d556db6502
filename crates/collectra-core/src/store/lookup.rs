// ── Dotted-path lookup ──
//
// Resolves `"users"`, `"users.roles"` and `"users.roles.name"` style
// targets by walking association fields. Every miss is a `None`.

use std::sync::Arc;

use crate::model::{Collection, CollectionField, CollectionOptions, FieldOptions};
use crate::registry::MethodTable;

/// What to resolve a collection from.
#[derive(Debug, Clone, Copy)]
pub enum CollectionLookup<'a> {
    /// `"name"` or `"name.association"`.
    Path(&'a str),
    /// Options used as-is to build a detached instance.
    Inline(&'a CollectionOptions),
    Missing,
}

impl<'a> From<&'a str> for CollectionLookup<'a> {
    fn from(path: &'a str) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a String> for CollectionLookup<'a> {
    fn from(path: &'a String) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<Option<&'a str>> for CollectionLookup<'a> {
    fn from(path: Option<&'a str>) -> Self {
        path.map_or(Self::Missing, Self::Path)
    }
}

impl<'a> From<&'a CollectionOptions> for CollectionLookup<'a> {
    fn from(options: &'a CollectionOptions) -> Self {
        Self::Inline(options)
    }
}

/// What to resolve a field from.
#[derive(Debug, Clone, Copy)]
pub enum FieldLookup<'a> {
    /// `"collection.field"`, with any number of association hops between.
    Path(&'a str),
    /// Options returned unchanged.
    Inline(&'a FieldOptions),
    Missing,
}

impl<'a> From<&'a str> for FieldLookup<'a> {
    fn from(path: &'a str) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<&'a String> for FieldLookup<'a> {
    fn from(path: &'a String) -> Self {
        Self::Path(path)
    }
}

impl<'a> From<Option<&'a str>> for FieldLookup<'a> {
    fn from(path: Option<&'a str>) -> Self {
        path.map_or(Self::Missing, Self::Path)
    }
}

impl<'a> From<&'a FieldOptions> for FieldLookup<'a> {
    fn from(options: &'a FieldOptions) -> Self {
        Self::Inline(options)
    }
}

/// Source of collections by data source key and name.
pub(crate) trait CollectionResolver {
    fn resolve(&self, data_source_key: &str, name: &str) -> Option<Arc<Collection>>;
}

pub(crate) fn lookup_collection<R>(
    resolver: &R,
    data_source_key: &str,
    lookup: CollectionLookup<'_>,
) -> Option<Arc<Collection>>
where
    R: CollectionResolver + ?Sized,
{
    let path = match lookup {
        CollectionLookup::Path(path) => path,
        CollectionLookup::Inline(options) => {
            return Some(Arc::new(Collection::build(
                options.clone(),
                data_source_key,
                None,
                MethodTable::default(),
            )));
        }
        CollectionLookup::Missing => return None,
    };

    let mut segments = path.split('.');
    let head = resolver.resolve(data_source_key, segments.next()?)?;
    match (segments.next(), segments.next()) {
        (None, _) => Some(head),
        (Some(association), None) => {
            let field = head.get_field(association)?;
            follow(resolver, &head, &field)
        }
        _ => None,
    }
}

pub(crate) fn lookup_field<R>(
    resolver: &R,
    data_source_key: &str,
    lookup: FieldLookup<'_>,
) -> Option<Arc<CollectionField>>
where
    R: CollectionResolver + ?Sized,
{
    let path = match lookup {
        FieldLookup::Path(path) => path,
        FieldLookup::Inline(options) => return Some(Arc::new(CollectionField::new(options.clone()))),
        FieldLookup::Missing => return None,
    };

    let segments: Vec<&str> = path.split('.').collect();
    let (field_name, hops) = segments.split_last()?;
    let (collection_name, associations) = hops.split_first()?;

    let mut current = resolver.resolve(data_source_key, collection_name)?;
    for association in associations {
        let field = current.get_field(association)?;
        current = follow(resolver, &current, &field)?;
    }
    current.get_field(field_name)
}

/// Target collection of an association field, honoring `targetDataSource`.
fn follow<R>(resolver: &R, owner: &Collection, field: &CollectionField) -> Option<Arc<Collection>>
where
    R: CollectionResolver + ?Sized,
{
    let target = field.target()?;
    let data_source_key = field.target_data_source().unwrap_or(owner.data_source_key());
    resolver.resolve(data_source_key, target)
}
