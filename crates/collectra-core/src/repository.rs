// ── Repository capability ──
//
// A read-only, in-memory repository over a set of collections, shaped like
// the list endpoints that expose collection metadata: filter by name and
// title, order by name, paginate.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::model::{Collection, FieldOptions};
use crate::store::CollectionManager;

const DEFAULT_PAGE_SIZE: usize = 20;

/// Generic find capability.
pub trait Repository {
    type Row;

    /// Matching rows, ordered and paginated.
    fn find(&self, filter: &Filter) -> Vec<Self::Row>;

    /// Matching rows of the requested page, and the total match count.
    fn find_and_count(&self, filter: &Filter) -> (Vec<Self::Row>, usize);
}

/// Row filter. Pagination is 1-based.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub name_includes: Option<String>,
    pub title_includes: Option<String>,
    pub hidden: Option<bool>,
    pub page: Option<usize>,
    pub page_size: Option<usize>,
}

impl Filter {
    pub fn page(&self) -> usize {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> usize {
        match self.page_size {
            Some(0) | None => DEFAULT_PAGE_SIZE,
            Some(size) => size,
        }
    }

    fn matches(&self, row: &CollectionRow) -> bool {
        let name_ok = self
            .name_includes
            .as_deref()
            .is_none_or(|needle| row.name.contains(needle));
        let title_ok = self
            .title_includes
            .as_deref()
            .is_none_or(|needle| row.title.as_deref().is_some_and(|title| title.contains(needle)));
        let hidden_ok = self.hidden.is_none_or(|hidden| row.hidden == hidden);
        name_ok && title_ok && hidden_ok
    }
}

/// One collection as a plain row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionRow {
    pub name: String,
    pub title: Option<String>,
    pub hidden: bool,
    pub template: Option<String>,
    pub inherits: Vec<String>,
    pub data_source_key: String,
    pub fields: Vec<FieldOptions>,
}

impl From<&Collection> for CollectionRow {
    fn from(collection: &Collection) -> Self {
        let title = collection.title().map(str::to_owned).or_else(|| {
            collection
                .option("uiSchema")
                .and_then(|schema| schema.get("title"))
                .and_then(Value::as_str)
                .map(str::to_owned)
        });

        Self {
            name: collection.name().to_owned(),
            title,
            hidden: collection.hidden(),
            template: collection.template().map(str::to_owned),
            inherits: collection.inherits().to_vec(),
            data_source_key: collection.data_source_key().to_owned(),
            fields: collection
                .get_fields()
                .iter()
                .map(|field| field.options().clone())
                .collect(),
        }
    }
}

/// A page of results, as list endpoints return them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub count: usize,
    pub rows: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_page: usize,
}

/// In-memory repository over a fixed list of collections.
#[derive(Debug, Clone, Default)]
pub struct CollectionRepository {
    collections: Vec<Arc<Collection>>,
}

impl CollectionRepository {
    pub fn new(collections: Vec<Arc<Collection>>) -> Self {
        Self { collections }
    }

    /// Snapshot the current collections of a manager.
    pub fn from_manager(manager: &CollectionManager) -> Self {
        Self::new(manager.get_collections())
    }

    /// `find_and_count` bundled with the paging parameters.
    pub fn page(&self, filter: &Filter) -> Page<CollectionRow> {
        let (rows, count) = self.find_and_count(filter);
        let page_size = filter.page_size();
        Page {
            count,
            rows,
            page: filter.page(),
            page_size,
            total_page: count.div_ceil(page_size),
        }
    }

    fn matching(&self, filter: &Filter) -> Vec<CollectionRow> {
        let mut rows: Vec<CollectionRow> = self
            .collections
            .iter()
            .map(|collection| CollectionRow::from(collection.as_ref()))
            .filter(|row| filter.matches(row))
            .collect();
        rows.sort_by(|a, b| a.name.cmp(&b.name));
        rows
    }
}

impl Repository for CollectionRepository {
    type Row = CollectionRow;

    fn find(&self, filter: &Filter) -> Vec<CollectionRow> {
        self.find_and_count(filter).0
    }

    fn find_and_count(&self, filter: &Filter) -> (Vec<CollectionRow>, usize) {
        let rows = self.matching(filter);
        let count = rows.len();
        let page_size = filter.page_size();
        let skip = (filter.page() - 1).saturating_mul(page_size);
        let page = rows.into_iter().skip(skip).take(page_size).collect();
        (page, count)
    }
}
