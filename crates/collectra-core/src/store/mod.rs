// ── Collection and data source storage ──

mod collection_manager;
mod data_source;
mod data_source_manager;
mod lookup;
mod reload;

pub use collection_manager::{CollectionManager, CollectionSnapshot};
pub use data_source::DataSource;
pub use data_source_manager::{
    DEFAULT_DATA_SOURCE_KEY, DataSourceCollections, DataSourceManager, DataSourceManagerBuilder,
};
pub use lookup::{CollectionLookup, FieldLookup};
pub use reload::{MainProvider, ProviderFuture, ReloadCallback, ThirdPartyProvider};
