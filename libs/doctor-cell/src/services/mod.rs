pub mod catalog;
pub mod search;
pub mod stats;

pub use catalog::{CatalogError, DoctorCatalog, InMemoryCatalog, SupabaseCatalog};
pub use search::DoctorSearchService;
pub use stats::StatsRefreshService;
