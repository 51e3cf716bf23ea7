pub mod handlers;
pub mod models;
pub mod query;
pub mod router;
pub mod services;

pub use models::*;
pub use query::{ProviderQuery, SortOrder};
pub use services::*;
