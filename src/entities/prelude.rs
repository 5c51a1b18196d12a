pub use super::cache_entries::Entity as CacheEntries;
pub use super::cities::Entity as Cities;
pub use super::search_history::Entity as SearchHistory;
pub use super::users::Entity as Users;
