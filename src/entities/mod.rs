pub mod prelude;

pub mod cache_entries;
pub mod cities;
pub mod search_history;
pub mod users;
