pub mod city_directory;
pub use city_directory::CityDirectory;

pub mod recent_cities;
pub use recent_cities::RecentCityTracker;

pub mod search_history;
pub use search_history::SearchHistoryStore;

pub mod search_service;
pub use search_service::{CityLookup, LookupError, SearchService, UserHistory, WeatherReport};

pub mod search_service_impl;
pub use search_service_impl::SeaOrmSearchService;

#[cfg(test)]
pub(crate) mod testing;
