use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::clients::Geocoder;
use crate::db::Store;
use crate::domain::{City, normalize_city_name};
use crate::services::search_service::LookupError;

/// Prefixes shorter than this never produce suggestions.
pub const MIN_AUTOCOMPLETE_CHARS: usize = 2;

/// Local-first city resolution with the geocoder as fallback.
#[derive(Clone)]
pub struct CityDirectory {
    store: Store,
    geocoder: Arc<dyn Geocoder>,
}

impl CityDirectory {
    #[must_use]
    pub fn new(store: Store, geocoder: Arc<dyn Geocoder>) -> Self {
        Self { store, geocoder }
    }

    pub async fn resolve_exact(&self, name: &str) -> Result<Option<City>, LookupError> {
        Ok(self.store.find_city_by_name(name).await?)
    }

    /// Returns the stored city for `name`, asking the geocoder when it is unknown.
    ///
    /// The geocoder's first candidate is stored under its own canonical name. If
    /// that name already exists locally the existing row is returned unchanged.
    pub async fn resolve_or_fetch(&self, name: &str) -> Result<City, LookupError> {
        let query = name.trim();
        if normalize_city_name(query).is_empty() {
            return Err(LookupError::NotFound(query.to_string()));
        }

        if let Some(city) = self.resolve_exact(query).await? {
            debug!(city = %city.name, id = %city.id, "Resolved city locally");
            return Ok(city);
        }

        let candidates = self.geocoder.search(query, 1).await.map_err(|e| {
            warn!(query, error = %e, "Geocoder lookup failed");
            LookupError::from(e)
        })?;

        let Some(candidate) = candidates.into_iter().next() else {
            debug!(query, "Geocoder returned no results");
            return Err(LookupError::NotFound(query.to_string()));
        };

        let city = self
            .store
            .get_or_create_city(&candidate.name, candidate.latitude, candidate.longitude)
            .await?;

        info!(query, city = %city.name, id = %city.id, "Resolved city via geocoder");
        Ok(city)
    }

    /// Suggestions for `prefix`: local names first, topped up by the geocoder.
    ///
    /// Geocoder failures are logged and leave only the local matches. Nothing
    /// is written to the store.
    pub async fn autocomplete(&self, prefix: &str, limit: usize) -> Result<Vec<String>, LookupError> {
        let prefix = prefix.trim();
        if prefix.chars().count() < MIN_AUTOCOMPLETE_CHARS || limit == 0 {
            return Ok(Vec::new());
        }

        let mut names = self
            .store
            .city_names_with_prefix(prefix, limit as u64)
            .await?;

        if names.len() >= limit {
            return Ok(names);
        }

        match self.geocoder.search(prefix, limit - names.len()).await {
            Ok(candidates) => {
                let mut seen: Vec<String> = names.iter().map(|n| normalize_city_name(n)).collect();
                for candidate in candidates {
                    if names.len() >= limit {
                        break;
                    }
                    let key = normalize_city_name(&candidate.name);
                    if key.is_empty() || seen.contains(&key) {
                        continue;
                    }
                    seen.push(key);
                    names.push(candidate.name);
                }
            }
            Err(e) => {
                warn!(prefix, error = %e, "Autocomplete geocoder lookup failed, using local results");
            }
        }

        Ok(names)
    }
}
