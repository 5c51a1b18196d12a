use anyhow::{Context, Result};
use sea_orm::sea_query::LikeExpr;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::domain::{City, CityId, normalize_city_name};
use crate::entities::{cities, prelude::*};

const LIKE_ESCAPE: char = '\\';

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

pub struct CityRepository {
    conn: DatabaseConnection,
}

impl From<cities::Model> for City {
    fn from(model: cities::Model) -> Self {
        Self {
            id: CityId::new(model.id),
            name: model.name,
            latitude: model.latitude,
            longitude: model.longitude,
        }
    }
}

impl CityRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Case-insensitive exact match on the normalized name.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<City>> {
        let key = normalize_city_name(name);
        if key.is_empty() {
            return Ok(None);
        }

        let city = Cities::find()
            .filter(cities::Column::NameKey.eq(key))
            .one(&self.conn)
            .await
            .context("Failed to query city by name")?;

        Ok(city.map(City::from))
    }

    /// Fetches cities by id, returned in the order of `ids`. Unknown ids are skipped.
    pub async fn get_by_ids(&self, ids: &[CityId]) -> Result<Vec<City>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw: Vec<i32> = ids.iter().map(CityId::value).collect();
        let rows = Cities::find()
            .filter(cities::Column::Id.is_in(raw))
            .all(&self.conn)
            .await
            .context("Failed to query cities by IDs")?;

        let mut by_id: std::collections::HashMap<i32, cities::Model> =
            rows.into_iter().map(|m| (m.id, m)).collect();

        Ok(ids
            .iter()
            .filter_map(|id| by_id.remove(&id.value()))
            .map(City::from)
            .collect())
    }

    /// Names whose normalized form starts with the normalized `prefix`, ordered by key.
    ///
    /// `%` and `_` in the prefix match literally.
    pub async fn names_with_prefix(&self, prefix: &str, limit: u64) -> Result<Vec<String>> {
        let key = normalize_city_name(prefix);
        if key.is_empty() || limit == 0 {
            return Ok(Vec::new());
        }

        let pattern = LikeExpr::new(format!("{}%", escape_like(&key))).escape(LIKE_ESCAPE);

        let names: Vec<String> = Cities::find()
            .select_only()
            .column(cities::Column::Name)
            .filter(cities::Column::NameKey.like(pattern))
            .order_by_asc(cities::Column::NameKey)
            .limit(limit)
            .into_tuple()
            .all(&self.conn)
            .await
            .context("Failed to query cities by prefix")?;

        Ok(names)
    }

    /// Inserts the city unless its normalized name already exists, then returns the stored row.
    ///
    /// The unique index on `name_key` decides the winner when two requests create the
    /// same city concurrently; the loser reads back the winner's row. Existing rows are
    /// never updated, so coordinates stay as first recorded.
    pub async fn get_or_create(&self, name: &str, latitude: f64, longitude: f64) -> Result<City> {
        let key = normalize_city_name(name);
        if key.is_empty() {
            anyhow::bail!("City name cannot be empty");
        }

        let active_model = cities::ActiveModel {
            name: Set(name.trim().to_string()),
            name_key: Set(key.clone()),
            latitude: Set(latitude),
            longitude: Set(longitude),
            created_at: Set(chrono::Utc::now().to_rfc3339()),
            ..Default::default()
        };

        Cities::insert(active_model)
            .on_conflict(
                sea_orm::sea_query::OnConflict::column(cities::Column::NameKey)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&self.conn)
            .await
            .context("Failed to insert city")?;

        let city = Cities::find()
            .filter(cities::Column::NameKey.eq(key))
            .one(&self.conn)
            .await
            .context("Failed to read back city")?
            .ok_or_else(|| anyhow::anyhow!("City '{name}' missing after insert"))?;

        Ok(City::from(city))
    }

    #[cfg(test)]
    pub async fn count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;
        Ok(Cities::find().count(&self.conn).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_metacharacters_are_escaped() {
        assert_eq!(escape_like("a_b%c"), "a\\_b\\%c");
        assert_eq!(escape_like("back\\slash"), "back\\\\slash");
        assert_eq!(escape_like("plain"), "plain");
    }
}
