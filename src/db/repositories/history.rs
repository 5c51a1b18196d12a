use anyhow::{Context, Result};
use sea_orm::sea_query::{Expr, Order};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};

use crate::domain::{City, CityCount, CityId, SearchEntry, SearchEvent, UserId};
use crate::entities::{cities, prelude::*, search_history};

pub struct HistoryRepository {
    conn: DatabaseConnection,
}

#[derive(Debug, Clone, FromQueryResult)]
struct CityCountRow {
    city_name: String,
    count: i64,
}

impl HistoryRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    fn map_event(m: search_history::Model) -> SearchEvent {
        SearchEvent {
            id: m.id,
            user_id: m.user_id.map(UserId::new),
            city_id: CityId::new(m.city_id),
            searched_at: m.searched_at,
            ip_address: m.ip_address,
        }
    }

    fn map_entry(
        (event, city): (search_history::Model, Option<cities::Model>),
    ) -> Option<SearchEntry> {
        city.map(|c| SearchEntry {
            id: event.id,
            city: City::from(c),
            searched_at: event.searched_at,
            ip_address: event.ip_address,
        })
    }

    pub async fn record(
        &self,
        user_id: Option<UserId>,
        city_id: CityId,
        ip_address: Option<&str>,
    ) -> Result<SearchEvent> {
        let active_model = search_history::ActiveModel {
            user_id: Set(user_id.map(|u| u.value())),
            city_id: Set(city_id.value()),
            searched_at: Set(chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Micros, true)),
            ip_address: Set(ip_address.map(std::string::ToString::to_string)),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.conn)
            .await
            .context("Failed to record search event")?;

        Ok(Self::map_event(model))
    }

    /// All searches of a user, newest first, each with its city.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<SearchEntry>> {
        self.entries_for_user(user_id, None).await
    }

    /// The `limit` most recent searches of a user, newest first. Repeats are kept.
    pub async fn recent_for_user(&self, user_id: UserId, limit: u64) -> Result<Vec<SearchEntry>> {
        self.entries_for_user(user_id, Some(limit)).await
    }

    async fn entries_for_user(
        &self,
        user_id: UserId,
        limit: Option<u64>,
    ) -> Result<Vec<SearchEntry>> {
        let rows = SearchHistory::find()
            .filter(search_history::Column::UserId.eq(user_id.value()))
            // Ids follow commit order; timestamps are taken before the insert
            .order_by_desc(search_history::Column::Id)
            .limit(limit)
            .find_also_related(Cities)
            .all(&self.conn)
            .await
            .context("Failed to query search history")?;

        Ok(rows.into_iter().filter_map(Self::map_entry).collect())
    }

    /// Per-city search counts for a user, highest first; ties ordered by city name.
    pub async fn aggregate_for_user(&self, user_id: UserId) -> Result<Vec<CityCount>> {
        let rows = SearchHistory::find()
            .select_only()
            .column_as(cities::Column::Name, "city_name")
            .column_as(search_history::Column::Id.count(), "count")
            .join(
                sea_orm::JoinType::InnerJoin,
                search_history::Relation::Cities.def(),
            )
            .filter(search_history::Column::UserId.eq(user_id.value()))
            .group_by(cities::Column::Id)
            .group_by(cities::Column::Name)
            .order_by(Expr::cust("count"), Order::Desc)
            .order_by_asc(cities::Column::Name)
            .into_model::<CityCountRow>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate search history")?;

        Ok(rows
            .into_iter()
            .map(|r| CityCount {
                city_name: r.city_name,
                count: r.count,
            })
            .collect())
    }

    #[cfg(test)]
    pub async fn count_for_city(&self, city_id: CityId) -> Result<u64> {
        use sea_orm::PaginatorTrait;
        let count = SearchHistory::find()
            .filter(search_history::Column::CityId.eq(city_id.value()))
            .count(&self.conn)
            .await?;

        Ok(count)
    }

    #[cfg(test)]
    pub async fn count(&self) -> Result<u64> {
        use sea_orm::PaginatorTrait;
        Ok(SearchHistory::find().count(&self.conn).await?)
    }
}
