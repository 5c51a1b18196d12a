use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::time::Duration;
use tracing::info;

use crate::config::SecurityConfig;
use crate::domain::{City, CityCount, CityId, SearchEntry, SearchEvent, UserId};

pub mod migrator;
pub mod repositories;

pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
    last_cache_purge: Arc<AtomicI64>,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url
                .trim_start_matches("sqlite://")
                .trim_start_matches("sqlite:");
            let path_str = path_str.split('?').next().unwrap_or(path_str);
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self {
            conn,
            last_cache_purge: Arc::new(AtomicI64::new(0)),
        })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn city_repo(&self) -> repositories::city::CityRepository {
        repositories::city::CityRepository::new(self.conn.clone())
    }

    fn history_repo(&self) -> repositories::history::HistoryRepository {
        repositories::history::HistoryRepository::new(self.conn.clone())
    }

    fn cache_repo(&self) -> repositories::cache::CacheRepository {
        repositories::cache::CacheRepository::new(
            self.conn.clone(),
            Arc::clone(&self.last_cache_purge),
        )
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    // Cities

    pub async fn find_city_by_name(&self, name: &str) -> Result<Option<City>> {
        self.city_repo().find_by_name(name).await
    }

    pub async fn get_cities_by_ids(&self, ids: &[CityId]) -> Result<Vec<City>> {
        self.city_repo().get_by_ids(ids).await
    }

    pub async fn city_names_with_prefix(&self, prefix: &str, limit: u64) -> Result<Vec<String>> {
        self.city_repo().names_with_prefix(prefix, limit).await
    }

    pub async fn get_or_create_city(
        &self,
        name: &str,
        latitude: f64,
        longitude: f64,
    ) -> Result<City> {
        self.city_repo()
            .get_or_create(name, latitude, longitude)
            .await
    }

    #[cfg(test)]
    pub async fn city_count(&self) -> Result<u64> {
        self.city_repo().count().await
    }

    // Search history

    pub async fn record_search(
        &self,
        user_id: Option<UserId>,
        city_id: CityId,
        ip_address: Option<&str>,
    ) -> Result<SearchEvent> {
        self.history_repo()
            .record(user_id, city_id, ip_address)
            .await
    }

    pub async fn list_searches(&self, user_id: UserId) -> Result<Vec<SearchEntry>> {
        self.history_repo().list_for_user(user_id).await
    }

    pub async fn recent_searches(&self, user_id: UserId, limit: u64) -> Result<Vec<SearchEntry>> {
        self.history_repo().recent_for_user(user_id, limit).await
    }

    pub async fn search_counts(&self, user_id: UserId) -> Result<Vec<CityCount>> {
        self.history_repo().aggregate_for_user(user_id).await
    }

    #[cfg(test)]
    pub async fn search_count_for_city(&self, city_id: CityId) -> Result<u64> {
        self.history_repo().count_for_city(city_id).await
    }

    #[cfg(test)]
    pub async fn search_event_count(&self) -> Result<u64> {
        self.history_repo().count().await
    }

    // Key-value cache

    pub async fn get_cache_value(&self, key: &str) -> Result<Option<String>> {
        self.cache_repo().get(key).await
    }

    pub async fn set_cache_value(
        &self,
        key: &str,
        value_json: &str,
        ttl: chrono::Duration,
    ) -> Result<()> {
        self.cache_repo().set(key, value_json, ttl).await
    }

    #[cfg(test)]
    pub async fn cache_expires_at(&self, key: &str) -> Result<Option<String>> {
        self.cache_repo().expires_at(key).await
    }

    // Users

    pub async fn create_user(
        &self,
        username: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<User> {
        self.user_repo().create(username, password, config).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user(&self, id: UserId) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<Option<User>> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn verify_api_key(&self, api_key: &str) -> Result<Option<User>> {
        self.user_repo().verify_api_key(api_key).await
    }
}
