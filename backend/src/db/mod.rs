use std::sync::Arc;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::models::{NewProduct, Product, ProductFilter, UpdateProduct, WarehouseSummary};

mod memory;
mod postgres;

pub use memory::MemoryProductStore;
pub use postgres::PgProductStore;

pub type DynProductStore = Arc<dyn ProductStore>;

/// Persistence for products. Stock policy lives in the handlers; stores only
/// enforce name uniqueness.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Products matching every constraint in `filter`, sorted if requested,
    /// otherwise in insertion order.
    async fn find(&self, filter: &ProductFilter) -> AppResult<Vec<Product>>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Product>;

    /// Fails with `Conflict` when the name is already taken.
    async fn create(&self, product: &NewProduct) -> AppResult<Product>;

    async fn update_by_id(&self, id: Uuid, changes: &UpdateProduct) -> AppResult<Product>;

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()>;

    /// `None` when there are no products.
    async fn summary(&self) -> AppResult<Option<WarehouseSummary>>;
}

/// Open the store selected by `DATABASE_URL`.
pub async fn connect(config: &Config) -> anyhow::Result<DynProductStore> {
    if config.uses_memory_store() {
        info!("Using in-memory product store (data is lost on shutdown).");
        return Ok(Arc::new(MemoryProductStore::new()));
    }

    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    info!("Database connection pool established.");

    info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    info!("Migrations complete.");

    Ok(Arc::new(PgProductStore::new(pool)))
}

pub(crate) fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Product {} not found", id))
}

pub(crate) fn duplicate_name(name: &str) -> AppError {
    AppError::Conflict(format!("A product named '{}' already exists", name))
}
