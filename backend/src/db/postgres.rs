use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use super::{duplicate_name, not_found, ProductStore};
use crate::error::{AppError, AppResult};
use crate::models::{NewProduct, Product, ProductFilter, UpdateProduct, WarehouseSummary};

const PRODUCT_COLUMNS: &str =
    "id, name, price, description, quantity, unit, created_at, updated_at";

#[derive(Clone)]
pub struct PgProductStore {
    pool: PgPool,
}

impl PgProductStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Turn a unique-constraint violation on `name` into a `Conflict`.
fn map_write_error(err: sqlx::Error, name: Option<&str>) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            duplicate_name(name.unwrap_or_default())
        }
        _ => AppError::Database(err),
    }
}

#[async_trait]
impl ProductStore for PgProductStore {
    async fn find(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let order_by = match &filter.sort {
            Some(sort) => format!("{}, created_at ASC, id ASC", sort.order_by_sql()),
            None => "created_at ASC, id ASC".to_string(),
        };

        let sql = format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE ($1::text IS NULL OR name = $1)
              AND ($2::float8 IS NULL OR price = $2)
              AND ($3::float8 IS NULL OR quantity = $3)
            ORDER BY {order_by}
            "#
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(filter.name.as_deref())
            .bind(filter.price)
            .bind(filter.quantity)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Product> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(id))
    }

    async fn create(&self, product: &NewProduct) -> AppResult<Product> {
        let sql = format!(
            r#"
            INSERT INTO products (id, name, price, description, quantity, unit)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Product>(&sql)
            .bind(Uuid::new_v4())
            .bind(&product.name)
            .bind(product.price)
            .bind(&product.description)
            .bind(product.quantity)
            .bind(&product.unit)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| map_write_error(err, Some(&product.name)))
    }

    async fn update_by_id(&self, id: Uuid, changes: &UpdateProduct) -> AppResult<Product> {
        // COALESCE keeps the stored value for every field the caller left out
        let sql = format!(
            r#"
            UPDATE products
            SET name        = COALESCE($1, name),
                price       = COALESCE($2, price),
                description = COALESCE($3, description),
                quantity    = COALESCE($4, quantity),
                unit        = COALESCE($5, unit),
                updated_at  = $6
            WHERE id = $7
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        sqlx::query_as::<_, Product>(&sql)
            .bind(changes.name.as_deref())
            .bind(changes.price)
            .bind(changes.description.as_deref())
            .bind(changes.quantity)
            .bind(changes.unit.as_deref())
            .bind(Utc::now())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| map_write_error(err, changes.name.as_deref()))?
            .ok_or_else(|| not_found(id))
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }

    async fn summary(&self) -> AppResult<Option<WarehouseSummary>> {
        let summary = sqlx::query_as::<_, WarehouseSummary>(
            r#"
            SELECT COUNT(*)                                 AS total_products,
                   COALESCE(SUM(quantity), 0)::float8       AS total_quantity,
                   COALESCE(SUM(price * quantity), 0)::float8 AS total_value
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok((summary.total_products > 0).then_some(summary))
    }
}
