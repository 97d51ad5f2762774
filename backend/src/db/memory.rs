use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{duplicate_name, not_found, ProductStore};
use crate::error::AppResult;
use crate::models::{NewProduct, Product, ProductFilter, UpdateProduct, WarehouseSummary};

/// In-process store keyed by id. `IndexMap` keeps insertion order, which is
/// the default listing order.
#[derive(Debug, Default)]
pub struct MemoryProductStore {
    products: RwLock<IndexMap<Uuid, Product>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn name_taken(products: &IndexMap<Uuid, Product>, name: &str, except: Option<Uuid>) -> bool {
    products
        .values()
        .any(|p| p.name == name && Some(p.id) != except)
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn find(&self, filter: &ProductFilter) -> AppResult<Vec<Product>> {
        let products = self.products.read().await;
        let mut found: Vec<Product> = products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();

        // stable sort: ties stay in insertion order
        if let Some(sort) = &filter.sort {
            found.sort_by(|a, b| sort.compare(a, b));
        }
        Ok(found)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Product> {
        self.products
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    async fn create(&self, product: &NewProduct) -> AppResult<Product> {
        let mut products = self.products.write().await;
        if name_taken(&products, &product.name, None) {
            return Err(duplicate_name(&product.name));
        }

        let now = Utc::now();
        let created = Product {
            id: Uuid::new_v4(),
            name: product.name.clone(),
            price: product.price,
            description: product.description.clone(),
            quantity: product.quantity,
            unit: product.unit.clone(),
            created_at: now,
            updated_at: now,
        };
        products.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_by_id(&self, id: Uuid, changes: &UpdateProduct) -> AppResult<Product> {
        let mut products = self.products.write().await;
        if !products.contains_key(&id) {
            return Err(not_found(id));
        }
        if let Some(name) = &changes.name {
            if name_taken(&products, name, Some(id)) {
                return Err(duplicate_name(name));
            }
        }

        let product = products.get_mut(&id).ok_or_else(|| not_found(id))?;
        product.apply(changes);
        Ok(product.clone())
    }

    async fn delete_by_id(&self, id: Uuid) -> AppResult<()> {
        self.products
            .write()
            .await
            .shift_remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }

    async fn summary(&self) -> AppResult<Option<WarehouseSummary>> {
        let products = self.products.read().await;
        if products.is_empty() {
            return Ok(None);
        }

        Ok(Some(WarehouseSummary {
            total_products: products.len() as i64,
            total_quantity: products.values().map(|p| p.quantity).sum(),
            total_value: products.values().map(Product::stock_value).sum(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::SortSpec;

    fn new_product(name: &str, price: f64, quantity: f64) -> NewProduct {
        NewProduct {
            name: name.to_string(),
            price,
            description: None,
            quantity,
            unit: Some("pcs".to_string()),
        }
    }

    #[tokio::test]
    async fn create_assigns_id_and_rejects_duplicate_names() {
        let store = MemoryProductStore::new();
        let first = store.create(&new_product("Bolt", 0.5, 100.0)).await.unwrap();
        assert_eq!(first.name, "Bolt");

        let err = store
            .create(&new_product("Bolt", 9.0, 1.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let stored = store.find_by_id(first.id).await.unwrap();
        assert_eq!(stored, first, "existing record must be unchanged");
    }

    #[tokio::test]
    async fn find_preserves_insertion_order_and_filters() {
        let store = MemoryProductStore::new();
        for (name, price) in [("Nut", 0.1), ("Washer", 0.05), ("Screw", 0.1)] {
            store.create(&new_product(name, price, 10.0)).await.unwrap();
        }

        let all = store.find(&ProductFilter::default()).await.unwrap();
        let names: Vec<&str> = all.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Nut", "Washer", "Screw"]);

        let cheap = store
            .find(&ProductFilter {
                price: Some(0.1),
                ..Default::default()
            })
            .await
            .unwrap();
        let names: Vec<&str> = cheap.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Nut", "Screw"]);
    }

    #[tokio::test]
    async fn find_sorts_descending() {
        let store = MemoryProductStore::new();
        for (name, price) in [("A", 2.0), ("B", 7.0), ("C", 4.0)] {
            store.create(&new_product(name, price, 1.0)).await.unwrap();
        }

        let sorted = store
            .find(&ProductFilter {
                sort: Some(SortSpec::parse("-price").unwrap()),
                ..Default::default()
            })
            .await
            .unwrap();
        let prices: Vec<f64> = sorted.iter().map(|p| p.price).collect();
        assert_eq!(prices, vec![7.0, 4.0, 2.0]);
    }

    #[tokio::test]
    async fn update_rejects_rename_onto_existing_name() {
        let store = MemoryProductStore::new();
        store.create(&new_product("Hammer", 12.0, 3.0)).await.unwrap();
        let saw = store.create(&new_product("Saw", 20.0, 2.0)).await.unwrap();

        let err = store
            .update_by_id(
                saw.id,
                &UpdateProduct {
                    name: Some("Hammer".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        // renaming to its own name is not a conflict
        let same = store
            .update_by_id(
                saw.id,
                &UpdateProduct {
                    name: Some("Saw".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(same.name, "Saw");
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = MemoryProductStore::new();
        let id = Uuid::new_v4();
        assert!(matches!(store.find_by_id(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(store.delete_by_id(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            store.update_by_id(id, &UpdateProduct::default()).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn update_of_unknown_id_with_taken_name_is_not_found() {
        let store = MemoryProductStore::new();
        store.create(&new_product("Drill", 50.0, 1.0)).await.unwrap();

        let err = store
            .update_by_id(
                Uuid::new_v4(),
                &UpdateProduct {
                    name: Some("Drill".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn summary_is_none_when_empty() {
        let store = MemoryProductStore::new();
        assert_eq!(store.summary().await.unwrap(), None);

        store.create(&new_product("X", 10.0, 2.0)).await.unwrap();
        store.create(&new_product("Y", 20.0, 3.0)).await.unwrap();
        let summary = store.summary().await.unwrap().unwrap();
        assert_eq!(summary.total_products, 2);
        assert_eq!(summary.total_quantity, 5.0);
        assert_eq!(summary.total_value, 80.0);
    }

    #[tokio::test]
    async fn delete_keeps_remaining_order() {
        let store = MemoryProductStore::new();
        let a = store.create(&new_product("A", 1.0, 0.0)).await.unwrap();
        store.create(&new_product("B", 1.0, 0.0)).await.unwrap();
        store.create(&new_product("C", 1.0, 0.0)).await.unwrap();

        store.delete_by_id(a.id).await.unwrap();
        let names: Vec<String> = store
            .find(&ProductFilter::default())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["B", "C"]);
    }
}
