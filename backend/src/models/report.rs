use serde::{Deserialize, Serialize};

/// Aggregate over every product in the warehouse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WarehouseSummary {
    pub total_products: i64,
    pub total_quantity: f64,
    /// Σ price × quantity
    pub total_value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_camel_case_keys() {
        let summary = WarehouseSummary {
            total_products: 2,
            total_quantity: 5.0,
            total_value: 80.0,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "totalProducts": 2,
                "totalQuantity": 5.0,
                "totalValue": 80.0,
            })
        );
    }
}
