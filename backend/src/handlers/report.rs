use std::time::Instant;

use axum::{extract::State, Json};
use tracing::info;

use crate::{error::AppResult, models::WarehouseSummary, AppState};

/// `GET /warehouse-report`: a one-element array, or `[]` for an empty warehouse.
pub async fn warehouse_report(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<WarehouseSummary>>> {
    let start = Instant::now();
    let summary = state.store.summary().await?;

    match &summary {
        Some(s) => info!(
            total_products = s.total_products,
            total_quantity = s.total_quantity,
            total_value = s.total_value,
            elapsed_ms = start.elapsed().as_millis(),
            "Built warehouse report"
        ),
        None => info!("Built warehouse report for an empty warehouse"),
    }

    Ok(Json(summary.into_iter().collect()))
}
