//! Collectibles API Handlers
//!
//! Catalog reads enriched with live stock, ETA for the requested store, and
//! the size-derived daily rate.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};

use crate::api::ok;
use crate::core::ServerState;
use crate::error::{ApiResponse, AppError, AppResult, ErrorCode};
use crate::models::{Collectible, Warehouse};

/// Store used for ETA calculations when the client does not pick one
const DEFAULT_STORE: &str = "store-a";

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub store_id: Option<String>,
}

/// Catalog item with live availability
#[derive(Debug, Serialize)]
pub struct CollectibleView {
    #[serde(flatten)]
    pub collectible: Collectible,
    pub stock: usize,
    pub eta_days: u32,
    pub daily_rate: f64,
}

/// Collectible with its warehouse list
#[derive(Debug, Serialize)]
pub struct CollectibleDetail {
    #[serde(flatten)]
    pub collectible: Collectible,
    pub warehouses: Vec<Warehouse>,
}

/// List all collectibles with stock and ETA for a store
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<ApiResponse<Vec<CollectibleView>>>> {
    let store_id = query.store_id.as_deref().unwrap_or(DEFAULT_STORE);

    let mut collectibles = state.repo.get_all_collectibles().await?;
    // Stable listing order for the storefront
    collectibles.sort_by(|a, b| a.name.cmp(&b.name));

    let views = collectibles
        .into_iter()
        .map(|collectible| {
            let stock = state.allocator.get_total_stock(&collectible.id);
            let eta_days = state
                .allocator
                .get_eta(&collectible.id, store_id)
                .unwrap_or(0);
            CollectibleView {
                stock,
                eta_days,
                daily_rate: collectible.size.daily_rate(),
                collectible,
            }
        })
        .collect();

    Ok(ok(views))
}

/// Single collectible with warehouse information
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<ApiResponse<CollectibleDetail>>> {
    let collectible = state
        .repo
        .get_collectible(&id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::CollectibleNotFound))?;

    let warehouses = state.repo.get_warehouses_by_collectible(&id).await?;

    Ok(ok(CollectibleDetail {
        collectible,
        warehouses,
    }))
}
