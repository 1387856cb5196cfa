//! Admin API Handlers
//!
//! Aggregated data for the operations dashboard. Rendering happens
//! elsewhere; this endpoint only serves the raw state.

use axum::{Json, extract::State};
use serde::Serialize;
use std::collections::HashMap;

use crate::api::ok;
use crate::core::ServerState;
use crate::error::{ApiResponse, AppResult};
use crate::models::{CollectibleUnit, Rental};

/// Dashboard aggregate: unit-level inventory, rentals, and a collectible
/// id -> name lookup
#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub inventory: Vec<CollectibleUnit>,
    pub rentals: Vec<Rental>,
    pub collectibles: HashMap<String, String>,
}

pub async fn dashboard(
    State(state): State<ServerState>,
) -> AppResult<Json<ApiResponse<Dashboard>>> {
    let inventory = state.allocator.snapshot_inventory();
    let rentals = state.repo.get_all_rentals().await?;
    let collectibles = state
        .repo
        .get_all_collectibles()
        .await?
        .into_iter()
        .map(|c| (c.id, c.name))
        .collect();

    Ok(ok(Dashboard {
        inventory,
        rentals,
        collectibles,
    }))
}
