//! Sample catalog data
//!
//! Populates an empty repository with the demo collectibles and their
//! warehouses. Each warehouse houses exactly one physical unit; units are
//! derived from warehouses at startup (see `ServerState::initialize`).

use super::{RepoResult, Repository};
use crate::models::{Collectible, Size, Warehouse};
use std::collections::HashMap;

fn collectible(
    id: &str,
    name: &str,
    description: &str,
    size: Size,
    image_url: &str,
) -> Collectible {
    Collectible {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        size,
        image_url: image_url.to_string(),
        available: true,
    }
}

fn warehouse(id: &str, name: &str, collectible_id: &str, distances: [(&str, u32); 3]) -> Warehouse {
    Warehouse {
        id: id.to_string(),
        name: name.to_string(),
        collectible_id: collectible_id.to_string(),
        serves: distances
            .into_iter()
            .map(|(store, dist)| (store.to_string(), dist))
            .collect::<HashMap<_, _>>(),
    }
}

/// Seed the repository with the demo catalog
pub async fn seed_data(repo: &dyn Repository) -> RepoResult<()> {
    let collectibles = [
        collectible(
            "col-001",
            "Vintage Batman Action Figure",
            "Rare 1989 Batman action figure in mint condition",
            Size::S,
            "/images/batman.jpg",
        ),
        collectible(
            "col-002",
            "Star Wars Millennium Falcon Model",
            "Detailed replica of the iconic spaceship",
            Size::M,
            "/images/falcon.jpg",
        ),
        collectible(
            "col-003",
            "Life-Size Iron Man Suit",
            "Full-scale Mark 42 armor replica",
            Size::L,
            "/images/ironman.jpg",
        ),
        collectible(
            "col-004",
            "Pokemon Card Collection Set",
            "Complete first edition holographic set",
            Size::S,
            "/images/pokemon.jpg",
        ),
        collectible(
            "col-005",
            "Gundam Perfect Grade Model",
            "RX-78-2 Gundam 1/60 scale model kit",
            Size::M,
            "/images/gundam.jpg",
        ),
        collectible(
            "col-006",
            "Arcade Machine - Street Fighter II",
            "Original 1991 arcade cabinet, fully functional",
            Size::L,
            "/images/arcade.jpg",
        ),
    ];
    for c in collectibles {
        repo.add_collectible(c).await?;
    }

    let warehouses = [
        // Batman - 2 warehouses
        warehouse(
            "wh-001-1",
            "Warehouse North - Batman",
            "col-001",
            [("store-a", 1), ("store-b", 4), ("store-c", 5)],
        ),
        warehouse(
            "wh-001-2",
            "Warehouse South - Batman",
            "col-001",
            [("store-a", 3), ("store-b", 2), ("store-c", 3)],
        ),
        // Millennium Falcon - 3 warehouses
        warehouse(
            "wh-002-1",
            "Warehouse East - Falcon",
            "col-002",
            [("store-a", 2), ("store-b", 1), ("store-c", 4)],
        ),
        warehouse(
            "wh-002-2",
            "Warehouse West - Falcon",
            "col-002",
            [("store-a", 5), ("store-b", 3), ("store-c", 2)],
        ),
        warehouse(
            "wh-002-3",
            "Warehouse Central - Falcon",
            "col-002",
            [("store-a", 3), ("store-b", 3), ("store-c", 3)],
        ),
        // Iron Man Suit - 2 warehouses
        warehouse(
            "wh-003-1",
            "Warehouse Premium - Iron Man",
            "col-003",
            [("store-a", 4), ("store-b", 2), ("store-c", 1)],
        ),
        warehouse(
            "wh-003-2",
            "Warehouse Secure - Iron Man",
            "col-003",
            [("store-a", 2), ("store-b", 5), ("store-c", 4)],
        ),
        // Pokemon Cards - 3 warehouses
        warehouse(
            "wh-004-1",
            "Warehouse A - Pokemon",
            "col-004",
            [("store-a", 1), ("store-b", 3), ("store-c", 6)],
        ),
        warehouse(
            "wh-004-2",
            "Warehouse B - Pokemon",
            "col-004",
            [("store-a", 4), ("store-b", 1), ("store-c", 5)],
        ),
        warehouse(
            "wh-004-3",
            "Warehouse C - Pokemon",
            "col-004",
            [("store-a", 6), ("store-b", 5), ("store-c", 1)],
        ),
        // Gundam - 2 warehouses
        warehouse(
            "wh-005-1",
            "Warehouse Tech - Gundam",
            "col-005",
            [("store-a", 3), ("store-b", 4), ("store-c", 2)],
        ),
        warehouse(
            "wh-005-2",
            "Warehouse Main - Gundam",
            "col-005",
            [("store-a", 2), ("store-b", 2), ("store-c", 5)],
        ),
        // Arcade Machine - 2 warehouses
        warehouse(
            "wh-006-1",
            "Warehouse Retro - Arcade",
            "col-006",
            [("store-a", 5), ("store-b", 1), ("store-c", 3)],
        ),
        warehouse(
            "wh-006-2",
            "Warehouse Gaming - Arcade",
            "col-006",
            [("store-a", 1), ("store-b", 6), ("store-c", 2)],
        ),
    ];
    for w in warehouses {
        repo.add_warehouse(w).await?;
    }

    tracing::info!("Repository seeded with demo catalog");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRepository;

    #[tokio::test]
    async fn test_seed_populates_catalog() {
        let repo = MemoryRepository::new();
        seed_data(&repo).await.unwrap();

        assert_eq!(repo.get_all_collectibles().await.unwrap().len(), 6);

        let warehouses = repo.get_all_warehouses().await.unwrap();
        assert_eq!(warehouses.len(), 6);
        assert_eq!(warehouses["col-002"].len(), 3);

        // Every warehouse serves every store
        for list in warehouses.values() {
            for w in list {
                for store in ["store-a", "store-b", "store-c"] {
                    assert!(w.serves.contains_key(store), "{} misses {}", w.id, store);
                }
            }
        }
    }
}
