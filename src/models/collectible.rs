//! Collectible catalog model

use serde::{Deserialize, Serialize};

/// Size category of a collectible, determines the base daily rental rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Size {
    S,
    M,
    L,
}

impl Size {
    /// Base daily rental rate for this size
    pub fn daily_rate(&self) -> f64 {
        match self {
            Size::S => 1000.0,
            Size::M => 5000.0,
            Size::L => 10000.0,
        }
    }
}

/// A rentable catalog item (abstract SKU, not a physical object)
///
/// Immutable after seeding except for `available`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collectible {
    pub id: String,
    pub name: String,
    pub description: String,
    pub size: Size,
    pub image_url: String,
    pub available: bool,
}

/// A brick-and-mortar pickup location
///
/// Static configuration; at least three stores must be present at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub name: String,
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_rates() {
        assert_eq!(Size::S.daily_rate(), 1000.0);
        assert_eq!(Size::M.daily_rate(), 5000.0);
        assert_eq!(Size::L.daily_rate(), 10000.0);
    }

    #[test]
    fn test_size_serialize() {
        assert_eq!(serde_json::to_string(&Size::M).unwrap(), "\"M\"");
        let size: Size = serde_json::from_str("\"L\"").unwrap();
        assert_eq!(size, Size::L);
    }
}
