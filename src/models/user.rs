//! User model

use serde::{Deserialize, Serialize};

/// A registered user
///
/// Serialized only toward the persistence layer; API handlers respond with
/// their own auth payloads and never expose `password_hash`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
    pub updated_at: i64,
}
