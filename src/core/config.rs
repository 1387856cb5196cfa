//! 服务器配置
//!
//! # 环境变量
//!
//! 所有配置项都可以通过环境变量覆盖：
//!
//! | 环境变量 | 默认值 | 说明 |
//! |----------|--------|------|
//! | SERVER_PORT | 8080 | HTTP 服务端口 |
//! | ENVIRONMENT | development | 运行环境 |
//! | PAYMENT_SECRET_KEY | (空) | PayMongo secret key |
//! | PAYMENT_PUBLIC_KEY | (空) | PayMongo public key |
//! | USE_PERSISTENT_STORE | false | 使用嵌入式持久化存储 |
//! | DATA_DIR | ./data | 持久化存储目录 |
//! | RESET_RENTALS | false | 启动时清空租赁记录（一次性） |
//! | SWEEP_INTERVAL_SECS | 300 | 预约清扫周期（秒） |
//! | RESERVATION_TIMEOUT_SECS | 900 | 预约超时（秒） |
//! | PUBLIC_BASE_URL | http://localhost:8080 | 支付回跳地址前缀 |

use crate::models::Store;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API 服务端口
    pub server_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// PayMongo secret key
    pub payment_secret_key: String,
    /// PayMongo public key
    pub payment_public_key: String,
    /// 使用持久化存储 (SurrealDB)，否则为进程内存
    pub use_persistent_store: bool,
    /// 持久化存储目录
    pub data_dir: String,
    /// 启动时清空租赁记录
    pub reset_rentals: bool,
    /// 预约清扫周期（秒）
    pub sweep_interval_secs: u64,
    /// 预约超时（秒）
    pub reservation_timeout_secs: u64,
    /// 支付成功/失败回跳地址前缀
    pub public_base_url: String,
    /// 取货门店（静态配置，至少 3 个）
    pub stores: Vec<Store>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置，使用默认值
    pub fn from_env() -> Self {
        Self {
            server_port: std::env::var("SERVER_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            payment_secret_key: std::env::var("PAYMENT_SECRET_KEY").unwrap_or_default(),
            payment_public_key: std::env::var("PAYMENT_PUBLIC_KEY").unwrap_or_default(),
            use_persistent_store: std::env::var("USE_PERSISTENT_STORE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".into()),
            reset_rentals: std::env::var("RESET_RENTALS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            sweep_interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            reservation_timeout_secs: std::env::var("RESERVATION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(900),
            public_base_url: std::env::var("PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            stores: default_stores(),
        }
    }

    /// 预约清扫周期
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// 预约超时
    pub fn reservation_timeout(&self) -> Duration {
        Duration::from_secs(self.reservation_timeout_secs)
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

/// 默认门店（与演示目录数据配套）
fn default_stores() -> Vec<Store> {
    vec![
        Store {
            id: "store-a".into(),
            name: "MongoCollectibles Store A".into(),
            address: "123 Main Street, Manila".into(),
        },
        Store {
            id: "store-b".into(),
            name: "MongoCollectibles Store B".into(),
            address: "456 Quezon Avenue, Quezon City".into(),
        },
        Store {
            id: "store-c".into(),
            name: "MongoCollectibles Store C".into(),
            address: "789 Makati Boulevard, Makati".into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stores() {
        let stores = default_stores();
        assert!(stores.len() >= 3);
        assert_eq!(stores[0].id, "store-a");
    }

    #[test]
    fn test_durations() {
        let config = Config {
            sweep_interval_secs: 300,
            reservation_timeout_secs: 900,
            ..Config::from_env()
        };
        assert_eq!(config.sweep_interval(), Duration::from_secs(300));
        assert_eq!(config.reservation_timeout(), Duration::from_secs(900));
    }
}
