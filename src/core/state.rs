//! 服务器状态 - 持有所有服务的共享引用
//!
//! ServerState 是核心数据结构，按能力注入的方式组装仓储、分配管理器、
//! 支付网关和各业务服务。使用 Arc 实现浅拷贝，所有权成本极低。

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::allocation::{AllocationManager, ReservationSweeper};
use crate::auth::AuthService;
use crate::core::Config;
use crate::db::{MemoryRepository, Repository, SurrealRepository, seed};
use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::CollectibleUnit;
use crate::payment::{PayMongoGateway, PaymentGateway};
use crate::services::{CheckoutService, OrderService, RefundService};

/// Shared application state, injected into every handler and worker
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 仓储端口
    pub repo: Arc<dyn Repository>,
    /// 库存分配管理器（单写者）
    pub allocator: Arc<AllocationManager>,
    /// 支付网关端口
    pub gateway: Arc<dyn PaymentGateway>,
    /// 认证服务
    pub auth: Arc<AuthService>,
    /// 购物车结算协调器
    pub checkout: Arc<CheckoutService>,
    /// 订单生命周期服务
    pub orders: Arc<OrderService>,
    /// 退款服务
    pub refunds: Arc<RefundService>,
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState").finish_non_exhaustive()
    }
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序：仓储（按配置选择后端）→ 种子数据 → 库存重建与校验 →
    /// 支付网关 → 业务服务。
    ///
    /// # Errors
    ///
    /// 门店覆盖校验失败（某仓库缺少门店距离、或门店不足 3 个）返回
    /// `ConfigError`；启动方应视为致命错误退出。
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let repo: Arc<dyn Repository> = if config.use_persistent_store {
            let path = format!("{}/rental.db", config.data_dir);
            Arc::new(SurrealRepository::open(&path).await?)
        } else {
            tracing::info!("Using in-memory repository");
            Arc::new(MemoryRepository::new())
        };

        let gateway: Arc<dyn PaymentGateway> =
            Arc::new(PayMongoGateway::new(config.payment_secret_key.clone()));

        Self::with_components(config.clone(), repo, gateway).await
    }

    /// 用注入的仓储与网关组装状态（测试与 initialize 共用）
    pub async fn with_components(
        config: Config,
        repo: Arc<dyn Repository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> AppResult<Self> {
        // Seed an empty catalog
        if repo.get_all_collectibles().await?.is_empty() {
            tracing::info!("Catalog empty, seeding demo data");
            seed::seed_data(repo.as_ref()).await?;
        }

        // Admin one-shot reset
        if config.reset_rentals {
            tracing::warn!("RESET_RENTALS enabled, clearing all rental records");
            repo.delete_all_rentals().await?;
        }

        // Build unit inventory from warehouses: one physical unit per
        // warehouse, unit id mirrors the warehouse id (legacy convention)
        let grouped = repo.get_all_warehouses().await?;
        let mut units = Vec::new();
        let mut warehouses = Vec::new();
        for (collectible_id, list) in &grouped {
            for warehouse in list {
                units.push(CollectibleUnit::available(
                    warehouse.id.clone(),
                    collectible_id.clone(),
                    warehouse.id.clone(),
                ));
                warehouses.push(warehouse.clone());
            }
        }

        // Startup invariant: at least three stores, and every warehouse
        // serves every store. Violations are fatal, never recovered.
        if config.stores.len() < 3 {
            return Err(AppError::with_message(
                ErrorCode::ConfigError,
                format!("{} store(s) configured, minimum 3 required", config.stores.len()),
            ));
        }
        for warehouse in &warehouses {
            for store in &config.stores {
                if !warehouse.serves.contains_key(&store.id) {
                    return Err(AppError::with_message(
                        ErrorCode::ConfigError,
                        format!(
                            "warehouse {} has no distance for store {}",
                            warehouse.id, store.id
                        ),
                    ));
                }
            }
        }
        tracing::info!(
            warehouses = warehouses.len(),
            stores = config.stores.len(),
            "Store coverage validated"
        );

        let allocator = Arc::new(AllocationManager::new(
            units,
            warehouses,
            config.reservation_timeout(),
        ));

        // Reconcile inventory with persisted state so a restart does not
        // offer already-sold units again
        allocator.sync_from_rentals(&repo.get_all_rentals().await?);
        allocator.sync_from_orders(&repo.get_all_orders().await?);

        let auth = Arc::new(AuthService::new(repo.clone()));
        let checkout = Arc::new(CheckoutService::new(
            repo.clone(),
            allocator.clone(),
            gateway.clone(),
            config.public_base_url.clone(),
        ));
        let refunds = Arc::new(RefundService::new(repo.clone(), gateway.clone()));
        let orders = Arc::new(OrderService::new(
            repo.clone(),
            allocator.clone(),
            gateway.clone(),
            refunds.clone(),
        ));

        Ok(Self {
            config,
            repo,
            allocator,
            gateway,
            auth,
            checkout,
            orders,
            refunds,
        })
    }

    /// 启动后台任务（预约清扫器）
    ///
    /// 返回任务句柄，shutdown 后 await 它完成优雅退出。
    pub fn start_background_tasks(
        &self,
        shutdown: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let sweeper = ReservationSweeper::new(
            self.allocator.clone(),
            self.config.sweep_interval(),
            shutdown,
        );
        tokio::spawn(sweeper.run())
    }
}
