//! Rental Server - 收藏品租赁分配与结算核心
//!
//! # 架构概述
//!
//! 为每个租赁请求选择最近仓库的可用实体单元，以限时预约持有它，
//! 协调对异步外部支付网关的多件结算，并将预约结果与订单生命周期、
//! 退款计算对账。
//!
//! # 模块结构
//!
//! ```text
//! src/
//! ├── core/          # 配置、状态、服务器装配
//! ├── error/         # 统一错误码与响应封套
//! ├── models/        # 领域实体
//! ├── allocation/    # 库存分配管理器 + 预约清扫器 (核心引擎)
//! ├── pricing/       # 租金计算（纯函数）
//! ├── payment/       # 支付网关端口 (PayMongo / mock)
//! ├── auth/          # 会话认证
//! ├── services/      # 结算 saga、订单生命周期、退款
//! ├── db/            # 仓储端口 (内存 / SurrealDB)
//! └── api/           # HTTP 路由和处理器
//! ```

pub mod allocation;
pub mod api;
pub mod auth;
pub mod core;
pub mod db;
pub mod error;
pub mod logger;
pub mod models;
pub mod payment;
pub mod pricing;
pub mod services;
pub mod util;

// Re-export 公共类型
pub use crate::allocation::{AllocationManager, ReservationSweeper};
pub use crate::core::{Config, Server, ServerState};
pub use crate::error::{ApiResponse, AppError, AppResult, ErrorCode};
pub use crate::logger::{init_logger, init_logger_with_file};
