//! 后台管理服务
//!
//! 面向运营后台的 REST API：数据库连接检查、Mock 降级统计、
//! 结构自省、迁移与演示数据，以及各业务资源的 CRUD。
//!
//! ## 模块结构
//!
//! - `dto`: 请求和响应的数据传输对象
//! - `models`: 实体模型
//! - `error`: 错误类型定义
//! - `fallback`: Mock 降级判定与固定快照
//! - `repository`: 数据访问层（PostgreSQL / 内存）
//! - `handlers`: HTTP 请求处理器
//! - `routes`: 路由配置
//! - `state`: 应用状态
//!
//! ## 技术栈
//!
//! - Web 框架：Axum
//! - 数据库：sqlx (PostgreSQL)
//! - 数据验证：validator
//! - 序列化：serde (camelCase)

pub mod dto;
pub mod error;
pub mod fallback;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod routes;
pub mod state;

// 重新导出核心类型
pub use dto::{ApiResponse, PageResponse, PaginationParams, StatsResponse};
pub use error::{AdminError, Result};
pub use repository::{MemoryStore, Repositories};
pub use state::AppState;
