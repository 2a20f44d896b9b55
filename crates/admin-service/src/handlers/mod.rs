//! HTTP 请求处理器模块
//!
//! 包含所有 REST API 端点的处理器实现

pub mod database;
pub mod health;
pub mod member;
pub mod points;
pub mod post;
pub mod product;
pub mod push;
pub mod settlement;
pub mod stats;
pub mod transaction;
pub mod user;
