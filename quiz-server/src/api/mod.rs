//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`questions`] - 题目创建与查询
//! - [`reconcile`] - 断线重连对账
//! - [`clients`] - 客户端确认记录
//! - [`live`] - WebSocket 实时推送

pub mod clients;
pub mod health;
pub mod live;
pub mod questions;
pub mod reconcile;

// Re-export common types for handlers
pub use crate::utils::{AppError, AppResult};
