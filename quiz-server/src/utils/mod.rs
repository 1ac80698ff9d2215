//! 工具模块 - 错误类型、日志等通用工具

pub mod error;
pub mod logger;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
