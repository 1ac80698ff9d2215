use thiserror::Error;

use crate::delivery::{DeliveryError, StorageError};

/// 服务器启动与运行错误
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("存储初始化失败: {0}")]
    Storage(#[from] StorageError),

    #[error("投递引擎初始化失败: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("内部服务器错误: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ServerError>;
