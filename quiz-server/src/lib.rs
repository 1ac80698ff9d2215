//! Quiz Server - 按序投递与对账服务
//!
//! # 架构概述
//!
//! - **投递核心** (`delivery`): 序列号分配、确认记录、对账、实时推送
//! - **存储** (`delivery::storage`): 嵌入式 redb
//! - **HTTP API** (`api`): REST 接口 + WebSocket 实时通道
//!
//! # 模块结构
//!
//! ```text
//! quiz-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── delivery/      # 投递核心
//! ├── services/      # HTTP 应用组装
//! ├── api/           # HTTP 路由和处理器
//! └── utils/         # 错误、日志
//! ```

pub mod api;
pub mod core;
pub mod delivery;
pub mod services;
pub mod utils;

// Re-export 公共类型
pub use crate::core::{Config, Server, ServerError, ServerState};
pub use delivery::{DeliveryEngine, DeliveryError, QuizStorage};
pub use utils::{AppError, AppResult};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// 设置运行环境
///
/// 1. 加载 `.env`
/// 2. 读取配置
/// 3. 创建工作目录和日志目录
/// 4. 初始化日志
pub fn setup_environment() -> std::io::Result<Config> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    let log_dir = config.log_dir();
    std::fs::create_dir_all(&log_dir)?;

    init_logger_with_file(
        Some(config.log_level.as_str()),
        config.log_json,
        Some(log_dir.as_path()),
    );

    tracing::debug!(work_dir = %config.work_dir, environment = %config.environment, "Environment ready");
    Ok(config)
}

pub fn print_banner() {
    println!(
        r#"
   ____        _
  / __ \__  __(_)___
 / / / / / / / /_  /
/ /_/ / /_/ / / / /_
\___\_\__,_/_/ /___/
    "#
    );
}
