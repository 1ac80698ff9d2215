use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;

use crate::core::{Config, Result};
use crate::delivery::{DeliveryEngine, QuizStorage};

/// 服务器状态 - 持有所有服务的共享引用
///
/// 使用 Arc 实现浅拷贝，每个请求克隆的成本极低。
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | engine | Arc<DeliveryEngine> | 序列分配、确认、对账、实时推送 |
/// | started_at | Instant | 启动时间 (健康检查) |
/// | shutdown | CancellationToken | 关闭信号，实时会话据此退出 |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub engine: Arc<DeliveryEngine>,
    pub started_at: Instant,
    pub shutdown: CancellationToken,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 打开 `WORK_DIR/database/quiz.redb`，并从中恢复序列号
    pub fn initialize(config: &Config) -> Result<Self> {
        let db_path = config.database_path();
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let storage = QuizStorage::open(&db_path)?;
        tracing::info!(path = %db_path.display(), "Database opened");

        Self::with_storage(config.clone(), storage)
    }

    /// 使用已有存储创建状态 (测试或内存模式)
    pub fn with_storage(config: Config, storage: QuizStorage) -> Result<Self> {
        let engine = DeliveryEngine::new(storage, config.session_queue_capacity)?;
        Ok(Self {
            config,
            engine: Arc::new(engine),
            started_at: Instant::now(),
            shutdown: CancellationToken::new(),
        })
    }

    /// 运行时间 (秒)
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
