use std::path::PathBuf;

/// 服务器配置
///
/// # 环境变量
///
/// 所有配置项都可以通过环境变量覆盖：
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | HTTP_PORT | 3001 | HTTP + WebSocket 端口 |
/// | CLIENT_URL | http://localhost:3000 | 允许的 CORS 来源 (`*` 表示任意) |
/// | SESSION_QUEUE_CAPACITY | 256 | 每个实时会话的推送队列容量 |
/// | PING_INTERVAL_MS | 5000 | WebSocket 心跳间隔(毫秒) |
/// | REQUEST_TIMEOUT_MS | 30000 | HTTP 请求超时(毫秒) |
/// | MAX_CONNECTIONS | 1000 | 最大并发请求数 |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_JSON | false | JSON 格式日志 |
/// | ENVIRONMENT | development | 运行环境 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/quiz HTTP_PORT=8080 cargo run -p quiz-server
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录，存储数据库和日志
    pub work_dir: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 前端地址 (CORS)
    pub client_url: String,
    /// 实时推送队列容量，满时丢弃并由客户端对账补齐
    pub session_queue_capacity: usize,
    /// WebSocket 心跳间隔 (毫秒)
    pub ping_interval_ms: u64,
    /// 请求超时时间 (毫秒)
    pub request_timeout_ms: u64,
    /// 最大并发请求数
    pub max_connections: usize,
    /// 日志级别
    pub log_level: String,
    /// 是否输出 JSON 日志
    pub log_json: bool,
    /// 运行环境: development | staging | production
    pub environment: String,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: env_or("HTTP_PORT", 3001),
            client_url: std::env::var("CLIENT_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            session_queue_capacity: env_or("SESSION_QUEUE_CAPACITY", 256),
            ping_interval_ms: env_or("PING_INTERVAL_MS", 5000),
            request_timeout_ms: env_or("REQUEST_TIMEOUT_MS", 30000),
            max_connections: env_or("MAX_CONNECTIONS", 1000),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: env_or("LOG_JSON", false),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
        }
    }

    /// 使用自定义值覆盖部分配置
    ///
    /// 常用于测试场景
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// 数据库文件路径
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("database").join("quiz.redb")
    }

    /// 日志目录
    pub fn log_dir(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join("logs")
    }

    /// 是否允许任意来源
    pub fn allows_any_origin(&self) -> bool {
        self.client_url.trim() == "*"
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
