// ==========================================
// 招生预测与班额优化系统 - 配置层错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 配置层错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    // ===== 存储错误 =====
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    // ===== 配置值错误 =====
    #[error("配置 JSON 解析失败: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("配置值无效 (key={key}): {message}")]
    InvalidValue { key: String, message: String },

    #[error("未知情景: {0}")]
    UnknownScenario(String),
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
