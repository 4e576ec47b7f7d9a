// ==========================================
// 招生预测与班额优化系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换配置层错误为用户友好的错误消息
// 红线: 错误信息必须包含显式原因
// ==========================================

use crate::config::error::ConfigError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("未知年级代码: {0}")]
    UnknownGrade(String),

    #[error("未知情景: {0}")]
    UnknownScenario(String),

    /// 边界校验失败（带逐项原因）
    #[error("数据验证失败: {reason}")]
    ValidationError {
        reason: String,
        violations: Vec<ValidationViolation>,
    },

    // ==========================================
    // 配置与数据访问错误
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 ConfigError 转换
// ==========================================
impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::UnknownScenario(name) => ApiError::UnknownScenario(name),
            ConfigError::Database(e) => ApiError::DatabaseError(e.to_string()),
            ConfigError::LockError(msg) => {
                ApiError::DatabaseError(format!("数据库锁获取失败: {}", msg))
            }
            ConfigError::InvalidValue { key, message } => {
                ApiError::ConfigError(format!("配置项{}无效: {}", key, message))
            }
            ConfigError::JsonParse(e) => ApiError::ConfigError(format!("配置 JSON 解析失败: {}", e)),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

// ==========================================
// 校验违规详情
// ==========================================

/// 校验违规详情
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidationViolation {
    /// 出错字段（如 weight_n1 / grade_overrides.CP.retention_rate）
    pub field: String,
    /// 违规原因
    pub reason: String,
}

impl ValidationViolation {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
