// ==========================================
// 招生预测与班额优化系统 - 配置层
// ==========================================
// 职责: 系统配置管理,支持 global / 学段 / 年级 三级覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod engine_config;
pub mod error;

// 重导出核心配置管理器
pub use config_manager::{config_keys, get_default_db_path, ConfigManager, ConfigScope, ConfigSnapshot};
pub use engine_config::{EngineConfig, DEFAULT_PROJECTION_HORIZON};
pub use error::{ConfigError, ConfigResult};
