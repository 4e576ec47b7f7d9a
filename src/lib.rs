// ==========================================
// 招生预测与班额优化系统 - 核心库
// ==========================================
// 组成: 历史校准引擎 / 队列预测引擎 / 插班优化器
// 技术栈: Rust + SQLite
// 系统定位: 决策支持系统 (招生名额由人工最终确认)
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 校准 / 预测 / 插班优化
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CalibrationResult, ClassSizeConfig, Cycle, EnrollmentMap, GradeCode,
    GradeOptimizationResult, HistoricalEnrollmentYear, NewStudentsSummary, OptimizationDecision,
    OverrideStack, ProjectionResult, ScenarioParams,
};

// 引擎
pub use engine::{
    CalibrationEngine, LateralEntryOptimizer, PlanningOrchestrator, PlanningReport,
    PlanningRequest, ProjectionEngine,
};

// 配置
pub use config::{ConfigManager, EngineConfig};

// API
pub use api::{ApiError, ApiResult, PlanningApi, PlanningApiRequest};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "招生预测与班额优化系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_taxonomy_is_complete() {
        assert_eq!(GradeCode::ALL.len(), 15);
        assert_eq!(Cycle::ALL.len(), 4);
    }
}
