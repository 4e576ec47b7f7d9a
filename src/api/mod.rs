// ==========================================
// 招生预测与班额优化系统 - API 层
// ==========================================
// 职责: 提供进程内业务 API,负责边界校验与配置合并
// ==========================================

pub mod error;
pub mod planning_api;
pub mod validator;

// 重导出核心类型
pub use error::{ApiError, ApiResult, ValidationViolation};
pub use planning_api::{
    HistoricalYearInput, OptimizationItem, OptimizationResponse, PlanningApi, PlanningApiRequest,
};
pub use validator::{parse_enrollment, parse_grade_code, ViolationCollector};
