// ==========================================
// 招生预测与班额优化系统 - 引擎层
// ==========================================
// 职责: 历史校准 / 队列预测 / 插班优化,以及三者的编排
// 红线: Engine 不访问数据库, 所有插班决策必须输出 reason
// ==========================================

pub mod calibration;
pub mod lateral_optimizer;
pub mod orchestrator;
pub mod override_resolver;
pub mod projection;
pub mod rounding;

// 重导出核心引擎
pub use calibration::{CalibrationEngine, DEFAULT_WEIGHT_N1, DEFAULT_WEIGHT_N2, MAX_CALIBRATION_YEARS};
pub use lateral_optimizer::{
    analyze_capacity, build_new_students_summary, CapacityAnalysis, LateralEntryOptimizer,
    DEFAULT_NEW_CLASS_CAPACITY,
};
pub use orchestrator::{PlanningOrchestrator, PlanningReport, PlanningRequest};
pub use override_resolver::{LateralSource, OverrideResolver};
pub use projection::{ProjectionEngine, ProjectionInput};
