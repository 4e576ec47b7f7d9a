// ==========================================
// 招生预测与班额优化系统 - 领域模型层
// ==========================================
// 职责: 定义年级体系、人数快照、情景参数、覆盖层与各引擎的输入输出
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod calibration;
pub mod class_size;
pub mod enrollment;
pub mod grade;
pub mod optimization;
pub mod overrides;
pub mod projection;
pub mod scenario;

// 重导出核心类型
pub use calibration::{
    CalibrationResult, CalibrationSource, EffectiveRate, EffectiveRates, GradeCalibrationResult,
};
pub use class_size::ClassSizeConfig;
pub use enrollment::{enrollment_of, EnrollmentMap, HistoricalEnrollmentYear};
pub use grade::{Cycle, GradeCode, GradeTaxonomy};
pub use optimization::{
    GradeOptimizationInput, GradeOptimizationResult, NewStudentsSummary, OptimizationDecision,
};
pub use overrides::{GlobalOverrides, GradeOverride, LevelOverride, OverrideStack};
pub use projection::{school_year_label, GradeProjection, GradeProjectionComponents, ProjectionResult};
pub use scenario::ScenarioParams;
