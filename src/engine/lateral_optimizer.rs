// ==========================================
// 招生预测与班额优化系统 - 插班优化器
// ==========================================
// 红线: 决策按固定顺序评估,首个命中即返回（非迭代搜索）
// 红线: 每个决策必须输出 reason
// ==========================================
// 职责: 给定保留人数与插班需求,决定接收人数与是否开新班
// 输入: GradeOptimizationInput（保留人数 + 历史需求 + 班额配置）
// 输出: GradeOptimizationResult + NewStudentsSummary
// ==========================================

mod core;
mod summary;

#[cfg(test)]
mod tests;

pub use core::{analyze_capacity, CapacityAnalysis, LateralEntryOptimizer, DEFAULT_NEW_CLASS_CAPACITY};
pub use summary::build_new_students_summary;
