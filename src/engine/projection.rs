// ==========================================
// 招生预测与班额优化系统 - 队列推移预测引擎
// ==========================================
// 红线: 多年预测必须逐年顺序执行（上一年输出即下一年输入）
// 红线: 单年级容量截断不计入 reduction,仅全校约束计入
// ==========================================
// 职责: 由基准年人数 + 情景 + 覆写栈推算目标年各年级人数
// 输入: ProjectionInput
// 输出: ProjectionResult（单年）/ Vec<ProjectionResult>（多年）
// ==========================================

mod core;

#[cfg(test)]
mod tests;

pub use core::{ProjectionEngine, ProjectionInput};
