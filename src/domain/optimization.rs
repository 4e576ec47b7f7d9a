// ==========================================
// 招生预测与班额优化系统 - 插班优化结果
// ==========================================
// 职责: 插班决策标签、单年级输入/输出、跨年级汇总
// 红线: 每个结果只有一个决策,且必须输出 reason
// ==========================================

use crate::domain::class_size::ClassSizeConfig;
use crate::domain::grade::{Cycle, GradeCode};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 插班决策 (Optimization Decision)
// ==========================================
// 闭集: 新增分支必须同步所有 match
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptimizationDecision {
    AcceptAll,          // 全部接收（目标班额内）
    AcceptFillMax,      // 全部接收（填充至班额上限）
    Restrict,           // 限制接收（需求不足以开新班）
    NewClass,           // 开设新班
    RestrictAtCeiling,  // 限制接收（已达最大班级数）
    InsufficientDemand, // 需求不足开班最低人数
}

impl OptimizationDecision {
    /// 是否拒绝了部分需求的决策类型
    pub fn is_restrictive(&self) -> bool {
        matches!(
            self,
            OptimizationDecision::Restrict | OptimizationDecision::RestrictAtCeiling
        )
    }
}

impl fmt::Display for OptimizationDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizationDecision::AcceptAll => write!(f, "ACCEPT_ALL"),
            OptimizationDecision::AcceptFillMax => write!(f, "ACCEPT_FILL_MAX"),
            OptimizationDecision::Restrict => write!(f, "RESTRICT"),
            OptimizationDecision::NewClass => write!(f, "NEW_CLASS"),
            OptimizationDecision::RestrictAtCeiling => write!(f, "RESTRICT_AT_CEILING"),
            OptimizationDecision::InsufficientDemand => write!(f, "INSUFFICIENT_DEMAND"),
        }
    }
}

/// 单年级优化输入
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeOptimizationInput {
    pub grade_code: GradeCode,
    pub cycle_code: Cycle,
    pub is_entry_point: bool,
    pub retained_students: u32,
    pub historical_demand: u32,
    pub class_size: ClassSizeConfig,
}

impl GradeOptimizationInput {
    /// 以年级体系推导学段与入口点标志
    pub fn for_grade(
        grade_code: GradeCode,
        retained_students: u32,
        historical_demand: u32,
        class_size: ClassSizeConfig,
    ) -> Self {
        Self {
            grade_code,
            cycle_code: grade_code.cycle(),
            is_entry_point: grade_code.is_entry_point(),
            retained_students,
            historical_demand,
            class_size,
        }
    }
}

// ==========================================
// GradeOptimizationResult - 单年级决策结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeOptimizationResult {
    pub grade_code: GradeCode,
    pub cycle_code: Cycle,
    pub is_entry_point: bool,
    pub retained_students: u32,
    pub historical_demand: u32,

    // ===== 容量分析 =====
    pub base_classes: u32,
    pub fill_to_target: u32,
    pub fill_to_max: u32,
    pub new_class_threshold: u32,

    // ===== 决策 =====
    pub decision: OptimizationDecision,
    pub decision_reason: String,
    pub accepted: u32,
    pub rejected: u32,

    // ===== 结果 =====
    pub final_classes: u32,
    pub final_students: u32,
    pub avg_class_size: f64,
    pub utilization_pct: f64,
    pub acceptance_rate_pct: f64,
}

// ==========================================
// NewStudentsSummary - 跨年级汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewStudentsSummary {
    pub total_demand: u32,
    pub total_available_slots: u32,
    pub total_accepted: u32,
    pub total_rejected: u32,
    pub overall_acceptance_rate_pct: f64,

    // ===== 需求拆分 =====
    pub entry_point_demand: u32,
    pub incidental_demand: u32,

    // ===== 按决策分桶 =====
    pub grades_accept_all: Vec<GradeCode>,
    pub grades_fill_max: Vec<GradeCode>,
    pub grades_restricted: Vec<GradeCode>,
    pub grades_new_class: Vec<GradeCode>,
    pub grades_insufficient_demand: Vec<GradeCode>,
}
