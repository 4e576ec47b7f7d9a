// ==========================================
// 招生预测与班额优化系统 - 预测结果
// ==========================================
// 职责: 单个目标年的逐年级预测及全校汇总
// 红线: 仅全校容量约束会填写 reduction 字段
// ==========================================

use crate::domain::enrollment::EnrollmentMap;
use crate::domain::grade::{Cycle, GradeCode};
use serde::{Deserialize, Serialize};

/// 单年级预测分量（保留 + 插班）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradeProjectionComponents {
    pub grade_code: GradeCode,
    pub retained: u32,
    pub lateral: u32,
    pub total: u32,
}

impl GradeProjectionComponents {
    pub fn new(grade_code: GradeCode, retained: u32, lateral: u32) -> Self {
        Self {
            grade_code,
            retained,
            lateral,
            total: retained + lateral,
        }
    }
}

// ==========================================
// GradeProjection - 单年级预测
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeProjection {
    pub grade_code: GradeCode,
    pub cycle_code: Cycle,

    // ===== 人数 =====
    pub retained_students: u32,
    pub lateral_students: u32,
    pub projected_students: u32,

    // ===== 分班 =====
    pub divisions: u32,
    pub avg_class_size: f64,

    // ===== 全校容量约束（仅约束触发时有值）=====
    pub original_students: Option<u32>,
    pub reduction_applied: Option<u32>,
    pub reduction_pct: Option<f64>,
}

// ==========================================
// ProjectionResult - 单个目标年预测
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionResult {
    pub school_year: String,
    pub fiscal_year: i32,
    pub grades: Vec<GradeProjection>,
    pub total_students: u32,
    pub capacity_utilization_pct: f64,
    pub was_capacity_constrained: bool,
    pub total_reduction_applied: u32,
}

impl ProjectionResult {
    pub fn grade(&self, grade: GradeCode) -> Option<&GradeProjection> {
        self.grades.iter().find(|g| g.grade_code == grade)
    }

    /// 本年预测人数（作为下一年的基准人数）
    pub fn enrollment(&self) -> EnrollmentMap {
        self.grades
            .iter()
            .map(|g| (g.grade_code, g.projected_students))
            .collect()
    }
}

/// 财年 → 学年标签（财年 F 开学 → "F-(F+1)"）
pub fn school_year_label(fiscal_year: i32) -> String {
    format!("{}-{}", fiscal_year, fiscal_year + 1)
}
