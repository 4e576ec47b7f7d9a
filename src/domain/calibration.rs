// ==========================================
// 招生预测与班额优化系统 - 历史校准结果
// ==========================================
// 职责: 校准引擎输出的领域对象（每次调用新建,不可变）
// 红线: derived_lateral_rate 永远 ≥ 0
// ==========================================

use crate::domain::grade::{Cycle, GradeCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 比率来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalibrationSource {
    Calibrated, // 历史数据推导
    Default,    // 静态默认值回退
}

// ==========================================
// GradeCalibrationResult - 单年级校准结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeCalibrationResult {
    pub grade_code: GradeCode,
    pub cycle_code: Cycle,
    pub is_entry_point: bool,

    // ===== 比率 =====
    pub progression_rate: f64,      // 加权升级率
    pub retention_rate: f64,        // 基准保留率（学段默认）
    pub derived_lateral_rate: f64,  // 推导插班率（≥ 0）

    // ===== 分年度数据 =====
    pub progression_n1: Option<f64>, // N-1 年升级率（数据不足为 None）
    pub progression_n2: Option<f64>, // N-2 年升级率
    pub weight_n1: f64,
    pub weight_n2: f64,

    /// 加权升级率低于保留率（净流失,插班率已截断为 0）
    pub attrition_detected: bool,
    pub source: CalibrationSource,
}

impl GradeCalibrationResult {
    /// 有效升级率 = 保留率 × (1 + 插班率)
    pub fn effective_progression(&self) -> f64 {
        self.retention_rate * (1.0 + self.derived_lateral_rate)
    }
}

/// 单年级有效比率（校准值或默认值）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectiveRate {
    pub retention_rate: f64,
    pub lateral_rate: f64,
}

/// 年级 → 有效比率
pub type EffectiveRates = BTreeMap<GradeCode, EffectiveRate>;

// ==========================================
// CalibrationResult - 校准汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationResult {
    /// 除入口年级外的全部年级
    pub grades: BTreeMap<GradeCode, GradeCalibrationResult>,
    /// 实际使用的财年（降序,最多 3 个）
    pub years_used: Vec<i32>,
    pub weight_n1: f64,
    pub weight_n2: f64,
}

impl CalibrationResult {
    pub fn grade(&self, grade: GradeCode) -> Option<&GradeCalibrationResult> {
        self.grades.get(&grade)
    }

    /// 供预测引擎使用的有效比率
    pub fn effective_rates(&self) -> EffectiveRates {
        self.grades
            .iter()
            .map(|(grade, result)| {
                (
                    *grade,
                    EffectiveRate {
                        retention_rate: result.retention_rate,
                        lateral_rate: result.derived_lateral_rate,
                    },
                )
            })
            .collect()
    }

    /// 回退到默认值的年级
    pub fn defaulted_grades(&self) -> Vec<GradeCode> {
        self.grades
            .values()
            .filter(|r| r.source == CalibrationSource::Default)
            .map(|r| r.grade_code)
            .collect()
    }
}
