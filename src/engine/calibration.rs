// ==========================================
// 招生预测与班额优化系统 - 历史校准引擎
// ==========================================
// 职责: 由 2~3 年历史人数推导加权升级率,拆分为保留率 + 插班率
// 输入: 历史人数快照列表（任意顺序）
// 输出: CalibrationResult（覆盖除入口年级外的全部年级）
// 红线: 分母为 0 时返回 None,不得当作 0% 处理
// ==========================================

use crate::domain::calibration::{CalibrationResult, CalibrationSource, GradeCalibrationResult};
use crate::domain::enrollment::HistoricalEnrollmentYear;
use crate::domain::grade::{GradeCode, GradeTaxonomy};
use crate::engine::rounding::round_half_up;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// N-1 年默认权重
pub const DEFAULT_WEIGHT_N1: f64 = 0.70;
/// N-2 年默认权重
pub const DEFAULT_WEIGHT_N2: f64 = 0.30;
/// 参与校准的最大年数
pub const MAX_CALIBRATION_YEARS: usize = 3;

const PROGRESSION_DECIMALS: i32 = 4;
const LATERAL_DECIMALS: i32 = 3;

// ==========================================
// CalibrationEngine - 历史校准引擎
// ==========================================
pub struct CalibrationEngine {
    // 无状态引擎
}

impl CalibrationEngine {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 比率计算
    // ==========================================

    /// 单年升级率 = to_year[grade] / from_year[prev_grade]
    ///
    /// # 返回
    /// - Some(rate): 四位小数
    /// - None: 前一年级人数为 0（比率无定义）
    pub fn calculate_grade_progression(
        &self,
        grade: GradeCode,
        prev_grade: GradeCode,
        from_year: &HistoricalEnrollmentYear,
        to_year: &HistoricalEnrollmentYear,
    ) -> Option<f64> {
        let denominator = from_year.count(prev_grade);
        if denominator == 0 {
            return None;
        }
        let numerator = to_year.count(grade);
        Some(round_half_up(
            numerator as f64 / denominator as f64,
            PROGRESSION_DECIMALS,
        ))
    }

    /// 加权升级率
    ///
    /// 规则:
    /// 1) 两年都有 → n1 × w1 + n2 × w2
    /// 2) 只有一年 → 原值（不重新归一化权重）
    /// 3) 都没有 → None
    pub fn calculate_weighted_progression(
        &self,
        progression_n1: Option<f64>,
        progression_n2: Option<f64>,
        weight_n1: f64,
        weight_n2: f64,
    ) -> Option<f64> {
        match (progression_n1, progression_n2) {
            (Some(n1), Some(n2)) => Some(round_half_up(
                n1 * weight_n1 + n2 * weight_n2,
                PROGRESSION_DECIMALS,
            )),
            (Some(single), None) | (None, Some(single)) => Some(single),
            (None, None) => None,
        }
    }

    /// 插班率 = max(0, 加权升级率 - 保留率),三位小数
    pub fn derive_lateral_rate(&self, weighted_progression: f64, retention: f64) -> f64 {
        round_half_up((weighted_progression - retention).max(0.0), LATERAL_DECIMALS)
    }

    // ==========================================
    // 年级校准
    // ==========================================

    /// 校准单个年级
    ///
    /// # 返回
    /// - None: 少于 2 年数据 / 入口年级 / 各年分母均为 0
    pub fn calibrate_grade(
        &self,
        grade: GradeCode,
        historical_years: &[HistoricalEnrollmentYear],
        weight_n1: f64,
        weight_n2: f64,
    ) -> Option<GradeCalibrationResult> {
        let prev_grade = grade.previous()?;

        let years = sorted_descending(historical_years);
        if years.len() < 2 {
            return None;
        }

        // N-1: 最近两年
        let progression_n1 =
            self.calculate_grade_progression(grade, prev_grade, years[1], years[0]);

        // N-2: 仅在存在第三年时计算
        let progression_n2 = years
            .get(2)
            .and_then(|oldest| self.calculate_grade_progression(grade, prev_grade, oldest, years[1]));

        let weighted = self.calculate_weighted_progression(
            progression_n1,
            progression_n2,
            weight_n1,
            weight_n2,
        )?;

        let cycle = grade.cycle();
        let retention = cycle.default_retention();
        let lateral = self.derive_lateral_rate(weighted, retention);

        Some(GradeCalibrationResult {
            grade_code: grade,
            cycle_code: cycle,
            is_entry_point: grade.is_entry_point(),
            progression_rate: weighted,
            retention_rate: retention,
            derived_lateral_rate: lateral,
            progression_n1,
            progression_n2,
            weight_n1,
            weight_n2,
            attrition_detected: weighted < retention,
            source: CalibrationSource::Calibrated,
        })
    }

    /// 全年级校准
    ///
    /// 每个非入口年级都会出现在结果中；无法校准的年级回退到静态默认值
    #[instrument(skip(self, historical_years), fields(years = historical_years.len()))]
    pub fn calibrate_from_historical(
        &self,
        historical_years: &[HistoricalEnrollmentYear],
        weight_n1: f64,
        weight_n2: f64,
    ) -> CalibrationResult {
        let years = sorted_descending(historical_years);
        let years_used: Vec<i32> = if years.len() < 2 {
            Vec::new()
        } else {
            years
                .iter()
                .take(MAX_CALIBRATION_YEARS)
                .map(|y| y.fiscal_year)
                .collect()
        };

        let mut grades = BTreeMap::new();
        for grade in GradeTaxonomy.progression_grades() {
            let result = match self.calibrate_grade(grade, historical_years, weight_n1, weight_n2) {
                Some(result) => {
                    debug!(
                        grade = %grade,
                        progression = result.progression_rate,
                        lateral = result.derived_lateral_rate,
                        attrition = result.attrition_detected,
                        "年级校准完成"
                    );
                    result
                }
                None => {
                    warn!(grade = %grade, "历史数据不足,回退到静态默认比率");
                    self.default_grade_result(grade, weight_n1, weight_n2)
                }
            };
            grades.insert(grade, result);
        }

        CalibrationResult {
            grades,
            years_used,
            weight_n1,
            weight_n2,
        }
    }

    /// 静态默认比率
    ///
    /// 年级未登记默认值时: 学段默认保留率 + 零插班率
    pub fn default_grade_result(
        &self,
        grade: GradeCode,
        weight_n1: f64,
        weight_n2: f64,
    ) -> GradeCalibrationResult {
        let cycle = grade.cycle();
        let (retention, lateral) = grade
            .documented_default_rates()
            .unwrap_or((cycle.default_retention(), 0.0));

        GradeCalibrationResult {
            grade_code: grade,
            cycle_code: cycle,
            is_entry_point: grade.is_entry_point(),
            progression_rate: round_half_up(retention + lateral, PROGRESSION_DECIMALS),
            retention_rate: retention,
            derived_lateral_rate: lateral,
            progression_n1: None,
            progression_n2: None,
            weight_n1,
            weight_n2,
            attrition_detected: false,
            source: CalibrationSource::Default,
        }
    }
}

impl Default for CalibrationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 按财年降序排列（不改动调用方数据）
fn sorted_descending(years: &[HistoricalEnrollmentYear]) -> Vec<&HistoricalEnrollmentYear> {
    let mut sorted: Vec<&HistoricalEnrollmentYear> = years.iter().collect();
    sorted.sort_by(|a, b| b.fiscal_year.cmp(&a.fiscal_year));
    sorted
}

// ==========================================
// 测试模块
// ==========================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::enrollment::EnrollmentMap;

    fn year(fiscal_year: i32, counts: &[(GradeCode, u32)]) -> HistoricalEnrollmentYear {
        let grades: EnrollmentMap = counts.iter().copied().collect();
        HistoricalEnrollmentYear::new(fiscal_year, grades)
    }

    #[test]
    fn test_progression_zero_denominator_is_none() {
        let engine = CalibrationEngine::new();
        let from = year(2023, &[(GradeCode::Cp, 0)]);
        let to = year(2024, &[(GradeCode::Ce1, 40)]);

        let rate = engine.calculate_grade_progression(GradeCode::Ce1, GradeCode::Cp, &from, &to);
        assert_eq!(rate, None);
    }

    #[test]
    fn test_progression_rounds_to_four_places() {
        let engine = CalibrationEngine::new();
        let from = year(2023, &[(GradeCode::Cp, 3)]);
        let to = year(2024, &[(GradeCode::Ce1, 2)]);

        let rate = engine.calculate_grade_progression(GradeCode::Ce1, GradeCode::Cp, &from, &to);
        assert_eq!(rate, Some(0.6667));
    }

    #[test]
    fn test_weighted_progression_blend() {
        let engine = CalibrationEngine::new();
        let weighted = engine.calculate_weighted_progression(
            Some(1.10),
            Some(1.30),
            DEFAULT_WEIGHT_N1,
            DEFAULT_WEIGHT_N2,
        );
        assert_eq!(weighted, Some(1.16));
    }

    #[test]
    fn test_weighted_progression_single_year_not_renormalized() {
        let engine = CalibrationEngine::new();
        assert_eq!(
            engine.calculate_weighted_progression(None, Some(1.05), 0.7, 0.3),
            Some(1.05)
        );
        assert_eq!(
            engine.calculate_weighted_progression(Some(0.98), None, 0.7, 0.3),
            Some(0.98)
        );
        assert_eq!(engine.calculate_weighted_progression(None, None, 0.7, 0.3), None);
    }

    #[test]
    fn test_derive_lateral_rate() {
        let engine = CalibrationEngine::new();
        assert_eq!(engine.derive_lateral_rate(1.323, 0.96), 0.363);
        // 净流失不产生负插班率
        assert_eq!(engine.derive_lateral_rate(0.90, 0.96), 0.0);
    }

    #[test]
    fn test_calibrate_grade_requires_two_years() {
        let engine = CalibrationEngine::new();
        let years = vec![year(2024, &[(GradeCode::Cp, 50), (GradeCode::Ce1, 48)])];
        assert!(engine
            .calibrate_grade(GradeCode::Ce1, &years, 0.7, 0.3)
            .is_none());
    }

    #[test]
    fn test_entry_grade_never_calibrates() {
        let engine = CalibrationEngine::new();
        let years = vec![
            year(2024, &[(GradeCode::Ps, 60)]),
            year(2023, &[(GradeCode::Ps, 58)]),
        ];
        assert!(engine.calibrate_grade(GradeCode::Ps, &years, 0.7, 0.3).is_none());
    }

    #[test]
    fn test_calibrate_grade_three_years_unsorted_input() {
        let engine = CalibrationEngine::new();
        // 故意乱序
        let years = vec![
            year(2023, &[(GradeCode::Cp, 50), (GradeCode::Ce1, 65)]),
            year(2024, &[(GradeCode::Cp, 52), (GradeCode::Ce1, 55)]),
            year(2022, &[(GradeCode::Cp, 50), (GradeCode::Ce1, 40)]),
        ];

        let result = engine
            .calibrate_grade(GradeCode::Ce1, &years, 0.7, 0.3)
            .unwrap();

        // N-1: 2024 CE1 / 2023 CP = 55/50 = 1.10
        // N-2: 2023 CE1 / 2022 CP = 65/50 = 1.30
        assert_eq!(result.progression_n1, Some(1.1));
        assert_eq!(result.progression_n2, Some(1.3));
        assert_eq!(result.progression_rate, 1.16);
        assert_eq!(result.retention_rate, 0.96);
        assert_eq!(result.derived_lateral_rate, 0.2);
        assert!(!result.attrition_detected);
        assert_eq!(result.source, CalibrationSource::Calibrated);
    }

    #[test]
    fn test_attrition_is_flagged_and_floored() {
        let engine = CalibrationEngine::new();
        let years = vec![
            year(2024, &[(GradeCode::Seconde, 80), (GradeCode::Premiere, 60)]),
            year(2023, &[(GradeCode::Seconde, 80), (GradeCode::Premiere, 70)]),
        ];

        let result = engine
            .calibrate_grade(GradeCode::Premiere, &years, 0.7, 0.3)
            .unwrap();
        assert_eq!(result.progression_rate, 0.75);
        assert_eq!(result.derived_lateral_rate, 0.0);
        assert!(result.attrition_detected);
    }

    #[test]
    fn test_calibrate_from_historical_falls_back_per_grade() {
        let engine = CalibrationEngine::new();
        let years = vec![
            year(2024, &[(GradeCode::Ms, 62), (GradeCode::Ps, 60)]),
            year(2023, &[(GradeCode::Ps, 58)]),
        ];

        let result = engine.calibrate_from_historical(&years, 0.7, 0.3);
        assert_eq!(result.grades.len(), 14);
        assert_eq!(result.years_used, vec![2024, 2023]);

        let ms = result.grade(GradeCode::Ms).unwrap();
        assert_eq!(ms.source, CalibrationSource::Calibrated);
        assert_eq!(ms.progression_rate, 1.069);

        // CE1 的前一年级 CP 为 0 → 默认值
        let ce1 = result.grade(GradeCode::Ce1).unwrap();
        assert_eq!(ce1.source, CalibrationSource::Default);
        assert_eq!(ce1.derived_lateral_rate, 0.03);

        // TERM 未登记默认值 → 学段保留率 + 零插班
        let term = result.grade(GradeCode::Terminale).unwrap();
        assert_eq!(term.retention_rate, 0.93);
        assert_eq!(term.derived_lateral_rate, 0.0);
    }

    #[test]
    fn test_years_used_capped_at_three() {
        let engine = CalibrationEngine::new();
        let years: Vec<_> = (2019..=2024)
            .map(|fy| year(fy, &[(GradeCode::Ps, 50), (GradeCode::Ms, 50)]))
            .collect();

        let result = engine.calibrate_from_historical(&years, 0.7, 0.3);
        assert_eq!(result.years_used, vec![2024, 2023, 2022]);
    }
}
