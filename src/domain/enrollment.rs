// ==========================================
// 招生预测与班额优化系统 - 在籍人数快照
// ==========================================
// 来源: 外部导入的历史实际人数（由导入服务保证格式正确）
// 红线: 缺失年级一律视为 0 人
// ==========================================

use crate::domain::grade::GradeCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 年级 → 人数 映射（按年级体系顺序排序）
pub type EnrollmentMap = BTreeMap<GradeCode, u32>;

/// 读取某年级人数,缺失视为 0
pub fn enrollment_of(enrollment: &EnrollmentMap, grade: GradeCode) -> u32 {
    enrollment.get(&grade).copied().unwrap_or(0)
}

// ==========================================
// HistoricalEnrollmentYear - 单个财年的历史人数
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalEnrollmentYear {
    pub fiscal_year: i32,
    #[serde(default)]
    pub grades: EnrollmentMap,
}

impl HistoricalEnrollmentYear {
    pub fn new(fiscal_year: i32, grades: EnrollmentMap) -> Self {
        Self { fiscal_year, grades }
    }

    /// 年级人数（缺失视为 0）
    pub fn count(&self, grade: GradeCode) -> u32 {
        enrollment_of(&self.grades, grade)
    }

    pub fn total(&self) -> u32 {
        self.grades.values().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_grade_counts_as_zero() {
        let mut grades = EnrollmentMap::new();
        grades.insert(GradeCode::Cp, 52);
        let year = HistoricalEnrollmentYear::new(2024, grades);

        assert_eq!(year.count(GradeCode::Cp), 52);
        assert_eq!(year.count(GradeCode::Ce1), 0);
        assert_eq!(year.total(), 52);
    }

    #[test]
    fn test_deserialize_from_grade_code_keys() {
        let json = r#"{"fiscal_year": 2023, "grades": {"PS": 60, "6EME": 88}}"#;
        let year: HistoricalEnrollmentYear = serde_json::from_str(json).unwrap();
        assert_eq!(year.count(GradeCode::Ps), 60);
        assert_eq!(year.count(GradeCode::Sixieme), 88);
    }
}
