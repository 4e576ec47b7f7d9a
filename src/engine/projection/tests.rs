use super::*;
use crate::domain::calibration::{EffectiveRate, EffectiveRates};
use crate::domain::enrollment::EnrollmentMap;
use crate::domain::grade::GradeCode;
use crate::domain::overrides::{GradeOverride, OverrideStack};
use crate::domain::scenario::ScenarioParams;

// ==========================================
// 测试辅助函数
// ==========================================

/// 每个年级 50 人的基准快照
fn flat_enrollment(per_grade: u32) -> EnrollmentMap {
    GradeCode::ALL.iter().map(|g| (*g, per_grade)).collect()
}

fn create_test_input(base_enrollment: EnrollmentMap) -> ProjectionInput {
    ProjectionInput {
        base_fiscal_year: 2024,
        target_fiscal_year: 2025,
        base_enrollment,
        scenario: ScenarioParams::default(),
        overrides: OverrideStack::default(),
        effective_rates: None,
        school_max_capacity: None,
        growth_origin_year: None,
    }
}

// ==========================================
// 单年预测
// ==========================================

#[test]
fn test_single_year_cohort_roll_forward() {
    let engine = ProjectionEngine::new();
    let result = engine.project_enrollment(&create_test_input(flat_enrollment(50)));

    assert_eq!(result.fiscal_year, 2025);
    assert_eq!(result.school_year, "2025-2026");
    assert_eq!(result.grades.len(), 15);

    // 入口年级: 65 × 1.02 = 66.3 → 66,全部计为插班
    let ps = result.grade(GradeCode::Ps).unwrap();
    assert_eq!(ps.retained_students, 0);
    assert_eq!(ps.lateral_students, 66);
    assert_eq!(ps.divisions, 3);
    assert_eq!(ps.avg_class_size, 22.0);

    // MS: floor(50 × 0.96) = 48 + 旧版固定 6
    let ms = result.grade(GradeCode::Ms).unwrap();
    assert_eq!(ms.retained_students, 48);
    assert_eq!(ms.lateral_students, 6);
    assert_eq!(ms.projected_students, 54);
    assert_eq!(ms.divisions, 2);
    assert_eq!(ms.avg_class_size, 27.0);

    // TERM 使用毕业年级保留率: floor(50 × 0.93) = 46
    let term = result.grade(GradeCode::Terminale).unwrap();
    assert_eq!(term.retained_students, 46);
    assert_eq!(term.lateral_students, 0);

    assert_eq!(result.total_students, 794);
    assert!(!result.was_capacity_constrained);
    assert_eq!(result.total_reduction_applied, 0);
    assert!(result.grades.iter().all(|g| g.reduction_applied.is_none()));
}

#[test]
fn test_utilization_without_school_max_uses_theoretical_capacity() {
    let engine = ProjectionEngine::new();
    let result = engine.project_enrollment(&create_test_input(flat_enrollment(50)));

    // 794 / 2694 (各年级 最大班级数 × 班额上限 之和)
    assert_eq!(result.capacity_utilization_pct, 29.5);
}

#[test]
fn test_project_enrollment_is_idempotent() {
    let engine = ProjectionEngine::new();
    let input = create_test_input(flat_enrollment(50));

    let first = engine.project_enrollment(&input);
    let second = engine.project_enrollment(&input);
    assert_eq!(first, second);
}

// ==========================================
// 容量约束
// ==========================================

#[test]
fn test_per_grade_clamp_is_proportional_and_not_reported() {
    let engine = ProjectionEngine::new();
    let mut base = flat_enrollment(50);
    base.insert(GradeCode::Gs, 100);

    let mut input = create_test_input(base);
    input.overrides.grades.insert(
        GradeCode::Cp,
        GradeOverride {
            max_divisions: Some(2),
            class_size_ceiling: Some(25),
            ..Default::default()
        },
    );

    let result = engine.project_enrollment(&input);
    let cp = result.grade(GradeCode::Cp).unwrap();

    // 原始: 保留 96 + 插班 8 = 104 > 50
    assert_eq!(cp.retained_students, 46);
    assert_eq!(cp.lateral_students, 3);
    assert!(cp.projected_students <= 50);
    assert_eq!(cp.divisions, 2);
    assert_eq!(cp.reduction_applied, None);
    assert!(!result.was_capacity_constrained);

    // 比例保持（误差 1 人以内）
    let ratio = 50.0 / 104.0;
    assert!((cp.retained_students as f64 - 96.0 * ratio).abs() < 1.0);
    assert!((cp.lateral_students as f64 - 8.0 * ratio).abs() < 1.0);
}

#[test]
fn test_school_wide_constraint_reports_reduction() {
    let engine = ProjectionEngine::new();
    let mut input = create_test_input(flat_enrollment(50));
    input.school_max_capacity = Some(500);

    let result = engine.project_enrollment(&input);

    assert!(result.was_capacity_constrained);
    // 各分量按 500/794 向下取整
    assert_eq!(result.total_students, 489);
    assert_eq!(result.total_reduction_applied, 305);
    assert_eq!(result.capacity_utilization_pct, 97.8);

    let ps = result.grade(GradeCode::Ps).unwrap();
    assert_eq!(ps.original_students, Some(66));
    assert_eq!(ps.projected_students, 41);
    assert_eq!(ps.reduction_applied, Some(25));
    assert_eq!(ps.reduction_pct, Some(37.9));
    assert!(result.grades.iter().all(|g| g.original_students.is_some()));
}

#[test]
fn test_school_max_not_reached_does_not_constrain() {
    let engine = ProjectionEngine::new();
    let mut input = create_test_input(flat_enrollment(50));
    input.school_max_capacity = Some(1000);

    let result = engine.project_enrollment(&input);
    assert!(!result.was_capacity_constrained);
    assert_eq!(result.total_students, 794);
    assert_eq!(result.capacity_utilization_pct, 79.4);
}

// ==========================================
// 校准比率
// ==========================================

#[test]
fn test_calibrated_rates_replace_legacy_lateral() {
    let engine = ProjectionEngine::new();
    let mut rates = EffectiveRates::new();
    rates.insert(
        GradeCode::Ms,
        EffectiveRate {
            retention_rate: 0.90,
            lateral_rate: 0.10,
        },
    );

    let mut input = create_test_input(flat_enrollment(50));
    input.effective_rates = Some(rates);

    let result = engine.project_enrollment(&input);
    let ms = result.grade(GradeCode::Ms).unwrap();
    assert_eq!(ms.retained_students, 45);
    assert_eq!(ms.lateral_students, 5);

    // 无校准值的年级仍走旧版系数
    let gs = result.grade(GradeCode::Gs).unwrap();
    assert_eq!(gs.lateral_students, 4);
}

// ==========================================
// 多年预测
// ==========================================

#[test]
fn test_multi_year_feeds_previous_output() {
    let engine = ProjectionEngine::new();
    let input = create_test_input(flat_enrollment(50));

    let results = engine.project_multi_year(&input, 3);
    assert_eq!(results.len(), 3);
    assert_eq!(
        results.iter().map(|r| r.fiscal_year).collect::<Vec<_>>(),
        vec![2025, 2026, 2027]
    );

    // 入口招生按起算年复利: 66, 68, 69
    let intakes: Vec<u32> = results
        .iter()
        .map(|r| r.grade(GradeCode::Ps).unwrap().projected_students)
        .collect();
    assert_eq!(intakes, vec![66, 68, 69]);

    // 第二年 MS 保留 = floor(第一年 PS 66 × 0.96) = 63
    let ms_year2 = results[1].grade(GradeCode::Ms).unwrap();
    assert_eq!(ms_year2.retained_students, 63);
}

#[test]
fn test_multi_year_step_equals_manual_chaining() {
    let engine = ProjectionEngine::new();
    let input = create_test_input(flat_enrollment(40));
    let chained = engine.project_multi_year(&input, 2);

    let mut second = input.clone();
    second.base_fiscal_year = 2025;
    second.target_fiscal_year = 2026;
    second.base_enrollment = chained[0].enrollment();
    second.growth_origin_year = Some(2024);

    assert_eq!(engine.project_enrollment(&second), chained[1]);
}

#[test]
fn test_single_year_components_sum() {
    let engine = ProjectionEngine::new();
    let components = engine.project_single_year(&create_test_input(flat_enrollment(50)));

    assert_eq!(components.len(), 15);
    assert!(components.iter().all(|c| c.total == c.retained + c.lateral));
}

#[test]
fn test_zero_base_enrollment_projects_only_entry_and_laterals() {
    let engine = ProjectionEngine::new();
    let result = engine.project_enrollment(&create_test_input(EnrollmentMap::new()));

    assert!(result.grades.iter().all(|g| g.retained_students == 0));
    assert_eq!(result.grade(GradeCode::Cp).unwrap().lateral_students, 8);
}
