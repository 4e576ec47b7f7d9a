use super::*;
use crate::domain::class_size::ClassSizeConfig;
use crate::domain::grade::GradeCode;
use crate::domain::optimization::{GradeOptimizationInput, OptimizationDecision};

// ==========================================
// 测试辅助函数
// ==========================================

fn primary_config() -> ClassSizeConfig {
    ClassSizeConfig::new(21, 25, 28, 6)
}

fn create_test_input(
    grade: GradeCode,
    retained: u32,
    demand: u32,
    config: ClassSizeConfig,
) -> GradeOptimizationInput {
    GradeOptimizationInput::for_grade(grade, retained, demand, config)
}

// ==========================================
// 容量分析
// ==========================================

#[test]
fn test_analyze_capacity_reference_case() {
    let analysis = analyze_capacity(95, &primary_config());
    assert_eq!(analysis.base_classes, 4);
    assert_eq!(analysis.fill_to_target, 5);
    assert_eq!(analysis.fill_to_max, 17);
    assert_eq!(analysis.new_class_threshold, 10);
}

#[test]
fn test_analyze_capacity_threshold_when_retained_covers_next_class() {
    // 5 × 21 = 105 ≤ 110 → 阈值 = fill_to_max + 1
    let analysis = analyze_capacity(110, &primary_config());
    assert_eq!(analysis.base_classes, 4);
    assert_eq!(analysis.fill_to_max, 2);
    assert_eq!(analysis.new_class_threshold, 3);
}

#[test]
fn test_analyze_capacity_no_retained() {
    let analysis = analyze_capacity(0, &primary_config());
    assert_eq!(analysis.base_classes, 0);
    assert_eq!(analysis.fill_to_target, 0);
    assert_eq!(analysis.fill_to_max, 0);
    assert_eq!(analysis.new_class_threshold, 21);
}

// ==========================================
// 决策分支
// ==========================================

#[test]
fn test_new_class_reference_case() {
    let optimizer = LateralEntryOptimizer::new();
    let result = optimizer.optimize_grade(&create_test_input(GradeCode::Ce2, 95, 40, primary_config()));

    assert_eq!(result.decision, OptimizationDecision::NewClass);
    assert_eq!(result.accepted, 40);
    assert_eq!(result.rejected, 0);
    assert_eq!(result.final_students, 135);
    assert_eq!(result.final_classes, 5);
    assert_eq!(result.avg_class_size, 27.0);
    assert_eq!(result.utilization_pct, 108.0);
    assert_eq!(result.acceptance_rate_pct, 100.0);
    assert!(result.decision_reason.starts_with("NEW_CLASS"));
}

#[test]
fn test_zero_demand_accepts_all_without_change() {
    let optimizer = LateralEntryOptimizer::new();
    let result = optimizer.optimize_grade(&create_test_input(GradeCode::Cm1, 95, 0, primary_config()));

    assert_eq!(result.decision, OptimizationDecision::AcceptAll);
    assert_eq!(result.accepted, 0);
    assert_eq!(result.rejected, 0);
    assert_eq!(result.final_classes, result.base_classes);
    assert_eq!(result.acceptance_rate_pct, 100.0);
}

#[test]
fn test_accept_all_within_target() {
    let optimizer = LateralEntryOptimizer::new();
    let result = optimizer.optimize_grade(&create_test_input(GradeCode::Cm1, 95, 5, primary_config()));

    assert_eq!(result.decision, OptimizationDecision::AcceptAll);
    assert_eq!(result.final_students, 100);
    assert_eq!(result.final_classes, 4);
}

#[test]
fn test_accept_fill_max() {
    let optimizer = LateralEntryOptimizer::new();
    let result = optimizer.optimize_grade(&create_test_input(GradeCode::Cm1, 95, 12, primary_config()));

    assert_eq!(result.decision, OptimizationDecision::AcceptFillMax);
    assert_eq!(result.accepted, 12);
    assert_eq!(result.final_students, 107);
    assert_eq!(result.final_classes, 4);
}

#[test]
fn test_restrict_at_ceiling() {
    let optimizer = LateralEntryOptimizer::new();
    let result = optimizer.optimize_grade(&create_test_input(GradeCode::Cm2, 160, 20, primary_config()));

    assert_eq!(result.base_classes, 6);
    assert_eq!(result.decision, OptimizationDecision::RestrictAtCeiling);
    assert_eq!(result.accepted, 8);
    assert_eq!(result.rejected, 12);
    assert_eq!(result.final_students, 168);
    assert_eq!(result.avg_class_size, 28.0);
    assert_eq!(result.acceptance_rate_pct, 40.0);
}

#[test]
fn test_restrict_below_new_class_threshold() {
    let optimizer = LateralEntryOptimizer::new();
    let config = ClassSizeConfig::new(25, 27, 28, 6);
    let result = optimizer.optimize_grade(&create_test_input(GradeCode::Quatrieme, 50, 10, config));

    assert_eq!(result.new_class_threshold, 25);
    assert_eq!(result.decision, OptimizationDecision::Restrict);
    assert_eq!(result.accepted, 6);
    assert_eq!(result.rejected, 4);
    assert_eq!(result.final_classes, 2);
}

#[test]
fn test_insufficient_demand_without_retained() {
    let optimizer = LateralEntryOptimizer::new();
    let result = optimizer.optimize_grade(&create_test_input(GradeCode::Seconde, 0, 15, primary_config()));

    assert_eq!(result.decision, OptimizationDecision::InsufficientDemand);
    assert_eq!(result.accepted, 15);
    assert_eq!(result.final_classes, 1);
    assert_eq!(result.avg_class_size, 15.0);
}

#[test]
fn test_first_class_formation_without_retained() {
    let optimizer = LateralEntryOptimizer::new();
    let result = optimizer.optimize_grade(&create_test_input(GradeCode::Seconde, 0, 50, primary_config()));

    assert_eq!(result.decision, OptimizationDecision::NewClass);
    assert_eq!(result.final_classes, 3);
    assert_eq!(result.accepted, 50);
}

#[test]
fn test_new_class_capped_by_max_divisions() {
    let optimizer = LateralEntryOptimizer::new();
    let config = ClassSizeConfig::new(21, 25, 28, 5);
    let result = optimizer.optimize_grade(&create_test_input(GradeCode::Ce1, 95, 100, config));

    assert_eq!(result.decision, OptimizationDecision::NewClass);
    assert_eq!(result.final_classes, 5);
    assert_eq!(result.accepted, 45);
    assert_eq!(result.rejected, 55);
    assert_eq!(result.final_students, 140);
}

#[test]
fn test_configurable_new_class_capacity() {
    let optimizer = LateralEntryOptimizer::with_new_class_capacity(10);
    assert_eq!(optimizer.new_class_capacity(), 10);

    let result = optimizer.optimize_grade(&create_test_input(GradeCode::Ce2, 95, 40, primary_config()));
    assert_eq!(result.decision, OptimizationDecision::NewClass);
    assert_eq!(result.final_classes, 6);
    assert_eq!(result.accepted, 40);
    assert_eq!(result.avg_class_size, 22.5);
}

// ==========================================
// 入口年级
// ==========================================

#[test]
fn test_ps_entry_outcomes() {
    let optimizer = LateralEntryOptimizer::new();
    let config = ClassSizeConfig::new(18, 24, 28, 6);

    let within = optimizer.optimize_ps_entry(&create_test_input(GradeCode::Ps, 0, 70, config));
    assert_eq!(within.decision, OptimizationDecision::AcceptAll);
    assert_eq!(within.final_classes, 3);
    assert_eq!(within.accepted, 70);

    let small = optimizer.optimize_ps_entry(&create_test_input(GradeCode::Ps, 0, 10, config));
    assert_eq!(small.decision, OptimizationDecision::InsufficientDemand);
    assert_eq!(small.final_classes, 1);

    let fill = optimizer.optimize_ps_entry(&create_test_input(GradeCode::Ps, 0, 160, config));
    assert_eq!(fill.decision, OptimizationDecision::AcceptFillMax);
    assert_eq!(fill.final_classes, 6);
    assert_eq!(fill.accepted, 160);

    let over = optimizer.optimize_ps_entry(&create_test_input(GradeCode::Ps, 0, 200, config));
    assert_eq!(over.decision, OptimizationDecision::RestrictAtCeiling);
    assert_eq!(over.accepted, 168);
    assert_eq!(over.rejected, 32);

    let none = optimizer.optimize_ps_entry(&create_test_input(GradeCode::Ps, 0, 0, config));
    assert_eq!(none.decision, OptimizationDecision::AcceptAll);
    assert_eq!(none.final_classes, 0);
    assert_eq!(none.acceptance_rate_pct, 100.0);
}

#[test]
fn test_optimize_grades_dispatches_entry_grade() {
    let optimizer = LateralEntryOptimizer::new();
    let inputs = vec![
        create_test_input(GradeCode::Ps, 0, 70, ClassSizeConfig::new(18, 24, 28, 6)),
        create_test_input(GradeCode::Ms, 0, 70, ClassSizeConfig::new(18, 24, 28, 6)),
    ];

    let results = optimizer.optimize_grades(&inputs);
    // PS 按目标班额分班, MS 按最低开班人数分班
    assert_eq!(results[0].final_classes, 3);
    assert_eq!(results[1].final_classes, 4);
}

// ==========================================
// 汇总
// ==========================================

#[test]
fn test_summary_totals_and_buckets() {
    let optimizer = LateralEntryOptimizer::new();
    let results = optimizer.optimize_grades(&[
        create_test_input(GradeCode::Cp, 95, 40, primary_config()),   // NEW_CLASS
        create_test_input(GradeCode::Ce1, 95, 5, primary_config()),   // ACCEPT_ALL
        create_test_input(GradeCode::Ce2, 95, 12, primary_config()),  // ACCEPT_FILL_MAX
        create_test_input(GradeCode::Cm2, 160, 20, primary_config()), // RESTRICT_AT_CEILING
    ]);

    let summary = optimizer.build_new_students_summary(&results);
    assert_eq!(summary.total_demand, 77);
    assert_eq!(summary.total_accepted, 65);
    assert_eq!(summary.total_rejected, 12);
    assert_eq!(summary.total_available_slots, 17 + 17 + 17 + 8);
    assert_eq!(summary.entry_point_demand, 40);
    assert_eq!(summary.incidental_demand, 37);
    assert_eq!(summary.overall_acceptance_rate_pct, 84.4);
    assert_eq!(summary.grades_new_class, vec![GradeCode::Cp]);
    assert_eq!(summary.grades_accept_all, vec![GradeCode::Ce1]);
    assert_eq!(summary.grades_fill_max, vec![GradeCode::Ce2]);
    assert_eq!(summary.grades_restricted, vec![GradeCode::Cm2]);
    assert!(summary.grades_insufficient_demand.is_empty());
}

#[test]
fn test_summary_of_empty_results() {
    let summary = build_new_students_summary(&[]);
    assert_eq!(summary.total_demand, 0);
    assert_eq!(summary.overall_acceptance_rate_pct, 100.0);
}
