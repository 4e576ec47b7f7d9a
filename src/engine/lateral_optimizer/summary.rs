use crate::domain::optimization::{GradeOptimizationResult, NewStudentsSummary, OptimizationDecision};
use crate::engine::rounding::percentage;

/// 汇总各年级插班决策（纯归约,不含决策逻辑）
pub fn build_new_students_summary(results: &[GradeOptimizationResult]) -> NewStudentsSummary {
    let mut summary = NewStudentsSummary::default();

    for result in results {
        summary.total_demand += result.historical_demand;
        summary.total_available_slots += result.fill_to_max;
        summary.total_accepted += result.accepted;
        summary.total_rejected += result.rejected;

        if result.is_entry_point {
            summary.entry_point_demand += result.historical_demand;
        } else {
            summary.incidental_demand += result.historical_demand;
        }

        let bucket = match result.decision {
            OptimizationDecision::AcceptAll => &mut summary.grades_accept_all,
            OptimizationDecision::AcceptFillMax => &mut summary.grades_fill_max,
            OptimizationDecision::Restrict | OptimizationDecision::RestrictAtCeiling => {
                &mut summary.grades_restricted
            }
            OptimizationDecision::NewClass => &mut summary.grades_new_class,
            OptimizationDecision::InsufficientDemand => &mut summary.grades_insufficient_demand,
        };
        bucket.push(result.grade_code);
    }

    summary.overall_acceptance_rate_pct = if summary.total_demand == 0 {
        100.0
    } else {
        percentage(summary.total_accepted as f64, summary.total_demand as f64)
    };

    summary
}
