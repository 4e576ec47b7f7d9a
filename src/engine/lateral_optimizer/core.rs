// ==========================================
// 招生预测与班额优化系统 - 插班优化器
// ==========================================
// 决策顺序（首个命中即返回）:
// 1) 需求为 0                      → ACCEPT_ALL
// 2) 基础班级数为 0                → INSUFFICIENT_DEMAND / NEW_CLASS
// 3) 需求 ≤ 填充至目标班额的名额   → ACCEPT_ALL
// 4) 需求 ≤ 填充至班额上限的名额   → ACCEPT_FILL_MAX
// 5) 已达最大班级数                → RESTRICT_AT_CEILING
// 6) 需求 ≥ 开新班阈值             → NEW_CLASS
// 7) 其他                          → RESTRICT
// ==========================================

use crate::domain::class_size::ClassSizeConfig;
use crate::domain::optimization::{
    GradeOptimizationInput, GradeOptimizationResult, NewStudentsSummary, OptimizationDecision,
};
use crate::engine::lateral_optimizer::summary::build_new_students_summary;
use crate::engine::rounding::{percentage, round_half_up};
use tracing::{debug, instrument, warn};

/// 开新班时每个新班按此人数吸收剩余需求
pub const DEFAULT_NEW_CLASS_CAPACITY: u32 = 30;

// ==========================================
// CapacityAnalysis - 现有班级容量分析
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityAnalysis {
    pub base_classes: u32,        // 仅保留学生所需班级数
    pub fill_to_target: u32,      // 填充至目标班额的剩余名额
    pub fill_to_max: u32,         // 填充至班额上限的剩余名额
    pub new_class_threshold: u32, // 开一个新班所需的最低插班人数
}

/// 分析现有班级容量
pub fn analyze_capacity(retained: u32, config: &ClassSizeConfig) -> CapacityAnalysis {
    let base_classes = if retained == 0 || config.max_class_size == 0 {
        0
    } else {
        retained.div_ceil(config.max_class_size)
    };

    let fill_to_target = (base_classes * config.target_class_size).saturating_sub(retained);
    let fill_to_max = (base_classes * config.max_class_size).saturating_sub(retained);

    let new_class_threshold = if base_classes == 0 {
        // 首个班级组建（如入口年级）
        config.min_class_size
    } else {
        let min_for_next_class = (base_classes + 1) * config.min_class_size;
        if retained >= min_for_next_class {
            fill_to_max + 1
        } else {
            min_for_next_class - retained
        }
    };

    CapacityAnalysis {
        base_classes,
        fill_to_target,
        fill_to_max,
        new_class_threshold,
    }
}

/// 决策中间结果
struct Outcome {
    decision: OptimizationDecision,
    accepted: u32,
    final_classes: u32,
    reason: String,
}

// ==========================================
// LateralEntryOptimizer - 插班优化器
// ==========================================
pub struct LateralEntryOptimizer {
    new_class_capacity: u32,
}

impl LateralEntryOptimizer {
    pub fn new() -> Self {
        Self {
            new_class_capacity: DEFAULT_NEW_CLASS_CAPACITY,
        }
    }

    /// 自定义新班吸收人数（最小为 1）
    pub fn with_new_class_capacity(new_class_capacity: u32) -> Self {
        Self {
            new_class_capacity: new_class_capacity.max(1),
        }
    }

    pub fn new_class_capacity(&self) -> u32 {
        self.new_class_capacity
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 非入口年级插班决策
    #[instrument(skip(self, input), fields(
        grade = %input.grade_code,
        retained = input.retained_students,
        demand = input.historical_demand
    ))]
    pub fn optimize_grade(&self, input: &GradeOptimizationInput) -> GradeOptimizationResult {
        let config = &input.class_size;
        let retained = input.retained_students;
        let demand = input.historical_demand;
        let analysis = analyze_capacity(retained, config);

        let outcome = if demand == 0 {
            Outcome {
                decision: OptimizationDecision::AcceptAll,
                accepted: 0,
                final_classes: analysis.base_classes,
                reason: "NO_DEMAND: 无插班需求,班级不变".to_string(),
            }
        } else if analysis.base_classes == 0 {
            self.form_first_classes(demand, config)
        } else if demand <= analysis.fill_to_target {
            Outcome {
                decision: OptimizationDecision::AcceptAll,
                accepted: demand,
                final_classes: analysis.base_classes,
                reason: format!(
                    "WITHIN_TARGET: demand={} <= fill_to_target={}",
                    demand, analysis.fill_to_target
                ),
            }
        } else if demand <= analysis.fill_to_max {
            Outcome {
                decision: OptimizationDecision::AcceptFillMax,
                accepted: demand,
                final_classes: analysis.base_classes,
                reason: format!(
                    "WITHIN_MAX: fill_to_target={} < demand={} <= fill_to_max={}",
                    analysis.fill_to_target, demand, analysis.fill_to_max
                ),
            }
        } else if analysis.base_classes >= config.max_divisions {
            Outcome {
                decision: OptimizationDecision::RestrictAtCeiling,
                accepted: analysis.fill_to_max,
                final_classes: analysis.base_classes,
                reason: format!(
                    "DIVISION_CEILING: base_classes={} >= max_divisions={}, accept fill_to_max={}",
                    analysis.base_classes, config.max_divisions, analysis.fill_to_max
                ),
            }
        } else if demand >= analysis.new_class_threshold {
            self.open_new_classes(retained, demand, &analysis, config)
        } else {
            Outcome {
                decision: OptimizationDecision::Restrict,
                accepted: analysis.fill_to_max,
                final_classes: analysis.base_classes,
                reason: format!(
                    "BELOW_NEW_CLASS_THRESHOLD: demand={} < threshold={}, accept fill_to_max={}",
                    demand, analysis.new_class_threshold, analysis.fill_to_max
                ),
            }
        };

        self.finish(input, retained, &analysis, outcome)
    }

    /// 入口年级（PS）招生决策：无保留成分
    ///
    /// 班级数 = min(ceil(需求 / 目标班额), 最大班级数),接收人数不超过 班级数 × 班额上限
    #[instrument(skip(self, input), fields(grade = %input.grade_code, demand = input.historical_demand))]
    pub fn optimize_ps_entry(&self, input: &GradeOptimizationInput) -> GradeOptimizationResult {
        let config = &input.class_size;
        let demand = input.historical_demand;

        let classes = if demand == 0 || config.target_class_size == 0 {
            0
        } else {
            demand
                .div_ceil(config.target_class_size)
                .min(config.max_divisions)
        };
        let target_capacity = classes * config.target_class_size;
        let max_capacity = classes * config.max_class_size;
        let accepted = demand.min(max_capacity);

        let (decision, reason) = if demand == 0 {
            (
                OptimizationDecision::AcceptAll,
                "NO_DEMAND: 无入口招生需求".to_string(),
            )
        } else if demand < config.min_class_size {
            (
                OptimizationDecision::InsufficientDemand,
                format!(
                    "BELOW_MIN_CLASS: demand={} < min_class_size={}",
                    demand, config.min_class_size
                ),
            )
        } else if demand <= target_capacity {
            (
                OptimizationDecision::AcceptAll,
                format!("WITHIN_TARGET: demand={} <= {} x {}", demand, classes, config.target_class_size),
            )
        } else if demand > max_capacity {
            (
                OptimizationDecision::RestrictAtCeiling,
                format!(
                    "DIVISION_CEILING: demand={} > max_capacity={} ({} classes)",
                    demand, max_capacity, classes
                ),
            )
        } else {
            (
                OptimizationDecision::AcceptFillMax,
                format!(
                    "WITHIN_MAX: target_capacity={} < demand={} <= max_capacity={}",
                    target_capacity, demand, max_capacity
                ),
            )
        };

        let analysis = CapacityAnalysis {
            base_classes: 0,
            fill_to_target: target_capacity,
            fill_to_max: max_capacity,
            new_class_threshold: config.min_class_size,
        };
        let outcome = Outcome {
            decision,
            accepted,
            final_classes: classes,
            reason,
        };

        self.finish(input, 0, &analysis, outcome)
    }

    /// 批量决策：入口年级走 optimize_ps_entry,其余走 optimize_grade
    pub fn optimize_grades(&self, inputs: &[GradeOptimizationInput]) -> Vec<GradeOptimizationResult> {
        inputs
            .iter()
            .map(|input| {
                if input.grade_code.is_entry_grade() {
                    self.optimize_ps_entry(input)
                } else {
                    self.optimize_grade(input)
                }
            })
            .collect()
    }

    /// 跨年级汇总
    pub fn build_new_students_summary(
        &self,
        results: &[GradeOptimizationResult],
    ) -> NewStudentsSummary {
        build_new_students_summary(results)
    }

    // ==========================================
    // 决策分支
    // ==========================================

    /// 无保留学生时的首批班级组建
    fn form_first_classes(&self, demand: u32, config: &ClassSizeConfig) -> Outcome {
        if demand < config.min_class_size {
            return Outcome {
                decision: OptimizationDecision::InsufficientDemand,
                accepted: demand,
                final_classes: 1,
                reason: format!(
                    "BELOW_MIN_CLASS: demand={} < min_class_size={}, single class kept",
                    demand, config.min_class_size
                ),
            };
        }

        let classes = demand
            .div_ceil(config.min_class_size.max(1))
            .min(config.max_divisions);
        let accepted = demand.min(classes * config.max_class_size);
        Outcome {
            decision: OptimizationDecision::NewClass,
            accepted,
            final_classes: classes,
            reason: format!(
                "FIRST_CLASS_FORMATION: demand={} opens {} classes",
                demand, classes
            ),
        }
    }

    /// 逐个开新班,直到剩余需求被吸收或达到最大班级数
    fn open_new_classes(
        &self,
        retained: u32,
        demand: u32,
        analysis: &CapacityAnalysis,
        config: &ClassSizeConfig,
    ) -> Outcome {
        let mut classes = analysis.base_classes;
        let mut remaining = demand.saturating_sub(analysis.fill_to_max);
        while remaining > 0 && classes < config.max_divisions {
            classes += 1;
            remaining = remaining.saturating_sub(self.new_class_capacity);
        }

        let capacity = classes * config.max_class_size;
        let accepted = demand.min(capacity.saturating_sub(retained));
        debug!(
            base_classes = analysis.base_classes,
            final_classes = classes,
            capacity,
            "开设新班"
        );

        Outcome {
            decision: OptimizationDecision::NewClass,
            accepted,
            final_classes: classes,
            reason: format!(
                "NEW_CLASS: demand={} >= threshold={}, classes {} -> {}",
                demand, analysis.new_class_threshold, analysis.base_classes, classes
            ),
        }
    }

    // ==========================================
    // 派生指标
    // ==========================================

    fn finish(
        &self,
        input: &GradeOptimizationInput,
        retained: u32,
        analysis: &CapacityAnalysis,
        outcome: Outcome,
    ) -> GradeOptimizationResult {
        let demand = input.historical_demand;
        let rejected = demand - outcome.accepted;
        let final_students = retained + outcome.accepted;

        let avg_class_size = if outcome.final_classes > 0 {
            round_half_up(final_students as f64 / outcome.final_classes as f64, 1)
        } else {
            0.0
        };
        let utilization_pct = percentage(
            final_students as f64,
            (outcome.final_classes * input.class_size.target_class_size) as f64,
        );
        let acceptance_rate_pct = if demand == 0 {
            100.0
        } else {
            percentage(outcome.accepted as f64, demand as f64)
        };

        if outcome.decision.is_restrictive() {
            warn!(
                grade = %input.grade_code,
                decision = %outcome.decision,
                rejected,
                "插班需求未能全部接收"
            );
        }

        GradeOptimizationResult {
            grade_code: input.grade_code,
            cycle_code: input.cycle_code,
            is_entry_point: input.is_entry_point,
            retained_students: retained,
            historical_demand: demand,
            base_classes: analysis.base_classes,
            fill_to_target: analysis.fill_to_target,
            fill_to_max: analysis.fill_to_max,
            new_class_threshold: analysis.new_class_threshold,
            decision: outcome.decision,
            decision_reason: outcome.reason,
            accepted: outcome.accepted,
            rejected,
            final_classes: outcome.final_classes,
            final_students,
            avg_class_size,
            utilization_pct,
            acceptance_rate_pct,
        }
    }
}

impl Default for LateralEntryOptimizer {
    fn default() -> Self {
        Self::new()
    }
}
