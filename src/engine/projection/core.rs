// ==========================================
// 招生预测与班额优化系统 - 队列推移预测引擎
// ==========================================
// 算法（单个目标年）:
// 1) 入口年级: 招生人数按增长率复利,全部计为插班
// 2) 其余年级: 保留 = floor(前一年级基准人数 × 保留率),插班按覆写链解析
// 3) 单年级容量截断: 超过 最大班级数 × 班额上限 时按比例缩减保留与插班
// 4) 全校容量约束: 汇总超过全校上限时再按比例缩减,并记录 reduction
// ==========================================

use crate::domain::calibration::EffectiveRates;
use crate::domain::class_size::ClassSizeConfig;
use crate::domain::enrollment::{enrollment_of, EnrollmentMap};
use crate::domain::grade::GradeCode;
use crate::domain::overrides::OverrideStack;
use crate::domain::projection::{
    school_year_label, GradeProjection, GradeProjectionComponents, ProjectionResult,
};
use crate::domain::scenario::ScenarioParams;
use crate::engine::override_resolver::OverrideResolver;
use crate::engine::rounding::{floor_guarded, percentage, round_half_up};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

// ==========================================
// ProjectionInput - 预测输入
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionInput {
    /// 基准年（base_enrollment 所属财年）
    pub base_fiscal_year: i32,
    /// 目标年
    pub target_fiscal_year: i32,
    /// 基准年各年级人数
    pub base_enrollment: EnrollmentMap,
    pub scenario: ScenarioParams,
    #[serde(default)]
    pub overrides: OverrideStack,
    /// 校准有效比率（None 时使用情景 + 旧版插班系数）
    #[serde(default)]
    pub effective_rates: Option<EffectiveRates>,
    /// 全校容量上限（None 时不做全校约束）
    #[serde(default)]
    pub school_max_capacity: Option<u32>,
    /// 入口招生增长的起算年（None 时取 base_fiscal_year）
    #[serde(default)]
    pub growth_origin_year: Option<i32>,
}

impl ProjectionInput {
    /// 入口招生复利年数
    pub fn years_elapsed(&self) -> i32 {
        let origin = self.growth_origin_year.unwrap_or(self.base_fiscal_year);
        (self.target_fiscal_year - origin).max(0)
    }
}

// ==========================================
// ProjectionEngine - 预测引擎
// ==========================================
pub struct ProjectionEngine {
    // 无状态引擎,所有状态由调用方通过 ProjectionInput 传入
}

impl ProjectionEngine {
    pub fn new() -> Self {
        Self {}
    }

    // ==========================================
    // 核心方法
    // ==========================================

    /// 单年逐年级推算（步骤 1~3,不含全校约束）
    pub fn project_single_year(&self, input: &ProjectionInput) -> Vec<GradeProjectionComponents> {
        let resolver = OverrideResolver::new(
            &input.scenario,
            &input.overrides,
            input.effective_rates.as_ref(),
        );
        self.compute_components(input, &resolver)
    }

    /// 单年完整预测（含全校容量约束与分班）
    #[instrument(skip(self, input), fields(
        base_fiscal_year = input.base_fiscal_year,
        target_fiscal_year = input.target_fiscal_year,
        scenario = %input.scenario.name,
        calibrated = input.effective_rates.is_some()
    ))]
    pub fn project_enrollment(&self, input: &ProjectionInput) -> ProjectionResult {
        let resolver = OverrideResolver::new(
            &input.scenario,
            &input.overrides,
            input.effective_rates.as_ref(),
        );
        let components = self.compute_components(input, &resolver);
        let summed_total: u32 = components.iter().map(|c| c.total).sum();

        // 4. 全校容量约束
        let constraint = input
            .school_max_capacity
            .filter(|max| summed_total > *max);
        if let Some(max) = constraint {
            warn!(
                summed_total,
                school_max_capacity = max,
                "全校人数超过容量上限,按比例缩减"
            );
        }

        let mut grades = Vec::with_capacity(components.len());
        let mut theoretical_capacity: u64 = 0;
        for before in &components {
            let class_size = resolver.resolve_class_size(before.grade_code);
            theoretical_capacity += class_size.max_capacity() as u64;

            let after = match constraint {
                Some(max) => scale_components(before, max, summed_total),
                None => *before,
            };
            grades.push(build_grade_projection(before, &after, &class_size, constraint.is_some()));
        }

        let total_students: u32 = grades.iter().map(|g| g.projected_students).sum();
        let total_reduction_applied: u32 = grades.iter().filter_map(|g| g.reduction_applied).sum();
        let capacity_reference = match input.school_max_capacity {
            Some(max) => max as f64,
            None => theoretical_capacity as f64,
        };

        info!(
            total_students,
            total_reduction_applied,
            "目标年预测完成"
        );

        ProjectionResult {
            school_year: school_year_label(input.target_fiscal_year),
            fiscal_year: input.target_fiscal_year,
            grades,
            total_students,
            capacity_utilization_pct: percentage(total_students as f64, capacity_reference),
            was_capacity_constrained: constraint.is_some(),
            total_reduction_applied,
        }
    }

    /// 多年预测
    ///
    /// 第 k 年的预测人数即第 k+1 年的基准人数；财年逐年 +1,忽略 input.target_fiscal_year
    #[instrument(skip(self, input), fields(base_fiscal_year = input.base_fiscal_year))]
    pub fn project_multi_year(&self, input: &ProjectionInput, years: u32) -> Vec<ProjectionResult> {
        let origin = input.growth_origin_year.unwrap_or(input.base_fiscal_year);
        let mut carry = input.base_enrollment.clone();
        let mut results = Vec::with_capacity(years as usize);

        for step in 0..years as i32 {
            let base_fiscal_year = input.base_fiscal_year + step;
            let step_input = ProjectionInput {
                base_fiscal_year,
                target_fiscal_year: base_fiscal_year + 1,
                base_enrollment: carry,
                growth_origin_year: Some(origin),
                ..input.clone()
            };

            let result = self.project_enrollment(&step_input);
            carry = result.enrollment();
            results.push(result);
        }

        results
    }

    // ==========================================
    // 内部计算
    // ==========================================

    fn compute_components(
        &self,
        input: &ProjectionInput,
        resolver: &OverrideResolver<'_>,
    ) -> Vec<GradeProjectionComponents> {
        let years_elapsed = input.years_elapsed();

        GradeCode::ALL
            .iter()
            .map(|&grade| {
                // 1) 入口年级 / 2) 队列推移
                let raw = match grade.previous() {
                    None => GradeProjectionComponents::new(
                        grade,
                        0,
                        resolver.resolve_entry_intake(years_elapsed),
                    ),
                    Some(prev) => {
                        let previous_population = enrollment_of(&input.base_enrollment, prev);
                        let retention = resolver.resolve_retention(grade);
                        let retained =
                            floor_guarded(previous_population as f64 * retention) as u32;
                        let (lateral, source) = resolver.resolve_lateral(grade, previous_population);
                        debug!(
                            grade = %grade,
                            previous_population,
                            retention,
                            retained,
                            lateral,
                            lateral_source = ?source,
                            "年级推算"
                        );
                        GradeProjectionComponents::new(grade, retained, lateral)
                    }
                };

                // 3) 单年级容量截断
                let capacity = resolver.resolve_class_size(grade).max_capacity();
                if raw.total > capacity {
                    debug!(
                        grade = %grade,
                        total = raw.total,
                        capacity,
                        "年级人数超过容量,按比例截断"
                    );
                    scale_components(&raw, capacity, raw.total)
                } else {
                    raw
                }
            })
            .collect()
    }
}

impl Default for ProjectionEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 按 numerator/denominator 比例缩减保留与插班（各自向下取整,保持构成比例）
fn scale_components(
    components: &GradeProjectionComponents,
    numerator: u32,
    denominator: u32,
) -> GradeProjectionComponents {
    if denominator == 0 {
        return *components;
    }
    let scale = |value: u32| (value as u64 * numerator as u64 / denominator as u64) as u32;
    GradeProjectionComponents::new(
        components.grade_code,
        scale(components.retained),
        scale(components.lateral),
    )
}

/// 分班数 = ceil(人数 / 班额上限),不超过最大班级数
pub(crate) fn division_count(students: u32, class_size: &ClassSizeConfig) -> u32 {
    if students == 0 || class_size.max_class_size == 0 {
        return 0;
    }
    students
        .div_ceil(class_size.max_class_size)
        .min(class_size.max_divisions)
}

fn build_grade_projection(
    before: &GradeProjectionComponents,
    after: &GradeProjectionComponents,
    class_size: &ClassSizeConfig,
    constrained: bool,
) -> GradeProjection {
    let divisions = division_count(after.total, class_size);
    // 先以全精度相除,仅展示时舍入
    let avg_class_size = if divisions > 0 {
        round_half_up(after.total as f64 / divisions as f64, 1)
    } else {
        0.0
    };

    let (original_students, reduction_applied, reduction_pct) = if constrained {
        let reduction = before.total - after.total;
        (
            Some(before.total),
            Some(reduction),
            Some(percentage(reduction as f64, before.total as f64)),
        )
    } else {
        (None, None, None)
    };

    GradeProjection {
        grade_code: after.grade_code,
        cycle_code: after.grade_code.cycle(),
        retained_students: after.retained,
        lateral_students: after.lateral,
        projected_students: after.total,
        divisions,
        avg_class_size,
        original_students,
        reduction_applied,
        reduction_pct,
    }
}
