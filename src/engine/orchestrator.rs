// ==========================================
// 招生预测与班额优化系统 - 规划编排器
// ==========================================
// 职责: 串联三个引擎
//   历史校准(可选) → 多年预测 → 首个预测年的插班优化 → 汇总
// 红线: 编排器不持有跨调用状态,多年预测逐年顺序执行
// ==========================================

use crate::domain::calibration::CalibrationResult;
use crate::domain::enrollment::{EnrollmentMap, HistoricalEnrollmentYear};
use crate::domain::grade::GradeCode;
use crate::domain::optimization::{GradeOptimizationInput, GradeOptimizationResult, NewStudentsSummary};
use crate::domain::overrides::OverrideStack;
use crate::domain::projection::ProjectionResult;
use crate::domain::scenario::ScenarioParams;
use crate::engine::calibration::CalibrationEngine;
use crate::engine::lateral_optimizer::LateralEntryOptimizer;
use crate::engine::override_resolver::OverrideResolver;
use crate::engine::projection::{ProjectionEngine, ProjectionInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{info, instrument};

// ==========================================
// PlanningRequest - 编排输入（已完成校验与配置解析）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningRequest {
    pub base_fiscal_year: i32,
    pub base_enrollment: EnrollmentMap,
    pub scenario: ScenarioParams,
    pub overrides: OverrideStack,
    /// 历史人数（use_calibration=true 时用于校准）
    pub historical_years: Vec<HistoricalEnrollmentYear>,
    pub use_calibration: bool,
    pub weight_n1: f64,
    pub weight_n2: f64,
    pub horizon_years: u32,
    pub school_max_capacity: Option<u32>,
    /// 各年级外部插班需求（入口年级缺省时取预测招生人数）
    pub lateral_demand: BTreeMap<GradeCode, u32>,
}

// ==========================================
// PlanningReport - 编排输出
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningReport {
    pub scenario: String,
    pub calibration: Option<CalibrationResult>,
    pub projections: Vec<ProjectionResult>,
    pub admissions: Vec<GradeOptimizationResult>,
    pub summary: NewStudentsSummary,
}

// ==========================================
// PlanningOrchestrator - 规划编排器
// ==========================================
pub struct PlanningOrchestrator {
    calibration_engine: CalibrationEngine,
    projection_engine: ProjectionEngine,
    optimizer: LateralEntryOptimizer,
}

impl PlanningOrchestrator {
    pub fn new(optimizer: LateralEntryOptimizer) -> Self {
        Self {
            calibration_engine: CalibrationEngine::new(),
            projection_engine: ProjectionEngine::new(),
            optimizer,
        }
    }

    pub fn calibration_engine(&self) -> &CalibrationEngine {
        &self.calibration_engine
    }

    pub fn projection_engine(&self) -> &ProjectionEngine {
        &self.projection_engine
    }

    pub fn optimizer(&self) -> &LateralEntryOptimizer {
        &self.optimizer
    }

    /// 执行完整规划
    #[instrument(skip(self, request), fields(
        scenario = %request.scenario.name,
        base_fiscal_year = request.base_fiscal_year,
        horizon_years = request.horizon_years
    ))]
    pub fn run(&self, request: &PlanningRequest) -> PlanningReport {
        // 1-2. 历史校准 + 多年预测
        let (calibration, projections) = self.project(request);

        // 3. 首个预测年的插班优化
        let admissions = match projections.first() {
            Some(first_year) => {
                let inputs = self.build_optimization_inputs(request, first_year);
                self.optimizer.optimize_grades(&inputs)
            }
            None => Vec::new(),
        };

        // 4. 汇总
        let summary = self.optimizer.build_new_students_summary(&admissions);

        info!(
            projected_years = projections.len(),
            total_demand = summary.total_demand,
            total_accepted = summary.total_accepted,
            "规划完成"
        );

        PlanningReport {
            scenario: request.scenario.name.clone(),
            calibration,
            projections,
            admissions,
            summary,
        }
    }

    /// 历史校准(可选) + 多年预测
    pub fn project(&self, request: &PlanningRequest) -> (Option<CalibrationResult>, Vec<ProjectionResult>) {
        let calibration = if request.use_calibration {
            Some(self.calibration_engine.calibrate_from_historical(
                &request.historical_years,
                request.weight_n1,
                request.weight_n2,
            ))
        } else {
            None
        };

        let projection_input = ProjectionInput {
            base_fiscal_year: request.base_fiscal_year,
            target_fiscal_year: request.base_fiscal_year + 1,
            base_enrollment: request.base_enrollment.clone(),
            scenario: request.scenario.clone(),
            overrides: request.overrides.clone(),
            effective_rates: calibration.as_ref().map(|c| c.effective_rates()),
            school_max_capacity: request.school_max_capacity,
            growth_origin_year: None,
        };
        let projections = self
            .projection_engine
            .project_multi_year(&projection_input, request.horizon_years);

        (calibration, projections)
    }

    /// 预测结果中的保留人数 + 外部需求 → 优化器输入
    pub fn build_optimization_inputs(
        &self,
        request: &PlanningRequest,
        projection: &ProjectionResult,
    ) -> Vec<GradeOptimizationInput> {
        let resolver = OverrideResolver::new(&request.scenario, &request.overrides, None);

        projection
            .grades
            .iter()
            .map(|grade_projection| {
                let grade = grade_projection.grade_code;
                let demand = match request.lateral_demand.get(&grade) {
                    Some(demand) => *demand,
                    None if grade.is_entry_grade() => grade_projection.projected_students,
                    None => 0,
                };
                GradeOptimizationInput::for_grade(
                    grade,
                    grade_projection.retained_students,
                    demand,
                    resolver.resolve_class_size(grade),
                )
            })
            .collect()
    }
}

impl Default for PlanningOrchestrator {
    fn default() -> Self {
        Self::new(LateralEntryOptimizer::new())
    }
}
