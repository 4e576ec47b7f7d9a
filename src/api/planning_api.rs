// ==========================================
// 招生预测与班额优化系统 - 规划 API
// ==========================================
// 职责: 外部请求 → 校验 → 合并配置 → 调用引擎
// 输入: 年级代码为字符串,情景可按名称引用或内联给出
// 输出: 校准结果 / 预测结果 / 插班决策 / 完整规划报告
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::api::error::{ApiError, ApiResult};
use crate::api::validator::{parse_enrollment, parse_grade_code, ViolationCollector};
use crate::config::config_manager::ConfigManager;
use crate::config::engine_config::EngineConfig;
use crate::domain::calibration::CalibrationResult;
use crate::domain::class_size::ClassSizeConfig;
use crate::domain::enrollment::HistoricalEnrollmentYear;
use crate::domain::optimization::{GradeOptimizationInput, GradeOptimizationResult, NewStudentsSummary};
use crate::domain::overrides::OverrideStack;
use crate::domain::projection::ProjectionResult;
use crate::domain::scenario::ScenarioParams;
use crate::engine::orchestrator::{PlanningOrchestrator, PlanningReport, PlanningRequest};
use crate::engine::override_resolver::OverrideResolver;

// ==========================================
// 请求 / 响应 DTO
// ==========================================

/// 单个财年的历史人数（年级代码为字符串）
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoricalYearInput {
    pub fiscal_year: i32,
    #[serde(default)]
    pub grades: BTreeMap<String, u32>,
}

/// 规划请求
///
/// 缺省字段取 config_kv 中的配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanningApiRequest {
    /// 基准财年（缺省: 最近的历史财年,再缺省: 当前年份）
    pub base_fiscal_year: Option<i32>,
    /// 基准年人数（缺省: 历史数据中基准财年的人数）
    pub base_enrollment: BTreeMap<String, u32>,
    pub historical_years: Vec<HistoricalYearInput>,
    /// 情景名称（缺省: default_scenario 配置）
    pub scenario: Option<String>,
    /// 内联情景参数（优先于 scenario 名称）
    pub scenario_params: Option<ScenarioParams>,
    /// 覆写栈（缺省: 已保存的覆写）
    pub overrides: Option<OverrideStack>,
    /// 是否校准（缺省: 历史数据至少两年时校准）
    pub use_calibration: Option<bool>,
    pub weight_n1: Option<f64>,
    pub weight_n2: Option<f64>,
    pub horizon_years: Option<u32>,
    pub school_max_capacity: Option<u32>,
    /// 各年级插班需求
    pub lateral_demand: BTreeMap<String, u32>,
}

/// 单个年级的插班优化请求
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationItem {
    pub grade_code: String,
    pub retained_students: u32,
    pub demand: u32,
    /// 班额规范（缺省: 按覆写链解析）
    #[serde(default)]
    pub class_size: Option<ClassSizeConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResponse {
    pub results: Vec<GradeOptimizationResult>,
    pub summary: NewStudentsSummary,
}

// ==========================================
// PlanningApi - 规划 API
// ==========================================
pub struct PlanningApi {
    config_manager: Arc<ConfigManager>,
}

impl PlanningApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    fn orchestrator(&self, engine_config: &EngineConfig) -> PlanningOrchestrator {
        PlanningOrchestrator::new(engine_config.build_optimizer())
    }

    /// 历史校准
    ///
    /// 权重取 config_kv 配置
    #[instrument(skip(self, history), fields(years = history.len()))]
    pub fn calibrate(&self, history: &[HistoricalYearInput]) -> ApiResult<CalibrationResult> {
        let engine_config = self.config_manager.get_engine_config()?;
        let years = parse_history(history)?;

        let mut collector = ViolationCollector::new();
        collector.check_weights(engine_config.weight_n1, engine_config.weight_n2);
        collector.check_history(&years);
        collector.finish()?;

        Ok(self
            .orchestrator(&engine_config)
            .calibration_engine()
            .calibrate_from_historical(&years, engine_config.weight_n1, engine_config.weight_n2))
    }

    /// 多年预测（含可选校准）
    #[instrument(skip(self, request))]
    pub fn project(&self, request: &PlanningApiRequest) -> ApiResult<Vec<ProjectionResult>> {
        let engine_config = self.config_manager.get_engine_config()?;
        let planning_request = self.build_planning_request(request, &engine_config)?;
        let (_, projections) = self.orchestrator(&engine_config).project(&planning_request);
        Ok(projections)
    }

    /// 按年级插班优化
    #[instrument(skip(self, items), fields(grades = items.len()))]
    pub fn optimize(&self, items: &[OptimizationItem]) -> ApiResult<OptimizationResponse> {
        let engine_config = self.config_manager.get_engine_config()?;
        let scenario = self.config_manager.get_scenario(&engine_config.default_scenario)?;
        let overrides = self.config_manager.get_override_stack()?;
        let resolver = OverrideResolver::new(&scenario, &overrides, None);

        let mut collector = ViolationCollector::new();
        let mut inputs = Vec::with_capacity(items.len());
        for item in items {
            let grade = parse_grade_code(&item.grade_code)?;
            let class_size = item
                .class_size
                .unwrap_or_else(|| resolver.resolve_class_size(grade));
            collector.check_class_size(&format!("{}.class_size", grade), &class_size);
            inputs.push(GradeOptimizationInput::for_grade(
                grade,
                item.retained_students,
                item.demand,
                class_size,
            ));
        }
        collector.finish()?;

        let optimizer = engine_config.build_optimizer();
        let results = optimizer.optimize_grades(&inputs);
        let summary = optimizer.build_new_students_summary(&results);
        Ok(OptimizationResponse { results, summary })
    }

    /// 完整规划: 校准 → 预测 → 插班优化 → 汇总
    #[instrument(skip(self, request))]
    pub fn plan(&self, request: &PlanningApiRequest) -> ApiResult<PlanningReport> {
        let engine_config = self.config_manager.get_engine_config()?;
        let planning_request = self.build_planning_request(request, &engine_config)?;

        info!(
            scenario = %planning_request.scenario.name,
            base_fiscal_year = planning_request.base_fiscal_year,
            use_calibration = planning_request.use_calibration,
            "开始规划"
        );

        Ok(self.orchestrator(&engine_config).run(&planning_request))
    }

    /// 当前配置快照（JSON）
    pub fn config_snapshot(&self) -> ApiResult<String> {
        Ok(self.config_manager.get_config_snapshot()?)
    }

    /// 外部请求 + 配置 → 编排输入
    pub fn build_planning_request(
        &self,
        request: &PlanningApiRequest,
        engine_config: &EngineConfig,
    ) -> ApiResult<PlanningRequest> {
        let historical_years = parse_history(&request.historical_years)?;

        let scenario = match &request.scenario_params {
            Some(params) => params.clone(),
            None => {
                let name = request
                    .scenario
                    .as_deref()
                    .unwrap_or(engine_config.default_scenario.as_str());
                self.config_manager.get_scenario(name)?
            }
        };

        let overrides = match &request.overrides {
            Some(overrides) => overrides.clone(),
            None => self.config_manager.get_override_stack()?,
        };

        let base_fiscal_year = request
            .base_fiscal_year
            .or_else(|| historical_years.iter().map(|y| y.fiscal_year).max())
            .unwrap_or_else(|| chrono::Local::now().year());

        let base_enrollment = if request.base_enrollment.is_empty() {
            historical_years
                .iter()
                .find(|y| y.fiscal_year == base_fiscal_year)
                .map(|y| y.grades.clone())
                .ok_or_else(|| {
                    ApiError::InvalidInput(format!("缺少基准财年{}的在籍人数", base_fiscal_year))
                })?
        } else {
            parse_enrollment(&request.base_enrollment)?
        };

        let use_calibration = request
            .use_calibration
            .unwrap_or(historical_years.len() >= 2);
        let weight_n1 = request.weight_n1.unwrap_or(engine_config.weight_n1);
        let weight_n2 = request.weight_n2.unwrap_or(engine_config.weight_n2);
        let horizon_years = request
            .horizon_years
            .unwrap_or(engine_config.projection_horizon);

        let mut collector = ViolationCollector::new();
        collector.check_weights(weight_n1, weight_n2);
        collector.check_scenario(&scenario);
        collector.check_overrides(&overrides);
        collector.check_horizon(horizon_years);
        if use_calibration {
            collector.check_history(&historical_years);
        }
        if request.school_max_capacity == Some(0) {
            collector.push("school_max_capacity", "全校容量上限必须大于 0");
        }
        collector.finish()?;

        let lateral_demand = parse_enrollment(&request.lateral_demand)?;

        debug!(
            base_fiscal_year,
            grades = base_enrollment.len(),
            history = historical_years.len(),
            "规划请求已解析"
        );

        Ok(PlanningRequest {
            base_fiscal_year,
            base_enrollment,
            scenario,
            overrides,
            historical_years,
            use_calibration,
            weight_n1,
            weight_n2,
            horizon_years,
            school_max_capacity: request.school_max_capacity.or(engine_config.school_max_capacity),
            lateral_demand,
        })
    }
}

fn parse_history(history: &[HistoricalYearInput]) -> ApiResult<Vec<HistoricalEnrollmentYear>> {
    history
        .iter()
        .map(|year| {
            Ok(HistoricalEnrollmentYear::new(
                year.fiscal_year,
                parse_enrollment(&year.grades)?,
            ))
        })
        .collect()
}
