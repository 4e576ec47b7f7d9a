// ==========================================
// 招生预测与班额优化系统 - 边界校验器
// ==========================================
// 职责: 在进入引擎前校验外部输入
//   年级代码 / 校准权重 / 情景参数 / 班额规范 / 覆写值 / 历史数据 / 预测年数
// 红线: 引擎假定输入合法,非法输入只能在此处拦截
// ==========================================

use std::collections::{BTreeMap, BTreeSet};

use crate::api::error::{ApiError, ApiResult, ValidationViolation};
use crate::domain::class_size::ClassSizeConfig;
use crate::domain::enrollment::{EnrollmentMap, HistoricalEnrollmentYear};
use crate::domain::grade::GradeCode;
use crate::domain::overrides::OverrideStack;
use crate::domain::scenario::ScenarioParams;

// ==========================================
// 年级代码解析
// ==========================================

/// 解析年级代码（大小写不敏感）
pub fn parse_grade_code(code: &str) -> ApiResult<GradeCode> {
    code.parse::<GradeCode>()
        .map_err(|_| ApiError::UnknownGrade(code.trim().to_string()))
}

/// 解析 年级代码 → 人数 映射
///
/// 同一年级出现多次（如 "cp" 与 "CP"）视为输入错误
pub fn parse_enrollment(raw: &BTreeMap<String, u32>) -> ApiResult<EnrollmentMap> {
    let mut enrollment = EnrollmentMap::new();
    for (code, count) in raw {
        let grade = parse_grade_code(code)?;
        if enrollment.insert(grade, *count).is_some() {
            return Err(ApiError::InvalidInput(format!("年级{}重复出现", grade)));
        }
    }
    Ok(enrollment)
}

// ==========================================
// ViolationCollector - 逐项收集违规
// ==========================================

/// 逐项收集违规,最后统一返回
#[derive(Debug, Default)]
pub struct ViolationCollector {
    violations: Vec<ValidationViolation>,
}

impl ViolationCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: impl Into<String>, reason: impl Into<String>) {
        self.violations.push(ValidationViolation::new(field, reason));
    }

    fn check_unit_interval(&mut self, field: &str, value: f64) {
        if !(0.0..=1.0).contains(&value) {
            self.push(field, format!("取值{}超出[0, 1]", value));
        }
    }

    pub fn check_weights(&mut self, weight_n1: f64, weight_n2: f64) {
        self.check_unit_interval("weight_n1", weight_n1);
        self.check_unit_interval("weight_n2", weight_n2);
    }

    pub fn check_scenario(&mut self, scenario: &ScenarioParams) {
        if scenario.name.trim().is_empty() {
            self.push("scenario.name", "情景名称不能为空");
        }
        if !scenario.entry_growth_rate.is_finite() || scenario.entry_growth_rate <= -1.0 {
            self.push(
                "scenario.entry_growth_rate",
                format!("增长率{}必须大于 -1", scenario.entry_growth_rate),
            );
        }
        self.check_unit_interval("scenario.default_retention", scenario.default_retention);
        self.check_unit_interval("scenario.terminal_retention", scenario.terminal_retention);
        if !scenario.lateral_multiplier.is_finite() || scenario.lateral_multiplier < 0.0 {
            self.push(
                "scenario.lateral_multiplier",
                format!("插班系数{}不能为负", scenario.lateral_multiplier),
            );
        }
    }

    pub fn check_class_size(&mut self, field: &str, config: &ClassSizeConfig) {
        if !config.is_consistent() {
            self.push(
                field,
                format!(
                    "班额规范不自洽: min={} target={} max={} max_divisions={}",
                    config.min_class_size,
                    config.target_class_size,
                    config.max_class_size,
                    config.max_divisions
                ),
            );
        }
    }

    pub fn check_overrides(&mut self, overrides: &OverrideStack) {
        if let Some(global) = overrides.global() {
            if let Some(adjustment) = global.retention_adjustment {
                if !(-1.0..=1.0).contains(&adjustment) {
                    self.push(
                        "overrides.global.retention_adjustment",
                        format!("调整量{}超出[-1, 1]", adjustment),
                    );
                }
            }
            if let Some(multiplier) = global.lateral_multiplier_override {
                if !multiplier.is_finite() || multiplier < 0.0 {
                    self.push(
                        "overrides.global.lateral_multiplier_override",
                        format!("插班系数{}不能为负", multiplier),
                    );
                }
            }
            if global.class_size_override == Some(0) {
                self.push("overrides.global.class_size_override", "班额上限必须大于 0");
            }
        }

        for (cycle, level) in &overrides.levels {
            let field = format!("overrides.levels.{}", cycle);
            if level.class_size_ceiling == Some(0) {
                self.push(format!("{}.class_size_ceiling", field), "班额上限必须大于 0");
            }
            if level.max_divisions == Some(0) {
                self.push(format!("{}.max_divisions", field), "最大班级数必须大于 0");
            }
            let ordered = [level.min_class_size, level.target_class_size, level.class_size_ceiling];
            let present: Vec<u32> = ordered.iter().flatten().copied().collect();
            if present.windows(2).any(|w| w[0] > w[1]) {
                self.push(field, "需满足 min ≤ target ≤ ceiling");
            }
        }

        for (grade, grade_override) in &overrides.grades {
            let field = format!("overrides.grades.{}", grade);
            if let Some(rate) = grade_override.retention_rate {
                self.check_unit_interval(&format!("{}.retention_rate", field), rate);
            }
            if grade_override.class_size_ceiling == Some(0) {
                self.push(format!("{}.class_size_ceiling", field), "班额上限必须大于 0");
            }
            if grade_override.max_divisions == Some(0) {
                self.push(format!("{}.max_divisions", field), "最大班级数必须大于 0");
            }
        }
    }

    pub fn check_history(&mut self, years: &[HistoricalEnrollmentYear]) {
        if years.is_empty() {
            self.push("historical_years", "历史数据不能为空");
            return;
        }
        let mut seen = BTreeSet::new();
        for year in years {
            if !seen.insert(year.fiscal_year) {
                self.push(
                    "historical_years",
                    format!("财年{}重复出现", year.fiscal_year),
                );
            }
        }
    }

    pub fn check_horizon(&mut self, horizon_years: u32) {
        if horizon_years < 1 {
            self.push("horizon_years", "预测年数至少为 1");
        }
    }

    /// 无违规返回 Ok,否则返回带全部违规的 ValidationError
    pub fn finish(self) -> ApiResult<()> {
        if self.violations.is_empty() {
            return Ok(());
        }
        tracing::warn!(count = self.violations.len(), "边界校验未通过");
        Err(ApiError::ValidationError {
            reason: format!("{}项输入不合法", self.violations.len()),
            violations: self.violations,
        })
    }
}
