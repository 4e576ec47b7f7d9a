// ==========================================
// 招生预测与班额优化系统 - 覆写解析器
// ==========================================
// 规则: 逐参数"首个非空值生效"
//   年级覆写 → 学段覆写 → 全局覆写 → (校准比率) → 情景/学段默认
// 红线: 年级覆写永远优先于校准比率
// ==========================================

use crate::domain::calibration::EffectiveRates;
use crate::domain::class_size::ClassSizeConfig;
use crate::domain::grade::GradeCode;
use crate::domain::overrides::{GlobalOverrides, GradeOverride, LevelOverride, OverrideStack};
use crate::domain::scenario::ScenarioParams;

/// 插班人数来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LateralSource {
    GradeOverride, // 年级固定值
    Calibrated,    // 前一年级人数 × 校准插班率
    Legacy,        // 固定值 × 插班系数
}

// ==========================================
// OverrideResolver - 覆写解析器
// ==========================================
// 借用输入,不持有状态；每次预测调用新建
pub struct OverrideResolver<'a> {
    scenario: &'a ScenarioParams,
    overrides: &'a OverrideStack,
    effective_rates: Option<&'a EffectiveRates>,
}

impl<'a> OverrideResolver<'a> {
    pub fn new(
        scenario: &'a ScenarioParams,
        overrides: &'a OverrideStack,
        effective_rates: Option<&'a EffectiveRates>,
    ) -> Self {
        Self {
            scenario,
            overrides,
            effective_rates,
        }
    }

    fn grade_override(&self, grade: GradeCode) -> Option<&'a GradeOverride> {
        self.overrides.grade(grade)
    }

    fn level_override(&self, grade: GradeCode) -> Option<&'a LevelOverride> {
        self.overrides.level(grade.cycle())
    }

    fn global(&self) -> Option<&'a GlobalOverrides> {
        self.overrides.global()
    }

    // ==========================================
    // 入口招生
    // ==========================================

    /// 入口年级招生人数 = (ps_entry + 全局调整量) × (1 + 增长率)^years_elapsed,四舍五入
    pub fn resolve_entry_intake(&self, years_elapsed: i32) -> u32 {
        let adjustment = self
            .global()
            .and_then(|g| g.ps_entry_adjustment)
            .unwrap_or(0);
        let base = (self.scenario.ps_entry as i64 + adjustment as i64).max(0) as f64;
        let growth = (1.0 + self.scenario.entry_growth_rate).powi(years_elapsed);
        (base * growth).round().max(0.0) as u32
    }

    // ==========================================
    // 保留率
    // ==========================================

    /// 年级保留率（前一年级 → 本年级）
    ///
    /// 基准值: 校准比率 > 情景默认（毕业年级用 terminal_retention）
    /// 全局调整量叠加后截断到 [0, 1]；年级覆写直接生效
    pub fn resolve_retention(&self, grade: GradeCode) -> f64 {
        if let Some(rate) = self.grade_override(grade).and_then(|g| g.retention_rate) {
            return rate.clamp(0.0, 1.0);
        }

        let base = self
            .effective_rates
            .and_then(|rates| rates.get(&grade))
            .map(|r| r.retention_rate)
            .unwrap_or(if grade.is_terminal() {
                self.scenario.terminal_retention
            } else {
                self.scenario.default_retention
            });

        match self.global().and_then(|g| g.retention_adjustment) {
            Some(adjustment) => (base + adjustment).clamp(0.0, 1.0),
            None => base,
        }
    }

    // ==========================================
    // 插班人数
    // ==========================================

    /// 插班人数
    ///
    /// 年级固定值 > 校准插班率 × 前一年级人数 > 旧版固定值 × 插班系数
    pub fn resolve_lateral(&self, grade: GradeCode, previous_population: u32) -> (u32, LateralSource) {
        if let Some(fixed) = self.grade_override(grade).and_then(|g| g.lateral_entry) {
            return (fixed, LateralSource::GradeOverride);
        }

        if let Some(rate) = self
            .effective_rates
            .and_then(|rates| rates.get(&grade))
            .map(|r| r.lateral_rate)
        {
            let lateral = (previous_population as f64 * rate).round().max(0.0) as u32;
            return (lateral, LateralSource::Calibrated);
        }

        let multiplier = self
            .global()
            .and_then(|g| g.lateral_multiplier_override)
            .unwrap_or(self.scenario.lateral_multiplier);
        let lateral = (grade.legacy_lateral_entry() as f64 * multiplier)
            .round()
            .max(0.0) as u32;
        (lateral, LateralSource::Legacy)
    }

    // ==========================================
    // 班额
    // ==========================================

    /// 年级班额配置（同一覆写优先级）
    pub fn resolve_class_size(&self, grade: GradeCode) -> ClassSizeConfig {
        let defaults = grade.cycle().default_class_size();
        let grade_ov = self.grade_override(grade);
        let level_ov = self.level_override(grade);
        let global = self.global();

        let max_class_size = grade_ov
            .and_then(|g| g.class_size_ceiling)
            .or_else(|| level_ov.and_then(|l| l.class_size_ceiling))
            .or_else(|| global.and_then(|g| g.class_size_override))
            .unwrap_or(defaults.max_class_size);

        let max_divisions = grade_ov
            .and_then(|g| g.max_divisions)
            .or_else(|| level_ov.and_then(|l| l.max_divisions))
            .unwrap_or(defaults.max_divisions);

        // 班额上限被下调时,min/target 不得超过上限
        let target_class_size = level_ov
            .and_then(|l| l.target_class_size)
            .unwrap_or(defaults.target_class_size)
            .min(max_class_size);
        let min_class_size = level_ov
            .and_then(|l| l.min_class_size)
            .unwrap_or(defaults.min_class_size)
            .min(target_class_size);

        ClassSizeConfig {
            min_class_size,
            target_class_size,
            max_class_size,
            max_divisions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::calibration::EffectiveRate;
    use crate::domain::grade::Cycle;

    fn stack_with_all_layers() -> OverrideStack {
        let mut stack = OverrideStack {
            global: Some(GlobalOverrides {
                ps_entry_adjustment: Some(5),
                retention_adjustment: Some(0.02),
                lateral_multiplier_override: Some(2.0),
                class_size_override: Some(26),
            }),
            ..Default::default()
        };
        stack.levels.insert(
            Cycle::College,
            LevelOverride {
                class_size_ceiling: Some(29),
                max_divisions: Some(4),
                ..Default::default()
            },
        );
        stack.grades.insert(
            GradeCode::Sixieme,
            GradeOverride {
                retention_rate: Some(0.99),
                lateral_entry: Some(15),
                max_divisions: None,
                class_size_ceiling: Some(31),
            },
        );
        stack
    }

    #[test]
    fn test_class_size_precedence() {
        let scenario = ScenarioParams::default();
        let stack = stack_with_all_layers();
        let resolver = OverrideResolver::new(&scenario, &stack, None);

        // 年级覆写
        let sixieme = resolver.resolve_class_size(GradeCode::Sixieme);
        assert_eq!(sixieme.max_class_size, 31);
        assert_eq!(sixieme.max_divisions, 4); // 学段覆写

        // 学段覆写
        let cinquieme = resolver.resolve_class_size(GradeCode::Cinquieme);
        assert_eq!(cinquieme.max_class_size, 29);

        // 全局覆写
        let cp = resolver.resolve_class_size(GradeCode::Cp);
        assert_eq!(cp.max_class_size, 26);
        assert_eq!(cp.target_class_size, 25);
        assert_eq!(cp.max_divisions, 6);
    }

    #[test]
    fn test_retention_adjustment_is_clamped() {
        let scenario = ScenarioParams {
            default_retention: 0.99,
            ..Default::default()
        };
        let stack = stack_with_all_layers();
        let resolver = OverrideResolver::new(&scenario, &stack, None);

        assert_eq!(resolver.resolve_retention(GradeCode::Cp), 1.0);
        assert_eq!(resolver.resolve_retention(GradeCode::Sixieme), 0.99);
    }

    #[test]
    fn test_grade_override_beats_calibrated_rates() {
        let scenario = ScenarioParams::default();
        let stack = stack_with_all_layers();
        let mut rates = EffectiveRates::new();
        rates.insert(
            GradeCode::Sixieme,
            EffectiveRate {
                retention_rate: 0.90,
                lateral_rate: 0.5,
            },
        );
        rates.insert(
            GradeCode::Cinquieme,
            EffectiveRate {
                retention_rate: 0.90,
                lateral_rate: 0.1,
            },
        );
        let resolver = OverrideResolver::new(&scenario, &stack, Some(&rates));

        assert_eq!(
            resolver.resolve_lateral(GradeCode::Sixieme, 100),
            (15, LateralSource::GradeOverride)
        );
        assert_eq!(
            resolver.resolve_lateral(GradeCode::Cinquieme, 100),
            (10, LateralSource::Calibrated)
        );
        // 校准保留率 + 全局调整量
        assert!((resolver.resolve_retention(GradeCode::Cinquieme) - 0.92).abs() < 1e-9);
    }

    #[test]
    fn test_legacy_lateral_uses_multiplier_override() {
        let scenario = ScenarioParams::default();
        let stack = stack_with_all_layers();
        let resolver = OverrideResolver::new(&scenario, &stack, None);

        // CP 固定 8 人 × 2.0
        assert_eq!(
            resolver.resolve_lateral(GradeCode::Cp, 60),
            (16, LateralSource::Legacy)
        );
    }

    #[test]
    fn test_terminal_grade_uses_terminal_retention() {
        let scenario = ScenarioParams::default();
        let stack = OverrideStack::default();
        let resolver = OverrideResolver::new(&scenario, &stack, None);

        assert_eq!(resolver.resolve_retention(GradeCode::Terminale), 0.93);
        assert_eq!(resolver.resolve_retention(GradeCode::Premiere), 0.96);
    }

    #[test]
    fn test_entry_intake_compounds_growth() {
        let scenario = ScenarioParams {
            ps_entry: 60,
            entry_growth_rate: 0.05,
            ..Default::default()
        };
        let stack = stack_with_all_layers();
        let resolver = OverrideResolver::new(&scenario, &stack, None);

        // (60 + 5) × 1.05^2 = 71.66 → 72
        assert_eq!(resolver.resolve_entry_intake(2), 72);
    }
}
