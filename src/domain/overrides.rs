// ==========================================
// 招生预测与班额优化系统 - 覆写层
// ==========================================
// 四层覆写: 情景默认 → 全局 → 学段 → 年级 (后者优先)
// 红线: 年级覆写永远优先于校准比率
// ==========================================

use crate::domain::grade::{Cycle, GradeCode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// 全局覆写（全校范围的调整量）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlobalOverrides {
    /// 入口招生人数调整量（叠加到情景 ps_entry）
    #[serde(default)]
    pub ps_entry_adjustment: Option<i32>,

    /// 保留率调整量（叠加后截断到 [0, 1]）
    #[serde(default)]
    pub retention_adjustment: Option<f64>,

    /// 插班系数覆写（替代情景 lateral_multiplier）
    #[serde(default)]
    pub lateral_multiplier_override: Option<f64>,

    /// 班额上限覆写
    #[serde(default)]
    pub class_size_override: Option<u32>,
}

/// 学段覆写
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelOverride {
    #[serde(default)]
    pub class_size_ceiling: Option<u32>,
    #[serde(default)]
    pub max_divisions: Option<u32>,
    #[serde(default)]
    pub min_class_size: Option<u32>,
    #[serde(default)]
    pub target_class_size: Option<u32>,
}

/// 年级覆写
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeOverride {
    /// 保留率（绝对值）
    #[serde(default)]
    pub retention_rate: Option<f64>,

    /// 固定插班人数（优先于校准比率与旧版系数）
    #[serde(default)]
    pub lateral_entry: Option<u32>,

    #[serde(default)]
    pub max_divisions: Option<u32>,

    #[serde(default)]
    pub class_size_ceiling: Option<u32>,
}

// ==========================================
// OverrideStack - 覆写栈
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OverrideStack {
    #[serde(default)]
    pub global: Option<GlobalOverrides>,
    #[serde(default)]
    pub levels: BTreeMap<Cycle, LevelOverride>,
    #[serde(default)]
    pub grades: BTreeMap<GradeCode, GradeOverride>,
}

impl OverrideStack {
    pub fn global(&self) -> Option<&GlobalOverrides> {
        self.global.as_ref()
    }

    pub fn level(&self, cycle: Cycle) -> Option<&LevelOverride> {
        self.levels.get(&cycle)
    }

    pub fn grade(&self, grade: GradeCode) -> Option<&GradeOverride> {
        self.grades.get(&grade)
    }

    pub fn is_empty(&self) -> bool {
        self.global.is_none() && self.levels.is_empty() && self.grades.is_empty()
    }
}
