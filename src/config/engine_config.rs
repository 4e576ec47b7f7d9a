// ==========================================
// 招生预测与班额优化系统 - 引擎可调参数
// ==========================================
// 职责: 汇总 config_kv 中与引擎相关的数值参数
// ==========================================

use crate::engine::calibration::{DEFAULT_WEIGHT_N1, DEFAULT_WEIGHT_N2};
use crate::engine::lateral_optimizer::DEFAULT_NEW_CLASS_CAPACITY;
use crate::engine::LateralEntryOptimizer;
use crate::domain::scenario::ScenarioParams;
use serde::{Deserialize, Serialize};

/// 默认预测年数
pub const DEFAULT_PROJECTION_HORIZON: u32 = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// N-1 权重
    pub weight_n1: f64,
    /// N-2 权重
    pub weight_n2: f64,
    /// 开新班时每班的宽松容量
    pub new_class_capacity: u32,
    /// 全校容量上限（None 表示不约束）
    pub school_max_capacity: Option<u32>,
    pub projection_horizon: u32,
    pub default_scenario: String,
}

impl EngineConfig {
    pub fn build_optimizer(&self) -> LateralEntryOptimizer {
        LateralEntryOptimizer::with_new_class_capacity(self.new_class_capacity)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weight_n1: DEFAULT_WEIGHT_N1,
            weight_n2: DEFAULT_WEIGHT_N2,
            new_class_capacity: DEFAULT_NEW_CLASS_CAPACITY,
            school_max_capacity: None,
            projection_horizon: DEFAULT_PROJECTION_HORIZON,
            default_scenario: ScenarioParams::BASE.to_string(),
        }
    }
}
