// ==========================================
// 招生预测与班额优化系统 - 预测情景参数
// ==========================================
// 用途: 覆写链最底层（情景默认值）
// 预设: conservative / base / optimistic
// ==========================================

use serde::{Deserialize, Serialize};

/// 预测情景参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioParams {
    /// 情景名称（conservative / base / optimistic / 自定义）
    pub name: String,

    /// 入口年级（PS）基准招生人数
    pub ps_entry: u32,

    /// 入口招生年增长率（可为负）
    pub entry_growth_rate: f64,

    /// 默认保留率
    pub default_retention: f64,

    /// 毕业年级保留率（TERM,学生随后离开体系）
    pub terminal_retention: f64,

    /// 旧版插班系数（乘以年级固定插班人数）
    pub lateral_multiplier: f64,
}

impl ScenarioParams {
    pub const CONSERVATIVE: &'static str = "conservative";
    pub const BASE: &'static str = "base";
    pub const OPTIMISTIC: &'static str = "optimistic";

    /// 内置预设情景
    ///
    /// 未知名称返回 None（名称合法性由配置层/API 层校验）
    pub fn preset(name: &str) -> Option<Self> {
        let normalized = name.trim().to_lowercase();
        let (ps_entry, entry_growth_rate, default_retention, terminal_retention, lateral_multiplier) =
            match normalized.as_str() {
                Self::CONSERVATIVE => (55, 0.0, 0.95, 0.90, 0.8),
                Self::BASE => (65, 0.02, 0.96, 0.93, 1.0),
                Self::OPTIMISTIC => (75, 0.04, 0.97, 0.95, 1.2),
                _ => return None,
            };

        Some(Self {
            name: normalized,
            ps_entry,
            entry_growth_rate,
            default_retention,
            terminal_retention,
            lateral_multiplier,
        })
    }

    pub fn preset_names() -> [&'static str; 3] {
        [Self::CONSERVATIVE, Self::BASE, Self::OPTIMISTIC]
    }
}

impl Default for ScenarioParams {
    fn default() -> Self {
        Self {
            name: Self::BASE.to_string(),
            ps_entry: 65,
            entry_growth_rate: 0.02,
            default_retention: 0.96,
            terminal_retention: 0.93,
            lateral_multiplier: 1.0,
        }
    }
}
