// ==========================================
// 招生预测与班额优化系统 - 班额配置
// ==========================================
// 用途: 插班优化器与预测引擎的分班容量约束
// 作用域: 按年级解析,覆写优先级 年级 > 学段 > 全局 > 学段默认
// ==========================================

use serde::{Deserialize, Serialize};

/// 班额配置
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassSizeConfig {
    pub min_class_size: u32,    // 开班最低人数
    pub target_class_size: u32, // 目标班额
    pub max_class_size: u32,    // 班额上限
    pub max_divisions: u32,     // 最大班级数
}

impl ClassSizeConfig {
    pub fn new(
        min_class_size: u32,
        target_class_size: u32,
        max_class_size: u32,
        max_divisions: u32,
    ) -> Self {
        Self {
            min_class_size,
            target_class_size,
            max_class_size,
            max_divisions,
        }
    }

    /// 年级最大容量 = 最大班级数 × 班额上限
    pub fn max_capacity(&self) -> u32 {
        self.max_divisions.saturating_mul(self.max_class_size)
    }

    /// 班额规范是否自洽（min ≤ target ≤ max,且各项为正）
    pub fn is_consistent(&self) -> bool {
        self.min_class_size > 0
            && self.min_class_size <= self.target_class_size
            && self.target_class_size <= self.max_class_size
            && self.max_divisions > 0
    }
}
