// ==========================================
// 招生预测与班额优化系统 - 年级体系
// ==========================================
// 职责: 15 个年级代码的固定顺序、所属学段、学段默认保留率
// 红线: 进程启动后只读,引擎不得修改年级体系
// ==========================================

use crate::domain::class_size::ClassSizeConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 学段 (Cycle)
// ==========================================
// 顺序: 幼儿园 < 小学 < 初中 < 高中
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cycle {
    Maternelle,  // 幼儿园 (preschool)
    Elementaire, // 小学 (primary)
    College,     // 初中 (middle)
    Lycee,       // 高中 (high)
}

impl Cycle {
    pub const ALL: [Cycle; 4] = [
        Cycle::Maternelle,
        Cycle::Elementaire,
        Cycle::College,
        Cycle::Lycee,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Cycle::Maternelle => "MATERNELLE",
            Cycle::Elementaire => "ELEMENTAIRE",
            Cycle::College => "COLLEGE",
            Cycle::Lycee => "LYCEE",
        }
    }

    /// 学段默认保留率（未校准时的基准值）
    pub fn default_retention(&self) -> f64 {
        match self {
            Cycle::Maternelle => 0.96,
            Cycle::Elementaire => 0.96,
            Cycle::College => 0.97,
            Cycle::Lycee => 0.93,
        }
    }

    /// 学段默认班额规范
    ///
    /// 作为 ClassSizeConfig 覆写链的最底层
    pub fn default_class_size(&self) -> ClassSizeConfig {
        match self {
            Cycle::Maternelle => ClassSizeConfig::new(18, 24, 28, 6),
            Cycle::Elementaire => ClassSizeConfig::new(21, 25, 28, 6),
            Cycle::College => ClassSizeConfig::new(22, 28, 30, 6),
            Cycle::Lycee => ClassSizeConfig::new(24, 32, 35, 6),
        }
    }

    /// 本学段包含的年级（按体系顺序）
    pub fn grades(&self) -> Vec<GradeCode> {
        GradeCode::ALL
            .iter()
            .copied()
            .filter(|g| g.cycle() == *self)
            .collect()
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Cycle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "MATERNELLE" | "PRESCHOOL" => Ok(Cycle::Maternelle),
            "ELEMENTAIRE" | "PRIMARY" => Ok(Cycle::Elementaire),
            "COLLEGE" | "MIDDLE" => Ok(Cycle::College),
            "LYCEE" | "HIGH" => Ok(Cycle::Lycee),
            other => Err(format!("未知学段: {}", other)),
        }
    }
}

// ==========================================
// 年级代码 (Grade Code)
// ==========================================
// 声明顺序即体系顺序,Ord 派生依赖此顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GradeCode {
    #[serde(rename = "PS")]
    Ps,
    #[serde(rename = "MS")]
    Ms,
    #[serde(rename = "GS")]
    Gs,
    #[serde(rename = "CP")]
    Cp,
    #[serde(rename = "CE1")]
    Ce1,
    #[serde(rename = "CE2")]
    Ce2,
    #[serde(rename = "CM1")]
    Cm1,
    #[serde(rename = "CM2")]
    Cm2,
    #[serde(rename = "6EME")]
    Sixieme,
    #[serde(rename = "5EME")]
    Cinquieme,
    #[serde(rename = "4EME")]
    Quatrieme,
    #[serde(rename = "3EME")]
    Troisieme,
    #[serde(rename = "2NDE")]
    Seconde,
    #[serde(rename = "1ERE")]
    Premiere,
    #[serde(rename = "TERM")]
    Terminale,
}

impl GradeCode {
    /// 完整年级序列（入口年级在前,毕业年级在后）
    pub const ALL: [GradeCode; 15] = [
        GradeCode::Ps,
        GradeCode::Ms,
        GradeCode::Gs,
        GradeCode::Cp,
        GradeCode::Ce1,
        GradeCode::Ce2,
        GradeCode::Cm1,
        GradeCode::Cm2,
        GradeCode::Sixieme,
        GradeCode::Cinquieme,
        GradeCode::Quatrieme,
        GradeCode::Troisieme,
        GradeCode::Seconde,
        GradeCode::Premiere,
        GradeCode::Terminale,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            GradeCode::Ps => "PS",
            GradeCode::Ms => "MS",
            GradeCode::Gs => "GS",
            GradeCode::Cp => "CP",
            GradeCode::Ce1 => "CE1",
            GradeCode::Ce2 => "CE2",
            GradeCode::Cm1 => "CM1",
            GradeCode::Cm2 => "CM2",
            GradeCode::Sixieme => "6EME",
            GradeCode::Cinquieme => "5EME",
            GradeCode::Quatrieme => "4EME",
            GradeCode::Troisieme => "3EME",
            GradeCode::Seconde => "2NDE",
            GradeCode::Premiere => "1ERE",
            GradeCode::Terminale => "TERM",
        }
    }

    pub fn cycle(&self) -> Cycle {
        match self {
            GradeCode::Ps | GradeCode::Ms | GradeCode::Gs => Cycle::Maternelle,
            GradeCode::Cp | GradeCode::Ce1 | GradeCode::Ce2 | GradeCode::Cm1 | GradeCode::Cm2 => {
                Cycle::Elementaire
            }
            GradeCode::Sixieme
            | GradeCode::Cinquieme
            | GradeCode::Quatrieme
            | GradeCode::Troisieme => Cycle::College,
            GradeCode::Seconde | GradeCode::Premiere | GradeCode::Terminale => Cycle::Lycee,
        }
    }

    /// 在年级序列中的位置（0 起）
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// 前一年级（入口年级没有前驱）
    pub fn previous(&self) -> Option<GradeCode> {
        self.index()
            .checked_sub(1)
            .map(|i| GradeCode::ALL[i])
    }

    pub fn next(&self) -> Option<GradeCode> {
        GradeCode::ALL.get(self.index() + 1).copied()
    }

    /// 入口年级（PS）：全部人数均为新生,没有保留成分
    pub fn is_entry_grade(&self) -> bool {
        self.index() == 0
    }

    /// 毕业年级（TERM）：学生离开体系而不是升级
    pub fn is_terminal(&self) -> bool {
        self.index() == GradeCode::ALL.len() - 1
    }

    /// 插班入口点：各学段起始年级
    pub fn is_entry_point(&self) -> bool {
        matches!(
            self,
            GradeCode::Ps | GradeCode::Cp | GradeCode::Sixieme | GradeCode::Seconde
        )
    }

    /// 旧版固定插班人数（乘以情景插班系数后使用）
    pub fn legacy_lateral_entry(&self) -> u32 {
        match self {
            GradeCode::Ps => 0,
            GradeCode::Ms => 6,
            GradeCode::Gs => 4,
            GradeCode::Cp => 8,
            GradeCode::Ce1 => 3,
            GradeCode::Ce2 => 3,
            GradeCode::Cm1 => 2,
            GradeCode::Cm2 => 2,
            GradeCode::Sixieme => 10,
            GradeCode::Cinquieme => 3,
            GradeCode::Quatrieme => 2,
            GradeCode::Troisieme => 1,
            GradeCode::Seconde => 12,
            GradeCode::Premiere => 2,
            GradeCode::Terminale => 0,
        }
    }

    /// 文档化的静态校准默认值 (retention, lateral_rate)
    ///
    /// 未登记的年级返回 None,由调用方回退到学段默认保留率 + 零插班率
    pub fn documented_default_rates(&self) -> Option<(f64, f64)> {
        match self {
            GradeCode::Ms => Some((0.96, 0.08)),
            GradeCode::Gs => Some((0.96, 0.05)),
            GradeCode::Cp => Some((0.96, 0.10)),
            GradeCode::Ce1 => Some((0.96, 0.03)),
            GradeCode::Ce2 => Some((0.96, 0.03)),
            GradeCode::Cm1 => Some((0.96, 0.02)),
            GradeCode::Cm2 => Some((0.96, 0.02)),
            GradeCode::Sixieme => Some((0.97, 0.12)),
            GradeCode::Cinquieme => Some((0.97, 0.03)),
            GradeCode::Seconde => Some((0.93, 0.15)),
            _ => None,
        }
    }
}

impl fmt::Display for GradeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for GradeCode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();
        GradeCode::ALL
            .iter()
            .copied()
            .find(|g| g.code() == normalized)
            .ok_or_else(|| format!("未知年级代码: {}", s.trim()))
    }
}

// ==========================================
// GradeTaxonomy - 年级体系只读视图
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct GradeTaxonomy;

impl GradeTaxonomy {
    pub fn grades(&self) -> &'static [GradeCode] {
        &GradeCode::ALL
    }

    pub fn entry_grade(&self) -> GradeCode {
        GradeCode::ALL[0]
    }

    pub fn terminal_grade(&self) -> GradeCode {
        GradeCode::ALL[GradeCode::ALL.len() - 1]
    }

    /// 除入口年级外的全部年级（可校准年级）
    pub fn progression_grades(&self) -> impl Iterator<Item = GradeCode> {
        GradeCode::ALL.iter().copied().skip(1)
    }
}
