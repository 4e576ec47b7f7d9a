// ==========================================
// 招生预测与班额优化系统 - 舍入工具
// ==========================================
// 规则: 四舍五入（half-up）,先消除浮点噪声再舍入
// ==========================================

/// 浮点噪声消除精度（在目标位数之外再保留的位数）
const NOISE_GUARD_DIGITS: i32 = 6;

/// 四舍五入到指定小数位（half-up）
///
/// 例: 0.36300000000000004 → 0.363（3 位）, 1.16000000000001 → 1.16（4 位）
pub fn round_half_up(value: f64, places: i32) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let factor = 10f64.powi(places);
    let guard = 10f64.powi(NOISE_GUARD_DIGITS);
    let scaled = (value * factor * guard).round() / guard;
    let rounded = if scaled >= 0.0 {
        (scaled + 0.5).floor()
    } else {
        -((-scaled + 0.5).floor())
    };
    rounded / factor
}

/// 向下取整,容忍乘法带来的浮点噪声（50 × 0.96 → 48 而非 47）
pub fn floor_guarded(value: f64) -> f64 {
    (value + 1e-9).floor()
}

/// 百分比（保留 1 位小数）；分母为 0 时返回 0
pub fn percentage(numerator: f64, denominator: f64) -> f64 {
    if denominator <= 0.0 {
        return 0.0;
    }
    round_half_up(numerator / denominator * 100.0, 1)
}
