// ==========================================
// 招生预测与班额优化系统 - 命令行入口
// ==========================================
// 用法: enrollment-planner <request.json> [db_path]
//   request.json: PlanningApiRequest（"-" 表示从 stdin 读取）
//   db_path: 配置库路径（缺省: get_default_db_path）
// 输出: 规划报告 JSON → stdout, 日志 → stderr
// ==========================================

use std::io::Read;
use std::sync::Arc;

use anyhow::{Context, Result};
use enrollment_planner::api::{PlanningApi, PlanningApiRequest};
use enrollment_planner::config::{get_default_db_path, ConfigManager};
use enrollment_planner::logging;

fn main() -> Result<()> {
    logging::init();

    let request_path = std::env::args()
        .nth(1)
        .context("用法: enrollment-planner <request.json> [db_path]")?;
    let db_path = std::env::args().nth(2).unwrap_or_else(get_default_db_path);

    tracing::info!("{} v{}", enrollment_planner::APP_NAME, enrollment_planner::VERSION);
    tracing::info!("使用数据库: {}", db_path);

    let raw = read_request(&request_path)?;
    let request: PlanningApiRequest =
        serde_json::from_str(&raw).with_context(|| format!("规划请求格式错误: {}", request_path))?;

    let config_manager = ConfigManager::new(&db_path)
        .with_context(|| format!("无法打开配置库: {}", db_path))?;
    let api = PlanningApi::new(Arc::new(config_manager));

    tracing::debug!(snapshot = %api.config_snapshot()?, "配置快照");

    let report = api.plan(&request)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

fn read_request(path: &str) -> Result<String> {
    if path == "-" {
        let mut raw = String::new();
        std::io::stdin()
            .read_to_string(&mut raw)
            .context("读取 stdin 失败")?;
        return Ok(raw);
    }
    std::fs::read_to_string(path).with_context(|| format!("读取规划请求失败: {}", path))
}
