// ==========================================
// 招生预测与班额优化系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
//   scope_id = global | cycle/<学段代码> | grade/<年级代码>
// ==========================================

use crate::config::engine_config::{EngineConfig, DEFAULT_PROJECTION_HORIZON};
use crate::config::error::{ConfigError, ConfigResult};
use crate::db::{
    configure_sqlite_connection, init_config_schema, open_sqlite_connection, read_schema_version,
    CURRENT_SCHEMA_VERSION,
};
use crate::domain::grade::{Cycle, GradeCode};
use crate::domain::overrides::{GlobalOverrides, GradeOverride, LevelOverride, OverrideStack};
use crate::domain::scenario::ScenarioParams;
use crate::engine::calibration::{DEFAULT_WEIGHT_N1, DEFAULT_WEIGHT_N2};
use crate::engine::lateral_optimizer::DEFAULT_NEW_CLASS_CAPACITY;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// 配置快照: scope_id → (key → value)
pub type ConfigSnapshot = BTreeMap<String, BTreeMap<String, String>>;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径（不存在时自动建库建表）
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_config_schema(&conn)?;

        match read_schema_version(&conn)? {
            Some(version) if version > CURRENT_SCHEMA_VERSION => {
                warn!(
                    db_path,
                    version,
                    expected = CURRENT_SCHEMA_VERSION,
                    "数据库 schema_version 高于当前程序版本"
                );
            }
            _ => {}
        }

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并建表（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = lock_connection(&conn)?;
            configure_sqlite_connection(&guard)?;
            init_config_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn lock(&self) -> ConfigResult<MutexGuard<'_, Connection>> {
        lock_connection(&self.conn)
    }

    // ===== 原始键值读写 =====

    /// 读取指定作用域的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_value(&self, scope: &ConfigScope, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.lock()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![scope.scope_id(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_value(&ConfigScope::Global, key)
    }

    /// 写入配置值（作用域不存在时自动登记）
    pub fn set_value(&self, scope: &ConfigScope, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.lock()?;
        upsert_value(&conn, scope, key, value)?;
        debug!(scope_id = %scope.scope_id(), key, "配置已写入");
        Ok(())
    }

    /// 删除配置值
    ///
    /// # 返回
    /// - true: 已删除
    /// - false: 原本不存在
    pub fn remove_value(&self, scope: &ConfigScope, key: &str) -> ConfigResult<bool> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![scope.scope_id(), key],
        )?;
        Ok(affected > 0)
    }

    fn get_parsed<T>(&self, scope: &ConfigScope, key: &str) -> ConfigResult<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match self.get_value(scope, key)? {
            Some(raw) if raw.trim().is_empty() => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map(Some)
                .map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{} ({})", e, raw),
                }),
            None => Ok(None),
        }
    }

    fn get_json<T: DeserializeOwned>(&self, scope: &ConfigScope, key: &str) -> ConfigResult<Option<T>> {
        match self.get_value(scope, key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, scope: &ConfigScope, key: &str, value: &T) -> ConfigResult<()> {
        let raw = serde_json::to_string(value)?;
        self.set_value(scope, key, &raw)
    }

    // ===== 引擎参数 =====

    /// 读取引擎可调参数（缺省项取默认值）
    pub fn get_engine_config(&self) -> ConfigResult<EngineConfig> {
        let global = ConfigScope::Global;

        let config = EngineConfig {
            weight_n1: self
                .get_parsed(&global, config_keys::CALIBRATION_WEIGHT_N1)?
                .unwrap_or(DEFAULT_WEIGHT_N1),
            weight_n2: self
                .get_parsed(&global, config_keys::CALIBRATION_WEIGHT_N2)?
                .unwrap_or(DEFAULT_WEIGHT_N2),
            new_class_capacity: self
                .get_parsed(&global, config_keys::NEW_CLASS_CAPACITY)?
                .unwrap_or(DEFAULT_NEW_CLASS_CAPACITY),
            school_max_capacity: self.get_parsed(&global, config_keys::SCHOOL_MAX_CAPACITY)?,
            projection_horizon: self
                .get_parsed(&global, config_keys::PROJECTION_HORIZON)?
                .unwrap_or(DEFAULT_PROJECTION_HORIZON),
            default_scenario: self
                .get_value(&global, config_keys::DEFAULT_SCENARIO)?
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| ScenarioParams::BASE.to_string()),
        };

        if config.new_class_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                key: config_keys::NEW_CLASS_CAPACITY.to_string(),
                message: "开新班容量必须大于 0".to_string(),
            });
        }

        Ok(config)
    }

    /// 写回引擎可调参数
    pub fn save_engine_config(&self, config: &EngineConfig) -> ConfigResult<()> {
        let global = ConfigScope::Global;
        self.set_value(&global, config_keys::CALIBRATION_WEIGHT_N1, &config.weight_n1.to_string())?;
        self.set_value(&global, config_keys::CALIBRATION_WEIGHT_N2, &config.weight_n2.to_string())?;
        self.set_value(
            &global,
            config_keys::NEW_CLASS_CAPACITY,
            &config.new_class_capacity.to_string(),
        )?;
        match config.school_max_capacity {
            Some(max) => self.set_value(&global, config_keys::SCHOOL_MAX_CAPACITY, &max.to_string())?,
            None => {
                self.remove_value(&global, config_keys::SCHOOL_MAX_CAPACITY)?;
            }
        }
        self.set_value(
            &global,
            config_keys::PROJECTION_HORIZON,
            &config.projection_horizon.to_string(),
        )?;
        self.set_value(&global, config_keys::DEFAULT_SCENARIO, &config.default_scenario)?;
        Ok(())
    }

    // ===== 预测情景 =====

    /// 读取情景参数
    ///
    /// 优先读取 config_kv: scenario/{name}，不存在时回退内置预设
    pub fn get_scenario(&self, name: &str) -> ConfigResult<ScenarioParams> {
        let normalized = name.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(ConfigError::UnknownScenario(name.to_string()));
        }

        let key = config_keys::scenario_key(&normalized);
        if let Some(stored) = self.get_json::<ScenarioParams>(&ConfigScope::Global, &key)? {
            return Ok(stored);
        }

        ScenarioParams::preset(&normalized).ok_or(ConfigError::UnknownScenario(normalized))
    }

    /// 保存情景参数（同名覆盖）
    pub fn save_scenario(&self, scenario: &ScenarioParams) -> ConfigResult<()> {
        let name = scenario.name.trim().to_lowercase();
        if name.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: config_keys::SCENARIO_PREFIX.to_string(),
                message: "情景名称不能为空".to_string(),
            });
        }
        let mut stored = scenario.clone();
        stored.name = name.clone();
        self.set_json(&ConfigScope::Global, &config_keys::scenario_key(&name), &stored)
    }

    /// 可用情景名称（内置预设 + 已保存的自定义情景，去重排序）
    pub fn list_scenarios(&self) -> ConfigResult<Vec<String>> {
        let mut names: Vec<String> = ScenarioParams::preset_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT key FROM config_kv WHERE scope_id = 'global' AND key LIKE 'scenario/%' ORDER BY key",
        )?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        for row in rows {
            let key = row?;
            if let Some(name) = key.strip_prefix(config_keys::SCENARIO_PREFIX) {
                names.push(name.to_string());
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    // ===== 覆写层 =====

    pub fn set_global_overrides(&self, overrides: &GlobalOverrides) -> ConfigResult<()> {
        self.set_json(&ConfigScope::Global, config_keys::GLOBAL_OVERRIDES, overrides)
    }

    pub fn set_level_override(&self, cycle: Cycle, level: &LevelOverride) -> ConfigResult<()> {
        self.set_json(&ConfigScope::Cycle { cycle }, config_keys::LEVEL_OVERRIDE, level)
    }

    pub fn set_grade_override(&self, grade: GradeCode, grade_override: &GradeOverride) -> ConfigResult<()> {
        self.set_json(&ConfigScope::Grade { grade }, config_keys::GRADE_OVERRIDE, grade_override)
    }

    /// 组装完整覆写栈（global / cycle / grade 三层）
    pub fn get_override_stack(&self) -> ConfigResult<OverrideStack> {
        let global = self.get_json::<GlobalOverrides>(&ConfigScope::Global, config_keys::GLOBAL_OVERRIDES)?;

        let mut levels = BTreeMap::new();
        for cycle in Cycle::ALL {
            if let Some(level) =
                self.get_json::<LevelOverride>(&ConfigScope::Cycle { cycle }, config_keys::LEVEL_OVERRIDE)?
            {
                levels.insert(cycle, level);
            }
        }

        let mut grades = BTreeMap::new();
        for grade in GradeCode::ALL {
            if let Some(grade_override) =
                self.get_json::<GradeOverride>(&ConfigScope::Grade { grade }, config_keys::GRADE_OVERRIDE)?
            {
                grades.insert(grade, grade_override);
            }
        }

        Ok(OverrideStack {
            global,
            levels,
            grades,
        })
    }

    // ===== 快照 =====

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 记录每次规划所用的配置,便于审计与复现
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT scope_id, key, value FROM config_kv ORDER BY scope_id, key")?;

        let mut snapshot: ConfigSnapshot = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        for row in rows {
            let (scope_id, key, value) = row?;
            snapshot.entry(scope_id).or_default().insert(key, value);
        }

        Ok(serde_json::to_string(&snapshot)?)
    }

    /// 从配置快照恢复配置
    ///
    /// # 返回
    /// - Ok(usize): 恢复的配置项数量
    ///
    /// # 注意
    /// - 覆盖同名配置,快照中没有的配置保持不变
    /// - 无法识别的 scope_id 整体跳过
    pub fn restore_config_from_snapshot(&self, snapshot_json: &str) -> ConfigResult<usize> {
        let snapshot: ConfigSnapshot = serde_json::from_str(snapshot_json)?;

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        let mut count = 0;
        for (scope_id, entries) in &snapshot {
            let scope = match ConfigScope::from_scope_id(scope_id) {
                Some(scope) => scope,
                None => {
                    warn!(scope_id = %scope_id, "快照中的作用域无法识别,跳过");
                    continue;
                }
            };
            for (key, value) in entries {
                upsert_value(&tx, &scope, key, value)?;
                count += 1;
            }
        }

        tx.commit()?;
        Ok(count)
    }
}

fn lock_connection(conn: &Arc<Mutex<Connection>>) -> ConfigResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| ConfigError::LockError(e.to_string()))
}

fn upsert_value(conn: &Connection, scope: &ConfigScope, key: &str, value: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key) VALUES (?1, ?2, ?3)",
        params![scope.scope_id(), scope.scope_type(), scope.scope_key()],
    )?;
    conn.execute(
        "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
         ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
        params![scope.scope_id(), key, value],
    )?;
    Ok(())
}

// ==========================================
// ConfigScope - 配置作用域
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigScope {
    Global,                     // 全局
    Cycle { cycle: Cycle },     // 学段
    Grade { grade: GradeCode }, // 年级
}

impl ConfigScope {
    pub fn scope_id(&self) -> String {
        match self {
            ConfigScope::Global => "global".to_string(),
            ConfigScope::Cycle { cycle } => format!("cycle/{}", cycle.code()),
            ConfigScope::Grade { grade } => format!("grade/{}", grade.code()),
        }
    }

    pub fn scope_type(&self) -> &'static str {
        match self {
            ConfigScope::Global => "GLOBAL",
            ConfigScope::Cycle { .. } => "CYCLE",
            ConfigScope::Grade { .. } => "GRADE",
        }
    }

    pub fn scope_key(&self) -> String {
        match self {
            ConfigScope::Global => "global".to_string(),
            ConfigScope::Cycle { cycle } => cycle.code().to_string(),
            ConfigScope::Grade { grade } => grade.code().to_string(),
        }
    }

    pub fn from_scope_id(scope_id: &str) -> Option<Self> {
        if scope_id == "global" {
            return Some(ConfigScope::Global);
        }
        if let Some(code) = scope_id.strip_prefix("cycle/") {
            return code.parse().ok().map(|cycle| ConfigScope::Cycle { cycle });
        }
        if let Some(code) = scope_id.strip_prefix("grade/") {
            return code.parse().ok().map(|grade| ConfigScope::Grade { grade });
        }
        None
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 校准权重
    pub const CALIBRATION_WEIGHT_N1: &str = "calibration_weight_n1";
    pub const CALIBRATION_WEIGHT_N2: &str = "calibration_weight_n2";

    // 插班优化
    pub const NEW_CLASS_CAPACITY: &str = "new_class_capacity";

    // 预测
    pub const SCHOOL_MAX_CAPACITY: &str = "school_max_capacity";
    pub const PROJECTION_HORIZON: &str = "projection_horizon";
    pub const DEFAULT_SCENARIO: &str = "default_scenario";

    // 情景参数 (JSON)
    pub const SCENARIO_PREFIX: &str = "scenario/";

    // 覆写层 (JSON)
    pub const GLOBAL_OVERRIDES: &str = "global_overrides"; // global scope
    pub const LEVEL_OVERRIDE: &str = "level_override"; // cycle scope
    pub const GRADE_OVERRIDE: &str = "grade_override"; // grade scope

    pub fn scenario_key(name: &str) -> String {
        format!("{}{}", SCENARIO_PREFIX, name)
    }
}

/// 获取默认数据库路径
///
/// # 返回
/// - 环境变量 ENROLLMENT_PLANNER_DB_PATH（非空时）
/// - 开发环境: 用户数据目录/enrollment-planner-dev/enrollment_planner.db
/// - 生产环境: 用户数据目录/enrollment-planner/enrollment_planner.db
/// - 拿不到用户数据目录时: ./enrollment_planner.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("ENROLLMENT_PLANNER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./enrollment_planner.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        let dir = data_dir.join("enrollment-planner-dev");

        #[cfg(not(debug_assertions))]
        let dir = data_dir.join("enrollment-planner");

        // 目录创建失败时退回当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("enrollment_planner.db");
        }
    }

    path.to_string_lossy().to_string()
}
