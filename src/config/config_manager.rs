// ==========================================
// 快递运价引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 作用域: global < franchise/{id}
// ==========================================

use crate::config::pricing_config_trait::PricingConfigReader;
use crate::db::open_sqlite_connection;
use crate::repository::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigScope - 配置作用域
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigScope {
    Global,                         // 全局
    Franchise { franchise_id: i64 }, // 加盟商
}

impl ConfigScope {
    /// config_scope.scope_id
    pub fn scope_id(&self) -> String {
        match self {
            ConfigScope::Global => "global".to_string(),
            ConfigScope::Franchise { franchise_id } => format!("franchise/{}", franchise_id),
        }
    }

    fn scope_type(&self) -> &'static str {
        match self {
            ConfigScope::Global => "GLOBAL",
            ConfigScope::Franchise { .. } => "FRANCHISE",
        }
    }

    fn scope_key(&self) -> String {
        match self {
            ConfigScope::Global => "global".to_string(),
            ConfigScope::Franchise { franchise_id } => franchise_id.to_string(),
        }
    }
}

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
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取单个作用域的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 该作用域未配置
    pub fn get_value(&self, scope: &ConfigScope, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![scope.scope_id(), key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 读取加盟商生效值：franchise/{id} 优先，其次 global
    pub fn get_effective_value(&self, franchise_id: i64, key: &str) -> RepositoryResult<Option<String>> {
        if let Some(value) = self.get_value(&ConfigScope::Franchise { franchise_id }, key)? {
            return Ok(Some(value));
        }
        self.get_value(&ConfigScope::Global, key)
    }

    /// 写入配置值（作用域不存在时自动创建）
    pub fn set_value(&self, scope: &ConfigScope, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key) VALUES (?1, ?2, ?3)",
            params![scope.scope_id(), scope.scope_type(), scope.scope_key()],
        )?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![scope.scope_id(), key, value],
        )?;
        Ok(())
    }

    /// 删除配置值，返回是否存在
    pub fn remove_value(&self, scope: &ConfigScope, key: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![scope.scope_id(), key],
        )?;
        Ok(affected > 0)
    }

    /// 某作用域全部配置（按 key 排序）
    pub fn get_scope_snapshot(&self, scope: &ConfigScope) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![scope.scope_id()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }
}

// ==========================================
// PricingConfigReader 实现
// ==========================================
#[async_trait]
impl PricingConfigReader for ConfigManager {
    async fn get_bulk_replace_error_cap(&self, franchise_id: i64) -> RepositoryResult<usize> {
        let raw = self.get_effective_value(franchise_id, config_keys::BULK_REPLACE_ERROR_CAP)?;
        let Some(raw) = raw else {
            return Ok(config_keys::DEFAULT_BULK_REPLACE_ERROR_CAP);
        };

        match raw.trim().parse::<usize>() {
            Ok(cap) if cap >= 1 => Ok(cap),
            _ => {
                warn!(
                    config_key = config_keys::BULK_REPLACE_ERROR_CAP,
                    value = %raw,
                    "配置值无效，使用默认值"
                );
                Ok(config_keys::DEFAULT_BULK_REPLACE_ERROR_CAP)
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 批量替换
    pub const BULK_REPLACE_ERROR_CAP: &str = "bulk_replace_error_cap";
    pub const DEFAULT_BULK_REPLACE_ERROR_CAP: usize = 10;
}
