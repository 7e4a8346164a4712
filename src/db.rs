// ==========================================
// 快递运价引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，减少并发整表替换时的偶发 busy 错误
// - 提供幂等建表（运价引擎只依赖这几张表）
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 2;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 幂等建表
///
/// 金额/重量统一以 TEXT 存储十进制字符串，读回时无损解析为 Decimal。
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS rate_record (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            franchise_id INTEGER NOT NULL,
            origin_pincode TEXT NOT NULL,
            destination_pincode TEXT NOT NULL,
            service_type TEXT NOT NULL,
            weight_from TEXT NOT NULL,
            weight_to TEXT,
            rate_per_kg TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        -- 同一线路/服务/重量区间只允许一条（精确-精确重复行没有定义的优先级）
        CREATE UNIQUE INDEX IF NOT EXISTS uq_rate_record_route
            ON rate_record(franchise_id, origin_pincode, destination_pincode,
                           service_type, weight_from, IFNULL(weight_to, ''));

        CREATE INDEX IF NOT EXISTS idx_rate_record_franchise_service
            ON rate_record(franchise_id, service_type);

        CREATE TABLE IF NOT EXISTS company_profile (
            franchise_id INTEGER NOT NULL,
            company_id INTEGER NOT NULL,
            company_name TEXT NOT NULL DEFAULT '',
            fuel_surcharge_percent TEXT NOT NULL DEFAULT '0',
            royalty_charges_percent TEXT NOT NULL DEFAULT '0',
            cod_charge TEXT NOT NULL DEFAULT '0',
            insurance_percent TEXT NOT NULL DEFAULT '0',
            minimum_risk_surcharge TEXT NOT NULL DEFAULT '0',
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (franchise_id, company_id)
        );

        CREATE TABLE IF NOT EXISTS slab_tariff (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            franchise_id INTEGER NOT NULL,
            company_id INTEGER NOT NULL,
            courier_type TEXT NOT NULL,
            row_name TEXT NOT NULL,
            sub_type TEXT,
            slab_type TEXT NOT NULL,
            rate_1 TEXT,
            rate_2 TEXT,
            rate_3 TEXT,
            rate_4 TEXT,
            rate_keys TEXT,
            created_at TEXT NOT NULL
        );

        CREATE UNIQUE INDEX IF NOT EXISTS uq_slab_tariff_key
            ON slab_tariff(franchise_id, company_id, courier_type, row_name, IFNULL(sub_type, ''));

        CREATE INDEX IF NOT EXISTS idx_slab_tariff_company
            ON slab_tariff(franchise_id, company_id);
        "#,
    )?;

    // v1 → v2: 阶梯运价记录写入时的档位 key 原文
    if !has_column(conn, "slab_tariff", "rate_keys")? {
        conn.execute_batch("ALTER TABLE slab_tariff ADD COLUMN rate_keys TEXT;")?;
    }

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

fn has_column(conn: &Connection, table: &str, column: &str) -> rusqlite::Result<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", table))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names.iter().any(|name| name == column))
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}
