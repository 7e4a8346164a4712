// ==========================================
// 快递运价引擎 - 阶梯运价数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（行校验在 engine::tariff_validation）
// 写入: 只提供“按公司整表替换”，单事务内 先删后插
// ==========================================

use crate::domain::slab_tariff::{NewSlabTariff, SlabRates, SlabTariff};
use crate::repository::codec::{decimal_to_db, optional_decimal_from_db};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row, TransactionBehavior};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    id, franchise_id, company_id, courier_type, row_name, sub_type, slab_type,
    rate_1, rate_2, rate_3, rate_4, created_at, rate_keys
"#;

/// 整表替换结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// 事务内删除的旧行数（回滚时旧行实际保留）
    pub deleted: usize,
    /// 插入行数
    pub inserted: usize,
    /// 是否提交；inserted == 0 时整体回滚
    pub committed: bool,
}

// ==========================================
// SlabTariffRepository - 阶梯运价仓储
// ==========================================
pub struct SlabTariffRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SlabTariffRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 行映射：rate_1..rate_4 中非空的值按档位顺序组成 SlabRates
    fn map_row(row: &Row<'_>) -> SqliteResult<SlabTariff> {
        let mut values = Vec::with_capacity(4);
        for idx in 7..=10 {
            if let Some(v) = optional_decimal_from_db(idx, row.get(idx)?)? {
                values.push(v);
            }
        }

        let created_raw: String = row.get(11)?;
        let created_at = DateTime::parse_from_rfc3339(&created_raw)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(11, Type::Text, Box::new(e)))?;

        let rate_keys = match row.get::<_, Option<String>>(12)? {
            Some(raw) if !raw.trim().is_empty() => serde_json::from_str::<Vec<String>>(&raw)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(12, Type::Text, Box::new(e)))?,
            _ => Vec::new(),
        };

        Ok(SlabTariff {
            id: row.get(0)?,
            franchise_id: row.get(1)?,
            company_id: row.get(2)?,
            courier_type: row.get(3)?,
            row_name: row.get(4)?,
            sub_type: row.get(5)?,
            declared_slab_type: row.get(6)?,
            rates: SlabRates::from_values(&values),
            rate_keys,
            created_at,
        })
    }

    /// 按查询键取阶梯运价
    ///
    /// # 参数
    /// - sub_type: Some 时精确匹配；None 时匹配任意子类型（取 id 最小的一行）
    pub fn find_by_lookup(
        &self,
        franchise_id: i64,
        company_id: i64,
        courier_type: &str,
        row_name: &str,
        sub_type: Option<&str>,
    ) -> RepositoryResult<Option<SlabTariff>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM slab_tariff
            WHERE franchise_id = ?1
              AND company_id = ?2
              AND courier_type = ?3
              AND row_name = ?4
              AND (?5 IS NULL OR sub_type = ?5)
            ORDER BY id ASC
            LIMIT 1
            "#
        );
        let tariff = conn
            .query_row(
                &sql,
                params![franchise_id, company_id, courier_type, row_name, sub_type],
                Self::map_row,
            )
            .optional()?;
        Ok(tariff)
    }

    /// 查询公司的全部阶梯运价
    pub fn list_by_company(&self, franchise_id: i64, company_id: i64) -> RepositoryResult<Vec<SlabTariff>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM slab_tariff
            WHERE franchise_id = ?1 AND company_id = ?2
            ORDER BY id ASC
            "#
        );
        let mut stmt = conn.prepare(&sql)?;
        let tariffs = stmt
            .query_map(params![franchise_id, company_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(tariffs)
    }

    /// 公司当前阶梯运价行数
    pub fn count_by_company(&self, franchise_id: i64, company_id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM slab_tariff WHERE franchise_id = ?1 AND company_id = ?2",
            params![franchise_id, company_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// 按公司整表替换（单事务）
    ///
    /// # 流程
    /// 1. BEGIN IMMEDIATE（立即取写锁，同库并发写入排队）
    /// 2. 删除该公司全部旧行
    /// 3. 逐行插入
    /// 4. 插入行数为 0 → ROLLBACK（连同第 2 步的删除），否则 COMMIT
    ///
    /// 任一 SQL 失败时事务随 drop 回滚，错误原样上抛
    pub fn replace_for_company(
        &self,
        franchise_id: i64,
        company_id: i64,
        rows: &[NewSlabTariff],
    ) -> RepositoryResult<ReplaceOutcome> {
        let mut conn = self.get_conn()?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let deleted = tx.execute(
            "DELETE FROM slab_tariff WHERE franchise_id = ?1 AND company_id = ?2",
            params![franchise_id, company_id],
        )?;

        let created_at = Utc::now().to_rfc3339();
        let mut inserted = 0usize;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO slab_tariff (
                    franchise_id, company_id, courier_type, row_name, sub_type, slab_type,
                    rate_1, rate_2, rate_3, rate_4, rate_keys, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
                "#,
            )?;

            for row in rows {
                let values = row.rates.values();
                let rate_at = |i: usize| values.get(i).copied().map(decimal_to_db);
                let rate_keys = serde_json::to_string(&row.rate_keys)
                    .map_err(|e| RepositoryError::DatabaseQueryError(e.to_string()))?;
                stmt.execute(params![
                    franchise_id,
                    company_id,
                    row.courier_type,
                    row.row_name,
                    row.sub_type,
                    row.slab_type.as_str(),
                    rate_at(0),
                    rate_at(1),
                    rate_at(2),
                    rate_at(3),
                    rate_keys,
                    created_at,
                ])?;
                inserted += 1;
            }
        }

        if inserted == 0 {
            tx.rollback()
                .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
            return Ok(ReplaceOutcome {
                deleted,
                inserted,
                committed: false,
            });
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(ReplaceOutcome {
            deleted,
            inserted,
            committed: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::SlabType;
    use rust_decimal_macros::dec;

    fn setup_test_repo() -> (SlabTariffRepository, Arc<Mutex<Connection>>) {
        let conn = Connection::open_in_memory().expect("Failed to open memory db");
        crate::db::ensure_schema(&conn).expect("Failed to create schema");
        let conn = Arc::new(Mutex::new(conn));
        (SlabTariffRepository::from_connection(conn.clone()), conn)
    }

    fn row(row_name: &str, sub_type: Option<&str>) -> NewSlabTariff {
        NewSlabTariff {
            courier_type: "Express".to_string(),
            row_name: row_name.to_string(),
            sub_type: sub_type.map(str::to_string),
            slab_type: SlabType::Slab3,
            rates: SlabRates::Three {
                r1: dec!(100),
                r2: dec!(150),
                r3: dec!(60),
            },
            rate_keys: vec!["1".to_string(), "2".to_string(), "3".to_string()],
        }
    }

    #[test]
    fn test_replace_then_lookup() {
        let (repo, _) = setup_test_repo();
        let outcome = repo
            .replace_for_company(1, 5, &[row("Metro", None), row("Zonal", Some("Docs"))])
            .unwrap();
        assert_eq!(outcome.inserted, 2);
        assert!(outcome.committed);

        let found = repo
            .find_by_lookup(1, 5, "Express", "Zonal", Some("Docs"))
            .unwrap()
            .expect("tariff not found");
        assert_eq!(found.rates.values(), vec![dec!(100), dec!(150), dec!(60)]);
        assert_eq!(found.declared_slab_type, "Slab 3");
        assert_eq!(found.rate_keys, vec!["1", "2", "3"]);

        // 未指定子类型时匹配任意子类型
        assert!(repo.find_by_lookup(1, 5, "Express", "Zonal", None).unwrap().is_some());
        assert!(repo.find_by_lookup(1, 5, "Express", "Zonal", Some("Parcel")).unwrap().is_none());
    }

    #[test]
    fn test_empty_replace_rolls_back_delete() {
        let (repo, _) = setup_test_repo();
        repo.replace_for_company(1, 5, &[row("Metro", None)]).unwrap();

        let outcome = repo.replace_for_company(1, 5, &[]).unwrap();
        assert_eq!(outcome.deleted, 1);
        assert!(!outcome.committed);
        assert_eq!(repo.count_by_company(1, 5).unwrap(), 1);
    }

    #[test]
    fn test_replace_only_touches_one_company() {
        let (repo, _) = setup_test_repo();
        repo.replace_for_company(1, 5, &[row("Metro", None)]).unwrap();
        repo.replace_for_company(1, 6, &[row("Metro", None)]).unwrap();

        repo.replace_for_company(1, 5, &[row("Zonal", None), row("Regional", None)])
            .unwrap();

        assert_eq!(repo.count_by_company(1, 5).unwrap(), 2);
        assert_eq!(repo.count_by_company(1, 6).unwrap(), 1);
    }

    #[test]
    fn test_failed_insert_rolls_back_everything() {
        let (repo, _) = setup_test_repo();
        repo.replace_for_company(1, 5, &[row("Metro", None)]).unwrap();

        // 同一批次内重复唯一键 → UNIQUE 失败 → 整体回滚
        let err = repo
            .replace_for_company(1, 5, &[row("Zonal", None), row("Zonal", None)])
            .unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));

        let remaining = repo.list_by_company(1, 5).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].row_name, "Metro");
    }

    #[test]
    fn test_legacy_row_with_irregular_rates_is_readable() {
        let (repo, conn) = setup_test_repo();
        {
            let conn = conn.lock().unwrap();
            conn.execute(
                r#"
                INSERT INTO slab_tariff (franchise_id, company_id, courier_type, row_name, sub_type,
                                         slab_type, rate_1, created_at)
                VALUES (1, 5, 'Express', 'Legacy', NULL, 'Slab 2', '75', '2024-01-01T00:00:00+00:00')
                "#,
                [],
            )
            .unwrap();
        }

        let found = repo
            .find_by_lookup(1, 5, "Express", "Legacy", None)
            .unwrap()
            .unwrap();
        assert_eq!(found.rates, SlabRates::Irregular(vec![dec!(75)]));
        assert_eq!(found.declared_slab_type, "Slab 2");
        assert_eq!(found.rates.slab_type(), None);
        assert!(found.rate_keys.is_empty());
        assert_eq!(found.rate_key(1), "rate_1");
    }
}
