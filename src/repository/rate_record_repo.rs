// ==========================================
// 快递运价引擎 - 区域运价数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑（匹配优先级在引擎层）
// ==========================================

use crate::domain::rate_record::{RateRecord, RateRecordInput};
use crate::domain::types::{PincodePattern, PINCODE_WILDCARD};
use crate::repository::codec::{decimal_from_db, decimal_to_db, optional_decimal_from_db};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    id, franchise_id, origin_pincode, destination_pincode, service_type,
    weight_from, weight_to, rate_per_kg
"#;

// ==========================================
// RateRecordRepository - 区域运价仓储
// ==========================================
/// 区域运价仓储
/// 职责: 管理 rate_record 表的 CRUD 操作
pub struct RateRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl RateRecordRepository {
    /// 创建新的 RateRecordRepository 实例
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<RateRecord> {
        Ok(RateRecord {
            id: row.get(0)?,
            franchise_id: row.get(1)?,
            origin_pincode: PincodePattern::from_db_str(&row.get::<_, String>(2)?),
            destination_pincode: PincodePattern::from_db_str(&row.get::<_, String>(3)?),
            service_type: row.get(4)?,
            weight_from: decimal_from_db(5, &row.get::<_, String>(5)?)?,
            weight_to: optional_decimal_from_db(6, row.get(6)?)?,
            rate_per_kg: decimal_from_db(7, &row.get::<_, String>(7)?)?,
        })
    }

    /// 新增区域运价
    ///
    /// # 返回
    /// - Ok(i64): 新行 id
    /// - Err(UniqueConstraintViolation): 同线路/服务/区间已存在
    pub fn insert(&self, franchise_id: i64, input: &RateRecordInput) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO rate_record (
                franchise_id, origin_pincode, destination_pincode, service_type,
                weight_from, weight_to, rate_per_kg
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                franchise_id,
                PincodePattern::from_db_str(&input.origin_pincode).to_db_string(),
                PincodePattern::from_db_str(&input.destination_pincode).to_db_string(),
                input.service_type.trim(),
                decimal_to_db(input.weight_from),
                input.weight_to.map(decimal_to_db),
                decimal_to_db(input.rate_per_kg),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 修改区域运价（整行覆盖）
    ///
    /// # 返回
    /// - Ok(usize): 受影响行数（0 表示不存在）
    pub fn update(&self, franchise_id: i64, id: i64, input: &RateRecordInput) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE rate_record SET
                origin_pincode = ?3,
                destination_pincode = ?4,
                service_type = ?5,
                weight_from = ?6,
                weight_to = ?7,
                rate_per_kg = ?8,
                updated_at = datetime('now')
            WHERE franchise_id = ?1 AND id = ?2
            "#,
            params![
                franchise_id,
                id,
                PincodePattern::from_db_str(&input.origin_pincode).to_db_string(),
                PincodePattern::from_db_str(&input.destination_pincode).to_db_string(),
                input.service_type.trim(),
                decimal_to_db(input.weight_from),
                input.weight_to.map(decimal_to_db),
                decimal_to_db(input.rate_per_kg),
            ],
        )?;
        Ok(affected)
    }

    /// 删除区域运价
    pub fn delete(&self, franchise_id: i64, id: i64) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "DELETE FROM rate_record WHERE franchise_id = ?1 AND id = ?2",
            params![franchise_id, id],
        )?;
        Ok(affected)
    }

    /// 按主键查询
    pub fn find_by_id(&self, franchise_id: i64, id: i64) -> RepositoryResult<Option<RateRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM rate_record WHERE franchise_id = ?1 AND id = ?2"
        );
        let record = conn
            .query_row(&sql, params![franchise_id, id], Self::map_row)
            .optional()?;
        Ok(record)
    }

    /// 查询加盟商的区域运价列表（可选按服务类型过滤）
    pub fn list_by_franchise(
        &self,
        franchise_id: i64,
        service_type: Option<&str>,
    ) -> RepositoryResult<Vec<RateRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM rate_record
            WHERE franchise_id = ?1 AND (?2 IS NULL OR service_type = ?2)
            ORDER BY id ASC
            "#
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(params![franchise_id, service_type], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }

    /// 查询线路候选行（精确或通配 pincode，同服务类型）
    ///
    /// 只做线路过滤；重量区间与优先级由 ZoneRateResolver 判定
    pub fn find_route_candidates(
        &self,
        franchise_id: i64,
        origin_pincode: &str,
        destination_pincode: &str,
        service_type: &str,
    ) -> RepositoryResult<Vec<RateRecord>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"
            SELECT {SELECT_COLUMNS}
            FROM rate_record
            WHERE franchise_id = ?1
              AND (origin_pincode = ?2 OR origin_pincode = ?5)
              AND (destination_pincode = ?3 OR destination_pincode = ?5)
              AND service_type = ?4
            ORDER BY id ASC
            "#
        );
        let mut stmt = conn.prepare(&sql)?;
        let records = stmt
            .query_map(
                params![
                    franchise_id,
                    origin_pincode.trim(),
                    destination_pincode.trim(),
                    service_type.trim(),
                    PINCODE_WILDCARD
                ],
                Self::map_row,
            )?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn setup_test_repo() -> RateRecordRepository {
        let conn = Connection::open_in_memory().expect("Failed to open memory db");
        crate::db::ensure_schema(&conn).expect("Failed to create schema");
        RateRecordRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn input(origin: &str, dest: &str, from: rust_decimal::Decimal) -> RateRecordInput {
        RateRecordInput {
            origin_pincode: origin.to_string(),
            destination_pincode: dest.to_string(),
            service_type: "Air".to_string(),
            weight_from: from,
            weight_to: Some(dec!(10)),
            rate_per_kg: dec!(42.50),
        }
    }

    #[test]
    fn test_insert_and_find() {
        let repo = setup_test_repo();
        let id = repo.insert(7, &input("400001", "*", dec!(0))).unwrap();

        let found = repo.find_by_id(7, id).unwrap().expect("record not found");
        assert_eq!(found.origin_pincode, PincodePattern::Exact("400001".to_string()));
        assert_eq!(found.destination_pincode, PincodePattern::Any);
        assert_eq!(found.rate_per_kg, dec!(42.5));
        assert_eq!(found.weight_to, Some(dec!(10)));

        // 其他加盟商不可见
        assert!(repo.find_by_id(8, id).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_route_rejected() {
        let repo = setup_test_repo();
        repo.insert(1, &input("400001", "110001", dec!(0))).unwrap();

        let err = repo.insert(1, &input("400001", "110001", dec!(0.0))).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }

    #[test]
    fn test_route_candidates_include_wildcards() {
        let repo = setup_test_repo();
        repo.insert(1, &input("400001", "110001", dec!(0))).unwrap();
        repo.insert(1, &input("*", "110001", dec!(0))).unwrap();
        repo.insert(1, &input("*", "*", dec!(0))).unwrap();
        repo.insert(1, &input("500001", "*", dec!(0))).unwrap();

        let candidates = repo
            .find_route_candidates(1, "400001", "110001", "Air")
            .unwrap();
        assert_eq!(candidates.len(), 3);
    }

    #[test]
    fn test_update_and_delete() {
        let repo = setup_test_repo();
        let id = repo.insert(1, &input("400001", "*", dec!(0))).unwrap();

        let mut changed = input("400001", "*", dec!(0));
        changed.rate_per_kg = dec!(50);
        assert_eq!(repo.update(1, id, &changed).unwrap(), 1);
        assert_eq!(repo.find_by_id(1, id).unwrap().unwrap().rate_per_kg, dec!(50));

        assert_eq!(repo.delete(1, id).unwrap(), 1);
        assert!(repo.list_by_franchise(1, None).unwrap().is_empty());
    }
}
