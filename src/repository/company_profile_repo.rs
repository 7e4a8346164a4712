// ==========================================
// 快递运价引擎 - 公司商务档案仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::company::CompanyProfile;
use crate::repository::codec::{decimal_from_db, decimal_to_db};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

pub struct CompanyProfileRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CompanyProfileRepository {
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

    fn map_row(row: &Row<'_>) -> SqliteResult<CompanyProfile> {
        Ok(CompanyProfile {
            franchise_id: row.get(0)?,
            company_id: row.get(1)?,
            company_name: row.get(2)?,
            fuel_surcharge_percent: decimal_from_db(3, &row.get::<_, String>(3)?)?,
            royalty_charges_percent: decimal_from_db(4, &row.get::<_, String>(4)?)?,
            cod_charge: decimal_from_db(5, &row.get::<_, String>(5)?)?,
            insurance_percent: decimal_from_db(6, &row.get::<_, String>(6)?)?,
            minimum_risk_surcharge: decimal_from_db(7, &row.get::<_, String>(7)?)?,
        })
    }

    /// 插入或更新公司档案
    pub fn upsert(&self, profile: &CompanyProfile) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO company_profile (
                franchise_id, company_id, company_name,
                fuel_surcharge_percent, royalty_charges_percent,
                cod_charge, insurance_percent, minimum_risk_surcharge,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, datetime('now'))
            ON CONFLICT(franchise_id, company_id) DO UPDATE SET
                company_name = excluded.company_name,
                fuel_surcharge_percent = excluded.fuel_surcharge_percent,
                royalty_charges_percent = excluded.royalty_charges_percent,
                cod_charge = excluded.cod_charge,
                insurance_percent = excluded.insurance_percent,
                minimum_risk_surcharge = excluded.minimum_risk_surcharge,
                updated_at = excluded.updated_at
            "#,
            params![
                profile.franchise_id,
                profile.company_id,
                profile.company_name,
                decimal_to_db(profile.fuel_surcharge_percent),
                decimal_to_db(profile.royalty_charges_percent),
                decimal_to_db(profile.cod_charge),
                decimal_to_db(profile.insurance_percent),
                decimal_to_db(profile.minimum_risk_surcharge),
            ],
        )?;
        Ok(())
    }

    /// 按 (加盟商, 公司) 查询
    pub fn find(&self, franchise_id: i64, company_id: i64) -> RepositoryResult<Option<CompanyProfile>> {
        let conn = self.get_conn()?;
        let profile = conn
            .query_row(
                r#"
                SELECT
                    franchise_id, company_id, company_name,
                    fuel_surcharge_percent, royalty_charges_percent,
                    cod_charge, insurance_percent, minimum_risk_surcharge
                FROM company_profile
                WHERE franchise_id = ?1 AND company_id = ?2
                "#,
                params![franchise_id, company_id],
                Self::map_row,
            )
            .optional()?;
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_upsert_overwrites() {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        let repo = CompanyProfileRepository::from_connection(Arc::new(Mutex::new(conn)));

        let mut profile = CompanyProfile {
            franchise_id: 1,
            company_id: 9,
            company_name: "Acme Traders".to_string(),
            fuel_surcharge_percent: dec!(5),
            royalty_charges_percent: dec!(2),
            ..Default::default()
        };
        repo.upsert(&profile).unwrap();

        profile.fuel_surcharge_percent = dec!(7.5);
        repo.upsert(&profile).unwrap();

        let found = repo.find(1, 9).unwrap().unwrap();
        assert_eq!(found.fuel_surcharge_percent, dec!(7.5));
        assert_eq!(found.royalty_charges_percent, dec!(2));
        assert_eq!(found.cod_charge, dec!(0));
        assert!(repo.find(2, 9).unwrap().is_none());
    }
}
