// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、应用状态装配、测试数据构造
// ==========================================

#![allow(dead_code)]

use courier_rate_engine::app::AppState;
use courier_rate_engine::domain::{CompanyProfile, RateRecordInput};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::error::Error;
use tempfile::NamedTempFile;

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file
        .path()
        .to_str()
        .ok_or("临时文件路径不是 UTF-8")?
        .to_string();

    let conn = courier_rate_engine::db::open_sqlite_connection(&db_path)?;
    courier_rate_engine::db::ensure_schema(&conn)?;

    Ok((temp_file, db_path))
}

/// 基于临时数据库装配 AppState
pub fn create_test_state() -> (NamedTempFile, AppState) {
    let (temp_file, db_path) = create_test_db().expect("Failed to create test db");
    let state = AppState::new(db_path).expect("Failed to create AppState");
    (temp_file, state)
}

/// 写入公司档案
pub fn seed_company(state: &AppState, franchise_id: i64, company_id: i64, fuel: Decimal, royalty: Decimal) {
    state
        .rate_admin_api
        .upsert_company_profile(&CompanyProfile {
            franchise_id,
            company_id,
            company_name: format!("Company {}", company_id),
            fuel_surcharge_percent: fuel,
            royalty_charges_percent: royalty,
            ..Default::default()
        })
        .expect("Failed to seed company");
}

/// 区域运价入参
pub fn zone_input(
    origin: &str,
    destination: &str,
    service_type: &str,
    weight_from: Decimal,
    weight_to: Option<Decimal>,
    rate_per_kg: Decimal,
) -> RateRecordInput {
    RateRecordInput {
        origin_pincode: origin.to_string(),
        destination_pincode: destination.to_string(),
        service_type: service_type.to_string(),
        weight_from,
        weight_to,
        rate_per_kg,
    }
}

/// 阶梯运价原始行
pub fn slab_row(row_name: &str, slab_type: &str, rates: Value) -> Value {
    json!({
        "courier_type": "Express",
        "row_name": row_name,
        "slab_type": slab_type,
        "rates": rates,
    })
}
