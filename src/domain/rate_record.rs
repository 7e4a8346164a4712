// ==========================================
// 快递运价引擎 - 区域运价领域模型
// ==========================================
// 用途: 按 起始pincode × 目的pincode × 服务类型 × 重量区间 的每公斤单价
// 生命周期: 管理员逐条增删改，引擎只读
// ==========================================

use crate::domain::types::PincodePattern;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// RateRecord - 区域运价行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecord {
    pub id: i64,
    pub franchise_id: i64,

    // ===== 线路 =====
    pub origin_pincode: PincodePattern,
    pub destination_pincode: PincodePattern,
    pub service_type: String, // 如 "Air" / "Surface"

    // ===== 重量区间（闭区间，weight_to 为空表示无上限）=====
    pub weight_from: Decimal,
    pub weight_to: Option<Decimal>,

    // ===== 单价 =====
    pub rate_per_kg: Decimal,
}

impl RateRecord {
    /// 重量是否落在本行区间内
    pub fn covers_weight(&self, weight: Decimal) -> bool {
        self.weight_from <= weight && self.weight_to.map_or(true, |to| to >= weight)
    }
}

// ==========================================
// RateRecordInput - 管理端新增/修改入参
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateRecordInput {
    pub origin_pincode: String,
    pub destination_pincode: String,
    pub service_type: String,
    pub weight_from: Decimal,
    #[serde(default)]
    pub weight_to: Option<Decimal>,
    pub rate_per_kg: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn record(weight_from: Decimal, weight_to: Option<Decimal>) -> RateRecord {
        RateRecord {
            id: 1,
            franchise_id: 1,
            origin_pincode: PincodePattern::Any,
            destination_pincode: PincodePattern::Any,
            service_type: "Air".to_string(),
            weight_from,
            weight_to,
            rate_per_kg: dec!(10),
        }
    }

    #[test]
    fn test_covers_weight_inclusive_bounds() {
        let r = record(dec!(1), Some(dec!(5)));
        assert!(r.covers_weight(dec!(1)));
        assert!(r.covers_weight(dec!(5)));
        assert!(!r.covers_weight(dec!(0.99)));
        assert!(!r.covers_weight(dec!(5.01)));
    }

    #[test]
    fn test_covers_weight_unbounded() {
        let r = record(dec!(10), None);
        assert!(r.covers_weight(dec!(10000)));
        assert!(!r.covers_weight(dec!(9.5)));
    }
}
