// ==========================================
// 快递运价引擎 - 计费请求/结果
// ==========================================
// 请求是二选一的判别式：区域运价 或 阶梯运价
// 结果中金额字段统一保留 2 位小数（中间计算保留全精度）
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// PricingRequest - 计费请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PricingRequest {
    Zone {
        origin_pincode: String,
        destination_pincode: String,
        service_type: String,
        weight: Decimal,
    },
    Slab {
        company_id: i64,
        courier_type: String,
        row_name: String,
        sub_type: Option<String>,
        weight: Decimal,
    },
}

impl PricingRequest {
    pub fn weight(&self) -> Decimal {
        match self {
            PricingRequest::Zone { weight, .. } | PricingRequest::Slab { weight, .. } => *weight,
        }
    }
}

// ==========================================
// MatchedRecord - 命中的运价行描述
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchedRecord {
    Zone {
        rate_record_id: i64,
        rate_per_kg: Decimal,
        service_type: String,
        origin_pincode: String,
        destination_pincode: String,
    },
    Slab {
        tariff_id: i64,
        slab_type: String,
    },
}

// ==========================================
// PricingResult - 计费结果（含明细）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingResult {
    pub base_rate: Decimal,
    pub fuel_surcharge: Decimal,
    pub royalty_surcharge: Decimal,
    pub final_rate: Decimal,
    pub matched: MatchedRecord,
    pub weight: Decimal,
}
