// ==========================================
// 快递运价引擎 - 对外请求/响应结构
// ==========================================
// 字段名与既有调用方保持一致；金额以 JSON 数字输出（2 位小数）
// ==========================================

use crate::domain::slab_tariff::SlabTariff;
use chrono::{DateTime, Utc};
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

// ==========================================
// 区域运价
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonePriceRequest {
    pub from_pincode: String,
    pub to_pincode: String,
    pub weight: Decimal,
    pub service_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZonePriceResponse {
    /// 每公斤单价
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub weight: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_amount: Decimal,
    pub service_type: String,
}

// ==========================================
// 阶梯运价
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabPriceRequest {
    pub company_id: i64,
    pub courier_type: String,
    pub row_name: String,
    pub weight: Decimal,
    #[serde(default)]
    pub sub_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabPriceResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub base_rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub fuel_surcharge: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub royalty_surcharge: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub final_rate: Decimal,
    pub slab_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub weight: Decimal,
}

// ==========================================
// 批量替换
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulkReplaceRequest {
    pub company_id: i64,
    /// 原始行，逐行校验（形状不合法的行只记错误）
    pub rates_data: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkReplaceResponse {
    pub inserted: usize,
    pub errors: Vec<String>,
}

// ==========================================
// 阶梯运价回读视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlabTariffView {
    pub id: i64,
    pub company_id: i64,
    pub courier_type: String,
    pub row_name: String,
    pub sub_type: Option<String>,
    pub slab_type: String,
    /// 档位 key 沿用写入时的原文（{"1": 50} 回读仍为 {"1": 50}），
    /// 无原文的旧数据输出为 rate_N；值为 JSON 数字
    pub rates: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl From<&SlabTariff> for SlabTariffView {
    fn from(tariff: &SlabTariff) -> Self {
        let rates = tariff
            .rates
            .values()
            .into_iter()
            .enumerate()
            .map(|(i, v)| (tariff.rate_key(i + 1), decimal_to_json_number(v)))
            .collect();

        Self {
            id: tariff.id,
            company_id: tariff.company_id,
            courier_type: tariff.courier_type.clone(),
            row_name: tariff.row_name.clone(),
            sub_type: tariff.sub_type.clone(),
            slab_type: tariff.declared_slab_type.clone(),
            rates,
            created_at: tariff.created_at,
        }
    }
}

/// Decimal → JSON 数字；整数值输出为整数（50 而非 50.0）
pub fn decimal_to_json_number(value: Decimal) -> Value {
    let normalized = value.normalize();
    if normalized.fract().is_zero() {
        if let Some(i) = normalized.to_i64() {
            return Value::Number(Number::from(i));
        }
    }
    normalized
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_decimal_to_json_number() {
        assert_eq!(decimal_to_json_number(dec!(50)), json!(50));
        assert_eq!(decimal_to_json_number(dec!(50.00)), json!(50));
        assert_eq!(decimal_to_json_number(dec!(12.5)), json!(12.5));
    }

    #[test]
    fn test_slab_response_serializes_numbers() {
        let resp = SlabPriceResponse {
            base_rate: dec!(100.00),
            fuel_surcharge: dec!(5.00),
            royalty_surcharge: dec!(2.00),
            final_rate: dec!(107.00),
            slab_type: "Slab 3".to_string(),
            weight: dec!(1.3),
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["final_rate"].as_f64(), Some(107.0));
        assert_eq!(value["weight"].as_f64(), Some(1.3));
        assert_eq!(value["slab_type"], "Slab 3");
    }

    #[test]
    fn test_zone_request_accepts_string_weight() {
        let req: ZonePriceRequest = serde_json::from_value(json!({
            "from_pincode": "400001", "to_pincode": "110001",
            "weight": "2.5", "service_type": "Air"
        }))
        .unwrap();
        assert_eq!(req.weight, dec!(2.5));
    }
}
