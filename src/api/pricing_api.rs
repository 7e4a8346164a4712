// ==========================================
// 快递运价引擎 - 计费 API
// ==========================================
// 职责: 请求分流（区域 / 阶梯）→ 解析基础运价 → 附加费 → 舍入输出
// 约定: 区域运价不关联公司，附加费按全零档案计算（不叠加公司附加费）
// ==========================================

use crate::api::dto::{SlabPriceRequest, SlabPriceResponse, ZonePriceRequest, ZonePriceResponse};
use crate::api::error::{messages, ApiError, ApiResult};
use crate::domain::company::CompanyProfile;
use crate::domain::pricing::{MatchedRecord, PricingRequest, PricingResult};
use crate::engine::money::non_negative_decimal_from_json;
use crate::engine::slab_tariff::SlabTariffResolver;
use crate::engine::sources::CompanyProfileSource;
use crate::engine::surcharge::SurchargeCalculator;
use crate::engine::zone_rate::ZoneRateResolver;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, info};

const ZONE_ORIGIN_KEYS: [&str; 2] = ["from_pincode", "origin_pincode"];
const ZONE_DESTINATION_KEYS: [&str; 2] = ["to_pincode", "destination_pincode"];

// ==========================================
// PricingApi - 计费 API
// ==========================================
pub struct PricingApi {
    zone_resolver: Arc<ZoneRateResolver>,
    slab_resolver: Arc<SlabTariffResolver>,
    profile_source: Arc<dyn CompanyProfileSource>,
    surcharge: SurchargeCalculator,
}

impl PricingApi {
    pub fn new(
        zone_resolver: Arc<ZoneRateResolver>,
        slab_resolver: Arc<SlabTariffResolver>,
        profile_source: Arc<dyn CompanyProfileSource>,
    ) -> Self {
        Self {
            zone_resolver,
            slab_resolver,
            profile_source,
            surcharge: SurchargeCalculator::new(),
        }
    }

    /// 计费（原始 JSON 请求）
    ///
    /// # 参数
    /// - franchise_id: 调用方所属加盟商
    /// - raw: 请求体，按字段形状判定走区域或阶梯
    ///
    /// # 返回
    /// - Err(ValidationError): 两种形状都不满足 / 字段缺失 / 重量非正 / 重量过大导致金额溢出
    /// - Err(NotFound): 无匹配运价或公司
    pub fn price(&self, franchise_id: i64, raw: &Value) -> ApiResult<PricingResult> {
        let request = parse_pricing_request(raw)?;
        self.price_request(franchise_id, &request)
    }

    /// 计费（已成形请求）
    pub fn price_request(&self, franchise_id: i64, request: &PricingRequest) -> ApiResult<PricingResult> {
        ensure_positive_weight(request.weight())?;

        match request {
            PricingRequest::Zone {
                origin_pincode,
                destination_pincode,
                service_type,
                weight,
            } => {
                require_text("origin_pincode", origin_pincode)?;
                require_text("destination_pincode", destination_pincode)?;
                require_text("service_type", service_type)?;

                let quote = self
                    .zone_resolver
                    .resolve(
                        franchise_id,
                        origin_pincode.trim(),
                        destination_pincode.trim(),
                        service_type.trim(),
                        *weight,
                    )?
                    .ok_or_else(|| ApiError::NotFound(messages::ZONE_RATE_NOT_FOUND.to_string()))?;

                let breakdown = self.surcharge.apply(quote.base_rate, &CompanyProfile::zero())?;
                debug!(rate_record_id = quote.record.id, final_rate = %breakdown.final_rate, "区域计费完成");

                Ok(PricingResult {
                    base_rate: breakdown.base_rate,
                    fuel_surcharge: breakdown.fuel_surcharge,
                    royalty_surcharge: breakdown.royalty_surcharge,
                    final_rate: breakdown.final_rate,
                    matched: MatchedRecord::Zone {
                        rate_record_id: quote.record.id,
                        rate_per_kg: quote.record.rate_per_kg,
                        service_type: quote.record.service_type.clone(),
                        origin_pincode: quote.record.origin_pincode.to_db_string(),
                        destination_pincode: quote.record.destination_pincode.to_db_string(),
                    },
                    weight: *weight,
                })
            }
            PricingRequest::Slab {
                company_id,
                courier_type,
                row_name,
                sub_type,
                weight,
            } => {
                require_text("courier_type", courier_type)?;
                require_text("row_name", row_name)?;
                let sub_type = sub_type.as_deref().map(str::trim).filter(|s| !s.is_empty());

                let profile = self
                    .profile_source
                    .find_profile(franchise_id, *company_id)?
                    .ok_or_else(|| ApiError::NotFound(messages::COMPANY_NOT_FOUND.to_string()))?;

                let quote = self
                    .slab_resolver
                    .resolve(
                        franchise_id,
                        *company_id,
                        courier_type.trim(),
                        row_name.trim(),
                        sub_type,
                        *weight,
                    )?
                    .ok_or_else(|| ApiError::NotFound(messages::SLAB_RATE_NOT_FOUND.to_string()))?;

                let breakdown = self.surcharge.apply(quote.base_rate, &profile)?;
                debug!(tariff_id = quote.tariff.id, final_rate = %breakdown.final_rate, "阶梯计费完成");

                Ok(PricingResult {
                    base_rate: breakdown.base_rate,
                    fuel_surcharge: breakdown.fuel_surcharge,
                    royalty_surcharge: breakdown.royalty_surcharge,
                    final_rate: breakdown.final_rate,
                    matched: MatchedRecord::Slab {
                        tariff_id: quote.tariff.id,
                        slab_type: quote.tariff.declared_slab_type.clone(),
                    },
                    weight: *weight,
                })
            }
        }
    }

    /// 区域计费（对外形状）
    pub fn price_zone(&self, franchise_id: i64, request: &ZonePriceRequest) -> ApiResult<ZonePriceResponse> {
        let result = self.price_request(
            franchise_id,
            &PricingRequest::Zone {
                origin_pincode: request.from_pincode.clone(),
                destination_pincode: request.to_pincode.clone(),
                service_type: request.service_type.clone(),
                weight: request.weight,
            },
        )?;

        match result.matched {
            MatchedRecord::Zone {
                rate_per_kg,
                service_type,
                ..
            } => Ok(ZonePriceResponse {
                rate: rate_per_kg,
                weight: result.weight,
                total_amount: result.final_rate,
                service_type,
            }),
            MatchedRecord::Slab { .. } => Err(ApiError::InternalError(
                "区域计费返回了阶梯运价结果".to_string(),
            )),
        }
    }

    /// 阶梯计费（对外形状）
    pub fn price_slab(&self, franchise_id: i64, request: &SlabPriceRequest) -> ApiResult<SlabPriceResponse> {
        let result = self.price_request(
            franchise_id,
            &PricingRequest::Slab {
                company_id: request.company_id,
                courier_type: request.courier_type.clone(),
                row_name: request.row_name.clone(),
                sub_type: request.sub_type.clone(),
                weight: request.weight,
            },
        )?;

        match result.matched {
            MatchedRecord::Slab { slab_type, .. } => {
                info!(company_id = request.company_id, final_rate = %result.final_rate, "阶梯计费");
                Ok(SlabPriceResponse {
                    base_rate: result.base_rate,
                    fuel_surcharge: result.fuel_surcharge,
                    royalty_surcharge: result.royalty_surcharge,
                    final_rate: result.final_rate,
                    slab_type,
                    weight: result.weight,
                })
            }
            MatchedRecord::Zone { .. } => Err(ApiError::InternalError(
                "阶梯计费返回了区域运价结果".to_string(),
            )),
        }
    }
}

// ==========================================
// 请求分流
// ==========================================

/// 原始请求 → PricingRequest
///
/// 带 pincode / service_type 字段 → 区域；带 company_id / courier_type / row_name → 阶梯；
/// 形状一旦确定，该形状的字段必须齐全
pub fn parse_pricing_request(raw: &Value) -> ApiResult<PricingRequest> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ApiError::ValidationError("Request body must be a JSON object".to_string()))?;

    let is_zone = ZONE_ORIGIN_KEYS
        .iter()
        .chain(ZONE_DESTINATION_KEYS.iter())
        .chain(["service_type"].iter())
        .any(|k| is_present(obj, k));
    let is_slab = ["company_id", "courier_type", "row_name"]
        .iter()
        .any(|k| is_present(obj, k));

    if is_zone {
        return Ok(PricingRequest::Zone {
            origin_pincode: text_field(obj, &ZONE_ORIGIN_KEYS)?,
            destination_pincode: text_field(obj, &ZONE_DESTINATION_KEYS)?,
            service_type: text_field(obj, &["service_type"])?,
            weight: weight_field(obj)?,
        });
    }

    if is_slab {
        let sub_type = match obj.get("sub_type") {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.trim().is_empty() => None,
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(_) => {
                return Err(ApiError::ValidationError("sub_type must be a string".to_string()))
            }
        };
        return Ok(PricingRequest::Slab {
            company_id: company_id_field(obj)?,
            courier_type: text_field(obj, &["courier_type"])?,
            row_name: text_field(obj, &["row_name"])?,
            sub_type,
            weight: weight_field(obj)?,
        });
    }

    Err(ApiError::ValidationError(
        "Request must include either from_pincode, to_pincode and service_type, or company_id, courier_type and row_name"
            .to_string(),
    ))
}

fn is_present(obj: &Map<String, Value>, key: &str) -> bool {
    obj.get(key).map_or(false, |v| !v.is_null())
}

/// 取第一个存在的别名字段
fn text_field(obj: &Map<String, Value>, aliases: &[&str]) -> ApiResult<String> {
    let value = aliases.iter().find_map(|k| obj.get(*k).filter(|v| !v.is_null()));
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(ApiError::ValidationError(format!("{} is required", aliases[0]))),
    }
}

fn weight_field(obj: &Map<String, Value>) -> ApiResult<Decimal> {
    let raw = obj.get("weight").unwrap_or(&Value::Null);
    match non_negative_decimal_from_json(raw) {
        Ok(Some(weight)) => {
            ensure_positive_weight(weight)?;
            Ok(weight)
        }
        Ok(None) => Err(ApiError::ValidationError("weight is required".to_string())),
        Err(_) => Err(ApiError::ValidationError(
            "weight must be a number greater than 0".to_string(),
        )),
    }
}

fn company_id_field(obj: &Map<String, Value>) -> ApiResult<i64> {
    let parsed = match obj.get("company_id") {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ApiError::ValidationError("company_id must be an integer".to_string()))
}

fn require_text(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::ValidationError(format!("{} is required", field)));
    }
    Ok(())
}

fn ensure_positive_weight(weight: Decimal) -> ApiResult<()> {
    if weight <= Decimal::ZERO {
        return Err(ApiError::ValidationError(
            "weight must be a number greater than 0".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_parse_zone_request_with_wire_names() {
        let req = parse_pricing_request(&json!({
            "from_pincode": "400001", "to_pincode": "110001",
            "service_type": "Air", "weight": 2.5
        }))
        .unwrap();
        assert_eq!(
            req,
            PricingRequest::Zone {
                origin_pincode: "400001".to_string(),
                destination_pincode: "110001".to_string(),
                service_type: "Air".to_string(),
                weight: dec!(2.5),
            }
        );
    }

    #[test]
    fn test_parse_slab_request() {
        let req = parse_pricing_request(&json!({
            "company_id": "7", "courier_type": "Express", "row_name": "Metro",
            "weight": "1.3", "sub_type": ""
        }))
        .unwrap();
        match req {
            PricingRequest::Slab {
                company_id,
                sub_type,
                weight,
                ..
            } => {
                assert_eq!(company_id, 7);
                assert_eq!(sub_type, None);
                assert_eq!(weight, dec!(1.3));
            }
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_partial_and_unknown_shapes() {
        let partial_zone = json!({"from_pincode": "400001", "weight": 1});
        let partial_slab = json!({"company_id": 1, "row_name": "Metro", "weight": 1});
        let neither = json!({"weight": 1});
        let zero_weight = json!({"company_id": 1, "courier_type": "E", "row_name": "M", "weight": 0});
        let bad_weight = json!({"company_id": 1, "courier_type": "E", "row_name": "M", "weight": "heavy"});

        for raw in [partial_zone, partial_slab, neither, zero_weight, bad_weight, json!([1])] {
            let err = parse_pricing_request(&raw).unwrap_err();
            assert_eq!(err.status_code(), 400, "payload {}", raw);
        }
    }
}
