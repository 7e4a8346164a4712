// ==========================================
// 快递运价引擎 - 区域运价解析
// ==========================================
// 输入: 加盟商 + 起始/目的 pincode + 服务类型 + 重量
// 输出: 命中的 RateRecord + 基础运价（rate_per_kg × weight，不舍入）
// ==========================================
// 匹配优先级:
//   1. 精确起始 pincode 优先于通配 '*'
//   2. 起始相同特异度时，精确目的 pincode 优先
//   3. 特异度完全相同时 id 小者（先录入）优先
// ==========================================

use crate::domain::rate_record::RateRecord;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::sources::RateRecordSource;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, instrument};

/// 区域运价解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneQuote {
    pub record: RateRecord,
    pub base_rate: Decimal,
}

// ==========================================
// ZoneRateResolver - 区域运价解析器
// ==========================================
pub struct ZoneRateResolver {
    source: Arc<dyn RateRecordSource>,
}

impl ZoneRateResolver {
    pub fn new(source: Arc<dyn RateRecordSource>) -> Self {
        Self { source }
    }

    /// 解析区域运价
    ///
    /// # 返回
    /// - Ok(Some(quote)): 命中
    /// - Ok(None): 无匹配行
    /// - Err(AmountOverflow): rate_per_kg × weight 超出 Decimal 范围
    #[instrument(skip(self), fields(franchise_id = %franchise_id, weight = %weight))]
    pub fn resolve(
        &self,
        franchise_id: i64,
        origin_pincode: &str,
        destination_pincode: &str,
        service_type: &str,
        weight: Decimal,
    ) -> EngineResult<Option<ZoneQuote>> {
        let candidates =
            self.source
                .route_candidates(franchise_id, origin_pincode, destination_pincode, service_type)?;
        debug!(candidates = candidates.len(), "区域运价候选行");

        let Some(record) = select_best_match(
            &candidates,
            origin_pincode,
            destination_pincode,
            service_type,
            weight,
        ) else {
            return Ok(None);
        };

        let base_rate = record
            .rate_per_kg
            .checked_mul(weight)
            .ok_or_else(|| EngineError::overflow("rate_per_kg × weight"))?;
        debug!(rate_record_id = record.id, "命中区域运价");

        Ok(Some(ZoneQuote {
            record: record.clone(),
            base_rate,
        }))
    }
}

/// 从候选行中选出最优匹配（纯函数）
///
/// 候选行不要求预先过滤，线路/服务类型/重量区间在此重新判定
pub fn select_best_match<'a>(
    candidates: &'a [RateRecord],
    origin_pincode: &str,
    destination_pincode: &str,
    service_type: &str,
    weight: Decimal,
) -> Option<&'a RateRecord> {
    candidates
        .iter()
        .filter(|r| {
            r.service_type == service_type
                && r.origin_pincode.matches(origin_pincode)
                && r.destination_pincode.matches(destination_pincode)
                && r.covers_weight(weight)
        })
        .min_by_key(|r| {
            (
                !r.origin_pincode.is_exact(),
                !r.destination_pincode.is_exact(),
                r.id,
            )
        })
}
