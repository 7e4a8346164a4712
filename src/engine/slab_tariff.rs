// ==========================================
// 快递运价引擎 - 阶梯运价解析
// ==========================================
// 输入: 加盟商 + 公司 + 快递类型 + 行名称 (+ 子类型) + 重量
// 输出: 命中的 SlabTariff + 基础运价（不舍入）
// ==========================================
// 档位边界（kg，闭区间上界）:
//   Slab 2: [1.0]
//   Slab 3: [0.5, 1.0]
//   Slab 4: [0.5, 1.0, 2.0]
// 重量 ≤ 某边界 → 该档价格（取最小的满足边界）
// 超过最后边界 → 倒数第二档价格 + ceil(超出重量) × 最后一档单价
// ==========================================

use crate::domain::slab_tariff::{SlabRates, SlabTariff};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::sources::SlabTariffSource;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// 阶梯运价解析结果
#[derive(Debug, Clone, PartialEq)]
pub struct SlabQuote {
    pub tariff: SlabTariff,
    pub base_rate: Decimal,
}

// ==========================================
// SlabTariffResolver - 阶梯运价解析器
// ==========================================
pub struct SlabTariffResolver {
    source: Arc<dyn SlabTariffSource>,
}

impl SlabTariffResolver {
    pub fn new(source: Arc<dyn SlabTariffSource>) -> Self {
        Self { source }
    }

    /// 解析阶梯运价
    ///
    /// # 参数
    /// - sub_type: Some 时收窄匹配；None 时匹配任意子类型
    ///
    /// # 返回
    /// - Ok(None): 无对应阶梯运价行
    /// - Err(AmountOverflow): 超重部分加价超出 Decimal 范围
    #[instrument(skip(self), fields(franchise_id = %franchise_id, company_id = %company_id, weight = %weight))]
    pub fn resolve(
        &self,
        franchise_id: i64,
        company_id: i64,
        courier_type: &str,
        row_name: &str,
        sub_type: Option<&str>,
        weight: Decimal,
    ) -> EngineResult<Option<SlabQuote>> {
        let Some(tariff) =
            self.source
                .find_tariff(franchise_id, company_id, courier_type, row_name, sub_type)?
        else {
            debug!("无对应阶梯运价行");
            return Ok(None);
        };

        match tariff.rates.slab_type() {
            None => warn!(
                tariff_id = tariff.id,
                bracket_count = tariff.rates.bracket_count(),
                "阶梯运价档位数异常，按第 1 档价格计费"
            ),
            Some(derived) if derived.as_str() != tariff.declared_slab_type => warn!(
                tariff_id = tariff.id,
                declared = %tariff.declared_slab_type,
                derived = %derived,
                "阶梯类型与档位数不一致，按档位数计费"
            ),
            Some(_) => {}
        }

        let base_rate = slab_base_rate(&tariff.rates, weight)
            .ok_or_else(|| EngineError::overflow("slab overweight charge"))?;
        debug!(tariff_id = tariff.id, base_rate = %base_rate, "命中阶梯运价");
        Ok(Some(SlabQuote { tariff, base_rate }))
    }
}

/// 阶梯基础运价（纯函数）
///
/// # 返回
/// - None: 超重加价溢出 Decimal 范围
pub fn slab_base_rate(rates: &SlabRates, weight: Decimal) -> Option<Decimal> {
    let half = Decimal::new(5, 1);
    let one = Decimal::ONE;
    let two = Decimal::TWO;

    match *rates {
        SlabRates::Two { r1, r2 } => step(&[r1], &[one], r2, weight),
        SlabRates::Three { r1, r2, r3 } => step(&[r1, r2], &[half, one], r3, weight),
        SlabRates::Four { r1, r2, r3, r4 } => step(&[r1, r2, r3], &[half, one, two], r4, weight),
        SlabRates::Irregular(ref values) => Some(values.first().copied().unwrap_or(Decimal::ZERO)),
    }
}

/// entries 与 boundaries 一一对应；marginal 为超出最后边界后的每单位加价
fn step(entries: &[Decimal], boundaries: &[Decimal], marginal: Decimal, weight: Decimal) -> Option<Decimal> {
    for (entry, boundary) in entries.iter().zip(boundaries) {
        if weight <= *boundary {
            return Some(*entry);
        }
    }

    let (Some(last_entry), Some(last_boundary)) = (entries.last(), boundaries.last()) else {
        return Some(Decimal::ZERO);
    };
    (weight - *last_boundary)
        .ceil()
        .checked_mul(marginal)
        .and_then(|extra| last_entry.checked_add(extra))
}
