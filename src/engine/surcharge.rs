// ==========================================
// 快递运价引擎 - 附加费计算
// ==========================================
// 燃油费 = 基价 × 燃油费率% / 100
// 特许费 = 基价 × 特许费率% / 100
// 最终价 = 基价 + 燃油费 + 特许费（均以未舍入值相加，最后各自舍入一次）
// 附加费只基于基价，互不叠加
// ==========================================

use crate::domain::company::CompanyProfile;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::money::round_money;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 附加费明细（已舍入到 2 位小数）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurchargeBreakdown {
    pub base_rate: Decimal,
    pub fuel_surcharge: Decimal,
    pub royalty_surcharge: Decimal,
    pub final_rate: Decimal,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SurchargeCalculator;

impl SurchargeCalculator {
    pub fn new() -> Self {
        Self
    }

    /// 叠加燃油费与特许费
    ///
    /// # 返回
    /// - Err(AmountOverflow): 中间乘加超出 Decimal 范围
    pub fn apply(&self, base_rate: Decimal, profile: &CompanyProfile) -> EngineResult<SurchargeBreakdown> {
        let fuel = percent_of(base_rate, profile.fuel_surcharge_percent)
            .ok_or_else(|| EngineError::overflow("fuel surcharge"))?;
        let royalty = percent_of(base_rate, profile.royalty_charges_percent)
            .ok_or_else(|| EngineError::overflow("royalty surcharge"))?;
        let final_rate = base_rate
            .checked_add(fuel)
            .and_then(|sum| sum.checked_add(royalty))
            .ok_or_else(|| EngineError::overflow("final rate"))?;

        Ok(SurchargeBreakdown {
            base_rate: round_money(base_rate),
            fuel_surcharge: round_money(fuel),
            royalty_surcharge: round_money(royalty),
            final_rate: round_money(final_rate),
        })
    }
}

fn percent_of(base: Decimal, percent: Decimal) -> Option<Decimal> {
    base.checked_mul(percent)?.checked_div(Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn profile(fuel: Decimal, royalty: Decimal) -> CompanyProfile {
        CompanyProfile {
            fuel_surcharge_percent: fuel,
            royalty_charges_percent: royalty,
            ..CompanyProfile::zero()
        }
    }

    #[test]
    fn test_additive_on_base() {
        let out = SurchargeCalculator::new().apply(dec!(100), &profile(dec!(5), dec!(2))).unwrap();
        assert_eq!(out.fuel_surcharge, dec!(5.00));
        assert_eq!(out.royalty_surcharge, dec!(2.00));
        assert_eq!(out.final_rate, dec!(107.00));
        assert_eq!(out.base_rate, dec!(100));
    }

    #[test]
    fn test_final_rounded_once_from_unrounded_parts() {
        // 0.125 + 0.125 → 各自舍入为 0.13，但最终价 = round(10.25) = 10.25，而非 10.26
        let out = SurchargeCalculator::new().apply(dec!(10), &profile(dec!(1.25), dec!(1.25))).unwrap();
        assert_eq!(out.fuel_surcharge, dec!(0.13));
        assert_eq!(out.royalty_surcharge, dec!(0.13));
        assert_eq!(out.final_rate, dec!(10.25));
    }

    #[test]
    fn test_zero_profile_passes_base_through() {
        let out = SurchargeCalculator::new().apply(dec!(12.345), &CompanyProfile::zero()).unwrap();
        assert_eq!(out.fuel_surcharge, dec!(0));
        assert_eq!(out.royalty_surcharge, dec!(0));
        assert_eq!(out.final_rate, dec!(12.35));
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = SurchargeCalculator::new()
            .apply(Decimal::MAX, &profile(dec!(5), dec!(0)))
            .unwrap_err();
        assert!(matches!(err, EngineError::AmountOverflow { .. }));

        // 零附加费时最大基价仍可计费
        let out = SurchargeCalculator::new().apply(Decimal::MAX, &CompanyProfile::zero()).unwrap();
        assert_eq!(out.final_rate, Decimal::MAX);
    }
}
