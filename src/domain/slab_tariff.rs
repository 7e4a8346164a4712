// ==========================================
// 快递运价引擎 - 阶梯运价领域模型
// ==========================================
// 用途: 公司 × 快递类型 × 行名称(× 子类型) 的 2~4 档阶梯价
// 生命周期: 只通过整表替换写入，SlabTariffResolver 只读
// ==========================================

use crate::domain::types::SlabType;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// SlabRates - 档位价格
// ==========================================
// 档位数量由变体决定。
// Irregular: 已填档位数不在 2..=4（如只填了 rate_1 的行），计费时按第 1 档兜底。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlabRates {
    Two { r1: Decimal, r2: Decimal },
    Three { r1: Decimal, r2: Decimal, r3: Decimal },
    Four { r1: Decimal, r2: Decimal, r3: Decimal, r4: Decimal },
    Irregular(Vec<Decimal>),
}

impl SlabRates {
    /// 按档位顺序构造（1..N）
    pub fn from_values(values: &[Decimal]) -> Self {
        match *values {
            [r1, r2] => SlabRates::Two { r1, r2 },
            [r1, r2, r3] => SlabRates::Three { r1, r2, r3 },
            [r1, r2, r3, r4] => SlabRates::Four { r1, r2, r3, r4 },
            _ => SlabRates::Irregular(values.to_vec()),
        }
    }

    /// 按档位顺序展开
    pub fn values(&self) -> Vec<Decimal> {
        match self {
            SlabRates::Two { r1, r2 } => vec![*r1, *r2],
            SlabRates::Three { r1, r2, r3 } => vec![*r1, *r2, *r3],
            SlabRates::Four { r1, r2, r3, r4 } => vec![*r1, *r2, *r3, *r4],
            SlabRates::Irregular(values) => values.clone(),
        }
    }

    /// 变体对应的阶梯类型；Irregular 没有合法类型
    pub fn slab_type(&self) -> Option<SlabType> {
        match self {
            SlabRates::Two { .. } => Some(SlabType::Slab2),
            SlabRates::Three { .. } => Some(SlabType::Slab3),
            SlabRates::Four { .. } => Some(SlabType::Slab4),
            SlabRates::Irregular(_) => None,
        }
    }

    pub fn bracket_count(&self) -> usize {
        match self {
            SlabRates::Two { .. } => 2,
            SlabRates::Three { .. } => 3,
            SlabRates::Four { .. } => 4,
            SlabRates::Irregular(values) => values.len(),
        }
    }
}

// ==========================================
// SlabTariff - 阶梯运价行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct SlabTariff {
    pub id: i64,
    pub franchise_id: i64,
    pub company_id: i64,
    pub courier_type: String,
    pub row_name: String,
    pub sub_type: Option<String>,
    /// 存储中的 slab_type 原文（可能与已填档位数不一致，计费以档位数为准）
    pub declared_slab_type: String,
    pub rates: SlabRates,
    /// 写入时各档位 key 的原文（按档位顺序）；旧数据为空
    pub rate_keys: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl SlabTariff {
    /// 第 bracket 档（1 起始）回读时使用的 key：写入原文，缺失时为 rate_N
    pub fn rate_key(&self, bracket: usize) -> String {
        bracket
            .checked_sub(1)
            .and_then(|i| self.rate_keys.get(i))
            .cloned()
            .unwrap_or_else(|| format!("rate_{}", bracket))
    }
}

// ==========================================
// NewSlabTariff - 已校验、待写入的阶梯运价行
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct NewSlabTariff {
    pub courier_type: String,
    pub row_name: String,
    pub sub_type: Option<String>,
    pub slab_type: SlabType,
    pub rates: SlabRates,
    /// 各档位 key 的原文（"1" / "rate_1" / "slab1" ...），按档位顺序
    pub rate_keys: Vec<String>,
}

impl NewSlabTariff {
    /// 唯一键（公司维度已由调用方固定）
    pub fn key(&self) -> SlabTariffKey {
        SlabTariffKey {
            courier_type: self.courier_type.clone(),
            row_name: self.row_name.clone(),
            sub_type: self.sub_type.clone(),
        }
    }
}

/// 同一公司内的阶梯运价唯一键
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlabTariffKey {
    pub courier_type: String,
    pub row_name: String,
    pub sub_type: Option<String>,
}
