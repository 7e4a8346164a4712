// ==========================================
// 快递运价引擎 - 公司商务档案
// ==========================================
// 用途: 附加费百分比 + 保价条款，引擎只读
// 字段静态枚举，不做运行时 key 过滤
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub franchise_id: i64,
    pub company_id: i64,
    #[serde(default)]
    pub company_name: String,

    // ===== 参与计费的附加费（基价百分比）=====
    #[serde(default)]
    pub fuel_surcharge_percent: Decimal,
    #[serde(default)]
    pub royalty_charges_percent: Decimal,

    // ===== 其他商务条款（引擎透传，不参与基础计费）=====
    #[serde(default)]
    pub cod_charge: Decimal,
    #[serde(default)]
    pub insurance_percent: Decimal,
    #[serde(default)]
    pub minimum_risk_surcharge: Decimal,
}

impl CompanyProfile {
    /// 全零档案：区域运价路径使用，保证不叠加任何公司附加费
    pub fn zero() -> Self {
        Self::default()
    }

    /// 各百分比/金额字段（名称, 值），供校验使用
    pub fn numeric_fields(&self) -> [(&'static str, Decimal); 5] {
        [
            ("fuel_surcharge_percent", self.fuel_surcharge_percent),
            ("royalty_charges_percent", self.royalty_charges_percent),
            ("cod_charge", self.cod_charge),
            ("insurance_percent", self.insurance_percent),
            ("minimum_risk_surcharge", self.minimum_risk_surcharge),
        ]
    }
}
