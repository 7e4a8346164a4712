// ==========================================
// 快递运价引擎 - 领域模型层
// ==========================================
// 职责: 定义运价实体、类型、计费请求/结果
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod company;
pub mod pricing;
pub mod rate_record;
pub mod slab_tariff;
pub mod types;

// 重导出核心类型
pub use company::CompanyProfile;
pub use pricing::{MatchedRecord, PricingRequest, PricingResult};
pub use rate_record::{RateRecord, RateRecordInput};
pub use slab_tariff::{NewSlabTariff, SlabRates, SlabTariff, SlabTariffKey};
pub use types::{PincodePattern, SlabType, PINCODE_WILDCARD};
