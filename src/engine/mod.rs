// ==========================================
// 快递运价引擎 - 引擎层
// ==========================================
// 职责: 运价解析 + 阶梯计价 + 附加费叠加 + 批量行校验
// 红线: Engine 不拼 SQL，只经 sources 中的只读接口取数
// ==========================================

pub mod error;
pub mod money;
pub mod slab_tariff;
pub mod sources;
pub mod surcharge;
pub mod tariff_validation;
pub mod zone_rate;

// 重导出核心引擎
pub use error::{EngineError, EngineResult};
pub use money::{round_money, MONEY_DECIMAL_PLACES};
pub use slab_tariff::{slab_base_rate, SlabQuote, SlabTariffResolver};
pub use sources::{CompanyProfileSource, RateRecordSource, SlabTariffSource};
pub use surcharge::{SurchargeBreakdown, SurchargeCalculator};
pub use tariff_validation::{validate_rows, RowViolation, ValidatedBatch};
pub use zone_rate::{select_best_match, ZoneQuote, ZoneRateResolver};
