// ==========================================
// 快递运价引擎 - API 层
// ==========================================
// 职责: 计费、阶梯运价整表替换、运价管理接口
// 约定: 对外错误统一为 ApiError，可还原为 {success:false, message} 响应
// ==========================================

pub mod dto;
pub mod error;
pub mod pricing_api;
pub mod rate_admin_api;
pub mod tariff_admin_api;

// 重导出核心类型
pub use dto::{
    BulkReplaceRequest, BulkReplaceResponse, SlabPriceRequest, SlabPriceResponse, SlabTariffView,
    ZonePriceRequest, ZonePriceResponse,
};
pub use error::{messages, ApiError, ApiResult};
pub use pricing_api::{parse_pricing_request, PricingApi};
pub use rate_admin_api::RateAdminApi;
pub use tariff_admin_api::TariffAdminApi;
