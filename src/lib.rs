// ==========================================
// 快递运价引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 定位: 区域运价 / 阶梯运价解析 + 附加费计费 + 阶梯运价整表替换
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 计价规则
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CompanyProfile, MatchedRecord, PincodePattern, PricingRequest, PricingResult, RateRecord,
    SlabRates, SlabTariff, SlabType,
};

// 引擎
pub use engine::{SlabTariffResolver, SurchargeCalculator, ZoneRateResolver};

// API
pub use api::{ApiError, ApiResult, PricingApi, RateAdminApi, TariffAdminApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "快递运价引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
