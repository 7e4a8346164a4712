// ==========================================
// 快递运价引擎 - 配置层
// ==========================================
// 职责: 系统配置管理,支持加盟商级覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod pricing_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, ConfigScope};
pub use pricing_config_trait::PricingConfigReader;
