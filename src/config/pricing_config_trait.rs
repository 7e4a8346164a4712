// ==========================================
// 快递运价引擎 - 运价配置读取 Trait
// ==========================================
// 职责: 定义运价管理所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// PricingConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取，加盟商作用域覆盖全局）
#[async_trait]
pub trait PricingConfigReader: Send + Sync {
    /// 批量替换响应中最多展示的行级错误数
    ///
    /// # 参数
    /// - franchise_id: 加盟商（franchise/{id} 作用域优先于 global）
    ///
    /// # 默认值
    /// - 10（配置缺失、非整数或 < 1 时回退）
    async fn get_bulk_replace_error_cap(&self, franchise_id: i64) -> RepositoryResult<usize>;
}
