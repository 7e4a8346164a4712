// ==========================================
// 快递运价引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod codec;
pub mod company_profile_repo;
pub mod error;
pub mod rate_record_repo;
pub mod slab_tariff_repo;

// 重导出核心仓储
pub use company_profile_repo::CompanyProfileRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use rate_record_repo::RateRecordRepository;
pub use slab_tariff_repo::{ReplaceOutcome, SlabTariffRepository};
