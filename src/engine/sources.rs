// ==========================================
// 快递运价引擎 - 引擎层数据源接口
// ==========================================
// 职责: 引擎只通过这三个只读接口取数，由调用方显式注入
// 实现者: 对应的 *Repository；测试中可替换为内存实现
// ==========================================

use crate::domain::{CompanyProfile, RateRecord, SlabTariff};
use crate::repository::{
    CompanyProfileRepository, RateRecordRepository, RepositoryResult, SlabTariffRepository,
};

/// 区域运价数据源
pub trait RateRecordSource: Send + Sync {
    /// 线路候选行：起始/目的 pincode 精确或通配，服务类型一致
    fn route_candidates(
        &self,
        franchise_id: i64,
        origin_pincode: &str,
        destination_pincode: &str,
        service_type: &str,
    ) -> RepositoryResult<Vec<RateRecord>>;
}

/// 阶梯运价数据源
pub trait SlabTariffSource: Send + Sync {
    fn find_tariff(
        &self,
        franchise_id: i64,
        company_id: i64,
        courier_type: &str,
        row_name: &str,
        sub_type: Option<&str>,
    ) -> RepositoryResult<Option<SlabTariff>>;
}

/// 公司档案数据源
pub trait CompanyProfileSource: Send + Sync {
    fn find_profile(&self, franchise_id: i64, company_id: i64) -> RepositoryResult<Option<CompanyProfile>>;
}

impl RateRecordSource for RateRecordRepository {
    fn route_candidates(
        &self,
        franchise_id: i64,
        origin_pincode: &str,
        destination_pincode: &str,
        service_type: &str,
    ) -> RepositoryResult<Vec<RateRecord>> {
        self.find_route_candidates(franchise_id, origin_pincode, destination_pincode, service_type)
    }
}

impl SlabTariffSource for SlabTariffRepository {
    fn find_tariff(
        &self,
        franchise_id: i64,
        company_id: i64,
        courier_type: &str,
        row_name: &str,
        sub_type: Option<&str>,
    ) -> RepositoryResult<Option<SlabTariff>> {
        self.find_by_lookup(franchise_id, company_id, courier_type, row_name, sub_type)
    }
}

impl CompanyProfileSource for CompanyProfileRepository {
    fn find_profile(&self, franchise_id: i64, company_id: i64) -> RepositoryResult<Option<CompanyProfile>> {
        self.find(franchise_id, company_id)
    }
}
