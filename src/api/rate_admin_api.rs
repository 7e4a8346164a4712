// ==========================================
// 快递运价引擎 - 运价管理 API
// ==========================================
// 职责: 区域运价逐条增删改查、公司档案维护、阶梯运价回读
// 红线: 写入前先校验；重复行由唯一索引拦截并转为校验错误
// ==========================================

use crate::api::dto::SlabTariffView;
use crate::api::error::{messages, ApiError, ApiResult};
use crate::domain::company::CompanyProfile;
use crate::domain::rate_record::{RateRecord, RateRecordInput};
use crate::repository::{CompanyProfileRepository, RateRecordRepository, SlabTariffRepository};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::info;

pub struct RateAdminApi {
    rate_repo: Arc<RateRecordRepository>,
    profile_repo: Arc<CompanyProfileRepository>,
    slab_repo: Arc<SlabTariffRepository>,
}

impl RateAdminApi {
    pub fn new(
        rate_repo: Arc<RateRecordRepository>,
        profile_repo: Arc<CompanyProfileRepository>,
        slab_repo: Arc<SlabTariffRepository>,
    ) -> Self {
        Self {
            rate_repo,
            profile_repo,
            slab_repo,
        }
    }

    // ==========================================
    // 区域运价
    // ==========================================

    pub fn create_rate_record(&self, franchise_id: i64, input: &RateRecordInput) -> ApiResult<RateRecord> {
        validate_rate_input(input)?;
        let id = self.rate_repo.insert(franchise_id, input)?;
        info!(franchise_id, rate_record_id = id, "新增区域运价");
        self.get_rate_record(franchise_id, id)
    }

    pub fn update_rate_record(
        &self,
        franchise_id: i64,
        id: i64,
        input: &RateRecordInput,
    ) -> ApiResult<RateRecord> {
        validate_rate_input(input)?;
        if self.rate_repo.update(franchise_id, id, input)? == 0 {
            return Err(ApiError::NotFound(messages::RATE_RECORD_NOT_FOUND.to_string()));
        }
        info!(franchise_id, rate_record_id = id, "修改区域运价");
        self.get_rate_record(franchise_id, id)
    }

    pub fn delete_rate_record(&self, franchise_id: i64, id: i64) -> ApiResult<()> {
        if self.rate_repo.delete(franchise_id, id)? == 0 {
            return Err(ApiError::NotFound(messages::RATE_RECORD_NOT_FOUND.to_string()));
        }
        info!(franchise_id, rate_record_id = id, "删除区域运价");
        Ok(())
    }

    pub fn get_rate_record(&self, franchise_id: i64, id: i64) -> ApiResult<RateRecord> {
        self.rate_repo
            .find_by_id(franchise_id, id)?
            .ok_or_else(|| ApiError::NotFound(messages::RATE_RECORD_NOT_FOUND.to_string()))
    }

    /// 区域运价列表（可选按服务类型过滤，按 id 升序）
    pub fn list_rate_records(
        &self,
        franchise_id: i64,
        service_type: Option<&str>,
    ) -> ApiResult<Vec<RateRecord>> {
        let service_type = service_type.map(str::trim).filter(|s| !s.is_empty());
        Ok(self.rate_repo.list_by_franchise(franchise_id, service_type)?)
    }

    // ==========================================
    // 公司档案
    // ==========================================

    /// 新增或覆盖公司档案
    pub fn upsert_company_profile(&self, profile: &CompanyProfile) -> ApiResult<CompanyProfile> {
        for (field, value) in profile.numeric_fields() {
            if value < Decimal::ZERO {
                return Err(ApiError::ValidationError(format!("{} must not be negative", field)));
            }
        }
        self.profile_repo.upsert(profile)?;
        info!(
            franchise_id = profile.franchise_id,
            company_id = profile.company_id,
            "公司档案已保存"
        );
        self.get_company_profile(profile.franchise_id, profile.company_id)
    }

    pub fn get_company_profile(&self, franchise_id: i64, company_id: i64) -> ApiResult<CompanyProfile> {
        self.profile_repo
            .find(franchise_id, company_id)?
            .ok_or_else(|| ApiError::NotFound(messages::COMPANY_NOT_FOUND.to_string()))
    }

    // ==========================================
    // 阶梯运价回读
    // ==========================================

    pub fn list_slab_tariffs(&self, franchise_id: i64, company_id: i64) -> ApiResult<Vec<SlabTariffView>> {
        let tariffs = self.slab_repo.list_by_company(franchise_id, company_id)?;
        Ok(tariffs.iter().map(SlabTariffView::from).collect())
    }
}

/// 区域运价入参校验
pub fn validate_rate_input(input: &RateRecordInput) -> ApiResult<()> {
    for (field, value) in [
        ("origin_pincode", &input.origin_pincode),
        ("destination_pincode", &input.destination_pincode),
        ("service_type", &input.service_type),
    ] {
        if value.trim().is_empty() {
            return Err(ApiError::ValidationError(format!("{} is required", field)));
        }
    }

    if input.weight_from < Decimal::ZERO {
        return Err(ApiError::ValidationError("weight_from must not be negative".to_string()));
    }
    if let Some(weight_to) = input.weight_to {
        if weight_to < input.weight_from {
            return Err(ApiError::ValidationError(
                "weight_to must not be less than weight_from".to_string(),
            ));
        }
    }
    if input.rate_per_kg < Decimal::ZERO {
        return Err(ApiError::ValidationError("rate_per_kg must not be negative".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn input() -> RateRecordInput {
        RateRecordInput {
            origin_pincode: "400001".to_string(),
            destination_pincode: "*".to_string(),
            service_type: "Air".to_string(),
            weight_from: dec!(0),
            weight_to: Some(dec!(5)),
            rate_per_kg: dec!(40),
        }
    }

    #[test]
    fn test_validate_rate_input() {
        assert!(validate_rate_input(&input()).is_ok());

        let mut inverted = input();
        inverted.weight_from = dec!(6);
        assert!(matches!(validate_rate_input(&inverted), Err(ApiError::ValidationError(_))));

        let mut blank = input();
        blank.service_type = "  ".to_string();
        assert!(validate_rate_input(&blank).is_err());

        let mut negative = input();
        negative.rate_per_kg = dec!(-1);
        assert!(validate_rate_input(&negative).is_err());

        let mut open_ended = input();
        open_ended.weight_to = None;
        assert!(validate_rate_input(&open_ended).is_ok());
    }
}
