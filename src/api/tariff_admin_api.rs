// ==========================================
// 快递运价引擎 - 阶梯运价管理 API（整表替换）
// ==========================================
// 流程:
//   1. 取 (加盟商, 公司) 级异步锁，同公司替换串行、不同公司并行
//   2. 逐行校验，收集行级错误（不中断批次）
//   3. 单事务: 删除旧行 → 插入有效行 → 插入 0 行则整体回滚
//   4. 错误列表按配置上限截断，总数写日志
// ==========================================

use crate::api::dto::{BulkReplaceRequest, BulkReplaceResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::config::PricingConfigReader;
use crate::engine::tariff_validation::validate_rows;
use crate::repository::SlabTariffRepository;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{info, instrument, warn};
use uuid::Uuid;

type CompanyKey = (i64, i64);

// ==========================================
// TariffAdminApi - 阶梯运价管理 API
// ==========================================
pub struct TariffAdminApi {
    slab_repo: Arc<SlabTariffRepository>,
    config: Arc<dyn PricingConfigReader>,
    company_locks: Mutex<HashMap<CompanyKey, Arc<tokio::sync::Mutex<()>>>>,
}

impl TariffAdminApi {
    pub fn new(slab_repo: Arc<SlabTariffRepository>, config: Arc<dyn PricingConfigReader>) -> Self {
        Self {
            slab_repo,
            config,
            company_locks: Mutex::new(HashMap::new()),
        }
    }

    /// 整表替换（对外形状）
    pub async fn replace_all_request(
        &self,
        franchise_id: i64,
        request: &BulkReplaceRequest,
    ) -> ApiResult<BulkReplaceResponse> {
        self.replace_all(franchise_id, request.company_id, &request.rates_data)
            .await
    }

    /// 整表替换公司的阶梯运价
    ///
    /// # 参数
    /// - franchise_id: 加盟商
    /// - company_id: 公司
    /// - rows: 原始行（逐行独立校验）
    ///
    /// # 返回
    /// - Ok(BulkReplaceResponse): 至少插入 1 行，事务已提交
    /// - Err(NoValidRates): 0 行有效，事务已回滚，旧数据保留
    /// - Err(PersistenceError): 存储失败，事务已回滚
    #[instrument(skip(self, rows), fields(franchise_id = %franchise_id, company_id = %company_id, rows = rows.len()))]
    pub async fn replace_all(
        &self,
        franchise_id: i64,
        company_id: i64,
        rows: &[Value],
    ) -> ApiResult<BulkReplaceResponse> {
        let batch_id = Uuid::new_v4();
        let error_cap = self.config.get_bulk_replace_error_cap(franchise_id).await?;

        let lock = self.company_lock(franchise_id, company_id)?;
        let result = {
            let _guard = lock.lock().await;
            self.replace_locked(batch_id, error_cap, franchise_id, company_id, rows)
                .await
        };
        drop(lock);
        self.release_company_lock(franchise_id, company_id);
        result
    }

    /// 持有公司锁时执行: 校验 → 单事务替换 → 错误截断
    async fn replace_locked(
        &self,
        batch_id: Uuid,
        error_cap: usize,
        franchise_id: i64,
        company_id: i64,
        rows: &[Value],
    ) -> ApiResult<BulkReplaceResponse> {
        let batch = validate_rows(rows);
        let total_errors = batch.violations.len();
        let errors: Vec<String> = batch
            .violations
            .iter()
            .take(error_cap)
            .map(ToString::to_string)
            .collect();

        let repo = Arc::clone(&self.slab_repo);
        let valid_rows = batch.rows;
        let outcome = tokio::task::spawn_blocking(move || {
            repo.replace_for_company(franchise_id, company_id, &valid_rows)
        })
        .await
        .map_err(|e| ApiError::InternalError(format!("替换任务执行失败: {}", e)))?
        .map_err(|e| {
            warn!(batch_id = %batch_id, error = %e, "阶梯运价替换失败，事务已回滚");
            ApiError::PersistenceError(e.to_string())
        })?;

        if !outcome.committed {
            warn!(
                batch_id = %batch_id,
                rejected = total_errors,
                "无有效阶梯运价行，事务已回滚，保留原有数据"
            );
            return Err(ApiError::NoValidRates { errors });
        }

        info!(
            batch_id = %batch_id,
            deleted = outcome.deleted,
            inserted = outcome.inserted,
            rejected = total_errors,
            shown_errors = errors.len(),
            "阶梯运价整表替换完成"
        );

        Ok(BulkReplaceResponse {
            inserted: outcome.inserted,
            errors,
        })
    }

    /// 公司级锁（按需创建，最后一个持有者释放后由 release_company_lock 移除）
    fn company_lock(&self, franchise_id: i64, company_id: i64) -> ApiResult<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self
            .company_locks
            .lock()
            .map_err(|e| ApiError::InternalError(format!("公司锁表获取失败: {}", e)))?;
        Ok(Arc::clone(
            locks
                .entry((franchise_id, company_id))
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(()))),
        ))
    }

    /// 无其他持有者时移除公司锁，锁表规模只随并发中的公司数变化
    fn release_company_lock(&self, franchise_id: i64, company_id: i64) {
        let Ok(mut locks) = self.company_locks.lock() else {
            warn!(franchise_id, company_id, "公司锁表不可用，跳过清理");
            return;
        };
        let key = (franchise_id, company_id);
        if locks.get(&key).map_or(false, |lock| Arc::strong_count(lock) == 1) {
            locks.remove(&key);
        }
    }

    #[cfg(test)]
    fn company_lock_count(&self) -> usize {
        self.company_locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }
}
