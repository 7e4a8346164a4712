// ==========================================
// 快递运价引擎 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为调用方可读的错误
// 对外: status_code() + to_body() 还原 {success:false, message[, errors]} 约定
// ==========================================

use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use serde_json::{json, Value};
use thiserror::Error;

/// 对外固定文案（调用方按原文匹配）
pub mod messages {
    pub const ZONE_RATE_NOT_FOUND: &str =
        "No matching rate found for the given route, service type and weight";
    pub const COMPANY_NOT_FOUND: &str = "Company not found";
    pub const SLAB_RATE_NOT_FOUND: &str = "Rate not found for this configuration";
    pub const NO_VALID_RATES: &str = "No valid rates to insert";
    pub const RATE_RECORD_NOT_FOUND: &str = "Rate record not found";
    pub const WEIGHT_OUT_OF_RANGE: &str = "weight is too large to price";
}

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    /// 请求字段缺失或格式错误（400）
    #[error("数据验证失败: {0}")]
    ValidationError(String),

    /// 无匹配运价 / 公司 / 记录（404）
    #[error("资源未找到: {0}")]
    NotFound(String),

    /// 批量替换全部行校验失败，事务已回滚（400）
    #[error("批量替换无有效行: {} 条错误", .errors.len())]
    NoValidRates { errors: Vec<String> },

    /// 存储/事务失败（500）
    #[error("持久化失败: {0}")]
    PersistenceError(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl ApiError {
    /// 对应的 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::ValidationError(_) | ApiError::NoValidRates { .. } => 400,
            ApiError::NotFound(_) => 404,
            ApiError::PersistenceError(_) | ApiError::InternalError(_) => 500,
        }
    }

    /// 对外 message 原文（不带内部前缀）
    pub fn message(&self) -> String {
        match self {
            ApiError::ValidationError(msg)
            | ApiError::NotFound(msg)
            | ApiError::PersistenceError(msg)
            | ApiError::InternalError(msg) => msg.clone(),
            ApiError::NoValidRates { .. } => messages::NO_VALID_RATES.to_string(),
        }
    }

    /// 错误响应体
    pub fn to_body(&self) -> Value {
        match self {
            ApiError::NoValidRates { errors } => json!({
                "success": false,
                "message": self.message(),
                "errors": errors,
            }),
            _ => json!({
                "success": false,
                "message": self.message(),
            }),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{} not found (id={})", entity, id))
            }
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::ValidationError(format!("Duplicate record: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::ValidationError(format!("Referenced record missing: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg)
            | RepositoryError::DatabaseQueryError(msg) => ApiError::PersistenceError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::PersistenceError(format!("数据库锁获取失败: {}", msg))
            }
        }
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Repository(e) => e.into(),
            EngineError::AmountOverflow { operation } => {
                tracing::warn!(operation = %operation, "计费金额溢出，按请求参数错误返回");
                ApiError::ValidationError(messages::WEIGHT_OUT_OF_RANGE.to_string())
            }
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
