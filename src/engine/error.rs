// ==========================================
// 快递运价引擎 - 引擎层错误类型
// ==========================================
// 取数失败沿用 RepositoryError；金额运算溢出单独成类（调用方输入过大）
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Decimal 乘加结果超出可表示范围
    #[error("金额超出可表示范围: {operation}")]
    AmountOverflow { operation: String },
}

impl EngineError {
    pub fn overflow(operation: impl Into<String>) -> Self {
        EngineError::AmountOverflow {
            operation: operation.into(),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
