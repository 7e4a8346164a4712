// ==========================================
// 快递运价引擎 - 金额工具
// ==========================================
// 全程 Decimal 计算，只在输出点四舍五入到 2 位小数（远离零）
// ==========================================

use rust_decimal::prelude::*;
use serde_json::Value;
use thiserror::Error;

/// 金额输出保留位数
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// 输出点舍入（2 位小数，.5 远离零）
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// JSON 值转换为数值的失败原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NumericValueError {
    #[error("'{0}' is not a valid number")]
    NotNumeric(String),

    #[error("'{0}' must not be negative")]
    Negative(String),
}

/// 解析 JSON 中的非负数值
///
/// # 返回
/// - Ok(None): null 或空字符串（视为“未填写”）
/// - Ok(Some(d)): 数字或数字字符串（"50" → 50）
/// - Err: 非数字 / 非有限值 / 负数
pub fn non_negative_decimal_from_json(value: &Value) -> Result<Option<Decimal>, NumericValueError> {
    let parsed = match value {
        Value::Null => return Ok(None),
        Value::String(s) if s.trim().is_empty() => return Ok(None),
        Value::String(s) => parse_decimal_str(s.trim())
            .ok_or_else(|| NumericValueError::NotNumeric(s.clone()))?,
        // 按 JSON 原文解析，避免经 f64 引入二进制误差
        Value::Number(n) => parse_decimal_str(&n.to_string())
            .ok_or_else(|| NumericValueError::NotNumeric(n.to_string()))?,
        other => return Err(NumericValueError::NotNumeric(other.to_string())),
    };

    if parsed.is_sign_negative() && !parsed.is_zero() {
        return Err(NumericValueError::Negative(parsed.to_string()));
    }
    Ok(Some(parsed.normalize()))
}

/// 十进制字符串（支持科学计数法）；NaN/Infinity 等非有限值返回 None
pub fn parse_decimal_str(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}
