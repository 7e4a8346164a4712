// ==========================================
// 快递运价引擎 - 仓储层列编解码
// ==========================================
// 金额/重量以 TEXT 存储的十进制字符串，读写都经过这里
// ==========================================

use rusqlite::types::Type;
use rust_decimal::Decimal;
use std::str::FromStr;

/// 写库前规范化（去掉尾随 0，保证唯一索引比较口径一致）
pub fn decimal_to_db(value: Decimal) -> String {
    value.normalize().to_string()
}

/// 读取 TEXT 列为 Decimal
pub fn decimal_from_db(idx: usize, raw: &str) -> rusqlite::Result<Decimal> {
    Decimal::from_str(raw.trim())
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

/// 读取可空 TEXT 列为 Option<Decimal>（空串视为 NULL）
pub fn optional_decimal_from_db(idx: usize, raw: Option<String>) -> rusqlite::Result<Option<Decimal>> {
    match raw {
        Some(s) if !s.trim().is_empty() => decimal_from_db(idx, &s).map(Some),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalized_text_round_trip() {
        assert_eq!(decimal_to_db(dec!(1.500)), "1.5");
        assert_eq!(decimal_from_db(0, "1.5").unwrap(), dec!(1.5));
        assert_eq!(optional_decimal_from_db(0, Some(" ".to_string())).unwrap(), None);
        assert!(decimal_from_db(3, "abc").is_err());
    }
}
