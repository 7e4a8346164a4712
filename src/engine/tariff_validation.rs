// ==========================================
// 快递运价引擎 - 阶梯运价批量行校验
// ==========================================
// 职责: 逐行独立校验上传的原始 JSON 行，产出 待写入行 + 行级错误
// 红线: 纯函数，不访问数据库；单行失败不影响其他行
// ==========================================
// 校验规则（按顺序，取第一条失败原因）:
//   1. 行必须是对象
//   2. courier_type / row_name 必填；sub_type 可选
//   3. slab_type ∈ {"Slab 2", "Slab 3", "Slab 4"}
//   4. rates 必须是 key→value 对象（数组不合法）
//   5. 非空值必须是有限且 ≥ 0 的数字（数字字符串自动转换）
//   6. 至少一个有效档位；档位从 1 连续填写且不超过 slab_type 档数
//   7. 同一批次内唯一键不得重复
// ==========================================

use crate::domain::slab_tariff::{NewSlabTariff, SlabRates, SlabTariffKey};
use crate::domain::types::SlabType;
use crate::engine::money::non_negative_decimal_from_json;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

/// 档位上限
pub const MAX_BRACKETS: usize = 4;

/// 行级校验错误
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowViolation {
    /// 0 起始的行下标（展示时 +1）
    pub row_index: usize,
    pub field: String,
    pub message: String,
}

impl RowViolation {
    fn new(row_index: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row_index,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for RowViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Row {}: {}", self.row_index + 1, self.message)
    }
}

/// 整批校验结果
#[derive(Debug, Clone, Default)]
pub struct ValidatedBatch {
    pub rows: Vec<NewSlabTariff>,
    pub violations: Vec<RowViolation>,
}

/// 校验整批原始行
pub fn validate_rows(raw_rows: &[Value]) -> ValidatedBatch {
    let mut batch = ValidatedBatch::default();
    let mut seen: HashMap<SlabTariffKey, usize> = HashMap::new();

    for (idx, raw) in raw_rows.iter().enumerate() {
        let row = match validate_row(idx, raw) {
            Ok(row) => row,
            Err(violation) => {
                batch.violations.push(violation);
                continue;
            }
        };

        if let Some(first) = seen.get(&row.key()) {
            batch.violations.push(RowViolation::new(
                idx,
                "row_name",
                format!(
                    "duplicate of row {} (courier_type '{}', row_name '{}', sub_type '{}')",
                    first + 1,
                    row.courier_type,
                    row.row_name,
                    row.sub_type.as_deref().unwrap_or("")
                ),
            ));
            continue;
        }
        seen.insert(row.key(), idx);
        batch.rows.push(row);
    }

    batch
}

/// 校验单行
pub fn validate_row(idx: usize, raw: &Value) -> Result<NewSlabTariff, RowViolation> {
    let obj = raw
        .as_object()
        .ok_or_else(|| RowViolation::new(idx, "row", "row must be an object"))?;

    let courier_type = required_text(idx, obj, "courier_type")?;
    let row_name = required_text(idx, obj, "row_name")?;
    let sub_type = optional_text(idx, obj, "sub_type")?;

    let slab_raw = required_text(idx, obj, "slab_type")?;
    let slab_type = SlabType::parse(&slab_raw).ok_or_else(|| {
        RowViolation::new(
            idx,
            "slab_type",
            format!("slab_type '{}' must be one of Slab 2, Slab 3, Slab 4", slab_raw),
        )
    })?;

    let rates_obj = match obj.get("rates") {
        Some(Value::Object(map)) => map,
        Some(Value::Array(_)) => {
            return Err(RowViolation::new(
                idx,
                "rates",
                "rates must be a key/value object, not an array",
            ))
        }
        None | Some(Value::Null) => return Err(RowViolation::new(idx, "rates", "rates is required")),
        Some(_) => return Err(RowViolation::new(idx, "rates", "rates must be a key/value object")),
    };

    let (values, rate_keys) = collect_brackets(idx, rates_obj, slab_type)?;

    Ok(NewSlabTariff {
        courier_type,
        row_name,
        sub_type,
        slab_type,
        rates: SlabRates::from_values(&values),
        rate_keys,
    })
}

/// 档位 key 解析: "1" / "rate_1" / "rate1" / "slab_1" / "slab1" → 1
pub fn parse_rate_key(key: &str) -> Option<usize> {
    let lowered = key.trim().to_ascii_lowercase();
    let digits = ["rate_", "rate", "slab_", "slab"]
        .iter()
        .find_map(|prefix| lowered.strip_prefix(prefix))
        .unwrap_or(&lowered);

    match digits.parse::<usize>() {
        Ok(n) if (1..=MAX_BRACKETS).contains(&n) => Some(n),
        _ => None,
    }
}

fn collect_brackets(
    idx: usize,
    rates: &Map<String, Value>,
    slab_type: SlabType,
) -> Result<(Vec<Decimal>, Vec<String>), RowViolation> {
    let mut slots: [Option<Decimal>; MAX_BRACKETS] = [None; MAX_BRACKETS];
    let mut spelled: [Option<&str>; MAX_BRACKETS] = [None; MAX_BRACKETS];

    for (key, value) in rates {
        let field = format!("rates.{}", key);
        let bracket = parse_rate_key(key).ok_or_else(|| {
            RowViolation::new(idx, field.clone(), format!("unknown rate key '{}'", key))
        })?;

        let parsed = non_negative_decimal_from_json(value)
            .map_err(|e| RowViolation::new(idx, field.clone(), format!("rate '{}': {}", key, e)))?;
        let Some(amount) = parsed else {
            continue;
        };

        if let Some(previous) = spelled[bracket - 1] {
            return Err(RowViolation::new(
                idx,
                field,
                format!("rate '{}' repeats bracket {} already given as '{}'", key, bracket, previous),
            ));
        }
        spelled[bracket - 1] = Some(key.as_str());
        slots[bracket - 1] = Some(amount);
    }

    let populated = slots.iter().filter(|s| s.is_some()).count();
    if populated == 0 {
        return Err(RowViolation::new(idx, "rates", "at least one numeric rate is required"));
    }

    // 已填档位必须是 1..=k 的连续前缀
    let values: Vec<Decimal> = slots.iter().map_while(|s| *s).collect();
    if values.len() != populated {
        return Err(RowViolation::new(
            idx,
            "rates",
            "rates must fill brackets from 1 without gaps",
        ));
    }

    if populated > slab_type.bracket_count() {
        return Err(RowViolation::new(
            idx,
            "rates",
            format!(
                "{} allows at most {} rates, got {}",
                slab_type,
                slab_type.bracket_count(),
                populated
            ),
        ));
    }

    let keys = spelled
        .iter()
        .take(values.len())
        .flatten()
        .map(|k| k.to_string())
        .collect();
    Ok((values, keys))
}

fn required_text(idx: usize, obj: &Map<String, Value>, field: &str) -> Result<String, RowViolation> {
    match optional_text(idx, obj, field)? {
        Some(text) => Ok(text),
        None => Err(RowViolation::new(idx, field, format!("{} is required", field))),
    }
}

/// 字符串字段；null / 空白视为未填写，数字按原文接受
fn optional_text(idx: usize, obj: &Map<String, Value>, field: &str) -> Result<Option<String>, RowViolation> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.trim().to_string())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(RowViolation::new(idx, field, format!("{} must be a string", field))),
    }
}
