// ==========================================
// 快递运价引擎 - 领域类型定义
// ==========================================
// 职责: 运价相关的枚举/值对象
// 序列化格式: 与既有调用方保持一致（"Slab 2" / "*"）
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 区域运价的通配符（任意 pincode）
pub const PINCODE_WILDCARD: &str = "*";

// ==========================================
// 阶梯类型 (Slab Type)
// ==========================================
// 名称中的数字是档位上限；写入的 rate_1..rate_k 须连续且 k 不超过该数字
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlabType {
    #[serde(rename = "Slab 2")]
    Slab2,
    #[serde(rename = "Slab 3")]
    Slab3,
    #[serde(rename = "Slab 4")]
    Slab4,
}

impl SlabType {
    /// 数据库/接口字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            SlabType::Slab2 => "Slab 2",
            SlabType::Slab3 => "Slab 3",
            SlabType::Slab4 => "Slab 4",
        }
    }

    /// 解析接口字符串，非三种合法取值之一时返回 None
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "Slab 2" => Some(SlabType::Slab2),
            "Slab 3" => Some(SlabType::Slab3),
            "Slab 4" => Some(SlabType::Slab4),
            _ => None,
        }
    }

    /// 档位数量 N
    pub fn bracket_count(&self) -> usize {
        match self {
            SlabType::Slab2 => 2,
            SlabType::Slab3 => 3,
            SlabType::Slab4 => 4,
        }
    }
}

impl fmt::Display for SlabType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// Pincode 匹配模式
// ==========================================
// Any 存储为 "*"，匹配任意 pincode；Exact 只匹配同值
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PincodePattern {
    Any,
    Exact(String),
}

impl PincodePattern {
    /// 从存储/输入字符串构造（前后空白忽略）
    pub fn from_db_str(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed == PINCODE_WILDCARD {
            PincodePattern::Any
        } else {
            PincodePattern::Exact(trimmed.to_string())
        }
    }

    pub fn to_db_string(&self) -> String {
        match self {
            PincodePattern::Any => PINCODE_WILDCARD.to_string(),
            PincodePattern::Exact(pin) => pin.clone(),
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self, PincodePattern::Exact(_))
    }

    pub fn matches(&self, pincode: &str) -> bool {
        match self {
            PincodePattern::Any => true,
            PincodePattern::Exact(pin) => pin == pincode.trim(),
        }
    }
}

impl fmt::Display for PincodePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PincodePattern::Any => f.write_str(PINCODE_WILDCARD),
            PincodePattern::Exact(pin) => f.write_str(pin),
        }
    }
}

impl Serialize for PincodePattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_db_string())
    }
}

impl<'de> Deserialize<'de> for PincodePattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(PincodePattern::from_db_str(&raw))
    }
}
