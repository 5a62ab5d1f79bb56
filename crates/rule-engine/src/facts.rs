//! 事实记录
//!
//! 规则评估时调用方提供的输入数据：事实名称到标量值的映射。
//! 评估过程中只读。

use crate::error::{Result, RuleError};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// 事实值（标量）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactValue {
    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
}

impl FactValue {
    /// 获取值的类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Boolean(_) => "boolean",
        }
    }

    /// 数值统一转为 f64，非数值返回 None
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// 从 JSON 标量转换
    fn from_json(value: &Value) -> Result<Option<Self>> {
        match value {
            Value::Null => Ok(None),
            Value::Bool(b) => Ok(Some(Self::Boolean(*b))),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Ok(Some(Self::Integer(i))),
                None => n
                    .as_f64()
                    .map(|f| Some(Self::Float(f)))
                    .ok_or_else(|| RuleError::type_mismatch("number", n.to_string())),
            },
            Value::String(s) => Ok(Some(Self::String(s.clone()))),
            Value::Array(_) => Err(RuleError::type_mismatch("scalar", "array")),
            Value::Object(_) => Err(RuleError::type_mismatch("scalar", "object")),
        }
    }
}

impl fmt::Display for FactValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(i) => write!(f, "{}", i),
            Self::Float(v) => write!(f, "{}", v),
            Self::String(s) => write!(f, "'{}'", s),
            Self::Boolean(b) => write!(f, "{}", b),
        }
    }
}

impl From<i64> for FactValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for FactValue {
    fn from(v: i32) -> Self {
        Self::Integer(v as i64)
    }
}

impl From<f64> for FactValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for FactValue {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for FactValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for FactValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// 事实记录
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FactRecord {
    facts: HashMap<String, FactValue>,
}

impl FactRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// 链式添加事实
    pub fn with(mut self, name: impl Into<String>, value: impl Into<FactValue>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<FactValue>) {
        self.facts.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&FactValue> {
        self.facts.get(name)
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    /// 从 JSON 对象创建
    ///
    /// 嵌套对象按点号路径展开（`{"user": {"age": 30}}` -> `user.age`），
    /// `null` 视为字段不存在，数组不受支持。
    pub fn from_json(data: &Value) -> Result<Self> {
        let map = data
            .as_object()
            .ok_or_else(|| RuleError::type_mismatch("object", json_type_name(data)))?;

        let mut record = Self::new();
        for (key, value) in map {
            record.flatten_into(key.clone(), value)?;
        }
        Ok(record)
    }

    /// 从 JSON 字符串创建
    pub fn from_json_str(json: &str) -> Result<Self> {
        let data: Value = serde_json::from_str(json)?;
        Self::from_json(&data)
    }

    fn flatten_into(&mut self, path: String, value: &Value) -> Result<()> {
        if let Value::Object(map) = value {
            for (key, child) in map {
                self.flatten_into(format!("{}.{}", path, key), child)?;
            }
            return Ok(());
        }

        if let Some(fact) = FactValue::from_json(value)? {
            self.facts.insert(path, fact);
        }
        Ok(())
    }
}

impl<K, V> FromIterator<(K, V)> for FactRecord
where
    K: Into<String>,
    V: Into<FactValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
