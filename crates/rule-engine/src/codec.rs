//! 规则树文档编解码
//!
//! 持久化边界使用的文档格式，与树结构一一对应：
//!
//! ```json
//! {
//!     "type": "operator",
//!     "value": "AND",
//!     "left":  { "type": "operand", "value": "age > 30" },
//!     "right": { "type": "operand", "value": "department == 'Sales'" }
//! }
//! ```
//!
//! 解码只校验文档结构（`type` / `value` 字段、子文档类型、嵌套深度），
//! 操作符取值和子节点是否齐全由校验和求值阶段报告 InvalidTree。
//!
//! 文档嵌套不超过 [`MAX_DOCUMENT_DEPTH`] 层，低于 serde_json 文本解析的递归上限，
//! 因此能编码成功的树一定能从 JSON 文本解码回来。

use crate::error::{Result, RuleError};
use crate::models::{Node, NodeKind};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// 持久化文档
pub type Document = Value;

const KEY_TYPE: &str = "type";
const KEY_VALUE: &str = "value";
const KEY_LEFT: &str = "left";
const KEY_RIGHT: &str = "right";

const TYPE_OPERATOR: &str = "operator";
const TYPE_OPERAND: &str = "operand";

/// 文档允许的最大嵌套层数（叶子为 1）
pub const MAX_DOCUMENT_DEPTH: usize = 100;

/// 编码规则树为文档
///
/// 不检查深度，持久化前应先调用 [`ensure_encodable`]。
pub fn encode(node: &Node) -> Document {
    let mut doc = Map::new();
    doc.insert(KEY_TYPE.to_string(), Value::from(node.kind.as_str()));
    doc.insert(KEY_VALUE.to_string(), Value::from(node.value.as_str()));

    if let Some(left) = &node.left {
        doc.insert(KEY_LEFT.to_string(), encode(left));
    }
    if let Some(right) = &node.right {
        doc.insert(KEY_RIGHT.to_string(), encode(right));
    }

    Value::Object(doc)
}

/// 从文档解码规则树
pub fn decode(doc: &Document) -> Result<Node> {
    decode_at(doc, "root", 1)
}

/// 检查规则树能否编码为文档
pub fn ensure_encodable(node: &Node) -> Result<()> {
    let depth = node.depth();
    if depth > MAX_DOCUMENT_DEPTH {
        return Err(RuleError::InvalidTree(format!(
            "树深度 {} 超过文档上限 {}",
            depth, MAX_DOCUMENT_DEPTH
        )));
    }
    Ok(())
}

/// 编码为 JSON 字符串
pub fn to_json_string(node: &Node) -> Result<String> {
    ensure_encodable(node)?;
    Ok(serde_json::to_string(&encode(node))?)
}

/// 从 JSON 字符串解码，无法解析的文本视为文档损坏
pub fn from_json_str(json: &str) -> Result<Node> {
    let doc: Document = serde_json::from_str(json)
        .map_err(|e| RuleError::CorruptDocument(format!("无法解析 JSON: {}", e)))?;
    decode(&doc)
}

fn decode_at(doc: &Document, path: &str, depth: usize) -> Result<Node> {
    if depth > MAX_DOCUMENT_DEPTH {
        return Err(corrupt(path, &format!("嵌套超过 {} 层", MAX_DOCUMENT_DEPTH)));
    }

    let map = doc
        .as_object()
        .ok_or_else(|| corrupt(path, "文档必须是对象"))?;

    let kind = match required_str(map, KEY_TYPE, path)? {
        TYPE_OPERATOR => NodeKind::Operator,
        TYPE_OPERAND => NodeKind::Operand,
        other => return Err(corrupt(path, &format!("未知的节点类型 '{}'", other))),
    };
    let value = required_str(map, KEY_VALUE, path)?.to_string();

    Ok(Node {
        kind,
        value,
        left: optional_child(map, KEY_LEFT, path, depth)?,
        right: optional_child(map, KEY_RIGHT, path, depth)?,
    })
}

fn required_str<'a>(map: &'a Map<String, Value>, key: &str, path: &str) -> Result<&'a str> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(corrupt(path, &format!("字段 '{}' 必须是字符串", key))),
        None => Err(corrupt(path, &format!("缺少字段 '{}'", key))),
    }
}

fn optional_child(
    map: &Map<String, Value>,
    key: &str,
    path: &str,
    depth: usize,
) -> Result<Option<Box<Node>>> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(child) => {
            let child_path = format!("{}.{}", path, key);
            decode_at(child, &child_path, depth + 1).map(|node| Some(Box::new(node)))
        }
    }
}

fn corrupt(path: &str, reason: &str) -> RuleError {
    RuleError::CorruptDocument(format!("{}: {}", path, reason))
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        ensure_encodable(self).map_err(serde::ser::Error::custom)?;
        encode(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let doc = Value::deserialize(deserializer)?;
        decode(&doc).map_err(serde::de::Error::custom)
    }
}
