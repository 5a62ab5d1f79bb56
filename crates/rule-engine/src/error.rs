//! 规则引擎错误类型

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("事实字段不存在: {field}")]
    MissingFact { field: String },

    #[error("无法识别的条件 '{condition}': {reason}")]
    MalformedCondition { condition: String, reason: String },

    #[error("无效的规则树: {0}")]
    InvalidTree(String),

    #[error("规则集合为空，无法组合")]
    EmptyRuleSet,

    #[error("规则文档已损坏: {0}")]
    CorruptDocument(String),

    #[error("类型不匹配: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("规则未找到: {0}")]
    RuleNotFound(String),

    #[error("JSON 序列化错误: {0}")]
    Json(#[from] serde_json::Error),
}

impl RuleError {
    pub(crate) fn malformed(condition: &str, reason: impl Into<String>) -> Self {
        Self::MalformedCondition {
            condition: condition.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;
