//! 规则引擎领域模型

use crate::error::{Result, RuleError};
use crate::operators::LogicalOperator;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Operator,
    Operand,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Operator => "operator",
            Self::Operand => "operand",
        }
    }
}

/// 规则树节点
///
/// 操作符节点的 `value` 为 `AND` / `OR`，两个子节点都必须存在；
/// 操作数节点的 `value` 为条件表达式（如 `age > 30`），没有子节点。
///
/// 子节点由父节点独占持有，需要复用子树时使用 `clone()` 深拷贝。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub value: String,
    pub left: Option<Box<Node>>,
    pub right: Option<Box<Node>>,
}

impl Node {
    /// 创建操作数（叶子）节点，不校验条件文本
    pub fn operand(condition: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Operand,
            value: condition.into(),
            left: None,
            right: None,
        }
    }

    /// 创建操作符节点，接管两个子节点的所有权
    pub fn operator(op: LogicalOperator, left: Node, right: Node) -> Self {
        Self {
            kind: NodeKind::Operator,
            value: op.as_str().to_string(),
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
        }
    }

    pub fn and(left: Node, right: Node) -> Self {
        Self::operator(LogicalOperator::And, left, right)
    }

    pub fn or(left: Node, right: Node) -> Self {
        Self::operator(LogicalOperator::Or, left, right)
    }

    pub fn is_operand(&self) -> bool {
        self.kind == NodeKind::Operand
    }

    pub fn is_operator(&self) -> bool {
        self.kind == NodeKind::Operator
    }

    /// 解析操作符节点的逻辑操作符
    pub fn logical_operator(&self) -> Result<LogicalOperator> {
        if !self.is_operator() {
            return Err(RuleError::InvalidTree(format!(
                "操作数节点 '{}' 没有逻辑操作符",
                self.value
            )));
        }
        self.value.parse().map_err(RuleError::InvalidTree)
    }

    /// 树的深度，叶子节点为 1
    pub fn depth(&self) -> usize {
        let mut max = 0;
        let mut stack = vec![(self, 1)];
        while let Some((node, level)) = stack.pop() {
            max = max.max(level);
            for child in [node.left.as_deref(), node.right.as_deref()].into_iter().flatten() {
                stack.push((child, level + 1));
            }
        }
        max
    }

    /// 按从左到右的顺序收集所有操作数条件
    pub fn conditions(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_operand() {
                out.push(node.value.as_str());
                continue;
            }
            stack.extend(node.right.as_deref());
            stack.extend(node.left.as_deref());
        }
        out
    }
}

impl Drop for Node {
    // 子树用显式栈逐个释放，析构不随树深递归
    fn drop(&mut self) {
        let mut pending: Vec<Box<Node>> = self.left.take().into_iter().chain(self.right.take()).collect();
        while let Some(mut node) = pending.pop() {
            pending.extend(node.left.take());
            pending.extend(node.right.take());
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Operand => write!(f, "{}", self.value),
            NodeKind::Operator => {
                write!(f, "(")?;
                match &self.left {
                    Some(left) => write!(f, "{}", left)?,
                    None => write!(f, "?")?,
                }
                write!(f, " {} ", self.value)?;
                match &self.right {
                    Some(right) => write!(f, "{}", right)?,
                    None => write!(f, "?")?,
                }
                write!(f, ")")
            }
        }
    }
}

/// 规则定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rule {
    pub id: String,
    pub name: String,
    pub version: String,
    pub root: Node,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    pub fn new(name: impl Into<String>, root: Node) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            version: "1.0".to_string(),
            root,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

/// 评估结果
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationResult {
    pub matched: bool,
    pub rule_id: String,
    pub rule_name: String,
    pub matched_conditions: Vec<String>,
    pub evaluation_trace: Vec<String>,
    pub evaluation_time_us: u64,
}

impl EvaluationResult {
    pub fn new(rule_id: String, rule_name: String) -> Self {
        Self {
            matched: false,
            rule_id,
            rule_name,
            matched_conditions: Vec::new(),
            evaluation_trace: Vec::new(),
            evaluation_time_us: 0,
        }
    }
}
