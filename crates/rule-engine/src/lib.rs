//! AST 规则引擎
//!
//! 以二叉树表示业务规则，提供：
//! - 操作数条件的谓词评估（比较、集合成员）
//! - AND / OR 短路求值
//! - 多条规则的组合
//! - 规则树与持久化文档之间的编解码
//! - 规则校验、存储和引擎门面

pub mod codec;
pub mod combinator;
pub mod compiler;
pub mod condition;
pub mod engine;
pub mod error;
pub mod evaluator;
pub mod executor;
pub mod facts;
pub mod models;
pub mod operators;
pub mod predicate;
pub mod store;

pub use codec::{Document, MAX_DOCUMENT_DEPTH, decode, encode};
pub use combinator::{combine, combine_with};
pub use compiler::{CompiledRule, RuleCompiler};
pub use engine::RuleEngine;
pub use error::{Result, RuleError};
pub use evaluator::ConditionEvaluator;
pub use executor::RuleExecutor;
pub use facts::{FactRecord, FactValue};
pub use models::{EvaluationResult, Node, NodeKind, Rule};
pub use operators::{ComparisonOperator, LogicalOperator};
pub use predicate::Predicate;
pub use store::{RuleRepository, RuleStore};

/// 使用默认谓词对规则树求值
pub fn evaluate(node: &Node, facts: &FactRecord) -> Result<bool> {
    RuleExecutor::new().evaluate(node, facts)
}
